use std::collections::VecDeque;

pub const FEED_CAPACITY: usize = 50;

const HUNGER_EATS_AT: i32 = 100;
const SLEEP_NAPS_AT: i32 = 120;
// One wander roll per dwarf per simulated second; averages one move
// every three simulated minutes.
const WANDER_ONE_IN: i32 = 180;

#[derive(Debug, Clone)]
struct Rng64 {
    state: u64,
}

impl Rng64 {
    fn from_seed(seed: u64) -> Self {
        let mut s = seed;
        if s == 0 {
            s = 0x9e3779b97f4a7c15;
        }
        Self { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        // xorshift64*
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545F4914F6CDD1D)
    }

    fn roll_range(&mut self, lo: i32, hi_inclusive: i32) -> i32 {
        debug_assert!(lo <= hi_inclusive);
        let span = (hi_inclusive - lo + 1) as u64;
        let v = (self.next_u64() % span) as i32;
        lo + v
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dwarf {
    pub id: u32,
    pub name: String,
    pub hunger: i32,
    pub sleep: i32,
    pub location: u32,
}

#[derive(Debug, Clone)]
pub struct Location {
    pub id: u32,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone)]
pub struct FeedLine {
    pub at_unix: u64,
    pub text: String,
}

/// Bounded ring of recent colony activity. Oldest lines drop first.
#[derive(Debug)]
pub struct Feed {
    cap: usize,
    lines: VecDeque<FeedLine>,
}

impl Feed {
    fn new(cap: usize) -> Self {
        Self {
            cap: cap.max(1),
            lines: VecDeque::new(),
        }
    }

    fn push(&mut self, at_unix: u64, text: String) {
        self.lines.push_back(FeedLine { at_unix, text });
        while self.lines.len() > self.cap {
            let _ = self.lines.pop_front();
        }
    }

    pub fn newest_first(&self) -> impl Iterator<Item = &FeedLine> {
        self.lines.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[derive(Debug)]
pub struct World {
    pub dwarves: Vec<Dwarf>,
    pub locations: Vec<Location>,
    pub feed: Feed,
    rng: Rng64,
    /// Simulated seconds elapsed since startup.
    pub ticks: u64,
}

impl World {
    /// The starting colony. `seed` fixes the RNG stream for the lifetime of
    /// the process; the same seed replays the same colony history.
    pub fn seed(seed: u64) -> Self {
        let dwarves = vec![
            dwarf(1, "Urist", 20, 30, 1),
            dwarf(2, "Catten", 45, 10, 2),
            dwarf(3, "Solon", 70, 85, 3),
            dwarf(4, "Domas", 5, 110, 4),
        ];
        let locations = vec![
            place(1, "Great Hall", "Carved granite, long tables, one legendary engraving."),
            place(2, "Deep Mines", "Shafts chasing an iron vein ever further down."),
            place(3, "Brewery", "Barrels of dwarven ale in various states of ferment."),
            place(4, "Dormitory", "Rows of stone beds, each with a cat asleep on it."),
        ];
        Self {
            dwarves,
            locations,
            feed: Feed::new(FEED_CAPACITY),
            rng: Rng64::from_seed(seed),
            ticks: 0,
        }
    }

    pub fn dwarf(&self, id: u32) -> Option<&Dwarf> {
        self.dwarves.iter().find(|d| d.id == id)
    }

    pub fn location(&self, id: u32) -> Option<&Location> {
        self.locations.iter().find(|l| l.id == id)
    }

    pub fn dwarves_at(&self, location: u32) -> impl Iterator<Item = &Dwarf> {
        self.dwarves.iter().filter(move |d| d.location == location)
    }

    /// Advance the colony by exactly one simulated second.
    ///
    /// `now_unix` is the second being simulated; it only stamps feed lines.
    pub fn tick(&mut self, now_unix: u64) {
        self.ticks = self.ticks.wrapping_add(1);

        for i in 0..self.dwarves.len() {
            // Appetites are staggered per dwarf so the colony doesn't move
            // in lockstep.
            let cadence = 2 + u64::from(self.dwarves[i].id % 3);
            if self.ticks % cadence == 0 {
                self.dwarves[i].hunger += 1;
                self.dwarves[i].sleep += 1;
            }

            if self.dwarves[i].hunger >= HUNGER_EATS_AT {
                self.dwarves[i].hunger = 0;
                let text = format!("{} devours a plump helmet", self.dwarves[i].name);
                self.feed.push(now_unix, text);
            }

            if self.dwarves[i].sleep >= SLEEP_NAPS_AT {
                self.dwarves[i].sleep = 0;
                let text = format!("{} collapses into a stone bed", self.dwarves[i].name);
                self.feed.push(now_unix, text);
            }

            if self.rng.roll_range(1, WANDER_ONE_IN) == 1 {
                let pick = (self.rng.next_u64() as usize) % self.locations.len();
                let dest = self.locations[pick].id;
                if dest != self.dwarves[i].location {
                    self.dwarves[i].location = dest;
                    let text = format!(
                        "{} wanders into the {}",
                        self.dwarves[i].name, self.locations[pick].name
                    );
                    self.feed.push(now_unix, text);
                }
            }
        }
    }
}

fn dwarf(id: u32, name: &str, hunger: i32, sleep: i32, location: u32) -> Dwarf {
    Dwarf {
        id,
        name: name.to_string(),
        hunger,
        sleep,
        location,
    }
}

fn place(id: u32, name: &str, description: &str) -> Location {
    Location {
        id,
        name: name.to_string(),
        description: description.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn seed_roster_starts_with_urist() {
        let w = World::seed(1);
        let urist = w.dwarf(1).unwrap();
        assert_eq!(urist.name, "Urist");
        assert_eq!(urist.hunger, 20);
        assert_eq!(urist.sleep, 30);
        assert!(w.dwarf(999).is_none());
        assert_eq!(w.locations.len(), 4);
    }

    #[test]
    fn same_seed_replays_the_same_history() {
        let mut a = World::seed(7);
        let mut b = World::seed(7);
        for s in 0..5_000 {
            a.tick(s);
            b.tick(s);
        }
        assert_eq!(a.dwarves, b.dwarves);
        assert_eq!(a.feed.len(), b.feed.len());
    }

    #[test]
    fn starving_dwarf_eats_and_logs_it() {
        let mut w = World::seed(1);
        w.dwarves[0].hunger = HUNGER_EATS_AT;
        w.tick(1_000);
        assert_eq!(w.dwarves[0].hunger, 0);
        let newest = w.feed.newest_first().map(|l| l.text.as_str()).collect::<Vec<_>>();
        assert!(newest.iter().any(|t| t.contains("Urist devours")));
    }

    #[test]
    fn exhausted_dwarf_naps_and_logs_it() {
        let mut w = World::seed(1);
        w.dwarves[0].sleep = SLEEP_NAPS_AT;
        w.tick(1_000);
        assert_eq!(w.dwarves[0].sleep, 0);
        let newest = w.feed.newest_first().map(|l| l.text.as_str()).collect::<Vec<_>>();
        assert!(newest.iter().any(|t| t.contains("Urist collapses")));
    }

    #[test]
    fn feed_retains_only_the_newest_lines() {
        let mut f = Feed::new(3);
        for i in 0..7u64 {
            f.push(i, format!("line {i}"));
        }
        assert_eq!(f.len(), 3);
        let texts = f.newest_first().map(|l| l.text.clone()).collect::<Vec<_>>();
        assert_eq!(texts, vec!["line 6", "line 5", "line 4"]);
    }

    #[test]
    fn dwarves_at_filters_by_location() {
        let mut w = World::seed(1);
        w.dwarves[1].location = 1;
        let here = w.dwarves_at(1).map(|d| d.id).collect::<Vec<_>>();
        assert_eq!(here, vec![1, 2]);
    }
}
