use tokio::sync::Mutex;
use tokio::sync::MutexGuard;

use crate::world::World;

/// Wall clock in whole unix seconds.
pub fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

#[derive(Debug)]
pub struct SimState {
    pub world: World,
    last_sim_unix: u64,
}

impl SimState {
    pub fn new(world: World, last_sim_unix: u64) -> Self {
        Self {
            world,
            last_sim_unix,
        }
    }

    /// Tick the world once for every whole second between the last simulated
    /// second and `now`, in order. The timestamp never moves backward, so a
    /// repeat call with no elapsed time runs zero iterations.
    pub fn catch_up_to(&mut self, now: u64) {
        while self.last_sim_unix < now {
            self.last_sim_unix += 1;
            self.world.tick(self.last_sim_unix);
        }
    }

    pub fn last_sim_unix(&self) -> u64 {
        self.last_sim_unix
    }
}

/// The shared simulation clock: one mutex over the world plus the last
/// simulated second. Everything that reads the world goes through
/// [`sync`](SimClock::sync), so no reader ever observes state older than its
/// own call.
#[derive(Debug)]
pub struct SimClock {
    state: Mutex<SimState>,
}

impl SimClock {
    pub fn new(world: World) -> Self {
        Self {
            state: Mutex::new(SimState::new(world, unix_now())),
        }
    }

    /// Lock the simulation and bring it up to the current wall-clock second.
    ///
    /// The guard comes back still held: catch-up and the caller's subsequent
    /// reads are atomic with respect to every other ticker and reader. The
    /// critical section is bounded by elapsed wall-clock seconds, not by
    /// request volume, and this is the only lock taken here, so the periodic
    /// driver and request handlers cannot deadlock.
    pub async fn sync(&self) -> MutexGuard<'_, SimState> {
        let now = unix_now();
        let mut state = self.state.lock().await;
        state.catch_up_to(now);
        state
    }
}
