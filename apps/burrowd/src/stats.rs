use tokio::sync::Mutex;

/// How many one-second concurrency samples the ring retains.
pub const RING_CAPACITY: usize = 100;

// Fixed plotting box the chart is scaled into.
const CHART_WIDTH: u32 = 600;
const CHART_HEIGHT: u32 = 200;
const AXIS_DIVISIONS: u32 = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct GridLine {
    pub y: f32,
    pub label: String,
}

/// Drawing instructions for one rendering of the ring: horizontal gridlines
/// with value labels, plus a polyline of every retained sample, newest at
/// the right edge.
#[derive(Debug, Clone)]
pub struct Chart {
    pub width: u32,
    pub height: u32,
    pub gridlines: Vec<GridLine>,
    pub points: Vec<(f32, f32)>,
}

#[derive(Debug)]
struct Ring {
    samples: Vec<u32>,
    /// Next slot to overwrite.
    cursor: usize,
}

/// Circular buffer of concurrency samples. One mutex covers both writes and
/// chart generation, so a rendering always sees a consistent snapshot.
#[derive(Debug)]
pub struct Telemetry {
    ring: Mutex<Ring>,
}

impl Telemetry {
    pub fn new() -> Self {
        Self::with_capacity(RING_CAPACITY)
    }

    pub fn with_capacity(cap: usize) -> Self {
        Self {
            ring: Mutex::new(Ring {
                samples: vec![0; cap.max(1)],
                cursor: 0,
            }),
        }
    }

    /// Overwrite the slot at the write cursor, then advance it.
    pub async fn record(&self, sample: u32) {
        let mut ring = self.ring.lock().await;
        let cap = ring.samples.len();
        let at = ring.cursor;
        ring.samples[at] = sample;
        ring.cursor = (at + 1) % cap;
    }

    /// All retained samples, newest first, walking the ring backward from
    /// the slot before the write cursor.
    pub async fn samples_newest_first(&self) -> Vec<u32> {
        let ring = self.ring.lock().await;
        newest_first(&ring.samples, ring.cursor)
    }

    pub async fn chart(&self) -> Chart {
        let ring = self.ring.lock().await;
        chart_of(&ring.samples, ring.cursor)
    }
}

fn newest_first(samples: &[u32], cursor: usize) -> Vec<u32> {
    let cap = samples.len();
    (0..cap).map(|k| samples[(cursor + cap - 1 - k) % cap]).collect()
}

fn chart_of(samples: &[u32], cursor: usize) -> Chart {
    let cap = samples.len();
    // Floor the maximum to 1 so an all-zero ring still scales.
    let max = samples.iter().copied().max().unwrap_or(0).max(1);
    let step = (max + AXIS_DIVISIONS - 1) / AXIS_DIVISIONS;
    let divisions = (max + step - 1) / step;
    // Scale against the covering top of the axis, not the raw max, so every
    // gridline and sample lands inside the box.
    let top = (divisions * step) as f32;

    let mut gridlines = Vec::new();
    for i in 0..=divisions {
        let value = i * step;
        let y = CHART_HEIGHT as f32 - (value as f32 / top) * CHART_HEIGHT as f32;
        gridlines.push(GridLine {
            y,
            label: value.to_string(),
        });
    }

    let x_step = CHART_WIDTH as f32 / cap.saturating_sub(1).max(1) as f32;
    let mut points = Vec::with_capacity(cap);
    for (k, v) in newest_first(samples, cursor).into_iter().enumerate() {
        let x = CHART_WIDTH as f32 - k as f32 * x_step;
        let y = CHART_HEIGHT as f32 - (v as f32 / top) * CHART_HEIGHT as f32;
        points.push((x, y));
    }

    Chart {
        width: CHART_WIDTH,
        height: CHART_HEIGHT,
        gridlines,
        points,
    }
}
