use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::AtomicUsize;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use burrowworld::{SimClock, World};
use tokio::net::TcpListener;
use tracing::{info, warn, Level};

mod conn;
mod render;
mod stats;

const CLOCK_DRIVE_INTERVAL: Duration = Duration::from_secs(10);
const SAMPLE_INTERVAL: Duration = Duration::from_secs(1);

/// Everything the workers and background tasks share.
pub(crate) struct AppState {
    pub clock: SimClock,
    pub telemetry: stats::Telemetry,
    /// Connections currently in flight. Bumped by each worker; read without
    /// locking by the sampler, which tolerates an approximate value.
    pub in_flight: AtomicUsize,
    pub icon_path: PathBuf,
}

fn usage_and_exit() -> ! {
    eprintln!(
        "burrowd (colony observer)\n\n\
USAGE:\n  burrowd [--bind HOST:PORT]\n\n\
ENV:\n  BURROWD_BIND       default 0.0.0.0:3500\n  WORLD_SEED         default 1 (0 = draw a random seed)\n  BURROWD_ICON_PATH  default data/icon.ico\n"
    );
    std::process::exit(2);
}

#[derive(Clone, Debug)]
struct Config {
    bind: SocketAddr,
    world_seed: u64,
    icon_path: PathBuf,
}

fn parse_args() -> Config {
    let mut bind: SocketAddr = std::env::var("BURROWD_BIND")
        .unwrap_or_else(|_| "0.0.0.0:3500".to_string())
        .parse()
        .unwrap_or_else(|_| usage_and_exit());

    let world_seed: u64 = std::env::var("WORLD_SEED")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(1);

    let icon_path: PathBuf = std::env::var("BURROWD_ICON_PATH")
        .unwrap_or_else(|_| "data/icon.ico".to_string())
        .into();

    let mut it = std::env::args().skip(1);
    while let Some(arg) = it.next() {
        match arg.as_str() {
            "--bind" => {
                let v = it.next().unwrap_or_else(|| usage_and_exit());
                bind = v.parse().unwrap_or_else(|_| usage_and_exit());
            }
            "-h" | "--help" => usage_and_exit(),
            _ => usage_and_exit(),
        }
    }

    Config {
        bind,
        world_seed,
        icon_path,
    }
}

fn resolve_seed(configured: u64) -> u64 {
    if configured != 0 {
        return configured;
    }
    let mut b = [0u8; 8];
    getrandom::getrandom(&mut b).ok();
    u64::from_be_bytes(b)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,burrowd=info".into()),
        )
        .with_target(false)
        .with_max_level(Level::INFO)
        .init();

    let cfg = parse_args();
    let listener = TcpListener::bind(cfg.bind).await?;

    let seed = resolve_seed(cfg.world_seed);
    let state = Arc::new(AppState {
        clock: SimClock::new(World::seed(seed)),
        telemetry: stats::Telemetry::new(),
        in_flight: AtomicUsize::new(0),
        icon_path: cfg.icon_path.clone(),
    });

    tokio::spawn(clock_driver_task(state.clone()));
    tokio::spawn(sampler_task(state.clone()));

    info!(
        bind = %cfg.bind,
        seed = seed,
        icon = %cfg.icon_path.display(),
        "colony observer listening"
    );

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("interrupt received; closing listener");
                break;
            }
            res = listener.accept() => {
                let (stream, peer) = res?;
                let state = state.clone();
                tokio::spawn(async move {
                    if let Err(e) = conn::handle_conn(stream, peer, state).await {
                        warn!(peer = %peer, err = %e, "connection ended with error");
                    }
                });
            }
        }
    }

    // Shutdown is immediate: the listener closes with this scope and
    // in-flight connections are not drained.
    Ok(())
}

/// Keeps the simulation from falling arbitrarily far behind between
/// requests; handlers still sync on their own for on-demand freshness.
async fn clock_driver_task(state: Arc<AppState>) {
    loop {
        tokio::time::sleep(CLOCK_DRIVE_INTERVAL).await;
        let _ = state.clock.sync().await;
    }
}

async fn sampler_task(state: Arc<AppState>) {
    loop {
        tokio::time::sleep(SAMPLE_INTERVAL).await;
        let sample = state.in_flight.load(Ordering::Relaxed) as u32;
        state.telemetry.record(sample).await;
    }
}
