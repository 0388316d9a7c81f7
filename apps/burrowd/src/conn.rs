use std::net::SocketAddr;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use burrowio::ByteCursor;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;
use tracing::warn;
use webwire::{match_route, read_request, write_response, Response, Route};

use crate::render;
use crate::AppState;

/// Per-socket send/receive deadline: a stalled peer forfeits its connection
/// instead of parking a worker forever.
pub const IO_TIMEOUT: Duration = Duration::from_secs(15);

/// One connection, one worker: serve requests off the stream until the
/// client is done or something fatal happens, keeping the in-flight gauge
/// honest on every exit path.
pub async fn handle_conn(
    stream: TcpStream,
    peer: SocketAddr,
    state: Arc<AppState>,
) -> anyhow::Result<()> {
    state.in_flight.fetch_add(1, Ordering::Relaxed);
    let res = serve(stream, peer, &state).await;
    state.in_flight.fetch_sub(1, Ordering::Relaxed);
    res
}

async fn serve(stream: TcpStream, peer: SocketAddr, state: &AppState) -> anyhow::Result<()> {
    let (rd, mut wr) = stream.into_split();
    let mut cursor = ByteCursor::new(rd);

    loop {
        // Stream-fatal parse errors and timeouts close the connection with
        // no response; an empty request line or a clean hangup ends it
        // quietly.
        let req = match timeout(IO_TIMEOUT, read_request(&mut cursor)).await {
            Err(_) => anyhow::bail!("receive timed out"),
            Ok(Err(e)) => return Err(e).context("read request"),
            Ok(Ok(None)) => break,
            Ok(Ok(Some(r))) => r,
        };
        debug!(peer = %peer, method = %req.method, path = %req.path, "request");

        let resp = dispatch(&req.path, state).await;
        match timeout(IO_TIMEOUT, write_response(&mut wr, &resp)).await {
            Err(_) => anyhow::bail!("send timed out"),
            Ok(r) => r.context("write response")?,
        }
    }

    let _ = wr.shutdown().await;
    Ok(())
}

/// Route one path to its handler. World-touching handlers sync the clock
/// first and render while the guard is still held, so every page reflects
/// each whole second up to this call.
pub(crate) async fn dispatch(path: &str, state: &AppState) -> Response {
    match match_route(path) {
        Route::Greeting => render::greeting(),
        Route::Dwarves => render::dwarf_list(&state.clock.sync().await.world),
        Route::Feed => render::feed(&state.clock.sync().await.world),
        Route::Locations => render::location_list(&state.clock.sync().await.world),
        Route::Location(id) => render::location(&state.clock.sync().await.world, id),
        Route::Entity(id) => render::entity(&state.clock.sync().await.world, id),
        Route::EntityAvatar(id) => render::avatar(&state.clock.sync().await.world, id),
        Route::Stats => {
            let chart = state.telemetry.chart().await;
            let in_flight = state.in_flight.load(Ordering::Relaxed) as u32;
            render::stats_page(&chart, in_flight)
        }
        Route::Favicon => match tokio::fs::read(&state.icon_path).await {
            Ok(bytes) => Response::icon(bytes),
            Err(e) => {
                warn!(path = %state.icon_path.display(), err = %e, "favicon read failed");
                render::not_found()
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burrowworld::{SimClock, World};
    use std::path::PathBuf;
    use std::sync::atomic::AtomicUsize;
    use tokio::io::AsyncReadExt;
    use tokio::net::TcpListener;

    fn test_state(icon_path: &str) -> Arc<AppState> {
        Arc::new(AppState {
            clock: SimClock::new(World::seed(1)),
            telemetry: crate::stats::Telemetry::new(),
            in_flight: AtomicUsize::new(0),
            icon_path: PathBuf::from(icon_path),
        })
    }

    async fn spawn_server(state: Arc<AppState>) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            loop {
                let Ok((stream, peer)) = listener.accept().await else {
                    break;
                };
                let state = state.clone();
                tokio::spawn(async move {
                    let _ = handle_conn(stream, peer, state).await;
                });
            }
        });
        addr
    }

    async fn roundtrip(addr: SocketAddr, raw: &[u8]) -> String {
        let mut s = TcpStream::connect(addr).await.unwrap();
        s.write_all(raw).await.unwrap();
        s.shutdown().await.unwrap();
        let mut buf = Vec::new();
        s.read_to_end(&mut buf).await.unwrap();
        String::from_utf8_lossy(&buf).to_string()
    }

    fn declared_content_length(response: &str) -> usize {
        response
            .lines()
            .find_map(|l| l.strip_prefix("Content-Length: "))
            .unwrap()
            .trim()
            .parse()
            .unwrap()
    }

    fn body_of(response: &str) -> &str {
        response.split_once("\r\n\r\n").unwrap().1
    }

    #[tokio::test]
    async fn existing_entity_yields_200_with_exact_content_length() {
        let addr = spawn_server(test_state("data/icon.ico")).await;
        let resp = roundtrip(addr, b"GET /entities/1 HTTP/1.1\r\nHost: x\r\n\r\n").await;
        assert!(resp.starts_with("HTTP/1.1 200 OK\r\n"));
        assert_eq!(declared_content_length(&resp), body_of(&resp).len());
        assert!(body_of(&resp).contains("Urist"));
    }

    #[tokio::test]
    async fn missing_entity_yields_404_not_found() {
        let addr = spawn_server(test_state("data/icon.ico")).await;
        let resp = roundtrip(addr, b"GET /entities/999 HTTP/1.1\r\n\r\n").await;
        assert!(resp.starts_with("HTTP/1.1 404 Not found\r\n"));
        assert_eq!(declared_content_length(&resp), body_of(&resp).len());
    }

    #[tokio::test]
    async fn short_request_line_gets_the_default_greeting() {
        let addr = spawn_server(test_state("data/icon.ico")).await;
        let resp = roundtrip(addr, b"GET\r\n\r\n").await;
        assert!(resp.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(body_of(&resp).contains("Hello world!"));
    }

    #[tokio::test]
    async fn connection_reuse_serves_successive_requests() {
        let addr = spawn_server(test_state("data/icon.ico")).await;
        let raw = b"GET /dwarves HTTP/1.1\r\n\r\nGET /feed HTTP/1.1\r\n\r\n";
        let resp = roundtrip(addr, raw).await;
        assert_eq!(resp.matches("HTTP/1.1 200 OK\r\n").count(), 2);
    }

    #[tokio::test]
    async fn stats_page_serves_the_chart() {
        let state = test_state("data/icon.ico");
        state.telemetry.record(2).await;
        let addr = spawn_server(state).await;
        let resp = roundtrip(addr, b"GET /stats HTTP/1.1\r\n\r\n").await;
        assert!(resp.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(body_of(&resp).contains("<svg"));
    }

    #[tokio::test]
    async fn favicon_streams_the_icon_bytes() {
        let icon_path = concat!(env!("CARGO_MANIFEST_DIR"), "/data/icon.ico");
        let icon = std::fs::read(icon_path).unwrap();

        let addr = spawn_server(test_state(icon_path)).await;
        let mut s = TcpStream::connect(addr).await.unwrap();
        s.write_all(b"GET /favicon.ico HTTP/1.1\r\n\r\n").await.unwrap();
        s.shutdown().await.unwrap();
        let mut raw = Vec::new();
        s.read_to_end(&mut raw).await.unwrap();

        let split = raw.windows(4).position(|w| w == b"\r\n\r\n").unwrap();
        let head = String::from_utf8_lossy(&raw[..split]).to_string();
        let body = &raw[split + 4..];
        assert!(head.starts_with("HTTP/1.1 200 OK"));
        assert!(head.contains("Content-Type: image/x-icon"));
        assert_eq!(declared_content_length(&head), icon.len());
        assert_eq!(body, &icon[..]);
    }

    #[tokio::test]
    async fn unreadable_favicon_yields_404_instead_of_a_broken_stream() {
        let addr = spawn_server(test_state("data/definitely-missing.ico")).await;
        let resp = roundtrip(addr, b"GET /favicon.ico HTTP/1.1\r\n\r\n").await;
        assert!(resp.starts_with("HTTP/1.1 404 Not found\r\n"));
    }

    #[tokio::test]
    async fn gauge_returns_to_zero_after_the_connection_closes() {
        let state = test_state("data/icon.ico");
        let addr = spawn_server(state.clone()).await;
        let _ = roundtrip(addr, b"GET / HTTP/1.1\r\n\r\n").await;
        // The worker decrements before the client sees EOF-on-read complete,
        // but give the spawned task a beat to finish regardless.
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(state.in_flight.load(Ordering::Relaxed), 0);
    }

    #[tokio::test]
    async fn concurrent_requests_race_the_background_ticker() {
        let state = test_state("data/icon.ico");
        let addr = spawn_server(state.clone()).await;
        let ticker = {
            let state = state.clone();
            tokio::spawn(async move {
                loop {
                    let _ = state.clock.sync().await;
                    tokio::time::sleep(Duration::from_millis(1)).await;
                }
            })
        };

        let a = tokio::spawn(roundtrip(addr, b"GET /entities/1 HTTP/1.1\r\n\r\n"));
        let b = tokio::spawn(roundtrip(addr, b"GET /dwarves HTTP/1.1\r\n\r\n"));
        let (a, b) = (a.await.unwrap(), b.await.unwrap());
        assert!(a.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(b.starts_with("HTTP/1.1 200 OK\r\n"));
        ticker.abort();
    }
}
