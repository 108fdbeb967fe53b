#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Body;
use axum::extract::State;
use axum::http::{header, HeaderMap, Method, Response, StatusCode};
use axum::Router;
use tempfile::TempDir;
use tokio::net::TcpListener;

use stamina::{DownloadEvent, EventStream};

/// Generous upper bound for any single awaited event.
pub const EVENT_TIMEOUT: Duration = Duration::from_secs(30);

/// Serving chunk size of the test server.
pub const SERVER_CHUNK: usize = 16 * 1024;

/// Creates a temporary directory for testing purposes.
pub fn create_temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temporary directory")
}

/// Creates deterministic test file content of the specified size.
pub fn test_content(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i % 256) as u8).collect()
}

/// Knobs for the in-process artifact server.
#[derive(Default)]
pub struct ServerOptions {
    /// Size of the served artifact in bytes.
    pub total_size: usize,
    /// Sleep inserted before each served chunk, to keep a transfer
    /// in flight long enough for pause/purge to land mid-stream.
    pub throttle: Option<Duration>,
    /// Abort the first GET mid-body after this many bytes were served.
    pub fail_after: Option<usize>,
    /// Serve the first GET with this many bytes missing from the end, with
    /// consistent framing, so the client sees a clean short stream.
    pub truncate_by: Option<usize>,
}

pub struct ServerState {
    body: Vec<u8>,
    throttle: Option<Duration>,
    fail_after: Mutex<Option<usize>>,
    truncate_by: Mutex<Option<usize>>,
    ranges: Mutex<Vec<String>>,
    gets: AtomicUsize,
    heads: AtomicUsize,
}

/// An in-process HTTP server with byte-range support, modeled after the
/// artifact endpoints the engine talks to in production.
pub struct TestServer {
    pub addr: SocketAddr,
    state: Arc<ServerState>,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    pub fn url(&self, filename: &str) -> reqwest::Url {
        reqwest::Url::parse(&format!("http://{}/{}", self.addr, filename)).unwrap()
    }

    /// `Range` header values of every GET received, in order.
    pub fn recorded_ranges(&self) -> Vec<String> {
        self.state.ranges.lock().unwrap().clone()
    }

    pub fn get_count(&self) -> usize {
        self.state.gets.load(Ordering::SeqCst)
    }

    pub fn head_count(&self) -> usize {
        self.state.heads.load(Ordering::SeqCst)
    }

    pub fn content(&self) -> &[u8] {
        &self.state.body
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

pub async fn spawn_server(options: ServerOptions) -> TestServer {
    let state = Arc::new(ServerState {
        body: test_content(options.total_size),
        throttle: options.throttle,
        fail_after: Mutex::new(options.fail_after),
        truncate_by: Mutex::new(options.truncate_by),
        ranges: Mutex::new(Vec::new()),
        gets: AtomicUsize::new(0),
        heads: AtomicUsize::new(0),
    });
    let app = Router::new()
        .fallback(serve_artifact)
        .with_state(Arc::clone(&state));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let handle = tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    TestServer {
        addr,
        state,
        handle,
    }
}

async fn serve_artifact(
    State(state): State<Arc<ServerState>>,
    method: Method,
    headers: HeaderMap,
) -> Response<Body> {
    let total = state.body.len();

    if method == Method::HEAD {
        state.heads.fetch_add(1, Ordering::SeqCst);
        return Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_LENGTH, total.to_string())
            .header(header::ACCEPT_RANGES, "bytes")
            .body(Body::empty())
            .unwrap();
    }
    if method != Method::GET {
        return Response::builder()
            .status(StatusCode::METHOD_NOT_ALLOWED)
            .body(Body::empty())
            .unwrap();
    }

    state.gets.fetch_add(1, Ordering::SeqCst);
    let range = headers
        .get(header::RANGE)
        .and_then(|value| value.to_str().ok())
        .map(String::from);
    if let Some(range) = &range {
        state.ranges.lock().unwrap().push(range.clone());
    }
    let offset = range
        .as_deref()
        .and_then(parse_range_offset)
        .unwrap_or(0)
        .min(total);

    let mut slice = state.body[offset..].to_vec();
    let fail_after = state.fail_after.lock().unwrap().take();
    if let Some(cut) = state.truncate_by.lock().unwrap().take() {
        let keep = slice.len().saturating_sub(cut);
        slice.truncate(keep);
    }

    let status = if offset > 0 {
        StatusCode::PARTIAL_CONTENT
    } else {
        StatusCode::OK
    };
    let content_range = format!("bytes {}-{}/{}", offset, total.saturating_sub(1), total);
    let declared = slice.len();
    let body = stream_body(slice, state.throttle, fail_after);

    Response::builder()
        .status(status)
        .header(header::CONTENT_LENGTH, declared.to_string())
        .header(header::CONTENT_RANGE, content_range)
        .header(header::ACCEPT_RANGES, "bytes")
        .body(body)
        .unwrap()
}

/// Parses the offset out of a "bytes=<n>-" request header.
fn parse_range_offset(range: &str) -> Option<usize> {
    range
        .strip_prefix("bytes=")?
        .split('-')
        .next()?
        .parse()
        .ok()
}

/// Serves `data` in chunks, optionally throttled, optionally aborting the
/// connection after `fail_after` bytes.
fn stream_body(data: Vec<u8>, throttle: Option<Duration>, fail_after: Option<usize>) -> Body {
    let stream = futures::stream::unfold((data, 0usize), move |(data, pos)| async move {
        if pos >= data.len() {
            return None;
        }
        if let Some(limit) = fail_after {
            if pos >= limit {
                // Give the client time to drain everything served so far,
                // so the failure lands on a fully written cache file.
                tokio::time::sleep(Duration::from_millis(50)).await;
                let failure: Result<Vec<u8>, std::io::Error> =
                    Err(std::io::Error::other("injected transfer failure"));
                return Some((failure, (data, usize::MAX)));
            }
        }
        if let Some(delay) = throttle {
            tokio::time::sleep(delay).await;
        }
        let mut end = (pos + SERVER_CHUNK).min(data.len());
        if let Some(limit) = fail_after {
            end = end.min(limit);
        }
        let chunk = data[pos..end].to_vec();
        Some((Ok(chunk), (data, end)))
    });
    Body::from_stream(stream)
}

// === Event stream helpers ===

/// Receives the next event, panicking when the stream stalls or closes.
pub async fn next_event(events: &mut EventStream) -> DownloadEvent {
    tokio::time::timeout(EVENT_TIMEOUT, events.recv())
        .await
        .expect("timed out waiting for a download event")
        .expect("event stream closed unexpectedly")
}

/// Receives events until one matches the predicate, returning it.
pub async fn wait_for<F>(events: &mut EventStream, mut predicate: F) -> DownloadEvent
where
    F: FnMut(&DownloadEvent) -> bool,
{
    loop {
        let event = next_event(events).await;
        if predicate(&event) {
            return event;
        }
    }
}

/// Receives events until a `Downloading` fraction reaches `min`.
pub async fn wait_for_progress(events: &mut EventStream, min: f64) -> f64 {
    loop {
        if let Some(fraction) = next_event(events).await.progress() {
            if fraction >= min {
                return fraction;
            }
        }
    }
}

/// Receives events until `Downloaded`, returning everything seen on the way
/// (including the terminal event).
pub async fn collect_until_downloaded(events: &mut EventStream) -> Vec<DownloadEvent> {
    let mut seen = Vec::new();
    loop {
        let event = next_event(events).await;
        let terminal = event.is_terminal();
        seen.push(event);
        if terminal {
            return seen;
        }
    }
}

/// Drains everything currently sitting in the channel without waiting.
pub fn drain_pending(events: &mut EventStream) -> Vec<DownloadEvent> {
    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    seen
}
