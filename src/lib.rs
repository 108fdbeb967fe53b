//! Stamina is a crate providing resumable HTTP(S) downloads that survive
//! flaky networks: pause, resume, cancellation, and automatic retry with
//! byte-range resumption.
//!
//! Each remote artifact gets its own [`DownloadEngine`]: a small state
//! machine that streams bytes into a `<name>.tmp` cache file, reports
//! progress and state transitions on an event stream, and promotes the
//! cache to its final name with an atomic rename once every byte is
//! verified present. Interrupted transfers, whether paused, failed, or
//! crashed, continue from the cache file's length on disk using HTTP range
//! requests.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use stamina::{DownloadEngineBuilder, DownloadEvent};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), stamina::Error> {
//! let url = reqwest::Url::parse("https://example.com/app-1.2.3.apk").unwrap();
//! let (mut engine, mut events) = DownloadEngineBuilder::new()
//!     .build(url, "downloads/app-1.2.3.apk".into())?;
//!
//! engine.start()?;
//! while let Some(event) = events.recv().await {
//!     if event.is_terminal() {
//!         break;
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! # Module Organization
//!
//! - [`artifact`] - Artifact identity: remote URL plus on-disk file name
//! - [`engine`] - The `DownloadEngine` state machine and its builder
//! - [`error`] - Centralized error handling with the `Error` enum
//! - [`event`] - The `DownloadEvent` alphabet and event stream
//! - [`http`] - HTTP client stack and the content-length prober
//! - [`registry`] - At-most-one-engine-per-artifact task registry
//! - [`store`] - The partial-file store managing cache and final paths

pub mod artifact;
pub mod engine;
pub mod error;
pub mod event;
pub mod http;
pub mod registry;
pub mod store;

pub use artifact::Artifact;
pub use engine::{DownloadEngine, DownloadEngineBuilder, EngineConfig};
pub use error::{Error, Result};
pub use event::{DownloadEvent, EventStream};
pub use http::{create_http_client, HttpClientConfig};
pub use http::{content_length, parse_content_range_total, supports_byte_ranges};
pub use registry::{artifact_key, TaskRegistry};
pub use store::PartialStore;
