//! Configuration structure and defaults for the download engine.

use reqwest::header::HeaderMap;
use reqwest::Proxy;
use std::time::Duration;

/// Options controlling a [`DownloadEngine`].
///
/// [`DownloadEngine`]: super::DownloadEngine
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Fixed delay between a failed transfer attempt and its automatic
    /// retry. Retries continue indefinitely until the engine is paused or
    /// purged.
    pub retry_delay: Duration,
    /// Number of request-level retries performed by the HTTP middleware
    /// below the engine's own retry loop.
    pub retries: u32,
    /// Custom HTTP headers sent with every request.
    pub headers: Option<HeaderMap>,
    /// Optional proxy configuration.
    pub proxy: Option<Proxy>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            retry_delay: Duration::from_secs(5),
            retries: 3,
            headers: None,
            proxy: None,
        }
    }
}
