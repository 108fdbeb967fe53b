//! Builder pattern implementation for creating DownloadEngine instances.
//!
//! # Examples
//!
//! ## Basic Builder Usage
//!
//! ```rust,no_run
//! use stamina::engine::DownloadEngineBuilder;
//! use std::path::PathBuf;
//! use std::time::Duration;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let url = reqwest::Url::parse("https://example.com/app-1.2.3.apk")?;
//! let (engine, events) = DownloadEngineBuilder::new()
//!     .retry_delay(Duration::from_secs(10))
//!     .build(url, PathBuf::from("downloads/app-1.2.3.apk"))?;
//! # Ok(())
//! # }
//! ```

use super::{config::EngineConfig, engine::DownloadEngine};
use crate::error::Result;
use crate::event::EventStream;

use reqwest::header::{HeaderMap, HeaderValue, IntoHeaderName};
use reqwest::{Proxy, Url};
use std::path::PathBuf;
use std::time::Duration;

/// A builder used to create a [`DownloadEngine`].
///
/// ```rust,no_run
/// # fn main() -> Result<(), stamina::Error> {
/// use stamina::engine::DownloadEngineBuilder;
///
/// let url = reqwest::Url::parse("https://example.com/file.zip").unwrap();
/// let (engine, events) = DownloadEngineBuilder::new()
///     .retries(5)
///     .build(url, "downloads/file.zip".into())?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default, Clone)]
pub struct DownloadEngineBuilder {
    config: EngineConfig,
}

impl DownloadEngineBuilder {
    /// Creates a builder with the default options.
    pub fn new() -> Self {
        DownloadEngineBuilder::default()
    }

    /// Creates a builder starting from an existing configuration.
    pub fn with_config(config: EngineConfig) -> Self {
        Self { config }
    }

    /// Sets the fixed delay between a failure and its automatic retry.
    pub fn retry_delay(mut self, retry_delay: Duration) -> Self {
        self.config.retry_delay = retry_delay;
        self
    }

    /// Sets the number of request-level retries performed by the HTTP
    /// middleware.
    pub fn retries(mut self, retries: u32) -> Self {
        self.config.retries = retries;
        self
    }

    /// Sets the proxy used for all requests.
    pub fn proxy(mut self, proxy: Proxy) -> Self {
        self.config.proxy = Some(proxy);
        self
    }

    /// Helper method to get or create a new HeaderMap.
    fn new_header(&self) -> HeaderMap {
        match self.config.headers {
            Some(ref h) => h.to_owned(),
            _ => HeaderMap::new(),
        }
    }

    /// Adds the http headers.
    ///
    /// You can call `.headers()` multiple times and all `HeaderMap`s will be
    /// merged into a single one.
    ///
    /// See also [`header()`].
    ///
    /// [`header()`]: DownloadEngineBuilder::header
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        let mut new = self.new_header();
        new.extend(headers);

        self.config.headers = Some(new);
        self
    }

    /// Adds a single http header.
    ///
    /// ```
    /// use reqwest::header::{self, HeaderValue};
    /// use stamina::engine::DownloadEngineBuilder;
    ///
    /// let auth = HeaderValue::from_str("Basic aGk6MTIzNDU2Cg==").expect("Invalid auth");
    ///
    /// let builder = DownloadEngineBuilder::new().header(header::AUTHORIZATION, auth);
    /// ```
    ///
    /// See also [`headers()`].
    ///
    /// [`headers()`]: DownloadEngineBuilder::headers
    pub fn header<K: IntoHeaderName>(mut self, name: K, value: HeaderValue) -> Self {
        let mut new = self.new_header();

        new.insert(name, value);

        self.config.headers = Some(new);
        self
    }

    /// Creates the [`DownloadEngine`] for one artifact, returning the engine
    /// together with its event stream.
    ///
    /// `final_file` is the path the completed artifact will be promoted to;
    /// the in-progress cache file lives next to it.
    pub fn build(self, url: Url, final_file: PathBuf) -> Result<(DownloadEngine, EventStream)> {
        DownloadEngine::new(url, final_file, self.config)
    }
}
