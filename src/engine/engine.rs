//! Core download engine implementation.
//!
//! One [`DownloadEngine`] manages the download of one remote artifact: a
//! background transfer task streams bytes into a cache file, and the engine
//! exposes `start`/`pause`/`resume`/`purge` transitions over it. Every
//! externally visible transition is published on the engine's event stream;
//! see [`DownloadEvent`] for the alphabet.
//!
//! The engine is not internally synchronized against concurrent external
//! calls: callers are expected to serialize operations per engine (the
//! operations take `&mut self`, so the borrow checker enforces this within
//! one owner). The only concurrency inside is the single background
//! transfer task, which is cooperatively cancelled and joined before any
//! cancellation-dependent state is reported.
//!
//! # Examples
//!
//! ```rust,no_run
//! use stamina::engine::DownloadEngineBuilder;
//! use stamina::event::DownloadEvent;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let url = reqwest::Url::parse("https://example.com/app-1.2.3.apk")?;
//! let (mut engine, mut events) = DownloadEngineBuilder::new()
//!     .build(url, "downloads/app-1.2.3.apk".into())?;
//!
//! engine.start()?;
//! while let Some(event) = events.recv().await {
//!     match event {
//!         DownloadEvent::Downloading(fraction) => println!("{:.0}%", fraction * 100.0),
//!         DownloadEvent::Downloaded => break,
//!         other => println!("{:?}", other),
//!     }
//! }
//! # Ok(())
//! # }
//! ```

use super::config::EngineConfig;
use super::transfer::{self, TransferContext};
use crate::error::{Error, Result};
use crate::event::{self, DownloadEvent, EventSender, EventStream};
use crate::http::client::{create_http_client, HttpClientConfig};
use crate::store::PartialStore;

use reqwest::Url;
use reqwest_middleware::ClientWithMiddleware;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::OnceCell;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Handle to the currently running transfer task.
struct Transfer {
    token: CancellationToken,
    handle: JoinHandle<()>,
}

/// The per-artifact download state machine.
pub struct DownloadEngine {
    url: Url,
    store: PartialStore,
    client: ClientWithMiddleware,
    config: EngineConfig,
    events: EventSender,
    /// Total resource size, probed at most once per engine lifetime.
    total_size: Arc<OnceCell<u64>>,
    finished: Arc<AtomicBool>,
    created: bool,
    transfer: Option<Transfer>,
}

impl fmt::Debug for DownloadEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloadEngine")
            .field("url", &self.url.as_str())
            .field("final_path", &self.store.final_path())
            .field("created", &self.created)
            .field("finished", &self.is_finished())
            .field("active", &self.is_active())
            .finish()
    }
}

impl DownloadEngine {
    /// Creates an engine and the stream its events are delivered on.
    pub(crate) fn new(
        url: Url,
        final_file: PathBuf,
        config: EngineConfig,
    ) -> Result<(Self, EventStream)> {
        let client = create_http_client(HttpClientConfig {
            retries: config.retries,
            proxy: config.proxy.clone(),
            headers: config.headers.clone(),
        })?;
        let (events, stream) = event::channel();
        let engine = Self {
            url,
            store: PartialStore::new(final_file),
            client,
            config,
            events,
            total_size: Arc::new(OnceCell::new()),
            finished: Arc::new(AtomicBool::new(false)),
            created: false,
            transfer: None,
        };
        Ok((engine, stream))
    }

    /// URL of the remote byte stream.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Path the completed artifact is promoted to.
    pub fn final_path(&self) -> &Path {
        self.store.final_path()
    }

    /// Path of the in-progress cache file.
    pub fn cache_path(&self) -> &Path {
        self.store.cache_path()
    }

    /// Whether a transfer has ever been started on this engine.
    pub fn is_created(&self) -> bool {
        self.created
    }

    /// Whether a transfer task is currently running (or waiting to retry).
    pub fn is_active(&self) -> bool {
        self.transfer
            .as_ref()
            .is_some_and(|transfer| !transfer.handle.is_finished())
    }

    /// Whether all bytes were written and promoted to the final file.
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::SeqCst)
    }

    /// Starts the download.
    ///
    /// Valid only when no transfer has ever been created on this engine.
    /// If a cache file was left behind by a previous run, the transfer
    /// resumes from its length instead of starting at zero.
    ///
    /// Emits [`StartCreating`] immediately and [`Created`] once the transfer
    /// task is active.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidState`] when the engine already finished or a
    /// transfer was already created.
    ///
    /// [`StartCreating`]: DownloadEvent::StartCreating
    /// [`Created`]: DownloadEvent::Created
    pub fn start(&mut self) -> Result<()> {
        self.ensure_not_finished("start")?;
        if self.created || self.transfer.is_some() {
            return Err(Error::InvalidState(
                "transfer is already created".to_string(),
            ));
        }
        debug!("Starting download of {}", self.url);
        self.emit(DownloadEvent::StartCreating);
        self.created = true;
        self.spawn_transfer(DownloadEvent::Created);
        Ok(())
    }

    /// Pauses the active transfer.
    ///
    /// Cooperatively cancels the transfer task and waits for it to fully
    /// stop, so no write is in flight once this returns. The cache file
    /// keeps every byte written so far.
    ///
    /// Emits [`StartPausing`] immediately and [`Paused`] after the task has
    /// stopped.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidState`] when the engine finished, was never started,
    /// or is already paused.
    ///
    /// [`StartPausing`]: DownloadEvent::StartPausing
    /// [`Paused`]: DownloadEvent::Paused
    pub async fn pause(&mut self) -> Result<()> {
        self.ensure_not_finished("pause")?;
        if !self.created || self.transfer.is_none() {
            return Err(Error::InvalidState(
                "no active transfer to pause".to_string(),
            ));
        }
        debug!("Pausing download of {}", self.url);
        self.emit(DownloadEvent::StartPausing);
        self.stop_transfer().await;
        self.emit(DownloadEvent::Paused);
        Ok(())
    }

    /// Resumes a paused transfer.
    ///
    /// Re-opens a ranged request starting at the current cache-file length.
    /// The content length probed before the pause is reused.
    ///
    /// Emits [`StartResuming`] immediately and [`Resumed`] once the transfer
    /// task is active.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidState`] when the engine finished, was never started,
    /// or is not paused.
    ///
    /// [`StartResuming`]: DownloadEvent::StartResuming
    /// [`Resumed`]: DownloadEvent::Resumed
    pub fn resume(&mut self) -> Result<()> {
        self.ensure_not_finished("resume")?;
        if !self.created {
            return Err(Error::InvalidState(
                "transfer was never started".to_string(),
            ));
        }
        if self.transfer.is_some() {
            return Err(Error::InvalidState(
                "transfer is already active".to_string(),
            ));
        }
        debug!("Resuming download of {}", self.url);
        self.emit(DownloadEvent::StartResuming);
        self.spawn_transfer(DownloadEvent::Resumed);
        Ok(())
    }

    /// Cancels the download and removes its on-disk state.
    ///
    /// Stops any active transfer (suppressing a retry that was scheduled
    /// but not yet fired), deletes the cache file (or the final file when
    /// the download already finished) and resets the engine so `start()`
    /// is valid again.
    ///
    /// Emits [`StartPurging`] immediately and [`Purged`] when done.
    ///
    /// [`StartPurging`]: DownloadEvent::StartPurging
    /// [`Purged`]: DownloadEvent::Purged
    pub async fn purge(&mut self) -> Result<()> {
        debug!("Purging download of {}", self.url);
        self.emit(DownloadEvent::StartPurging);
        self.stop_transfer().await;
        if self.is_finished() {
            self.store.remove_final().await?;
        } else {
            self.store.remove_cache().await?;
        }
        self.created = false;
        self.finished.store(false, Ordering::SeqCst);
        self.emit(DownloadEvent::Purged);
        Ok(())
    }

    /// Cancels the transfer task, if any, and waits for it to stop.
    async fn stop_transfer(&mut self) {
        if let Some(transfer) = self.transfer.take() {
            transfer.token.cancel();
            if let Err(e) = transfer.handle.await {
                warn!("Transfer task of {} ended abnormally: {}", self.url, e);
            }
        }
    }

    fn spawn_transfer(&mut self, registered: DownloadEvent) {
        let token = CancellationToken::new();
        let ctx = TransferContext {
            url: self.url.clone(),
            store: self.store.clone(),
            client: self.client.clone(),
            events: self.events.clone(),
            total_size: Arc::clone(&self.total_size),
            finished: Arc::clone(&self.finished),
            token: token.clone(),
            retry_delay: self.config.retry_delay,
        };
        let handle = tokio::spawn(transfer::run(ctx, registered));
        self.transfer = Some(Transfer { token, handle });
    }

    fn ensure_not_finished(&self, operation: &str) -> Result<()> {
        if self.is_finished() {
            return Err(Error::InvalidState(format!(
                "cannot {}: download already finished",
                operation
            )));
        }
        Ok(())
    }

    fn emit(&self, event: DownloadEvent) {
        // The observer may be gone; events are then simply discarded.
        let _ = self.events.send(event);
    }
}

impl Drop for DownloadEngine {
    fn drop(&mut self) {
        // Let a still-running transfer task wind down at its next chunk
        // boundary instead of leaking it.
        if let Some(transfer) = &self.transfer {
            transfer.token.cancel();
        }
    }
}
