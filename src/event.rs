//! Events emitted by a [`DownloadEngine`].
//!
//! Every externally observable state transition of an engine is published as
//! a [`DownloadEvent`] on an in-order channel. `Start*` variants mark the
//! beginning of a transition, during which the engine should be treated as
//! busy; the matching plain variant marks its completion.
//!
//! [`DownloadEngine`]: crate::engine::DownloadEngine

use crate::error::Error;

use tokio::sync::mpsc;

/// Receiving half of an engine's event channel.
///
/// The channel is unbounded: state-transition events are never dropped and
/// always arrive in the order they were emitted.
pub type EventStream = mpsc::UnboundedReceiver<DownloadEvent>;

pub(crate) type EventSender = mpsc::UnboundedSender<DownloadEvent>;

/// A state transition or progress notification from a download engine.
#[derive(Debug)]
pub enum DownloadEvent {
    /// `start()` was accepted; the transfer task is being spawned.
    StartCreating,
    /// The transfer task is registered and active.
    Created,
    /// `pause()` was accepted; the in-flight transfer is being cancelled.
    StartPausing,
    /// The transfer fully stopped; the cache file keeps all written bytes.
    Paused,
    /// `resume()` was accepted; a ranged transfer is being spawned.
    StartResuming,
    /// The resumed transfer task is registered and active.
    Resumed,
    /// Bytes arrived; fraction of the total written so far, in `[0, 1]`.
    Downloading(f64),
    /// `purge()` was accepted; transfer and on-disk state are being removed.
    StartPurging,
    /// Cache (or final) file removed, engine reset to its initial state.
    Purged,
    /// All bytes written, verified, and promoted to the final file. Terminal.
    Downloaded,
    /// A transfer attempt failed; informational, an automatic retry follows.
    Failed(Error),
    /// The engine is waiting out the retry backoff before restarting.
    StartWaitingRetry,
}

impl DownloadEvent {
    /// Progress fraction carried by a [`Downloading`] event.
    ///
    /// [`Downloading`]: DownloadEvent::Downloading
    pub fn progress(&self) -> Option<f64> {
        match self {
            DownloadEvent::Downloading(fraction) => Some(*fraction),
            _ => None,
        }
    }

    /// Whether this event ends the engine's lifecycle for the artifact.
    pub fn is_terminal(&self) -> bool {
        matches!(self, DownloadEvent::Downloaded)
    }
}

pub(crate) fn channel() -> (EventSender, EventStream) {
    mpsc::unbounded_channel()
}
