//! The background transfer task.
//!
//! One task runs per active engine. It drives the attempt loop: probe the
//! total size, open a ranged request at the cache file's current length,
//! stream chunks to disk, verify, and promote. Any failure emits `Failed`
//! and schedules an automatic restart after a fixed backoff, indefinitely,
//! until cancellation wins the race.

use crate::error::{Error, Result};
use crate::event::{DownloadEvent, EventSender};
use crate::http::probe;
use crate::store::PartialStore;

use futures::StreamExt;
use reqwest::header::RANGE;
use reqwest::Url;
use reqwest_middleware::ClientWithMiddleware;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::sync::OnceCell;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Everything the transfer task needs, detached from the engine so the
/// engine itself stays free to accept pause/purge calls.
pub(crate) struct TransferContext {
    pub url: Url,
    pub store: PartialStore,
    pub client: ClientWithMiddleware,
    pub events: EventSender,
    pub total_size: Arc<OnceCell<u64>>,
    pub finished: Arc<AtomicBool>,
    pub token: CancellationToken,
    pub retry_delay: Duration,
}

enum Outcome {
    Complete,
    Cancelled,
}

/// Entry point of the transfer task.
///
/// `registered` is the event announcing the task as active: `Created` when
/// spawned by `start()`, `Resumed` when spawned by `resume()`.
pub(crate) async fn run(ctx: TransferContext, registered: DownloadEvent) {
    emit(&ctx.events, registered);
    loop {
        match attempt(&ctx).await {
            Ok(Outcome::Complete) => {
                ctx.finished.store(true, Ordering::SeqCst);
                emit(&ctx.events, DownloadEvent::Downloaded);
                return;
            }
            Ok(Outcome::Cancelled) => return,
            Err(cause) => {
                warn!("Transfer of {} failed: {}", ctx.url, cause);
                emit(&ctx.events, DownloadEvent::Failed(cause));
                emit(&ctx.events, DownloadEvent::StartWaitingRetry);
                tokio::select! {
                    _ = ctx.token.cancelled() => return,
                    _ = tokio::time::sleep(ctx.retry_delay) => {}
                }
                // The automatic restart goes back through the creating
                // states, like a fresh start() would.
                emit(&ctx.events, DownloadEvent::StartCreating);
                emit(&ctx.events, DownloadEvent::Created);
            }
        }
    }
}

/// One transfer attempt: resume offset from disk, probe, ranged read,
/// stream to the cache file, verify, promote.
async fn attempt(ctx: &TransferContext) -> Result<Outcome> {
    let offset = ctx.store.resume_offset().await?;
    let total = *ctx
        .total_size
        .get_or_try_init(|| probe::content_length(&ctx.client, &ctx.url))
        .await?;
    debug!("Fetching {} from offset {} of {}", ctx.url, offset, total);

    if offset == total {
        // Every byte is already on disk; only the promotion from a previous
        // attempt is missing.
        ctx.store.touch_cache().await?;
        ctx.store.promote().await?;
        return Ok(Outcome::Complete);
    }
    if offset > total {
        // Stale cache from a different remote resource. Discard it so the
        // retry starts clean.
        ctx.store.remove_cache().await?;
        return Err(Error::Internal(format!(
            "cache file exceeds remote size ({} > {})",
            offset, total
        )));
    }

    let res = ctx
        .client
        .get(ctx.url.as_str())
        .header(RANGE, format!("bytes={}-", offset))
        .send()
        .await?;
    res.error_for_status_ref()
        .map_err(|e| Error::Reqwest { source: e })?;

    let mut file = ctx.store.writer_at(offset).await?;
    let mut written: u64 = 0;
    let mut stream = res.bytes_stream();

    loop {
        // Cancellation takes effect only at chunk boundaries; pause/purge
        // wait for this loop to observe the token and stop.
        let item = tokio::select! {
            biased;
            _ = ctx.token.cancelled() => {
                let _ = file.sync_all().await;
                return Ok(Outcome::Cancelled);
            }
            item = stream.next() => item,
        };
        match item {
            None => break,
            Some(Ok(chunk)) => {
                file.write_all(&chunk).await?;
                written += chunk.len() as u64;
                emit(
                    &ctx.events,
                    DownloadEvent::Downloading(fraction(offset + written, total)),
                );
            }
            Some(Err(e)) => {
                let _ = file.sync_all().await;
                return Err(e.into());
            }
        }
    }

    file.sync_all().await?;
    drop(file);

    // The disk, not the in-memory counter, decides whether we are done.
    let received = ctx.store.resume_offset().await?;
    if received != total {
        return Err(Error::Truncated {
            expected: total,
            received,
        });
    }
    ctx.store.promote().await?;
    Ok(Outcome::Complete)
}

fn fraction(written: u64, total: u64) -> f64 {
    if total == 0 {
        1.0
    } else {
        (written as f64 / total as f64).min(1.0)
    }
}

fn emit(events: &EventSender, event: DownloadEvent) {
    let _ = events.send(event);
}
