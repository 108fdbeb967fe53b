//! Per-artifact task registry.
//!
//! A [`TaskRegistry`] owns at most one [`DownloadEngine`] per artifact and
//! forwards intents (download, pause, resume, cancel) to it. Artifacts are
//! keyed by an explicit stable string (see [`artifact_key`]) rather than by
//! a richer value object, so map identity never depends on structural
//! equality of remote metadata.
//!
//! The registry requires `&mut self` for every operation, which serializes
//! access to each engine as the engines expect.

use crate::artifact::Artifact;
use crate::engine::{DownloadEngine, DownloadEngineBuilder, EngineConfig};
use crate::error::{Error, Result};
use crate::event::EventStream;

use std::collections::HashMap;
use std::path::PathBuf;

/// Builds a stable registry key from a package name and a version.
///
/// ```rust
/// use stamina::registry::artifact_key;
///
/// assert_eq!(artifact_key("org.example.keyboard", "0.0.8"), "org.example.keyboard:0.0.8");
/// ```
pub fn artifact_key(package: &str, version: &str) -> String {
    format!("{}:{}", package, version)
}

/// Holds one download engine per artifact and forwards intents to it.
pub struct TaskRegistry {
    directory: PathBuf,
    config: EngineConfig,
    tasks: HashMap<String, DownloadEngine>,
}

impl TaskRegistry {
    /// Creates a registry whose downloads land in `directory`.
    pub fn new(directory: PathBuf) -> Self {
        Self::with_config(directory, EngineConfig::default())
    }

    /// Creates a registry with a custom engine configuration applied to
    /// every download it starts.
    pub fn with_config(directory: PathBuf, config: EngineConfig) -> Self {
        Self {
            directory,
            config,
            tasks: HashMap::new(),
        }
    }

    /// Directory completed artifacts are stored in.
    pub fn directory(&self) -> &PathBuf {
        &self.directory
    }

    /// Constructs an engine for `artifact`, starts it, and registers it
    /// under `key`.
    ///
    /// Returns the engine's event stream for the caller to observe.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidState`] when a download is already registered under
    /// `key`: at most one engine exists per artifact.
    pub fn download(&mut self, key: &str, artifact: &Artifact) -> Result<EventStream> {
        if self.tasks.contains_key(key) {
            return Err(Error::InvalidState(format!(
                "a download is already registered for \"{}\"",
                key
            )));
        }
        let final_file = self.directory.join(&artifact.filename);
        let (mut engine, events) = DownloadEngineBuilder::with_config(self.config.clone())
            .build(artifact.url.clone(), final_file)?;
        engine.start()?;
        self.tasks.insert(key.to_string(), engine);
        Ok(events)
    }

    /// Pauses the download registered under `key`.
    pub async fn pause(&mut self, key: &str) -> Result<()> {
        self.engine_mut(key)?.pause().await
    }

    /// Resumes the download registered under `key`.
    pub fn resume(&mut self, key: &str) -> Result<()> {
        self.engine_mut(key)?.resume()
    }

    /// Cancels the download registered under `key`: purges its on-disk
    /// state and forgets the engine.
    pub async fn cancel(&mut self, key: &str) -> Result<()> {
        self.engine_mut(key)?.purge().await?;
        self.tasks.remove(key);
        Ok(())
    }

    /// Looks up the engine registered under `key`.
    pub fn get(&self, key: &str) -> Option<&DownloadEngine> {
        self.tasks.get(key)
    }

    /// Removes and returns the engine registered under `key`, leaving its
    /// on-disk state untouched.
    pub fn remove(&mut self, key: &str) -> Option<DownloadEngine> {
        self.tasks.remove(key)
    }

    /// Number of registered downloads.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether no download is registered.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    fn engine_mut(&mut self, key: &str) -> Result<&mut DownloadEngine> {
        self.tasks.get_mut(key).ok_or_else(|| {
            Error::InvalidState(format!("no download registered for \"{}\"", key))
        })
    }
}
