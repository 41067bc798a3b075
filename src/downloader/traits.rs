// Seam traits: platform client, remux tool, and UI feedback

use async_trait::async_trait;
use std::path::Path;
use tokio::sync::mpsc;

use super::errors::{DownloadError, ResolveError};
use super::models::{StatusUpdate, StreamFormat, VideoInfo};

/// Callback for coarse in-phase progress, fraction in [0, 1]
pub type ProgressFn<'a> = &'a (dyn Fn(f32) + Send + Sync);

/// Platform client capability: metadata lookup and per-stream byte transfer
#[async_trait]
pub trait StreamProvider: Send + Sync {
    /// Name of the provider (for logging)
    fn name(&self) -> &'static str;

    /// Open a URL and enumerate every stream the platform exposes for it
    async fn open(&self, url: &str) -> Result<(VideoInfo, Vec<StreamFormat>), ResolveError>;

    /// Download one stream's bytes to `dest`
    async fn fetch(
        &self,
        video: &VideoInfo,
        format: &StreamFormat,
        dest: &Path,
        progress: ProgressFn<'_>,
    ) -> Result<(), DownloadError>;
}

/// External media tool that merges a video track and an audio track
/// into one container without re-encoding
#[async_trait]
pub trait Remuxer: Send + Sync {
    /// Name of the tool (for logging)
    fn name(&self) -> &'static str;

    async fn merge(
        &self,
        video: &Path,
        audio: &Path,
        output: &Path,
    ) -> Result<(), DownloadError>;
}

/// Sink for status/progress events.
///
/// The core never touches presentation widgets; shells subscribe here.
pub trait ProgressSink: Send + Sync {
    fn emit(&self, update: StatusUpdate);
}

/// Channel-backed sink for shells that poll events from their own loop
pub struct ChannelSink {
    tx: mpsc::UnboundedSender<StatusUpdate>,
}

impl ChannelSink {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<StatusUpdate>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl ProgressSink for ChannelSink {
    fn emit(&self, update: StatusUpdate) {
        // Receiver gone means the shell stopped listening; drop silently
        let _ = self.tx.send(update);
    }
}

/// Sink that discards everything, for headless use and tests
pub struct NullSink;

impl ProgressSink for NullSink {
    fn emit(&self, _update: StatusUpdate) {}
}
