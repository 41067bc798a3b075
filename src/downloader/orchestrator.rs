// Download orchestrator: fetch the chosen tracks, merge adaptive ones,
// and clean up intermediate files on every exit path.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::errors::DownloadError;
use super::models::{DownloadPhase, StatusUpdate, StreamChoice};
use super::session::Session;
use super::traits::{ProgressSink, Remuxer, StreamProvider};
use super::utils::{output_path, temp_path};

/// Where finished files and intermediate tracks land
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    pub output_dir: PathBuf,
    /// Directory for per-invocation temporary tracks
    pub scratch_dir: PathBuf,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("."),
            scratch_dir: PathBuf::from("."),
        }
    }
}

/// Removes intermediate track files when the invocation ends, whether the
/// merge succeeded or a phase bailed out early.
struct TempGuard {
    paths: Vec<PathBuf>,
}

impl TempGuard {
    fn new(paths: Vec<PathBuf>) -> Self {
        Self { paths }
    }
}

impl Drop for TempGuard {
    fn drop(&mut self) {
        for path in &self.paths {
            if path.exists() {
                if let Err(e) = std::fs::remove_file(path) {
                    eprintln!("[Orchestrator] Failed to remove {}: {}", path.display(), e);
                }
            }
        }
    }
}

pub struct DownloadOrchestrator {
    provider: Arc<dyn StreamProvider>,
    remuxer: Arc<dyn Remuxer>,
    config: DownloadConfig,
}

impl DownloadOrchestrator {
    pub fn new(provider: Arc<dyn StreamProvider>, remuxer: Arc<dyn Remuxer>) -> Self {
        Self::with_config(provider, remuxer, DownloadConfig::default())
    }

    pub fn with_config(
        provider: Arc<dyn StreamProvider>,
        remuxer: Arc<dyn Remuxer>,
        config: DownloadConfig,
    ) -> Self {
        Self {
            provider,
            remuxer,
            config,
        }
    }

    /// Download the choice identified by `label` from a resolved session.
    ///
    /// Emits phase transitions and coarse progress milestones on `sink`, and
    /// checks `cancel` between phases. On success returns the final output
    /// path; on failure the selection state is untouched so the same choice
    /// can be retried.
    pub async fn download(
        &self,
        session: &Session,
        label: &str,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<PathBuf, DownloadError> {
        match self.run(session, label, sink, cancel).await {
            Ok(path) => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().to_string())
                    .unwrap_or_default();
                let short: String = name.chars().take(40).collect();
                sink.emit(StatusUpdate::info(
                    DownloadPhase::Done,
                    1.0,
                    format!("Saved: {}", short),
                ));
                eprintln!("[Orchestrator] ✓ Saved {}", path.display());
                Ok(path)
            }
            Err(e) => {
                sink.emit(StatusUpdate::error(DownloadPhase::Failed, e.brief()));
                eprintln!("[Orchestrator] ✗ {}", e);
                Err(e)
            }
        }
    }

    async fn run(
        &self,
        session: &Session,
        label: &str,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<PathBuf, DownloadError> {
        if session.is_empty() {
            return Err(DownloadError::NothingSelected);
        }
        let choice = session.get(label).ok_or(DownloadError::NothingSelected)?;

        let video = session.video();
        let output = output_path(&self.config.output_dir, &video.title, &choice.resolution);

        sink.emit(StatusUpdate::info(DownloadPhase::Idle, 0.0, "Starting download..."));

        let result = if choice.is_adaptive() {
            self.download_adaptive(session, choice, &output, sink, cancel)
                .await
        } else {
            self.download_progressive(session, choice, &output, sink, cancel)
                .await
        };

        if let Err(e) = result {
            // ffmpeg -y (and a direct fetch) may have created the output
            // before failing; a failed download must leave no final file
            if output.exists() {
                if let Err(rm) = std::fs::remove_file(&output) {
                    eprintln!(
                        "[Orchestrator] Failed to remove partial {}: {}",
                        output.display(),
                        rm
                    );
                }
            }
            return Err(e);
        }

        Ok(output)
    }

    /// Adaptive path: video track, audio track, then a stream-copy merge
    async fn download_adaptive(
        &self,
        session: &Session,
        choice: &StreamChoice,
        output: &Path,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<(), DownloadError> {
        let audio = session.best_audio().ok_or_else(|| {
            DownloadError::ExecutionError("no audio-only track available to merge".to_string())
        })?;

        // Unique per invocation so concurrent downloads cannot clobber
        // each other's intermediate tracks
        let token = Uuid::new_v4();
        let v_temp = temp_path(&self.config.scratch_dir, "v", &token);
        let a_temp = temp_path(&self.config.scratch_dir, "a", &token);
        let _guard = TempGuard::new(vec![v_temp.clone(), a_temp.clone()]);

        check_cancel(cancel)?;
        sink.emit(StatusUpdate::info(
            DownloadPhase::FetchingVideo,
            0.2,
            "Downloading video track...",
        ));
        self.provider
            .fetch(session.video(), &choice.format, &v_temp, &|f| {
                sink.emit(StatusUpdate::info(
                    DownloadPhase::FetchingVideo,
                    0.2 + f * 0.3,
                    "Downloading video track...",
                ));
            })
            .await?;

        check_cancel(cancel)?;
        sink.emit(StatusUpdate::info(
            DownloadPhase::FetchingAudio,
            0.5,
            "Downloading audio track...",
        ));
        self.provider
            .fetch(session.video(), audio, &a_temp, &|f| {
                sink.emit(StatusUpdate::info(
                    DownloadPhase::FetchingAudio,
                    0.5 + f * 0.3,
                    "Downloading audio track...",
                ));
            })
            .await?;

        check_cancel(cancel)?;
        sink.emit(StatusUpdate::info(
            DownloadPhase::Merging,
            0.8,
            format!("Merging tracks ({})...", self.remuxer.name()),
        ));
        self.remuxer.merge(&v_temp, &a_temp, output).await?;

        Ok(())
    }

    /// Progressive path: audio is already baked in, write straight to output
    async fn download_progressive(
        &self,
        session: &Session,
        choice: &StreamChoice,
        output: &Path,
        sink: &dyn ProgressSink,
        cancel: &CancellationToken,
    ) -> Result<(), DownloadError> {
        check_cancel(cancel)?;
        sink.emit(StatusUpdate::info(
            DownloadPhase::FetchingVideo,
            0.5,
            "Downloading video...",
        ));
        self.provider
            .fetch(session.video(), &choice.format, output, &|f| {
                sink.emit(StatusUpdate::info(
                    DownloadPhase::FetchingVideo,
                    0.5 + f * 0.45,
                    "Downloading video...",
                ));
            })
            .await
    }
}

fn check_cancel(cancel: &CancellationToken) -> Result<(), DownloadError> {
    if cancel.is_cancelled() {
        Err(DownloadError::Cancelled)
    } else {
        Ok(())
    }
}
