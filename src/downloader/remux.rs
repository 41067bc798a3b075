// ffmpeg-backed remuxer: stream-copy merge of separate video/audio tracks

use async_trait::async_trait;
use std::path::Path;
use std::process::Command as StdCommand;

use super::errors::DownloadError;
use super::traits::Remuxer;
use super::utils::run_output_with_timeout;

// A stream-copy remux is I/O bound; this is generous even for long videos
const MERGE_TIMEOUT_SECS: u64 = 600;

pub struct FfmpegRemuxer {
    ffmpeg_path: String,
}

impl FfmpegRemuxer {
    pub fn new() -> Self {
        Self {
            ffmpeg_path: find_ffmpeg(),
        }
    }

    /// Check that the ffmpeg binary actually runs
    pub fn is_available(&self) -> bool {
        match StdCommand::new(&self.ffmpeg_path).arg("-version").output() {
            Ok(out) => out.status.success(),
            Err(_) => false,
        }
    }

    pub fn path(&self) -> &str {
        &self.ffmpeg_path
    }
}

impl Default for FfmpegRemuxer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Remuxer for FfmpegRemuxer {
    fn name(&self) -> &'static str {
        "ffmpeg"
    }

    async fn merge(
        &self,
        video: &Path,
        audio: &Path,
        output: &Path,
    ) -> Result<(), DownloadError> {
        let args = vec![
            "-y".to_string(),
            "-i".to_string(),
            video.to_string_lossy().to_string(),
            "-i".to_string(),
            audio.to_string_lossy().to_string(),
            "-c".to_string(),
            "copy".to_string(),
            output.to_string_lossy().to_string(),
        ];

        let result = run_output_with_timeout(&self.ffmpeg_path, args, MERGE_TIMEOUT_SECS).await;

        let out = match result {
            Ok(out) => out,
            Err(e) if e.contains("Failed to start") => {
                return Err(DownloadError::ToolNotFound(format!("ffmpeg: {}", e)))
            }
            Err(e) => return Err(DownloadError::ExecutionError(e)),
        };

        if out.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&out.stderr);
            // The tail of ffmpeg's stderr carries the actual failure
            let tail: String = stderr
                .lines()
                .rev()
                .take(3)
                .collect::<Vec<_>>()
                .into_iter()
                .rev()
                .collect::<Vec<_>>()
                .join(" ");
            Err(DownloadError::MergeFailed(tail))
        }
    }
}

/// Find the ffmpeg binary in common install locations, then PATH
fn find_ffmpeg() -> String {
    let common_paths = vec![
        "/opt/homebrew/bin/ffmpeg", // Homebrew on Apple Silicon
        "/usr/local/bin/ffmpeg",    // Homebrew on Intel Mac
        "/usr/bin/ffmpeg",          // System installation
    ];

    for path in common_paths {
        if Path::new(path).exists() {
            return path.to_string();
        }
    }

    if let Ok(output) = StdCommand::new("which").arg("ffmpeg").output() {
        if output.status.success() {
            if let Ok(path) = String::from_utf8(output.stdout) {
                let trimmed = path.trim();
                if !trimmed.is_empty() {
                    return trimmed.to_string();
                }
            }
        }
    }

    "ffmpeg".to_string()
}
