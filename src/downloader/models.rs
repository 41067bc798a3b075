// Common data models for the resolver and orchestrator

use serde::{Deserialize, Serialize};

const BYTES_PER_MB: f64 = 1_048_576.0;

/// Video metadata returned by a stream provider
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VideoInfo {
    pub id: String,
    pub title: String,
    pub url: String,
}

/// One raw stream as exposed by the provider.
///
/// The provider owns the meaning of `format_id`; the core only passes it back
/// when asking for the bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamFormat {
    pub format_id: String,
    /// Container extension (mp4, webm, m4a)
    pub ext: String,
    /// Resolution label (e.g., "1080p"); audio-only streams have none
    pub resolution: Option<String>,
    /// Video-only track that needs a separate audio track
    pub is_adaptive: bool,
    /// Audio-only track (candidate for the merge step)
    pub audio_only: bool,
    /// File size in bytes (exact or provider-approximate)
    pub filesize: Option<u64>,
    /// Direct media URL, when the provider exposes one
    pub url: Option<String>,
}

impl StreamFormat {
    pub fn size_mb(&self) -> f64 {
        self.filesize.unwrap_or(0) as f64 / BYTES_PER_MB
    }
}

/// How a stream delivers its audio
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StreamKind {
    /// Video-only; audio is fetched separately and merged
    Adaptive,
    /// Audio already baked into the track
    Progressive,
}

impl StreamKind {
    /// Category text used in display labels
    pub fn category(&self) -> &'static str {
        match self {
            Self::Adaptive => "High Quality (Merged)",
            Self::Progressive => "Standard (Direct)",
        }
    }
}

/// One selectable download option, as shown to the user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamChoice {
    /// Unique human-readable label, e.g. "1080p | High Quality (Merged) | 85.3 MB"
    pub label: String,
    pub resolution: String,
    pub kind: StreamKind,
    /// Video size plus best-audio size for adaptive streams
    pub estimated_size_mb: f64,
    /// The underlying video stream handle
    pub format: StreamFormat,
}

impl StreamChoice {
    pub fn new(resolution: &str, kind: StreamKind, estimated_size_mb: f64, format: StreamFormat) -> Self {
        Self {
            label: format!("{} | {} | {:.1} MB", resolution, kind.category(), estimated_size_mb),
            resolution: resolution.to_string(),
            kind,
            estimated_size_mb,
            format,
        }
    }

    pub fn is_adaptive(&self) -> bool {
        self.kind == StreamKind::Adaptive
    }
}

/// Phases of one download invocation.
///
/// `Failed` and `Done` are terminal; any phase may transition to `Failed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DownloadPhase {
    Idle,
    FetchingVideo,
    /// Adaptive downloads only
    FetchingAudio,
    /// Adaptive downloads only
    Merging,
    Done,
    Failed,
}

/// Severity of a status message, for UI presentation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// One progress/status event emitted to the UI shell
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdate {
    pub phase: DownloadPhase,
    /// Coarse progress fraction in [0, 1]; milestone-grained, not byte-exact
    pub fraction: f32,
    pub message: String,
    pub severity: Severity,
}

impl StatusUpdate {
    pub fn info(phase: DownloadPhase, fraction: f32, message: impl Into<String>) -> Self {
        Self {
            phase,
            fraction,
            message: message.into(),
            severity: Severity::Info,
        }
    }

    pub fn error(phase: DownloadPhase, message: impl Into<String>) -> Self {
        Self {
            phase,
            fraction: 0.0,
            message: message.into(),
            severity: Severity::Error,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn format(size: u64) -> StreamFormat {
        StreamFormat {
            format_id: "137".to_string(),
            ext: "mp4".to_string(),
            resolution: Some("1080p".to_string()),
            is_adaptive: true,
            audio_only: false,
            filesize: Some(size),
            url: None,
        }
    }

    #[test]
    fn test_label_format() {
        let choice = StreamChoice::new("1080p", StreamKind::Adaptive, 45.0, format(40 * 1_048_576));
        assert_eq!(choice.label, "1080p | High Quality (Merged) | 45.0 MB");

        let choice = StreamChoice::new("480p", StreamKind::Progressive, 20.0, format(20 * 1_048_576));
        assert_eq!(choice.label, "480p | Standard (Direct) | 20.0 MB");
    }

    #[test]
    fn test_size_mb() {
        let f = format(10 * 1_048_576);
        assert!((f.size_mb() - 10.0).abs() < 1e-9);
    }
}
