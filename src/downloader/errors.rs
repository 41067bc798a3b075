// Error types for format resolution and downloads

use std::fmt;

/// Longest one-line form a status bar is expected to show
const BRIEF_LEN: usize = 60;

fn truncate(msg: &str) -> String {
    if msg.chars().count() <= BRIEF_LEN {
        msg.to_string()
    } else {
        let head: String = msg.chars().take(BRIEF_LEN).collect();
        format!("{}…", head)
    }
}

/// Failures while resolving the format list for a URL
#[derive(Debug, Clone)]
pub enum ResolveError {
    /// URL is malformed or the platform refuses to recognize it
    InvalidUrl(String),

    /// Network failure or timeout while querying the platform
    Unreachable(String),

    /// The URL resolved but exposed no MP4 stream with a resolution
    NoUsableStreams,

    /// The platform client tool is not installed
    ToolNotFound(String),

    /// Failed to parse the platform client's output
    ParseError(String),
}

impl fmt::Display for ResolveError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidUrl(url) => write!(f, "Invalid URL: {}", url),
            Self::Unreachable(msg) => write!(f, "Could not reach the platform: {}", msg),
            Self::NoUsableStreams => write!(f, "No MP4 streams with a resolution were found"),
            Self::ToolNotFound(tool) => write!(f, "Tool not found: {}", tool),
            Self::ParseError(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

impl std::error::Error for ResolveError {}

impl ResolveError {
    /// One-line form, truncated to fit a status bar
    pub fn brief(&self) -> String {
        truncate(&self.to_string())
    }
}

// Classify raw tool/network stderr into an error kind
impl From<String> for ResolveError {
    fn from(s: String) -> Self {
        if s.contains("timeout") || s.contains("timed out") || s.contains("unreachable") {
            return Self::Unreachable(s);
        }
        if s.contains("not found") || s.contains("No such file") || s.contains("command not found")
        {
            return Self::ToolNotFound(s);
        }
        if s.contains("Invalid URL")
            || s.contains("Unsupported URL")
            || s.contains("is not a valid URL")
        {
            return Self::InvalidUrl(s);
        }
        if s.contains("parse") || s.contains("JSON") {
            return Self::ParseError(s);
        }
        Self::Unreachable(s)
    }
}

/// Failures while downloading tracks or merging them
#[derive(Debug, Clone)]
pub enum DownloadError {
    /// Network failure while fetching a track
    Network(String),

    /// ffmpeg (or the provider tool) is not installed
    ToolNotFound(String),

    /// The remux subprocess exited with a non-zero status
    MergeFailed(String),

    /// Could not write to the output or temporary paths
    Filesystem(String),

    /// The session had no choices or the label was unknown
    NothingSelected,

    /// The cancellation token fired between phases
    Cancelled,

    /// Command execution failed for another reason
    ExecutionError(String),
}

impl fmt::Display for DownloadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network(msg) => write!(f, "Network error: {}", msg),
            Self::ToolNotFound(tool) => write!(f, "Tool not found: {}", tool),
            Self::MergeFailed(msg) => write!(f, "Merge failed: {}", msg),
            Self::Filesystem(msg) => write!(f, "Filesystem error: {}", msg),
            Self::NothingSelected => write!(f, "No stream selected"),
            Self::Cancelled => write!(f, "Download cancelled"),
            Self::ExecutionError(msg) => write!(f, "Execution error: {}", msg),
        }
    }
}

impl std::error::Error for DownloadError {}

impl DownloadError {
    /// One-line form, truncated to fit a status bar
    pub fn brief(&self) -> String {
        truncate(&self.to_string())
    }
}

impl From<String> for DownloadError {
    fn from(s: String) -> Self {
        if s.contains("timeout") || s.contains("timed out") || s.contains("connection") {
            return Self::Network(s);
        }
        if s.contains("not found") || s.contains("No such file") || s.contains("command not found")
        {
            return Self::ToolNotFound(s);
        }
        if s.contains("Permission denied") || s.contains("No space left") {
            return Self::Filesystem(s);
        }
        Self::ExecutionError(s)
    }
}

impl From<std::io::Error> for DownloadError {
    fn from(e: std::io::Error) -> Self {
        Self::Filesystem(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_error_classification() {
        let e = ResolveError::from("Read timed out while contacting host".to_string());
        assert!(matches!(e, ResolveError::Unreachable(_)));

        let e = ResolveError::from("yt-dlp: command not found".to_string());
        assert!(matches!(e, ResolveError::ToolNotFound(_)));

        let e = ResolveError::from("ERROR: 'htp://x' is not a valid URL".to_string());
        assert!(matches!(e, ResolveError::InvalidUrl(_)));
    }

    #[test]
    fn test_download_error_classification() {
        let e = DownloadError::from("connection reset by peer".to_string());
        assert!(matches!(e, DownloadError::Network(_)));

        let e = DownloadError::from("ffmpeg: No such file or directory".to_string());
        assert!(matches!(e, DownloadError::ToolNotFound(_)));
    }

    #[test]
    fn test_brief_truncates() {
        let long = "x".repeat(200);
        let brief = DownloadError::Network(long).brief();
        assert!(brief.chars().count() <= 61);
    }
}
