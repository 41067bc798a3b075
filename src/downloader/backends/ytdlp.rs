// yt-dlp backed stream provider.
//
// Metadata and format enumeration come from `yt-dlp --dump-json`. Track bytes
// are streamed straight off the format's direct URL when yt-dlp exposes one;
// otherwise the download falls back to a `yt-dlp -f <id>` subprocess.

use async_trait::async_trait;
use futures::StreamExt;
use std::path::Path;
use std::process::Command as StdCommand;
use std::time::Duration;
use tokio::io::AsyncWriteExt;

use crate::downloader::errors::{DownloadError, ResolveError};
use crate::downloader::models::{StreamFormat, VideoInfo};
use crate::downloader::traits::{ProgressFn, StreamProvider};
use crate::downloader::utils::run_output_with_timeout;

const METADATA_TIMEOUT_SECS: u64 = 60;
const DOWNLOAD_TIMEOUT_SECS: u64 = 1800;
// Coarse UI milestones; we deliberately do not report every chunk
const MILESTONES: [f32; 3] = [0.2, 0.5, 0.8];

pub struct YtDlpProvider {
    ytdlp_path: String,
    http: reqwest::Client,
}

impl YtDlpProvider {
    pub fn new() -> Self {
        Self {
            ytdlp_path: find_ytdlp(),
            http: reqwest::Client::builder()
                .timeout(Duration::from_secs(DOWNLOAD_TIMEOUT_SECS))
                .connect_timeout(Duration::from_secs(15))
                .build()
                .unwrap_or_else(|_| reqwest::Client::new()),
        }
    }

    /// Check if the yt-dlp binary actually runs
    pub fn is_available(&self) -> bool {
        match StdCommand::new(&self.ytdlp_path).arg("--version").output() {
            Ok(out) => out.status.success(),
            Err(_) => false,
        }
    }

    fn parse_open(stdout: &[u8], url: &str) -> Result<(VideoInfo, Vec<StreamFormat>), ResolveError> {
        let json_str = String::from_utf8_lossy(stdout);
        let json: serde_json::Value = serde_json::from_str(&json_str)
            .map_err(|e| ResolveError::ParseError(format!("Invalid JSON: {}", e)))?;

        let video = VideoInfo {
            id: json["id"].as_str().unwrap_or("unknown").to_string(),
            title: json["title"].as_str().unwrap_or("Unknown").to_string(),
            url: json["webpage_url"].as_str().unwrap_or(url).to_string(),
        };

        let formats_array = json["formats"]
            .as_array()
            .ok_or_else(|| ResolveError::ParseError("No formats array in JSON".to_string()))?;

        let mut formats = Vec::with_capacity(formats_array.len());
        for f in formats_array {
            let vcodec = f["vcodec"].as_str().unwrap_or("none");
            let acodec = f["acodec"].as_str().unwrap_or("none");
            let has_video = vcodec != "none" && !vcodec.is_empty();
            let has_audio = acodec != "none" && !acodec.is_empty();

            let resolution = f["format_note"]
                .as_str()
                .filter(|n| n.ends_with('p') || n.ends_with("p60"))
                .map(|n| n.to_string())
                .or_else(|| f["height"].as_u64().map(|h| format!("{}p", h)));

            formats.push(StreamFormat {
                format_id: f["format_id"].as_str().unwrap_or("").to_string(),
                ext: f["ext"].as_str().unwrap_or("").to_string(),
                resolution: if has_video { resolution } else { None },
                is_adaptive: has_video && !has_audio,
                audio_only: has_audio && !has_video,
                filesize: f["filesize"]
                    .as_u64()
                    .or_else(|| f["filesize_approx"].as_u64()),
                url: f["url"].as_str().map(|s| s.to_string()),
            });
        }

        Ok((video, formats))
    }

    /// Stream the direct media URL to disk, reporting coarse milestones
    async fn fetch_direct(
        &self,
        media_url: &str,
        dest: &Path,
        progress: ProgressFn<'_>,
    ) -> Result<(), DownloadError> {
        let response = self
            .http
            .get(media_url)
            .send()
            .await
            .map_err(|e| DownloadError::Network(e.to_string()))?
            .error_for_status()
            .map_err(|e| DownloadError::Network(e.to_string()))?;

        let total = response.content_length();
        let mut file = tokio::fs::File::create(dest).await?;
        let mut stream = response.bytes_stream();
        let mut downloaded: u64 = 0;
        let mut next_milestone = 0;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| DownloadError::Network(e.to_string()))?;
            file.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;

            if let Some(total) = total {
                let frac = downloaded as f32 / total as f32;
                while next_milestone < MILESTONES.len() && frac >= MILESTONES[next_milestone] {
                    progress(MILESTONES[next_milestone]);
                    next_milestone += 1;
                }
            }
        }
        file.flush().await?;

        progress(1.0);
        Ok(())
    }

    /// Fallback for formats without a usable direct URL
    async fn fetch_via_subprocess(
        &self,
        page_url: &str,
        format_id: &str,
        dest: &Path,
    ) -> Result<(), DownloadError> {
        let args = vec![
            "-f".to_string(),
            format_id.to_string(),
            "--no-playlist".to_string(),
            "--no-warnings".to_string(),
            "-o".to_string(),
            dest.to_string_lossy().to_string(),
            page_url.to_string(),
        ];

        let out = run_output_with_timeout(&self.ytdlp_path, args, DOWNLOAD_TIMEOUT_SECS)
            .await
            .map_err(DownloadError::from)?;

        if out.status.success() {
            Ok(())
        } else {
            Err(String::from_utf8_lossy(&out.stderr).to_string().into())
        }
    }
}

impl Default for YtDlpProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StreamProvider for YtDlpProvider {
    fn name(&self) -> &'static str {
        "yt-dlp"
    }

    async fn open(&self, url: &str) -> Result<(VideoInfo, Vec<StreamFormat>), ResolveError> {
        if !url.starts_with("http://") && !url.starts_with("https://") {
            return Err(ResolveError::InvalidUrl(url.to_string()));
        }

        let args = vec![
            "--dump-json".to_string(),
            "--no-playlist".to_string(),
            "--no-warnings".to_string(),
            "--socket-timeout".to_string(),
            "30".to_string(),
            url.to_string(),
        ];

        let out = run_output_with_timeout(&self.ytdlp_path, args, METADATA_TIMEOUT_SECS)
            .await
            .map_err(ResolveError::from)?;

        if !out.status.success() {
            let stderr = String::from_utf8_lossy(&out.stderr);
            eprintln!("[YtDlp] ✗ metadata lookup failed: {}", stderr.trim());
            return Err(stderr.to_string().into());
        }

        Self::parse_open(&out.stdout, url)
    }

    async fn fetch(
        &self,
        video: &VideoInfo,
        format: &StreamFormat,
        dest: &Path,
        progress: ProgressFn<'_>,
    ) -> Result<(), DownloadError> {
        if let Some(media_url) = format.url.as_deref() {
            eprintln!("[YtDlp] Streaming format {} directly", format.format_id);
            match self.fetch_direct(media_url, dest, progress).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    // Direct URLs expire; the subprocess re-resolves them
                    eprintln!("[YtDlp] Direct fetch failed ({}), falling back", e.brief());
                }
            }
        }

        eprintln!("[YtDlp] Downloading format {} via subprocess", format.format_id);
        self.fetch_via_subprocess(&video.url, &format.format_id, dest)
            .await?;
        progress(1.0);
        Ok(())
    }
}

/// Find the yt-dlp binary in common install locations, then PATH
fn find_ytdlp() -> String {
    let common_paths = vec![
        "/opt/homebrew/bin/yt-dlp", // Homebrew on Apple Silicon
        "/usr/local/bin/yt-dlp",    // Homebrew on Intel Mac
        "/usr/bin/yt-dlp",          // System installation
    ];

    for path in common_paths {
        if Path::new(path).exists() {
            return path.to_string();
        }
    }

    if let Ok(output) = StdCommand::new("which").arg("yt-dlp").output() {
        if output.status.success() {
            if let Ok(path) = String::from_utf8(output.stdout) {
                let trimmed = path.trim();
                if !trimmed.is_empty() {
                    return trimmed.to_string();
                }
            }
        }
    }

    "yt-dlp".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_open() {
        let json = r#"{
            "id": "abc123",
            "title": "A Video",
            "webpage_url": "https://example.com/watch?v=abc123",
            "formats": [
                {"format_id": "137", "ext": "mp4", "format_note": "1080p",
                 "vcodec": "avc1.64002a", "acodec": "none", "filesize": 41943040,
                 "url": "https://cdn.example.com/137"},
                {"format_id": "18", "ext": "mp4", "height": 360,
                 "vcodec": "avc1.42001E", "acodec": "mp4a.40.2", "filesize_approx": 10485760},
                {"format_id": "140", "ext": "m4a",
                 "vcodec": "none", "acodec": "mp4a.40.2", "filesize": 5242880}
            ]
        }"#;

        let (video, formats) = YtDlpProvider::parse_open(json.as_bytes(), "u").unwrap();
        assert_eq!(video.id, "abc123");
        assert_eq!(video.title, "A Video");
        assert_eq!(formats.len(), 3);

        let hq = &formats[0];
        assert_eq!(hq.resolution.as_deref(), Some("1080p"));
        assert!(hq.is_adaptive);
        assert!(!hq.audio_only);
        assert_eq!(hq.filesize, Some(41943040));
        assert!(hq.url.is_some());

        let progressive = &formats[1];
        assert_eq!(progressive.resolution.as_deref(), Some("360p"));
        assert!(!progressive.is_adaptive);
        assert_eq!(progressive.filesize, Some(10485760));

        let audio = &formats[2];
        assert!(audio.audio_only);
        assert_eq!(audio.resolution, None);
    }

    #[test]
    fn test_parse_open_rejects_garbage() {
        let err = YtDlpProvider::parse_open(b"not json", "u").unwrap_err();
        assert!(matches!(err, ResolveError::ParseError(_)));

        let err = YtDlpProvider::parse_open(br#"{"id": "x"}"#, "u").unwrap_err();
        assert!(matches!(err, ResolveError::ParseError(_)));
    }

    #[tokio::test]
    async fn test_open_rejects_non_http_url() {
        let provider = YtDlpProvider::new();
        let err = provider.open("notaurl").await.unwrap_err();
        assert!(matches!(err, ResolveError::InvalidUrl(_)));
    }
}
