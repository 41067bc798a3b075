// Format resolver: turn a URL into an ordered list of download choices

use super::errors::ResolveError;
use super::models::{StreamChoice, StreamFormat, StreamKind};
use super::session::Session;
use super::traits::StreamProvider;

pub struct FormatResolver;

impl FormatResolver {
    /// Resolve a URL into a session of MP4 download choices.
    ///
    /// Choices are ordered by descending resolution; adaptive entries carry
    /// the combined video+audio size estimate. Fails when the platform yields
    /// no MP4 stream with a resolution.
    pub async fn resolve(
        provider: &dyn StreamProvider,
        url: &str,
    ) -> Result<Session, ResolveError> {
        eprintln!("[Resolver] Resolving formats via {}", provider.name());

        let (video, formats) = provider.open(url).await?;

        let best_audio = Self::best_audio(&formats).cloned();
        let audio_mb = best_audio.as_ref().map(|a| a.size_mb()).unwrap_or(0.0);

        let mut candidates: Vec<(&StreamFormat, u32)> = formats
            .iter()
            .filter(|f| f.ext == "mp4" && !f.audio_only)
            // An adaptive track with no audio to merge can never deliver
            // what its label promises, so it is not offered
            .filter(|f| !(f.is_adaptive && best_audio.is_none()))
            .filter_map(|f| {
                f.resolution
                    .as_deref()
                    .filter(|r| !r.is_empty())
                    .and_then(resolution_height)
                    .map(|h| (f, h))
            })
            .collect();
        candidates.sort_by(|a, b| b.1.cmp(&a.1));

        let choices: Vec<StreamChoice> = candidates
            .into_iter()
            .map(|(format, _)| {
                let resolution = format.resolution.as_deref().unwrap_or_default();
                let (kind, total_mb) = if format.is_adaptive {
                    (StreamKind::Adaptive, format.size_mb() + audio_mb)
                } else {
                    (StreamKind::Progressive, format.size_mb())
                };
                StreamChoice::new(resolution, kind, total_mb, format.clone())
            })
            .collect();

        if choices.is_empty() {
            eprintln!("[Resolver] ✗ No usable MP4 streams for {}", url);
            return Err(ResolveError::NoUsableStreams);
        }

        let session = Session::new(video, choices, best_audio);
        eprintln!(
            "[Resolver] ✓ {} unique choice(s) for \"{}\"",
            session.choices().len(),
            session.video().title
        );
        Ok(session)
    }

    /// Pick the best audio-only track: largest file wins, which tracks
    /// bitrate closely enough for an estimate
    fn best_audio(formats: &[StreamFormat]) -> Option<&StreamFormat> {
        formats
            .iter()
            .filter(|f| f.audio_only)
            .max_by_key(|f| f.filesize.unwrap_or(0))
    }
}

/// Parse the pixel height out of a resolution label like "1080p"
fn resolution_height(resolution: &str) -> Option<u32> {
    let digits: String = resolution.chars().take_while(|c| c.is_ascii_digit()).collect();
    digits.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::downloader::errors::DownloadError;
    use crate::downloader::models::VideoInfo;
    use crate::downloader::traits::ProgressFn;
    use async_trait::async_trait;
    use std::path::Path;

    const MB: u64 = 1_048_576;

    struct FakeProvider {
        formats: Vec<StreamFormat>,
    }

    #[async_trait]
    impl StreamProvider for FakeProvider {
        fn name(&self) -> &'static str {
            "fake"
        }

        async fn open(
            &self,
            url: &str,
        ) -> Result<(VideoInfo, Vec<StreamFormat>), ResolveError> {
            Ok((
                VideoInfo {
                    id: "abc123".to_string(),
                    title: "Test Video".to_string(),
                    url: url.to_string(),
                },
                self.formats.clone(),
            ))
        }

        async fn fetch(
            &self,
            _video: &VideoInfo,
            _format: &StreamFormat,
            _dest: &Path,
            _progress: ProgressFn<'_>,
        ) -> Result<(), DownloadError> {
            Ok(())
        }
    }

    fn video_format(id: &str, res: &str, adaptive: bool, size: u64) -> StreamFormat {
        StreamFormat {
            format_id: id.to_string(),
            ext: "mp4".to_string(),
            resolution: Some(res.to_string()),
            is_adaptive: adaptive,
            audio_only: false,
            filesize: Some(size),
            url: None,
        }
    }

    fn audio_format(id: &str, size: u64) -> StreamFormat {
        StreamFormat {
            format_id: id.to_string(),
            ext: "m4a".to_string(),
            resolution: None,
            is_adaptive: false,
            audio_only: true,
            filesize: Some(size),
            url: None,
        }
    }

    #[tokio::test]
    async fn test_adaptive_and_progressive_labels() {
        let provider = FakeProvider {
            formats: vec![
                video_format("137", "1080p", true, 40 * MB),
                video_format("18", "480p", false, 20 * MB),
                audio_format("140", 5 * MB),
            ],
        };

        let session = FormatResolver::resolve(&provider, "https://example.com/v")
            .await
            .unwrap();

        let labels: Vec<&str> = session.labels().collect();
        assert_eq!(
            labels,
            vec![
                "1080p | High Quality (Merged) | 45.0 MB",
                "480p | Standard (Direct) | 20.0 MB"
            ]
        );
        assert_eq!(
            session.default_choice().unwrap().label,
            "1080p | High Quality (Merged) | 45.0 MB"
        );
    }

    #[tokio::test]
    async fn test_size_estimates() {
        let provider = FakeProvider {
            formats: vec![
                video_format("137", "1080p", true, 40 * MB),
                video_format("18", "480p", false, 20 * MB),
                audio_format("140", 5 * MB),
            ],
        };

        let session = FormatResolver::resolve(&provider, "u").await.unwrap();

        let adaptive = &session.choices()[0];
        assert!((adaptive.estimated_size_mb - 45.0).abs() < 1e-6);

        let progressive = &session.choices()[1];
        assert!((progressive.estimated_size_mb - 20.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_orders_by_descending_resolution() {
        let provider = FakeProvider {
            formats: vec![
                video_format("a", "360p", false, 10 * MB),
                video_format("b", "1080p", false, 50 * MB),
                video_format("c", "720p", false, 30 * MB),
            ],
        };

        let session = FormatResolver::resolve(&provider, "u").await.unwrap();
        let resolutions: Vec<&str> = session
            .choices()
            .iter()
            .map(|c| c.resolution.as_str())
            .collect();
        assert_eq!(resolutions, vec!["1080p", "720p", "360p"]);
    }

    #[tokio::test]
    async fn test_identical_labels_dedup() {
        // Two streams at the same resolution/category with the same rounded
        // size produce one choice; the first-seen candidate is kept.
        let provider = FakeProvider {
            formats: vec![
                video_format("first", "720p", false, 30 * MB),
                video_format("second", "720p", false, 30 * MB),
            ],
        };

        let session = FormatResolver::resolve(&provider, "u").await.unwrap();
        assert_eq!(session.choices().len(), 1);
        assert_eq!(session.choices()[0].format.format_id, "first");
    }

    #[tokio::test]
    async fn test_no_usable_streams() {
        // webm-only and resolution-less formats do not qualify
        let provider = FakeProvider {
            formats: vec![
                StreamFormat {
                    format_id: "248".to_string(),
                    ext: "webm".to_string(),
                    resolution: Some("1080p".to_string()),
                    is_adaptive: true,
                    audio_only: false,
                    filesize: Some(40 * MB),
                    url: None,
                },
                audio_format("140", 5 * MB),
            ],
        };

        let err = FormatResolver::resolve(&provider, "u").await.unwrap_err();
        assert!(matches!(err, ResolveError::NoUsableStreams));
    }

    #[tokio::test]
    async fn test_adaptive_without_audio_track_is_not_offered() {
        let provider = FakeProvider {
            formats: vec![
                video_format("137", "1080p", true, 40 * MB),
                video_format("18", "480p", false, 20 * MB),
            ],
        };

        let session = FormatResolver::resolve(&provider, "u").await.unwrap();
        let labels: Vec<&str> = session.labels().collect();
        assert_eq!(labels, vec!["480p | Standard (Direct) | 20.0 MB"]);
    }

    #[tokio::test]
    async fn test_adaptive_only_without_audio_track_fails() {
        let provider = FakeProvider {
            formats: vec![video_format("137", "1080p", true, 40 * MB)],
        };

        let err = FormatResolver::resolve(&provider, "u").await.unwrap_err();
        assert!(matches!(err, ResolveError::NoUsableStreams));
    }

    #[test]
    fn test_resolution_height() {
        assert_eq!(resolution_height("1080p"), Some(1080));
        assert_eq!(resolution_height("720p60"), Some(720));
        assert_eq!(resolution_height("audio"), None);
    }
}
