pub mod downloader;

pub use downloader::{
    ChannelSink, DownloadConfig, DownloadError, DownloadOrchestrator, DownloadPhase,
    FfmpegRemuxer, FormatResolver, NullSink, ProgressSink, Remuxer, ResolveError, Session,
    Severity, StatusUpdate, StreamChoice, StreamFormat, StreamKind, StreamProvider, VideoInfo,
};
pub use downloader::backends::YtDlpProvider;
