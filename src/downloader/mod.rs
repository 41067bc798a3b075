// Downloader core: format resolution and download orchestration

pub mod backends;
pub mod errors;
pub mod models;
pub mod orchestrator;
pub mod remux;
pub mod resolver;
pub mod session;
pub mod tools;
pub mod traits;
pub mod utils;

pub use errors::{DownloadError, ResolveError};
pub use models::{
    DownloadPhase, Severity, StatusUpdate, StreamChoice, StreamFormat, StreamKind, VideoInfo,
};
pub use orchestrator::{DownloadConfig, DownloadOrchestrator};
pub use remux::FfmpegRemuxer;
pub use resolver::FormatResolver;
pub use session::Session;
pub use traits::{ChannelSink, NullSink, ProgressSink, Remuxer, StreamProvider};
