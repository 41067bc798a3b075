pub mod ytdlp;

pub use ytdlp::YtDlpProvider;
