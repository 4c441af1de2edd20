// Adapters - External system implementations

pub mod exec_ffmpeg;
pub mod fs_local;
pub mod headless_player;
pub mod probe_ffprobe;
pub mod toml_config;

// Re-export adapters
pub use exec_ffmpeg::FfmpegTranscoder;
pub use fs_local::LocalFsAdapter;
pub use headless_player::HeadlessPlayer;
pub use probe_ffprobe::FFprobeAdapter;
pub use toml_config::AppConfig;
