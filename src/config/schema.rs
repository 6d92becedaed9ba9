use serde::Deserialize;

/// Top-level engine settings loaded from `config.toml`.
///
/// File format: TOML
/// Default path (Linux/XDG): `$XDG_CONFIG_HOME/cadenza/config.toml` or `~/.config/cadenza/config.toml`
///
/// Precedence (highest wins):
/// 1) Environment variables (prefix `CADENZA__`, `__` as nested separator)
/// 2) Config file (if present)
/// 3) Struct defaults
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub playback: PlaybackSettings,
    pub controls: ControlsSettings,
    pub continuation: ContinuationSettings,
    pub navigation: NavigationSettings,
    pub reporting: ReportingSettings,
    pub server: ServerSettings,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PlaybackSettings {
    /// Whether shuffle starts enabled.
    pub shuffle: bool,
    /// Whether skipping past either end of the queue wraps around.
    pub repeat: bool,
    /// Initial volume in `[0.0, 1.0]`.
    pub volume: f32,
}

impl Default for PlaybackSettings {
    fn default() -> Self {
        Self {
            shuffle: false,
            repeat: false,
            volume: 0.5,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ControlsSettings {
    /// Past this many seconds into a track, "previous" restarts the track
    /// instead of moving back. Set to 0 to always move back.
    pub restart_threshold_secs: u64,
    /// Number of seconds to jump for seek forward/backward controls.
    pub seek_step_secs: u64,
}

impl Default for ControlsSettings {
    fn default() -> Self {
        Self {
            restart_threshold_secs: 3,
            seek_step_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ContinuationSettings {
    /// Maximum number of items in the merged continuation list.
    pub limit: usize,
    /// Resume items are fetched with `limit * resume_limit_factor` so that
    /// de-duplication against next-up items still fills the list.
    pub resume_limit_factor: usize,
    /// Borrow the previous episode's last-played date for undated episodes.
    /// Costs one adjacent-window request per undated episode.
    pub infer_last_played: bool,
}

impl Default for ContinuationSettings {
    fn default() -> Self {
        Self {
            limit: 20,
            resume_limit_factor: 2,
            infer_last_played: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NavigationSettings {
    /// Width of the sibling window fetched around the current item (min 3).
    pub window_size: usize,
}

impl Default for NavigationSettings {
    fn default() -> Self {
        Self { window_size: 3 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportingSettings {
    /// Interval between progress reports while playing (seconds).
    /// Set to 0 to only report on pause and stop.
    pub progress_interval_secs: u64,
}

impl Default for ReportingSettings {
    fn default() -> Self {
        Self {
            progress_interval_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    /// Base URL of the media server, e.g. `https://media.example.org`.
    pub base_url: Option<String>,
    /// Audio codec requested when the server has to transcode.
    pub audio_codec: String,
    /// Containers the client can play directly, in the server's list syntax.
    pub audio_containers: String,
    pub transcoding_container: String,
    pub transcoding_protocol: String,
    /// Upper bound for the streaming bitrate (bits per second).
    pub max_streaming_bitrate: u64,
    /// Video codecs the client can decode, most preferred first.
    pub video_codecs: String,
    /// Container of HLS video segments.
    pub segment_container: String,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            base_url: None,
            audio_codec: "aac".to_string(),
            audio_containers: "opus,webm|opus,ts|mp3,mp3,aac,m4a|aac,m4b|aac,flac,alac,m4a|alac,m4b|alac,webma,webm|webma,wav,ogg,mp4|opus".to_string(),
            transcoding_container: "mp4".to_string(),
            transcoding_protocol: "hls".to_string(),
            max_streaming_bitrate: 150_000_000,
            video_codecs: "av1,hevc,h264,vp9".to_string(),
            segment_container: "mp4".to_string(),
        }
    }
}
