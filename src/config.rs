use serde::Deserialize;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::ConfigError;
use crate::protocol::{DEFAULT_CHUNK_SIZE, DEFAULT_MAX_MESSAGE_BYTES};
use crate::render::SkeletonPreset;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub view: ViewConfig,
    #[serde(default)]
    pub skeleton: SkeletonConfig,
    #[serde(default)]
    pub debug: DebugConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ConnectionConfig {
    /// 推定プロセスのホスト
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
    /// データが無いときのスリープ間隔
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    /// 1回の read で読むバイト数 (受信バッファの初期サイズ)
    #[serde(default = "default_read_chunk_size")]
    pub read_chunk_size: usize,
    /// 1メッセージの上限
    #[serde(default = "default_max_message_bytes")]
    pub max_message_bytes: usize,
    /// close 時に受信スレッドの終了を待つ時間
    #[serde(default = "default_shutdown_timeout_ms")]
    pub shutdown_timeout_ms: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ViewConfig {
    /// 推定側の入力解像度
    #[serde(default = "default_video_width")]
    pub video_width: f32,
    #[serde(default = "default_video_height")]
    pub video_height: f32,
    /// ピクセル座標 → ローカル座標の倍率
    #[serde(default = "default_keypoint_scale")]
    pub keypoint_scale: f32,
    #[serde(default)]
    pub skeleton_z: f32,
    /// マーカーを線より手前に置くためのZオフセット
    #[serde(default = "default_marker_z_offset")]
    pub marker_z_offset: f32,
}

/// キーポイントマーカーの表示方針
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerMode {
    #[default]
    Always,
    /// Full プリセットのときだけ表示
    FullOnly,
    Never,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SkeletonConfig {
    #[serde(default)]
    pub preset: SkeletonPreset,
    /// Full プリセットに顔の骨 (5本) を含めるか
    #[serde(default = "default_true")]
    pub full_face_bones: bool,
    #[serde(default)]
    pub markers: MarkerMode,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DebugConfig {
    /// 主要キーポイントをログに出すフレーム間隔 (0 で無効)
    #[serde(default = "default_probe_interval")]
    pub probe_interval: u64,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_host() -> String { "localhost".to_string() }
fn default_port() -> u16 { 12345 }
fn default_connect_timeout_ms() -> u64 { 2000 }
fn default_poll_interval_ms() -> u64 { 10 }
fn default_read_chunk_size() -> usize { DEFAULT_CHUNK_SIZE }
fn default_max_message_bytes() -> usize { DEFAULT_MAX_MESSAGE_BYTES }
fn default_shutdown_timeout_ms() -> u64 { 500 }
fn default_video_width() -> f32 { 1280.0 }
fn default_video_height() -> f32 { 720.0 }
fn default_keypoint_scale() -> f32 { 0.01 }
fn default_marker_z_offset() -> f32 { -0.001 }
fn default_true() -> bool { true }
fn default_probe_interval() -> u64 { 30 }
fn default_log_level() -> String { "info".to_string() }

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            connect_timeout_ms: default_connect_timeout_ms(),
            poll_interval_ms: default_poll_interval_ms(),
            read_chunk_size: default_read_chunk_size(),
            max_message_bytes: default_max_message_bytes(),
            shutdown_timeout_ms: default_shutdown_timeout_ms(),
        }
    }
}

impl ConnectionConfig {
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_millis(self.shutdown_timeout_ms)
    }
}

impl Default for ViewConfig {
    fn default() -> Self {
        Self {
            video_width: default_video_width(),
            video_height: default_video_height(),
            keypoint_scale: default_keypoint_scale(),
            skeleton_z: 0.0,
            marker_z_offset: default_marker_z_offset(),
        }
    }
}

impl Default for SkeletonConfig {
    fn default() -> Self {
        Self {
            preset: SkeletonPreset::default(),
            full_face_bones: true,
            markers: MarkerMode::default(),
        }
    }
}

impl Default for DebugConfig {
    fn default() -> Self {
        Self {
            probe_interval: default_probe_interval(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        let config: Config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.display().to_string(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// ファイルが無ければデフォルト値。読めない・不正な場合はエラー。
    pub fn load_optional<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let view = &self.view;
        if !(view.video_width > 0.0 && view.video_height > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "video size must be positive, got {}x{}",
                view.video_width, view.video_height
            )));
        }
        if !view.keypoint_scale.is_finite()
            || !view.skeleton_z.is_finite()
            || !view.marker_z_offset.is_finite()
        {
            return Err(ConfigError::Invalid("view values must be finite".to_string()));
        }
        if view.keypoint_scale == 0.0 {
            return Err(ConfigError::Invalid("keypoint_scale must not be zero".to_string()));
        }
        let conn = &self.connection;
        if conn.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid("poll_interval_ms must be greater than zero".to_string()));
        }
        if conn.read_chunk_size == 0 {
            return Err(ConfigError::Invalid("read_chunk_size must be greater than zero".to_string()));
        }
        if conn.max_message_bytes == 0 {
            return Err(ConfigError::Invalid("max_message_bytes must be greater than zero".to_string()));
        }
        Ok(())
    }
}
