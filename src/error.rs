//! Error types shared by the stream client, decoder and config loader.
//!
//! Decode failures are always recoverable (the message is dropped). Stream
//! failures end the ingestion thread for good.

use std::io;

use thiserror::Error;
use tokio_util::codec::LinesCodecError;

/// 接続セッションを終了させるエラー
#[derive(Debug, Error)]
pub enum StreamError {
    /// 初回接続に失敗
    #[error("failed to connect to {addr}: {source}")]
    Connect {
        addr: String,
        #[source]
        source: io::Error,
    },
    /// 相手側が正常にクローズした
    #[error("connection closed by peer")]
    Closed,
    /// 受信中のI/O障害
    #[error("read error: {0}")]
    Io(#[from] io::Error),
}

/// 1メッセージ分のデコード失敗。呼び出し側で破棄して続行する。
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("invalid frame json: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid message line: {0}")]
    Line(#[from] LinesCodecError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },
    #[error("invalid config file {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    #[error("invalid config: {0}")]
    Invalid(String),
}
