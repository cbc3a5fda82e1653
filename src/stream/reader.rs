use std::io::{ErrorKind, Read};
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

use crate::error::StreamError;
use crate::pose::Frame;
use crate::protocol::{self, MessageSplitter};

/// 受信ループの設定
#[derive(Debug, Clone, Copy)]
pub struct ReaderOptions {
    pub chunk_size: usize,
    pub max_message_bytes: usize,
    pub poll_interval: Duration,
}

impl Default for ReaderOptions {
    fn default() -> Self {
        Self {
            chunk_size: protocol::DEFAULT_CHUNK_SIZE,
            max_message_bytes: protocol::DEFAULT_MAX_MESSAGE_BYTES,
            poll_interval: Duration::from_millis(10),
        }
    }
}

/// 1回の読み込み結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadStatus {
    /// 読めるデータが無かった
    Idle,
    /// 読み込んだバイト数
    Data(usize),
}

/// バイトストリームを読み、完結したメッセージをフレームにデコードする
///
/// ノンブロッキングのソケットを想定し、`WouldBlock` は「データ無し」として扱う。
pub struct WireReader<R> {
    source: R,
    chunk: Vec<u8>,
    splitter: MessageSplitter,
    decoded: u64,
    discarded: u64,
}

impl<R: Read> WireReader<R> {
    pub fn new(source: R, options: &ReaderOptions) -> Self {
        Self {
            source,
            chunk: vec![0u8; options.chunk_size.max(1)],
            splitter: MessageSplitter::new(options.chunk_size, options.max_message_bytes),
            decoded: 0,
            discarded: 0,
        }
    }

    /// 1チャンク読み込む。0バイトは相手のクローズ。
    pub fn read_chunk(&mut self) -> Result<ReadStatus, StreamError> {
        loop {
            match self.source.read(&mut self.chunk) {
                Ok(0) => return Err(StreamError::Closed),
                Ok(n) => {
                    self.splitter.push(&self.chunk[..n]);
                    return Ok(ReadStatus::Data(n));
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => return Ok(ReadStatus::Idle),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(StreamError::Io(e)),
            }
        }
    }

    /// バッファ済みの完結メッセージを全てデコードして渡す。
    /// デコードできないメッセージはログに残して捨てる。
    pub fn drain_frames<F: FnMut(Frame)>(&mut self, on_frame: &mut F) -> usize {
        let mut count = 0;
        while let Some(message) = self.splitter.next_message() {
            let frame = message.and_then(|line| {
                log::trace!("received message ({} bytes)", line.len());
                protocol::decode(&line)
            });
            match frame {
                Ok(frame) => {
                    self.decoded += 1;
                    count += 1;
                    on_frame(frame);
                }
                Err(e) => {
                    self.discarded += 1;
                    log::warn!("discarding message: {e}");
                }
            }
        }
        count
    }

    /// デコードできたメッセージ数
    pub fn decoded(&self) -> u64 {
        self.decoded
    }

    /// 捨てたメッセージ数
    pub fn discarded(&self) -> u64 {
        self.discarded
    }

    /// 区切り待ちで残っているバイト数
    pub fn pending(&self) -> usize {
        self.splitter.pending()
    }
}

/// 停止要求か接続終了まで受信を続ける
///
/// 停止要求で抜けた場合は `Ok(())`。停止要求後にソケットが閉じられて
/// 発生したエラーも停止扱いにする。
pub fn run_reader<R, F>(
    reader: &mut WireReader<R>,
    running: &AtomicBool,
    poll_interval: Duration,
    mut on_frame: F,
) -> Result<(), StreamError>
where
    R: Read,
    F: FnMut(Frame),
{
    while running.load(Ordering::Acquire) {
        match reader.read_chunk() {
            Ok(ReadStatus::Idle) => thread::sleep(poll_interval),
            Ok(ReadStatus::Data(_)) => {
                reader.drain_frames(&mut on_frame);
            }
            Err(_) if !running.load(Ordering::Acquire) => break,
            Err(e) => return Err(e),
        }
    }
    Ok(())
}
