use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use crate::config::ConnectionConfig;
use crate::error::StreamError;
use crate::pose::Frame;

use super::mailbox::{FrameMailbox, MailboxStats};
use super::reader::{run_reader, ReaderOptions, WireReader};

/// 受信セッションの状態
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionStatus {
    Running,
    /// close による停止
    Stopped,
    /// 相手側のクローズ
    Closed,
    /// I/O エラーで終了
    Failed(String),
}

impl SessionStatus {
    pub fn is_running(&self) -> bool {
        matches!(self, Self::Running)
    }
}

/// 推定プロセスへの TCP 接続と受信スレッド
///
/// 受信スレッドは最新フレームを [`FrameMailbox`] に置き、描画側は
/// [`StreamClient::take`] で自分のペースで取り出す。再接続はしない。
pub struct StreamClient {
    addr: SocketAddr,
    socket: TcpStream,
    mailbox: Arc<FrameMailbox>,
    running: Arc<AtomicBool>,
    status: Arc<Mutex<SessionStatus>>,
    shutdown_timeout: Duration,
    handle: Option<thread::JoinHandle<()>>,
}

impl StreamClient {
    /// 1回だけ接続を試み、受信スレッドを開始する
    pub fn connect(config: &ConnectionConfig) -> Result<Self, StreamError> {
        let addr_str = config.addr();
        let connect_err = |source| StreamError::Connect {
            addr: addr_str.clone(),
            source,
        };

        let addrs: Vec<SocketAddr> = (config.host.as_str(), config.port)
            .to_socket_addrs()
            .map_err(connect_err)?
            .collect();

        let mut last_err = None;
        let mut stream = None;
        for addr in addrs {
            match TcpStream::connect_timeout(&addr, config.connect_timeout()) {
                Ok(s) => {
                    stream = Some(s);
                    break;
                }
                Err(e) => last_err = Some(e),
            }
        }
        let stream = match stream {
            Some(s) => s,
            None => {
                let source = last_err.unwrap_or_else(|| {
                    std::io::Error::new(std::io::ErrorKind::NotFound, "no address resolved")
                });
                return Err(connect_err(source));
            }
        };

        let addr = stream.peer_addr().map_err(connect_err)?;
        stream.set_nonblocking(true).map_err(connect_err)?;
        if let Err(e) = stream.set_nodelay(true) {
            log::debug!("TCP_NODELAY not set on {addr}: {e}");
        }
        let socket = stream.try_clone().map_err(connect_err)?;

        log::info!("connected to pose stream at {addr}");

        let options = ReaderOptions {
            chunk_size: config.read_chunk_size,
            max_message_bytes: config.max_message_bytes,
            poll_interval: config.poll_interval(),
        };
        Ok(Self::start(addr, stream, socket, options, config.shutdown_timeout()))
    }

    fn start(
        addr: SocketAddr,
        stream: TcpStream,
        socket: TcpStream,
        options: ReaderOptions,
        shutdown_timeout: Duration,
    ) -> Self {
        let mailbox = Arc::new(FrameMailbox::new());
        let running = Arc::new(AtomicBool::new(true));
        let status = Arc::new(Mutex::new(SessionStatus::Running));

        let mailbox_ref = Arc::clone(&mailbox);
        let running_ref = Arc::clone(&running);
        let status_ref = Arc::clone(&status);

        let handle = thread::Builder::new()
            .name("pose-stream-reader".to_string())
            .spawn(move || {
                let mut reader = WireReader::new(stream, &options);
                let result = run_reader(&mut reader, &running_ref, options.poll_interval, |frame| {
                    mailbox_ref.store(frame)
                });
                let final_status = match result {
                    Ok(()) => {
                        log::info!("pose stream reader stopped");
                        SessionStatus::Stopped
                    }
                    Err(StreamError::Closed) => {
                        log::warn!("pose stream closed by server");
                        SessionStatus::Closed
                    }
                    Err(e) => {
                        log::error!("pose stream reader failed: {e}");
                        SessionStatus::Failed(e.to_string())
                    }
                };
                log::debug!(
                    "reader finished: {} frames decoded, {} discarded",
                    reader.decoded(),
                    reader.discarded()
                );
                if reader.pending() > 0 {
                    log::trace!("dropping {} bytes of unterminated message", reader.pending());
                }
                running_ref.store(false, Ordering::Release);
                *status_ref.lock().unwrap_or_else(|e| e.into_inner()) = final_status;
            })
            .ok();

        if handle.is_none() {
            log::error!("failed to spawn pose stream reader thread");
            running.store(false, Ordering::Release);
            *status.lock().unwrap_or_else(|e| e.into_inner()) =
                SessionStatus::Failed("reader thread not started".to_string());
        }

        Self {
            addr,
            socket,
            mailbox,
            running,
            status,
            shutdown_timeout,
            handle,
        }
    }

    /// 最新フレームを取り出す。前回以降に届いていなければ None。
    pub fn take(&self) -> Option<Frame> {
        self.mailbox.take()
    }

    pub fn mailbox_stats(&self) -> MailboxStats {
        self.mailbox.stats()
    }

    pub fn status(&self) -> SessionStatus {
        self.status.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    /// 受信スレッドを止めてソケットを閉じる
    ///
    /// 停止フラグを立ててソケットを shutdown し、`shutdown_timeout` まで
    /// 終了を待つ。それでも終わらないスレッドは切り離す。
    pub fn close(&mut self) {
        let Some(handle) = self.handle.take() else {
            return;
        };
        log::info!("closing pose stream {}", self.addr);
        self.running.store(false, Ordering::Release);
        let _ = self.socket.shutdown(Shutdown::Both);

        let deadline = Instant::now() + self.shutdown_timeout;
        while !handle.is_finished() && Instant::now() < deadline {
            thread::sleep(Duration::from_millis(1));
        }

        if handle.is_finished() {
            if handle.join().is_err() {
                log::error!("pose stream reader thread panicked");
            }
        } else {
            // Rust ではスレッドを強制終了できないので切り離す
            log::error!(
                "pose stream reader did not exit within {:?}; detaching thread",
                self.shutdown_timeout
            );
        }
    }
}

impl Drop for StreamClient {
    fn drop(&mut self) {
        self.close();
    }
}
