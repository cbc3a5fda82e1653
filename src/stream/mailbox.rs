use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use crate::pose::Frame;

/// 受信スレッドから描画側へ最新フレームを渡す1枠のポスト
///
/// `store` は常に上書きし、`take` は取り出して空にする。
/// 2回の `take` の間に複数回 `store` されたら最後の1つ以外は捨てられる。
/// ロックは差し替えの間だけ保持する。
#[derive(Debug, Default)]
pub struct Mailbox<T> {
    slot: Mutex<Option<T>>,
    stored: AtomicU64,
    overwritten: AtomicU64,
}

pub type FrameMailbox = Mailbox<Frame>;

/// 累計カウンタ
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MailboxStats {
    pub stored: u64,
    /// 取り出される前に上書きされた数
    pub overwritten: u64,
}

impl<T> Mailbox<T> {
    pub fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            stored: AtomicU64::new(0),
            overwritten: AtomicU64::new(0),
        }
    }

    pub fn store(&self, value: T) {
        let previous = {
            let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
            slot.replace(value)
        };
        self.stored.fetch_add(1, Ordering::Relaxed);
        if previous.is_some() {
            self.overwritten.fetch_add(1, Ordering::Relaxed);
        }
        // 上書きされた値はロック外で drop する
        drop(previous);
    }

    pub fn take(&self) -> Option<T> {
        self.slot.lock().unwrap_or_else(|e| e.into_inner()).take()
    }

    pub fn stats(&self) -> MailboxStats {
        MailboxStats {
            stored: self.stored.load(Ordering::Relaxed),
            overwritten: self.overwritten.load(Ordering::Relaxed),
        }
    }
}
