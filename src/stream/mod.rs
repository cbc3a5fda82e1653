//! Ingestion side: TCP connection, reader thread and the latest-frame mailbox.

pub mod client;
pub mod mailbox;
pub mod reader;

pub use client::{SessionStatus, StreamClient};
pub use mailbox::{FrameMailbox, Mailbox, MailboxStats};
pub use reader::{run_reader, ReadStatus, ReaderOptions, WireReader};
