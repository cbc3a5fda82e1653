pub mod config;
pub mod error;
pub mod pose;
pub mod protocol;
pub mod render;
pub mod stream;
pub mod tracker;
