//! Dream Visualizer backend - turns a dream description into media and meaning
//!
//! A dream arrives as text or recorded audio. Audio is transcribed, then an
//! image (or video) is generated alongside a tiered interpretation, and the
//! outcome of every stage is reported on a single [`models::DreamResult`].

pub mod ai;
pub mod config;
pub mod error;
pub mod generate;
pub mod interpret;
pub mod models;
pub mod pipeline;
pub mod prompts;
pub mod server;
pub mod storage;
pub mod transcribe;

pub use error::{Error, ErrorKind, Result};
