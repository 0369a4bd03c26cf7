pub mod client;
pub mod media;
pub mod speech;
pub mod types;

pub use client::FalHttpClient;
pub use media::FalMediaClient;
pub use speech::FalSpeechClient;
