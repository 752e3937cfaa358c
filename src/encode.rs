/// Encoding through the system `ffmpeg`.
pub mod ffmpeg;
/// Encoder trait, settings and in-memory encoder.
pub mod sink;
