//! Photoreel turns one still photo and a topic into a captioned 9:16 reel.
//!
//! The pipeline is session-oriented:
//!
//! - Generate a script for a topic and spread it over the reel as a [`CaptionSchedule`]
//! - Hold the decoded photo and schedule in a [`RenderSession`]
//! - Capture frames with a [`FrameRenderer`] on a [`FrameClock`] into a [`VideoEncoder`]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod foundation;

/// Photo decoding and caption fonts.
pub mod assets;
/// Script generation and caption timing.
pub mod captions;
/// The frame-by-frame capture loop.
pub mod capture;
/// Studio configuration.
pub mod config;
/// Video encoders.
pub mod encode;
/// CPU frame rendering.
pub mod render;

pub use crate::foundation::core::{Affine, Canvas, Fps, Rgba8Premul, Vec2};
pub use crate::foundation::error::{ReelError, ReelResult};

pub use crate::assets::decode::{MAX_SOURCE_EDGE, SourceImage, decode_image};
pub use crate::assets::font::{CaptionFont, FontSource};
pub use crate::captions::schedule::{Caption, CaptionSchedule, schedule};
pub use crate::captions::script::{DEFAULT_TOPIC, generate_script};
pub use crate::capture::clock::{FixedStepClock, FrameClock, RealtimeClock, StopHandle};
pub use crate::capture::session::{
    CaptureOutcome, CapturePhase, LoopState, RenderSession, TickOutcome,
};
pub use crate::config::{DurationPreset, StudioConfig, parse_duration_ms};
pub use crate::encode::ffmpeg::{FfmpegEncoder, is_ffmpeg_on_path};
pub use crate::encode::sink::{
    Container, EncoderConfig, InMemoryEncoder, RAW_MEDIA_TYPE, VideoArtifact, VideoEncoder,
};
pub use crate::render::frame::{FramePainter, FrameRenderer, FrameStyle};
pub use crate::render::surface::{FrameRGBA, Surface};
