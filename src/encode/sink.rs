use std::path::Path;

use crate::foundation::core::{Canvas, Fps};
use crate::foundation::error::{ReelError, ReelResult};
use crate::render::surface::Surface;

/// Output container for the finished reel.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Container {
    /// VP9 in WebM.
    #[default]
    Webm,
    /// H.264 in fragmented MP4.
    Mp4,
}

impl Container {
    /// MIME type of the muxed output.
    pub fn media_type(self) -> &'static str {
        match self {
            Self::Webm => "video/webm",
            Self::Mp4 => "video/mp4",
        }
    }

    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            Self::Webm => "webm",
            Self::Mp4 => "mp4",
        }
    }
}

/// Parameters fixed for the lifetime of one encoding run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EncoderConfig {
    /// Frame size.
    pub canvas: Canvas,
    /// Output frame rate.
    pub fps: Fps,
    /// Output container.
    pub container: Container,
    /// Opaque color that translucent pixels are flattened over.
    pub bg_rgba: [u8; 4],
    /// Length of the recording. Output is padded to cover it; `0` means open-ended.
    pub duration_ms: u64,
}

impl EncoderConfig {
    /// Open-ended config flattening over opaque black.
    pub fn new(canvas: Canvas, fps: Fps, container: Container) -> Self {
        Self {
            canvas,
            fps,
            container,
            bg_rgba: [0, 0, 0, 255],
            duration_ms: 0,
        }
    }

    /// Bound the recording to `duration_ms`.
    pub fn with_duration_ms(mut self, duration_ms: u64) -> Self {
        self.duration_ms = duration_ms;
        self
    }

    /// Set the flattening color.
    pub fn with_background(mut self, bg_rgba: [u8; 4]) -> Self {
        self.bg_rgba = bg_rgba;
        self
    }
}

/// A finished, downloadable recording.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VideoArtifact {
    /// Encoded bytes.
    pub bytes: Vec<u8>,
    /// MIME type of `bytes`.
    pub media_type: String,
    /// Frames in the output timeline.
    pub frame_count: u64,
}

impl VideoArtifact {
    /// Size in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether no bytes were produced.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Default download name, `video.<ext>`.
    pub fn suggested_file_name(&self) -> String {
        let ext = match self.media_type.as_str() {
            "video/webm" => "webm",
            "video/mp4" => "mp4",
            _ => "bin",
        };
        format!("video.{ext}")
    }

    /// Write the bytes to `path`, creating parent directories.
    pub fn write_to(&self, path: &Path) -> ReelResult<()> {
        use anyhow::Context as _;
        ensure_parent_dir(path)?;
        std::fs::write(path, &self.bytes)
            .with_context(|| format!("write video artifact '{}'", path.display()))?;
        Ok(())
    }
}

/// Maps capture timestamps onto the constant-rate output timeline.
///
/// Frame slot `k` shows at `k / fps` seconds. A push lands on the slot nearest its timestamp;
/// slots skipped by a slow tick repeat the previous frame, and a second push into an already
/// written slot is dropped.
#[derive(Clone, Copy, Debug)]
pub(crate) struct FrameTimeline {
    fps: u64,
    /// Total slots for a bounded recording.
    total: Option<u64>,
    next_slot: u64,
}

/// How many copies of the previous and of the incoming frame to emit for one push.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct SlotFill {
    pub(crate) repeat_previous: u64,
    pub(crate) incoming: u64,
}

impl FrameTimeline {
    pub(crate) fn new(cfg: &EncoderConfig) -> Self {
        let fps = u64::from(cfg.fps.get());
        let total = (cfg.duration_ms > 0)
            .then(|| cfg.duration_ms.saturating_mul(fps).div_ceil(1000));
        Self {
            fps,
            total,
            next_slot: 0,
        }
    }

    /// Slots written so far.
    pub(crate) fn written(&self) -> u64 {
        self.next_slot
    }

    pub(crate) fn place(&mut self, elapsed_ms: u64) -> SlotFill {
        let mut slot = (elapsed_ms.saturating_mul(self.fps) + 500) / 1000;
        if let Some(total) = self.total {
            slot = slot.min(total.saturating_sub(1));
        }
        if slot < self.next_slot {
            return SlotFill {
                repeat_previous: 0,
                incoming: 0,
            };
        }
        let fill = if self.next_slot == 0 {
            SlotFill {
                repeat_previous: 0,
                incoming: slot + 1,
            }
        } else {
            SlotFill {
                repeat_previous: slot - self.next_slot,
                incoming: 1,
            }
        };
        self.next_slot = slot + 1;
        fill
    }

    /// Copies of the last frame needed to reach the full duration.
    pub(crate) fn pad(&mut self) -> u64 {
        let Some(total) = self.total else {
            return 0;
        };
        if self.next_slot == 0 {
            return 0;
        }
        let missing = total.saturating_sub(self.next_slot);
        self.next_slot += missing;
        missing
    }
}

/// Consumer of captured frames.
///
/// Call order is `begin`, any number of `push_frame` with strictly increasing `elapsed_ms`,
/// then exactly one of `finish` or `abort`. An encoder may be reused after either.
///
/// Output runs at the configured fps regardless of how often frames arrive: `elapsed_ms` decides
/// which output frame a push becomes, so a slow producer still yields a recording of the
/// configured duration.
pub trait VideoEncoder {
    /// Start a run with `cfg`.
    fn begin(&mut self, cfg: &EncoderConfig) -> ReelResult<()>;
    /// Append the surface contents as the frame at `elapsed_ms`.
    fn push_frame(&mut self, elapsed_ms: u64, surface: &Surface) -> ReelResult<()>;
    /// Close the run and return the recording.
    fn finish(&mut self) -> ReelResult<VideoArtifact>;
    /// Discard everything pushed since `begin`. Never fails.
    fn abort(&mut self);
}

/// Media type of artifacts produced by [`InMemoryEncoder`].
pub const RAW_MEDIA_TYPE: &str = "video/x-raw-rgba";

/// Encoder that keeps frames in memory. Useful for tests and previews.
#[derive(Debug, Default)]
pub struct InMemoryEncoder {
    cfg: Option<EncoderConfig>,
    timeline: Option<FrameTimeline>,
    timestamps: Vec<u64>,
    frames: Vec<Vec<u8>>,
    /// Index into `frames` for every output slot.
    slots: Vec<usize>,
    begins: u32,
    aborts: u32,
}

impl InMemoryEncoder {
    /// An idle encoder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Elapsed timestamps pushed since the last `begin`.
    pub fn timestamps(&self) -> &[u64] {
        &self.timestamps
    }

    /// Premultiplied frames pushed since the last `begin`.
    pub fn frames(&self) -> &[Vec<u8>] {
        &self.frames
    }

    /// For each output frame, the index of the pushed frame it shows.
    pub fn output_slots(&self) -> &[usize] {
        &self.slots
    }

    /// Whether a run is in progress.
    pub fn is_active(&self) -> bool {
        self.cfg.is_some()
    }

    /// Runs started so far.
    pub fn begin_count(&self) -> u32 {
        self.begins
    }

    /// Runs aborted so far.
    pub fn abort_count(&self) -> u32 {
        self.aborts
    }
}

impl VideoEncoder for InMemoryEncoder {
    fn begin(&mut self, cfg: &EncoderConfig) -> ReelResult<()> {
        if self.cfg.is_some() {
            return Err(ReelError::encode("in-memory encoder already started"));
        }
        self.cfg = Some(*cfg);
        self.timeline = Some(FrameTimeline::new(cfg));
        self.timestamps.clear();
        self.frames.clear();
        self.slots.clear();
        self.begins += 1;
        Ok(())
    }

    fn push_frame(&mut self, elapsed_ms: u64, surface: &Surface) -> ReelResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| ReelError::encode("in-memory encoder not started"))?;
        if surface.canvas() != cfg.canvas {
            return Err(ReelError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                surface.canvas().width,
                surface.canvas().height,
                cfg.canvas.width,
                cfg.canvas.height
            )));
        }
        if let Some(&last) = self.timestamps.last()
            && elapsed_ms <= last
        {
            return Err(ReelError::encode(
                "in-memory encoder received out-of-order timestamp",
            ));
        }
        let fill = self
            .timeline
            .as_mut()
            .ok_or_else(|| ReelError::encode("in-memory encoder not started"))?
            .place(elapsed_ms);
        self.timestamps.push(elapsed_ms);
        self.frames.push(surface.data().to_vec());

        let newest = self.frames.len() - 1;
        if let Some(&previous) = self.slots.last() {
            self.slots
                .extend(std::iter::repeat_n(previous, fill.repeat_previous as usize));
        }
        self.slots
            .extend(std::iter::repeat_n(newest, fill.incoming as usize));
        Ok(())
    }

    fn finish(&mut self) -> ReelResult<VideoArtifact> {
        if self.cfg.take().is_none() {
            return Err(ReelError::encode("in-memory encoder not started"));
        }
        let pad = self.timeline.take().map(|mut t| t.pad()).unwrap_or(0);
        if let Some(&last) = self.slots.last() {
            self.slots.extend(std::iter::repeat_n(last, pad as usize));
        }

        let frame_len = self.frames.first().map_or(0, Vec::len);
        let mut bytes = Vec::with_capacity(self.slots.len() * frame_len);
        for &idx in &self.slots {
            bytes.extend_from_slice(&self.frames[idx]);
        }
        Ok(VideoArtifact {
            bytes,
            media_type: RAW_MEDIA_TYPE.to_string(),
            frame_count: self.slots.len() as u64,
        })
    }

    fn abort(&mut self) {
        if self.cfg.take().is_some() {
            self.aborts += 1;
        }
        self.timeline = None;
        self.timestamps.clear();
        self.frames.clear();
        self.slots.clear();
    }
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> ReelResult<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;
