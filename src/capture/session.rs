use crate::assets::decode::SourceImage;
use crate::capture::clock::{FrameClock, StopHandle};
use crate::captions::schedule::CaptionSchedule;
use crate::encode::sink::{Container, EncoderConfig, VideoArtifact, VideoEncoder};
use crate::foundation::core::Fps;
use crate::foundation::error::{ReelError, ReelResult};
use crate::render::frame::FramePainter;
use crate::render::surface::Surface;

/// Where a session is in its capture lifecycle.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CapturePhase {
    /// No capture is running.
    Idle,
    /// Frames are being rendered and encoded.
    Recording,
    /// The encoder is being finished or aborted.
    Finalizing,
}

/// Per-tick loop bookkeeping, threaded from one tick to the next.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LoopState {
    /// Frames rendered and pushed so far.
    pub ticks: u64,
    /// Timestamp of the last pushed frame.
    pub last_elapsed_ms: Option<u64>,
}

/// How a capture ended. Delivered exactly once per attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CaptureOutcome {
    /// Reached the configured duration; the session now holds a new artifact.
    Completed {
        /// Frames pushed.
        frames: u64,
    },
    /// Stopped early; nothing was produced and the previous artifact is untouched.
    Cancelled {
        /// Frames pushed before the stop.
        frames: u64,
    },
}

impl CaptureOutcome {
    /// Frames pushed before the capture ended.
    pub fn frames(self) -> u64 {
        match self {
            Self::Completed { frames } | Self::Cancelled { frames } => frames,
        }
    }

    /// Whether the capture ran to its full duration.
    pub fn is_completed(self) -> bool {
        matches!(self, Self::Completed { .. })
    }
}

/// Result of advancing a running capture by one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// A frame was drawn and pushed; keep ticking.
    Frame(LoopState),
    /// The capture ended; the session is Idle again.
    Finished(CaptureOutcome),
}

/// Everything needed to turn one photo and topic into a reel.
///
/// Owns the source image, the caption schedule and the last finished artifact. At most one
/// capture runs at a time.
#[derive(Debug)]
pub struct RenderSession {
    topic: String,
    image: Option<SourceImage>,
    schedule: CaptionSchedule,
    fps: Fps,
    container: Container,
    phase: CapturePhase,
    artifact: Option<VideoArtifact>,
}

impl RenderSession {
    /// Idle session with captions for `topic` over `duration_ms`.
    pub fn new(topic: &str, duration_ms: u64) -> ReelResult<Self> {
        Ok(Self {
            topic: topic.to_string(),
            image: None,
            schedule: CaptionSchedule::for_topic(topic, duration_ms)?,
            fps: Fps::default(),
            container: Container::default(),
            phase: CapturePhase::Idle,
            artifact: None,
        })
    }

    /// Set the capture frame rate.
    pub fn with_fps(mut self, fps: Fps) -> Self {
        self.fps = fps;
        self
    }

    /// Set the output container.
    pub fn with_container(mut self, container: Container) -> Self {
        self.container = container;
        self
    }

    /// Set the source photo.
    pub fn with_image(mut self, image: SourceImage) -> Self {
        self.image = Some(image);
        self
    }

    /// Replace or clear the source photo.
    pub fn set_image(&mut self, image: Option<SourceImage>) {
        self.image = image;
    }

    /// Replace the topic and regenerate every caption.
    pub fn set_topic(&mut self, topic: &str) -> ReelResult<()> {
        self.ensure_idle()?;
        self.schedule = CaptionSchedule::for_topic(topic, self.schedule.duration_ms())?;
        self.topic = topic.to_string();
        Ok(())
    }

    /// Replace the duration and regenerate every caption.
    pub fn set_duration(&mut self, duration_ms: u64) -> ReelResult<()> {
        self.ensure_idle()?;
        self.schedule = CaptionSchedule::for_topic(&self.topic, duration_ms)?;
        Ok(())
    }

    /// Topic the captions were generated from.
    pub fn topic(&self) -> &str {
        &self.topic
    }

    /// The source photo, if loaded.
    pub fn image(&self) -> Option<&SourceImage> {
        self.image.as_ref()
    }

    /// Current caption schedule.
    pub fn schedule(&self) -> &CaptionSchedule {
        &self.schedule
    }

    /// Reel length in milliseconds.
    pub fn duration_ms(&self) -> u64 {
        self.schedule.duration_ms()
    }

    /// Capture frame rate.
    pub fn fps(&self) -> Fps {
        self.fps
    }

    /// Output container.
    pub fn container(&self) -> Container {
        self.container
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> CapturePhase {
        self.phase
    }

    /// The artifact of the most recent completed capture.
    pub fn artifact(&self) -> Option<&VideoArtifact> {
        self.artifact.as_ref()
    }

    /// Move the last artifact out of the session.
    pub fn take_artifact(&mut self) -> Option<VideoArtifact> {
        self.artifact.take()
    }

    /// A capture needs a source image and at least one caption.
    pub fn can_render(&self) -> bool {
        self.image.is_some() && !self.schedule.is_empty()
    }

    /// Run a whole capture: begin, tick until the duration elapses or `stop` fires, finalize.
    ///
    /// `stop` is re-armed once the capture has begun, so a handle left stopped by an earlier
    /// cancel can be reused.
    #[tracing::instrument(skip_all, fields(duration_ms = self.duration_ms(), fps = self.fps.get()))]
    pub fn start_capture<P, E, C>(
        &mut self,
        surface: Option<&mut Surface>,
        painter: &mut P,
        encoder: &mut E,
        clock: &mut C,
        stop: &StopHandle,
    ) -> ReelResult<CaptureOutcome>
    where
        P: FramePainter + ?Sized,
        E: VideoEncoder + ?Sized,
        C: FrameClock + ?Sized,
    {
        self.ensure_idle()?;
        let Some(surface) = surface else {
            tracing::warn!("capture requested without a drawing surface");
            return Err(ReelError::SurfaceUnavailable);
        };

        let mut state = self.begin_capture(Some(&*surface), &*painter, encoder, clock)?;
        stop.reset();
        loop {
            match self.tick(state, surface, painter, encoder, clock, stop)? {
                TickOutcome::Frame(next) => state = next,
                TickOutcome::Finished(outcome) => return Ok(outcome),
            }
        }
    }

    /// Move from Idle to Recording and open the encoder.
    ///
    /// On error the session stays Idle. Without a surface the encoder is not touched.
    pub fn begin_capture<P, E, C>(
        &mut self,
        surface: Option<&Surface>,
        painter: &P,
        encoder: &mut E,
        clock: &mut C,
    ) -> ReelResult<LoopState>
    where
        P: FramePainter + ?Sized,
        E: VideoEncoder + ?Sized,
        C: FrameClock + ?Sized,
    {
        self.ensure_idle()?;
        let surface = surface.ok_or(ReelError::SurfaceUnavailable)?;
        if !self.can_render() {
            return Err(ReelError::validation(
                "capture needs a source image and at least one caption",
            ));
        }
        if surface.canvas() != painter.canvas() {
            return Err(ReelError::validation(format!(
                "surface is {}x{}, painter draws {}x{}",
                surface.canvas().width,
                surface.canvas().height,
                painter.canvas().width,
                painter.canvas().height
            )));
        }

        let cfg = EncoderConfig::new(surface.canvas(), self.fps, self.container)
            .with_background(painter.background())
            .with_duration_ms(self.schedule.duration_ms());
        encoder.begin(&cfg)?;
        clock.start();
        self.phase = CapturePhase::Recording;
        tracing::info!(
            w = cfg.canvas.width,
            h = cfg.canvas.height,
            container = ?cfg.container,
            "capture started"
        );
        Ok(LoopState::default())
    }

    /// Advance a running capture by one clock tick.
    ///
    /// Checks `stop` first, then reads the clock. A tick at or past the duration finalizes
    /// without drawing. Any render or encode error aborts the encoder and returns to Idle.
    pub fn tick<P, E, C>(
        &mut self,
        state: LoopState,
        surface: &mut Surface,
        painter: &mut P,
        encoder: &mut E,
        clock: &mut C,
        stop: &StopHandle,
    ) -> ReelResult<TickOutcome>
    where
        P: FramePainter + ?Sized,
        E: VideoEncoder + ?Sized,
        C: FrameClock + ?Sized,
    {
        if self.phase != CapturePhase::Recording {
            return Err(ReelError::validation("no capture is recording"));
        }

        if stop.is_stopped() {
            return Ok(TickOutcome::Finished(self.cancel(state, encoder)));
        }

        let elapsed_ms = clock.tick();
        if let Some(last) = state.last_elapsed_ms
            && elapsed_ms <= last
        {
            encoder.abort();
            self.phase = CapturePhase::Idle;
            return Err(ReelError::validation(format!(
                "clock went backwards: {elapsed_ms}ms after {last}ms"
            )));
        }
        if elapsed_ms >= self.schedule.duration_ms() {
            return self.complete(state, encoder).map(TickOutcome::Finished);
        }

        let drawn = painter
            .paint(surface, self.image.as_ref(), elapsed_ms, &self.schedule)
            .and_then(|()| encoder.push_frame(elapsed_ms, surface));
        if let Err(err) = drawn {
            tracing::warn!(elapsed_ms, error = %err, "capture failed; aborting encoder");
            encoder.abort();
            self.phase = CapturePhase::Idle;
            return Err(err);
        }

        Ok(TickOutcome::Frame(LoopState {
            ticks: state.ticks + 1,
            last_elapsed_ms: Some(elapsed_ms),
        }))
    }

    fn complete<E>(&mut self, state: LoopState, encoder: &mut E) -> ReelResult<CaptureOutcome>
    where
        E: VideoEncoder + ?Sized,
    {
        self.phase = CapturePhase::Finalizing;
        let finished = encoder.finish();
        self.phase = CapturePhase::Idle;
        let artifact = match finished {
            Ok(artifact) => artifact,
            Err(err) => {
                encoder.abort();
                return Err(err);
            }
        };
        tracing::info!(
            frames = state.ticks,
            bytes = artifact.len(),
            media_type = %artifact.media_type,
            "capture completed"
        );
        self.artifact = Some(artifact);
        Ok(CaptureOutcome::Completed {
            frames: state.ticks,
        })
    }

    fn cancel<E>(&mut self, state: LoopState, encoder: &mut E) -> CaptureOutcome
    where
        E: VideoEncoder + ?Sized,
    {
        self.phase = CapturePhase::Finalizing;
        encoder.abort();
        self.phase = CapturePhase::Idle;
        tracing::info!(frames = state.ticks, "capture cancelled");
        CaptureOutcome::Cancelled {
            frames: state.ticks,
        }
    }

    fn ensure_idle(&self) -> ReelResult<()> {
        match self.phase {
            CapturePhase::Idle => Ok(()),
            _ => Err(ReelError::AlreadyRecording),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/capture/session.rs"]
mod tests;
