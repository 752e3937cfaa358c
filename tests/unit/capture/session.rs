use super::*;
use crate::capture::clock::{FixedStepClock, RealtimeClock};
use crate::encode::sink::InMemoryEncoder;
use crate::foundation::core::Canvas;

struct RecordingPainter {
    canvas: Canvas,
    painted: Vec<u64>,
    fail_at: Option<u64>,
    delay: Option<std::time::Duration>,
}

impl RecordingPainter {
    fn new() -> Self {
        Self {
            canvas: Canvas::new(4, 4).unwrap(),
            painted: Vec::new(),
            fail_at: None,
            delay: None,
        }
    }
}

impl FramePainter for RecordingPainter {
    fn canvas(&self) -> Canvas {
        self.canvas
    }

    fn background(&self) -> [u8; 4] {
        [10, 10, 10, 255]
    }

    fn paint(
        &mut self,
        surface: &mut Surface,
        _image: Option<&SourceImage>,
        now_ms: u64,
        schedule: &CaptionSchedule,
    ) -> ReelResult<()> {
        if self.fail_at == Some(now_ms) {
            return Err(ReelError::render("boom"));
        }
        assert!(now_ms < schedule.duration_ms());
        if let Some(delay) = self.delay {
            std::thread::sleep(delay);
        }
        let shade = if schedule.active_at(now_ms).is_some() { 255 } else { 0 };
        for px in surface.pixmap_mut().data_as_u8_slice_mut().chunks_exact_mut(4) {
            px.copy_from_slice(&[shade, shade, shade, 255]);
        }
        self.painted.push(now_ms);
        Ok(())
    }
}

fn session(duration_ms: u64) -> RenderSession {
    let image = SourceImage::from_premul_rgba8(1, 1, vec![255, 0, 0, 255]).unwrap();
    RenderSession::new("Fitness tips", duration_ms)
        .unwrap()
        .with_fps(Fps::new(10).unwrap())
        .with_image(image)
}

#[test]
fn new_session_is_idle_with_six_captions() {
    let s = session(12_000);
    assert_eq!(s.phase(), CapturePhase::Idle);
    assert_eq!(s.schedule().len(), 6);
    assert!(s.schedule().captions()[0].text.contains("Fitness tips"));
    assert!(s.artifact().is_none());
    assert!(s.can_render());
}

#[test]
fn can_render_requires_an_image() {
    let mut s = session(1_000);
    s.set_image(None);
    assert!(!s.can_render());

    let mut surface = Surface::new(Canvas::new(4, 4).unwrap()).unwrap();
    let err = s
        .start_capture(
            Some(&mut surface),
            &mut RecordingPainter::new(),
            &mut InMemoryEncoder::new(),
            &mut FixedStepClock::new(Fps::new(10).unwrap()),
            &StopHandle::new(),
        )
        .unwrap_err();
    assert!(matches!(err, ReelError::Validation(_)));
    assert_eq!(s.phase(), CapturePhase::Idle);
}

#[test]
fn capture_renders_every_tick_below_duration() {
    let mut s = session(1_000);
    let mut surface = Surface::new(Canvas::new(4, 4).unwrap()).unwrap();
    let mut painter = RecordingPainter::new();
    let mut enc = InMemoryEncoder::new();
    let mut clock = FixedStepClock::new(Fps::new(10).unwrap());

    let out = s
        .start_capture(Some(&mut surface), &mut painter, &mut enc, &mut clock, &StopHandle::new())
        .unwrap();

    assert_eq!(out, CaptureOutcome::Completed { frames: 10 });
    assert_eq!(painter.painted, (0..10).map(|i| i * 100).collect::<Vec<_>>());
    assert_eq!(enc.timestamps(), painter.painted.as_slice());
    assert_eq!(s.phase(), CapturePhase::Idle);

    let artifact = s.artifact().unwrap();
    assert_eq!(artifact.frame_count, 10);
    // first frame had an active caption
    assert_eq!(&artifact.bytes[..4], &[255, 255, 255, 255]);
}

#[test]
fn stepwise_capture_guards_against_a_second_start() {
    let mut s = session(1_000);
    let mut surface = Surface::new(Canvas::new(4, 4).unwrap()).unwrap();
    let mut painter = RecordingPainter::new();
    let mut enc = InMemoryEncoder::new();
    let mut clock = FixedStepClock::new(Fps::new(10).unwrap());
    let stop = StopHandle::new();

    let state = s
        .begin_capture(Some(&surface), &painter, &mut enc, &mut clock)
        .unwrap();
    assert_eq!(s.phase(), CapturePhase::Recording);

    let mut other = InMemoryEncoder::new();
    let err = s
        .begin_capture(Some(&surface), &painter, &mut other, &mut clock)
        .unwrap_err();
    assert!(matches!(err, ReelError::AlreadyRecording));
    assert_eq!(other.begin_count(), 0);
    assert!(matches!(s.set_topic("x"), Err(ReelError::AlreadyRecording)));

    let step = s
        .tick(state, &mut surface, &mut painter, &mut enc, &mut clock, &stop)
        .unwrap();
    assert_eq!(
        step,
        TickOutcome::Frame(LoopState {
            ticks: 1,
            last_elapsed_ms: Some(0)
        })
    );
}

#[test]
fn stop_during_recording_cancels_without_frames() {
    let mut s = session(1_000);
    let mut surface = Surface::new(Canvas::new(4, 4).unwrap()).unwrap();
    let mut painter = RecordingPainter::new();
    let mut enc = InMemoryEncoder::new();
    let mut clock = FixedStepClock::new(Fps::new(10).unwrap());
    let stop = StopHandle::new();

    let state = s
        .begin_capture(Some(&surface), &painter, &mut enc, &mut clock)
        .unwrap();
    stop.stop();
    let step = s
        .tick(state, &mut surface, &mut painter, &mut enc, &mut clock, &stop)
        .unwrap();

    assert_eq!(step, TickOutcome::Finished(CaptureOutcome::Cancelled { frames: 0 }));
    assert!(painter.painted.is_empty());
    assert_eq!(enc.abort_count(), 1);
    assert_eq!(s.phase(), CapturePhase::Idle);
    assert!(s.artifact().is_none());
}

#[test]
fn stop_handle_left_stopped_is_rearmed_by_the_next_capture() {
    let mut s = session(1_000);
    let mut surface = Surface::new(Canvas::new(4, 4).unwrap()).unwrap();
    let mut painter = RecordingPainter::new();
    let mut enc = InMemoryEncoder::new();
    let stop = StopHandle::new();
    stop.stop();

    let out = s
        .start_capture(
            Some(&mut surface),
            &mut painter,
            &mut enc,
            &mut FixedStepClock::new(Fps::new(10).unwrap()),
            &stop,
        )
        .unwrap();
    assert_eq!(out, CaptureOutcome::Completed { frames: 10 });
    assert!(!stop.is_stopped());
    assert_eq!(enc.abort_count(), 0);
    assert_eq!(s.artifact().unwrap().frame_count, 10);
}

#[test]
fn slow_painter_in_realtime_still_fills_the_whole_duration() {
    let mut s = session(1_000).with_fps(Fps::new(30).unwrap());
    let mut surface = Surface::new(Canvas::new(4, 4).unwrap()).unwrap();
    let mut painter = RecordingPainter::new();
    painter.delay = Some(std::time::Duration::from_millis(100));
    let mut enc = InMemoryEncoder::new();

    let out = s
        .start_capture(
            Some(&mut surface),
            &mut painter,
            &mut enc,
            &mut RealtimeClock::new(Fps::new(30).unwrap()),
            &StopHandle::new(),
        )
        .unwrap();

    // roughly one frame per 100ms was drawn, far below 30fps
    assert!(out.is_completed());
    assert!(painter.painted.len() < 15, "painted {:?}", painter.painted);
    assert_eq!(out.frames(), painter.painted.len() as u64);

    let artifact = s.artifact().unwrap();
    assert_eq!(artifact.frame_count, 30);
    assert_eq!(enc.output_slots().len(), 30);
    assert_eq!(artifact.bytes.len(), 30 * 4 * 4 * 4);
}

#[test]
fn render_error_aborts_encoder_and_returns_to_idle() {
    let mut s = session(1_000);
    let mut surface = Surface::new(Canvas::new(4, 4).unwrap()).unwrap();
    let mut painter = RecordingPainter::new();
    painter.fail_at = Some(300);
    let mut enc = InMemoryEncoder::new();

    let err = s
        .start_capture(
            Some(&mut surface),
            &mut painter,
            &mut enc,
            &mut FixedStepClock::new(Fps::new(10).unwrap()),
            &StopHandle::new(),
        )
        .unwrap_err();
    assert!(matches!(err, ReelError::Render(_)));
    assert_eq!(s.phase(), CapturePhase::Idle);
    assert_eq!(enc.abort_count(), 1);
    assert!(!enc.is_active());
    assert!(s.artifact().is_none());
}

#[test]
fn mismatched_surface_is_rejected_before_encoder_begins() {
    let mut s = session(1_000);
    let mut surface = Surface::new(Canvas::new(8, 8).unwrap()).unwrap();
    let mut enc = InMemoryEncoder::new();
    let err = s
        .start_capture(
            Some(&mut surface),
            &mut RecordingPainter::new(),
            &mut enc,
            &mut FixedStepClock::new(Fps::new(10).unwrap()),
            &StopHandle::new(),
        )
        .unwrap_err();
    assert!(matches!(err, ReelError::Validation(_)));
    assert_eq!(enc.begin_count(), 0);
}

#[test]
fn set_duration_regenerates_captions() {
    let mut s = session(12_000);
    s.set_duration(18_000).unwrap();
    assert_eq!(s.duration_ms(), 18_000);
    assert_eq!(s.schedule().captions()[1].start_ms, 3_000);
    assert!(s.set_duration(0).is_err());
    assert_eq!(s.duration_ms(), 18_000);

    s.set_topic("Cooking").unwrap();
    assert_eq!(s.topic(), "Cooking");
    assert_eq!(s.schedule().captions()[0].text, "Hook: Cooking");
}
