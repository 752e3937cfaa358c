use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use crate::foundation::core::Fps;

/// Source of per-frame timestamps for the capture loop.
///
/// `tick` returns milliseconds elapsed since `start`, strictly increasing within one run.
pub trait FrameClock {
    /// Begin a new run; elapsed time restarts from zero.
    fn start(&mut self);
    /// Wait for the next frame and return milliseconds since `start`.
    fn tick(&mut self) -> u64;
}

/// Deterministic clock for offline rendering: tick `i` reports `floor(i * 1000 / fps)`.
#[derive(Clone, Copy, Debug)]
pub struct FixedStepClock {
    fps: Fps,
    next: u64,
}

impl FixedStepClock {
    /// Clock stepping at `fps`.
    pub fn new(fps: Fps) -> Self {
        Self { fps, next: 0 }
    }
}

impl FrameClock for FixedStepClock {
    fn start(&mut self) {
        self.next = 0;
    }

    fn tick(&mut self) -> u64 {
        let ms = self.fps.tick_to_ms(self.next);
        self.next += 1;
        ms
    }
}

/// Wall-clock pacing at a target frame rate.
///
/// `tick` sleeps until the next frame is due. A late tick does not trigger a burst of catch-up
/// frames; the schedule restarts from the late instant.
#[derive(Clone, Debug)]
pub struct RealtimeClock {
    interval: Duration,
    started: Option<Instant>,
    next_due: Option<Instant>,
    last_ms: Option<u64>,
}

impl RealtimeClock {
    /// Clock pacing frames at `fps` against the wall clock.
    pub fn new(fps: Fps) -> Self {
        Self {
            interval: fps.frame_interval(),
            started: None,
            next_due: None,
            last_ms: None,
        }
    }
}

impl FrameClock for RealtimeClock {
    fn start(&mut self) {
        self.started = Some(Instant::now());
        self.next_due = None;
        self.last_ms = None;
    }

    fn tick(&mut self) -> u64 {
        let started = *self.started.get_or_insert_with(Instant::now);
        if let Some(due) = self.next_due {
            let now = Instant::now();
            if due > now {
                std::thread::sleep(due - now);
            }
        }

        let now = Instant::now();
        self.next_due = Some(match self.next_due {
            Some(due) if due + self.interval > now => due + self.interval,
            _ => now + self.interval,
        });

        let mut ms = now.duration_since(started).as_millis() as u64;
        if let Some(last) = self.last_ms
            && ms <= last
        {
            ms = last + 1;
        }
        self.last_ms = Some(ms);
        ms
    }
}

/// Cooperative cancellation flag shared between the capture loop and whoever may stop it.
#[derive(Clone, Debug, Default)]
pub struct StopHandle {
    flag: Arc<AtomicBool>,
}

impl StopHandle {
    /// A handle that has not been stopped.
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask the running capture to cancel at its next tick boundary.
    pub fn stop(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Whether `stop` has been called since the last reset.
    pub fn is_stopped(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    /// Re-arm the handle for another capture.
    pub fn reset(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/capture/clock.rs"]
mod tests;
