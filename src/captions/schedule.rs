use crate::captions::script::generate_script;
use crate::foundation::error::{ReelError, ReelResult};

/// One timed caption. The interval is half-open: `[start_ms, end_ms)`.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Caption {
    /// Line shown on screen.
    pub text: String,
    /// First millisecond the caption is visible.
    pub start_ms: u64,
    /// First millisecond after the caption.
    pub end_ms: u64,
}

impl Caption {
    /// Whether `now_ms` falls in `[start_ms, end_ms)`.
    pub fn contains(&self, now_ms: u64) -> bool {
        self.start_ms <= now_ms && now_ms < self.end_ms
    }

    /// Length of the interval in milliseconds.
    pub fn len_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }

    /// Progress through this caption's own interval, in `[0, 1]`.
    pub fn progress_at(&self, now_ms: u64) -> f64 {
        let len = self.len_ms();
        if len == 0 {
            return 0.0;
        }
        let rel = now_ms.saturating_sub(self.start_ms) as f64 / len as f64;
        rel.clamp(0.0, 1.0)
    }
}

/// Gap-free, non-overlapping captions covering a fixed duration.
///
/// Built only through [`schedule`] (or [`CaptionSchedule::empty`]), so the ordering invariant
/// holds for every value of this type. A new topic or duration means a new schedule.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CaptionSchedule {
    duration_ms: u64,
    captions: Vec<Caption>,
}

impl CaptionSchedule {
    /// A schedule with no captions; frames render background and image only.
    pub fn empty(duration_ms: u64) -> Self {
        Self {
            duration_ms,
            captions: Vec::new(),
        }
    }

    /// Generate the script for `topic` and spread it over `duration_ms`.
    pub fn for_topic(topic: &str, duration_ms: u64) -> ReelResult<Self> {
        schedule(&generate_script(topic), duration_ms)
    }

    /// Duration the schedule was built for.
    pub fn duration_ms(&self) -> u64 {
        self.duration_ms
    }

    /// Captions in time order.
    pub fn captions(&self) -> &[Caption] {
        &self.captions
    }

    /// Number of captions.
    pub fn len(&self) -> usize {
        self.captions.len()
    }

    /// Whether there are no captions.
    pub fn is_empty(&self) -> bool {
        self.captions.is_empty()
    }

    /// The caption with `start_ms <= now_ms < end_ms`, if any.
    pub fn active_at(&self, now_ms: u64) -> Option<&Caption> {
        let idx = self.captions.partition_point(|c| c.start_ms <= now_ms);
        let cap = self.captions.get(idx.checked_sub(1)?)?;
        cap.contains(now_ms).then_some(cap)
    }
}

/// Split `total_duration_ms` into `lines.len()` equal slots, one caption per line.
///
/// Bounds are floored, so the last caption may end up to `lines.len() - 1` ms short of the
/// total when the division is inexact.
pub fn schedule<S: AsRef<str>>(
    lines: &[S],
    total_duration_ms: u64,
) -> ReelResult<CaptionSchedule> {
    if lines.is_empty() {
        return Err(ReelError::validation(
            "caption schedule needs at least one line",
        ));
    }
    if total_duration_ms == 0 {
        return Err(ReelError::validation(
            "caption schedule duration must be > 0 ms",
        ));
    }

    // floor(i * total / n) in integer arithmetic; no float drift at slot boundaries.
    let n = lines.len() as u128;
    let bound = |i: usize| (i as u128 * u128::from(total_duration_ms) / n) as u64;
    let captions = lines
        .iter()
        .enumerate()
        .map(|(i, text)| Caption {
            text: text.as_ref().to_string(),
            start_ms: bound(i),
            end_ms: bound(i + 1),
        })
        .collect();

    Ok(CaptionSchedule {
        duration_ms: total_duration_ms,
        captions,
    })
}

#[cfg(test)]
#[path = "../../tests/unit/captions/schedule.rs"]
mod tests;
