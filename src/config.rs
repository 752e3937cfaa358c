use std::path::Path;

use anyhow::Context as _;

use crate::assets::font::FontSource;
use crate::encode::sink::Container;
use crate::foundation::core::Fps;
use crate::foundation::error::{ReelError, ReelResult};

/// The reel lengths offered by default, in milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DurationPreset {
    /// 12 seconds.
    Short,
    /// 18 seconds.
    Medium,
    /// 24 seconds.
    Long,
}

impl DurationPreset {
    /// Every preset, shortest first.
    pub const ALL: [DurationPreset; 3] = [Self::Short, Self::Medium, Self::Long];

    /// Preset length in milliseconds.
    pub fn ms(self) -> u64 {
        match self {
            Self::Short => 12_000,
            Self::Medium => 18_000,
            Self::Long => 24_000,
        }
    }
}

/// Studio settings, loadable from JSON. Missing fields take their defaults.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StudioConfig {
    /// Capture frame rate.
    pub fps: Fps,
    /// Reel length in milliseconds.
    pub duration_ms: u64,
    /// Output container.
    pub container: Container,
    /// Caption font.
    pub font: FontSource,
    /// Replace an existing output file.
    pub overwrite: bool,
}

impl Default for StudioConfig {
    fn default() -> Self {
        Self {
            fps: Fps::default(),
            duration_ms: DurationPreset::Short.ms(),
            container: Container::default(),
            font: FontSource::default(),
            overwrite: true,
        }
    }
}

impl StudioConfig {
    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> ReelResult<Self> {
        let cfg: Self = serde_json::from_str(json)
            .map_err(|e| ReelError::serde(format!("parse studio config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a JSON config file.
    pub fn from_path(path: impl AsRef<Path>) -> ReelResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("read config '{}'", path.display()))?;
        Self::from_json(&json)
    }

    /// Check value ranges that serde cannot express.
    pub fn validate(&self) -> ReelResult<()> {
        Fps::new(self.fps.get())?;
        if self.duration_ms == 0 {
            return Err(ReelError::validation("duration_ms must be > 0"));
        }
        if let FontSource::File(path) = &self.font
            && path.as_os_str().is_empty()
        {
            return Err(ReelError::validation("font path must not be empty"));
        }
        Ok(())
    }
}

/// Parse a duration such as `18s`, `1500ms` or a bare number of seconds.
pub fn parse_duration_ms(s: &str) -> ReelResult<u64> {
    let s = s.trim();
    let (digits, scale) = if let Some(ms) = s.strip_suffix("ms") {
        (ms, 1)
    } else if let Some(secs) = s.strip_suffix('s') {
        (secs, 1000)
    } else {
        (s, 1000)
    };
    let value: u64 = digits
        .trim()
        .parse()
        .map_err(|_| ReelError::validation(format!("invalid duration '{s}'")))?;
    let ms = value
        .checked_mul(scale)
        .ok_or_else(|| ReelError::validation(format!("duration '{s}' is too large")))?;
    if ms == 0 {
        return Err(ReelError::validation("duration must be > 0"));
    }
    Ok(ms)
}

#[cfg(test)]
#[path = "../tests/unit/config.rs"]
mod tests;
