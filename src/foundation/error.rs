/// Convenience result type used across photoreel.
pub type ReelResult<T> = Result<T, ReelError>;

/// Top-level error taxonomy used by the studio APIs.
#[derive(thiserror::Error, Debug)]
pub enum ReelError {
    /// Invalid user-provided input or configuration.
    #[error("validation error: {0}")]
    Validation(String),

    /// A capture was requested before a drawing surface was ready.
    #[error("surface unavailable: no drawing surface is ready for capture")]
    SurfaceUnavailable,

    /// A capture was requested while another one is still running on the same session.
    #[error("already recording: a capture is active on this session")]
    AlreadyRecording,

    /// Errors while drawing a frame.
    #[error("render error: {0}")]
    Render(String),

    /// Errors while encoding frames into a video artifact.
    #[error("encode error: {0}")]
    Encode(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl ReelError {
    /// Build a [`ReelError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`ReelError::Render`] value.
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`ReelError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Build a [`ReelError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
