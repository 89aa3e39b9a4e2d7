/// Result alias used throughout the crate.
pub type WincompResult<T> = Result<T, WincompError>;

/// Crate error type.
///
/// Per-window failures (`Resource`) are expected to be logged and absorbed by the compositor;
/// `FrameBuffer` is the only variant that stops frame production altogether.
#[derive(thiserror::Error, Debug)]
pub enum WincompError {
    /// Invalid input (bad kernel shape, bad geometry, ...).
    #[error("validation error: {0}")]
    Validation(String),

    /// A display-server resource (pixmap, picture, texture) could not be created or used.
    #[error("resource error: {0}")]
    Resource(String),

    /// A feature or backend is not available on this server or in this build.
    #[error("unsupported: {0}")]
    Unsupported(String),

    /// The screen-sized frame buffer could not be allocated. No frame can be produced.
    #[error("fatal: frame buffer allocation failed: {0}")]
    FrameBuffer(String),

    /// JSON (de)serialization failure.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Any other error.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl WincompError {
    /// Build a [`WincompError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`WincompError::Resource`].
    pub fn resource(msg: impl Into<String>) -> Self {
        Self::Resource(msg.into())
    }

    /// Build a [`WincompError::Unsupported`].
    pub fn unsupported(msg: impl Into<String>) -> Self {
        Self::Unsupported(msg.into())
    }

    /// Build a [`WincompError::FrameBuffer`].
    pub fn frame_buffer(msg: impl Into<String>) -> Self {
        Self::FrameBuffer(msg.into())
    }

    /// Build a [`WincompError::Serde`].
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }

    /// Return `true` for errors after which no frame can be produced.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::FrameBuffer(_))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
