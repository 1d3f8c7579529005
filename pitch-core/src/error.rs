/// Crate-level error type for the pitch pipeline.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A frame with no samples was handed to the pipeline.
    #[error("sample frame is empty")]
    EmptyFrame,

    /// The frame is silent or holds non-finite samples and cannot be normalized.
    #[error("sample frame is degenerate (peak amplitude {peak})")]
    DegenerateFrame { peak: f32 },

    /// A frame did not match the configured analysis window.
    #[error("frame length mismatch: expected {expected}, got {got}")]
    FrameLength { expected: usize, got: usize },

    /// Invalid configuration value.
    #[error("invalid parameter `{name}`: got {value}, {reason}")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: &'static str,
    },

    /// Capture device could not be opened or configured.
    #[error("audio device error: {0}")]
    AudioDevice(String),

    /// File I/O errors.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Configuration (de)serialization errors.
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Convenience Result type for pitch pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;
