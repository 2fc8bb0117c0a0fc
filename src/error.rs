use thiserror::Error;

/// Everything the sampling pipeline can fail with.
///
/// Decode-library error text stays in the logs; these variants carry
/// only our own wording so the structured response never leaks
/// internal details.
#[derive(Debug, Error)]
pub enum SampleError {
    #[error("unrecognized or unsupported audio format")]
    UnsupportedFormat,

    #[error("audio stream is corrupt or ended unexpectedly")]
    CorruptStream,

    #[error("audio source contains no bytes")]
    EmptySource,

    #[error("decoded stream contains no samples")]
    EmptyStream,

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("i/o failure reading audio source: {0}")]
    IoFailure(#[from] std::io::Error),
}

impl SampleError {
    /// Stable identifier for the boundary layer to key HTTP status
    /// codes off of, independent of the display message.
    pub fn kind(&self) -> &'static str {
        match self {
            SampleError::UnsupportedFormat => "unsupported_format",
            SampleError::CorruptStream => "corrupt_stream",
            SampleError::EmptySource => "empty_source",
            SampleError::EmptyStream => "empty_stream",
            SampleError::InvalidParameter(_) => "invalid_parameter",
            SampleError::IoFailure(_) => "io_failure",
        }
    }
}
