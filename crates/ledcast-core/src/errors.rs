use thiserror::Error;

/// Failures raised by the capture registry and backends.
#[derive(Error, Debug)]
pub enum CaptureError {
    #[error("Invalid capture method: {method}")]
    InvalidMethod { method: String },

    #[error("Capture session init failed: {reason}")]
    SessionInit { reason: String },

    #[error("Frame capture failed: {reason}")]
    CaptureFailed { reason: String },

    #[error("Pixel format query failed: {reason}")]
    FormatQuery { reason: String },
}

/// Failures raised while delivering a frame downstream.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Invalid dispatch target: {reason}")]
    InvalidTarget { reason: String },

    #[error("Frame exceeds wire limits: {reason}")]
    FrameTooLarge { reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
