//! Error types for the frame engine
//!
//! One error enum is shared by every component and by the GPU backends.
//! Errors are split into two families: fatal ones (the graphics context
//! cannot continue) and caller-misuse ones (the call is rejected, state is
//! left untouched). Driver "suboptimal" / "out of date" signals are not
//! errors; they travel through `SwapchainOutcome`.

use std::fmt;

/// Result type for frame engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Frame engine errors
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Backend-specific error (Vulkan, mock, ...)
    BackendError(String),

    /// Out of GPU or host memory
    OutOfMemory,

    /// Invalid resource or argument (texture, attachment, clear value, ...)
    InvalidResource(String),

    /// Initialization failed (instance, device, queue family, ...)
    InitializationFailed(String),

    /// A fence wait or image acquisition did not complete in time
    Timeout(String),

    /// The presentation surface can no longer be used
    SurfaceLost(String),

    /// Operation called in the wrong state (e.g. render outside a frame)
    InvalidState(String),
}

impl Error {
    /// Whether this error leaves the graphics context unusable
    ///
    /// Invalid resources and invalid states are caller mistakes: the call
    /// is rejected but the engine keeps running. Everything else requires
    /// tearing down the whole context.
    pub fn is_fatal(&self) -> bool {
        !matches!(self, Error::InvalidResource(_) | Error::InvalidState(_))
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::BackendError(msg) => write!(f, "Backend error: {}", msg),
            Error::OutOfMemory => write!(f, "Out of GPU memory"),
            Error::InvalidResource(msg) => write!(f, "Invalid resource: {}", msg),
            Error::InitializationFailed(msg) => write!(f, "Initialization failed: {}", msg),
            Error::Timeout(msg) => write!(f, "Timeout: {}", msg),
            Error::SurfaceLost(msg) => write!(f, "Surface lost: {}", msg),
            Error::InvalidState(msg) => write!(f, "Invalid state: {}", msg),
        }
    }
}

impl std::error::Error for Error {}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
