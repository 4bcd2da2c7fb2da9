/// Fence and Semaphore traits - CPU/GPU and GPU/GPU synchronization

use crate::error::Result;

/// CPU-observable primitive signaled when submitted GPU work completes
pub trait Fence: Send + Sync {
    /// Block until the fence is signaled
    ///
    /// # Errors
    ///
    /// `Error::Timeout` if the fence is still unsignaled after `timeout_ns`.
    fn wait(&self, timeout_ns: u64) -> Result<()>;

    /// Return the fence to the unsignaled state
    fn reset(&self) -> Result<()>;

    /// Non-blocking status query
    fn is_signaled(&self) -> Result<bool>;
}

/// GPU-side primitive ordering one queue operation after another
pub trait Semaphore: Send + Sync {}
