/// Queue trait - command submission

use crate::error::Result;
use crate::graphics_device::{CommandList, Fence, PipelineStages, Semaphore};

/// One batch of command lists for `Queue::submit()`
///
/// `wait_stages[i]` is the stage gated by `wait_semaphores[i]`.
pub struct SubmitInfo<'a> {
    pub command_lists: &'a [&'a dyn CommandList],
    pub wait_semaphores: &'a [&'a dyn Semaphore],
    pub wait_stages: &'a [PipelineStages],
    pub signal_semaphores: &'a [&'a dyn Semaphore],
    /// Signaled once every command list of the batch has completed
    pub fence: Option<&'a dyn Fence>,
}

/// Device queue
pub trait Queue: Send + Sync {
    /// Queue family this queue belongs to
    fn family_index(&self) -> u32;

    /// Submit recorded command lists
    fn submit(&self, info: &SubmitInfo) -> Result<()>;

    /// Wait until the queue has no pending work
    fn wait_idle(&self) -> Result<()>;
}
