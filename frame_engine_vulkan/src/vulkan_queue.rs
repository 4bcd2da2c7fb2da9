/// Queue - Vulkan implementation of the engine Queue trait

use ash::vk;
use frame_engine::graphics_device::{Queue as EngineQueue, SubmitInfo};
use frame_engine::{engine_err, Result};
use std::sync::{Arc, Mutex, MutexGuard};

use crate::vulkan_command_list::vk_command_buffer;
use crate::vulkan_context::GpuContext;
use crate::vulkan_format::pipeline_stages_to_vk;
use crate::vulkan_sync::{vk_fence, vk_semaphore};

/// Vulkan queue
///
/// `vkQueueSubmit` and `vkQueuePresentKHR` need external synchronization,
/// hence the mutex around the handle.
pub struct Queue {
    ctx: Arc<GpuContext>,
    queue: Mutex<vk::Queue>,
    family_index: u32,
}

impl Queue {
    pub(crate) fn new(ctx: Arc<GpuContext>, family_index: u32) -> Self {
        let queue = unsafe { ctx.device.get_device_queue(family_index, 0) };
        Self { ctx, queue: Mutex::new(queue), family_index }
    }

    /// Lock the queue handle for a submission or a present
    pub(crate) fn lock(&self) -> MutexGuard<'_, vk::Queue> {
        self.queue.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl EngineQueue for Queue {
    fn family_index(&self) -> u32 {
        self.family_index
    }

    fn submit(&self, info: &SubmitInfo) -> Result<()> {
        let command_buffers: Vec<vk::CommandBuffer> =
            info.command_lists.iter().map(|cmd| vk_command_buffer(*cmd)).collect();
        let wait_semaphores: Vec<vk::Semaphore> =
            info.wait_semaphores.iter().map(|s| vk_semaphore(*s)).collect();
        let wait_stages: Vec<vk::PipelineStageFlags> =
            info.wait_stages.iter().map(|s| pipeline_stages_to_vk(*s)).collect();
        let signal_semaphores: Vec<vk::Semaphore> =
            info.signal_semaphores.iter().map(|s| vk_semaphore(*s)).collect();
        let fence = info.fence.map(vk_fence).unwrap_or(vk::Fence::null());

        let submit_info = vk::SubmitInfo::default()
            .wait_semaphores(&wait_semaphores)
            .wait_dst_stage_mask(&wait_stages)
            .command_buffers(&command_buffers)
            .signal_semaphores(&signal_semaphores);

        let queue = self.lock();
        unsafe { self.ctx.device.queue_submit(*queue, &[submit_info], fence) }
            .map_err(|e| engine_err!("frame_engine::vulkan", "Failed to submit commands to GPU queue: {:?}", e))
    }

    fn wait_idle(&self) -> Result<()> {
        let queue = self.lock();
        unsafe { self.ctx.device.queue_wait_idle(*queue) }
            .map_err(|e| engine_err!("frame_engine::vulkan", "Failed to wait for queue idle: {:?}", e))
    }
}
