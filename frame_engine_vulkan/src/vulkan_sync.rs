/// Fence and Semaphore - Vulkan implementations of the engine sync traits

use ash::vk;
use frame_engine::graphics_device::{Fence as EngineFence, Semaphore as EngineSemaphore};
use frame_engine::{engine_err, Error, Result};
use std::sync::Arc;

use crate::vulkan_context::GpuContext;

/// Vulkan fence
pub struct Fence {
    ctx: Arc<GpuContext>,
    pub(crate) fence: vk::Fence,
}

impl Fence {
    pub(crate) fn new(ctx: Arc<GpuContext>, signaled: bool) -> Result<Self> {
        let flags = if signaled { vk::FenceCreateFlags::SIGNALED } else { vk::FenceCreateFlags::empty() };
        let create_info = vk::FenceCreateInfo::default().flags(flags);
        let fence = unsafe { ctx.device.create_fence(&create_info, None) }
            .map_err(|e| engine_err!("frame_engine::vulkan", "Failed to create fence: {:?}", e))?;
        Ok(Self { ctx, fence })
    }
}

impl EngineFence for Fence {
    fn wait(&self, timeout_ns: u64) -> Result<()> {
        match unsafe { self.ctx.device.wait_for_fences(&[self.fence], true, timeout_ns) } {
            Ok(()) => Ok(()),
            Err(vk::Result::TIMEOUT) => Err(Error::Timeout(format!(
                "fence still unsignaled after {} ns",
                timeout_ns
            ))),
            Err(e) => Err(engine_err!("frame_engine::vulkan", "Failed to wait for fence: {:?}", e)),
        }
    }

    fn reset(&self) -> Result<()> {
        unsafe { self.ctx.device.reset_fences(&[self.fence]) }
            .map_err(|e| engine_err!("frame_engine::vulkan", "Failed to reset fence: {:?}", e))
    }

    fn is_signaled(&self) -> Result<bool> {
        unsafe { self.ctx.device.get_fence_status(self.fence) }
            .map_err(|e| engine_err!("frame_engine::vulkan", "Failed to query fence status: {:?}", e))
    }
}

impl Drop for Fence {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_fence(self.fence, None);
        }
    }
}

/// Vulkan binary semaphore
pub struct Semaphore {
    ctx: Arc<GpuContext>,
    pub(crate) semaphore: vk::Semaphore,
}

impl Semaphore {
    pub(crate) fn new(ctx: Arc<GpuContext>) -> Result<Self> {
        let create_info = vk::SemaphoreCreateInfo::default();
        let semaphore = unsafe { ctx.device.create_semaphore(&create_info, None) }
            .map_err(|e| engine_err!("frame_engine::vulkan", "Failed to create semaphore: {:?}", e))?;
        Ok(Self { ctx, semaphore })
    }
}

impl EngineSemaphore for Semaphore {}

impl Drop for Semaphore {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_semaphore(self.semaphore, None);
        }
    }
}

/// Raw handle behind an engine semaphore
///
/// Every semaphore reaching the Vulkan backend was created by it.
pub(crate) fn vk_semaphore(semaphore: &dyn EngineSemaphore) -> vk::Semaphore {
    unsafe {
        let vk_semaphore = semaphore as *const dyn EngineSemaphore as *const Semaphore;
        (*vk_semaphore).semaphore
    }
}

pub(crate) fn vk_fence(fence: &dyn EngineFence) -> vk::Fence {
    unsafe {
        let vk_fence = fence as *const dyn EngineFence as *const Fence;
        (*vk_fence).fence
    }
}
