/// Buffer - Vulkan implementation of the engine Buffer trait

use ash::vk;
use frame_engine::graphics_device::{Buffer as EngineBuffer, BufferDesc};
use frame_engine::{engine_err, engine_error, Error, Result};
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use gpu_allocator::MemoryLocation;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;
use crate::vulkan_format::buffer_usage_to_vk;

/// Host-visible Vulkan buffer
pub struct Buffer {
    ctx: Arc<GpuContext>,
    pub(crate) buffer: vk::Buffer,
    allocation: Option<Allocation>,
    size: u64,
}

impl Buffer {
    pub(crate) fn create(ctx: Arc<GpuContext>, desc: &BufferDesc) -> Result<Self> {
        if desc.size == 0 {
            return Err(Error::InvalidResource("buffer size must be non-zero".to_string()));
        }

        let create_info = vk::BufferCreateInfo::default()
            .size(desc.size)
            .usage(buffer_usage_to_vk(desc.usage) | vk::BufferUsageFlags::TRANSFER_DST)
            .sharing_mode(vk::SharingMode::EXCLUSIVE);

        unsafe {
            let buffer = ctx.device.create_buffer(&create_info, None)
                .map_err(|e| engine_err!("frame_engine::vulkan", "Failed to create buffer of size {} bytes: {:?}", desc.size, e))?;

            let requirements = ctx.device.get_buffer_memory_requirements(buffer);
            let allocation = ctx.allocator().allocate(&AllocationCreateDesc {
                name: "buffer",
                requirements,
                location: MemoryLocation::CpuToGpu,
                linear: true,
                allocation_scheme: AllocationScheme::GpuAllocatorManaged,
            });
            let allocation = match allocation {
                Ok(allocation) => allocation,
                Err(_) => {
                    ctx.device.destroy_buffer(buffer, None);
                    let size_mb = requirements.size as f64 / (1024.0 * 1024.0);
                    engine_error!("frame_engine::vulkan", "Out of GPU memory for buffer (required: {:.2} MB)", size_mb);
                    return Err(Error::OutOfMemory);
                }
            };

            if let Err(e) = ctx.device.bind_buffer_memory(buffer, allocation.memory(), allocation.offset()) {
                ctx.allocator().free(allocation).ok();
                ctx.device.destroy_buffer(buffer, None);
                return Err(engine_err!("frame_engine::vulkan", "Failed to bind buffer memory: {:?}", e));
            }

            Ok(Self { ctx, buffer, allocation: Some(allocation), size: desc.size })
        }
    }
}

impl EngineBuffer for Buffer {
    fn update(&self, offset: u64, data: &[u8]) -> Result<()> {
        let end = offset.checked_add(data.len() as u64);
        if end.map_or(true, |end| end > self.size) {
            return Err(Error::InvalidResource(format!(
                "buffer update of {} bytes at offset {} exceeds size {}",
                data.len(),
                offset,
                self.size
            )));
        }

        let allocation = self.allocation.as_ref().ok_or_else(|| {
            engine_err!("frame_engine::vulkan", "Buffer update failed: no GPU allocation")
        })?;
        let mapped_ptr = allocation
            .mapped_ptr()
            .ok_or_else(|| engine_err!("frame_engine::vulkan", "Buffer is not CPU-accessible"))?
            .as_ptr() as *mut u8;

        unsafe {
            std::ptr::copy_nonoverlapping(data.as_ptr(), mapped_ptr.add(offset as usize), data.len());
        }
        Ok(())
    }

    fn size(&self) -> u64 {
        self.size
    }
}

impl Drop for Buffer {
    fn drop(&mut self) {
        unsafe {
            if let Some(allocation) = self.allocation.take() {
                self.ctx.allocator().free(allocation).ok();
            }
            self.ctx.device.destroy_buffer(self.buffer, None);
        }
    }
}

pub(crate) fn vk_buffer(buffer: &dyn EngineBuffer) -> vk::Buffer {
    unsafe { (*(buffer as *const dyn EngineBuffer as *const Buffer)).buffer }
}
