/// Texture - Vulkan implementation of the engine Texture trait
///
/// Two flavours share this type: owned attachments (image + memory from
/// gpu-allocator) and presentable images wrapped from a swapchain, where
/// only the view belongs to the texture.

use ash::vk;
use frame_engine::graphics_device::{Texture as EngineTexture, TextureDesc, TextureInfo};
use frame_engine::{engine_err, engine_error, Error, Result};
use gpu_allocator::vulkan::{Allocation, AllocationCreateDesc, AllocationScheme};
use gpu_allocator::MemoryLocation;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;
use crate::vulkan_format::{aspect_flags, sample_count_to_vk, texture_format_to_vk, texture_usage_to_vk};
use crate::vulkan_presentation_chain::SwapchainHandle;

/// Vulkan texture implementation
pub struct Texture {
    ctx: Arc<GpuContext>,
    pub(crate) image: vk::Image,
    pub(crate) view: vk::ImageView,
    /// None for presentable images
    allocation: Option<Allocation>,
    /// Keeps the swapchain alive while its images are still referenced
    _chain: Option<Arc<SwapchainHandle>>,
    info: TextureInfo,
}

impl Texture {
    /// Create an owned image, bind device-local memory and create its view
    pub(crate) fn create(ctx: Arc<GpuContext>, desc: &TextureDesc) -> Result<Self> {
        if desc.width == 0 || desc.height == 0 {
            return Err(Error::InvalidResource(format!(
                "texture extent {}x{} is empty",
                desc.width, desc.height
            )));
        }

        let format = texture_format_to_vk(desc.format);
        let image_info = vk::ImageCreateInfo::default()
            .image_type(vk::ImageType::TYPE_2D)
            .format(format)
            .extent(vk::Extent3D { width: desc.width, height: desc.height, depth: 1 })
            .mip_levels(1)
            .array_layers(1)
            .samples(sample_count_to_vk(desc.samples))
            .tiling(vk::ImageTiling::OPTIMAL)
            .usage(texture_usage_to_vk(desc.usage))
            .sharing_mode(vk::SharingMode::EXCLUSIVE)
            .initial_layout(vk::ImageLayout::UNDEFINED);

        unsafe {
            let image = ctx.device.create_image(&image_info, None)
                .map_err(|e| engine_err!("frame_engine::vulkan", "Failed to create image: {:?}", e))?;

            let requirements = ctx.device.get_image_memory_requirements(image);
            let allocation = ctx.allocator().allocate(&AllocationCreateDesc {
                name: "attachment",
                requirements,
                location: MemoryLocation::GpuOnly,
                linear: false,
                allocation_scheme: AllocationScheme::GpuAllocatorManaged,
            });
            let allocation = match allocation {
                Ok(allocation) => allocation,
                Err(_) => {
                    ctx.device.destroy_image(image, None);
                    let size_mb = requirements.size as f64 / (1024.0 * 1024.0);
                    engine_error!("frame_engine::vulkan", "Out of GPU memory for texture (required: {:.2} MB)", size_mb);
                    return Err(Error::OutOfMemory);
                }
            };

            let bound = ctx.device.bind_image_memory(image, allocation.memory(), allocation.offset());
            let view = bound.and_then(|_| {
                Self::create_view(&ctx, image, format, aspect_flags(desc.format, desc.usage))
            });
            let view = match view {
                Ok(view) => view,
                Err(e) => {
                    ctx.allocator().free(allocation).ok();
                    ctx.device.destroy_image(image, None);
                    return Err(engine_err!("frame_engine::vulkan", "Failed to bind texture memory or create view: {:?}", e));
                }
            };

            Ok(Self {
                ctx,
                image,
                view,
                allocation: Some(allocation),
                _chain: None,
                info: TextureInfo {
                    width: desc.width,
                    height: desc.height,
                    format: desc.format,
                    samples: desc.samples,
                    usage: desc.usage,
                    presentation_owned: false,
                },
            })
        }
    }

    /// Wrap a presentable image: creates a view, never touches the image itself
    pub(crate) fn wrap_presentable(
        ctx: Arc<GpuContext>,
        chain: Arc<SwapchainHandle>,
        image: vk::Image,
        info: TextureInfo,
    ) -> Result<Self> {
        let format = texture_format_to_vk(info.format);
        let view = Self::create_view(&ctx, image, format, vk::ImageAspectFlags::COLOR)
            .map_err(|e| engine_err!("frame_engine::vulkan", "Failed to create swapchain image view: {:?}", e))?;
        Ok(Self { ctx, image, view, allocation: None, _chain: Some(chain), info })
    }

    fn create_view(
        ctx: &GpuContext,
        image: vk::Image,
        format: vk::Format,
        aspect_mask: vk::ImageAspectFlags,
    ) -> ash::prelude::VkResult<vk::ImageView> {
        let view_info = vk::ImageViewCreateInfo::default()
            .image(image)
            .view_type(vk::ImageViewType::TYPE_2D)
            .format(format)
            .components(vk::ComponentMapping {
                r: vk::ComponentSwizzle::IDENTITY,
                g: vk::ComponentSwizzle::IDENTITY,
                b: vk::ComponentSwizzle::IDENTITY,
                a: vk::ComponentSwizzle::IDENTITY,
            })
            .subresource_range(vk::ImageSubresourceRange {
                aspect_mask,
                base_mip_level: 0,
                level_count: 1,
                base_array_layer: 0,
                layer_count: 1,
            });
        unsafe { ctx.device.create_image_view(&view_info, None) }
    }
}

impl EngineTexture for Texture {
    fn info(&self) -> &TextureInfo {
        &self.info
    }
}

impl Drop for Texture {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_image_view(self.view, None);

            if let Some(allocation) = self.allocation.take() {
                self.ctx.allocator().free(allocation).ok();
                self.ctx.device.destroy_image(self.image, None);
            }
        }
    }
}

/// Downcast an engine texture created by this backend
pub(crate) fn vk_texture(texture: &dyn EngineTexture) -> &Texture {
    unsafe { &*(texture as *const dyn EngineTexture as *const Texture) }
}
