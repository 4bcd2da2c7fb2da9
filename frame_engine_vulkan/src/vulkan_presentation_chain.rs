/// PresentationChain - Vulkan swapchain wrapper
///
/// Only wraps the driver: image count, format, present mode and extent are
/// chosen by `frame_engine::swapchain::Swapchain`. Acquire and present
/// results are mapped to `PresentStatus`; the caller decides what to do
/// about suboptimal and out-of-date chains.

use ash::vk;
use frame_engine::graphics_device::{
    Extent2D, PresentStatus, PresentationChain as EnginePresentationChain, PresentationChainDesc,
    SampleCount, Semaphore as EngineSemaphore, SurfaceFormat, Texture as EngineTexture,
    TextureInfo, TextureUsage,
};
use frame_engine::{engine_err, engine_info, Error, Result};
use std::sync::Arc;

use crate::vulkan_context::GpuContext;
use crate::vulkan_format::{color_space_to_vk, present_mode_to_vk, texture_format_to_vk};
use crate::vulkan_queue::Queue;
use crate::vulkan_sync::vk_semaphore;
use crate::vulkan_texture::Texture;

/// Owner of the `VkSwapchainKHR` handle
///
/// Shared by the chain and by every image view wrapped from it: the
/// swapchain is destroyed once the chain and all of its wrapped images
/// are gone.
pub(crate) struct SwapchainHandle {
    ctx: Arc<GpuContext>,
    pub(crate) swapchain: vk::SwapchainKHR,
}

impl Drop for SwapchainHandle {
    fn drop(&mut self) {
        unsafe {
            self.ctx.swapchain_loader.destroy_swapchain(self.swapchain, None);
        }
    }
}

/// Vulkan presentation chain
pub struct PresentationChain {
    images: Vec<Arc<dyn EngineTexture>>,
    handle: Arc<SwapchainHandle>,
    present_queue: Arc<Queue>,
    surface_format: SurfaceFormat,
    extent: Extent2D,
}

impl PresentationChain {
    pub(crate) fn create(
        ctx: Arc<GpuContext>,
        present_queue: Arc<Queue>,
        queue_families: &[u32],
        desc: &PresentationChainDesc,
        old_chain: Option<&PresentationChain>,
    ) -> Result<Self> {
        let capabilities = unsafe {
            ctx.surface_loader
                .get_physical_device_surface_capabilities(ctx.physical_device, ctx.surface)
        }
        .map_err(|e| engine_err!("frame_engine::vulkan", "Failed to query surface capabilities: {:?}", e))?;

        let sharing_mode = if queue_families.len() > 1 {
            vk::SharingMode::CONCURRENT
        } else {
            vk::SharingMode::EXCLUSIVE
        };

        let create_info = vk::SwapchainCreateInfoKHR::default()
            .surface(ctx.surface)
            .min_image_count(desc.image_count)
            .image_format(texture_format_to_vk(desc.surface_format.format))
            .image_color_space(color_space_to_vk(desc.surface_format.color_space))
            .image_extent(vk::Extent2D { width: desc.extent.width, height: desc.extent.height })
            .image_array_layers(1)
            .image_usage(vk::ImageUsageFlags::COLOR_ATTACHMENT)
            .image_sharing_mode(sharing_mode)
            .queue_family_indices(if queue_families.len() > 1 { queue_families } else { &[] })
            .pre_transform(capabilities.current_transform)
            .composite_alpha(vk::CompositeAlphaFlagsKHR::OPAQUE)
            .present_mode(present_mode_to_vk(desc.present_mode))
            .clipped(true)
            .old_swapchain(old_chain.map_or(vk::SwapchainKHR::null(), |old| old.handle.swapchain));

        let swapchain = unsafe { ctx.swapchain_loader.create_swapchain(&create_info, None) }
            .map_err(|e| match e {
                vk::Result::ERROR_SURFACE_LOST_KHR => Error::SurfaceLost("surface lost while creating swapchain".to_string()),
                e => engine_err!("frame_engine::vulkan", "Failed to create swapchain: {:?}", e),
            })?;
        let handle = Arc::new(SwapchainHandle { ctx: Arc::clone(&ctx), swapchain });

        let vk_images = unsafe { ctx.swapchain_loader.get_swapchain_images(swapchain) }
            .map_err(|e| engine_err!("frame_engine::vulkan", "Failed to get swapchain images: {:?}", e))?;

        let info = TextureInfo {
            width: desc.extent.width,
            height: desc.extent.height,
            format: desc.surface_format.format,
            samples: SampleCount::S1,
            usage: TextureUsage::COLOR_ATTACHMENT,
            presentation_owned: true,
        };
        let images = vk_images
            .into_iter()
            .map(|image| {
                Texture::wrap_presentable(Arc::clone(&ctx), Arc::clone(&handle), image, info.clone())
                    .map(|texture| Arc::new(texture) as Arc<dyn EngineTexture>)
            })
            .collect::<Result<Vec<_>>>()?;

        engine_info!(
            "frame_engine::vulkan",
            "Swapchain created: {}x{}, {} images, {:?}, {:?}",
            desc.extent.width,
            desc.extent.height,
            images.len(),
            desc.surface_format.format,
            desc.present_mode
        );

        Ok(Self {
            images,
            handle,
            present_queue,
            surface_format: desc.surface_format,
            extent: desc.extent,
        })
    }
}

impl EnginePresentationChain for PresentationChain {
    fn images(&self) -> &[Arc<dyn EngineTexture>] {
        &self.images
    }

    fn surface_format(&self) -> SurfaceFormat {
        self.surface_format
    }

    fn extent(&self) -> Extent2D {
        self.extent
    }

    fn acquire_next_image(&mut self, semaphore: &dyn EngineSemaphore, timeout_ns: u64) -> Result<(u32, PresentStatus)> {
        let result = unsafe {
            self.handle.ctx.swapchain_loader.acquire_next_image(
                self.handle.swapchain,
                timeout_ns,
                vk_semaphore(semaphore),
                vk::Fence::null(),
            )
        };
        match result {
            Ok((index, false)) => Ok((index, PresentStatus::Success)),
            Ok((index, true)) => Ok((index, PresentStatus::Suboptimal)),
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok((0, PresentStatus::OutOfDate)),
            Err(vk::Result::TIMEOUT) | Err(vk::Result::NOT_READY) => Err(Error::Timeout(format!(
                "no swapchain image available after {} ns",
                timeout_ns
            ))),
            Err(vk::Result::ERROR_SURFACE_LOST_KHR) => {
                Err(Error::SurfaceLost("surface lost during image acquisition".to_string()))
            }
            Err(e) => Err(engine_err!("frame_engine::vulkan", "Failed to acquire next swapchain image: {:?}", e)),
        }
    }

    fn present(&mut self, image_index: u32, wait_semaphores: &[&dyn EngineSemaphore]) -> Result<PresentStatus> {
        let wait_semaphores: Vec<vk::Semaphore> = wait_semaphores.iter().map(|s| vk_semaphore(*s)).collect();
        let swapchains = [self.handle.swapchain];
        let image_indices = [image_index];
        let present_info = vk::PresentInfoKHR::default()
            .wait_semaphores(&wait_semaphores)
            .swapchains(&swapchains)
            .image_indices(&image_indices);

        let queue = self.present_queue.lock();
        let result = unsafe { self.handle.ctx.swapchain_loader.queue_present(*queue, &present_info) };
        match result {
            Ok(false) => Ok(PresentStatus::Success),
            Ok(true) => Ok(PresentStatus::Suboptimal),
            Err(vk::Result::ERROR_OUT_OF_DATE_KHR) => Ok(PresentStatus::OutOfDate),
            Err(vk::Result::ERROR_SURFACE_LOST_KHR) => {
                Err(Error::SurfaceLost("surface lost during present".to_string()))
            }
            Err(e) => Err(engine_err!("frame_engine::vulkan", "Failed to present swapchain image: {:?}", e)),
        }
    }
}

/// Downcast an engine presentation chain created by this backend
pub(crate) fn vk_presentation_chain(chain: &dyn EnginePresentationChain) -> &PresentationChain {
    unsafe { &*(chain as *const dyn EnginePresentationChain as *const PresentationChain) }
}
