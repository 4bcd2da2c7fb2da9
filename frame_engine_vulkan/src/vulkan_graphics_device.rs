/// VulkanGraphicsDevice - Vulkan implementation of the GraphicsDevice trait
///
/// Owns the surface for the whole device lifetime (presentation chains are
/// created against it) and hands an `Arc<GpuContext>` to every resource.

use ash::vk;
use frame_engine::graphics_device::{
    BindingGroup as EngineBindingGroup, BindingResource, Buffer as EngineBuffer, BufferDesc,
    CommandList as EngineCommandList, DeviceSettings, Extent2D, Fence as EngineFence,
    Framebuffer as EngineFramebuffer, FramebufferDesc, GraphicsDevice, Pipeline as EnginePipeline,
    PipelineDesc, PresentMode, PresentationChain as EnginePresentationChain, PresentationChainDesc,
    Queue as EngineQueue, RenderPass as EngineRenderPass, RenderPassDesc,
    Semaphore as EngineSemaphore, Shader as EngineShader, ShaderDesc, SurfaceCapabilities,
    SurfaceFormat, Texture as EngineTexture, TextureDesc,
};
use frame_engine::{engine_err, engine_error, engine_info, engine_warn, Config, Error, Result};
use gpu_allocator::vulkan::{Allocator, AllocatorCreateDesc};
use raw_window_handle::{HasDisplayHandle, HasWindowHandle};
use std::ffi::CString;
use std::sync::Arc;

use crate::debug::{init_debug_config, severity_flags, vulkan_debug_callback, DebugConfig};
use crate::vulkan_binding_group::DescriptorAllocator;
use crate::vulkan_buffer::Buffer;
use crate::vulkan_command_list::CommandList;
use crate::vulkan_context::GpuContext;
use crate::vulkan_format::{color_space_from_vk, present_mode_from_vk, texture_format_from_vk};
use crate::vulkan_frame_buffer::Framebuffer;
use crate::vulkan_pipeline::{vk_pipeline, Pipeline};
use crate::vulkan_presentation_chain::{vk_presentation_chain, PresentationChain};
use crate::vulkan_queue::Queue;
use crate::vulkan_render_pass::RenderPass;
use crate::vulkan_shader::Shader;
use crate::vulkan_sync::{Fence, Semaphore};
use crate::vulkan_texture::Texture;

fn init_error(message: String) -> Error {
    engine_error!("frame_engine::vulkan", "{}", message);
    Error::InitializationFailed(message)
}

/// Vulkan graphics device
pub struct VulkanGraphicsDevice {
    ctx: Arc<GpuContext>,
    graphics_queue: Arc<Queue>,
    present_queue: Arc<Queue>,
    /// Distinct queue families touching presentable images
    queue_families: Vec<u32>,
    descriptors: DescriptorAllocator,
    settings: DeviceSettings,
}

impl VulkanGraphicsDevice {
    /// Create a device presenting to `window`
    ///
    /// # Errors
    ///
    /// `Error::InitializationFailed` when the Vulkan library, a suitable GPU
    /// or the surface is unavailable.
    pub fn new<W: HasDisplayHandle + HasWindowHandle>(window: &W, config: &Config) -> Result<Self> {
        let enable_validation = config.enable_validation && cfg!(feature = "vulkan-validation");
        if config.enable_validation && !enable_validation {
            engine_warn!(
                "frame_engine::vulkan",
                "Validation requested but frame_engine_vulkan was built without the vulkan-validation feature"
            );
        }

        unsafe {
            let entry = ash::Entry::load()
                .map_err(|e| init_error(format!("Failed to load Vulkan library: {:?}", e)))?;

            let app_name = CString::new(config.app_name.as_str())
                .map_err(|e| init_error(format!("Invalid application name: {}", e)))?;
            let (major, minor, patch) = config.app_version;
            let app_info = vk::ApplicationInfo::default()
                .application_name(&app_name)
                .application_version(vk::make_api_version(0, major, minor, patch))
                .engine_name(c"FrameEngine")
                .engine_version(vk::make_api_version(0, 0, 1, 0))
                .api_version(vk::API_VERSION_1_2);

            let display_handle = window.display_handle()
                .map_err(|e| init_error(format!("Failed to get display handle: {}", e)))?;
            let window_handle = window.window_handle()
                .map_err(|e| init_error(format!("Failed to get window handle: {}", e)))?;

            let mut extension_names = ash_window::enumerate_required_extensions(display_handle.as_raw())
                .map_err(|e| init_error(format!("Failed to get required extensions: {}", e)))?
                .to_vec();
            if enable_validation {
                extension_names.push(ash::ext::debug_utils::NAME.as_ptr());
            }
            let layer_names = if enable_validation {
                vec![c"VK_LAYER_KHRONOS_validation".as_ptr()]
            } else {
                vec![]
            };

            let instance_info = vk::InstanceCreateInfo::default()
                .application_info(&app_info)
                .enabled_layer_names(&layer_names)
                .enabled_extension_names(&extension_names);
            let instance = entry.create_instance(&instance_info, None)
                .map_err(|e| init_error(format!("Failed to create Vulkan instance: {:?}", e)))?;

            let debug_messenger = if enable_validation {
                init_debug_config(DebugConfig {
                    severity: config.debug_severity,
                    panic_on_error: config.panic_on_validation_error,
                });
                let debug_utils = ash::ext::debug_utils::Instance::new(&entry, &instance);
                let messenger_info = vk::DebugUtilsMessengerCreateInfoEXT::default()
                    .message_severity(severity_flags(config.debug_severity))
                    .message_type(
                        vk::DebugUtilsMessageTypeFlagsEXT::GENERAL
                            | vk::DebugUtilsMessageTypeFlagsEXT::VALIDATION
                            | vk::DebugUtilsMessageTypeFlagsEXT::PERFORMANCE,
                    )
                    .pfn_user_callback(Some(vulkan_debug_callback));
                match debug_utils.create_debug_utils_messenger(&messenger_info, None) {
                    Ok(messenger) => Some((debug_utils, messenger)),
                    Err(e) => {
                        crate::debug::cleanup_debug_config();
                        instance.destroy_instance(None);
                        return Err(init_error(format!("Failed to create debug messenger: {:?}", e)));
                    }
                }
            } else {
                None
            };

            // Everything created so far is released by this on the error paths below
            let destroy_instance = |debug_messenger: Option<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)>| {
                if let Some((debug_utils, messenger)) = debug_messenger {
                    crate::debug::cleanup_debug_config();
                    debug_utils.destroy_debug_utils_messenger(messenger, None);
                }
                instance.destroy_instance(None);
            };

            let surface = match ash_window::create_surface(
                &entry,
                &instance,
                display_handle.as_raw(),
                window_handle.as_raw(),
                None,
            ) {
                Ok(surface) => surface,
                Err(e) => {
                    destroy_instance(debug_messenger);
                    return Err(init_error(format!("Failed to create surface: {:?}", e)));
                }
            };
            let surface_loader = ash::khr::surface::Instance::new(&entry, &instance);

            let selected = Self::select_physical_device(&instance, &surface_loader, surface);
            let (physical_device, graphics_family, present_family) = match selected {
                Ok(selected) => selected,
                Err(e) => {
                    surface_loader.destroy_surface(surface, None);
                    destroy_instance(debug_messenger);
                    return Err(e);
                }
            };

            let properties = instance.get_physical_device_properties(physical_device);
            let device_name = properties
                .device_name_as_c_str()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            engine_info!(
                "frame_engine::vulkan",
                "Using GPU '{}' (graphics family {}, present family {})",
                device_name,
                graphics_family,
                present_family
            );

            let queue_priorities = [1.0];
            let mut queue_families = vec![graphics_family];
            if present_family != graphics_family {
                queue_families.push(present_family);
            }
            let queue_infos: Vec<vk::DeviceQueueCreateInfo> = queue_families
                .iter()
                .map(|&family| {
                    vk::DeviceQueueCreateInfo::default()
                        .queue_family_index(family)
                        .queue_priorities(&queue_priorities)
                })
                .collect();
            let device_extensions = [ash::khr::swapchain::NAME.as_ptr()];
            let device_features = vk::PhysicalDeviceFeatures::default();
            let device_info = vk::DeviceCreateInfo::default()
                .queue_create_infos(&queue_infos)
                .enabled_extension_names(&device_extensions)
                .enabled_features(&device_features);

            let device = match instance.create_device(physical_device, &device_info, None) {
                Ok(device) => device,
                Err(e) => {
                    surface_loader.destroy_surface(surface, None);
                    destroy_instance(debug_messenger);
                    return Err(init_error(format!("Failed to create logical device: {:?}", e)));
                }
            };

            let allocator = match Allocator::new(&AllocatorCreateDesc {
                instance: instance.clone(),
                device: device.clone(),
                physical_device,
                debug_settings: Default::default(),
                buffer_device_address: false,
                allocation_sizes: Default::default(),
            }) {
                Ok(allocator) => allocator,
                Err(e) => {
                    device.destroy_device(None);
                    surface_loader.destroy_surface(surface, None);
                    destroy_instance(debug_messenger);
                    return Err(init_error(format!("Failed to create GPU allocator: {:?}", e)));
                }
            };

            // From here on the context owns the teardown
            let ctx = Arc::new(GpuContext::new(
                entry,
                instance,
                physical_device,
                device,
                allocator,
                surface_loader,
                surface,
                debug_messenger,
            ));

            let graphics_queue = Arc::new(Queue::new(Arc::clone(&ctx), graphics_family));
            let present_queue = if present_family == graphics_family {
                Arc::clone(&graphics_queue)
            } else {
                Arc::new(Queue::new(Arc::clone(&ctx), present_family))
            };

            let descriptors = DescriptorAllocator::new(&ctx)?;

            engine_info!("frame_engine::vulkan", "Vulkan device initialized (validation: {})", enable_validation);

            Ok(Self {
                ctx,
                graphics_queue,
                present_queue,
                queue_families,
                descriptors,
                settings: config.device_settings(),
            })
        }
    }

    /// First GPU with a graphics family, a present family and the swapchain
    /// extension; discrete GPUs win over the rest
    unsafe fn select_physical_device(
        instance: &ash::Instance,
        surface_loader: &ash::khr::surface::Instance,
        surface: vk::SurfaceKHR,
    ) -> Result<(vk::PhysicalDevice, u32, u32)> {
        let physical_devices = instance.enumerate_physical_devices()
            .map_err(|e| init_error(format!("Failed to enumerate physical devices: {:?}", e)))?;

        let mut candidates = Vec::new();
        for physical_device in physical_devices {
            let has_swapchain = instance
                .enumerate_device_extension_properties(physical_device)
                .map(|extensions| {
                    extensions.iter().any(|ext| {
                        ext.extension_name_as_c_str().is_ok_and(|name| name == ash::khr::swapchain::NAME)
                    })
                })
                .unwrap_or(false);
            if !has_swapchain {
                continue;
            }

            let families = instance.get_physical_device_queue_family_properties(physical_device);
            let graphics = families
                .iter()
                .position(|family| family.queue_flags.contains(vk::QueueFlags::GRAPHICS))
                .map(|index| index as u32);
            let supports_present = |index: u32| {
                surface_loader
                    .get_physical_device_surface_support(physical_device, index, surface)
                    .unwrap_or(false)
            };
            // Prefer a family doing both
            let present = match graphics {
                Some(index) if supports_present(index) => Some(index),
                _ => (0..families.len() as u32).find(|&index| supports_present(index)),
            };

            if let (Some(graphics), Some(present)) = (graphics, present) {
                let discrete = instance.get_physical_device_properties(physical_device).device_type
                    == vk::PhysicalDeviceType::DISCRETE_GPU;
                candidates.push((discrete, physical_device, graphics, present));
            }
        }

        candidates
            .iter()
            .find(|candidate| candidate.0)
            .or_else(|| candidates.first())
            .map(|&(_, physical_device, graphics, present)| (physical_device, graphics, present))
            .ok_or_else(|| init_error("No GPU with graphics, present and swapchain support found".to_string()))
    }
}

impl GraphicsDevice for VulkanGraphicsDevice {
    fn settings(&self) -> &DeviceSettings {
        &self.settings
    }

    fn graphics_queue(&self) -> Arc<dyn EngineQueue> {
        Arc::clone(&self.graphics_queue) as Arc<dyn EngineQueue>
    }

    fn present_queue(&self) -> Arc<dyn EngineQueue> {
        Arc::clone(&self.present_queue) as Arc<dyn EngineQueue>
    }

    fn surface_capabilities(&self) -> Result<SurfaceCapabilities> {
        let caps = unsafe {
            self.ctx.surface_loader
                .get_physical_device_surface_capabilities(self.ctx.physical_device, self.ctx.surface)
        }
        .map_err(|e| match e {
            vk::Result::ERROR_SURFACE_LOST_KHR => Error::SurfaceLost("surface lost while querying capabilities".to_string()),
            e => engine_err!("frame_engine::vulkan", "Failed to query surface capabilities: {:?}", e),
        })?;

        let current_extent = if caps.current_extent.width == u32::MAX {
            None
        } else {
            Some(Extent2D::new(caps.current_extent.width, caps.current_extent.height))
        };
        Ok(SurfaceCapabilities {
            min_image_count: caps.min_image_count,
            max_image_count: caps.max_image_count,
            current_extent,
            min_extent: Extent2D::new(caps.min_image_extent.width, caps.min_image_extent.height),
            max_extent: Extent2D::new(caps.max_image_extent.width, caps.max_image_extent.height),
        })
    }

    fn surface_formats(&self) -> Result<Vec<SurfaceFormat>> {
        let formats = unsafe {
            self.ctx.surface_loader
                .get_physical_device_surface_formats(self.ctx.physical_device, self.ctx.surface)
        }
        .map_err(|e| engine_err!("frame_engine::vulkan", "Failed to query surface formats: {:?}", e))?;

        // Formats the engine has no name for are skipped
        Ok(formats
            .iter()
            .filter_map(|f| {
                Some(SurfaceFormat {
                    format: texture_format_from_vk(f.format)?,
                    color_space: color_space_from_vk(f.color_space)?,
                })
            })
            .collect())
    }

    fn surface_present_modes(&self) -> Result<Vec<PresentMode>> {
        let modes = unsafe {
            self.ctx.surface_loader
                .get_physical_device_surface_present_modes(self.ctx.physical_device, self.ctx.surface)
        }
        .map_err(|e| engine_err!("frame_engine::vulkan", "Failed to query present modes: {:?}", e))?;

        // FIFO is always supported; listed first it becomes the fallback
        let mut result = vec![PresentMode::Fifo];
        result.extend(
            modes
                .iter()
                .filter_map(|&mode| present_mode_from_vk(mode))
                .filter(|&mode| mode != PresentMode::Fifo),
        );
        Ok(result)
    }

    fn create_presentation_chain(
        &self,
        desc: &PresentationChainDesc,
        old_chain: Option<&dyn EnginePresentationChain>,
    ) -> Result<Box<dyn EnginePresentationChain>> {
        let chain = PresentationChain::create(
            Arc::clone(&self.ctx),
            Arc::clone(&self.present_queue),
            &self.queue_families,
            desc,
            old_chain.map(vk_presentation_chain),
        )?;
        Ok(Box::new(chain))
    }

    fn create_texture(&self, desc: &TextureDesc) -> Result<Arc<dyn EngineTexture>> {
        Ok(Arc::new(Texture::create(Arc::clone(&self.ctx), desc)?))
    }

    fn create_buffer(&self, desc: &BufferDesc) -> Result<Arc<dyn EngineBuffer>> {
        Ok(Arc::new(Buffer::create(Arc::clone(&self.ctx), desc)?))
    }

    fn create_shader(&self, desc: &ShaderDesc) -> Result<Arc<dyn EngineShader>> {
        Ok(Arc::new(Shader::create(Arc::clone(&self.ctx), desc)?))
    }

    fn create_render_pass(&self, desc: &RenderPassDesc) -> Result<Arc<dyn EngineRenderPass>> {
        Ok(Arc::new(RenderPass::create(Arc::clone(&self.ctx), desc)?))
    }

    fn create_framebuffer(&self, desc: &FramebufferDesc) -> Result<Arc<dyn EngineFramebuffer>> {
        Ok(Arc::new(Framebuffer::create(Arc::clone(&self.ctx), desc)?))
    }

    fn create_pipeline(&self, desc: &PipelineDesc, render_pass: &Arc<dyn EngineRenderPass>) -> Result<Arc<dyn EnginePipeline>> {
        Ok(Arc::new(Pipeline::create(Arc::clone(&self.ctx), desc, render_pass)?))
    }

    fn create_binding_group(
        &self,
        pipeline: &Arc<dyn EnginePipeline>,
        set_index: u32,
        resources: &[BindingResource],
    ) -> Result<Arc<dyn EngineBindingGroup>> {
        let group = self.descriptors.create_binding_group(
            &self.ctx,
            vk_pipeline(pipeline.as_ref()),
            set_index,
            resources,
        )?;
        Ok(Arc::new(group))
    }

    fn create_command_list(&self) -> Result<Box<dyn EngineCommandList>> {
        Ok(Box::new(CommandList::new(Arc::clone(&self.ctx), self.graphics_queue.family_index())?))
    }

    fn create_fence(&self, signaled: bool) -> Result<Box<dyn EngineFence>> {
        Ok(Box::new(Fence::new(Arc::clone(&self.ctx), signaled)?))
    }

    fn create_semaphore(&self) -> Result<Box<dyn EngineSemaphore>> {
        Ok(Box::new(Semaphore::new(Arc::clone(&self.ctx))?))
    }

    fn wait_idle(&self) -> Result<()> {
        unsafe { self.ctx.device.device_wait_idle() }
            .map_err(|e| engine_err!("frame_engine::vulkan", "Failed to wait for device idle: {:?}", e))
    }
}

impl Drop for VulkanGraphicsDevice {
    fn drop(&mut self) {
        unsafe { self.ctx.device.device_wait_idle().ok() };
        // Binding groups hold no context: their sets die with the pools
        self.descriptors.destroy(&self.ctx);
    }
}
