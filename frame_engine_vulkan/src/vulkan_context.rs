/// GpuContext - the Vulkan objects every backend resource depends on
///
/// Shared via `Arc` by the device and by every texture, buffer, chain and
/// command list it creates. The last owner to go away tears down the
/// allocator, the logical device, the surface and the instance, so no
/// resource can outlive the device it was created on.

use ash::vk;
use gpu_allocator::vulkan::Allocator;
use std::mem::ManuallyDrop;
use std::sync::{Mutex, MutexGuard};

pub(crate) struct GpuContext {
    /// Keeps the Vulkan library loaded
    _entry: ash::Entry,
    pub(crate) instance: ash::Instance,
    pub(crate) physical_device: vk::PhysicalDevice,
    pub(crate) device: ash::Device,

    /// Dropped before the device is destroyed
    allocator: ManuallyDrop<Mutex<Allocator>>,

    pub(crate) surface_loader: ash::khr::surface::Instance,
    pub(crate) surface: vk::SurfaceKHR,
    pub(crate) swapchain_loader: ash::khr::swapchain::Device,

    /// Validation messenger (only with the `vulkan-validation` feature)
    debug_messenger: Option<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)>,
}

impl GpuContext {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        entry: ash::Entry,
        instance: ash::Instance,
        physical_device: vk::PhysicalDevice,
        device: ash::Device,
        allocator: Allocator,
        surface_loader: ash::khr::surface::Instance,
        surface: vk::SurfaceKHR,
        debug_messenger: Option<(ash::ext::debug_utils::Instance, vk::DebugUtilsMessengerEXT)>,
    ) -> Self {
        let swapchain_loader = ash::khr::swapchain::Device::new(&instance, &device);
        Self {
            _entry: entry,
            instance,
            physical_device,
            device,
            allocator: ManuallyDrop::new(Mutex::new(allocator)),
            surface_loader,
            surface,
            swapchain_loader,
            debug_messenger,
        }
    }

    /// Lock the GPU memory allocator
    ///
    /// A panic while holding the lock does not corrupt the allocator's
    /// bookkeeping, so a poisoned lock is recovered.
    pub(crate) fn allocator(&self) -> MutexGuard<'_, Allocator> {
        self.allocator.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Drop for GpuContext {
    fn drop(&mut self) {
        unsafe {
            self.device.device_wait_idle().ok();

            // Free every memory block while the device is still alive
            ManuallyDrop::drop(&mut self.allocator);

            self.device.destroy_device(None);
            self.surface_loader.destroy_surface(self.surface, None);

            crate::debug::cleanup_debug_config();
            if let Some((debug_utils, messenger)) = self.debug_messenger.take() {
                debug_utils.destroy_debug_utils_messenger(messenger, None);
            }

            self.instance.destroy_instance(None);
        }
    }
}
