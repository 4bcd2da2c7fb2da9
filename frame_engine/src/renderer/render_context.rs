/// RenderContext - device + swapchain facade handed to collaborators
///
/// Owns the swapchain and shares the device. Subsystems with their own
/// swapchain-dependent resources (e.g. a UI overlay) register a hook that
/// runs after every successful swapchain recreation.

use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;
use crate::graphics_device::{Extent2D, GraphicsDevice, TextureFormat};
use crate::swapchain::Swapchain;
use crate::{engine_debug, engine_error};

/// Passed to swapchain-recreated hooks
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SwapchainRecreatedInfo {
    pub extent: Extent2D,
    pub format: TextureFormat,
    pub image_count: usize,
    pub generation: u64,
}

pub type SwapchainRecreatedHook = Box<dyn FnMut(&SwapchainRecreatedInfo)>;

pub struct RenderContext {
    hooks: Vec<SwapchainRecreatedHook>,
    /// Dropped before `device`
    swapchain: Swapchain,
    device: Arc<dyn GraphicsDevice>,
}

impl RenderContext {
    /// Create the context and its swapchain with the default acquire timeout
    pub fn new(device: Arc<dyn GraphicsDevice>, width: u32, height: u32) -> Result<Self> {
        Self::with_config(device, width, height, &Config::default())
    }

    pub fn with_config(device: Arc<dyn GraphicsDevice>, width: u32, height: u32, config: &Config) -> Result<Self> {
        let swapchain = Swapchain::new(device.clone(), width, height, config.acquire_timeout_ns)?;
        Ok(Self { hooks: Vec::new(), swapchain, device })
    }

    pub fn device(&self) -> &Arc<dyn GraphicsDevice> {
        &self.device
    }

    pub fn swapchain(&self) -> &Swapchain {
        &self.swapchain
    }

    pub fn swapchain_mut(&mut self) -> &mut Swapchain {
        &mut self.swapchain
    }

    /// Block until the device has finished all submitted work
    pub fn wait_idle(&self) -> Result<()> {
        self.device.wait_idle().map_err(|e| {
            engine_error!("frame_engine::renderer", "wait_idle failed: {}", e);
            e
        })
    }

    /// Register a hook run after each swapchain recreation that produced new images
    pub fn on_swapchain_recreated<F>(&mut self, hook: F)
    where
        F: FnMut(&SwapchainRecreatedInfo) + 'static,
    {
        self.hooks.push(Box::new(hook));
    }

    pub fn hook_count(&self) -> usize {
        self.hooks.len()
    }

    /// Wait for the device, recreate the swapchain and notify hooks
    ///
    /// Returns `false` when the surface has zero area and nothing was rebuilt.
    pub fn recreate_swapchain(&mut self) -> Result<bool> {
        self.wait_idle()?;
        let generation = self.swapchain.generation();
        self.swapchain.recreate()?;
        if self.swapchain.generation() == generation {
            return Ok(false);
        }

        let info = SwapchainRecreatedInfo {
            extent: self.swapchain.extent(),
            format: self.swapchain.format(),
            image_count: self.swapchain.image_count(),
            generation: self.swapchain.generation(),
        };
        engine_debug!(
            "frame_engine::renderer",
            "Notifying {} swapchain hook(s) of generation {}",
            self.hooks.len(), info.generation
        );
        for hook in self.hooks.iter_mut() {
            hook(&info);
        }
        Ok(true)
    }
}

#[cfg(test)]
#[path = "render_context_tests.rs"]
mod tests;
