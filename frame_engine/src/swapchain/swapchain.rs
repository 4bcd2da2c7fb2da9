/// Swapchain - presentable images negotiated with the surface
///
/// Lifecycle: `Created -> Valid -> (Stale) -> Recreating -> Valid ...`
///
/// Acquire and present report through `SwapchainOutcome`, which keeps the
/// driver's "suboptimal"/"out of date" signals apart from real failures so
/// callers cannot mistake one for the other.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::graphics_device::{
    Extent2D, GraphicsDevice, PresentMode, PresentStatus, PresentationChain,
    PresentationChainDesc, Semaphore, SurfaceCapabilities, SurfaceFormat,
    Texture, TextureFormat,
};
use crate::swapchain::{choose_extent, choose_image_count, choose_present_mode, choose_surface_format};
use crate::{engine_debug, engine_error, engine_info, engine_warn};

/// Swapchain lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapchainState {
    /// Constructed, no chain yet
    Created,
    /// Chain matches the surface
    Valid,
    /// Chain no longer matches the surface (or the surface has zero size)
    Stale,
    /// Recreation in progress
    Recreating,
}

/// Result of an acquire or present call
#[must_use]
#[derive(Debug)]
pub enum SwapchainOutcome<T> {
    /// Operation succeeded
    Ok(T),
    /// The chain must be recreated before the operation can succeed
    ShouldRecreate,
    /// Unrecoverable driver failure
    Fatal(Error),
}

impl<T> SwapchainOutcome<T> {
    pub fn is_ok(&self) -> bool {
        matches!(self, SwapchainOutcome::Ok(_))
    }

    pub fn should_recreate(&self) -> bool {
        matches!(self, SwapchainOutcome::ShouldRecreate)
    }

    /// `Ok(Some(v))`, `Ok(None)` for a recreation request, `Err` for fatal failures
    pub fn into_result(self) -> Result<Option<T>> {
        match self {
            SwapchainOutcome::Ok(value) => Ok(Some(value)),
            SwapchainOutcome::ShouldRecreate => Ok(None),
            SwapchainOutcome::Fatal(err) => Err(err),
        }
    }
}

/// Successfully acquired image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AcquiredImage {
    pub index: u32,
    /// Usable this frame, but the chain should be recreated soon
    pub suboptimal: bool,
}

/// What the last (re)creation negotiated with the surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SurfaceInfo {
    pub capabilities: SurfaceCapabilities,
    pub surface_format: SurfaceFormat,
    pub present_mode: PresentMode,
    pub image_count: u32,
    pub extent: Extent2D,
}

pub struct Swapchain {
    /// Dropped before `device`
    chain: Option<Box<dyn PresentationChain>>,
    device: Arc<dyn GraphicsDevice>,
    surface_info: Option<SurfaceInfo>,
    requested_extent: Extent2D,
    state: SwapchainState,
    current_image_index: u32,
    generation: u64,
    acquire_timeout_ns: u64,
}

impl Swapchain {
    /// Create the swapchain and its first presentation chain
    ///
    /// # Arguments
    ///
    /// * `device` - Device owning the surface
    /// * `width`, `height` - Window size, used when the surface leaves the extent to the chain
    /// * `acquire_timeout_ns` - Maximum wait in `acquire_next_image()`
    ///
    /// # Errors
    ///
    /// Surface queries or chain creation failed (fatal). A zero-sized window
    /// is not an error: the swapchain starts `Stale` with no images.
    pub fn new(device: Arc<dyn GraphicsDevice>, width: u32, height: u32, acquire_timeout_ns: u64) -> Result<Self> {
        let mut swapchain = Self {
            chain: None,
            device,
            surface_info: None,
            requested_extent: Extent2D::new(width, height),
            state: SwapchainState::Created,
            current_image_index: 0,
            generation: 0,
            acquire_timeout_ns,
        };
        swapchain.recreate()?;
        Ok(swapchain)
    }

    /// Re-negotiate with the surface and replace the presentation chain
    ///
    /// The previous chain is handed to the driver and destroyed only once
    /// the new one exists. If the surface currently has zero area the chain
    /// is left untouched and the swapchain stays `Stale`.
    pub fn recreate(&mut self) -> Result<()> {
        self.state = SwapchainState::Recreating;
        match self.try_recreate() {
            Ok(()) => Ok(()),
            Err(e) => {
                self.state = SwapchainState::Stale;
                engine_error!("frame_engine::swapchain", "Swapchain recreation failed: {}", e);
                Err(e)
            }
        }
    }

    fn try_recreate(&mut self) -> Result<()> {
        let settings = *self.device.settings();
        let capabilities = self.device.surface_capabilities()?;
        let formats = self.device.surface_formats()?;
        let present_modes = self.device.surface_present_modes()?;

        let surface_format = choose_surface_format(&formats, settings.surface_format)
            .ok_or_else(|| Error::InitializationFailed("surface reports no formats".to_string()))?;
        let present_mode = choose_present_mode(&present_modes, settings.present_mode)
            .ok_or_else(|| Error::InitializationFailed("surface reports no present modes".to_string()))?;
        let image_count = choose_image_count(&capabilities, settings.image_count);
        let extent = choose_extent(&capabilities, self.requested_extent);

        if surface_format != settings.surface_format {
            engine_warn!(
                "frame_engine::swapchain",
                "Preferred surface format {:?} unavailable, using {:?}",
                settings.surface_format, surface_format
            );
        }

        if extent.is_empty() {
            engine_debug!("frame_engine::swapchain", "Surface has zero area, deferring recreation");
            self.state = SwapchainState::Stale;
            return Ok(());
        }

        let desc = PresentationChainDesc { image_count, surface_format, present_mode, extent };
        let new_chain = self.device.create_presentation_chain(&desc, self.chain.as_deref())?;

        // Old chain goes only after its successor exists
        let old_chain = self.chain.replace(new_chain);
        drop(old_chain);

        self.surface_info = Some(SurfaceInfo { capabilities, surface_format, present_mode, image_count, extent });
        self.current_image_index = 0;
        self.generation += 1;
        self.state = SwapchainState::Valid;

        engine_info!(
            "frame_engine::swapchain",
            "Swapchain #{}: {}x{}, {} images, {:?}, {:?}",
            self.generation, extent.width, extent.height, self.image_count(),
            surface_format.format, present_mode
        );
        Ok(())
    }

    /// Acquire the next presentable image, signaling `semaphore` when it is ready
    pub fn acquire_next_image(&mut self, semaphore: &dyn Semaphore) -> SwapchainOutcome<AcquiredImage> {
        if self.state != SwapchainState::Valid {
            return SwapchainOutcome::ShouldRecreate;
        }
        let Some(chain) = self.chain.as_mut() else {
            return SwapchainOutcome::ShouldRecreate;
        };

        match chain.acquire_next_image(semaphore, self.acquire_timeout_ns) {
            Ok((index, PresentStatus::Success)) => {
                self.current_image_index = index;
                SwapchainOutcome::Ok(AcquiredImage { index, suboptimal: false })
            }
            Ok((index, PresentStatus::Suboptimal)) => {
                engine_debug!("frame_engine::swapchain", "Acquired image {} is suboptimal, recreation requested", index);
                self.current_image_index = index;
                // Usable this frame; rebuilt once the frame has been presented
                self.state = SwapchainState::Stale;
                SwapchainOutcome::Ok(AcquiredImage { index, suboptimal: true })
            }
            Ok((_, PresentStatus::OutOfDate)) => {
                engine_info!("frame_engine::swapchain", "Swapchain out of date during acquire");
                self.state = SwapchainState::Stale;
                SwapchainOutcome::ShouldRecreate
            }
            Err(e) => {
                engine_error!("frame_engine::swapchain", "Failed to acquire next image: {}", e);
                SwapchainOutcome::Fatal(e)
            }
        }
    }

    /// Present `image_index` once every semaphore in `wait_semaphores` is signaled
    pub fn present(&mut self, image_index: u32, wait_semaphores: &[&dyn Semaphore]) -> SwapchainOutcome<()> {
        let Some(chain) = self.chain.as_mut() else {
            return SwapchainOutcome::Fatal(Error::InvalidState("present without a presentation chain".to_string()));
        };

        match chain.present(image_index, wait_semaphores) {
            Ok(PresentStatus::Success) => SwapchainOutcome::Ok(()),
            Ok(PresentStatus::Suboptimal) => {
                engine_warn!("frame_engine::swapchain", "Present returned suboptimal, recreation requested");
                self.state = SwapchainState::Stale;
                SwapchainOutcome::ShouldRecreate
            }
            Ok(PresentStatus::OutOfDate) => {
                engine_info!("frame_engine::swapchain", "Swapchain out of date during present");
                self.state = SwapchainState::Stale;
                SwapchainOutcome::ShouldRecreate
            }
            Err(e) => {
                engine_error!("frame_engine::swapchain", "Failed to present image {}: {}", image_index, e);
                SwapchainOutcome::Fatal(e)
            }
        }
    }

    /// Resize notification from the window layer; takes effect on the next recreation
    pub fn set_requested_extent(&mut self, width: u32, height: u32) {
        self.requested_extent = Extent2D::new(width, height);
        if self.state != SwapchainState::Created {
            self.state = SwapchainState::Stale;
        }
    }

    /// Presentable images of the current chain (empty while minimized at startup)
    pub fn images(&self) -> &[Arc<dyn Texture>] {
        match &self.chain {
            Some(chain) => chain.images(),
            None => &[],
        }
    }

    pub fn image_count(&self) -> usize {
        self.images().len()
    }

    /// Extent of the current chain, or the requested extent before the first chain
    pub fn extent(&self) -> Extent2D {
        self.surface_info.map(|info| info.extent).unwrap_or(self.requested_extent)
    }

    /// Surface format of the current chain, or the device preference before the first chain
    pub fn surface_format(&self) -> SurfaceFormat {
        self.surface_info
            .map(|info| info.surface_format)
            .unwrap_or(self.device.settings().surface_format)
    }

    pub fn format(&self) -> TextureFormat {
        self.surface_format().format
    }

    pub fn surface_info(&self) -> Option<&SurfaceInfo> {
        self.surface_info.as_ref()
    }

    pub fn state(&self) -> SwapchainState {
        self.state
    }

    pub fn is_stale(&self) -> bool {
        self.state == SwapchainState::Stale
    }

    /// Index returned by the last successful acquire
    pub fn current_image_index(&self) -> u32 {
        self.current_image_index
    }

    /// Number of chains created so far; changes whenever the images change
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn device(&self) -> &Arc<dyn GraphicsDevice> {
        &self.device
    }
}

#[cfg(test)]
#[path = "swapchain_tests.rs"]
mod tests;
