/// Presentation chain trait and surface query types
///
/// A presentation chain is the backend object behind `crate::swapchain::Swapchain`:
/// the set of presentable images negotiated with the surface. The engine
/// owns the selection logic and lifecycle; the chain only wraps the driver.

use std::sync::Arc;
use crate::error::Result;
use crate::graphics_device::{Semaphore, Texture, TextureFormat};

/// Width and height in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Extent2D {
    pub width: u32,
    pub height: u32,
}

impl Extent2D {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// True when either side is zero (minimized window)
    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Color space of presentable images
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ColorSpace {
    SrgbNonLinear,
    ExtendedSrgbLinear,
    Hdr10St2084,
}

/// Format + color space pair offered by a surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SurfaceFormat {
    pub format: TextureFormat,
    pub color_space: ColorSpace,
}

/// Presentation mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PresentMode {
    /// No vsync, may tear
    Immediate,
    /// Triple-buffered vsync, replaces queued image
    Mailbox,
    /// Vsync queue (always supported)
    Fifo,
    /// Vsync, tears when late
    FifoRelaxed,
}

/// Surface capabilities relevant to chain creation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SurfaceCapabilities {
    pub min_image_count: u32,
    /// 0 means "no upper bound"
    pub max_image_count: u32,
    /// None when the surface size is decided by the chain extent
    pub current_extent: Option<Extent2D>,
    pub min_extent: Extent2D,
    pub max_extent: Extent2D,
}

/// Parameters for `GraphicsDevice::create_presentation_chain()`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresentationChainDesc {
    pub image_count: u32,
    pub surface_format: SurfaceFormat,
    pub present_mode: PresentMode,
    pub extent: Extent2D,
}

/// Driver status attached to acquire and present results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresentStatus {
    /// Everything matches the surface
    Success,
    /// Usable, but no longer matches the surface exactly
    Suboptimal,
    /// Unusable until recreated
    OutOfDate,
}

/// Backend presentation chain
pub trait PresentationChain: Send + Sync {
    /// Presentable images, wrapped as presentation-owned textures
    fn images(&self) -> &[Arc<dyn Texture>];

    /// Surface format the chain was created with
    fn surface_format(&self) -> SurfaceFormat;

    /// Image extent the chain was created with
    fn extent(&self) -> Extent2D;

    /// Acquire the next presentable image
    ///
    /// `semaphore` is signaled when the image is ready to be rendered into.
    /// On `OutOfDate` the returned index is meaningless and the semaphore is
    /// left unsignaled.
    ///
    /// # Errors
    ///
    /// `Error::Timeout` when no image became available in `timeout_ns`;
    /// other driver failures as `BackendError`/`SurfaceLost`.
    fn acquire_next_image(&mut self, semaphore: &dyn Semaphore, timeout_ns: u64) -> Result<(u32, PresentStatus)>;

    /// Queue `image_index` for presentation once every `wait_semaphores` entry is signaled
    fn present(&mut self, image_index: u32, wait_semaphores: &[&dyn Semaphore]) -> Result<PresentStatus>;
}
