/// GraphicsDevice trait - the backend factory every engine component is built on
///
/// A device owns the logical GPU device, its queues and the surface it
/// presents to. It is shared as `Arc<dyn GraphicsDevice>` and passed
/// explicitly to each component; there is no global device lookup.

use std::sync::Arc;

use crate::error::Result;
use crate::graphics_device::{
    BindingGroup, BindingResource, Buffer, BufferDesc, CommandList, Fence,
    Framebuffer, FramebufferDesc, Pipeline, PipelineDesc, PresentMode,
    PresentationChain, PresentationChainDesc, Queue, RenderPass,
    RenderPassDesc, Semaphore, Shader, ShaderDesc, SurfaceCapabilities,
    SurfaceFormat, Texture, TextureDesc, TextureFormat,
};

/// Device-wide presentation and attachment preferences
///
/// Projected from `Config::device_settings()`; read by the swapchain on
/// every recreation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeviceSettings {
    /// Preferred surface format and color space
    pub surface_format: SurfaceFormat,
    /// Depth attachment format
    pub depth_format: TextureFormat,
    /// Preferred present mode
    pub present_mode: PresentMode,
    /// Desired number of presentable images
    pub image_count: u32,
}

/// Backend device trait
pub trait GraphicsDevice: Send + Sync {
    /// Device-wide settings
    fn settings(&self) -> &DeviceSettings;

    /// Queue used for command submission
    fn graphics_queue(&self) -> Arc<dyn Queue>;

    /// Queue used for presentation (may be the graphics queue)
    fn present_queue(&self) -> Arc<dyn Queue>;

    /// Current surface capabilities
    fn surface_capabilities(&self) -> Result<SurfaceCapabilities>;

    /// Surface formats supported for presentation
    fn surface_formats(&self) -> Result<Vec<SurfaceFormat>>;

    /// Present modes supported by the surface
    fn surface_present_modes(&self) -> Result<Vec<PresentMode>>;

    /// Create a presentation chain
    ///
    /// # Arguments
    ///
    /// * `desc` - Selected image count, format, present mode and extent
    /// * `old_chain` - Previous chain, handed to the driver for a seamless
    ///   transition. It is retired but not destroyed; the caller drops it
    ///   once this call has returned.
    fn create_presentation_chain(
        &self,
        desc: &PresentationChainDesc,
        old_chain: Option<&dyn PresentationChain>,
    ) -> Result<Box<dyn PresentationChain>>;

    /// Create an owned texture (attachment or sampled image)
    fn create_texture(&self, desc: &TextureDesc) -> Result<Arc<dyn Texture>>;

    /// Create a host-visible buffer
    fn create_buffer(&self, desc: &BufferDesc) -> Result<Arc<dyn Buffer>>;

    /// Create a shader module
    fn create_shader(&self, desc: &ShaderDesc) -> Result<Arc<dyn Shader>>;

    /// Create a render pass from compiled tables
    fn create_render_pass(&self, desc: &RenderPassDesc) -> Result<Arc<dyn RenderPass>>;

    /// Create a framebuffer
    fn create_framebuffer(&self, desc: &FramebufferDesc) -> Result<Arc<dyn Framebuffer>>;

    /// Create a graphics pipeline for `desc.subpass` of `render_pass`
    fn create_pipeline(&self, desc: &PipelineDesc, render_pass: &Arc<dyn RenderPass>) -> Result<Arc<dyn Pipeline>>;

    /// Create a binding group for `set_index` of `pipeline`
    ///
    /// `resources[i]` is bound at the i-th binding of the set layout.
    fn create_binding_group(
        &self,
        pipeline: &Arc<dyn Pipeline>,
        set_index: u32,
        resources: &[BindingResource],
    ) -> Result<Arc<dyn BindingGroup>>;

    /// Create a primary command list
    fn create_command_list(&self) -> Result<Box<dyn CommandList>>;

    /// Create a fence, optionally already signaled
    fn create_fence(&self, signaled: bool) -> Result<Box<dyn Fence>>;

    /// Create a binary semaphore
    fn create_semaphore(&self) -> Result<Box<dyn Semaphore>>;

    /// Wait until the device has no pending work
    fn wait_idle(&self) -> Result<()>;
}
