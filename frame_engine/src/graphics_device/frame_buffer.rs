/// Framebuffer trait - binds concrete texture views to a render pass's attachment slots
///
/// Created by render targets once per frame slot and rebuilt only when the
/// attachments change (resize, swapchain recreation).

use std::sync::Arc;
use crate::graphics_device::{RenderPass, Texture};

/// Framebuffer created via `GraphicsDevice::create_framebuffer()`
pub trait Framebuffer: Send + Sync {
    /// Get the width in pixels
    fn width(&self) -> u32;

    /// Get the height in pixels
    fn height(&self) -> u32;

    /// Number of bound attachments
    fn attachment_count(&self) -> usize;
}

/// Descriptor for creating a framebuffer
pub struct FramebufferDesc<'a> {
    /// The render pass this framebuffer is compatible with
    pub render_pass: &'a Arc<dyn RenderPass>,
    /// One texture per render pass attachment, in attachment order
    pub attachments: &'a [Arc<dyn Texture>],
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}
