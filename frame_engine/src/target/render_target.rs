/// RenderTarget - where a render pass draws to
///
/// A target owns one `RenderResource` per frame slot, each matching the
/// attachment list of the target's `RenderPass`. `resize()` and similar
/// mutations only mark the target dirty; the rebuild happens at the next
/// entry point that reads a bundle (`begin_render_target()`, `resource()`,
/// `output_texture()`).
///
/// The device and swapchain are not stored. They are passed per call in a
/// `TargetContext`, and must outlive every bundle built from them.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::graphics_device::{
    ClearValue, CommandList, Extent2D, Framebuffer, FramebufferDesc,
    GraphicsDevice, LoadOp, SampleCount, Texture, TextureDesc, TextureUsage,
};
use crate::render_pass::RenderPass;
use crate::swapchain::Swapchain;
use crate::{engine_debug, engine_error};

/// Capability tag of a render target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderTargetKind {
    /// Presentable images come from the swapchain
    SwapchainBound,
    /// Single owned frame (render-to-texture)
    Offscreen,
    /// Several owned frames rotated by the target
    MultiBuffered,
}

/// Per-call access to what a target is built from
#[derive(Clone, Copy)]
pub struct TargetContext<'a> {
    pub device: &'a dyn GraphicsDevice,
    /// Required by swapchain-bound targets only
    pub swapchain: Option<&'a Swapchain>,
}

impl<'a> TargetContext<'a> {
    pub fn new(device: &'a dyn GraphicsDevice) -> Self {
        Self { device, swapchain: None }
    }

    pub fn with_swapchain(device: &'a dyn GraphicsDevice, swapchain: &'a Swapchain) -> Self {
        Self { device, swapchain: Some(swapchain) }
    }
}

/// Attachments and framebuffer of one frame slot
pub struct RenderResource {
    /// One texture per render pass attachment, in attachment order
    pub attachments: Vec<Arc<dyn Texture>>,
    pub framebuffer: Arc<dyn Framebuffer>,
}

impl RenderResource {
    /// Color attachments (multisampled and resolve targets included)
    pub fn color_images(&self) -> impl Iterator<Item = &Arc<dyn Texture>> {
        self.attachments.iter().filter(|t| !t.info().format.is_depth())
    }

    pub fn depth_image(&self) -> Option<&Arc<dyn Texture>> {
        self.attachments.iter().find(|t| t.info().format.is_depth())
    }

    /// Attachments allocated by the target rather than the presentation engine
    pub fn owned_count(&self) -> usize {
        self.attachments.iter().filter(|t| !t.info().presentation_owned).count()
    }
}

/// Common render target interface
pub trait RenderTarget {
    fn kind(&self) -> RenderTargetKind;

    fn render_pass(&self) -> &Arc<RenderPass>;

    /// Size the bundles are (or will be) built at
    fn extent(&self) -> Extent2D;

    /// Number of frame slots
    fn frame_count(&self) -> usize;

    /// True when the next entry point will rebuild the bundles
    fn is_dirty(&self) -> bool;

    /// Request a new size; the rebuild is deferred
    fn resize(&mut self, width: u32, height: u32);

    /// Rebuild every bundle now
    fn recreate(&mut self, ctx: &TargetContext) -> Result<()>;

    /// Begin the render pass on the active frame's framebuffer
    fn begin_render_target(&mut self, ctx: &TargetContext, command_list: &mut dyn CommandList) -> Result<()>;

    /// End the render pass opened by `begin_render_target()`
    fn end_render_target(&mut self, command_list: &mut dyn CommandList) -> Result<()>;

    /// Set the clear value of attachment `index`, or of every clearable attachment
    ///
    /// # Errors
    ///
    /// `InvalidResource` if the index is out of range, or if a color value
    /// targets a depth attachment (or the reverse). State is left untouched.
    fn set_clear_value(&mut self, index: Option<usize>, value: ClearValue) -> Result<()>;

    /// One clear value per attachment, as passed to the render pass begin
    fn clear_values(&self) -> &[ClearValue];

    /// Bundle of frame slot `frame`, rebuilt first if the target is dirty
    fn resource(&mut self, ctx: &TargetContext, frame: usize) -> Result<&RenderResource>;
}

/// State shared by the three target variants
pub struct TargetCore {
    pub(crate) render_pass: Arc<RenderPass>,
    pub(crate) extent: Extent2D,
    pub(crate) dirty: bool,
    pub(crate) resources: Vec<RenderResource>,
    pub(crate) clear_values: Vec<ClearValue>,
    pub(crate) in_pass: bool,
}

impl TargetCore {
    pub(crate) fn new(render_pass: Arc<RenderPass>, extent: Extent2D) -> Self {
        let clear_values = default_clear_values(&render_pass);
        Self {
            render_pass,
            extent,
            dirty: true,
            resources: Vec::new(),
            clear_values,
            in_pass: false,
        }
    }

    pub(crate) fn resize(&mut self, width: u32, height: u32) {
        self.extent = Extent2D::new(width, height);
        self.dirty = true;
    }

    pub(crate) fn set_clear_value(&mut self, index: Option<usize>, value: ClearValue) -> Result<()> {
        let attachments = self.render_pass.attachments();
        match index {
            Some(i) => {
                let Some(attachment) = attachments.get(i) else {
                    return Err(Error::InvalidResource(format!(
                        "clear value index {} out of range ({} attachments)",
                        i, attachments.len()
                    )));
                };
                if attachment.format.is_depth() == value.is_color() {
                    return Err(Error::InvalidResource(format!(
                        "clear value {:?} does not match attachment {} format {:?}",
                        value, i, attachment.format
                    )));
                }
                self.clear_values[i] = value;
            }
            None => {
                for (i, attachment) in attachments.iter().enumerate() {
                    let clearable = attachment.load_op == LoadOp::Clear || attachment.stencil_load_op == LoadOp::Clear;
                    if clearable && attachment.format.is_depth() != value.is_color() {
                        self.clear_values[i] = value;
                    }
                }
            }
        }
        Ok(())
    }

    /// Build one bundle; `attachment_for` returns a wrapped texture or `None` to allocate
    pub(crate) fn build_resource<F>(
        &self,
        device: &dyn GraphicsDevice,
        sampled_outputs: bool,
        mut attachment_for: F,
    ) -> Result<RenderResource>
    where
        F: FnMut(usize) -> Result<Option<Arc<dyn Texture>>>,
    {
        if self.extent.is_empty() {
            return Err(Error::InvalidResource(format!(
                "cannot build a {}x{} render target",
                self.extent.width, self.extent.height
            )));
        }

        let mut attachments = Vec::with_capacity(self.render_pass.attachment_count());
        for (i, description) in self.render_pass.attachments().iter().enumerate() {
            if let Some(texture) = attachment_for(i)? {
                attachments.push(texture);
                continue;
            }

            let mut usage = description.usage;
            if sampled_outputs && !description.format.is_depth() && description.samples == SampleCount::S1 {
                usage |= TextureUsage::SAMPLED;
            }
            attachments.push(device.create_texture(&TextureDesc {
                width: self.extent.width,
                height: self.extent.height,
                format: description.format,
                samples: description.samples,
                usage,
            })?);
        }

        let framebuffer = device.create_framebuffer(&FramebufferDesc {
            render_pass: self.render_pass.handle(),
            attachments: &attachments,
            width: self.extent.width,
            height: self.extent.height,
        })?;

        Ok(RenderResource { attachments, framebuffer })
    }

    /// Swap in freshly built bundles; the old ones are released afterwards
    pub(crate) fn replace_resources(&mut self, resources: Vec<RenderResource>, label: &str) {
        self.resources = resources;
        self.dirty = false;
        engine_debug!(
            "frame_engine::target",
            "{} target rebuilt: {} frame(s) at {}x{}",
            label, self.resources.len(), self.extent.width, self.extent.height
        );
    }

    pub(crate) fn begin(&mut self, frame: usize, command_list: &mut dyn CommandList) -> Result<()> {
        if self.in_pass {
            return Err(Error::InvalidState("render target already begun".to_string()));
        }
        let Some(resource) = self.resources.get(frame) else {
            engine_error!(
                "frame_engine::target",
                "No bundle for frame {} ({} built)",
                frame, self.resources.len()
            );
            return Err(Error::InvalidState(format!("no render target bundle for frame {}", frame)));
        };
        command_list.begin_render_pass(self.render_pass.handle(), &resource.framebuffer, &self.clear_values)?;
        self.in_pass = true;
        Ok(())
    }

    pub(crate) fn end(&mut self, command_list: &mut dyn CommandList) -> Result<()> {
        if !self.in_pass {
            return Err(Error::InvalidState("render target was not begun".to_string()));
        }
        self.in_pass = false;
        command_list.end_render_pass()
    }

    pub(crate) fn resource(&self, frame: usize) -> Result<&RenderResource> {
        self.resources.get(frame).ok_or_else(|| {
            Error::InvalidResource(format!("frame {} out of range ({} frames)", frame, self.resources.len()))
        })
    }

    /// Last single-sample color attachment of `frame`
    pub(crate) fn output_texture(&self, frame: usize) -> Result<Arc<dyn Texture>> {
        self.resource(frame)?
            .attachments
            .iter()
            .rev()
            .find(|t| !t.info().format.is_depth() && t.info().samples == SampleCount::S1)
            .cloned()
            .ok_or_else(|| Error::InvalidResource("render target has no single-sample color output".to_string()))
    }
}

/// Color `[0, 0, 0, 1]` for color attachments, depth 1.0 / stencil 0 for depth attachments
pub fn default_clear_values(render_pass: &RenderPass) -> Vec<ClearValue> {
    render_pass.attachments().iter()
        .map(|a| if a.format.is_depth() { ClearValue::DEFAULT_DEPTH } else { ClearValue::DEFAULT_COLOR })
        .collect()
}

#[cfg(test)]
#[path = "render_target_tests.rs"]
mod tests;
