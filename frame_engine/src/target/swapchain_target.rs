/// SwapchainTarget - one bundle per presentable image
///
/// Presentable single-sample attachments wrap the swapchain's images;
/// everything else (depth, multisampled color awaiting resolve) is
/// allocated by the target. The active bundle is always the swapchain's
/// last acquired image, never an internal counter.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::graphics_device::{ClearValue, CommandList, Extent2D};
use crate::render_pass::RenderPass;
use crate::swapchain::Swapchain;
use crate::target::{RenderResource, RenderTarget, RenderTargetKind, TargetContext, TargetCore};

pub struct SwapchainTarget {
    core: TargetCore,
    /// Swapchain generation the bundles were built against
    built_generation: u64,
    /// Image count of that generation (of the creating swapchain until built)
    image_count: usize,
}

impl SwapchainTarget {
    /// Create an unbuilt target; the first `begin_render_target()` builds it
    pub fn new(render_pass: Arc<RenderPass>, swapchain: &Swapchain) -> Self {
        Self {
            core: TargetCore::new(render_pass, swapchain.extent()),
            built_generation: 0,
            image_count: swapchain.image_count(),
        }
    }

    /// True if the bundles no longer match `swapchain`
    pub fn is_stale(&self, swapchain: &Swapchain) -> bool {
        self.core.dirty || self.built_generation != swapchain.generation()
    }

    pub fn built_generation(&self) -> u64 {
        self.built_generation
    }

    fn swapchain<'a>(ctx: &TargetContext<'a>) -> Result<&'a Swapchain> {
        ctx.swapchain.ok_or_else(|| Error::InvalidState("swapchain target used without a swapchain".to_string()))
    }

    fn ensure_built(&mut self, ctx: &TargetContext) -> Result<()> {
        let swapchain = Self::swapchain(ctx)?;
        if self.is_stale(swapchain) {
            self.recreate(ctx)?;
        }
        Ok(())
    }
}

impl RenderTarget for SwapchainTarget {
    fn kind(&self) -> RenderTargetKind {
        RenderTargetKind::SwapchainBound
    }

    fn render_pass(&self) -> &Arc<RenderPass> {
        &self.core.render_pass
    }

    fn extent(&self) -> Extent2D {
        self.core.extent
    }

    fn frame_count(&self) -> usize {
        self.image_count
    }

    fn is_dirty(&self) -> bool {
        self.core.dirty
    }

    /// The rebuilt size is always the swapchain's extent
    fn resize(&mut self, width: u32, height: u32) {
        self.core.resize(width, height);
    }

    fn recreate(&mut self, ctx: &TargetContext) -> Result<()> {
        if self.core.in_pass {
            return Err(Error::InvalidState("cannot rebuild a swapchain target inside its pass".to_string()));
        }
        let swapchain = Self::swapchain(ctx)?;
        let images = swapchain.images();
        if images.is_empty() {
            return Err(Error::InvalidState("swapchain has no images".to_string()));
        }

        let render_pass = self.core.render_pass.clone();
        for (i, attachment) in render_pass.attachments().iter().enumerate() {
            if render_pass.is_presentable(i) && attachment.format != swapchain.format() {
                return Err(Error::InvalidResource(format!(
                    "presentable attachment {} is {:?}, swapchain images are {:?}",
                    i, attachment.format, swapchain.format()
                )));
            }
        }

        self.core.extent = swapchain.extent();
        // Old bundles go before new ones are allocated
        self.core.resources.clear();

        let mut resources = Vec::with_capacity(images.len());
        for image in images {
            resources.push(self.core.build_resource(ctx.device, false, |index| {
                Ok(render_pass.is_presentable(index).then(|| image.clone()))
            })?);
        }

        self.core.replace_resources(resources, "Swapchain");
        self.built_generation = swapchain.generation();
        self.image_count = images.len();
        Ok(())
    }

    fn begin_render_target(&mut self, ctx: &TargetContext, command_list: &mut dyn CommandList) -> Result<()> {
        self.ensure_built(ctx)?;
        let frame = Self::swapchain(ctx)?.current_image_index() as usize;
        self.core.begin(frame, command_list)
    }

    fn end_render_target(&mut self, command_list: &mut dyn CommandList) -> Result<()> {
        self.core.end(command_list)
    }

    fn set_clear_value(&mut self, index: Option<usize>, value: ClearValue) -> Result<()> {
        self.core.set_clear_value(index, value)
    }

    fn clear_values(&self) -> &[ClearValue] {
        &self.core.clear_values
    }

    fn resource(&mut self, ctx: &TargetContext, frame: usize) -> Result<&RenderResource> {
        self.ensure_built(ctx)?;
        self.core.resource(frame)
    }
}

#[cfg(test)]
#[path = "swapchain_target_tests.rs"]
mod tests;
