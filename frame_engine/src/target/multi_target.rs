/// MultiTarget - several owned frames for a double/triple-buffered offscreen output
///
/// The target rotates its own active frame on every `end_render_target()`.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::graphics_device::{ClearValue, CommandList, Extent2D, Texture};
use crate::render_pass::RenderPass;
use crate::target::{RenderResource, RenderTarget, RenderTargetKind, TargetContext, TargetCore};

pub struct MultiTarget {
    core: TargetCore,
    frame_count: usize,
    active: usize,
}

impl MultiTarget {
    pub fn new(render_pass: Arc<RenderPass>, width: u32, height: u32, frame_count: usize) -> Self {
        Self {
            core: TargetCore::new(render_pass, Extent2D::new(width, height)),
            frame_count,
            active: 0,
        }
    }

    /// Request a different number of frames; the rebuild is deferred
    pub fn set_frame_count(&mut self, frame_count: usize) {
        self.frame_count = frame_count;
        self.core.dirty = true;
    }

    /// Frame the next `begin_render_target()` draws into
    pub fn active_index(&self) -> usize {
        self.active
    }

    /// Sampleable color output of `frame`
    pub fn output_texture(&mut self, ctx: &TargetContext, frame: usize) -> Result<Arc<dyn Texture>> {
        self.ensure_built(ctx)?;
        self.core.output_texture(frame)
    }

    fn ensure_built(&mut self, ctx: &TargetContext) -> Result<()> {
        if self.core.dirty {
            self.recreate(ctx)?;
        }
        Ok(())
    }
}

impl RenderTarget for MultiTarget {
    fn kind(&self) -> RenderTargetKind {
        RenderTargetKind::MultiBuffered
    }

    fn render_pass(&self) -> &Arc<RenderPass> {
        &self.core.render_pass
    }

    fn extent(&self) -> Extent2D {
        self.core.extent
    }

    fn frame_count(&self) -> usize {
        self.frame_count
    }

    fn is_dirty(&self) -> bool {
        self.core.dirty
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.core.resize(width, height);
    }

    fn recreate(&mut self, ctx: &TargetContext) -> Result<()> {
        if self.frame_count == 0 {
            return Err(Error::InvalidResource("multi target needs at least one frame".to_string()));
        }
        if self.core.in_pass {
            return Err(Error::InvalidState("cannot rebuild a multi target inside its pass".to_string()));
        }

        self.core.resources.clear();
        let mut resources = Vec::with_capacity(self.frame_count);
        for _ in 0..self.frame_count {
            resources.push(self.core.build_resource(ctx.device, true, |_| Ok(None))?);
        }
        self.core.replace_resources(resources, "Multi");
        self.active %= self.frame_count;
        Ok(())
    }

    fn begin_render_target(&mut self, ctx: &TargetContext, command_list: &mut dyn CommandList) -> Result<()> {
        self.ensure_built(ctx)?;
        self.core.begin(self.active, command_list)
    }

    fn end_render_target(&mut self, command_list: &mut dyn CommandList) -> Result<()> {
        self.core.end(command_list)?;
        self.active = (self.active + 1) % self.core.resources.len().max(1);
        Ok(())
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
#[path = "multi_target_tests.rs"]
mod tests;
