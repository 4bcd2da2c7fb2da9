/// OffscreenTarget - a single owned frame for render-to-texture
///
/// Every attachment is allocated by the target. Single-sample color
/// attachments are created sampleable so the result can be shown
/// elsewhere, e.g. in an editor viewport.

use std::sync::Arc;

use crate::error::{Error, Result};
use crate::graphics_device::{ClearValue, CommandList, Extent2D, Texture};
use crate::render_pass::RenderPass;
use crate::target::{RenderResource, RenderTarget, RenderTargetKind, TargetContext, TargetCore};

pub struct OffscreenTarget {
    core: TargetCore,
}

impl OffscreenTarget {
    pub fn new(render_pass: Arc<RenderPass>, width: u32, height: u32) -> Self {
        Self { core: TargetCore::new(render_pass, Extent2D::new(width, height)) }
    }

    /// Sampleable color output; `frame` must be 0
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

impl RenderTarget for OffscreenTarget {
    fn kind(&self) -> RenderTargetKind {
        RenderTargetKind::Offscreen
    }

    fn render_pass(&self) -> &Arc<RenderPass> {
        &self.core.render_pass
    }

    fn extent(&self) -> Extent2D {
        self.core.extent
    }

    fn frame_count(&self) -> usize {
        1
    }

    fn is_dirty(&self) -> bool {
        self.core.dirty
    }

    fn resize(&mut self, width: u32, height: u32) {
        self.core.resize(width, height);
    }

    fn recreate(&mut self, ctx: &TargetContext) -> Result<()> {
        if self.core.in_pass {
            return Err(Error::InvalidState("cannot rebuild an offscreen target inside its pass".to_string()));
        }
        self.core.resources.clear();
        let resource = self.core.build_resource(ctx.device, true, |_| Ok(None))?;
        self.core.replace_resources(vec![resource], "Offscreen");
        Ok(())
    }

    fn begin_render_target(&mut self, ctx: &TargetContext, command_list: &mut dyn CommandList) -> Result<()> {
        self.ensure_built(ctx)?;
        self.core.begin(0, command_list)
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
#[path = "offscreen_target_tests.rs"]
mod tests;
