/// RenderPass - compiled attachment/subpass layout plus its backend object
///
/// Built once at pipeline setup and immutable afterwards. Render targets
/// allocate their attachments from `attachments()`; the backend handle is
/// released when the last `Arc<RenderPass>` is dropped.

use std::sync::Arc;

use crate::error::Result;
use crate::graphics_device::{
    self, AttachmentDescription, GraphicsDevice, ImageLayout, RenderPassDesc,
    SampleCount, SubpassDependency, SubpassDescription,
};
use crate::render_pass::{
    compile_render_pass, AttachmentDescriptor, AttachmentKind, CompileOptions,
    CompiledRenderPass, SubpassDescriptor,
};

pub struct RenderPass {
    handle: Arc<dyn graphics_device::RenderPass>,
    compiled: CompiledRenderPass,
    options: CompileOptions,
}

impl RenderPass {
    /// Compile the descriptors and create the backend render pass
    ///
    /// # Panics
    ///
    /// If a subpass references a missing attachment (see `compile_render_pass`).
    ///
    /// # Errors
    ///
    /// Backend creation failures, which are fatal for the graphics context.
    pub fn new(
        device: &dyn GraphicsDevice,
        attachments: &[AttachmentDescriptor],
        subpasses: &[SubpassDescriptor],
        options: CompileOptions,
    ) -> Result<Self> {
        let compiled = compile_render_pass(attachments, subpasses, &options);
        let handle = device.create_render_pass(&compiled.desc).map_err(|e| {
            crate::engine_error!("frame_engine::render_pass", "Render pass creation failed: {}", e);
            e
        })?;

        crate::engine_debug!(
            "frame_engine::render_pass",
            "Render pass created: {} attachments ({} resolve), {} subpasses",
            compiled.desc.attachments.len(),
            compiled.kinds.iter().filter(|k| matches!(k, AttachmentKind::Resolve { .. })).count(),
            compiled.desc.subpasses.len()
        );

        Ok(Self { handle, compiled, options })
    }

    /// Backend render pass object
    pub fn handle(&self) -> &Arc<dyn graphics_device::RenderPass> {
        &self.handle
    }

    pub fn desc(&self) -> &RenderPassDesc {
        &self.compiled.desc
    }

    /// Compiled attachment list, synthesized resolves included
    pub fn attachments(&self) -> &[AttachmentDescription] {
        &self.compiled.desc.attachments
    }

    pub fn attachment_count(&self) -> usize {
        self.compiled.desc.attachments.len()
    }

    pub fn attachment_kind(&self, index: usize) -> AttachmentKind {
        self.compiled.kinds[index]
    }

    pub fn subpasses(&self) -> &[SubpassDescription] {
        &self.compiled.desc.subpasses
    }

    pub fn dependencies(&self) -> &[SubpassDependency] {
        &self.compiled.desc.dependencies
    }

    /// Sample count of `subpass`, or `S1` if it does not exist
    pub fn subpass_samples(&self, subpass: usize) -> SampleCount {
        self.compiled.subpass_samples.get(subpass).copied().unwrap_or(SampleCount::S1)
    }

    /// Whether attachment `index` is handed to the presentation engine after the pass
    pub fn is_presentable(&self, index: usize) -> bool {
        let attachment = &self.compiled.desc.attachments[index];
        attachment.final_layout == ImageLayout::PresentSrc && attachment.samples == SampleCount::S1
    }

    pub fn options(&self) -> &CompileOptions {
        &self.options
    }
}

#[cfg(test)]
#[path = "render_pass_tests.rs"]
mod tests;
