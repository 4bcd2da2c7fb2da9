/// Framebuffer - Vulkan implementation of the engine Framebuffer trait

use ash::vk;
use frame_engine::graphics_device::{
    Framebuffer as EngineFramebuffer, FramebufferDesc, RenderPass as EngineRenderPass,
    Texture as EngineTexture,
};
use frame_engine::{engine_err, Error, Result};
use std::sync::Arc;

use crate::vulkan_context::GpuContext;
use crate::vulkan_render_pass::vk_render_pass;
use crate::vulkan_texture::vk_texture;

/// Vulkan framebuffer
///
/// Holds its attachments so the image views outlive the framebuffer.
pub struct Framebuffer {
    ctx: Arc<GpuContext>,
    pub(crate) framebuffer: vk::Framebuffer,
    width: u32,
    height: u32,
    attachments: Vec<Arc<dyn EngineTexture>>,
}

impl Framebuffer {
    pub(crate) fn create(ctx: Arc<GpuContext>, desc: &FramebufferDesc) -> Result<Self> {
        let render_pass = vk_render_pass(desc.render_pass.as_ref());
        if desc.attachments.len() != render_pass.attachment_count() {
            return Err(Error::InvalidResource(format!(
                "framebuffer has {} attachments, render pass expects {}",
                desc.attachments.len(),
                render_pass.attachment_count()
            )));
        }

        let views: Vec<vk::ImageView> = desc.attachments.iter().map(|t| vk_texture(t.as_ref()).view).collect();
        let create_info = vk::FramebufferCreateInfo::default()
            .render_pass(render_pass.render_pass)
            .attachments(&views)
            .width(desc.width)
            .height(desc.height)
            .layers(1);

        let framebuffer = unsafe { ctx.device.create_framebuffer(&create_info, None) }
            .map_err(|e| engine_err!("frame_engine::vulkan", "Failed to create framebuffer: {:?}", e))?;

        Ok(Self {
            ctx,
            framebuffer,
            width: desc.width,
            height: desc.height,
            attachments: desc.attachments.to_vec(),
        })
    }
}

impl EngineFramebuffer for Framebuffer {
    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn attachment_count(&self) -> usize {
        self.attachments.len()
    }
}

impl Drop for Framebuffer {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_framebuffer(self.framebuffer, None);
        }
    }
}

pub(crate) fn vk_framebuffer(framebuffer: &dyn EngineFramebuffer) -> vk::Framebuffer {
    unsafe { (*(framebuffer as *const dyn EngineFramebuffer as *const Framebuffer)).framebuffer }
}
