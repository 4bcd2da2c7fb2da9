/// RenderPass - Vulkan render pass built from the compiled engine tables

use ash::vk;
use frame_engine::graphics_device::{
    AttachmentReference, RenderPass as EngineRenderPass, RenderPassDesc, SUBPASS_EXTERNAL,
};
use frame_engine::{engine_err, Result};
use std::sync::Arc;

use crate::vulkan_context::GpuContext;
use crate::vulkan_format::{
    access_flags_to_vk, image_layout_to_vk, load_op_to_vk, pipeline_stages_to_vk,
    sample_count_to_vk, store_op_to_vk, texture_format_to_vk,
};

/// Vulkan render pass
pub struct RenderPass {
    ctx: Arc<GpuContext>,
    pub(crate) render_pass: vk::RenderPass,
    attachment_count: usize,
    /// Color attachment count per subpass (pipelines need one blend state each)
    pub(crate) subpass_color_counts: Vec<usize>,
}

fn reference_to_vk(reference: &AttachmentReference) -> vk::AttachmentReference {
    vk::AttachmentReference {
        attachment: reference.attachment,
        layout: image_layout_to_vk(reference.layout),
    }
}

fn subpass_index_to_vk(index: u32) -> u32 {
    if index == SUBPASS_EXTERNAL { vk::SUBPASS_EXTERNAL } else { index }
}

/// Dependency ordering the first subpass after whatever used the
/// attachments before this pass (the previous frame, the presentation engine)
fn external_dependency(desc: &RenderPassDesc) -> vk::SubpassDependency {
    let has_depth = desc.subpasses.first().is_some_and(|s| s.depth_stencil_attachment.is_some());
    let (stages, access) = if has_depth {
        (
            vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT | vk::PipelineStageFlags::EARLY_FRAGMENT_TESTS,
            vk::AccessFlags::COLOR_ATTACHMENT_WRITE | vk::AccessFlags::DEPTH_STENCIL_ATTACHMENT_WRITE,
        )
    } else {
        (vk::PipelineStageFlags::COLOR_ATTACHMENT_OUTPUT, vk::AccessFlags::COLOR_ATTACHMENT_WRITE)
    };
    vk::SubpassDependency::default()
        .src_subpass(vk::SUBPASS_EXTERNAL)
        .dst_subpass(0)
        .src_stage_mask(stages)
        .src_access_mask(vk::AccessFlags::empty())
        .dst_stage_mask(stages)
        .dst_access_mask(access)
}

impl RenderPass {
    pub(crate) fn create(ctx: Arc<GpuContext>, desc: &RenderPassDesc) -> Result<Self> {
        let attachments: Vec<vk::AttachmentDescription> = desc
            .attachments
            .iter()
            .map(|a| {
                vk::AttachmentDescription::default()
                    .format(texture_format_to_vk(a.format))
                    .samples(sample_count_to_vk(a.samples))
                    .load_op(load_op_to_vk(a.load_op))
                    .store_op(store_op_to_vk(a.store_op))
                    .stencil_load_op(load_op_to_vk(a.stencil_load_op))
                    .stencil_store_op(store_op_to_vk(a.stencil_store_op))
                    .initial_layout(image_layout_to_vk(a.initial_layout))
                    .final_layout(image_layout_to_vk(a.final_layout))
            })
            .collect();

        // Reference arrays must outlive the subpass descriptions that point into them
        let inputs: Vec<Vec<vk::AttachmentReference>> = desc.subpasses.iter()
            .map(|s| s.input_attachments.iter().map(reference_to_vk).collect())
            .collect();
        let colors: Vec<Vec<vk::AttachmentReference>> = desc.subpasses.iter()
            .map(|s| s.color_attachments.iter().map(reference_to_vk).collect())
            .collect();
        let resolves: Vec<Vec<vk::AttachmentReference>> = desc.subpasses.iter()
            .map(|s| s.resolve_attachments.iter().map(reference_to_vk).collect())
            .collect();
        let depths: Vec<Option<vk::AttachmentReference>> = desc.subpasses.iter()
            .map(|s| s.depth_stencil_attachment.as_ref().map(reference_to_vk))
            .collect();

        let subpasses: Vec<vk::SubpassDescription> = (0..desc.subpasses.len())
            .map(|i| {
                let mut subpass = vk::SubpassDescription::default()
                    .pipeline_bind_point(vk::PipelineBindPoint::GRAPHICS)
                    .input_attachments(&inputs[i])
                    .color_attachments(&colors[i]);
                if !resolves[i].is_empty() {
                    subpass = subpass.resolve_attachments(&resolves[i]);
                }
                if let Some(depth) = &depths[i] {
                    subpass = subpass.depth_stencil_attachment(depth);
                }
                subpass
            })
            .collect();

        let mut dependencies: Vec<vk::SubpassDependency> = desc
            .dependencies
            .iter()
            .map(|d| {
                vk::SubpassDependency::default()
                    .src_subpass(subpass_index_to_vk(d.src_subpass))
                    .dst_subpass(subpass_index_to_vk(d.dst_subpass))
                    .src_stage_mask(pipeline_stages_to_vk(d.src_stages))
                    .dst_stage_mask(pipeline_stages_to_vk(d.dst_stages))
                    .src_access_mask(access_flags_to_vk(d.src_access))
                    .dst_access_mask(access_flags_to_vk(d.dst_access))
                    .dependency_flags(if d.by_region {
                        vk::DependencyFlags::BY_REGION
                    } else {
                        vk::DependencyFlags::empty()
                    })
            })
            .collect();
        if !desc.subpasses.is_empty()
            && !desc.dependencies.iter().any(|d| d.src_subpass == SUBPASS_EXTERNAL && d.dst_subpass == 0)
        {
            dependencies.push(external_dependency(desc));
        }

        let create_info = vk::RenderPassCreateInfo::default()
            .attachments(&attachments)
            .subpasses(&subpasses)
            .dependencies(&dependencies);

        let render_pass = unsafe { ctx.device.create_render_pass(&create_info, None) }
            .map_err(|e| engine_err!("frame_engine::vulkan", "Failed to create render pass: {:?}", e))?;

        Ok(Self {
            ctx,
            render_pass,
            attachment_count: desc.attachments.len(),
            subpass_color_counts: desc.subpasses.iter().map(|s| s.color_attachments.len()).collect(),
        })
    }
}

impl EngineRenderPass for RenderPass {
    fn attachment_count(&self) -> usize {
        self.attachment_count
    }
}

impl Drop for RenderPass {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_render_pass(self.render_pass, None);
        }
    }
}

pub(crate) fn vk_render_pass(render_pass: &dyn EngineRenderPass) -> &RenderPass {
    unsafe { &*(render_pass as *const dyn EngineRenderPass as *const RenderPass) }
}
