/// Pipeline - Vulkan graphics pipeline
///
/// Viewport and scissor are dynamic state: the scene renderer sets them
/// every frame from the current swapchain extent, so a pipeline survives
/// swapchain recreation.

use ash::vk;
use frame_engine::graphics_device::{
    Pipeline as EnginePipeline, PipelineDesc, RenderPass as EngineRenderPass, Shader as EngineShader,
};
use frame_engine::{engine_err, Error, Result};
use std::sync::Arc;

use crate::vulkan_context::GpuContext;
use crate::vulkan_format::{
    binding_type_to_vk, buffer_format_to_vk, compare_op_to_vk, cull_mode_to_vk, front_face_to_vk,
    input_rate_to_vk, sample_count_to_vk, shader_stage_to_vk, shader_stages_to_vk,
    stage_flags_to_vk, topology_to_vk,
};
use crate::vulkan_render_pass::vk_render_pass;
use crate::vulkan_shader::Shader;

/// Vulkan graphics pipeline
pub struct Pipeline {
    ctx: Arc<GpuContext>,
    pub(crate) pipeline: vk::Pipeline,
    pub(crate) pipeline_layout: vk::PipelineLayout,
    pub(crate) descriptor_set_layouts: Vec<vk::DescriptorSetLayout>,
}

impl Pipeline {
    pub(crate) fn create(
        ctx: Arc<GpuContext>,
        desc: &PipelineDesc,
        render_pass: &Arc<dyn EngineRenderPass>,
    ) -> Result<Self> {
        let vk_pass = vk_render_pass(render_pass.as_ref());
        let color_count = *vk_pass.subpass_color_counts.get(desc.subpass as usize).ok_or_else(|| {
            Error::InvalidResource(format!(
                "pipeline subpass {} out of range (render pass has {} subpasses)",
                desc.subpass,
                vk_pass.subpass_color_counts.len()
            ))
        })?;

        // Every shader reaching this backend was created by it
        let vertex_shader = unsafe { &*(desc.vertex_shader.as_ref() as *const dyn EngineShader as *const Shader) };
        let fragment_shader = unsafe { &*(desc.fragment_shader.as_ref() as *const dyn EngineShader as *const Shader) };

        let shader_stages = [
            vk::PipelineShaderStageCreateInfo::default()
                .stage(shader_stage_to_vk(vertex_shader.stage))
                .module(vertex_shader.module)
                .name(&vertex_shader.entry_point),
            vk::PipelineShaderStageCreateInfo::default()
                .stage(shader_stage_to_vk(fragment_shader.stage))
                .module(fragment_shader.module)
                .name(&fragment_shader.entry_point),
        ];

        let vertex_bindings: Vec<vk::VertexInputBindingDescription> = desc.vertex_layout.bindings
            .iter()
            .map(|binding| vk::VertexInputBindingDescription {
                binding: binding.binding,
                stride: binding.stride,
                input_rate: input_rate_to_vk(binding.input_rate),
            })
            .collect();
        let vertex_attributes: Vec<vk::VertexInputAttributeDescription> = desc.vertex_layout.attributes
            .iter()
            .map(|attribute| vk::VertexInputAttributeDescription {
                location: attribute.location,
                binding: attribute.binding,
                format: buffer_format_to_vk(attribute.format),
                offset: attribute.offset,
            })
            .collect();
        let vertex_input_state = vk::PipelineVertexInputStateCreateInfo::default()
            .vertex_binding_descriptions(&vertex_bindings)
            .vertex_attribute_descriptions(&vertex_attributes);

        let input_assembly_state = vk::PipelineInputAssemblyStateCreateInfo::default()
            .topology(topology_to_vk(desc.topology))
            .primitive_restart_enable(false);

        let viewport_state = vk::PipelineViewportStateCreateInfo::default()
            .viewport_count(1)
            .scissor_count(1);

        let rasterization_state = vk::PipelineRasterizationStateCreateInfo::default()
            .depth_clamp_enable(false)
            .rasterizer_discard_enable(false)
            .polygon_mode(vk::PolygonMode::FILL)
            .line_width(1.0)
            .cull_mode(cull_mode_to_vk(desc.rasterization.cull_mode))
            .front_face(front_face_to_vk(desc.rasterization.front_face))
            .depth_bias_enable(false);

        let depth_stencil_state = vk::PipelineDepthStencilStateCreateInfo::default()
            .depth_test_enable(desc.depth.test_enable)
            .depth_write_enable(desc.depth.write_enable)
            .depth_compare_op(compare_op_to_vk(desc.depth.compare_op))
            .depth_bounds_test_enable(false)
            .stencil_test_enable(false);

        let multisample_state = vk::PipelineMultisampleStateCreateInfo::default()
            .sample_shading_enable(false)
            .rasterization_samples(sample_count_to_vk(desc.samples));

        let blend_attachment = if desc.alpha_blend {
            vk::PipelineColorBlendAttachmentState::default()
                .color_write_mask(vk::ColorComponentFlags::RGBA)
                .blend_enable(true)
                .src_color_blend_factor(vk::BlendFactor::SRC_ALPHA)
                .dst_color_blend_factor(vk::BlendFactor::ONE_MINUS_SRC_ALPHA)
                .color_blend_op(vk::BlendOp::ADD)
                .src_alpha_blend_factor(vk::BlendFactor::ONE)
                .dst_alpha_blend_factor(vk::BlendFactor::ZERO)
                .alpha_blend_op(vk::BlendOp::ADD)
        } else {
            vk::PipelineColorBlendAttachmentState::default()
                .color_write_mask(vk::ColorComponentFlags::RGBA)
                .blend_enable(false)
        };
        let blend_attachments = vec![blend_attachment; color_count];
        let color_blend_state = vk::PipelineColorBlendStateCreateInfo::default()
            .logic_op_enable(false)
            .attachments(&blend_attachments);

        let dynamic_states = [vk::DynamicState::VIEWPORT, vk::DynamicState::SCISSOR];
        let dynamic_state = vk::PipelineDynamicStateCreateInfo::default().dynamic_states(&dynamic_states);

        let push_constant_ranges: Vec<vk::PushConstantRange> = desc.push_constant_ranges
            .iter()
            .map(|range| vk::PushConstantRange {
                stage_flags: shader_stages_to_vk(&range.stages),
                offset: range.offset,
                size: range.size,
            })
            .collect();

        unsafe {
            let mut descriptor_set_layouts = Vec::with_capacity(desc.binding_group_layouts.len());
            for layout_desc in &desc.binding_group_layouts {
                let bindings: Vec<vk::DescriptorSetLayoutBinding> = layout_desc.entries
                    .iter()
                    .map(|entry| {
                        vk::DescriptorSetLayoutBinding::default()
                            .binding(entry.binding)
                            .descriptor_type(binding_type_to_vk(entry.binding_type))
                            .descriptor_count(entry.count)
                            .stage_flags(stage_flags_to_vk(entry.stage_flags))
                    })
                    .collect();
                let layout_info = vk::DescriptorSetLayoutCreateInfo::default().bindings(&bindings);
                match ctx.device.create_descriptor_set_layout(&layout_info, None) {
                    Ok(layout) => descriptor_set_layouts.push(layout),
                    Err(e) => {
                        Self::destroy_set_layouts(&ctx, &descriptor_set_layouts);
                        return Err(engine_err!("frame_engine::vulkan", "Failed to create descriptor set layout: {:?}", e));
                    }
                }
            }

            let layout_info = vk::PipelineLayoutCreateInfo::default()
                .set_layouts(&descriptor_set_layouts)
                .push_constant_ranges(&push_constant_ranges);
            let pipeline_layout = match ctx.device.create_pipeline_layout(&layout_info, None) {
                Ok(layout) => layout,
                Err(e) => {
                    Self::destroy_set_layouts(&ctx, &descriptor_set_layouts);
                    return Err(engine_err!("frame_engine::vulkan", "Failed to create pipeline layout: {:?}", e));
                }
            };

            let create_info = vk::GraphicsPipelineCreateInfo::default()
                .stages(&shader_stages)
                .vertex_input_state(&vertex_input_state)
                .input_assembly_state(&input_assembly_state)
                .viewport_state(&viewport_state)
                .rasterization_state(&rasterization_state)
                .depth_stencil_state(&depth_stencil_state)
                .multisample_state(&multisample_state)
                .color_blend_state(&color_blend_state)
                .dynamic_state(&dynamic_state)
                .layout(pipeline_layout)
                .render_pass(vk_pass.render_pass)
                .subpass(desc.subpass);

            let pipelines = ctx.device.create_graphics_pipelines(vk::PipelineCache::null(), &[create_info], None);
            let pipeline = match pipelines {
                Ok(pipelines) => pipelines[0],
                Err((_, e)) => {
                    ctx.device.destroy_pipeline_layout(pipeline_layout, None);
                    Self::destroy_set_layouts(&ctx, &descriptor_set_layouts);
                    return Err(engine_err!("frame_engine::vulkan", "Failed to create graphics pipeline: {:?}", e));
                }
            };

            Ok(Self { ctx, pipeline, pipeline_layout, descriptor_set_layouts })
        }
    }

    unsafe fn destroy_set_layouts(ctx: &GpuContext, layouts: &[vk::DescriptorSetLayout]) {
        for &layout in layouts {
            ctx.device.destroy_descriptor_set_layout(layout, None);
        }
    }
}

impl EnginePipeline for Pipeline {
    fn binding_group_layout_count(&self) -> u32 {
        self.descriptor_set_layouts.len() as u32
    }
}

impl Drop for Pipeline {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_pipeline(self.pipeline, None);
            self.ctx.device.destroy_pipeline_layout(self.pipeline_layout, None);
            Self::destroy_set_layouts(&self.ctx, &self.descriptor_set_layouts);
        }
    }
}

pub(crate) fn vk_pipeline(pipeline: &dyn EnginePipeline) -> &Pipeline {
    unsafe { &*(pipeline as *const dyn EnginePipeline as *const Pipeline) }
}
