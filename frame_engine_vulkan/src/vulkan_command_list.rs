/// CommandList - Vulkan implementation of the engine CommandList trait
///
/// Each list owns its pool and a single primary command buffer, reset on
/// every `begin()`. Recording-state misuse is reported as
/// `Error::InvalidState` and records nothing.

use ash::vk;
use frame_engine::graphics_device::{
    BindingGroup as EngineBindingGroup, Buffer as EngineBuffer, ClearValue,
    CommandList as EngineCommandList, Framebuffer as EngineFramebuffer, IndexType,
    Pipeline as EnginePipeline, Rect2D, RenderPass as EngineRenderPass, ShaderStage, Viewport,
};
use frame_engine::{engine_err, Error, Result};
use std::sync::Arc;

use crate::vulkan_binding_group::vk_descriptor_set;
use crate::vulkan_buffer::vk_buffer;
use crate::vulkan_context::GpuContext;
use crate::vulkan_format::{index_type_to_vk, shader_stages_to_vk};
use crate::vulkan_frame_buffer::vk_framebuffer;
use crate::vulkan_pipeline::vk_pipeline;
use crate::vulkan_render_pass::vk_render_pass;

/// Vulkan command list
pub struct CommandList {
    ctx: Arc<GpuContext>,
    command_pool: vk::CommandPool,
    pub(crate) command_buffer: vk::CommandBuffer,
    is_recording: bool,
    in_render_pass: bool,
    /// Layout of the bound pipeline (push constants target it)
    bound_layout: Option<vk::PipelineLayout>,
}

impl CommandList {
    pub(crate) fn new(ctx: Arc<GpuContext>, queue_family: u32) -> Result<Self> {
        let pool_info = vk::CommandPoolCreateInfo::default()
            .queue_family_index(queue_family)
            .flags(vk::CommandPoolCreateFlags::RESET_COMMAND_BUFFER);
        let command_pool = unsafe { ctx.device.create_command_pool(&pool_info, None) }
            .map_err(|e| engine_err!("frame_engine::vulkan", "Failed to create command pool: {:?}", e))?;

        let allocate_info = vk::CommandBufferAllocateInfo::default()
            .command_pool(command_pool)
            .level(vk::CommandBufferLevel::PRIMARY)
            .command_buffer_count(1);
        let command_buffer = match unsafe { ctx.device.allocate_command_buffers(&allocate_info) } {
            Ok(buffers) => buffers[0],
            Err(e) => {
                unsafe { ctx.device.destroy_command_pool(command_pool, None) };
                return Err(engine_err!("frame_engine::vulkan", "Failed to allocate command buffer: {:?}", e));
            }
        };

        Ok(Self {
            ctx,
            command_pool,
            command_buffer,
            is_recording: false,
            in_render_pass: false,
            bound_layout: None,
        })
    }

    fn require_recording(&self) -> Result<()> {
        if self.is_recording {
            Ok(())
        } else {
            Err(Error::InvalidState("command list not recording".to_string()))
        }
    }

    fn require_render_pass(&self) -> Result<()> {
        self.require_recording()?;
        if self.in_render_pass {
            Ok(())
        } else {
            Err(Error::InvalidState("not inside a render pass".to_string()))
        }
    }
}

fn clear_value_to_vk(value: &ClearValue) -> vk::ClearValue {
    match value {
        ClearValue::Color(color) => vk::ClearValue {
            color: vk::ClearColorValue { float32: *color },
        },
        ClearValue::DepthStencil { depth, stencil } => vk::ClearValue {
            depth_stencil: vk::ClearDepthStencilValue { depth: *depth, stencil: *stencil },
        },
    }
}

impl EngineCommandList for CommandList {
    fn begin(&mut self) -> Result<()> {
        if self.is_recording {
            return Err(Error::InvalidState("command list already recording".to_string()));
        }

        unsafe {
            self.ctx.device
                .reset_command_buffer(self.command_buffer, vk::CommandBufferResetFlags::empty())
                .map_err(|e| engine_err!("frame_engine::vulkan", "Failed to reset command buffer: {:?}", e))?;

            let begin_info = vk::CommandBufferBeginInfo::default()
                .flags(vk::CommandBufferUsageFlags::ONE_TIME_SUBMIT);
            self.ctx.device
                .begin_command_buffer(self.command_buffer, &begin_info)
                .map_err(|e| engine_err!("frame_engine::vulkan", "Failed to begin command buffer: {:?}", e))?;
        }

        self.is_recording = true;
        self.in_render_pass = false;
        self.bound_layout = None;
        Ok(())
    }

    fn end(&mut self) -> Result<()> {
        self.require_recording()?;
        if self.in_render_pass {
            return Err(Error::InvalidState("render pass not ended before ending command list".to_string()));
        }

        unsafe { self.ctx.device.end_command_buffer(self.command_buffer) }
            .map_err(|e| engine_err!("frame_engine::vulkan", "Failed to end command buffer: {:?}", e))?;
        self.is_recording = false;
        Ok(())
    }

    fn begin_render_pass(
        &mut self,
        render_pass: &Arc<dyn EngineRenderPass>,
        framebuffer: &Arc<dyn EngineFramebuffer>,
        clear_values: &[ClearValue],
    ) -> Result<()> {
        self.require_recording()?;
        if self.in_render_pass {
            return Err(Error::InvalidState("already inside a render pass".to_string()));
        }

        let vk_clear_values: Vec<vk::ClearValue> = clear_values.iter().map(clear_value_to_vk).collect();
        let begin_info = vk::RenderPassBeginInfo::default()
            .render_pass(vk_render_pass(render_pass.as_ref()).render_pass)
            .framebuffer(vk_framebuffer(framebuffer.as_ref()))
            .render_area(vk::Rect2D {
                offset: vk::Offset2D { x: 0, y: 0 },
                extent: vk::Extent2D { width: framebuffer.width(), height: framebuffer.height() },
            })
            .clear_values(&vk_clear_values);

        unsafe {
            self.ctx.device.cmd_begin_render_pass(self.command_buffer, &begin_info, vk::SubpassContents::INLINE);
        }
        self.in_render_pass = true;
        Ok(())
    }

    fn end_render_pass(&mut self) -> Result<()> {
        self.require_render_pass()?;
        unsafe { self.ctx.device.cmd_end_render_pass(self.command_buffer) };
        self.in_render_pass = false;
        Ok(())
    }

    fn set_viewport(&mut self, viewport: Viewport) -> Result<()> {
        self.require_recording()?;
        let vk_viewport = vk::Viewport::default()
            .x(viewport.x)
            .y(viewport.y)
            .width(viewport.width)
            .height(viewport.height)
            .min_depth(viewport.min_depth)
            .max_depth(viewport.max_depth);
        unsafe { self.ctx.device.cmd_set_viewport(self.command_buffer, 0, &[vk_viewport]) };
        Ok(())
    }

    fn set_scissor(&mut self, scissor: Rect2D) -> Result<()> {
        self.require_recording()?;
        let vk_scissor = vk::Rect2D {
            offset: vk::Offset2D { x: scissor.x, y: scissor.y },
            extent: vk::Extent2D { width: scissor.width, height: scissor.height },
        };
        unsafe { self.ctx.device.cmd_set_scissor(self.command_buffer, 0, &[vk_scissor]) };
        Ok(())
    }

    fn bind_pipeline(&mut self, pipeline: &Arc<dyn EnginePipeline>) -> Result<()> {
        self.require_recording()?;
        let pipeline = vk_pipeline(pipeline.as_ref());
        unsafe {
            self.ctx.device.cmd_bind_pipeline(self.command_buffer, vk::PipelineBindPoint::GRAPHICS, pipeline.pipeline);
        }
        self.bound_layout = Some(pipeline.pipeline_layout);
        Ok(())
    }

    fn bind_binding_group(
        &mut self,
        pipeline: &Arc<dyn EnginePipeline>,
        set_index: u32,
        binding_group: &Arc<dyn EngineBindingGroup>,
    ) -> Result<()> {
        self.require_recording()?;
        let layout = vk_pipeline(pipeline.as_ref()).pipeline_layout;
        let sets = [vk_descriptor_set(binding_group.as_ref())];
        unsafe {
            self.ctx.device.cmd_bind_descriptor_sets(
                self.command_buffer,
                vk::PipelineBindPoint::GRAPHICS,
                layout,
                set_index,
                &sets,
                &[],
            );
        }
        Ok(())
    }

    fn push_constants(&mut self, stages: &[ShaderStage], offset: u32, data: &[u8]) -> Result<()> {
        self.require_recording()?;
        let layout = self
            .bound_layout
            .ok_or_else(|| Error::InvalidState("no pipeline bound for push constants".to_string()))?;
        unsafe {
            self.ctx.device.cmd_push_constants(self.command_buffer, layout, shader_stages_to_vk(stages), offset, data);
        }
        Ok(())
    }

    fn bind_vertex_buffer(&mut self, buffer: &Arc<dyn EngineBuffer>, offset: u64) -> Result<()> {
        self.require_recording()?;
        unsafe {
            self.ctx.device.cmd_bind_vertex_buffers(self.command_buffer, 0, &[vk_buffer(buffer.as_ref())], &[offset]);
        }
        Ok(())
    }

    fn bind_index_buffer(&mut self, buffer: &Arc<dyn EngineBuffer>, offset: u64, index_type: IndexType) -> Result<()> {
        self.require_recording()?;
        unsafe {
            self.ctx.device.cmd_bind_index_buffer(
                self.command_buffer,
                vk_buffer(buffer.as_ref()),
                offset,
                index_type_to_vk(index_type),
            );
        }
        Ok(())
    }

    fn draw(&mut self, vertex_count: u32, first_vertex: u32) -> Result<()> {
        self.require_render_pass()?;
        unsafe { self.ctx.device.cmd_draw(self.command_buffer, vertex_count, 1, first_vertex, 0) };
        Ok(())
    }

    fn draw_indexed(&mut self, index_count: u32, first_index: u32, vertex_offset: i32) -> Result<()> {
        self.require_render_pass()?;
        unsafe {
            self.ctx.device.cmd_draw_indexed(self.command_buffer, index_count, 1, first_index, vertex_offset, 0);
        }
        Ok(())
    }
}

impl Drop for CommandList {
    fn drop(&mut self) {
        // Frees the command buffer with it
        unsafe { self.ctx.device.destroy_command_pool(self.command_pool, None) };
    }
}

pub(crate) fn vk_command_buffer(command_list: &dyn EngineCommandList) -> vk::CommandBuffer {
    unsafe { (*(command_list as *const dyn EngineCommandList as *const CommandList)).command_buffer }
}
