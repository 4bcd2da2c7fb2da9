/// Shader - Vulkan implementation of the engine Shader trait

use ash::vk;
use frame_engine::graphics_device::{Shader as EngineShader, ShaderDesc, ShaderStage};
use frame_engine::{engine_err, Error, Result};
use std::ffi::CString;
use std::io::Cursor;
use std::sync::Arc;

use crate::vulkan_context::GpuContext;

/// Vulkan shader module
pub struct Shader {
    ctx: Arc<GpuContext>,
    pub(crate) module: vk::ShaderModule,
    pub(crate) stage: ShaderStage,
    pub(crate) entry_point: CString,
}

impl Shader {
    pub(crate) fn create(ctx: Arc<GpuContext>, desc: &ShaderDesc) -> Result<Self> {
        // read_spv checks the magic number and realigns the words
        let code = ash::util::read_spv(&mut Cursor::new(desc.code))
            .map_err(|e| Error::InvalidResource(format!("invalid SPIR-V bytecode: {}", e)))?;
        let entry_point = CString::new(desc.entry_point.as_str())
            .map_err(|_| Error::InvalidResource(format!("invalid entry point {:?}", desc.entry_point)))?;

        let create_info = vk::ShaderModuleCreateInfo::default().code(&code);
        let module = unsafe { ctx.device.create_shader_module(&create_info, None) }
            .map_err(|e| engine_err!("frame_engine::vulkan", "Failed to create shader module: {:?}", e))?;

        Ok(Self { ctx, module, stage: desc.stage, entry_point })
    }
}

impl EngineShader for Shader {
    fn stage(&self) -> ShaderStage {
        self.stage
    }
}

impl Drop for Shader {
    fn drop(&mut self) {
        unsafe {
            self.ctx.device.destroy_shader_module(self.module, None);
        }
    }
}
