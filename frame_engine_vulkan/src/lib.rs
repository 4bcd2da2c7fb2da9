/*!
# Frame Engine - Vulkan Backend

Vulkan implementation of the `frame_engine::graphics_device` traits, built
on `ash` for the API bindings, `ash-window` for surface creation and
`gpu-allocator` for memory.

```no_run
use std::sync::Arc;
use frame_engine::Config;
use frame_engine::renderer::{RenderContext, SceneRenderer};
use frame_engine_vulkan::VulkanGraphicsDevice;
# fn run(window: &winit::window::Window) -> frame_engine::Result<()> {
let config = Config::default();
let device = Arc::new(VulkanGraphicsDevice::new(window, &config)?);
let context = RenderContext::with_config(device, 800, 600, &config)?;
let mut renderer = SceneRenderer::new(context, &config)?;
if renderer.begin_frame()?.is_some() {
    renderer.end_frame()?;
}
# Ok(())
# }
```

Build with the `vulkan-validation` feature to get the Khronos validation
layer; its messages go through the engine logger and are counted in
`validation_stats()`.
*/

mod debug;
mod vulkan_context;
mod vulkan_format;
mod vulkan_sync;
mod vulkan_queue;
mod vulkan_texture;
mod vulkan_buffer;
mod vulkan_shader;
mod vulkan_render_pass;
mod vulkan_frame_buffer;
mod vulkan_pipeline;
mod vulkan_binding_group;
mod vulkan_command_list;
mod vulkan_presentation_chain;
mod vulkan_graphics_device;

pub use vulkan_graphics_device::VulkanGraphicsDevice;

// Validation message counters
pub use debug::{print_validation_stats_report, validation_stats};
