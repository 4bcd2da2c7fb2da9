/*!
# Frame Engine

Backend-agnostic GPU frame submission and presentation.

The crate drives a frame loop on top of an explicit graphics API: it
negotiates presentable images with the surface, compiles declarative
attachment/subpass descriptions into render pass tables (synthesizing
multisample resolves), bounds the frames in flight with fences and
semaphores, and rebuilds swapchain-sized resources when the surface
changes. Backends implement the `graphics_device` traits; the Vulkan
backend lives in the `frame_engine_vulkan` crate.

## Architecture

- **GraphicsDevice**: backend factory shared as `Arc<dyn GraphicsDevice>`
- **RenderPass**: compiled attachment/subpass layout
- **Swapchain**: presentation chain lifecycle with a three-way outcome
- **FrameManager**: per-frame fences/semaphores and the command list pool
- **RenderTarget**: swapchain, offscreen and multi-buffered framebuffer bundles
- **SceneRenderer**: the begin/render/end state machine
*/

mod engine;
pub mod error;
pub mod log;
pub mod config;
pub mod graphics_device;
pub mod render_pass;
pub mod swapchain;
pub mod frame;
pub mod target;
pub mod renderer;

pub use engine::Engine;
pub use error::{Error, Result};
pub use config::{Config, DebugSeverity, ValidationStats};

// Re-export math library at crate root
pub use glam;
