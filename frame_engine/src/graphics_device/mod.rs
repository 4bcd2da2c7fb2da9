/// Graphics device module - backend-facing traits and descriptor types

pub mod graphics_device;
pub mod texture;
pub mod buffer;
pub mod shader;
pub mod pipeline;
pub mod binding_group;
pub mod command_list;
pub mod render_pass;
pub mod frame_buffer;
pub mod presentation;
pub mod queue;
pub mod sync;

pub use graphics_device::*;
pub use texture::*;
pub use buffer::*;
pub use shader::*;
pub use pipeline::*;
pub use binding_group::*;
pub use command_list::*;
pub use render_pass::*;
pub use frame_buffer::*;
pub use presentation::*;
pub use queue::*;
pub use sync::*;

// Mock graphics device for tests (no GPU required)
#[cfg(test)]
pub mod mock_graphics_device;
