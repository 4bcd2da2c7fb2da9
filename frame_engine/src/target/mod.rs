/// Target module - per-frame attachment bundles bound during a render pass

pub mod render_target;
pub mod swapchain_target;
pub mod offscreen_target;
pub mod multi_target;

pub use render_target::*;
pub use swapchain_target::*;
pub use offscreen_target::*;
pub use multi_target::*;
