/// Swapchain module - surface negotiation and presentation chain lifecycle

pub mod selection;
pub mod swapchain;

pub use selection::*;
pub use swapchain::*;
