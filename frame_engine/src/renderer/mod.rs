/// Renderer module - the frame loop and the facade collaborators draw through

pub mod render_context;
pub mod mesh;
pub mod scene_renderer;

pub use render_context::*;
pub use mesh::*;
pub use scene_renderer::*;
