/// Render pass module - declarative attachment/subpass descriptions and their compiler

pub mod descriptor;
pub mod compiler;
pub mod render_pass;

pub use descriptor::*;
pub use compiler::*;
pub use render_pass::*;
