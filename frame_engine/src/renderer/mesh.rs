/// Mesh - the geometry handed to `SceneRenderer::render()`
///
/// Buffers are shared; a mesh is cheap to clone.

use std::sync::Arc;

use crate::graphics_device::{Buffer, IndexType};

/// Index data of an indexed mesh
#[derive(Clone)]
pub struct MeshIndices {
    pub buffer: Arc<dyn Buffer>,
    pub index_type: IndexType,
    pub count: u32,
}

#[derive(Clone)]
pub struct Mesh {
    vertex_buffer: Arc<dyn Buffer>,
    vertex_count: u32,
    indices: Option<MeshIndices>,
}

impl Mesh {
    /// Non-indexed mesh drawing `vertex_count` vertices
    pub fn new(vertex_buffer: Arc<dyn Buffer>, vertex_count: u32) -> Self {
        Self { vertex_buffer, vertex_count, indices: None }
    }

    /// Draw with `count` indices of `index_type` from `buffer`
    pub fn with_indices(mut self, buffer: Arc<dyn Buffer>, index_type: IndexType, count: u32) -> Self {
        self.indices = Some(MeshIndices { buffer, index_type, count });
        self
    }

    pub fn vertex_buffer(&self) -> &Arc<dyn Buffer> {
        &self.vertex_buffer
    }

    pub fn vertex_count(&self) -> u32 {
        self.vertex_count
    }

    pub fn indices(&self) -> Option<&MeshIndices> {
        self.indices.as_ref()
    }

    pub fn is_indexed(&self) -> bool {
        self.indices.is_some()
    }
}
