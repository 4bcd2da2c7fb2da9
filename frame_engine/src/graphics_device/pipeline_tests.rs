//! Unit tests for the pipeline module

use crate::graphics_device::{
    IndexType, VertexLayout, VertexBinding, VertexAttribute, VertexInputRate,
    BufferFormat, RasterizationState, CullMode, DepthState, CompareOp,
};

#[test]
fn test_index_type_size_bytes() {
    assert_eq!(IndexType::U16.size_bytes(), 2);
    assert_eq!(IndexType::U32.size_bytes(), 4);
}

#[test]
fn test_vertex_layout_stride_lookup() {
    let layout = VertexLayout {
        bindings: vec![
            VertexBinding { binding: 0, stride: 32, input_rate: VertexInputRate::Vertex },
            VertexBinding { binding: 1, stride: 64, input_rate: VertexInputRate::Instance },
        ],
        attributes: vec![
            VertexAttribute { location: 0, binding: 0, format: BufferFormat::R32G32B32_SFLOAT, offset: 0 },
            VertexAttribute { location: 1, binding: 0, format: BufferFormat::R32G32B32_SFLOAT, offset: 12 },
            VertexAttribute { location: 2, binding: 0, format: BufferFormat::R32G32_SFLOAT, offset: 24 },
        ],
    };

    assert_eq!(layout.stride(0), Some(32));
    assert_eq!(layout.stride(1), Some(64));
    assert_eq!(layout.stride(2), None);

    // Attributes of binding 0 fit its stride
    let end = layout.attributes.iter()
        .filter(|a| a.binding == 0)
        .map(|a| a.offset + a.format.size_bytes())
        .max()
        .unwrap();
    assert_eq!(end, 32);
}

#[test]
fn test_fixed_function_defaults() {
    let raster = RasterizationState::default();
    assert_eq!(raster.cull_mode, CullMode::Back);

    let depth = DepthState::default();
    assert!(depth.test_enable);
    assert!(depth.write_enable);
    assert_eq!(depth.compare_op, CompareOp::Less);
}
