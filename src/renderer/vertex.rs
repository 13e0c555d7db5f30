//! Mesh vertex type and scene colours

use bytemuck::{Pod, Zeroable};

/// Lit mesh vertex: position and face normal
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub normal: [f32; 3],
}

impl Vertex {
    pub const fn new(position: [f32; 3], normal: [f32; 3]) -> Self {
        Self { position, normal }
    }

    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
            ],
        }
    }
}

/// Colors for scene elements
pub mod colors {
    /// Vehicle body palette, indexed by `color_index`
    pub const VEHICLE_PALETTE: [[f32; 4]; 6] = [
        [0.85, 0.2, 0.2, 1.0],
        [0.2, 0.45, 0.85, 1.0],
        [0.95, 0.8, 0.2, 1.0],
        [0.25, 0.7, 0.35, 1.0],
        [0.9, 0.9, 0.92, 1.0],
        [0.15, 0.15, 0.18, 1.0],
    ];
    pub const PEDESTRIAN: [f32; 4] = [0.9, 0.6, 0.45, 1.0];
    pub const COURIER: [f32; 4] = [1.0, 0.45, 0.1, 1.0];
    pub const COURIER_CARRYING: [f32; 4] = [0.2, 0.9, 0.6, 1.0];
    pub const PICKUP: [f32; 4] = [0.2, 0.9, 1.0, 1.0];
    pub const DROPOFF: [f32; 4] = [1.0, 0.3, 0.8, 1.0];
    pub const GPS_ARROW: [f32; 4] = [1.0, 1.0, 0.4, 1.0];
    pub const SIGNAL_GREEN: [f32; 4] = [0.1, 1.0, 0.3, 1.0];
    pub const SIGNAL_YELLOW: [f32; 4] = [1.0, 0.85, 0.1, 1.0];
    pub const SIGNAL_RED: [f32; 4] = [1.0, 0.1, 0.1, 1.0];
    pub const GROUND: [f32; 4] = [0.32, 0.5, 0.3, 1.0];
    pub const ROAD: [f32; 4] = [0.22, 0.22, 0.25, 1.0];
    pub const BACKGROUND: [f32; 4] = [0.45, 0.65, 0.9, 1.0];
}
