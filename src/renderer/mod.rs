//! WebGPU rendering module
//!
//! The simulation hands over a [`FrameSnapshot`](crate::sim::FrameSnapshot);
//! [`InstanceBatches`] turns it into per-instance records and a
//! [`BatchedRenderer`] issues one instanced draw per non-empty batch.

pub mod camera;
pub mod instance;
pub mod pipeline;
pub mod shapes;
pub mod vertex;

pub use camera::FollowCamera;
pub use instance::{BatchKind, InstanceBatches, InstanceRaw};
pub use pipeline::InstancedRenderState;

use thiserror::Error;

/// Renderer failures surfaced to the host
#[derive(Debug, Error)]
pub enum RenderError {
    #[error("surface reports no usable texture format")]
    NoSurfaceFormat,
    #[error("failed to create device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
    #[error("surface error: {0}")]
    Surface(#[from] wgpu::SurfaceError),
}

/// The narrow capability the host needs from a renderer
pub trait BatchedRenderer {
    type Error;

    /// Draw every batch, one instanced call each
    fn draw_batches(&mut self, batches: &InstanceBatches) -> Result<(), Self::Error>;
}

/// Draw calls for a frame in order: `(batch, instance count)`, empty batches skipped
pub fn draw_plan(batches: &InstanceBatches) -> impl Iterator<Item = (BatchKind, u32)> + '_ {
    BatchKind::ALL.into_iter().filter_map(|kind| {
        let count = batches.batch(kind).len() as u32;
        (count > 0).then_some((kind, count))
    })
}
