//! Unit meshes shared by every instance batch
//!
//! Everything in the city is drawn as a scaled, rotated unit box, so a single
//! vertex buffer serves all batches.

use super::vertex::Vertex;

/// Vertices in [`unit_box`]
pub const UNIT_BOX_VERTEX_COUNT: u32 = 36;

/// Axis-aligned cube of side 1 centred on the origin, counter-clockwise faces
pub fn unit_box() -> Vec<Vertex> {
    // (normal, tangent u, tangent v) with u × v = normal
    const FACES: [([f32; 3], [f32; 3], [f32; 3]); 6] = [
        ([1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]),
        ([-1.0, 0.0, 0.0], [0.0, 0.0, 1.0], [0.0, 1.0, 0.0]),
        ([0.0, 1.0, 0.0], [0.0, 0.0, 1.0], [1.0, 0.0, 0.0]),
        ([0.0, -1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 1.0]),
        ([0.0, 0.0, 1.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]),
        ([0.0, 0.0, -1.0], [0.0, 1.0, 0.0], [1.0, 0.0, 0.0]),
    ];

    let mut vertices = Vec::with_capacity(UNIT_BOX_VERTEX_COUNT as usize);
    for (normal, u, v) in FACES {
        let corner = |su: f32, sv: f32| -> Vertex {
            let mut p = [0.0; 3];
            for i in 0..3 {
                p[i] = normal[i] * 0.5 + u[i] * su * 0.5 + v[i] * sv * 0.5;
            }
            Vertex::new(p, normal)
        };
        let a = corner(-1.0, -1.0);
        let b = corner(1.0, -1.0);
        let c = corner(1.0, 1.0);
        let d = corner(-1.0, 1.0);
        vertices.extend_from_slice(&[a, b, c, a, c, d]);
    }
    vertices
}
