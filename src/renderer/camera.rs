//! Chase camera following the courier

use bytemuck::{Pod, Zeroable};
use glam::{Mat4, Vec3};

/// Camera offset from the focus point
const EYE_OFFSET: Vec3 = Vec3::new(0.0, 28.0, 22.0);
const FOV_Y: f32 = std::f32::consts::FRAC_PI_4;
const Z_NEAR: f32 = 0.5;
const Z_FAR: f32 = 400.0;
/// Fraction of the remaining distance closed per second
const FOLLOW_RATE: f32 = 4.0;

/// Uniform block, matches `Camera` in `instanced.wgsl`
#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    /// xyz: direction towards the sun, w unused
    pub light_dir: [f32; 4],
    /// rgb: ambient colour, a unused
    pub ambient: [f32; 4],
}

#[derive(Debug, Clone)]
pub struct FollowCamera {
    focus: Vec3,
    initialized: bool,
}

impl Default for FollowCamera {
    fn default() -> Self {
        Self {
            focus: Vec3::ZERO,
            initialized: false,
        }
    }
}

impl FollowCamera {
    /// Ease toward `target`; the first call snaps
    pub fn follow(&mut self, target: [f32; 3], dt: f32) {
        let target = Vec3::from_array(target);
        if !self.initialized || !self.focus.is_finite() {
            self.focus = target;
            self.initialized = true;
            return;
        }
        let t = (FOLLOW_RATE * dt.max(0.0)).clamp(0.0, 1.0);
        self.focus = self.focus.lerp(target, t);
    }

    pub fn focus(&self) -> Vec3 {
        self.focus
    }

    pub fn view_proj(&self, aspect: f32) -> Mat4 {
        let aspect = if aspect.is_finite() && aspect > 0.0 {
            aspect
        } else {
            1.0
        };
        let view = Mat4::look_at_rh(self.focus + EYE_OFFSET, self.focus, Vec3::Y);
        let proj = Mat4::perspective_rh(FOV_Y, aspect, Z_NEAR, Z_FAR);
        proj * view
    }

    pub fn uniform(&self, aspect: f32, ambient: [f32; 3]) -> CameraUniform {
        let sun = Vec3::new(0.4, 1.0, 0.3).normalize();
        CameraUniform {
            view_proj: self.view_proj(aspect).to_cols_array_2d(),
            light_dir: [sun.x, sun.y, sun.z, 0.0],
            ambient: [ambient[0], ambient[1], ambient[2], 1.0],
        }
    }
}
