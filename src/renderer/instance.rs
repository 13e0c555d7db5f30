//! Per-instance GPU records built from a frame snapshot
//!
//! One batch per entity class; each batch becomes a single instanced draw.
//! Buffers are cleared and refilled every frame so steady-state frames do not
//! allocate.

use bytemuck::{Pod, Zeroable};

use super::vertex::colors;
use crate::config::WorldConfig;
use crate::sim::delivery::DeliveryKind;
use crate::sim::tick::FrameSnapshot;
use crate::sim::traffic_light::{SignalAxis, SignalPhase};

const VEHICLE_SCALE: [f32; 3] = [3.6, 1.2, 1.8];
const PEDESTRIAN_SCALE: [f32; 3] = [0.5, 1.8, 0.5];
const COURIER_SCALE: [f32; 3] = [0.8, 1.8, 0.8];
const SIGNAL_SCALE: [f32; 3] = [0.6, 1.6, 0.6];
const MARKER_SCALE: [f32; 3] = [2.0, 0.3, 2.0];
const GPS_SCALE: [f32; 3] = [1.2, 0.2, 0.4];
/// GPS arrow distance ahead of the courier
const GPS_OFFSET: f32 = 3.0;
/// Signal heads sit on opposite corners of their intersection
const SIGNAL_CORNER: f32 = 5.5;
const ROAD_WIDTH: f32 = 8.0;

/// One instance: `#[repr(C)]`, matches `instanced.wgsl`
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct InstanceRaw {
    pub position: [f32; 3],
    /// Yaw around +Y (radians)
    pub rotation: f32,
    pub scale: [f32; 3],
    /// 1.0 ignores scene lighting (signal lamps)
    pub emissive: f32,
    pub color: [f32; 4],
}

impl InstanceRaw {
    pub fn desc() -> wgpu::VertexBufferLayout<'static> {
        const ATTRIBUTES: [wgpu::VertexAttribute; 3] =
            wgpu::vertex_attr_array![2 => Float32x4, 3 => Float32x4, 4 => Float32x4];
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<InstanceRaw>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Instance,
            attributes: &ATTRIBUTES,
        }
    }
}

/// Entity classes, each drawn with one call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BatchKind {
    Scenery,
    Vehicles,
    Pedestrians,
    Signals,
    Markers,
}

impl BatchKind {
    /// Draw order
    pub const ALL: [BatchKind; 5] = [
        BatchKind::Scenery,
        BatchKind::Vehicles,
        BatchKind::Pedestrians,
        BatchKind::Signals,
        BatchKind::Markers,
    ];

    pub fn label(self) -> &'static str {
        match self {
            BatchKind::Scenery => "scenery_instances",
            BatchKind::Vehicles => "vehicle_instances",
            BatchKind::Pedestrians => "pedestrian_instances",
            BatchKind::Signals => "signal_instances",
            BatchKind::Markers => "marker_instances",
        }
    }
}

/// Instance arrays for one frame plus the camera focus
#[derive(Debug, Clone, Default)]
pub struct InstanceBatches {
    pub scenery: Vec<InstanceRaw>,
    pub vehicles: Vec<InstanceRaw>,
    pub pedestrians: Vec<InstanceRaw>,
    pub signals: Vec<InstanceRaw>,
    pub markers: Vec<InstanceRaw>,
    /// Point the camera follows (the courier)
    pub focus: [f32; 3],
    /// Ambient light colour for this frame
    pub ambient: [f32; 3],
    /// Bumped whenever `scenery` changes
    pub scenery_revision: u32,
}

impl InstanceBatches {
    /// Batches with the static ground and road grid for `world`
    pub fn new(world: &WorldConfig) -> Self {
        let mut batches = Self {
            ambient: [1.0; 3],
            ..Default::default()
        };
        batches.build_scenery(world);
        batches
    }

    pub fn batch(&self, kind: BatchKind) -> &[InstanceRaw] {
        match kind {
            BatchKind::Scenery => &self.scenery,
            BatchKind::Vehicles => &self.vehicles,
            BatchKind::Pedestrians => &self.pedestrians,
            BatchKind::Signals => &self.signals,
            BatchKind::Markers => &self.markers,
        }
    }

    /// Instances across every batch
    pub fn instance_count(&self) -> usize {
        BatchKind::ALL.iter().map(|&k| self.batch(k).len()).sum()
    }

    /// Rebuild the ground slab and road strips
    pub fn build_scenery(&mut self, world: &WorldConfig) {
        self.scenery.clear();
        let width = world.width();
        self.scenery.push(InstanceRaw {
            position: [0.0, -0.55, 0.0],
            rotation: 0.0,
            scale: [width, 1.0, width],
            emissive: 0.0,
            color: colors::GROUND,
        });
        for line in world.road_lines() {
            // East-west and north-south strips through the same coordinate
            self.scenery.push(InstanceRaw {
                position: [0.0, -0.04, line],
                rotation: 0.0,
                scale: [width, 0.1, ROAD_WIDTH],
                emissive: 0.0,
                color: colors::ROAD,
            });
            self.scenery.push(InstanceRaw {
                position: [line, -0.03, 0.0],
                rotation: 0.0,
                scale: [ROAD_WIDTH, 0.1, width],
                emissive: 0.0,
                color: colors::ROAD,
            });
        }
        self.scenery_revision = self.scenery_revision.wrapping_add(1);
    }

    /// Rewrite the dynamic batches from `snapshot`
    pub fn update(&mut self, snapshot: &FrameSnapshot) {
        let tint = snapshot.ambient_tint;
        self.ambient = tint;
        self.focus = snapshot.courier.position;

        self.vehicles.clear();
        self.vehicles.extend(snapshot.vehicles.iter().map(|v| InstanceRaw {
            position: v.position,
            rotation: v.rotation,
            scale: VEHICLE_SCALE,
            emissive: 0.0,
            color: palette_color(v.color_index),
        }));

        self.pedestrians.clear();
        self.pedestrians
            .extend(snapshot.pedestrians.iter().map(|p| InstanceRaw {
                position: p.position,
                rotation: p.rotation,
                scale: PEDESTRIAN_SCALE,
                emissive: 0.0,
                color: colors::PEDESTRIAN,
            }));

        self.signals.clear();
        self.signals.extend(snapshot.lights.iter().map(|l| {
            let [x, y, z] = l.position;
            let (dx, dz) = match l.axis {
                SignalAxis::NorthSouth => (SIGNAL_CORNER, SIGNAL_CORNER),
                SignalAxis::EastWest => (-SIGNAL_CORNER, -SIGNAL_CORNER),
            };
            InstanceRaw {
                position: [x + dx, y, z + dz],
                rotation: 0.0,
                scale: SIGNAL_SCALE,
                emissive: 1.0,
                color: signal_color(l.phase),
            }
        }));

        self.markers.clear();
        let courier = &snapshot.courier;
        self.markers.push(InstanceRaw {
            position: courier.position,
            rotation: courier.heading,
            scale: COURIER_SCALE,
            emissive: 0.0,
            color: if courier.carrying {
                colors::COURIER_CARRYING
            } else {
                colors::COURIER
            },
        });
        if let Some(objective) = &snapshot.objective {
            let [x, _, z] = objective.position;
            self.markers.push(InstanceRaw {
                position: [x, 0.2, z],
                rotation: (snapshot.elapsed as f32 * 1.5) % std::f32::consts::TAU,
                scale: MARKER_SCALE,
                emissive: 1.0,
                color: match objective.kind {
                    DeliveryKind::Pickup => colors::PICKUP,
                    DeliveryKind::Dropoff => colors::DROPOFF,
                },
            });
        }
        if let Some(gps) = &snapshot.gps {
            let [x, _, z] = courier.position;
            self.markers.push(InstanceRaw {
                position: [
                    x + gps.bearing.cos() * GPS_OFFSET,
                    0.3,
                    z + gps.bearing.sin() * GPS_OFFSET,
                ],
                rotation: gps.bearing,
                scale: GPS_SCALE,
                emissive: 1.0,
                color: colors::GPS_ARROW,
            });
        }
    }
}

/// Vehicle colour for a palette index (wraps around)
pub fn palette_color(index: u32) -> [f32; 4] {
    colors::VEHICLE_PALETTE[index as usize % colors::VEHICLE_PALETTE.len()]
}

pub fn signal_color(phase: SignalPhase) -> [f32; 4] {
    match phase {
        SignalPhase::Green => colors::SIGNAL_GREEN,
        SignalPhase::Yellow => colors::SIGNAL_YELLOW,
        SignalPhase::Red => colors::SIGNAL_RED,
    }
}
