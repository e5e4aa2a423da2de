//! Particle field simulator.
//!
//! A fixed population of rest positions is pushed through [`shade_particle`]
//! every render frame. The field owns only smoothed inputs (hand, fluid
//! parameters, reaction); particles themselves carry no state beyond their
//! rest position.

mod overlay;
mod shade;

pub use overlay::{HandCursor, HandTrail};
pub use shade::{
    shade_particle, smoothstep, FieldParams, FlowNoise, FrameInputs, HandUniform,
    ParticleSample,
};

use crate::constants::{
    HAND_SMOOTHING, PARTICLE_COUNT, POINT_WORLD_SIZE, PROPERTY_SMOOTHING, REACTION_SMOOTHING,
    SMOOTHING_REFERENCE_HZ, SPAWN_DEPTH, SPAWN_SPREAD,
};
use crate::fluid::FluidPropertyRecord;
use crate::pose::HandPose;
use crate::state::Viewport;
use glam::Vec3;
use rand::prelude::*;
use rayon::prelude::*;

/// GPU instance record shared by particles, trail and cursor.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct ParticleInstance {
    pub pos: [f32; 3],
    /// World-space quad diameter.
    pub size: f32,
    pub color: [f32; 4],
}

impl From<ParticleSample> for ParticleInstance {
    fn from(s: ParticleSample) -> Self {
        Self {
            pos: s.position.to_array(),
            size: s.size * POINT_WORLD_SIZE,
            color: s.color.extend(1.0).to_array(),
        }
    }
}

#[derive(Clone, Debug)]
pub struct FieldConfig {
    pub count: usize,
    pub seed: u64,
    pub viewport: Viewport,
}

impl Default for FieldConfig {
    fn default() -> Self {
        Self {
            count: PARTICLE_COUNT,
            seed: 42,
            viewport: crate::state::Camera::default().viewport(),
        }
    }
}

/// Per-frame blend factor for a smoothing constant tuned at 60 Hz.
#[inline]
pub fn smoothing_alpha(per_reference_frame: f32, dt_sec: f32) -> f32 {
    1.0 - (1.0 - per_reference_frame).powf(dt_sec * SMOOTHING_REFERENCE_HZ)
}

/// Uniformly sample `count` rest positions inside the spawn volume.
pub fn spawn_rest_positions(count: usize, viewport: Viewport, seed: u64) -> Vec<Vec3> {
    let mut rng = StdRng::seed_from_u64(seed);
    let half_w = viewport.width * SPAWN_SPREAD * 0.5;
    let half_h = viewport.height * SPAWN_SPREAD * 0.5;
    let half_d = SPAWN_DEPTH * 0.5;
    (0..count)
        .map(|_| {
            Vec3::new(
                rng.gen_range(-half_w..=half_w),
                rng.gen_range(-half_h..=half_h),
                rng.gen_range(-half_d..=half_d),
            )
        })
        .collect()
}

pub struct ParticleField {
    rest: Vec<Vec3>,
    instances: Vec<ParticleInstance>,
    noise: FlowNoise,
    viewport: Viewport,
    params: FieldParams,
    hand: HandUniform,
    reaction: f32,
    time: f32,
    trail: HandTrail,
    cursor: HandCursor,
}

impl ParticleField {
    pub fn new(config: &FieldConfig, initial: &FluidPropertyRecord) -> Self {
        let rest = spawn_rest_positions(config.count, config.viewport, config.seed);
        let instances = vec![ParticleInstance::default(); rest.len()];
        log::info!(
            "[field] {} particles in a {:.1}x{:.1} viewport",
            rest.len(),
            config.viewport.width,
            config.viewport.height
        );
        Self {
            rest,
            instances,
            noise: FlowNoise::new(config.seed as u32),
            viewport: config.viewport,
            params: FieldParams::from(initial),
            hand: HandUniform::default(),
            reaction: 0.0,
            time: 0.0,
            trail: HandTrail::default(),
            cursor: HandCursor::default(),
        }
    }

    /// Advance one render frame.
    pub fn update(
        &mut self,
        dt_sec: f32,
        pose: &HandPose,
        record: &FluidPropertyRecord,
        reaction: f32,
    ) {
        self.time += dt_sec;

        self.hand.active = pose.active;
        if pose.active {
            let target = self.viewport.to_world(pose.position());
            self.hand.position = self
                .hand
                .position
                .lerp(target, smoothing_alpha(HAND_SMOOTHING, dt_sec));
            self.hand.pinch_strength = pose.pinch_strength;
        }
        self.params
            .approach(record, smoothing_alpha(PROPERTY_SMOOTHING, dt_sec));
        self.reaction += (reaction - self.reaction) * smoothing_alpha(REACTION_SMOOTHING, dt_sec);

        let frame = FrameInputs {
            time: self.time,
            hand: self.hand,
            params: self.params,
            reaction: self.reaction,
        };
        let noise = &self.noise;
        self.instances
            .par_iter_mut()
            .zip(self.rest.par_iter())
            .for_each(|(out, rest)| *out = shade_particle(*rest, noise, &frame).into());

        self.trail.update(self.hand.position, pose.active);
        self.cursor.update(
            self.hand.position,
            self.hand.pinch_strength,
            pose.active,
            dt_sec * SMOOTHING_REFERENCE_HZ,
        );
    }

    /// Replace the viewport (window resize). Rest positions are kept.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    pub fn instances(&self) -> &[ParticleInstance] {
        &self.instances
    }

    /// Append trail and cursor glyph instances after the particles.
    pub fn emit_overlay(&self, out: &mut Vec<ParticleInstance>) {
        self.trail.emit(out);
        self.cursor.emit(out);
    }

    pub fn params(&self) -> &FieldParams {
        &self.params
    }

    pub fn hand(&self) -> &HandUniform {
        &self.hand
    }

    pub fn reaction(&self) -> f32 {
        self.reaction
    }

    pub fn trail(&self) -> &HandTrail {
        &self.trail
    }

    pub fn cursor(&self) -> &HandCursor {
        &self.cursor
    }
}
