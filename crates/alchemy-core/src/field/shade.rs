//! The per-particle function. Everything here is pure: the same rest
//! position and frame inputs always produce the same sample, and no particle
//! looks at any other.

use crate::constants::{
    hot_tint, ATTRACT_BLEND, ATTRACT_RADIUS, ATTRACT_THRESHOLD, FLOW_AMPLITUDE,
    FLOW_DEPTH_AMPLITUDE, HOT_TINT_WEIGHT, JITTER_SPATIAL_SCALE, JITTER_TIME_SCALE,
    PROXIMITY_RADIUS, PROXIMITY_WHITEN, REACTION_ACTIVE, REPEL_RADIUS, SIZE_BOOST,
    SIZE_BOOST_RADIUS,
};
use crate::fluid::FluidPropertyRecord;
use glam::{Vec2, Vec3};
use noise::{NoiseFn, Simplex};

/// 3D simplex noise used for both the ambient flow and the reaction jitter.
#[derive(Clone, Debug)]
pub struct FlowNoise {
    simplex: Simplex,
}

impl FlowNoise {
    pub fn new(seed: u32) -> Self {
        Self {
            simplex: Simplex::new(seed),
        }
    }

    #[inline]
    pub fn sample(&self, x: f32, y: f32, z: f32) -> f32 {
        self.simplex.get([x as f64, y as f64, z as f64]) as f32
    }
}

/// Smoothed fluid parameters as seen by the shading function.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldParams {
    pub base_color: Vec3,
    pub highlight_color: Vec3,
    pub particle_size: f32,
    pub viscosity: f32,
    pub force_strength: f32,
    pub flow_speed: f32,
    pub chaos: f32,
    pub glow: f32,
}

impl From<&FluidPropertyRecord> for FieldParams {
    fn from(r: &FluidPropertyRecord) -> Self {
        Self {
            base_color: r.base_color,
            highlight_color: r.highlight_color,
            particle_size: r.particle_size,
            viscosity: r.viscosity,
            force_strength: r.force_strength,
            flow_speed: r.flow_speed,
            chaos: r.chaos,
            glow: r.glow,
        }
    }
}

impl FieldParams {
    /// Move every parameter a fraction `alpha` of the way toward `target`.
    pub fn approach(&mut self, target: &FluidPropertyRecord, alpha: f32) {
        let lerp = |a: f32, b: f32| a + (b - a) * alpha;
        self.base_color = self.base_color.lerp(target.base_color, alpha);
        self.highlight_color = self.highlight_color.lerp(target.highlight_color, alpha);
        self.particle_size = lerp(self.particle_size, target.particle_size);
        self.viscosity = lerp(self.viscosity, target.viscosity);
        self.force_strength = lerp(self.force_strength, target.force_strength);
        self.flow_speed = lerp(self.flow_speed, target.flow_speed);
        self.chaos = lerp(self.chaos, target.chaos);
        self.glow = lerp(self.glow, target.glow);
    }
}

/// Smoothed hand as seen by the shading function, in world units.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct HandUniform {
    pub position: Vec2,
    pub pinch_strength: f32,
    pub active: bool,
}

/// Everything a particle needs for one frame.
#[derive(Clone, Copy, Debug)]
pub struct FrameInputs {
    pub time: f32,
    pub hand: HandUniform,
    pub params: FieldParams,
    pub reaction: f32,
}

/// Output of the per-particle function.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParticleSample {
    pub position: Vec3,
    pub color: Vec3,
    /// Unscaled point size (multiples of `particle_size`).
    pub size: f32,
}

/// GLSL-style smoothstep; `edge0 > edge1` gives the reversed ramp.
#[inline]
pub fn smoothstep(edge0: f32, edge1: f32, x: f32) -> f32 {
    let t = ((x - edge0) / (edge1 - edge0)).clamp(0.0, 1.0);
    t * t * (3.0 - 2.0 * t)
}

pub fn shade_particle(rest: Vec3, noise: &FlowNoise, f: &FrameInputs) -> ParticleSample {
    let p = &f.params;
    let mut pos = rest;

    // Ambient flow
    let t = f.time * p.flow_speed;
    let n1 = noise.sample(pos.x * p.chaos, pos.y * p.chaos, t);
    let n2 = noise.sample(pos.x * p.chaos * 2.0, pos.y * p.chaos * 2.0, t * 1.5);
    pos.x += n1 * FLOW_AMPLITUDE;
    pos.y += n2 * FLOW_AMPLITUDE;
    pos.z += (n1 + n2) * FLOW_DEPTH_AMPLITUDE;

    // Boiling
    let reacting = f.reaction > REACTION_ACTIVE;
    if reacting {
        let jitter = noise.sample(
            pos.x * JITTER_SPATIAL_SCALE,
            pos.y * JITTER_SPATIAL_SCALE,
            f.time * JITTER_TIME_SCALE,
        ) * f.reaction;
        pos.z += jitter * 2.0;
        pos.x += jitter * 0.5;
        pos.y += jitter * 0.5;
    }

    let mut size = p.particle_size;
    let mut color = p
        .base_color
        .lerp(p.highlight_color, smoothstep(-1.0, 1.0, n1));
    if reacting {
        color = color.lerp(hot_tint(), f.reaction * HOT_TINT_WEIGHT);
        size *= 1.0 + f.reaction;
    }

    if f.hand.active {
        let hand = f.hand.position;
        let d = pos.truncate().distance(hand);
        let anchor = hand.extend(0.0);

        // Hard switch between the two regimes, no blending at the threshold.
        if f.hand.pinch_strength > ATTRACT_THRESHOLD {
            let pull = smoothstep(ATTRACT_RADIUS, 0.0, d) * f.hand.pinch_strength;
            pos = pos.lerp(anchor, pull * ATTRACT_BLEND);
            pos.z *= 1.0 - pull;
        } else {
            let push = smoothstep(REPEL_RADIUS, 0.0, d);
            let dir = (pos - anchor).normalize_or_zero();
            pos += dir * push * p.force_strength;
        }

        if d < SIZE_BOOST_RADIUS {
            size *= SIZE_BOOST;
        }
        if d < PROXIMITY_RADIUS {
            color = color.lerp(Vec3::ONE, PROXIMITY_WHITEN * (PROXIMITY_RADIUS - d));
        }
    }

    ParticleSample {
        position: pos,
        color: color * p.glow,
        size,
    }
}
