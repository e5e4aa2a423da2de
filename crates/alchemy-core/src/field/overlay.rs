//! Hand trail and cursor glyph, both following the smoothed hand.

use crate::constants::{
    CURSOR_INNER_COLOR, CURSOR_INNER_RADIUS, CURSOR_INNER_SPIN, CURSOR_OUTER_COLOR,
    CURSOR_OUTER_RADIUS, CURSOR_OUTER_SPIN, CURSOR_PINCH_SHRINK, TRAIL_CAPACITY, TRAIL_COLOR,
    TRAIL_SCALE,
};
use crate::field::ParticleInstance;
use glam::Vec2;
use std::collections::VecDeque;

const OUTER_RING_DOTS: usize = 6;
const INNER_RING_DOTS: usize = 8;
const RING_DOT_SIZE: f32 = 0.06;
const CORE_DOT_SIZE: f32 = 0.16;
const TRAIL_QUAD_SIZE: f32 = 0.5;

/// Bounded history of recent hand positions, newest first.
#[derive(Clone, Debug)]
pub struct HandTrail {
    points: VecDeque<Vec2>,
    capacity: usize,
}

impl Default for HandTrail {
    fn default() -> Self {
        Self::new(TRAIL_CAPACITY)
    }
}

impl HandTrail {
    pub fn new(capacity: usize) -> Self {
        Self {
            points: VecDeque::with_capacity(capacity + 1),
            capacity: capacity.max(1),
        }
    }

    /// Append while the hand is visible; otherwise shed the oldest point so
    /// the trail fades out over a few frames.
    pub fn update(&mut self, point: Vec2, active: bool) {
        if active {
            self.points.push_front(point);
        } else {
            self.points.pop_back();
        }
        self.points.truncate(self.capacity);
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn points(&self) -> impl Iterator<Item = &Vec2> {
        self.points.iter()
    }

    /// Size multiplier for the `i`-th point (0 is newest).
    #[inline]
    pub fn scale_at(&self, i: usize) -> f32 {
        1.0 - i as f32 / self.capacity as f32
    }

    pub fn emit(&self, out: &mut Vec<ParticleInstance>) {
        for (i, p) in self.points.iter().enumerate() {
            out.push(ParticleInstance {
                pos: [p.x, p.y, 0.0],
                size: TRAIL_QUAD_SIZE * self.scale_at(i) * TRAIL_SCALE,
                color: TRAIL_COLOR,
            });
        }
    }
}

/// Two counter-rotating rings and a core dot.
#[derive(Clone, Debug, Default)]
pub struct HandCursor {
    pub position: Vec2,
    pub visible: bool,
    pub scale: f32,
    pub outer_angle: f32,
    pub inner_angle: f32,
}

impl HandCursor {
    /// `frames` is elapsed time in 60 Hz reference frames.
    pub fn update(&mut self, position: Vec2, pinch_strength: f32, active: bool, frames: f32) {
        self.visible = active;
        if !active {
            return;
        }
        self.position = position;
        self.scale = 1.0 - pinch_strength * CURSOR_PINCH_SHRINK;
        self.outer_angle += CURSOR_OUTER_SPIN * frames;
        self.inner_angle += CURSOR_INNER_SPIN * frames;
    }

    pub fn emit(&self, out: &mut Vec<ParticleInstance>) {
        if !self.visible {
            return;
        }
        self.emit_ring(
            out,
            OUTER_RING_DOTS,
            CURSOR_OUTER_RADIUS,
            self.outer_angle,
            CURSOR_OUTER_COLOR,
        );
        self.emit_ring(
            out,
            INNER_RING_DOTS,
            CURSOR_INNER_RADIUS,
            self.inner_angle,
            CURSOR_INNER_COLOR,
        );
        out.push(ParticleInstance {
            pos: [self.position.x, self.position.y, 0.0],
            size: CORE_DOT_SIZE * self.scale,
            color: [1.0, 1.0, 1.0, 1.0],
        });
    }

    fn emit_ring(
        &self,
        out: &mut Vec<ParticleInstance>,
        dots: usize,
        radius: f32,
        angle: f32,
        color: [f32; 4],
    ) {
        for k in 0..dots {
            let a = angle + k as f32 * std::f32::consts::TAU / dots as f32;
            let p = self.position + Vec2::from_angle(a) * radius * self.scale;
            out.push(ParticleInstance {
                pos: [p.x, p.y, 0.0],
                size: RING_DOT_SIZE * self.scale,
                color,
            });
        }
    }
}
