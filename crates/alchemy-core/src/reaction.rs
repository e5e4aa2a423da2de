//! The reaction timeline: a [0, 1] "boil" level that spikes to 1 on a mix and
//! then decays geometrically on a fixed tick.

use crate::constants::{REACTION_DECAY_FACTOR, REACTION_EPSILON};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// One decay step: multiply by `factor`, snapping to exactly 0 once the value
/// has fallen to `epsilon` or below.
#[inline]
pub fn decay_step(value: f32, factor: f32, epsilon: f32) -> f32 {
    if value <= epsilon {
        0.0
    } else {
        value * factor
    }
}

/// Apply `ticks` decay steps with the default factor and epsilon.
pub fn decay(value: f32, ticks: u32) -> f32 {
    (0..ticks).fold(value, |v, _| decay_step(v, REACTION_DECAY_FACTOR, REACTION_EPSILON))
}

/// Number of ticks until a value starting at `start` reads exactly 0.
pub fn ticks_to_settle(start: f32, factor: f32, epsilon: f32) -> u32 {
    let mut v = start;
    let mut ticks = 0;
    while v > 0.0 {
        v = decay_step(v, factor, epsilon);
        ticks += 1;
    }
    ticks
}

/// Sole writer of the shared reaction level, owned by the mixer.
#[derive(Debug)]
pub struct ReactionWriter {
    level: Arc<AtomicU32>,
}

/// Read-only view of the reaction level for the simulator.
#[derive(Clone, Debug)]
pub struct ReactionReader {
    level: Arc<AtomicU32>,
}

pub fn reaction_cell() -> (ReactionWriter, ReactionReader) {
    let level = Arc::new(AtomicU32::new(0f32.to_bits()));
    (
        ReactionWriter {
            level: Arc::clone(&level),
        },
        ReactionReader { level },
    )
}

impl ReactionWriter {
    pub fn set(&mut self, value: f32) {
        self.level
            .store(value.clamp(0.0, 1.0).to_bits(), Ordering::Release);
    }

    pub fn get(&self) -> f32 {
        f32::from_bits(self.level.load(Ordering::Acquire))
    }

    pub fn reader(&self) -> ReactionReader {
        ReactionReader {
            level: Arc::clone(&self.level),
        }
    }
}

impl ReactionReader {
    pub fn get(&self) -> f32 {
        f32::from_bits(self.level.load(Ordering::Acquire))
    }
}
