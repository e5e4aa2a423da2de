//! Hand pose samples and the single-slot cell that shares them between loops.
//!
//! The cell holds exactly one value: the most recent pose. There is one
//! [`PoseWriter`] (owned by whatever polls the pose source) and any number of
//! [`PoseReader`]s. Fields are stored as independent atomics, so a reader may
//! observe a sample that mixes two consecutive writes; at 30-60 Hz that is
//! visually imperceptible and keeps both loops free of locks.

use crate::constants::{PINCH_DISTANCE, PINCH_SATURATION_DISTANCE};
use glam::{Vec2, Vec3};
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// One hand sample in normalized screen space.
///
/// When `active` is false the remaining fields carry no information and must
/// not be interpreted as a position.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HandPose {
    pub x: f32,
    pub y: f32,
    pub z: f32,
    pub is_pinching: bool,
    pub pinch_strength: f32,
    pub active: bool,
}

impl Default for HandPose {
    fn default() -> Self {
        Self::inactive()
    }
}

impl HandPose {
    pub const fn inactive() -> Self {
        Self {
            x: 0.5,
            y: 0.5,
            z: 0.0,
            is_pinching: false,
            pinch_strength: 0.0,
            active: false,
        }
    }

    /// Active pose at `(x, y)` with the given pinch strength.
    pub fn at(x: f32, y: f32, pinch_strength: f32) -> Self {
        let pinch_strength = pinch_strength.clamp(0.0, 1.0);
        Self {
            x,
            y,
            z: 0.0,
            is_pinching: pinch_strength > 1.0 - PINCH_DISTANCE / PINCH_SATURATION_DISTANCE,
            pinch_strength,
            active: true,
        }
    }

    /// Build a pose from the index (landmark 8) and thumb (landmark 4) tips
    /// reported by a landmark detector in image coordinates.
    ///
    /// X is mirrored so moving the hand right moves the cursor right.
    pub fn from_landmarks(index_tip: Vec3, thumb_tip: Vec3) -> Self {
        let gap = index_tip.truncate().distance(thumb_tip.truncate());
        Self {
            x: 1.0 - index_tip.x,
            y: index_tip.y,
            z: index_tip.z,
            is_pinching: gap < PINCH_DISTANCE,
            pinch_strength: pinch_strength_for_gap(gap),
            active: true,
        }
    }

    #[inline]
    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

/// Map the thumb/index fingertip gap to a [0, 1] pinch strength.
#[inline]
pub fn pinch_strength_for_gap(gap: f32) -> f32 {
    (1.0 - gap / PINCH_SATURATION_DISTANCE).clamp(0.0, 1.0)
}

/// External collaborator that yields the current hand pose.
///
/// Implementations return [`HandPose::inactive`] when no hand is visible
/// rather than an error.
pub trait PoseSource {
    fn current_pose(&mut self) -> HandPose;
}

const FLAG_ACTIVE: u32 = 1;
const FLAG_PINCHING: u32 = 2;

#[derive(Debug)]
struct PoseSlot {
    x: AtomicU32,
    y: AtomicU32,
    z: AtomicU32,
    pinch_strength: AtomicU32,
    flags: AtomicU32,
}

impl PoseSlot {
    fn new(pose: HandPose) -> Self {
        let slot = Self {
            x: AtomicU32::new(0),
            y: AtomicU32::new(0),
            z: AtomicU32::new(0),
            pinch_strength: AtomicU32::new(0),
            flags: AtomicU32::new(0),
        };
        slot.store(pose);
        slot
    }

    fn store(&self, pose: HandPose) {
        self.x.store(pose.x.to_bits(), Ordering::Relaxed);
        self.y.store(pose.y.to_bits(), Ordering::Relaxed);
        self.z.store(pose.z.to_bits(), Ordering::Relaxed);
        self.pinch_strength
            .store(pose.pinch_strength.to_bits(), Ordering::Relaxed);
        let mut flags = 0;
        if pose.active {
            flags |= FLAG_ACTIVE;
        }
        if pose.is_pinching {
            flags |= FLAG_PINCHING;
        }
        // Flags last: a reader that sees `active` sees at least this write's position.
        self.flags.store(flags, Ordering::Release);
    }

    fn load(&self) -> HandPose {
        let flags = self.flags.load(Ordering::Acquire);
        HandPose {
            x: f32::from_bits(self.x.load(Ordering::Relaxed)),
            y: f32::from_bits(self.y.load(Ordering::Relaxed)),
            z: f32::from_bits(self.z.load(Ordering::Relaxed)),
            is_pinching: flags & FLAG_PINCHING != 0,
            pinch_strength: f32::from_bits(self.pinch_strength.load(Ordering::Relaxed)),
            active: flags & FLAG_ACTIVE != 0,
        }
    }
}

/// Sole writer of the pose cell. Deliberately not `Clone`.
#[derive(Debug)]
pub struct PoseWriter {
    slot: Arc<PoseSlot>,
}

/// Cheap, cloneable read handle to the latest pose.
#[derive(Clone, Debug)]
pub struct PoseReader {
    slot: Arc<PoseSlot>,
}

/// Create a pose cell initialised to the inactive pose.
pub fn pose_cell() -> (PoseWriter, PoseReader) {
    let slot = Arc::new(PoseSlot::new(HandPose::inactive()));
    (
        PoseWriter {
            slot: Arc::clone(&slot),
        },
        PoseReader { slot },
    )
}

impl PoseWriter {
    pub fn publish(&mut self, pose: HandPose) {
        self.slot.store(pose);
    }

    /// Poll `source` once and publish the result.
    pub fn pump(&mut self, source: &mut impl PoseSource) -> HandPose {
        let pose = source.current_pose();
        self.publish(pose);
        pose
    }

    pub fn reader(&self) -> PoseReader {
        PoseReader {
            slot: Arc::clone(&self.slot),
        }
    }
}

impl PoseReader {
    pub fn latest(&self) -> HandPose {
        self.slot.load()
    }
}
