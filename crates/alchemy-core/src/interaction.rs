//! Hover / grab / drop state machine driven by hand poses on a fixed tick.
//!
//! [`transition`] is a pure function of `(state, pose, targets)`; the
//! [`InteractionMachine`] wraps it with the detection-edge bookkeeping and
//! logging and is what the logic loop calls 30 times a second.

use crate::constants::{
    DROP_ZONE_CENTER, DROP_ZONE_RADIUS, GRAB_THRESHOLD, HIT_RADIUS, RELEASE_THRESHOLD,
};
use crate::elements::{find_element, ElementId, PickableElement};
use crate::pose::HandPose;
use glam::Vec2;
use smallvec::SmallVec;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum InteractionState {
    #[default]
    Idle,
    Hovering(ElementId),
    Dragging(ElementId),
}

impl InteractionState {
    pub fn hovered(&self) -> Option<ElementId> {
        match *self {
            InteractionState::Hovering(id) => Some(id),
            _ => None,
        }
    }

    pub fn held(&self) -> Option<ElementId> {
        match *self {
            InteractionState::Dragging(id) => Some(id),
            _ => None,
        }
    }
}

/// Side effects produced by one tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum InteractionEffect {
    DetectionLost,
    DetectionRegained,
    HoverChanged(Option<ElementId>),
    Grabbed(ElementId),
    /// The held element was let go; `in_drop_zone` tells whether it landed in the cauldron.
    Released {
        element: ElementId,
        in_drop_zone: bool,
    },
    /// A successful drop: the mixer should be invoked with this element.
    MixRequested(ElementId),
}

pub type Effects = SmallVec<[InteractionEffect; 4]>;

/// Hit-test and hysteresis parameters. Defaults come from `constants.rs`.
#[derive(Clone, Debug)]
pub struct InteractionConfig {
    pub hit_radius: f32,
    pub grab_threshold: f32,
    pub release_threshold: f32,
    pub drop_center: Vec2,
    pub drop_radius: f32,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            hit_radius: HIT_RADIUS,
            grab_threshold: GRAB_THRESHOLD,
            release_threshold: RELEASE_THRESHOLD,
            drop_center: Vec2::from(DROP_ZONE_CENTER),
            drop_radius: DROP_ZONE_RADIUS,
        }
    }
}

/// First target (in declaration order) within `radius` of `point`, skipping `exclude`.
pub fn hit_test(
    point: Vec2,
    targets: &[PickableElement],
    radius: f32,
    exclude: Option<ElementId>,
) -> Option<ElementId> {
    targets
        .iter()
        .filter(|t| Some(t.id) != exclude)
        .find(|t| point.distance(t.position()) < radius)
        .map(|t| t.id)
}

/// Advance the state machine by one tick.
///
/// An inactive pose leaves the state untouched: a tracking dropout never
/// cancels a drag and never changes the hover.
pub fn transition(
    state: InteractionState,
    pose: &HandPose,
    targets: &[PickableElement],
    cfg: &InteractionConfig,
) -> (InteractionState, Effects) {
    let mut effects = Effects::new();
    if !pose.active {
        return (state, effects);
    }
    let hand = pose.position();

    let next = match state {
        InteractionState::Idle | InteractionState::Hovering(_) => {
            match hit_test(hand, targets, cfg.hit_radius, state.held()) {
                Some(id) if pose.pinch_strength > cfg.grab_threshold => {
                    effects.push(InteractionEffect::Grabbed(id));
                    InteractionState::Dragging(id)
                }
                Some(id) => InteractionState::Hovering(id),
                None => InteractionState::Idle,
            }
        }
        InteractionState::Dragging(id) => {
            if pose.pinch_strength < cfg.release_threshold {
                let in_drop_zone = hand.distance(cfg.drop_center) < cfg.drop_radius;
                effects.push(InteractionEffect::Released {
                    element: id,
                    in_drop_zone,
                });
                if in_drop_zone {
                    effects.push(InteractionEffect::MixRequested(id));
                }
                InteractionState::Idle
            } else {
                state
            }
        }
    };

    if next.hovered() != state.hovered() {
        effects.insert(0, InteractionEffect::HoverChanged(next.hovered()));
    }
    (next, effects)
}

/// Stateful wrapper around [`transition`] owned by the logic loop.
pub struct InteractionMachine {
    state: InteractionState,
    detected: bool,
    targets: Vec<PickableElement>,
    config: InteractionConfig,
}

impl InteractionMachine {
    pub fn new(targets: Vec<PickableElement>, config: InteractionConfig) -> Self {
        Self {
            state: InteractionState::Idle,
            detected: false,
            targets,
            config,
        }
    }

    pub fn tick(&mut self, pose: &HandPose) -> Effects {
        let (next, mut effects) = transition(self.state, pose, &self.targets, &self.config);

        if pose.active != self.detected {
            self.detected = pose.active;
            let edge = if pose.active {
                log::info!("[interaction] hand detected");
                InteractionEffect::DetectionRegained
            } else {
                log::info!("[interaction] detection lost (state {:?} kept)", self.state);
                InteractionEffect::DetectionLost
            };
            effects.insert(0, edge);
        }

        for effect in &effects {
            match effect {
                InteractionEffect::Grabbed(id) => log::info!("[interaction] grabbed {}", id.0),
                InteractionEffect::Released {
                    element,
                    in_drop_zone,
                } => log::info!(
                    "[interaction] released {} ({})",
                    element.0,
                    if *in_drop_zone { "in cauldron" } else { "outside" }
                ),
                _ => {}
            }
        }

        self.state = next;
        effects
    }

    pub fn state(&self) -> InteractionState {
        self.state
    }

    pub fn hovered(&self) -> Option<&PickableElement> {
        self.state
            .hovered()
            .and_then(|id| find_element(&self.targets, id))
    }

    pub fn held(&self) -> Option<&PickableElement> {
        self.state
            .held()
            .and_then(|id| find_element(&self.targets, id))
    }

    pub fn element(&self, id: ElementId) -> Option<&PickableElement> {
        find_element(&self.targets, id)
    }

    pub fn is_hand_detected(&self) -> bool {
        self.detected
    }

    pub fn targets(&self) -> &[PickableElement] {
        &self.targets
    }
}
