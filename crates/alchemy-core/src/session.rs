//! One running alchemy session: the logic loop, the reaction clock and the
//! particle field wired together behind a single `advance(dt)`.
//!
//! The front-end calls `advance` once per rendered frame. Inside, the 30 Hz
//! interaction tick and the 20 Hz reaction tick run as many times as the
//! elapsed time allows, then the field renders once.

use crate::composer::FluidComposer;
use crate::constants::{INTERACTION_TICK_HZ, REACTION_TICK_HZ};
use crate::elements::{PickableElement, ELEMENT_POOL};
use crate::field::{FieldConfig, ParticleField};
use crate::fluid::FluidPropertyRecord;
use crate::interaction::{InteractionConfig, InteractionEffect, InteractionMachine};
use crate::mixer::{MixConfig, MixEvent, MixOrchestrator, MixOutcome};
use crate::pose::PoseReader;
use crate::reaction::ReactionReader;
use crate::ticker::FixedTicker;
use std::sync::Arc;
use std::time::Duration;

#[derive(Clone, Debug)]
pub struct SessionConfig {
    pub elements: Vec<PickableElement>,
    pub initial_fluid: FluidPropertyRecord,
    pub interaction: InteractionConfig,
    pub mix: MixConfig,
    pub field: FieldConfig,
    pub interaction_hz: f32,
    pub reaction_hz: f32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            elements: ELEMENT_POOL.to_vec(),
            initial_fluid: FluidPropertyRecord::pure_water(),
            interaction: InteractionConfig::default(),
            mix: MixConfig::default(),
            field: FieldConfig::default(),
            interaction_hz: INTERACTION_TICK_HZ,
            reaction_hz: REACTION_TICK_HZ,
        }
    }
}

#[derive(Debug)]
pub enum SessionEvent {
    Interaction(InteractionEffect),
    Mix(MixEvent),
}

pub struct AlchemySession {
    poses: PoseReader,
    machine: InteractionMachine,
    mixer: MixOrchestrator,
    reaction: ReactionReader,
    fluid: FluidPropertyRecord,
    field: ParticleField,
    logic_clock: FixedTicker,
    reaction_clock: FixedTicker,
}

impl AlchemySession {
    pub fn new(poses: PoseReader, composer: Arc<dyn FluidComposer>, config: SessionConfig) -> Self {
        let reaction_clock = FixedTicker::new(config.reaction_hz);
        let mix_config = MixConfig {
            tick_period: reaction_clock.period(),
            ..config.mix
        };
        let mixer = MixOrchestrator::new(composer, mix_config);
        let field = ParticleField::new(&config.field, &config.initial_fluid);
        Self {
            poses,
            machine: InteractionMachine::new(config.elements, config.interaction),
            reaction: mixer.reaction_reader(),
            mixer,
            fluid: config.initial_fluid,
            field,
            logic_clock: FixedTicker::new(config.interaction_hz),
            reaction_clock,
        }
    }

    /// Run due logic/reaction ticks, then render one field frame.
    pub fn advance(&mut self, dt: Duration) -> Vec<SessionEvent> {
        let mut events = Vec::new();
        for _ in 0..self.logic_clock.advance(dt) {
            self.logic_tick(&mut events);
        }
        for _ in 0..self.reaction_clock.advance(dt) {
            self.reaction_tick(&mut events);
        }
        let pose = self.poses.latest();
        self.field
            .update(dt.as_secs_f32(), &pose, &self.fluid, self.reaction.get());
        events
    }

    /// One 30 Hz interaction tick.
    pub fn logic_tick(&mut self, events: &mut Vec<SessionEvent>) {
        let pose = self.poses.latest();
        for effect in self.machine.tick(&pose) {
            if let InteractionEffect::MixRequested(id) = effect {
                if let Some(element) = self.machine.element(id) {
                    let name = element.name;
                    if self.mixer.trigger(&self.fluid, name) == MixOutcome::Busy {
                        log::info!("[interaction] {} dropped while mixing, no effect", name);
                    }
                }
            }
            events.push(SessionEvent::Interaction(effect));
        }
    }

    /// One 20 Hz reaction tick.
    pub fn reaction_tick(&mut self, events: &mut Vec<SessionEvent>) {
        if let Some(ev) = self.mixer.tick(&mut self.fluid) {
            events.push(SessionEvent::Mix(ev));
        }
    }

    pub fn fluid(&self) -> &FluidPropertyRecord {
        &self.fluid
    }

    pub fn machine(&self) -> &InteractionMachine {
        &self.machine
    }

    pub fn mixer(&self) -> &MixOrchestrator {
        &self.mixer
    }

    pub fn field(&self) -> &ParticleField {
        &self.field
    }

    pub fn field_mut(&mut self) -> &mut ParticleField {
        &mut self.field
    }
}
