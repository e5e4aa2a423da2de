//! Mix orchestration: one composer request per successful drop, wrapped in a
//! reaction burst that always plays out and always ends.
//!
//! Lifecycle of a mix:
//!
//! ```text
//! Idle --trigger--> Awaiting --reply/failure/timeout--> Cooling --reaction hits 0--> Idle
//!        reaction := 1.0        reaction held at 1.0           reaction *= 0.9 per tick
//! ```
//!
//! The request runs on a worker thread and reports through a channel that is
//! polled from [`MixOrchestrator::tick`]. Dropping the orchestrator drops the
//! receiver, so a late reply lands nowhere.

use crate::composer::{ComposerError, FluidComposer};
use crate::constants::{
    COMPOSER_TIMEOUT_SEC, REACTION_DECAY_FACTOR, REACTION_EPSILON, REACTION_TICK_HZ,
};
use crate::fluid::{fallback_merge, FluidPropertyRecord, PartialFluidRecord};
use crate::reaction::{decay_step, reaction_cell, ReactionReader, ReactionWriter};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

type Reply = Result<PartialFluidRecord, ComposerError>;

#[derive(Clone, Debug)]
pub struct MixConfig {
    pub decay_factor: f32,
    pub epsilon: f32,
    /// Duration of one `tick` call.
    pub tick_period: Duration,
    pub timeout: Duration,
    /// Fills whatever the composer leaves out.
    pub fallback: FluidPropertyRecord,
}

impl Default for MixConfig {
    fn default() -> Self {
        Self {
            decay_factor: REACTION_DECAY_FACTOR,
            epsilon: REACTION_EPSILON,
            tick_period: Duration::from_secs_f32(1.0 / REACTION_TICK_HZ),
            timeout: Duration::from_secs_f32(COMPOSER_TIMEOUT_SEC),
            fallback: FluidPropertyRecord::liquid_void(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MixPhase {
    Idle,
    Awaiting,
    Cooling,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MixOutcome {
    Started,
    /// A mix is already in progress; this one was dropped.
    Busy,
}

#[derive(Debug)]
pub enum MixEvent {
    /// The current record was replaced; carries the new fluid's name.
    Composed(String),
    /// The composer failed; the current record is unchanged.
    Failed(ComposerError),
    /// The reaction reached 0 and the mixer accepts new drops again.
    Settled,
}

pub struct MixOrchestrator {
    composer: Arc<dyn FluidComposer>,
    reaction: ReactionWriter,
    phase: MixPhase,
    pending: Option<Receiver<Reply>>,
    waited: Duration,
    requests_issued: u64,
    config: MixConfig,
}

impl MixOrchestrator {
    pub fn new(composer: Arc<dyn FluidComposer>, config: MixConfig) -> Self {
        let (reaction, _) = reaction_cell();
        Self {
            composer,
            reaction,
            phase: MixPhase::Idle,
            pending: None,
            waited: Duration::ZERO,
            requests_issued: 0,
            config,
        }
    }

    /// Start a mix of `ingredient` into `current`.
    ///
    /// The reaction is raised to 1.0 before the request leaves, so the burst
    /// is visible however slow or broken the composer turns out to be.
    pub fn trigger(&mut self, current: &FluidPropertyRecord, ingredient: &str) -> MixOutcome {
        if self.phase != MixPhase::Idle {
            log::info!(
                "[mix] ignoring {} while a mix is {:?}",
                ingredient,
                self.phase
            );
            return MixOutcome::Busy;
        }
        self.reaction.set(1.0);
        self.phase = MixPhase::Awaiting;
        self.waited = Duration::ZERO;
        self.requests_issued += 1;

        let (tx, rx) = mpsc::channel::<Reply>();
        let composer = Arc::clone(&self.composer);
        let current = current.clone();
        let ingredient_owned = ingredient.to_string();
        // Composers cannot be cancelled. A request that outlives its timeout
        // keeps its worker until `compose` returns; the number in the thread
        // name tells such stragglers apart.
        let spawned = thread::Builder::new()
            .name(format!("fluid-composer-{}", self.requests_issued))
            .spawn(move || {
                let reply = composer.compose(&current, &ingredient_owned);
                // Receiver gone means the mixer was torn down; nothing to do.
                _ = tx.send(reply);
            });

        match spawned {
            Ok(_) => {
                log::info!("[mix] composing {} into the cauldron", ingredient);
                self.pending = Some(rx);
            }
            Err(e) => {
                log::warn!("[mix] could not start composer worker: {e}");
                self.pending = None;
                self.phase = MixPhase::Cooling;
            }
        }
        MixOutcome::Started
    }

    /// Advance by one reaction tick. Applies a composer reply to `current`
    /// when one has arrived.
    pub fn tick(&mut self, current: &mut FluidPropertyRecord) -> Option<MixEvent> {
        match self.phase {
            MixPhase::Idle => None,
            MixPhase::Awaiting => self.poll_reply(current),
            MixPhase::Cooling => {
                let next = decay_step(
                    self.reaction.get(),
                    self.config.decay_factor,
                    self.config.epsilon,
                );
                self.reaction.set(next);
                if next == 0.0 {
                    self.phase = MixPhase::Idle;
                    log::info!("[mix] reaction settled");
                    Some(MixEvent::Settled)
                } else {
                    None
                }
            }
        }
    }

    fn poll_reply(&mut self, current: &mut FluidPropertyRecord) -> Option<MixEvent> {
        let Some(rx) = &self.pending else {
            self.phase = MixPhase::Cooling;
            return None;
        };
        let reply = match rx.try_recv() {
            Ok(reply) => reply,
            Err(TryRecvError::Empty) => {
                self.waited += self.config.tick_period;
                if self.waited < self.config.timeout {
                    return None;
                }
                Err(ComposerError::Timeout(self.waited))
            }
            Err(TryRecvError::Disconnected) => Err(ComposerError::Transport(
                "composer worker exited without replying".into(),
            )),
        };
        self.pending = None;
        self.phase = MixPhase::Cooling;

        match reply {
            Ok(partial) => {
                *current = fallback_merge(&partial, &self.config.fallback);
                log::info!(
                    "[mix] fluid is now {} (flow {:.2}, chaos {:.2})",
                    current.name,
                    current.flow_speed,
                    current.chaos
                );
                Some(MixEvent::Composed(current.name.clone()))
            }
            Err(e) => {
                log::warn!("[mix] composer failed, keeping {}: {e}", current.name);
                Some(MixEvent::Failed(e))
            }
        }
    }

    pub fn phase(&self) -> MixPhase {
        self.phase
    }

    pub fn is_mixing(&self) -> bool {
        self.phase != MixPhase::Idle
    }

    pub fn reaction(&self) -> f32 {
        self.reaction.get()
    }

    pub fn reaction_reader(&self) -> ReactionReader {
        self.reaction.reader()
    }

    pub fn requests_issued(&self) -> u64 {
        self.requests_issued
    }
}
