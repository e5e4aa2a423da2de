// Host-side tests for the mix orchestrator and the reaction timeline.
// Composers here are scripted; the gated one blocks until the test lets it go.

use alchemy_core::*;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

struct InstantComposer {
    reply: PartialFluidRecord,
}

impl FluidComposer for InstantComposer {
    fn compose(
        &self,
        _current: &FluidPropertyRecord,
        _ingredient: &str,
    ) -> Result<PartialFluidRecord, ComposerError> {
        Ok(self.reply.clone())
    }
}

struct FailingComposer;

impl FluidComposer for FailingComposer {
    fn compose(
        &self,
        _current: &FluidPropertyRecord,
        _ingredient: &str,
    ) -> Result<PartialFluidRecord, ComposerError> {
        Err(ComposerError::Unavailable("service offline".into()))
    }
}

/// Answers with raw reply text, parsed the way a remote composer's would be.
struct WireComposer {
    text: &'static str,
}

impl FluidComposer for WireComposer {
    fn compose(
        &self,
        _current: &FluidPropertyRecord,
        _ingredient: &str,
    ) -> Result<PartialFluidRecord, ComposerError> {
        parse_reply(self.text)
    }
}

/// Records the name of the thread each call runs on.
#[derive(Default)]
struct NamingComposer {
    names: Mutex<Vec<String>>,
}

impl FluidComposer for NamingComposer {
    fn compose(
        &self,
        _current: &FluidPropertyRecord,
        _ingredient: &str,
    ) -> Result<PartialFluidRecord, ComposerError> {
        let name = thread::current().name().unwrap_or_default().to_string();
        self.names.lock().unwrap().push(name);
        Err(ComposerError::Unavailable("only counting".into()))
    }
}

struct PanickingComposer;

impl FluidComposer for PanickingComposer {
    fn compose(
        &self,
        _current: &FluidPropertyRecord,
        _ingredient: &str,
    ) -> Result<PartialFluidRecord, ComposerError> {
        panic!("composer crashed");
    }
}

/// Blocks each call until the test sends on the gate. Counts calls.
struct GatedComposer {
    gate: Mutex<Receiver<()>>,
    calls: AtomicUsize,
    finished: AtomicBool,
}

impl GatedComposer {
    fn new() -> (Arc<Self>, Sender<()>) {
        let (tx, rx) = mpsc::channel();
        let composer = Arc::new(Self {
            gate: Mutex::new(rx),
            calls: AtomicUsize::new(0),
            finished: AtomicBool::new(false),
        });
        (composer, tx)
    }
}

impl FluidComposer for GatedComposer {
    fn compose(
        &self,
        _current: &FluidPropertyRecord,
        ingredient: &str,
    ) -> Result<PartialFluidRecord, ComposerError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let opened = self.gate.lock().unwrap().recv();
        self.finished.store(true, Ordering::SeqCst);
        opened.map_err(|_| ComposerError::Transport("gate dropped".into()))?;
        Ok(PartialFluidRecord {
            name: Some(format!("{ingredient} Brew")),
            ..PartialFluidRecord::default()
        })
    }
}

fn patient_config() -> MixConfig {
    MixConfig {
        timeout: Duration::from_secs(3600),
        ..MixConfig::default()
    }
}

/// Tick until an event comes out, sleeping briefly between ticks.
fn next_event(mixer: &mut MixOrchestrator, fluid: &mut FluidPropertyRecord) -> MixEvent {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        if let Some(ev) = mixer.tick(fluid) {
            return ev;
        }
        assert!(Instant::now() < deadline, "mixer produced no event");
        thread::sleep(Duration::from_millis(1));
    }
}

fn wait_for(what: &str, cond: impl Fn() -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while !cond() {
        assert!(Instant::now() < deadline, "timed out waiting for {what}");
        thread::sleep(Duration::from_millis(1));
    }
}

/// Tick a cooling mixer until it settles; returns the number of ticks.
fn ticks_until_settled(mixer: &mut MixOrchestrator, fluid: &mut FluidPropertyRecord) -> u32 {
    let mut ticks = 0;
    loop {
        ticks += 1;
        assert!(ticks < 1000, "reaction never settled");
        if let Some(MixEvent::Settled) = mixer.tick(fluid) {
            return ticks;
        }
    }
}

#[test]
fn decay_reaches_epsilon_then_exactly_zero() {
    assert!(decay(1.0, 29) <= REACTION_EPSILON);
    assert!(decay(1.0, 29) > 0.0);
    assert_eq!(decay(1.0, 30), 0.0);
    assert_eq!(
        ticks_to_settle(1.0, REACTION_DECAY_FACTOR, REACTION_EPSILON),
        30
    );
    assert_eq!(decay_step(0.0, 0.9, 0.05), 0.0);
    assert_eq!(decay_step(0.05, 0.9, 0.05), 0.0);
}

#[test]
fn decay_is_monotonic_and_bounded() {
    let mut v = 1.0;
    for _ in 0..40 {
        let next = decay_step(v, REACTION_DECAY_FACTOR, REACTION_EPSILON);
        assert!(next <= v);
        assert!((0.0..=1.0).contains(&next));
        v = next;
    }
    assert_eq!(v, 0.0);
}

#[test]
fn reaction_cell_clamps_and_shares() {
    let (mut writer, reader) = reaction_cell();
    let second = writer.reader();
    writer.set(1.7);
    assert_eq!(reader.get(), 1.0);
    writer.set(-3.0);
    assert_eq!(second.get(), 0.0);
    writer.set(0.25);
    assert_eq!(reader.get(), 0.25);
}

#[test]
fn reaction_is_raised_before_the_composer_answers() {
    let (composer, gate) = GatedComposer::new();
    let mut mixer = MixOrchestrator::new(composer.clone(), patient_config());
    let reader = mixer.reaction_reader();
    let fluid = FluidPropertyRecord::pure_water();

    assert_eq!(mixer.trigger(&fluid, "Ignis"), MixOutcome::Started);
    assert_eq!(mixer.reaction(), 1.0);
    assert_eq!(reader.get(), 1.0);
    assert_eq!(mixer.phase(), MixPhase::Awaiting);
    drop(gate);
}

#[test]
fn reaction_holds_while_awaiting() {
    let (composer, gate) = GatedComposer::new();
    let mut mixer = MixOrchestrator::new(composer.clone(), patient_config());
    let mut fluid = FluidPropertyRecord::pure_water();
    mixer.trigger(&fluid, "Aqua");
    for _ in 0..20 {
        assert!(mixer.tick(&mut fluid).is_none());
        assert_eq!(mixer.reaction(), 1.0);
    }
    drop(gate);
}

#[test]
fn second_trigger_while_mixing_is_ignored() {
    let (composer, gate) = GatedComposer::new();
    let mut mixer = MixOrchestrator::new(composer.clone(), patient_config());
    let mut fluid = FluidPropertyRecord::pure_water();

    assert_eq!(mixer.trigger(&fluid, "Ignis"), MixOutcome::Started);
    assert_eq!(mixer.trigger(&fluid, "Aqua"), MixOutcome::Busy);
    wait_for("first composer call", || {
        composer.calls.load(Ordering::SeqCst) == 1
    });
    assert_eq!(mixer.requests_issued(), 1);

    gate.send(()).unwrap();
    match next_event(&mut mixer, &mut fluid) {
        MixEvent::Composed(name) => assert_eq!(name, "Ignis Brew"),
        other => panic!("unexpected {other:?}"),
    }

    // Still cooling: drops are ignored until the reaction settles.
    assert_eq!(mixer.phase(), MixPhase::Cooling);
    assert_eq!(mixer.trigger(&fluid, "Terra"), MixOutcome::Busy);
    ticks_until_settled(&mut mixer, &mut fluid);

    assert!(!mixer.is_mixing());
    assert_eq!(mixer.trigger(&fluid, "Terra"), MixOutcome::Started);
    assert_eq!(mixer.requests_issued(), 2);
    drop(gate);
}

#[test]
fn composed_record_is_filled_from_the_void_fallback() {
    let composer = Arc::new(InstantComposer {
        reply: PartialFluidRecord {
            name: Some("Boiling Water".into()),
            flow_speed: Some(0.9),
            base_color: Some("not a color".into()),
            chaos: Some(-2.0),
            ..PartialFluidRecord::default()
        },
    });
    let mut mixer = MixOrchestrator::new(composer, patient_config());
    let mut fluid = FluidPropertyRecord::pure_water();
    mixer.trigger(&fluid, "Ignis");
    assert!(matches!(
        next_event(&mut mixer, &mut fluid),
        MixEvent::Composed(_)
    ));

    let void = FluidPropertyRecord::liquid_void();
    assert_eq!(fluid.name, "Boiling Water");
    assert_eq!(fluid.flow_speed, 0.9);
    assert_eq!(fluid.base_color, void.base_color);
    assert_eq!(fluid.chaos, 0.0);
    assert_eq!(fluid.viscosity, void.viscosity);
    assert_eq!(fluid.description, void.description);
}

#[test]
fn failure_keeps_the_record_and_still_settles() {
    let mut mixer = MixOrchestrator::new(Arc::new(FailingComposer), patient_config());
    let before = FluidPropertyRecord::pure_water();
    let mut fluid = before.clone();

    mixer.trigger(&fluid, "Ignis");
    match next_event(&mut mixer, &mut fluid) {
        MixEvent::Failed(ComposerError::Unavailable(_)) => {}
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(fluid, before);
    assert_eq!(mixer.reaction(), 1.0);

    let ticks = ticks_until_settled(&mut mixer, &mut fluid);
    assert_eq!(ticks, 30);
    assert_eq!(mixer.reaction(), 0.0);
    assert_eq!(mixer.phase(), MixPhase::Idle);
    assert_eq!(fluid, before);
}

#[test]
fn non_object_reply_is_malformed_and_keeps_the_record() {
    let mut mixer = MixOrchestrator::new(Arc::new(WireComposer { text: "[]" }), patient_config());
    let before = FluidPropertyRecord::pure_water();
    let mut fluid = before.clone();
    mixer.trigger(&fluid, "Aqua");
    match next_event(&mut mixer, &mut fluid) {
        MixEvent::Failed(ComposerError::Malformed(_)) => {}
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(fluid, before);
    ticks_until_settled(&mut mixer, &mut fluid);
    assert_eq!(fluid.name, "Pure Water");
}

#[test]
fn each_request_runs_on_its_own_numbered_worker() {
    let composer = Arc::new(NamingComposer::default());
    let mut mixer = MixOrchestrator::new(composer.clone(), patient_config());
    let mut fluid = FluidPropertyRecord::pure_water();
    for ingredient in ["Ignis", "Aqua"] {
        mixer.trigger(&fluid, ingredient);
        next_event(&mut mixer, &mut fluid);
        ticks_until_settled(&mut mixer, &mut fluid);
    }
    let names = composer.names.lock().unwrap().clone();
    assert_eq!(names, ["fluid-composer-1", "fluid-composer-2"]);
}

#[test]
fn crashed_worker_is_reported_as_transport_failure() {
    let mut mixer = MixOrchestrator::new(Arc::new(PanickingComposer), patient_config());
    let mut fluid = FluidPropertyRecord::pure_water();
    mixer.trigger(&fluid, "Aer");
    match next_event(&mut mixer, &mut fluid) {
        MixEvent::Failed(ComposerError::Transport(_)) => {}
        other => panic!("unexpected {other:?}"),
    }
    ticks_until_settled(&mut mixer, &mut fluid);
    assert_eq!(fluid, FluidPropertyRecord::pure_water());
}

#[test]
fn unanswered_request_times_out() {
    let (composer, gate) = GatedComposer::new();
    let config = MixConfig {
        timeout: Duration::from_millis(150),
        tick_period: Duration::from_millis(50),
        ..MixConfig::default()
    };
    let mut mixer = MixOrchestrator::new(composer.clone(), config);
    let mut fluid = FluidPropertyRecord::pure_water();
    mixer.trigger(&fluid, "Terra");

    assert!(mixer.tick(&mut fluid).is_none());
    assert!(mixer.tick(&mut fluid).is_none());
    match mixer.tick(&mut fluid) {
        Some(MixEvent::Failed(ComposerError::Timeout(waited))) => {
            assert_eq!(waited, Duration::from_millis(150))
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(mixer.phase(), MixPhase::Cooling);

    // A reply after the timeout is discarded.
    gate.send(()).unwrap();
    ticks_until_settled(&mut mixer, &mut fluid);
    assert_eq!(fluid, FluidPropertyRecord::pure_water());
}

#[test]
fn reply_after_teardown_is_dropped() {
    let (composer, gate) = GatedComposer::new();
    let mut mixer = MixOrchestrator::new(composer.clone(), patient_config());
    let fluid = FluidPropertyRecord::pure_water();
    mixer.trigger(&fluid, "Ignis");
    wait_for("composer call", || composer.calls.load(Ordering::SeqCst) == 1);

    drop(mixer);
    gate.send(()).unwrap();
    wait_for("composer to return", || {
        composer.finished.load(Ordering::SeqCst)
    });
}
