use crate::sim::{Event, EventKind, SimTime, Simulator, World};
use std::any::Any;
use std::sync::{Arc, Mutex};

#[derive(Default)]
struct DummyWorld {
    ticks: usize,
}

impl World for DummyWorld {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn on_tick(&mut self, _sim: &mut Simulator) {
        self.ticks = self.ticks.saturating_add(1);
    }
}

struct Push {
    id: u32,
    kind: EventKind,
    log: Arc<Mutex<Vec<u32>>>,
}

impl Event for Push {
    fn kind(&self) -> EventKind {
        self.kind
    }

    fn execute(self: Box<Self>, _sim: &mut Simulator, _world: &mut dyn World) {
        let Push { id, log, .. } = *self;
        log.lock().expect("log lock").push(id);
    }
}

fn push(id: u32, kind: EventKind, log: &Arc<Mutex<Vec<u32>>>) -> Push {
    Push {
        id,
        kind,
        log: Arc::clone(log),
    }
}

/// 在同一时刻不断重新调度自己，直到计数用完
struct Spin {
    kind: EventKind,
    left: u32,
}

impl Event for Spin {
    fn kind(&self) -> EventKind {
        self.kind
    }

    fn execute(self: Box<Self>, sim: &mut Simulator, _world: &mut dyn World) {
        if self.left > 0 {
            sim.schedule(
                sim.now(),
                Spin {
                    kind: self.kind,
                    left: self.left - 1,
                },
            );
        }
    }
}

struct RecordCurrent {
    seen: Arc<Mutex<Vec<Option<u64>>>>,
}

impl Event for RecordCurrent {
    fn kind(&self) -> EventKind {
        EventKind::FlowProcessing
    }

    fn execute(self: Box<Self>, sim: &mut Simulator, _world: &mut dyn World) {
        self.seen
            .lock()
            .expect("seen lock")
            .push(sim.current_event().map(|id| id.0));
    }
}

#[test]
fn events_order_by_time_then_kind_then_insertion() {
    let log = Arc::new(Mutex::new(Vec::new()));

    let mut sim = Simulator::default();
    sim.schedule(SimTime(10.0), push(1, EventKind::QueueProcessing, &log));
    sim.schedule(SimTime(5.0), push(2, EventKind::PacketQueuing, &log));
    sim.schedule(SimTime(10.0), push(3, EventKind::FlowArrival, &log));
    sim.schedule(SimTime(10.0), push(4, EventKind::QueueProcessing, &log));

    let mut world = DummyWorld::default();
    let summary = sim.run(&mut world);

    assert_eq!(&*log.lock().expect("log lock"), &[2, 3, 1, 4]);
    assert_eq!(summary.processed, 4);
    assert_eq!(world.ticks, 4);
    assert_eq!(sim.now(), SimTime(10.0));
}

#[test]
fn times_within_epsilon_are_ordered_by_kind() {
    let log = Arc::new(Mutex::new(Vec::new()));

    let mut sim = Simulator::default();
    sim.schedule(SimTime(0.0), push(1, EventKind::QueueProcessing, &log));
    sim.schedule(SimTime(1e-16), push(2, EventKind::FlowArrival, &log));
    sim.run(&mut DummyWorld::default());

    assert_eq!(&*log.lock().expect("log lock"), &[2, 1]);
}

#[test]
fn cancelled_events_are_skipped() {
    let log = Arc::new(Mutex::new(Vec::new()));

    let mut sim = Simulator::default();
    let h = sim.schedule(SimTime(1.0), push(1, EventKind::RetxTimeout, &log));
    sim.schedule(SimTime(2.0), push(2, EventKind::RetxTimeout, &log));
    assert_eq!(sim.pending(), 2);

    assert!(sim.cancel(h.id));
    assert!(!sim.cancel(h.id));
    assert!(!sim.is_pending(h.id));
    assert_eq!(sim.pending(), 1);

    let summary = sim.run(&mut DummyWorld::default());
    assert_eq!(&*log.lock().expect("log lock"), &[2]);
    assert_eq!(summary.processed, 1);
    assert_eq!(summary.skipped_cancelled, 1);
    assert!(!sim.cancel(h.id));
}

#[test]
fn run_until_leaves_later_events_pending() {
    let log = Arc::new(Mutex::new(Vec::new()));

    let mut sim = Simulator::default();
    sim.schedule(SimTime(1.0), push(1, EventKind::FlowArrival, &log));
    sim.schedule(SimTime(3.0), push(2, EventKind::FlowArrival, &log));

    let mut world = DummyWorld::default();
    let summary = sim.run_until(SimTime(2.0), &mut world);
    assert_eq!(summary.processed, 1);
    assert_eq!(sim.now(), SimTime(2.0));
    assert_eq!(sim.pending(), 1);

    sim.run(&mut world);
    assert_eq!(&*log.lock().expect("log lock"), &[1, 2]);
}

#[test]
fn current_event_is_set_only_during_execution() {
    let seen = Arc::new(Mutex::new(Vec::new()));

    let mut sim = Simulator::default();
    let h = sim.schedule(
        SimTime(1.0),
        RecordCurrent {
            seen: Arc::clone(&seen),
        },
    );
    assert_eq!(sim.current_event(), None);
    sim.run(&mut DummyWorld::default());

    assert_eq!(&*seen.lock().expect("seen lock"), &[Some(h.id.0)]);
    assert_eq!(sim.current_event(), None);
}

#[test]
fn watchdog_stops_a_same_kind_loop() {
    let mut sim = Simulator::with_watchdog_limit(10);
    sim.schedule(
        SimTime(0.0),
        Spin {
            kind: EventKind::PacketQueuing,
            left: 1_000,
        },
    );
    let summary = sim.run(&mut DummyWorld::default());

    let dead = summary.dead_loop.expect("watchdog should fire");
    assert_eq!(dead.kind, EventKind::PacketQueuing);
    assert_eq!(summary.processed, 12);
}

#[test]
fn watchdog_ignores_logging_events() {
    let mut sim = Simulator::with_watchdog_limit(10);
    sim.schedule(
        SimTime(0.0),
        Spin {
            kind: EventKind::Logging,
            left: 50,
        },
    );
    let summary = sim.run(&mut DummyWorld::default());

    assert!(summary.dead_loop.is_none());
    assert_eq!(summary.processed, 51);
}
