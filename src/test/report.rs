use super::{flow_desc, two_hosts};
use crate::net::NetWorld;
use crate::report::{Bucket, FlowRecord, Logging, Summary};
use crate::sim::{SimTime, Simulator};

fn record() -> FlowRecord {
    FlowRecord {
        id: 3,
        size: 4380,
        src: 0,
        dst: 1,
        start_us: 0.0,
        finish_us: 5.664,
        fct_us: 5.664,
        oracle_us: 6.8,
        slowdown: 5.664 / 6.8,
        sent: 3,
        size_pkts: 3,
        received: 3,
        data_drop: 0,
        ack_drop: 0,
        drop: 0,
        first_byte_us: 0.0,
        deadline_met: None,
    }
}

#[test]
fn flow_line_layout() {
    assert_eq!(
        record().line(),
        "3 4380 0 1 0.0000 5.6640 5.6640 6.8000 0.8329 3/3//3 0/0/0 0.0000"
    );
}

#[test]
fn bucket_percentile_uses_the_floor_index() {
    let mut b = Bucket::default();
    assert_eq!(b.percentile(0.99), -1.0);
    assert_eq!(b.avg(), 0.0);

    for v in [5.0, 1.0, 4.0, 2.0, 3.0] {
        b.push(v);
    }
    assert_eq!(b.len(), 5);
    assert_eq!(b.avg(), 3.0);
    assert_eq!(b.percentile(0.99), 5.0);
    assert_eq!(b.percentile(0.5), 3.0);
    assert_eq!(b.percentile(1.0), 5.0);

    let mut hundred = Bucket::default();
    for v in 1..=100 {
        hundred.push(v as f64);
    }
    assert_eq!(hundred.percentile(0.99), 100.0);
}

#[test]
fn summary_of_a_finished_run() {
    let mut world = NetWorld::new(two_hosts("queue_type: 1\nflow_type: 1\n"));
    world.run(&[flow_desc(0, 0.0, 3 * 1460, 0, 1)]);
    let r = &world.net.results[0];
    assert!((r.slowdown - r.fct_us / r.oracle_us).abs() < 1e-9);

    let summary = Summary::from_network(&world.net);
    assert_eq!(summary.finished, 1);
    assert_eq!(summary.small.len(), 1);
    assert!(summary.medium.is_empty());
    assert_eq!(summary.mean_inflation, 1.0);
    assert!(summary.deadline_met.is_none());

    let lines = summary.lines();
    assert_eq!(lines.len(), 4);
    assert!(lines[0].starts_with("AverageFCT 5.6640 MeanSlowdown "), "{}", lines[0]);
    assert!(lines[1].starts_with("[0,100k]avg: "));
    assert!(lines[1].contains("[100k,10m]99p: -1.0000"));
    assert_eq!(lines[2], "Hop:0 Drp:0(0%) Hop:1 Drp:0(0%) Hop:2 Drp:0(0%) Hop:3 Drp:0(0%)");
    assert_eq!(lines[3], "DeadPackets 0 DuplicatedPackets 0 DataPktDropRate 0.0000 Finished 1/1");
}

#[test]
fn unfinished_flows_are_listed_first() {
    let mut world = NetWorld::new(two_hosts(""));
    world.net.add_flow(&flow_desc(3, 0.0, 4380, 0, 1));

    let summary = Summary::from_network(&world.net);
    assert_eq!(summary.finished, 0);
    assert_eq!(summary.average_fct_us, 0.0);
    let lines = summary.lines();
    assert_eq!(lines[0], "unfinished flow size:4380 id:3 next_seq:0 recv:0 src:0 dst:1");
    assert!(lines.last().is_some_and(|l| l.ends_with("Finished 0/1")));
}

#[test]
fn deadline_ratio_is_reported_when_enabled() {
    let mut world = NetWorld::new(two_hosts("deadline: 1\n"));
    let mut met = flow_desc(0, 0.0, 1460, 0, 1);
    met.deadline = Some(SimTime::from_secs(1.0));
    let mut missed = flow_desc(1, 0.0, 1460, 1, 0);
    missed.deadline = Some(SimTime::from_micros(0.5));
    world.run(&[met, missed]);

    let summary = Summary::from_network(&world.net);
    assert_eq!(summary.deadline_met, Some(0.5));
    assert!(summary.lines()[0].ends_with(" DL:0.5000"));
}

#[test]
fn progress_logging_stops_with_an_empty_queue() {
    let mut world = NetWorld::new(two_hosts(""));
    let mut sim = Simulator::default();
    sim.schedule(SimTime::ZERO, Logging);
    let summary = sim.run(&mut world);
    assert_eq!(summary.processed, 1);
    assert_eq!(sim.pending(), 0);
}
