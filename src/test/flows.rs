use super::{flow_desc, traced_world, two_hosts, tx_starts};
use crate::flow::{CongestionPolicy, Flow, PFABRIC_INITIAL_SSTHRESH};
use crate::net::{FlowId, Hop, NetWorld, NodeId};
use crate::sim::{SimTime, Simulator};
use crate::viz::VizEventKind;

const MSS: u64 = 1460;

#[test]
fn three_segment_flow_departs_back_to_back_and_finishes_once() {
    let mut world = traced_world(two_hosts("queue_type: 1\nflow_type: 1\n"));
    let summary = world.run(&[flow_desc(0, 0.0, 3 * MSS, 0, 1)]);
    assert!(summary.dead_loop.is_none());

    let net = &world.net;
    let uplink = net.topo.host_link(NodeId(0));
    let departures: Vec<f64> = tx_starts(net, uplink).iter().map(|(t, _)| *t).collect();
    assert_eq!(departures.len(), 3);
    // 1500 字节 @ 10Gbps = 1.2us
    for (got, want) in departures.iter().zip([0.0, 1.2, 2.4]) {
        assert!((got - want).abs() < 1e-6, "departures {departures:?}");
    }

    assert_eq!(net.stats.finished_flows, 1);
    assert_eq!(net.results.len(), 1);
    let f = &net.flows[0];
    assert!(f.finished);
    assert_eq!(f.stats.total_pkt_sent, 3);
    assert_eq!(f.stats.received_count, 3);
    assert_eq!(f.stats.received_bytes, 3 * MSS);
    assert_eq!(f.stats.first_hop_departure, 3);
    assert_eq!(f.stats.last_hop_departure, 3);

    // 最后一个数据包 5.2us 到达，ACK 再花 0.464us 回到发送端
    let r = &net.results[0];
    assert!((r.fct_us - 5.664).abs() < 1e-6, "fct {}", r.fct_us);
    assert_eq!(r.first_byte_us, 0.0);
    assert!(f.retx_event.is_none());
}

#[test]
fn retransmission_recovers_packets_dropped_at_the_first_hop() {
    // 出端口只能放下 2 个整包，5 个段里后 3 个被丢弃，超时后补发
    let mut world = traced_world(two_hosts("queue_type: 1\nflow_type: 1\nqueue_size: 3000\n"));
    world.run(&[flow_desc(7, 0.0, 5 * MSS, 0, 1)]);

    let net = &world.net;
    let f = &net.flows[0];
    assert!(f.finished);
    assert_eq!(f.stats.data_pkt_drop, 3);
    assert_eq!(f.stats.pkt_drop, 3);
    assert_eq!(f.stats.total_pkt_sent, 8);
    assert_eq!(net.stats.drops_at(Hop::HostUp), 3);
    assert_eq!(net.stats.dead_packets, 0);

    let viz = net.viz.as_ref().expect("trace enabled");
    let timeouts = viz
        .events
        .iter()
        .filter(|e| matches!(e.kind, VizEventKind::RetxTimeout { .. }))
        .count();
    assert_eq!(timeouts, 1);

    let r = &net.results[0];
    assert_eq!(r.id, 7);
    assert_eq!(r.line().split_whitespace().nth(9), Some("8/5//5"));
}

#[test]
fn cut_through_forwards_after_the_header() {
    let mut world = traced_world(two_hosts("queue_type: 1\nflow_type: 1\ncut_through: 1\n"));
    world.run(&[flow_desc(0, 0.0, MSS, 0, 1)]);

    let net = &world.net;
    let downlink = net
        .topo
        .links
        .iter()
        .find(|l| l.to == NodeId(1))
        .map(|l| l.id)
        .expect("switch to host 1");
    let starts = tx_starts(net, downlink);
    // 40 字节头部 0.032us + 传播 0.2us
    assert!((starts[0].0 - 0.232).abs() < 1e-6, "starts {starts:?}");
    assert!(net.flows[0].finished);
}

#[test]
fn only_one_retransmission_timer_is_live() {
    let mut world = NetWorld::new(two_hosts(""));
    let id = world.net.add_flow(&flow_desc(0, 0.0, 3 * MSS, 0, 1));
    let mut sim = Simulator::default();

    world.net.set_timeout(id, SimTime(1e-3), &mut sim);
    world.net.set_timeout(id, SimTime(2e-3), &mut sim);
    assert_eq!(sim.pending(), 1);
    let handle = world.net.flows[id.0].retx_event.expect("timer armed");
    assert_eq!(handle.at, SimTime(2e-3));
    assert!(sim.is_pending(handle.id));

    world.net.cancel_retx(id, &mut sim);
    assert_eq!(sim.pending(), 0);
    assert!(world.net.flows[id.0].retx_event.is_none());
}

#[test]
fn no_timer_is_armed_once_everything_is_acked() {
    let mut world = NetWorld::new(two_hosts(""));
    let id = world.net.add_flow(&flow_desc(0, 0.0, 3 * MSS, 0, 1));
    world.net.flows[id.0].last_unacked_seq = 3 * MSS;
    let mut sim = Simulator::default();

    world.net.set_timeout(id, SimTime(1e-3), &mut sim);
    assert_eq!(sim.pending(), 0);
    assert!(world.net.flows[id.0].retx_event.is_none());
}

fn lone_flow(extra: &str, size: u64, deadline: Option<SimTime>) -> Flow {
    let cfg = two_hosts(extra);
    Flow::new(FlowId(0), 0, SimTime::ZERO, size, NodeId(0), NodeId(1), deadline, &cfg)
}

#[test]
fn receiver_acks_cumulatively_and_reports_sacks() {
    let mut f = lone_flow("", 3 * MSS, None);

    let (ack, sack) = f.record_data(MSS, 1500, 0.0);
    assert_eq!(ack, 0);
    assert_eq!(sack, vec![MSS]);

    let (ack, sack) = f.record_data(0, 1500, 0.0);
    assert_eq!(ack, 2 * MSS);
    assert!(sack.is_empty());

    let (ack, _) = f.record_data(0, 1500, 0.0);
    assert_eq!(ack, 2 * MSS);
    assert_eq!(f.stats.duplicated, 1);
    assert_eq!(f.stats.received_count, 3);
    assert_eq!(f.stats.received_bytes, 2 * MSS);
}

#[test]
fn last_segment_carries_only_the_remaining_bytes() {
    let f = lone_flow("", 2 * MSS + 100, None);
    assert_eq!(f.size_in_pkt, 3);
    assert_eq!(f.segment_wire_bytes(0), 1500);
    assert_eq!(f.segment_wire_bytes(2 * MSS), 140);
    assert!(f.can_send(2 * MSS));
    assert!(!f.can_send(2 * MSS + 100));
    assert_eq!(f.next_segment(2 * MSS), 2 * MSS + 100);
}

#[test]
fn window_limits_what_can_be_sent() {
    let mut f = lone_flow("init_cwnd: 2\n", 10 * MSS, None);
    assert!(f.can_send(0));
    assert!(f.can_send(MSS));
    assert!(!f.can_send(2 * MSS));

    // 一个 SACK 段把窗口撑大一个 MSS
    assert!(!f.absorb_ack(0, 1));
    assert!(f.can_send(2 * MSS));

    assert!(f.absorb_ack(MSS, 0));
    assert_eq!(f.cwnd, 3);
    assert!(f.can_send(3 * MSS));
    assert!(!f.can_send(4 * MSS));
}

#[test]
fn timeout_rewinds_to_the_last_acked_byte() {
    let mut f = lone_flow("", 10 * MSS, None);
    f.next_seq_no = 8 * MSS;
    assert!(f.absorb_ack(3 * MSS, 0));
    f.rewind();
    assert_eq!(f.next_seq_no, 3 * MSS);
    assert_eq!(f.cwnd, 1);
}

#[test]
fn congestion_policies_grow_the_window_differently() {
    let mut cwnd = 12;
    let mut normal = CongestionPolicy::Normal;
    for _ in 0..10 {
        normal.on_new_ack(&mut cwnd, 15);
    }
    assert_eq!(cwnd, 15);

    let mut pfabric = CongestionPolicy::PFabric {
        ssthresh: PFABRIC_INITIAL_SSTHRESH,
        ai_count: 0,
    };
    pfabric.on_timeout(20);
    assert_eq!(
        pfabric,
        CongestionPolicy::PFabric {
            ssthresh: 10,
            ai_count: 0
        }
    );
    let mut cwnd = 10;
    for _ in 0..9 {
        pfabric.on_new_ack(&mut cwnd, 100);
    }
    assert_eq!(cwnd, 10);
    pfabric.on_new_ack(&mut cwnd, 100);
    assert_eq!(cwnd, 11);
}

#[test]
fn packet_priority_follows_the_flow_type() {
    let mut f = lone_flow("flow_type: 2\n", 3 * MSS, None);
    assert_eq!(f.priority(), (3 * MSS) as f64);
    f.absorb_ack(MSS, 0);
    assert_eq!(f.priority(), (2 * MSS) as f64);

    let normal = lone_flow("flow_type: 1\n", 3 * MSS, None);
    assert_eq!(normal.priority(), 1.0);

    let edf = lone_flow(
        "deadline: 1\nschedule_by_deadline: 1\n",
        3 * MSS,
        Some(SimTime::from_micros(1500.0)),
    );
    assert_eq!(edf.priority(), 1500.0);
}

#[test]
fn waking_a_flow_replaces_the_earlier_wakeup() {
    let mut world = NetWorld::new(two_hosts("queue_type: 1\nflow_type: 1\n"));
    let id = world.net.add_flow(&flow_desc(0, 0.0, 2 * MSS, 0, 1));
    let mut sim = Simulator::default();

    world.net.wake_flow(id, SimTime::from_micros(1.0), &mut sim);
    world.net.wake_flow(id, SimTime::from_micros(2.0), &mut sim);
    assert_eq!(sim.pending(), 1);

    sim.run_until(SimTime::from_micros(2.0), &mut world);
    let f = &world.net.flows[id.0];
    assert_eq!(f.stats.total_pkt_sent, 2);
    assert!(f.flow_proc_event.is_none());
    let first = f.stats.first_byte_send_time.expect("sent");
    assert!((first.as_micros() - 2.0).abs() < 1e-9);
}

#[test]
fn cumulative_ack_never_moves_backwards_and_finishes_once() {
    let mut world = NetWorld::new(two_hosts("queue_type: 1\nflow_type: 1\n"));
    let id = world.net.add_flow(&flow_desc(0, 0.0, 3 * MSS, 0, 1));
    let mut sim = Simulator::default();

    world.net.receive_ack(id, 2 * MSS, &[], &mut sim);
    assert_eq!(world.net.flows[id.0].last_unacked_seq, 2 * MSS);

    // 过期的确认不回退
    world.net.receive_ack(id, MSS, &[], &mut sim);
    assert_eq!(world.net.flows[id.0].last_unacked_seq, 2 * MSS);

    world.net.receive_ack(id, 3 * MSS, &[], &mut sim);
    world.net.receive_ack(id, 3 * MSS, &[], &mut sim);
    assert!(world.net.flows[id.0].finished);

    sim.run(&mut world);
    assert_eq!(world.net.stats.finished_flows, 1);
    assert_eq!(world.net.results.len(), 1);
}
