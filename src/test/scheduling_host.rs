use super::{flow_desc, traced_world, two_hosts, tx_starts};
use crate::net::{NetWorld, NodeId, PacketKind, PacketQueuing};
use crate::sim::{SimTime, Simulator};

const HOST: NodeId = NodeId(0);

/// 主机 0 的出端口正在发送一个 1500 字节的包（0 ~ 1.2us）
fn busy_uplink() -> (NetWorld, Simulator) {
    let mut world = traced_world(two_hosts("host_type: 2\nqueue_type: 1\nflow_type: 1\n"));
    let net = &mut world.net;
    let filler = net.add_flow(&flow_desc(99, 0.0, 1460, 0, 1));
    let link = net.topo.host_link(HOST);
    let pkt = net.make_packet(filler, PacketKind::Data, 0, 1500, 1.0, HOST, NodeId(1), SimTime::ZERO);

    let mut sim = Simulator::default();
    sim.schedule(SimTime::ZERO, PacketQueuing { link, pkt });
    sim.run_until(SimTime::ZERO, &mut world);
    assert!(world.net.topo.link(link).busy);
    (world, sim)
}

#[test]
fn busy_uplink_defers_the_host() {
    let (mut world, mut sim) = busy_uplink();
    let a = world.net.add_flow(&flow_desc(0, 0.0, 2 * 1460, 0, 1));

    world.net.scheduling_host_start(HOST, a, &mut sim);
    assert_eq!(world.net.flows[a.0].stats.total_pkt_sent, 0);
    let wake = world.net.topo.host(HOST).proc_event.expect("host processing armed");
    assert!((wake.at.as_micros() - 1.2).abs() < 1e-9);

    sim.run_until(SimTime::from_micros(1.3), &mut world);
    assert_eq!(world.net.flows[a.0].stats.total_pkt_sent, 2);
    assert!(world.net.topo.host(HOST).proc_event.is_none());

    let link = world.net.topo.host_link(HOST);
    let starts = tx_starts(&world.net, link);
    assert_eq!(starts.len(), 2);
    assert!((starts[1].0 - 1.2).abs() < 1e-6, "starts {starts:?}");
}

#[test]
fn earliest_started_flow_is_woken_first() {
    let (mut world, mut sim) = busy_uplink();
    let late = world.net.add_flow(&flow_desc(1, 0.5, 1460, 0, 1));
    let early = world.net.add_flow(&flow_desc(2, 0.2, 1460, 0, 1));

    world.net.scheduling_host_start(HOST, late, &mut sim);
    world.net.scheduling_host_start(HOST, early, &mut sim);
    assert_eq!(world.net.topo.host(HOST).sending.len(), 2);

    sim.run_until(SimTime::from_micros(1.3), &mut world);
    assert_eq!(world.net.flows[early.0].stats.total_pkt_sent, 1);
    assert_eq!(world.net.flows[late.0].stats.total_pkt_sent, 0);
}

#[test]
fn finished_flows_are_dropped_from_the_top() {
    let (mut world, mut sim) = busy_uplink();
    let late = world.net.add_flow(&flow_desc(1, 0.5, 1460, 0, 1));
    let early = world.net.add_flow(&flow_desc(2, 0.2, 1460, 0, 1));
    world.net.scheduling_host_start(HOST, late, &mut sim);
    world.net.scheduling_host_start(HOST, early, &mut sim);
    world.net.flows[early.0].finished = true;

    sim.run_until(SimTime::from_micros(1.3), &mut world);
    assert_eq!(world.net.flows[late.0].stats.total_pkt_sent, 1);
    let sending: Vec<_> = world.net.topo.host(HOST).sending.iter().copied().collect();
    assert_eq!(sending, vec![late]);
}

#[test]
fn queued_flows_run_one_after_another() {
    let mut world = traced_world(two_hosts("host_type: 2\nqueue_type: 1\nflow_type: 1\n"));
    let summary = world.run(&[
        flow_desc(0, 0.0, 3 * 1460, 0, 1),
        flow_desc(1, 0.1, 3 * 1460, 0, 1),
    ]);
    assert!(summary.dead_loop.is_none());

    let net = &world.net;
    assert_eq!(net.stats.finished_flows, 2);
    let ids: Vec<u64> = net.results.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![0, 1]);
    // 第二条流要等第一条完成后才开始发送
    let (first, second) = (&net.results[0], &net.results[1]);
    assert!(second.start_us + second.first_byte_us >= first.finish_us - 1e-6);
}
