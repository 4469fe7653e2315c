use crate::config::QueueType;
use crate::net::{FlowId, NodeId, Packet, PacketKind};
use crate::queue::{Admission, DropTailQueue, PFabricQueue, PacketQueue, ProbDropQueue, build_queue};
use crate::sim::SimTime;

fn pkt(id: u64, flow: usize, size_bytes: u32, priority: f64) -> Packet {
    Packet {
        id,
        kind: PacketKind::Data,
        seq: 0,
        size_bytes,
        priority,
        flow: FlowId(flow),
        src: NodeId(0),
        dst: NodeId(1),
        sending_time: SimTime::ZERO,
        last_enqueue_time: SimTime::ZERO,
        total_queuing_delay: 0.0,
    }
}

fn drain_ids(q: &mut dyn PacketQueue) -> Vec<u64> {
    let mut ids = Vec::new();
    while let Some(p) = q.dequeue() {
        ids.push(p.id);
    }
    ids
}

#[test]
fn droptail_drops_arrivals_that_do_not_fit() {
    let mut q = DropTailQueue::new(3_000);
    assert!(matches!(q.enqueue(pkt(1, 0, 1_500, 1.0)), Admission::Queued));
    assert!(matches!(q.enqueue(pkt(2, 0, 1_500, 1.0)), Admission::Queued));
    match q.enqueue(pkt(3, 0, 40, 1.0)) {
        Admission::Dropped(p) => assert_eq!(p.id, 3),
        other => panic!("expected drop, got {other:?}"),
    }
    assert_eq!(q.len(), 2);
    assert_eq!(q.bytes(), 3_000);

    assert_eq!(q.dequeue().expect("pkt").id, 1);
    assert_eq!(q.bytes(), 1_500);
    assert!(matches!(q.enqueue(pkt(4, 0, 1_500, 1.0)), Admission::Queued));
    assert_eq!(drain_ids(&mut q), vec![2, 4]);
    assert_eq!(q.bytes(), 0);
}

#[test]
fn droptail_remove_takes_a_packet_out_of_the_middle() {
    let mut q = DropTailQueue::new(10_000);
    for id in 1..=3 {
        assert!(matches!(q.enqueue(pkt(id, 0, 100, 1.0)), Admission::Queued));
    }
    assert_eq!(q.remove(2).expect("removed").id, 2);
    assert!(q.remove(2).is_none());
    assert_eq!(q.bytes(), 200);
    assert_eq!(drain_ids(&mut q), vec![1, 3]);
}

#[test]
fn pfabric_evicts_the_worst_priority_when_over_capacity() {
    // 容量只够 3 个包：依次到达优先级 5, 1, 9, 2 的包，9 被逐出
    let mut q = PFabricQueue::new(4_500);
    for (id, prio) in [(1, 5.0), (2, 1.0), (3, 9.0)] {
        assert!(matches!(q.enqueue(pkt(id, id as usize, 1_500, prio)), Admission::Queued));
    }
    match q.enqueue(pkt(4, 4, 1_500, 2.0)) {
        Admission::Evicted(victims) => {
            let ids: Vec<u64> = victims.iter().map(|p| p.id).collect();
            assert_eq!(ids, vec![3]);
        }
        other => panic!("expected eviction, got {other:?}"),
    }
    assert_eq!(q.len(), 3);
    assert_eq!(q.bytes(), 4_500);
    assert!(q.bytes() <= q.capacity_bytes());

    // 出队按优先级：1, 2, 5
    assert_eq!(drain_ids(&mut q), vec![2, 4, 1]);
}

#[test]
fn pfabric_can_evict_the_arriving_packet() {
    let mut q = PFabricQueue::new(3_000);
    assert!(matches!(q.enqueue(pkt(1, 1, 1_500, 1.0)), Admission::Queued));
    assert!(matches!(q.enqueue(pkt(2, 2, 1_500, 2.0)), Admission::Queued));
    match q.enqueue(pkt(3, 3, 1_500, 7.0)) {
        Admission::Evicted(victims) => {
            assert_eq!(victims.len(), 1);
            assert_eq!(victims[0].id, 3);
        }
        other => panic!("expected eviction, got {other:?}"),
    }
    assert_eq!(q.bytes(), 3_000);
}

#[test]
fn pfabric_eviction_prefers_the_latest_on_ties() {
    let mut q = PFabricQueue::new(3_000);
    assert!(matches!(q.enqueue(pkt(1, 1, 1_500, 4.0)), Admission::Queued));
    assert!(matches!(q.enqueue(pkt(2, 2, 1_500, 4.0)), Admission::Queued));
    match q.enqueue(pkt(3, 3, 1_500, 4.0)) {
        Admission::Evicted(victims) => assert_eq!(victims[0].id, 3),
        other => panic!("expected eviction, got {other:?}"),
    }
}

#[test]
fn pfabric_dequeues_the_oldest_packet_of_the_best_flow() {
    let mut q = PFabricQueue::new(100_000);
    // 流 7 的第一个包优先级较差，第二个包最好；出队时先发流 7 的老包
    assert!(matches!(q.enqueue(pkt(1, 7, 1_500, 50.0)), Admission::Queued));
    assert!(matches!(q.enqueue(pkt(2, 8, 1_500, 10.0)), Admission::Queued));
    assert!(matches!(q.enqueue(pkt(3, 7, 1_500, 1.0)), Admission::Queued));

    assert_eq!(q.dequeue().expect("pkt").id, 1);
    assert_eq!(q.dequeue().expect("pkt").id, 3);
    assert_eq!(q.dequeue().expect("pkt").id, 2);
    assert!(q.dequeue().is_none());
}

#[test]
fn pfabric_byte_count_matches_contents_after_mixed_operations() {
    let mut q = PFabricQueue::new(5_000);
    let sizes = [1_500u32, 40, 1_500, 700, 1_500, 40, 1_500];
    for (i, sz) in sizes.iter().enumerate() {
        let _ = q.enqueue(pkt(i as u64, i % 3, *sz, (i * 7 % 5) as f64));
        assert!(q.bytes() <= q.capacity_bytes());
    }
    let _ = q.remove(1);
    let _ = q.dequeue();
    let mut rest = 0u64;
    let expected = q.bytes();
    while let Some(p) = q.dequeue() {
        rest += p.size_bytes as u64;
    }
    assert_eq!(rest, expected);
    assert_eq!(q.bytes(), 0);
}

#[test]
fn prob_drop_with_probability_zero_behaves_like_droptail() {
    let mut q = ProbDropQueue::new(3_000, 0.0, 7);
    for id in 0..2 {
        assert!(matches!(q.enqueue(pkt(id, 0, 1_500, 1.0)), Admission::Queued));
    }
    assert!(matches!(q.enqueue(pkt(9, 0, 1_500, 1.0)), Admission::Dropped(_)));
}

#[test]
fn prob_drop_with_probability_one_discards_everything() {
    let mut q = ProbDropQueue::new(1_000_000, 1.0, 7);
    for id in 0..20 {
        assert!(matches!(q.enqueue(pkt(id, 0, 1_500, 1.0)), Admission::Discarded(_)));
    }
    assert!(q.is_empty());
    assert_eq!(q.bytes(), 0);
}

#[test]
fn prob_drop_discards_roughly_the_configured_fraction() {
    let mut q = ProbDropQueue::new(u64::MAX, 0.3, 42);
    let mut discarded = 0;
    for id in 0..10_000 {
        if let Admission::Discarded(_) = q.enqueue(pkt(id, 0, 100, 1.0)) {
            discarded += 1;
        }
    }
    assert!((2_500..3_500).contains(&discarded), "discarded {discarded}");
}

#[test]
fn build_queue_picks_the_configured_discipline() {
    let mut q = build_queue(QueueType::PFabric, 3_000, 0.0, 1);
    assert_eq!(q.capacity_bytes(), 3_000);
    let _ = q.enqueue(pkt(1, 1, 1_500, 9.0));
    let _ = q.enqueue(pkt(2, 2, 1_500, 1.0));
    assert_eq!(q.dequeue().expect("pkt").id, 2);
}
