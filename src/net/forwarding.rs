//! 逐跳转发：入队、抢占、出队发送与丢包归因

use tracing::{debug, trace};

use super::link::Hop;
use super::packet_arrival::PacketArrival;
use super::packet_queuing::PacketQueuing;
use super::queue_processing::QueueProcessing;
use super::{LinkId, Network, Packet, PacketKind};
use crate::queue::Admission;
use crate::sim::{SimTime, Simulator};
use crate::viz::VizDropReason;

/// 剩余发送比例不超过该值时不再抢占
const PREEMPT_MIN_REMAINING: f64 = 0.01;

impl Network {
    /// 包到达链路队列
    #[tracing::instrument(skip(self, pkt, sim), fields(pkt_id = pkt.id, link = link.0))]
    pub fn on_packet_queuing(&mut self, link: LinkId, mut pkt: Packet, sim: &mut Simulator) {
        let now = sim.now();
        let preemptive = self.cfg.preemptive_queue;
        let l = self.topo.link_mut(link);

        if !l.busy {
            let handle = sim.schedule(now, QueueProcessing { link });
            l.proc_event = Some(handle);
            l.busy = true;
            l.transmitting = Some(pkt.clone());
        } else if preemptive {
            let remaining = match (&l.transmitting, l.proc_event) {
                (Some(cur), Some(proc)) if pkt.priority < cur.priority => {
                    (proc.at - now) / l.tx_delay(cur.size_bytes as u64)
                }
                _ => 0.0,
            };
            if remaining > PREEMPT_MIN_REMAINING {
                self.preempt(link, sim);
                let l = self.topo.link_mut(link);
                let handle = sim.schedule(now, QueueProcessing { link });
                l.proc_event = Some(handle);
                l.busy = true;
                l.transmitting = Some(pkt.clone());
            }
        }

        pkt.last_enqueue_time = now;
        self.admit(link, pkt, sim);
    }

    /// 取消正在进行的发送，被抢占的包原样放回队列
    fn preempt(&mut self, link: LinkId, sim: &mut Simulator) {
        let now = sim.now();
        let l = self.topo.link_mut(link);
        if let Some(proc) = l.proc_event.take() {
            sim.cancel(proc.id);
        }
        for ev in l.busy_events.drain(..) {
            sim.cancel(ev.id);
        }
        l.busy = false;
        l.stats.preemptions += 1;
        let Some(mut victim) = l.transmitting.take() else {
            return;
        };
        l.queue.remove(victim.id);
        debug!(link = link.0, victim = victim.id, "⏸️  抢占正在发送的包");
        self.stats.preemptions += 1;
        self.viz_preempt(&victim, link, now);
        victim.last_enqueue_time = now;
        self.admit(link, victim, sim);
    }

    /// 按队列策略入队，并处理丢弃/逐出的包
    fn admit(&mut self, link: LinkId, pkt: Packet, sim: &mut Simulator) {
        let now = sim.now();
        let l = self.topo.link_mut(link);
        l.stats.pkt_arrivals += 1;
        l.stats.byte_arrivals += pkt.size_bytes as u64;
        match l.queue.enqueue(pkt) {
            Admission::Queued => {}
            Admission::Dropped(p) => self.record_drop(&p, link, VizDropReason::Overflow, now),
            Admission::Evicted(victims) => {
                for p in &victims {
                    self.record_drop(p, link, VizDropReason::Evicted, now);
                }
            }
            Admission::Discarded(p) => {
                self.topo.link_mut(link).stats.discards += 1;
                self.stats.discards += 1;
                trace!(pkt_id = p.id, "随机丢弃");
                self.viz_drop(&p, link, VizDropReason::Random, now);
            }
        }
    }

    /// 丢包归因到所属流与链路位置
    fn record_drop(&mut self, pkt: &Packet, link: LinkId, reason: VizDropReason, now: SimTime) {
        let l = self.topo.link_mut(link);
        l.stats.drops += 1;
        let hop = l.hop;

        let f = &mut self.flows[pkt.flow.0];
        f.stats.pkt_drop += 1;
        match pkt.kind {
            PacketKind::Data if pkt.seq < f.size => f.stats.data_pkt_drop += 1,
            PacketKind::Ack { .. } | PacketKind::PlainAck => f.stats.ack_pkt_drop += 1,
            _ => {}
        }
        if hop != Hop::HostUp && pkt.is_data() {
            self.stats.dead_packets += 1;
        }
        self.stats.drops_by_hop[hop.index()] += 1;
        trace!(pkt_id = pkt.id, flow = pkt.flow.0, ?hop, ?reason, "丢包");
        self.viz_drop(pkt, link, reason, now);
    }

    /// 链路空闲或上一个包发送完毕：取出下一个包开始发送
    #[tracing::instrument(skip(self, sim), fields(link = link.0))]
    pub fn on_queue_processing(&mut self, link: LinkId, sim: &mut Simulator) {
        let now = sim.now();
        let cut_through = self.cfg.cut_through;
        let hdr = self.cfg.hdr_size;
        let l = self.topo.link_mut(link);

        let Some(mut pkt) = l.queue.dequeue() else {
            l.busy = false;
            l.busy_events.clear();
            l.transmitting = None;
            l.proc_event = None;
            return;
        };

        l.busy = true;
        l.busy_events.clear();
        pkt.total_queuing_delay += now - pkt.last_enqueue_time;
        l.stats.pkt_departures += 1;
        l.stats.byte_departures += pkt.size_bytes as u64;
        l.transmitting = Some(pkt.clone());
        let hop = l.hop;
        let td = l.tx_delay(pkt.size_bytes as u64);
        let hop_delay = if cut_through { l.tx_delay(hdr) } else { td };
        let pd = l.propagation_delay;

        if pkt.is_data() {
            let f = &mut self.flows[pkt.flow.0];
            f.stats.first_byte_send_time.get_or_insert(now);
            match hop {
                Hop::HostUp => f.stats.first_hop_departure += 1,
                Hop::HostDown => f.stats.last_hop_departure += 1,
                _ => {}
            }
        }

        let next = self.topo.next_hop(&pkt, link);
        let proc = sim.schedule(now + td, QueueProcessing { link });
        self.viz_tx_start(&pkt, link, now + td, now);
        trace!(pkt_id = pkt.id, ?next, td, "开始发送");
        let dependent = match next {
            None => sim.schedule(now + td + pd, PacketArrival { pkt }),
            Some(next) => sim.schedule(now + hop_delay + pd, PacketQueuing { link: next, pkt }),
        };

        let l = self.topo.link_mut(link);
        l.proc_event = Some(proc);
        l.busy_events.push(proc);
        l.busy_events.push(dependent);
    }
}
