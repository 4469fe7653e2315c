//! Fastpass 发送端与接收端
//!
//! 发送端只在仲裁器分配的时隙里发包：收到时隙表后为每个被分配的时隙预约一次发送。
//! 接收端对每个数据包回一个单独的确认；全部包都被确认后流结束，并通知仲裁器。

use std::collections::BTreeSet;

use tracing::{debug, trace};

use crate::flow::FlowFinished;
use crate::net::{FlowId, NetWorld, Network, NodeId, Packet, PacketKind};
use crate::sim::{Event, EventKind, Simulator, World, world_mut};

/// 流上的 Fastpass 状态
#[derive(Debug, Clone, Default)]
pub struct FastpassSender {
    /// 还需要发送（或等待时隙）的包数
    pub remaining: i64,
    pub acked: BTreeSet<u64>,
    pub acked_count: u64,
    /// 从 0 开始连续确认到的包序号（不含）
    pub acked_until: u64,
    pub last_sent: Option<u64>,
    pub finished: bool,
    /// 接收端已收到的 seq
    pub received: BTreeSet<u64>,
}

impl FastpassSender {
    pub fn new(size_in_pkt: u64) -> Self {
        Self {
            remaining: size_in_pkt as i64,
            ..Self::default()
        }
    }

    /// 从上次发送的位置往后轮转，跳过已确认的包；全部确认时返回 None
    pub fn next_pkt_to_send(&self, size_in_pkt: u64) -> Option<u64> {
        let mut pkt = self.last_sent.map_or(-1, |p| p as i64);
        for _ in 0..size_in_pkt {
            pkt += 1;
            if pkt >= size_in_pkt as i64 {
                pkt = self.acked_until as i64;
            }
            if !self.acked.contains(&(pkt as u64)) {
                return Some(pkt as u64);
            }
        }
        None
    }

    /// 记录一个包的确认；返回是否为新确认
    pub fn ack(&mut self, pkt: u64) -> bool {
        if !self.acked.insert(pkt) {
            return false;
        }
        self.acked_count += 1;
        while self.acked.contains(&self.acked_until) {
            self.acked_until += 1;
        }
        true
    }
}

/// 事件：在分配到的时隙发送一个数据包
#[derive(Debug)]
pub struct FastpassFlowProcessing {
    pub flow: FlowId,
}

impl Event for FastpassFlowProcessing {
    fn kind(&self) -> EventKind {
        EventKind::FastpassFlowProcessing
    }

    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let w = world_mut::<NetWorld>(world);
        w.net.fastpass_send_data(self.flow, sim);
    }
}

/// 事件：发完被分配的包后过了一个 epoch，仍未全部确认则重新申请
#[derive(Debug)]
pub struct FastpassTimeout {
    pub flow: FlowId,
}

impl Event for FastpassTimeout {
    fn kind(&self) -> EventKind {
        EventKind::FastpassTimeout
    }

    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let w = world_mut::<NetWorld>(world);
        w.net.fastpass_timeout(self.flow, sim);
    }
}

impl Network {
    fn sender_mut(&mut self, id: FlowId) -> &mut FastpassSender {
        self.flows[id.0]
            .fastpass
            .as_mut()
            .unwrap_or_else(|| panic!("flow {} is not a fastpass flow", id.0))
    }

    fn arbiter_node(&self) -> NodeId {
        match &self.arbiter {
            Some(a) => a.node,
            None => panic!("fastpass flow without an arbiter"),
        }
    }

    /// Fastpass 流开始：向仲裁器报告需要发送的包数
    pub fn fastpass_start(&mut self, id: FlowId, sim: &mut Simulator) {
        self.send_rts(id, sim);
    }

    fn send_rts(&mut self, id: FlowId, sim: &mut Simulator) {
        let arbiter = self.arbiter_node();
        let s = self.sender_mut(id);
        let remaining = if s.finished { -1 } else { s.remaining };
        let f = &self.flows[id.0];
        let (src, hdr) = (f.src, f.hdr_size as u32);
        trace!(flow = id.0, remaining, "发送 RTS");
        let pkt = self.make_packet(id, PacketKind::FastpassRts { remaining }, 0, hdr, 0.0, src, arbiter, sim.now());
        self.inject(pkt, sim);
    }

    /// 发送主机收到时隙表，为每个分到的时隙预约一次发送
    pub fn fastpass_receive_schedule(&mut self, pkt: Packet, sim: &mut Simulator) {
        let schedule = match pkt.kind {
            PacketKind::FastpassSchedule(schedule) => schedule,
            other => panic!("expected a fastpass schedule packet, got {:?}", other),
        };
        let now = sim.now();
        let start = if schedule.start >= now { now } else { schedule.start };
        let Some(arbiter) = &self.arbiter else {
            return;
        };
        let slot_len = arbiter.epoch / arbiter.slots_per_epoch as f64;
        for (i, flow) in schedule.slots.iter().enumerate() {
            if let Some(flow) = flow {
                let at = (start + i as f64 * slot_len).max(now);
                sim.schedule(at, FastpassFlowProcessing { flow: *flow });
            }
        }
        debug!(host = pkt.dst.0, slots = schedule.assigned(), "📅 收到时隙表");
    }

    /// 在一个时隙里发送下一个未确认的包
    pub fn fastpass_send_data(&mut self, id: FlowId, sim: &mut Simulator) {
        let now = sim.now();
        let size_in_pkt = self.flows[id.0].size_in_pkt;
        let s = self.sender_mut(id);
        let Some(idx) = s.next_pkt_to_send(size_in_pkt) else {
            return;
        };
        s.last_sent = Some(idx);
        if s.remaining > 0 {
            s.remaining -= 1;
        }
        let exhausted = s.remaining == 0;

        let f = &mut self.flows[id.0];
        f.stats.total_pkt_sent += 1;
        f.next_seq_no += f.mss;
        let (seq, size, src, dst) = (idx * f.mss, (f.mss + f.hdr_size) as u32, f.src, f.dst);
        let pkt = self.make_packet(id, PacketKind::Data, seq, size, 1.0, src, dst, now);
        self.inject(pkt, sim);

        if exhausted {
            let epoch = self.arbiter.as_ref().map_or(0.0, |a| a.epoch);
            sim.schedule(now + epoch, FastpassTimeout { flow: id });
        }
    }

    /// 重新申请尚未确认的包
    pub fn fastpass_timeout(&mut self, id: FlowId, sim: &mut Simulator) {
        let size_in_pkt = self.flows[id.0].size_in_pkt;
        let s = self.sender_mut(id);
        if s.finished {
            return;
        }
        s.remaining = (size_in_pkt - s.acked_count) as i64;
        trace!(flow = id.0, remaining = s.remaining, "Fastpass 超时，重新申请");
        self.send_rts(id, sim);
    }

    /// Fastpass 流收到数据或确认
    pub fn fastpass_receive(&mut self, pkt: Packet, sim: &mut Simulator) {
        let id = pkt.flow;
        let now = sim.now();
        match pkt.kind {
            PacketKind::Data => {
                let f = &mut self.flows[id.0];
                f.stats.first_byte_receive_time.get_or_insert(now);
                f.stats.received_count += 1;
                f.stats.total_queuing_time += pkt.total_queuing_delay;
                f.stats.received_bytes += f.mss;
                let (src, dst, hdr) = (f.dst, f.src, f.hdr_size as u32);
                let s = self.sender_mut(id);
                if !s.received.insert(pkt.seq) {
                    self.flows[id.0].stats.duplicated += 1;
                }
                let ack = self.make_packet(id, PacketKind::PlainAck, pkt.seq, hdr, 0.0, src, dst, now);
                self.inject(ack, sim);
            }
            PacketKind::PlainAck => {
                let mss = self.flows[id.0].mss;
                let size_in_pkt = self.flows[id.0].size_in_pkt;
                let s = self.sender_mut(id);
                s.ack(pkt.seq / mss);
                if !s.finished && s.acked_count == size_in_pkt {
                    s.finished = true;
                    debug!(flow = id.0, "🏁 Fastpass 流全部确认");
                    self.send_rts(id, sim);
                    sim.schedule(now, FlowFinished { flow: id });
                }
            }
            other => panic!("fastpass flow {} received unexpected packet {:?}", id.0, other),
        }
    }
}
