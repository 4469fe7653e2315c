//! 窗口式可靠传输：发送、确认、重传
//!
//! 这些操作需要同时修改流、链路队列和事件队列，因此实现为 `Network` 的方法。

use tracing::{debug, trace};

use super::events::{FlowArrival, FlowFinished, FlowProcessing, RetxTimeout};
use crate::config::HostType;
use crate::net::{FlowId, Network, Packet, PacketKind};
use crate::sim::{SimTime, Simulator};
use crate::viz::VizEventKind;

impl Network {
    /// 流到达：先启动本条流，再把下一条待到达的流放进事件队列
    #[tracing::instrument(skip(self, sim), fields(flow = id.0))]
    pub fn on_flow_arrival(&mut self, id: FlowId, sim: &mut Simulator) {
        self.stats.arrived_flows += 1;
        self.start_flow(id, sim);
        if let Some(next) = self.pending_arrivals.pop_front() {
            let at = self.flows[next.0].start_time;
            sim.schedule(at, FlowArrival { flow: next });
        }
    }

    /// 按协议/主机类型启动流
    pub fn start_flow(&mut self, id: FlowId, sim: &mut Simulator) {
        let f = &self.flows[id.0];
        debug!(flow = id.0, size = f.size, src = f.src.0, dst = f.dst.0, "🚦 流开始");
        if f.is_fastpass() {
            self.fastpass_start(id, sim);
        } else if self.cfg.host_type == HostType::Scheduling {
            let src = f.src;
            self.scheduling_host_start(src, id, sim);
        } else {
            self.send_pending_data(id, sim);
        }
    }

    /// 在窗口允许的范围内发出尚未被接收端收到的段
    #[tracing::instrument(skip(self, sim), fields(flow = id.0))]
    pub fn send_pending_data(&mut self, id: FlowId, sim: &mut Simulator) {
        let f = &self.flows[id.0];
        if f.stats.received_bytes >= f.size {
            return;
        }
        let mut seq = f.next_seq_no;
        while self.flows[id.0].can_send(seq) {
            if !self.flows[id.0].received.contains(&seq) {
                self.send_data_pkt(id, seq, sim);
            }
            let f = &mut self.flows[id.0];
            seq = f.next_segment(seq);
            f.next_seq_no = seq;
            if f.retx_event.is_none() {
                let at = sim.now() + f.retx_timeout;
                self.set_timeout(id, at, sim);
            }
        }
    }

    fn send_data_pkt(&mut self, id: FlowId, seq: u64, sim: &mut Simulator) {
        let f = &mut self.flows[id.0];
        f.stats.total_pkt_sent += 1;
        let size = f.segment_wire_bytes(seq);
        let priority = f.priority();
        let (src, dst) = (f.src, f.dst);
        trace!(flow = id.0, seq, size, priority, "发送数据段");
        let pkt = self.make_packet(id, PacketKind::Data, seq, size, priority, src, dst, sim.now());
        self.inject(pkt, sim);
    }

    /// 接收端发送累计确认（ACK 走 dst -> src）
    fn send_ack(&mut self, id: FlowId, ack: u64, sack: Vec<u64>, sim: &mut Simulator) {
        let f = &self.flows[id.0];
        let (src, dst, hdr) = (f.dst, f.src, f.hdr_size as u32);
        trace!(flow = id.0, ack, sack = sack.len(), "发送 ACK");
        let pkt = self.make_packet(id, PacketKind::Ack { sack }, ack, hdr, 0.0, src, dst, sim.now());
        self.inject(pkt, sim);
    }

    /// 窗口式流收到一个包
    pub fn flow_receive(&mut self, pkt: Packet, sim: &mut Simulator) {
        let id = pkt.flow;
        if self.flows[id.0].finished {
            return;
        }
        match pkt.kind {
            PacketKind::Ack { sack } => self.receive_ack(id, pkt.seq, &sack, sim),
            PacketKind::Data => {
                let f = &mut self.flows[id.0];
                f.stats.first_byte_receive_time.get_or_insert(sim.now());
                let (ack, sack) = f.record_data(pkt.seq, pkt.size_bytes, pkt.total_queuing_delay);
                self.send_ack(id, ack, sack, sim);
            }
            other => panic!("window flow {} received unexpected packet {:?}", id.0, other),
        }
    }

    /// 发送端处理累计确认
    pub fn receive_ack(&mut self, id: FlowId, ack: u64, sack: &[u64], sim: &mut Simulator) {
        let advanced = self.flows[id.0].absorb_ack(ack, sack.len());
        if advanced {
            self.send_pending_data(id, sim);
            if self.flows[id.0].retx_event.is_some() {
                self.cancel_retx(id, sim);
                let at = sim.now() + self.flows[id.0].retx_timeout;
                self.set_timeout(id, at, sim);
            }
        }

        let now = sim.now();
        let f = &mut self.flows[id.0];
        if ack == f.size && !f.finished {
            f.finished = true;
            f.received.clear();
            f.finish_time = Some(now);
            debug!(flow = id.0, fct_us = (now - f.start_time) * 1e6, "🏁 全部数据已确认");
            sim.schedule(now, FlowFinished { flow: id });
        }
    }

    /// 设置重传定时器；流已全部确认时不设置。同一时刻只保留一个有效定时器。
    pub fn set_timeout(&mut self, id: FlowId, at: SimTime, sim: &mut Simulator) {
        let f = &self.flows[id.0];
        if f.last_unacked_seq >= f.size {
            return;
        }
        if let Some(old) = f.retx_event {
            if sim.current_event() != Some(old.id) {
                sim.cancel(old.id);
            }
        }
        let handle = sim.schedule(at, RetxTimeout { flow: id });
        self.flows[id.0].retx_event = Some(handle);
    }

    pub fn cancel_retx(&mut self, id: FlowId, sim: &mut Simulator) {
        if let Some(h) = self.flows[id.0].retx_event.take() {
            sim.cancel(h.id);
        }
    }

    /// 重传超时：回退到最后确认点重新发送并重新计时
    #[tracing::instrument(skip(self, sim), fields(flow = id.0))]
    pub fn handle_timeout(&mut self, id: FlowId, sim: &mut Simulator) {
        let f = &mut self.flows[id.0];
        f.rewind();
        debug!(last_unacked = f.last_unacked_seq, "⏰ 重传超时");
        let kind = VizEventKind::RetxTimeout {
            last_unacked: f.last_unacked_seq,
            cwnd: f.cwnd,
        };
        self.viz_flow_event(id, kind, sim.now());

        self.send_pending_data(id, sim);
        let at = sim.now() + self.flows[id.0].retx_timeout;
        self.set_timeout(id, at, sim);
    }

    /// 在 `at` 时刻唤醒流发送；替换掉尚未触发的旧唤醒事件
    pub fn wake_flow(&mut self, id: FlowId, at: SimTime, sim: &mut Simulator) {
        if let Some(old) = self.flows[id.0].flow_proc_event.take() {
            if sim.current_event() != Some(old.id) {
                sim.cancel(old.id);
            }
        }
        let handle = sim.schedule(at, FlowProcessing { flow: id });
        self.flows[id.0].flow_proc_event = Some(handle);
    }
}
