//! 仿真上下文
//!
//! `Network` 持有拓扑、全部流、Fastpass 仲裁器和计数器，是除时间与事件队列之外
//! 唯一的可变状态。事件通过 `NetWorld` 拿到它。

use std::collections::VecDeque;

use tracing::{debug, info};

use super::id::{FlowId, NodeId};
use super::packet::{Packet, PacketKind};
use super::packet_queuing::PacketQueuing;
use super::stats::Stats;
use crate::config::{FlowType, SimConfig};
use crate::fastpass::{Arbiter, ArbiterProcessing};
use crate::flow::{Flow, FlowArrival};
use crate::report::{FlowRecord, Logging};
use crate::sim::{SimTime, Simulator};
use crate::topo::{self, Topology};
use crate::viz::VizLogger;
use crate::workload::FlowDesc;

/// 仿真上下文
#[derive(Debug)]
pub struct Network {
    pub cfg: SimConfig,
    pub topo: Topology,
    pub flows: Vec<Flow>,
    pub arbiter: Option<Arbiter>,
    pub stats: Stats,
    /// 按完成顺序记录的流结果
    pub results: Vec<FlowRecord>,
    pub viz: Option<VizLogger>,
    /// 按开始时间排序、尚未放入事件队列的流
    pub(crate) pending_arrivals: VecDeque<FlowId>,
    next_pkt_id: u64,
}

impl Network {
    /// 按配置构建拓扑（Fastpass 实验同时创建仲裁器）
    pub fn new(cfg: SimConfig) -> Self {
        let topo = topo::build(&cfg);
        let arbiter = match (cfg.flow_type, topo.arbiter) {
            (FlowType::Fastpass, Some(node)) => Some(Arbiter::new(node, &cfg)),
            _ => None,
        };
        Self {
            cfg,
            topo,
            flows: Vec::new(),
            arbiter,
            stats: Stats::default(),
            results: Vec::new(),
            viz: None,
            pending_arrivals: VecDeque::new(),
            next_pkt_id: 0,
        }
    }

    /// 注册一条流；返回的 `FlowId` 即其在 `flows` 中的下标
    pub fn add_flow(&mut self, desc: &FlowDesc) -> FlowId {
        let id = FlowId(self.flows.len());
        self.flows.push(Flow::new(
            id,
            desc.id,
            desc.start,
            desc.size,
            desc.src,
            desc.dst,
            desc.deadline,
            &self.cfg,
        ));
        id
    }

    /// 把流按开始时间排好：最早的一条进入事件队列，其余由前一条到达时依次放入。
    /// 同时在最早开始时刻启动周期日志和仲裁器。
    pub fn schedule_arrivals(&mut self, sim: &mut Simulator) {
        let mut order: Vec<FlowId> = self.flows.iter().map(|f| f.id).collect();
        order.sort_by(|a, b| self.flows[a.0].start_time.cmp(&self.flows[b.0].start_time));
        self.pending_arrivals = order.into();

        let Some(first) = self.pending_arrivals.pop_front() else {
            info!("没有需要仿真的流");
            return;
        };
        let start = self.flows[first.0].start_time;
        sim.schedule(start, FlowArrival { flow: first });
        sim.schedule(start, Logging);
        if let Some(arbiter) = &mut self.arbiter {
            arbiter.proc_event = Some(sim.schedule(start, ArbiterProcessing));
        }
        info!(flows = self.flows.len(), first_start = start.as_secs(), "📋 流到达已排程");
    }

    /// 分配包 id 并构造包
    #[allow(clippy::too_many_arguments)]
    pub fn make_packet(
        &mut self,
        flow: FlowId,
        kind: PacketKind,
        seq: u64,
        size_bytes: u32,
        priority: f64,
        src: NodeId,
        dst: NodeId,
        now: SimTime,
    ) -> Packet {
        let id = self.next_pkt_id;
        self.next_pkt_id = self.next_pkt_id.wrapping_add(1);
        Packet {
            id,
            kind,
            seq,
            size_bytes,
            priority,
            flow,
            src,
            dst,
            sending_time: now,
            last_enqueue_time: now,
            total_queuing_delay: 0.0,
        }
    }

    /// 把包放进源主机的出端口队列
    pub fn inject(&mut self, pkt: Packet, sim: &mut Simulator) {
        let link = self.topo.host_link(pkt.src);
        sim.schedule(sim.now(), PacketQueuing { link, pkt });
    }

    /// 包到达目的主机后交给对应的接收方
    #[tracing::instrument(skip(self, pkt, sim), fields(pkt_id = pkt.id, flow = pkt.flow.0))]
    pub fn on_packet_arrival(&mut self, pkt: Packet, sim: &mut Simulator) {
        self.stats.delivered_pkts += 1;
        self.stats.delivered_bytes += pkt.size_bytes as u64;
        if pkt.is_data() {
            self.stats.completed_packets += 1;
        }
        debug!(dst = pkt.dst.0, seq = pkt.seq, "📬 数据包到达目的主机");
        self.viz_delivered(&pkt, sim.now());

        match &pkt.kind {
            PacketKind::FastpassRts { remaining } => {
                let remaining = *remaining;
                self.arbiter_receive_rts(pkt.flow, remaining);
            }
            PacketKind::FastpassSchedule(_) => self.fastpass_receive_schedule(pkt, sim),
            _ if self.flows[pkt.flow.0].is_fastpass() => self.fastpass_receive(pkt, sim),
            _ => self.flow_receive(pkt, sim),
        }
    }

    /// 尚未完成的流
    pub fn unfinished_flows(&self) -> impl Iterator<Item = &Flow> {
        self.flows.iter().filter(|f| !f.finished)
    }
}
