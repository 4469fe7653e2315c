//! Fastpass 仲裁器
//!
//! 仲裁器根据各流上报的剩余包数，每个 epoch 为 N 个时隙分别做一次贪心匹配：
//! 按当前排序扫描所有流，发送端和接收端在本时隙都空闲时把时隙分给它并把剩余数减一。
//! 同一时隙内任何发送端、接收端最多出现一次。

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::{debug, info, trace};

use super::schedule::EpochSchedule;
use crate::config::{FastpassOrder, SimConfig};
use crate::net::{FlowId, NetWorld, Network, NodeId, PacketKind};
use crate::sched::WorkingSet;
use crate::sim::{Event, EventHandle, EventKind, SimTime, Simulator, World, world_mut};

/// 仲裁器视角下的一条流
#[derive(Debug, Clone, PartialEq)]
pub struct ArbiterEntry {
    pub src: NodeId,
    pub dst: NodeId,
    pub deadline: Option<SimTime>,
    pub remaining: i64,
    pub finished: bool,
}

/// 集中式时隙仲裁器
#[derive(Debug)]
pub struct Arbiter {
    pub node: NodeId,
    pub num_hosts: usize,
    pub slots_per_epoch: usize,
    /// epoch 时长（秒）
    pub epoch: f64,
    pub order: FastpassOrder,
    pub proc_event: Option<EventHandle>,
    pub epochs: u64,
    entries: HashMap<FlowId, ArbiterEntry>,
    sending: WorkingSet<FlowId>,
}

fn rank(order: FastpassOrder, a: &ArbiterEntry, b: &ArbiterEntry) -> Ordering {
    match order {
        FastpassOrder::MostRemaining => a.remaining.cmp(&b.remaining),
        FastpassOrder::FewestRemaining => b.remaining.cmp(&a.remaining),
        FastpassOrder::EarliestDeadline => {
            let key = |e: &ArbiterEntry| e.deadline.map_or(f64::INFINITY, SimTime::as_secs);
            key(b).total_cmp(&key(a))
        }
    }
}

impl Arbiter {
    pub fn new(node: NodeId, cfg: &SimConfig) -> Self {
        Self::with_params(
            node,
            cfg.num_hosts,
            cfg.fastpass_epoch_pkts,
            cfg.fastpass_epoch_time(),
            cfg.effective_fastpass_order(),
        )
    }

    pub fn with_params(
        node: NodeId,
        num_hosts: usize,
        slots_per_epoch: usize,
        epoch: f64,
        order: FastpassOrder,
    ) -> Self {
        Self {
            node,
            num_hosts,
            slots_per_epoch,
            epoch,
            order,
            proc_event: None,
            epochs: 0,
            entries: HashMap::new(),
            sending: WorkingSet::new(),
        }
    }

    /// 处理一个 RTS：第一次见到的流加入待调度集合；负数表示该流已发送完毕
    pub fn receive_rts(
        &mut self,
        flow: FlowId,
        src: NodeId,
        dst: NodeId,
        deadline: Option<SimTime>,
        remaining: i64,
    ) {
        let entry = self.entries.entry(flow).or_insert_with(|| {
            self.sending.push(flow);
            ArbiterEntry {
                src,
                dst,
                deadline,
                remaining: 0,
                finished: false,
            }
        });
        if remaining < 0 {
            entry.remaining = 0;
            entry.finished = true;
        } else {
            entry.remaining = remaining;
        }
        trace!(flow = flow.0, remaining, "仲裁器收到 RTS");
    }

    pub fn entry(&self, flow: FlowId) -> Option<&ArbiterEntry> {
        self.entries.get(&flow)
    }

    /// 待调度集合中的流数（含尚未被清理的已完成流）
    pub fn active_flows(&self) -> usize {
        self.sending.len()
    }

    /// 为一个时隙做贪心匹配，返回 发送端 -> 流。已完成的流在扫描时被移出集合。
    pub fn schedule_timeslot(&mut self) -> BTreeMap<NodeId, FlowId> {
        let mut schedule = BTreeMap::new();
        let mut sender_used = BTreeSet::new();
        let mut receiver_used = BTreeSet::new();

        let entries = &mut self.entries;
        let order = self.order;
        let ranked = self
            .sending
            .drain_ranked_by(|a, b| rank(order, &entries[a], &entries[b]));

        for flow in ranked {
            let Some(e) = entries.get_mut(&flow) else {
                continue;
            };
            if e.finished {
                continue;
            }
            if e.remaining > 0 && !sender_used.contains(&e.src) && !receiver_used.contains(&e.dst) {
                e.remaining -= 1;
                sender_used.insert(e.src);
                receiver_used.insert(e.dst);
                schedule.insert(e.src, flow);
            }
            self.sending.push(flow);
        }
        schedule
    }

    /// 计算一个 epoch 的全部时隙，返回每台主机的时隙表（下标为主机编号）
    pub fn compute_epoch(&mut self, start: SimTime) -> Vec<EpochSchedule> {
        let mut schedules = vec![EpochSchedule::new(start, self.slots_per_epoch); self.num_hosts];
        for slot in 0..self.slots_per_epoch {
            if self.sending.is_empty() {
                break;
            }
            for (src, flow) in self.schedule_timeslot() {
                schedules[src.0].slots[slot] = Some(flow);
            }
        }
        self.epochs += 1;
        schedules
    }
}

/// 事件：仲裁器开始一个新的 epoch
#[derive(Debug)]
pub struct ArbiterProcessing;

impl Event for ArbiterProcessing {
    fn kind(&self) -> EventKind {
        EventKind::ArbiterProcessing
    }

    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let w = world_mut::<NetWorld>(world);
        w.net.on_arbiter_processing(sim);
    }
}

impl Network {
    /// 仲裁器收到 RTS
    pub fn arbiter_receive_rts(&mut self, flow: FlowId, remaining: i64) {
        let f = &self.flows[flow.0];
        let (src, dst, deadline) = (f.src, f.dst, f.deadline);
        match &mut self.arbiter {
            Some(arbiter) => arbiter.receive_rts(flow, src, dst, deadline, remaining),
            None => panic!("RTS for flow {} but no arbiter in this fabric", flow.0),
        }
    }

    /// 一个 epoch：分配时隙、下发时隙表、预约下一个 epoch。全部流完成后停止。
    #[tracing::instrument(skip(self, sim))]
    pub fn on_arbiter_processing(&mut self, sim: &mut Simulator) {
        let now = sim.now();
        let total = self.flows.len() as u64;
        let finished = self.stats.finished_flows;
        let hdr = self.cfg.hdr_size as u32;
        let Some(arbiter) = &mut self.arbiter else {
            return;
        };
        if arbiter.proc_event.map(|h| h.id) == sim.current_event() {
            arbiter.proc_event = None;
        }
        if finished >= total {
            info!(epochs = arbiter.epochs, "🛑 全部流已完成，仲裁器停止");
            return;
        }

        let epoch = arbiter.epoch;
        let node = arbiter.node;
        let schedules = arbiter.compute_epoch(now + epoch);
        let assigned: usize = schedules.iter().map(EpochSchedule::assigned).sum();
        let hosts = schedules.iter().filter(|s| s.first_flow().is_some()).count();
        debug!(assigned, hosts, "🗓️  epoch 时隙分配完成");
        self.viz_epoch(assigned, hosts, now);

        for (host, schedule) in schedules.into_iter().enumerate() {
            let Some(owner) = schedule.first_flow() else {
                continue;
            };
            let kind = PacketKind::FastpassSchedule(schedule);
            let pkt = self.make_packet(owner, kind, 0, hdr, 0.0, node, NodeId(host), now);
            self.inject(pkt, sim);
        }

        let handle = sim.schedule(now + epoch, ArbiterProcessing);
        if let Some(arbiter) = &mut self.arbiter {
            arbiter.proc_event = Some(handle);
        }
    }
}
