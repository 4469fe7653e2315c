//! 泊松流量生成
//!
//! 生成过程本身也是一次离散事件仿真：每个 (src, dst) 对一个 [`FlowCreation`] 事件链，
//! 每次触发生成一条流并按指数间隔预约下一次，直到凑够目标流数。

use std::any::Any;
use std::collections::BTreeSet;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, warn};

use super::FlowDesc;
use super::cdf::{CDF_PKT_BYTES, EmpiricalCdf};
use crate::net::NodeId;
use crate::sim::{Event, EventKind, SimTime, Simulator, World, world_mut};

/// 第一批流的起始时刻（秒）
pub const FIRST_FLOW_TIME: f64 = 1.0;
/// 包数模式下单条流的上限
pub const MAX_FLOW_PKTS: u64 = 2_500_000;
/// `burst_at_beginning` 时的平均到达间隔（秒）
const BURST_INTERARRIVAL: f64 = 1e-7;

/// 均值为 `mean` 的指数分布
pub fn exponential<R: Rng>(rng: &mut R, mean: f64) -> f64 {
    let u: f64 = rng.gen_range(0.0..1.0);
    -mean * (1.0 - u).ln()
}

/// 生成过程的世界
#[derive(Debug)]
pub struct GenWorld {
    pub rng: ChaCha8Rng,
    pub sizes: EmpiricalCdf,
    pub target: usize,
    /// 已经尝试生成的次数，用作流编号
    pub created: u64,
    pub flows: Vec<FlowDesc>,
}

impl GenWorld {
    pub fn new(sizes: EmpiricalCdf, target: usize, seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            sizes,
            target,
            created: 0,
            flows: Vec::new(),
        }
    }

    /// 采样一条流的字节数；包数模式四舍五入并封顶，字节模式截断
    fn sample_size(&mut self) -> u64 {
        let v = self.sizes.sample(&mut self.rng);
        if self.sizes.bytes_mode() {
            return v as u64;
        }
        let mut pkts = (v + 0.5) as u64;
        if pkts > MAX_FLOW_PKTS {
            warn!(pkts, "超大流，截断到上限");
            pkts = MAX_FLOW_PKTS;
        }
        pkts * CDF_PKT_BYTES as u64
    }
}

impl World for GenWorld {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// 事件：为一对主机生成一条流
#[derive(Debug, Clone, Copy)]
pub struct FlowCreation {
    pub src: NodeId,
    pub dst: NodeId,
    pub mean_interarrival: f64,
}

impl Event for FlowCreation {
    fn kind(&self) -> EventKind {
        EventKind::FlowCreation
    }

    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let w = world_mut::<GenWorld>(world);
        if w.flows.len() >= w.target {
            return;
        }
        let now = sim.now();
        let id = w.created;
        w.created += 1;
        let size = w.sample_size();
        if size != 0 {
            w.flows.push(FlowDesc {
                id,
                start: now,
                size,
                src: self.src,
                dst: self.dst,
                deadline: None,
            });
        }
        let next = now + exponential(&mut w.rng, self.mean_interarrival);
        sim.schedule(next, *self);
    }
}

fn run_generation(mut world: GenWorld, pairs: Vec<(NodeId, NodeId)>, mean_interarrival: f64) -> Vec<FlowDesc> {
    let mut sim = Simulator::with_watchdog_limit(u64::MAX);
    for (src, dst) in pairs {
        let first = FIRST_FLOW_TIME + exponential(&mut world.rng, mean_interarrival);
        sim.schedule(
            SimTime::from_secs(first),
            FlowCreation {
                src,
                dst,
                mean_interarrival,
            },
        );
    }
    let summary = sim.run(&mut world);
    debug!(events = summary.processed, "流量生成结束");
    world.flows
}

/// 所有主机两两之间独立的泊松到达
pub fn poisson_flows(
    sizes: EmpiricalCdf,
    num_hosts: usize,
    num_flows: usize,
    bandwidth: f64,
    load: f64,
    burst: bool,
    seed: u64,
) -> Vec<FlowDesc> {
    let lambda = bandwidth * load / sizes.mean_wire_bits();
    let lambda_per_pair = lambda / (num_hosts - 1) as f64;
    info!(lambda_per_pair, mean_bytes = sizes.mean_bytes(), "🎲 泊松流量生成");
    let mean = if burst { BURST_INTERARRIVAL } else { 1.0 / lambda_per_pair };

    let pairs = (0..num_hosts)
        .flat_map(|i| (0..num_hosts).filter(move |&j| j != i).map(move |j| (NodeId(i), NodeId(j))))
        .collect();
    run_generation(GenWorld::new(sizes, num_flows, seed), pairs, mean)
}

/// 置换流量矩阵：每台主机固定发往一个互不相同的目的主机
pub fn permutation_flows(
    sizes: EmpiricalCdf,
    num_hosts: usize,
    num_flows: usize,
    bandwidth: f64,
    load: f64,
    seed: u64,
) -> Vec<FlowDesc> {
    let lambda = bandwidth * load / sizes.mean_wire_bits();
    info!(lambda, "🎲 置换流量生成");
    let mut world = GenWorld::new(sizes, num_flows, seed);

    let mut used = BTreeSet::new();
    let mut pairs = Vec::with_capacity(num_hosts);
    for i in 0..num_hosts {
        let free: Vec<usize> = (0..num_hosts).filter(|j| *j != i && !used.contains(j)).collect();
        if free.is_empty() {
            warn!(host = i, "没有可用的目的主机，跳过");
            continue;
        }
        let j = free[world.rng.gen_range(0..free.len())];
        used.insert(j);
        pairs.push((NodeId(i), NodeId(j)));
    }
    run_generation(world, pairs, 1.0 / lambda)
}
