//! 流量输入
//!
//! 要仿真的流要么从 trace 文件读入，要么从经验 CDF 按泊松过程生成。
//! 结果统一为按生成顺序排列的 [`FlowDesc`] 列表。

pub mod cdf;
pub mod poisson;
pub mod trace;

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::Serialize;
use tracing::info;

use crate::config::SimConfig;
use crate::error::WorkloadError;
use crate::net::NodeId;
use crate::sim::SimTime;
use crate::topo::Topology;

pub use cdf::{CdfEntry, EmpiricalCdf};
pub use poisson::{FlowCreation, GenWorld, exponential, permutation_flows, poisson_flows};
pub use trace::{parse_trace, read_trace};

/// 截止时间至少是理想完成时间的这么多倍
pub const DEADLINE_ORACLE_FACTOR: f64 = 1.25;

/// 一条待仿真的流
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowDesc {
    pub id: u64,
    pub start: SimTime,
    pub size: u64,
    pub src: NodeId,
    pub dst: NodeId,
    pub deadline: Option<SimTime>,
}

impl FlowDesc {
    /// 实验类型 2 输出的一行
    pub fn line(&self) -> String {
        format!(
            "{} {:.9} {} {} {}",
            self.id,
            self.start.as_secs(),
            self.size,
            self.src.0,
            self.dst.0
        )
    }
}

/// 按配置得到全部流；启用截止时间时同时分配截止时间
pub fn generate_flows(cfg: &SimConfig, topo: &Topology) -> Result<Vec<FlowDesc>, WorkloadError> {
    if cfg.flow_trace.is_empty() {
        return Err(WorkloadError::NoSource);
    }
    let mut flows = if cfg.use_flow_trace {
        read_trace(&cfg.flow_trace, cfg.mss, topo.num_hosts)?
    } else {
        let sizes = EmpiricalCdf::from_file(&cfg.flow_trace, cfg.smooth_cdf, cfg.bytes_mode)?;
        if cfg.permutation_tm {
            permutation_flows(sizes, topo.num_hosts, cfg.num_flow, cfg.bandwidth, cfg.load, cfg.seed)
        } else {
            poisson_flows(
                sizes,
                topo.num_hosts,
                cfg.num_flow,
                cfg.bandwidth,
                cfg.load,
                cfg.burst_at_beginning,
                cfg.seed,
            )
        }
    };
    if cfg.deadline {
        assign_deadlines(&mut flows, topo, cfg.avg_deadline, cfg.seed);
    }
    info!(flows = flows.len(), "📦 流量准备完成");
    Ok(flows)
}

/// 截止时间 = 开始时间 + max(1.25 × 理想完成时间, Exp(avg_deadline))
pub fn assign_deadlines(flows: &mut [FlowDesc], topo: &Topology, avg_deadline: f64, seed: u64) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed ^ 0xDEAD_11E5);
    for f in flows.iter_mut() {
        let slack = exponential(&mut rng, avg_deadline);
        let oracle = topo.oracle_fct_us(f.size, f.src, f.dst) / 1e6;
        f.deadline = Some(f.start + slack.max(oracle * DEADLINE_ORACLE_FACTOR));
    }
}
