//! 网络世界实现
//!
//! 定义网络仿真的世界（World）实现，持有网络拓扑与全部流。

use super::network::Network;
use crate::config::SimConfig;
use crate::sim::{RunSummary, Simulator, World};
use crate::workload::FlowDesc;
use std::any::Any;
use tracing::{info, warn};

/// 网络世界：持有 Network。
pub struct NetWorld {
    pub net: Network,
}

impl NetWorld {
    pub fn new(cfg: SimConfig) -> Self {
        Self {
            net: Network::new(cfg),
        }
    }

    /// 注册全部流并运行到事件队列为空（或触发死循环检测）
    pub fn run(&mut self, flows: &[FlowDesc]) -> RunSummary {
        for f in flows {
            self.net.add_flow(f);
        }
        let mut sim = Simulator::with_watchdog_limit(self.net.cfg.watchdog_limit);
        self.net.schedule_arrivals(&mut sim);
        let summary = sim.run(self);
        if let Some(dead) = summary.dead_loop {
            warn!(kind = ?dead.kind, at = dead.at.as_secs(), "仿真因死循环提前结束");
        }
        info!(
            finished = self.net.stats.finished_flows,
            total = self.net.flows.len(),
            drops = self.net.stats.total_drops(),
            "📊 仿真结束"
        );
        summary
    }
}

impl World for NetWorld {
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
