//! 统计信息
//!
//! 定义网络仿真统计数据结构。

use serde::Serialize;

use super::link::Hop;

/// 网络统计信息
#[derive(Debug, Default, Clone, Serialize)]
pub struct Stats {
    pub delivered_pkts: u64,
    pub delivered_bytes: u64,
    /// 到达目的主机的数据包数
    pub completed_packets: u64,
    pub arrived_flows: u64,
    pub finished_flows: u64,
    /// 在第一跳之后才被丢弃的数据包（已经占用过上游带宽）
    pub dead_packets: u64,
    /// 按链路位置统计的丢包，下标为 [`Hop::index`]
    pub drops_by_hop: [u64; 4],
    /// 概率丢弃的包数（不计入丢包）
    pub discards: u64,
    pub preemptions: u64,
}

impl Stats {
    pub fn drops_at(&self, hop: Hop) -> u64 {
        self.drops_by_hop[hop.index()]
    }

    pub fn total_drops(&self) -> u64 {
        self.drops_by_hop.iter().sum()
    }
}
