//! 链路类型
//!
//! 一条单向链路 = 出端口队列 + 发送器。发送器同一时刻只发送一个包，
//! `proc_event` 指向“本次发送完成”的事件，`busy_events` 记录依赖本次发送的全部事件，
//! 抢占时一起取消。

use serde::Serialize;

use super::id::{LinkId, NodeId};
use super::packet::Packet;
use crate::queue::PacketQueue;
use crate::sim::EventHandle;

/// 链路在拓扑中的位置（用于按跳统计丢包）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Hop {
    /// 主机 -> 汇聚/单交换机
    HostUp = 0,
    /// 汇聚 -> 核心
    AggUp = 1,
    /// 核心 -> 汇聚
    CoreDown = 2,
    /// 交换机 -> 主机
    HostDown = 3,
}

impl Hop {
    pub fn index(self) -> usize {
        self as usize
    }
}

/// 链路计数器
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct LinkStats {
    pub pkt_arrivals: u64,
    pub byte_arrivals: u64,
    pub pkt_departures: u64,
    pub byte_departures: u64,
    pub drops: u64,
    pub discards: u64,
    pub preemptions: u64,
}

/// 网络链路
#[derive(Debug)]
pub struct Link {
    pub id: LinkId,
    pub from: NodeId,
    pub to: NodeId,
    pub hop: Hop,
    /// 传播时延（秒）
    pub propagation_delay: f64,
    /// 速率（bit/s）
    pub rate_bps: f64,
    pub queue: Box<dyn PacketQueue>,
    pub busy: bool,
    /// 正在发送的包（副本；抢占时重新入队）
    pub transmitting: Option<Packet>,
    pub proc_event: Option<EventHandle>,
    pub busy_events: Vec<EventHandle>,
    /// 逐包轮询负载均衡使用的计数器
    pub spray_counter: usize,
    pub stats: LinkStats,
}

impl Link {
    /// 创建新链路
    pub fn new(
        id: LinkId,
        from: NodeId,
        to: NodeId,
        hop: Hop,
        propagation_delay: f64,
        rate_bps: f64,
        queue: Box<dyn PacketQueue>,
    ) -> Self {
        Self {
            id,
            from,
            to,
            hop,
            propagation_delay,
            rate_bps,
            queue,
            busy: false,
            transmitting: None,
            proc_event: None,
            busy_events: Vec::new(),
            spray_counter: 0,
            stats: LinkStats::default(),
        }
    }

    /// 发送 `bytes` 字节所需的串行化时间（秒）
    pub fn tx_delay(&self, bytes: u64) -> f64 {
        bytes as f64 * 8.0 / self.rate_bps
    }
}
