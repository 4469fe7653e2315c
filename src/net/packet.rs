//! 数据包类型
//!
//! 定义网络数据包及其种类。

use super::id::{FlowId, NodeId};
use crate::fastpass::EpochSchedule;
use crate::sim::SimTime;

/// 数据包种类
#[derive(Debug, Clone, PartialEq)]
pub enum PacketKind {
    /// 数据段，`seq` 为字节偏移
    Data,
    /// 累计确认，`seq` 为接收端连续收到的字节数，`sack` 为之后零散收到的段
    Ack { sack: Vec<u64> },
    /// 单个数据段的确认（Fastpass 接收端使用）
    PlainAck,
    /// 向仲裁器报告剩余包数；负数表示发送已完成
    FastpassRts { remaining: i64 },
    /// 仲裁器下发给发送主机的 epoch 时隙表
    FastpassSchedule(EpochSchedule),
}

/// 网络数据包
#[derive(Debug, Clone)]
pub struct Packet {
    pub id: u64,
    pub kind: PacketKind,
    pub seq: u64,
    pub size_bytes: u32,
    /// 数值越小优先级越高
    pub priority: f64,
    pub flow: FlowId,
    pub src: NodeId,
    pub dst: NodeId,
    pub sending_time: SimTime,
    pub last_enqueue_time: SimTime,
    pub total_queuing_delay: f64,
}

impl Packet {
    pub fn is_data(&self) -> bool {
        matches!(self.kind, PacketKind::Data)
    }

    pub fn is_ack(&self) -> bool {
        matches!(self.kind, PacketKind::Ack { .. } | PacketKind::PlainAck)
    }
}
