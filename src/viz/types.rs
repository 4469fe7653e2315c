//! 轨迹事件的序列化类型

use serde::{Deserialize, Serialize};

/// 轨迹事件类型
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum VizEventKind {
    /// 拓扑元信息（t=0 的第一条事件）
    Meta {
        nodes: Vec<VizNodeInfo>,
        links: Vec<VizLinkInfo>,
    },
    /// packet 出队并开始在链路上序列化
    TxStart {
        link: usize,
        link_from: usize,
        link_to: usize,
        q_bytes: u64,
        depart_us: f64,
    },
    /// 包在队列处被丢弃
    Drop {
        link: usize,
        hop: u8,
        reason: VizDropReason,
        q_bytes: u64,
        q_cap_bytes: u64,
    },
    /// 正在发送的包被更高优先级的包抢占
    Preempt { link: usize },
    /// 包到达目的主机
    Delivered { node: usize },
    /// 重传定时器超时
    RetxTimeout { last_unacked: u64, cwnd: u64 },
    /// 流完成
    FlowFinished { fct_us: f64, slowdown: f64 },
    /// 仲裁器完成一个 epoch 的时隙分配
    FastpassEpoch { assigned: usize, hosts: usize },
}

/// 丢包原因
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VizDropReason {
    /// 队列满，丢弃到达的包
    Overflow,
    /// 优先级逐出
    Evicted,
    /// 概率丢弃
    Random,
}

/// packet 的类别（便于上色）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VizPacketKind {
    Data,
    Ack,
    Control,
}

/// 节点类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VizNodeKind {
    Host,
    Switch,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VizNodeInfo {
    pub id: usize,
    pub name: String,
    pub kind: VizNodeKind,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VizLinkInfo {
    pub id: usize,
    pub from: usize,
    pub to: usize,
    /// 单向链路带宽（bps）
    pub bandwidth_bps: f64,
    /// 单向传播时延（us）
    pub latency_us: f64,
    /// 队列容量（bytes）
    pub q_cap_bytes: u64,
}

/// 一条轨迹事件（JSON）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VizEvent {
    /// 仿真时间（微秒）
    pub t_us: f64,
    pub pkt_id: Option<u64>,
    pub flow_id: Option<usize>,
    pub pkt_bytes: Option<u32>,
    pub pkt_kind: Option<VizPacketKind>,
    #[serde(flatten)]
    pub kind: VizEventKind,
}

/// 一个简单的事件收集器（存内存，仿真结束写 JSON 文件）
#[derive(Debug, Default)]
pub struct VizLogger {
    pub events: Vec<VizEvent>,
}

impl VizLogger {
    pub fn push(&mut self, ev: VizEvent) {
        self.events.push(ev);
    }
}
