//! 节点类型
//!
//! 主机只有一个出端口；交换机每个出端口一条链路，按用途分成下行与上行两组。

use super::id::{FlowId, LinkId, NodeId};
use crate::sched::WorkingSet;
use crate::sim::EventHandle;

/// 主机角色
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostRole {
    Normal,
    /// 按工作集挑选下一条要发送的流
    Scheduling,
    /// 按仲裁器下发的时隙发送
    Fastpass,
    /// Fastpass 仲裁器所在主机
    Arbiter,
}

/// 交换机层级
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwitchTier {
    Agg,
    Core,
    /// 单交换机拓扑中唯一的交换机
    Single,
}

/// 主机节点
#[derive(Debug)]
pub struct Host {
    pub id: NodeId,
    pub name: String,
    pub role: HostRole,
    /// 出端口链路，拓扑建好后一定存在
    pub link: Option<LinkId>,
    /// 调度主机：待发送流的工作集
    pub sending: WorkingSet<FlowId>,
    /// 调度主机：下一次处理事件
    pub proc_event: Option<EventHandle>,
}

impl Host {
    /// 创建新主机
    pub fn new(id: NodeId, name: impl Into<String>, role: HostRole) -> Self {
        Self {
            id,
            name: name.into(),
            role,
            link: None,
            sending: WorkingSet::new(),
            proc_event: None,
        }
    }
}

/// 交换机节点
#[derive(Debug)]
pub struct Switch {
    pub id: NodeId,
    pub name: String,
    pub tier: SwitchTier,
    /// 同层内的编号（第几台汇聚/核心交换机）
    pub index: usize,
    /// 下行端口：汇聚交换机按机架内主机序号，核心交换机按汇聚交换机序号
    pub down: Vec<LinkId>,
    /// 上行端口：汇聚交换机按核心交换机序号
    pub up: Vec<LinkId>,
    /// 通往仲裁器的端口（仅挂仲裁器的那台交换机有）
    pub arbiter_port: Option<LinkId>,
}

impl Switch {
    /// 创建新交换机
    pub fn new(id: NodeId, name: impl Into<String>, tier: SwitchTier, index: usize) -> Self {
        Self {
            id,
            name: name.into(),
            tier,
            index,
            down: Vec::new(),
            up: Vec::new(),
            arbiter_port: None,
        }
    }
}

/// 节点
#[derive(Debug)]
pub enum Node {
    Host(Host),
    Switch(Switch),
}

impl Node {
    /// 获取节点标识符
    pub fn id(&self) -> NodeId {
        match self {
            Node::Host(h) => h.id,
            Node::Switch(s) => s.id,
        }
    }

    /// 获取节点名称
    pub fn name(&self) -> &str {
        match self {
            Node::Host(h) => &h.name,
            Node::Switch(s) => &s.name,
        }
    }
}
