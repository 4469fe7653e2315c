//! 事件 trait
//!
//! 定义仿真事件接口与事件类型标签。

use super::simulator::Simulator;
use super::world::World;
use serde::Serialize;

/// 事件类型。同一时刻的事件按标签从小到大执行。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
#[repr(u32)]
pub enum EventKind {
    FlowArrival = 0,
    PacketQueuing = 1,
    PacketArrival = 2,
    QueueProcessing = 3,
    RetxTimeout = 5,
    FlowFinished = 6,
    FlowProcessing = 7,
    FlowCreation = 8,
    Logging = 9,
    HostProcessing = 10,
    ArbiterProcessing = 14,
    FastpassFlowProcessing = 15,
    FastpassTimeout = 16,
}

impl EventKind {
    pub fn tag(self) -> u32 {
        self as u32
    }

    /// 周期性日志事件不参与死循环检测
    pub fn exempt_from_watchdog(self) -> bool {
        self == EventKind::Logging
    }
}

/// 事件：可被调度执行。使用 `self: Box<Self>` 以支持 move/所有权转移。
pub trait Event: Send + 'static {
    fn kind(&self) -> EventKind;
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World);
}
