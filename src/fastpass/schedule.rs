//! 仲裁器下发给发送主机的时隙表

use crate::net::FlowId;
use crate::sim::SimTime;

/// 一个 epoch 内某台发送主机的时隙表：每个时隙至多分给一条流
#[derive(Debug, Clone, PartialEq)]
pub struct EpochSchedule {
    pub start: SimTime,
    pub slots: Vec<Option<FlowId>>,
}

impl EpochSchedule {
    pub fn new(start: SimTime, num_slots: usize) -> Self {
        Self {
            start,
            slots: vec![None; num_slots],
        }
    }

    /// 第一个被分配的流（时隙表随它的包一起发送）
    pub fn first_flow(&self) -> Option<FlowId> {
        self.slots.iter().flatten().next().copied()
    }

    pub fn assigned(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }
}
