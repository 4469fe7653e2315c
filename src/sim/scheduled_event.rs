//! 调度事件
//!
//! 定义调度事件结构及其优先级比较。

use super::event::{Event, EventKind};
use super::time::SimTime;
use serde::Serialize;
use std::cmp::Ordering;

/// 事件唯一标识，按调度顺序单调递增。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct EventId(pub u64);

/// 事件句柄：由拥有者保存，用于取消或判断“是否仍是我的事件”。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EventHandle {
    pub id: EventId,
    pub at: SimTime,
}

/// 调度事件，包含执行时间、类型、序列号和事件对象。
pub struct ScheduledEvent {
    pub(crate) at: SimTime,
    pub(crate) kind: EventKind,
    pub(crate) id: EventId,
    pub(crate) ev: Box<dyn Event>,
}

impl ScheduledEvent {
    fn key_cmp(&self, other: &Self) -> Ordering {
        if self.at.approx_eq(other.at) {
            self.kind
                .cmp(&other.kind)
                .then_with(|| self.id.cmp(&other.id))
        } else {
            self.at.cmp(&other.at)
        }
    }
}

// BinaryHeap 是 max-heap；我们需要最小时间优先，因此反向比较。
impl Ord for ScheduledEvent {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key_cmp(other).reverse()
    }
}

impl PartialOrd for ScheduledEvent {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for ScheduledEvent {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ScheduledEvent {}
