//! 仿真器
//!
//! 定义事件驱动仿真器，维护当前时间与事件队列。
//!
//! 取消是惰性的：被取消的事件仍留在堆中，弹出时直接丢弃。

use super::event::{Event, EventKind};
use super::scheduled_event::{EventHandle, EventId, ScheduledEvent};
use super::time::SimTime;
use super::world::World;
use serde::Serialize;
use std::collections::{BinaryHeap, HashSet};
use tracing::{debug, info, trace, warn};

/// 连续同类事件超过该次数即判定为死循环
pub const DEFAULT_WATCHDOG_LIMIT: u64 = 100_000;

/// 死循环检测结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DeadLoop {
    pub kind: EventKind,
    pub at: SimTime,
}

/// 一次运行的汇总
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub processed: u64,
    pub skipped_cancelled: u64,
    pub dead_loop: Option<DeadLoop>,
}

#[derive(Debug, Default)]
struct Watchdog {
    last: Option<EventKind>,
    repeats: u64,
}

impl Watchdog {
    /// 记录一次执行，返回是否触发
    fn observe(&mut self, kind: EventKind, limit: u64) -> bool {
        if self.last == Some(kind) && !kind.exempt_from_watchdog() {
            self.repeats += 1;
        } else {
            self.repeats = 0;
        }
        self.last = Some(kind);
        self.repeats > limit
    }
}

/// 事件驱动仿真器：维护当前时间与事件队列。
pub struct Simulator {
    now: SimTime,
    next_id: u64,
    q: BinaryHeap<ScheduledEvent>,
    live: HashSet<EventId>,
    cancelled: HashSet<EventId>,
    current: Option<EventId>,
    watchdog_limit: u64,
    watchdog: Watchdog,
}

impl Default for Simulator {
    fn default() -> Self {
        Self {
            now: SimTime::ZERO,
            next_id: 0,
            q: BinaryHeap::new(),
            live: HashSet::new(),
            cancelled: HashSet::new(),
            current: None,
            watchdog_limit: DEFAULT_WATCHDOG_LIMIT,
            watchdog: Watchdog::default(),
        }
    }
}

impl Simulator {
    /// 使用自定义死循环阈值
    pub fn with_watchdog_limit(limit: u64) -> Self {
        Self {
            watchdog_limit: limit,
            ..Self::default()
        }
    }

    /// 获取当前仿真时间
    pub fn now(&self) -> SimTime {
        self.now
    }

    /// 正在执行的事件（仅在 `execute` 内有值）
    pub fn current_event(&self) -> Option<EventId> {
        self.current
    }

    /// 尚未执行且未被取消的事件数
    pub fn pending(&self) -> usize {
        self.live.len()
    }

    /// 事件是否仍在队列中且未被取消
    pub fn is_pending(&self, id: EventId) -> bool {
        self.live.contains(&id)
    }

    /// 调度事件在指定时间执行
    #[tracing::instrument(skip(self, ev), fields(event_type = std::any::type_name::<E>(), schedule_at = ?at))]
    pub fn schedule<E: Event>(&mut self, at: SimTime, ev: E) -> EventHandle {
        let id = EventId(self.next_id);
        self.next_id = self.next_id.wrapping_add(1);
        trace!(now = ?self.now, ?id, "调度事件");

        self.live.insert(id);
        self.q.push(ScheduledEvent {
            at,
            kind: ev.kind(),
            id,
            ev: Box::new(ev),
        });
        EventHandle { id, at }
    }

    /// 取消一个尚未执行的事件。已执行或已取消的事件返回 false。
    pub fn cancel(&mut self, id: EventId) -> bool {
        if self.live.remove(&id) {
            self.cancelled.insert(id);
            trace!(?id, "取消事件");
            true
        } else {
            false
        }
    }

    /// 弹出并执行一个事件。返回 None 表示队列已空。
    fn step(&mut self, world: &mut dyn World, summary: &mut RunSummary) -> Option<()> {
        let item = self.q.pop()?;
        self.now = item.at;
        if self.cancelled.remove(&item.id) {
            summary.skipped_cancelled += 1;
            return Some(());
        }
        self.live.remove(&item.id);

        let kind = item.kind;
        self.current = Some(item.id);
        item.ev.execute(self, world);
        self.current = None;
        world.on_tick(self);
        summary.processed += 1;

        if self.watchdog.observe(kind, self.watchdog_limit) {
            warn!(?kind, at = ?self.now, "⚠️  检测到事件死循环，停止仿真");
            summary.dead_loop = Some(DeadLoop { kind, at: self.now });
        }
        Some(())
    }

    /// 运行直到事件队列为空或到达 `until`。
    pub fn run_until(&mut self, until: SimTime, world: &mut dyn World) -> RunSummary {
        let mut summary = RunSummary::default();
        while let Some(top) = self.q.peek() {
            if top.at > until {
                break;
            }
            self.step(world, &mut summary);
            if summary.dead_loop.is_some() {
                return summary;
            }
        }
        self.now = self.now.max(until);
        summary
    }

    /// 运行所有事件直到队列为空。
    #[tracing::instrument(skip(self, world))]
    pub fn run(&mut self, world: &mut dyn World) -> RunSummary {
        info!("▶️  开始运行仿真");
        debug!(now = ?self.now, queue_size = self.q.len(), "初始状态");

        let mut summary = RunSummary::default();
        while self.step(world, &mut summary).is_some() {
            if summary.dead_loop.is_some() {
                break;
            }
        }

        info!(
            processed = summary.processed,
            skipped = summary.skipped_cancelled,
            final_time = ?self.now,
            "✅ 仿真完成"
        );
        summary
    }
}
