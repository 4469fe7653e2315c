//! 队列处理事件（用于驱动队列出队）

use super::id::LinkId;
use super::net_world::NetWorld;
use crate::sim::{Event, EventKind, Simulator, World, world_mut};

/// 事件：链路空闲或完成一次序列化发送后触发，尝试发送队列中的下一个 packet。
#[derive(Debug)]
pub struct QueueProcessing {
    pub link: LinkId,
}

impl Event for QueueProcessing {
    fn kind(&self) -> EventKind {
        EventKind::QueueProcessing
    }

    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let QueueProcessing { link } = *self;
        let w = world_mut::<NetWorld>(world);
        w.net.on_queue_processing(link, sim);
    }
}
