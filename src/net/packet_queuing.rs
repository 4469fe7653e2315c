//! 包入队事件

use super::id::LinkId;
use super::net_world::NetWorld;
use super::packet::Packet;
use crate::sim::{Event, EventKind, Simulator, World, world_mut};

/// 事件：包到达某条链路的出端口队列（来自源主机或上一跳）。
#[derive(Debug)]
pub struct PacketQueuing {
    pub link: LinkId,
    pub pkt: Packet,
}

impl Event for PacketQueuing {
    fn kind(&self) -> EventKind {
        EventKind::PacketQueuing
    }

    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let PacketQueuing { link, pkt } = *self;
        let w = world_mut::<NetWorld>(world);
        w.net.on_packet_queuing(link, pkt, sim);
    }
}
