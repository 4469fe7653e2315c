//! 数据包到达事件
//!
//! 包离开最后一跳链路并经过传播时延后，交给目的主机上的流处理。

use super::net_world::NetWorld;
use super::packet::Packet;
use crate::sim::{Event, EventKind, Simulator, World, world_mut};
use tracing::trace;

/// 事件：把一个 packet 交给目的主机。
#[derive(Debug)]
pub struct PacketArrival {
    pub pkt: Packet,
}

impl Event for PacketArrival {
    fn kind(&self) -> EventKind {
        EventKind::PacketArrival
    }

    #[tracing::instrument(skip(self, sim, world), fields(pkt_id = self.pkt.id, flow = self.pkt.flow.0))]
    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let PacketArrival { pkt } = *self;
        let w = world_mut::<NetWorld>(world);
        w.net.on_packet_arrival(pkt, sim);
        trace!("PacketArrival::execute 完成");
    }
}
