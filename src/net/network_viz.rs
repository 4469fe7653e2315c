//! 网络层的轨迹记录

use crate::sim::SimTime;
use crate::viz::{
    VizDropReason, VizEvent, VizEventKind, VizLinkInfo, VizNodeInfo, VizNodeKind, VizPacketKind,
};

use super::{FlowId, LinkId, Network, Node, Packet, PacketKind};

impl Network {
    pub(crate) fn pkt_kind(pkt: &Packet) -> VizPacketKind {
        match &pkt.kind {
            PacketKind::Data => VizPacketKind::Data,
            PacketKind::Ack { .. } | PacketKind::PlainAck => VizPacketKind::Ack,
            PacketKind::FastpassRts { .. } | PacketKind::FastpassSchedule(_) => {
                VizPacketKind::Control
            }
        }
    }

    fn viz_push(&mut self, ev: VizEvent) {
        if let Some(v) = &mut self.viz {
            v.push(ev);
        }
    }

    fn viz_pkt(&mut self, pkt: &Packet, now: SimTime, kind: VizEventKind) {
        if self.viz.is_none() {
            return;
        }
        self.viz_push(VizEvent {
            t_us: now.as_micros(),
            pkt_id: Some(pkt.id),
            flow_id: Some(pkt.flow.0),
            pkt_bytes: Some(pkt.size_bytes),
            pkt_kind: Some(Self::pkt_kind(pkt)),
            kind,
        });
    }

    pub fn emit_viz_meta(&mut self) {
        if self.viz.is_none() {
            return;
        }
        let nodes = self
            .topo
            .nodes
            .iter()
            .map(|n| VizNodeInfo {
                id: n.id().0,
                name: n.name().to_string(),
                kind: match n {
                    Node::Host(_) => VizNodeKind::Host,
                    Node::Switch(_) => VizNodeKind::Switch,
                },
            })
            .collect::<Vec<_>>();
        let links = self
            .topo
            .links
            .iter()
            .map(|l| VizLinkInfo {
                id: l.id.0,
                from: l.from.0,
                to: l.to.0,
                bandwidth_bps: l.rate_bps,
                latency_us: l.propagation_delay * 1e6,
                q_cap_bytes: l.queue.capacity_bytes(),
            })
            .collect::<Vec<_>>();
        self.viz_push(VizEvent {
            t_us: 0.0,
            pkt_id: None,
            flow_id: None,
            pkt_bytes: None,
            pkt_kind: None,
            kind: VizEventKind::Meta { nodes, links },
        });
    }

    pub(crate) fn viz_flow_event(&mut self, flow: FlowId, kind: VizEventKind, now: SimTime) {
        self.viz_push(VizEvent {
            t_us: now.as_micros(),
            pkt_id: None,
            flow_id: Some(flow.0),
            pkt_bytes: None,
            pkt_kind: None,
            kind,
        });
    }

    pub(crate) fn viz_tx_start(&mut self, pkt: &Packet, link: LinkId, depart: SimTime, now: SimTime) {
        let l = self.topo.link(link);
        let kind = VizEventKind::TxStart {
            link: link.0,
            link_from: l.from.0,
            link_to: l.to.0,
            q_bytes: l.queue.bytes(),
            depart_us: depart.as_micros(),
        };
        self.viz_pkt(pkt, now, kind);
    }

    pub(crate) fn viz_drop(&mut self, pkt: &Packet, link: LinkId, reason: VizDropReason, now: SimTime) {
        let l = self.topo.link(link);
        let kind = VizEventKind::Drop {
            link: link.0,
            hop: l.hop.index() as u8,
            reason,
            q_bytes: l.queue.bytes(),
            q_cap_bytes: l.queue.capacity_bytes(),
        };
        self.viz_pkt(pkt, now, kind);
    }

    pub(crate) fn viz_preempt(&mut self, pkt: &Packet, link: LinkId, now: SimTime) {
        self.viz_pkt(pkt, now, VizEventKind::Preempt { link: link.0 });
    }

    pub(crate) fn viz_delivered(&mut self, pkt: &Packet, now: SimTime) {
        let node = pkt.dst.0;
        self.viz_pkt(pkt, now, VizEventKind::Delivered { node });
    }

    pub(crate) fn viz_epoch(&mut self, assigned: usize, hosts: usize, now: SimTime) {
        self.viz_push(VizEvent {
            t_us: now.as_micros(),
            pkt_id: None,
            flow_id: None,
            pkt_bytes: None,
            pkt_kind: None,
            kind: VizEventKind::FastpassEpoch { assigned, hosts },
        });
    }
}
