use crate::config::SimConfig;
use crate::net::{LinkId, NetWorld, Network, NodeId};
use crate::sim::SimTime;
use crate::viz::{VizEventKind, VizLogger};
use crate::workload::FlowDesc;

mod config_parse;
mod flows;
mod queues;
mod report;
mod scheduling_host;
mod simulator;

/// 2 台主机挂在一台交换机上
pub(crate) fn two_hosts(extra: &str) -> SimConfig {
    SimConfig::parse(&format!("big_switch: 1\nnum_hosts: 2\n{extra}")).expect("config")
}

pub(crate) fn flow_desc(id: u64, start_us: f64, size: u64, src: usize, dst: usize) -> FlowDesc {
    FlowDesc {
        id,
        start: SimTime::from_micros(start_us),
        size,
        src: NodeId(src),
        dst: NodeId(dst),
        deadline: None,
    }
}

/// 打开轨迹记录的仿真世界
pub(crate) fn traced_world(cfg: SimConfig) -> NetWorld {
    let mut world = NetWorld::new(cfg);
    world.net.viz = Some(VizLogger::default());
    world
}

/// 某条链路上每次开始发送的 (时刻 us, 包 id)
pub(crate) fn tx_starts(net: &Network, link: LinkId) -> Vec<(f64, u64)> {
    let Some(viz) = &net.viz else {
        return Vec::new();
    };
    viz.events
        .iter()
        .filter_map(|ev| match ev.kind {
            VizEventKind::TxStart { link: l, .. } if l == link.0 => {
                Some((ev.t_us, ev.pkt_id.expect("tx_start has a packet")))
            }
            _ => None,
        })
        .collect()
}
