//! 单交换机拓扑：所有主机（以及仲裁器）挂在同一台交换机上

use tracing::info;

use super::three_tier::add_hosts;
use super::{FabricKind, Topology};
use crate::config::SimConfig;
use crate::net::{Hop, NodeId, SwitchTier};

/// 构建单交换机拓扑
pub fn build_single_switch(cfg: &SimConfig) -> Topology {
    let mut topo = Topology::empty(FabricKind::SingleSwitch, cfg);
    let rate = cfg.bandwidth;

    add_hosts(&mut topo, cfg);
    let sw = topo.add_switch("switch", SwitchTier::Single, 0);

    for h in 0..cfg.num_hosts {
        let host = NodeId(h);
        topo.connect(host, sw, Hop::HostUp, rate);
        let down = topo.connect(sw, host, Hop::HostDown, rate);
        topo.switch_mut(sw).down.push(down);
    }
    if let Some(arbiter) = topo.arbiter {
        topo.connect(arbiter, sw, Hop::HostUp, rate);
        let port = topo.connect(sw, arbiter, Hop::HostDown, rate);
        topo.switch_mut(sw).arbiter_port = Some(port);
    }

    topo.agg_switches = vec![sw];
    info!(hosts = cfg.num_hosts, links = topo.links.len(), "🏗️  单交换机拓扑构建完成");
    topo
}
