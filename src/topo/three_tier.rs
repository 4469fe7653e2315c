//! 三层拓扑：主机 - 汇聚交换机 - 核心交换机
//!
//! 主机 i 挂在第 i / hosts_per_agg 台汇聚交换机下。每台汇聚交换机向每台核心交换机
//! 各有一条上行链路，速率为 hosts_per_agg * bandwidth / num_core（无收敛比）。
//! Fastpass 实验中仲裁器作为额外主机挂在 0 号汇聚交换机上。

use tracing::info;

use super::{FabricKind, Topology};
use crate::config::{FlowType, HostType, SimConfig};
use crate::net::{Hop, HostRole, NodeId, SwitchTier};

fn host_role(cfg: &SimConfig) -> HostRole {
    match cfg.host_type {
        HostType::Normal => HostRole::Normal,
        HostType::Scheduling => HostRole::Scheduling,
        HostType::Fastpass => HostRole::Fastpass,
    }
}

pub(crate) fn add_hosts(topo: &mut Topology, cfg: &SimConfig) {
    let role = if cfg.flow_type == FlowType::Fastpass {
        HostRole::Fastpass
    } else {
        host_role(cfg)
    };
    for i in 0..cfg.num_hosts {
        topo.add_host(format!("h{i}"), role);
    }
    if cfg.flow_type == FlowType::Fastpass {
        let id = topo.add_host("arbiter", HostRole::Arbiter);
        topo.arbiter = Some(id);
    }
}

/// 构建三层拓扑
pub fn build_three_tier(cfg: &SimConfig) -> Topology {
    let mut topo = Topology::empty(FabricKind::ThreeTier, cfg);
    let num_agg = cfg.num_agg_switches;
    let num_core = cfg.num_core_switches;
    let hpa = cfg.hosts_per_agg();
    let host_rate = cfg.bandwidth;
    let core_rate = hpa as f64 * cfg.bandwidth / num_core as f64;
    topo.hosts_per_agg = hpa;
    topo.core_rate = core_rate;

    add_hosts(&mut topo, cfg);
    let aggs: Vec<_> = (0..num_agg)
        .map(|i| topo.add_switch(format!("agg{i}"), SwitchTier::Agg, i))
        .collect();
    let cores: Vec<_> = (0..num_core)
        .map(|i| topo.add_switch(format!("core{i}"), SwitchTier::Core, i))
        .collect();

    // 主机 <-> 汇聚
    for h in 0..cfg.num_hosts {
        let host = NodeId(h);
        let agg = aggs[h / hpa];
        topo.connect(host, agg, Hop::HostUp, host_rate);
        let down = topo.connect(agg, host, Hop::HostDown, host_rate);
        topo.switch_mut(agg).down.push(down);
    }

    // 汇聚 <-> 核心
    for &agg in &aggs {
        for &core in &cores {
            let up = topo.connect(agg, core, Hop::AggUp, core_rate);
            topo.switch_mut(agg).up.push(up);
        }
    }
    for &core in &cores {
        for &agg in &aggs {
            let down = topo.connect(core, agg, Hop::CoreDown, core_rate);
            topo.switch_mut(core).down.push(down);
        }
    }

    if let Some(arbiter) = topo.arbiter {
        let agg0 = aggs[0];
        topo.connect(arbiter, agg0, Hop::HostUp, host_rate);
        let port = topo.connect(agg0, arbiter, Hop::HostDown, host_rate);
        topo.switch_mut(agg0).arbiter_port = Some(port);
    }

    topo.agg_switches = aggs;
    topo.core_switches = cores;
    info!(
        hosts = cfg.num_hosts,
        aggs = num_agg,
        cores = num_core,
        links = topo.links.len(),
        "🏗️  三层拓扑构建完成"
    );
    topo
}
