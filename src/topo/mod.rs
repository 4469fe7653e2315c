//! 拓扑
//!
//! 持有全部节点与链路，回答“下一跳”和“理想完成时间”两类查询。
//! 构建完成后结构不再变化，只有链路上的计数器和发送状态会更新。

pub mod single_switch;
pub mod three_tier;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::debug;

use crate::config::{LoadBalancing, SimConfig};
use crate::net::{Hop, Host, HostRole, Link, LinkId, Node, NodeId, Packet, Switch, SwitchTier};
use crate::queue::build_queue;

pub use single_switch::build_single_switch;
pub use three_tier::build_three_tier;

/// 拓扑形态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FabricKind {
    /// 主机 -> 汇聚 -> 核心
    ThreeTier,
    /// 所有主机挂在一台交换机上
    SingleSwitch,
}

/// 按配置构建拓扑
pub fn build(cfg: &SimConfig) -> Topology {
    if cfg.big_switch {
        build_single_switch(cfg)
    } else {
        build_three_tier(cfg)
    }
}

/// 网络拓扑
#[derive(Debug)]
pub struct Topology {
    pub kind: FabricKind,
    pub nodes: Vec<Node>,
    pub links: Vec<Link>,
    pub num_hosts: usize,
    pub arbiter: Option<NodeId>,
    pub agg_switches: Vec<NodeId>,
    pub core_switches: Vec<NodeId>,
    pub hosts_per_agg: usize,
    pub load_balancing: LoadBalancing,
    pub cut_through: bool,
    pub host_rate: f64,
    pub core_rate: f64,
    pub propagation_delay: f64,
    pub mss: u64,
    pub hdr_size: u64,
    queue_cfg: QueueCfg,
    rng: ChaCha8Rng,
}

#[derive(Debug, Clone)]
struct QueueCfg {
    kind: crate::config::QueueType,
    capacity: u64,
    drop_prob: f64,
    seed: u64,
}

impl Topology {
    pub(crate) fn empty(kind: FabricKind, cfg: &SimConfig) -> Self {
        Self {
            kind,
            nodes: Vec::new(),
            links: Vec::new(),
            num_hosts: cfg.num_hosts,
            arbiter: None,
            agg_switches: Vec::new(),
            core_switches: Vec::new(),
            hosts_per_agg: cfg.num_hosts,
            load_balancing: cfg.load_balancing,
            cut_through: cfg.cut_through,
            host_rate: cfg.bandwidth,
            core_rate: cfg.bandwidth,
            propagation_delay: cfg.propagation_delay,
            mss: cfg.mss,
            hdr_size: cfg.hdr_size,
            queue_cfg: QueueCfg {
                kind: cfg.queue_type,
                capacity: cfg.queue_size,
                drop_prob: cfg.drop_prob,
                seed: cfg.seed,
            },
            rng: ChaCha8Rng::seed_from_u64(cfg.seed),
        }
    }

    /// 添加主机节点；出端口由随后的 `connect` 填上
    pub fn add_host(&mut self, name: impl Into<String>, role: HostRole) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::Host(Host::new(id, name, role)));
        id
    }

    /// 添加交换机节点
    pub fn add_switch(&mut self, name: impl Into<String>, tier: SwitchTier, index: usize) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node::Switch(Switch::new(id, name, tier, index)));
        id
    }

    /// 连接两个节点（创建单向链路）。从主机出发的链路自动成为该主机的出端口。
    pub fn connect(&mut self, from: NodeId, to: NodeId, hop: Hop, rate_bps: f64) -> LinkId {
        let id = LinkId(self.links.len());
        let q = &self.queue_cfg;
        let queue = build_queue(q.kind, q.capacity, q.drop_prob, mix64(q.seed ^ id.0 as u64));
        let mut link = Link::new(id, from, to, hop, self.propagation_delay, rate_bps, queue);
        link.spray_counter = self.rng.gen_range(0..1usize << 16);
        self.links.push(link);
        if let Node::Host(h) = &mut self.nodes[from.0] {
            h.link = Some(id);
        }
        id
    }

    pub fn host(&self, id: NodeId) -> &Host {
        match &self.nodes[id.0] {
            Node::Host(h) => h,
            Node::Switch(s) => panic!("{} is a switch, not a host", s.name),
        }
    }

    pub fn host_mut(&mut self, id: NodeId) -> &mut Host {
        match &mut self.nodes[id.0] {
            Node::Host(h) => h,
            Node::Switch(s) => panic!("{} is a switch, not a host", s.name),
        }
    }

    pub fn switch_mut(&mut self, id: NodeId) -> &mut Switch {
        match &mut self.nodes[id.0] {
            Node::Switch(s) => s,
            Node::Host(h) => panic!("{} is a host, not a switch", h.name),
        }
    }

    /// 主机的出端口
    pub fn host_link(&self, id: NodeId) -> LinkId {
        self.host(id)
            .link
            .unwrap_or_else(|| panic!("host {:?} has no uplink", id))
    }

    pub fn link(&self, id: LinkId) -> &Link {
        &self.links[id.0]
    }

    pub fn link_mut(&mut self, id: LinkId) -> &mut Link {
        &mut self.links[id.0]
    }

    /// 主机所在机架；仲裁器挂在 0 号汇聚交换机下
    pub fn rack_of(&self, host: NodeId) -> usize {
        if Some(host) == self.arbiter {
            0
        } else {
            host.0 / self.hosts_per_agg
        }
    }

    /// 交换机到目的主机的下行端口
    fn port_towards(&self, sw: &Switch, dst: NodeId) -> LinkId {
        if Some(dst) == self.arbiter {
            return sw
                .arbiter_port
                .unwrap_or_else(|| panic!("{} has no port to the arbiter", sw.name));
        }
        match sw.tier {
            SwitchTier::Single => sw.down[dst.0],
            _ => sw.down[dst.0 % self.hosts_per_agg],
        }
    }

    /// 包离开 `link` 后应进入的下一条链路；`None` 表示已到达目的主机
    pub fn next_hop(&mut self, pkt: &Packet, link: LinkId) -> Option<LinkId> {
        let (from, to) = {
            let l = &self.links[link.0];
            (l.from, l.to)
        };
        let sw = match &self.nodes[to.0] {
            Node::Host(_) => return None,
            Node::Switch(sw) => sw,
        };

        let next = match sw.tier {
            SwitchTier::Single => self.port_towards(sw, pkt.dst),
            SwitchTier::Core => sw.down[self.rack_of(pkt.dst)],
            SwitchTier::Agg => {
                let from_host = matches!(self.nodes[from.0], Node::Host(_));
                if !from_host || self.rack_of(pkt.dst) == sw.index {
                    self.port_towards(sw, pkt.dst)
                } else {
                    let num_core = sw.up.len();
                    let port = match self.load_balancing {
                        LoadBalancing::PerPacket => {
                            let l = &mut self.links[link.0];
                            let c = l.spray_counter;
                            l.spray_counter = c.wrapping_add(1);
                            c % num_core
                        }
                        LoadBalancing::PerFlow => (pkt.src.0 + pkt.dst.0 + pkt.flow.0) % num_core,
                    };
                    sw.up[port]
                }
            }
        };
        Some(next)
    }

    /// 源到目的经过的链路数
    pub fn num_hops(&self, src: NodeId, dst: NodeId) -> u32 {
        match self.kind {
            FabricKind::SingleSwitch => 2,
            FabricKind::ThreeTier if self.rack_of(src) == self.rack_of(dst) => 2,
            FabricKind::ThreeTier => 4,
        }
    }

    /// 空网络中传完 `size` 字节的理想完成时间（微秒），仅用于计算 slowdown
    pub fn oracle_fct_us(&self, size: u64, src: NodeId, dst: NodeId) -> f64 {
        let hops = self.num_hops(src, dst) as f64;
        let mss = self.mss as f64;
        let hdr = self.hdr_size as f64;
        let propagation = 2.0 * 1e6 * hops * self.propagation_delay;

        let full_segments = size / self.mss;
        let leftover = size - full_segments * self.mss;
        let mut wire_bytes = (mss + hdr) * full_segments as f64 + leftover as f64;
        if leftover != 0 {
            wire_bytes += hdr;
        }

        let bits_per_us = self.host_rate / 1e6;
        let transmission = if self.cut_through {
            (wire_bytes + (hops - 1.0) * hdr) * 8.0 / bits_per_us
        } else {
            let mut t = (wire_bytes + 2.0 * (mss + hdr)) * 8.0 / bits_per_us;
            if hops > 2.0 {
                t += 2.0 * (mss + hdr) * 8.0 / (self.core_rate / 1e6);
            }
            t
        };
        debug!(size, hops, propagation, transmission, "oracle fct");
        propagation + transmission
    }
}

/// splitmix64，用于从一个种子派生出各条链路互不相关的种子
pub(crate) fn mix64(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E3779B97F4A7C15);
    let mut z = x;
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58476D1CE4E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D049BB133111EB);
    z ^ (z >> 31)
}
