//! 网络模拟模块
//!
//! 此模块包含网络模拟的核心组件：节点、链路、数据包、逐跳转发和仿真上下文。

// 子模块声明
mod forwarding;
mod id;
mod link;
mod net_world;
mod network;
mod network_viz;
mod node;
mod packet;
mod packet_arrival;
mod packet_queuing;
mod queue_processing;
mod stats;

// 重新导出公共接口
pub use id::{FlowId, LinkId, NodeId};
pub use link::{Hop, Link, LinkStats};
pub use net_world::NetWorld;
pub use network::Network;
pub use node::{Host, HostRole, Node, Switch, SwitchTier};
pub use packet::{Packet, PacketKind};
pub use packet_arrival::PacketArrival;
pub use packet_queuing::PacketQueuing;
pub use queue_processing::QueueProcessing;
pub use stats::Stats;
