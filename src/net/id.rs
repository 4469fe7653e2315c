//! 标识符类型
//!
//! 定义节点、链路和流的唯一标识符。主机的 `NodeId` 与主机编号相同，
//! 交换机排在所有主机（以及仲裁器）之后。

use serde::Serialize;

/// 节点标识符
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct NodeId(pub usize);

/// 链路（单向队列）标识符
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct LinkId(pub usize);

/// 流标识符，即流在 `Network::flows` 中的下标
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct FlowId(pub usize);
