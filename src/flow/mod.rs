//! 流传输状态机
//!
//! 每条流在同一个对象里同时保存发送端和接收端的状态。窗口、SACK 与重传逻辑对所有
//! 协议通用，差异只体现在 [`policy`] 里的拥塞窗口与优先级策略上。

mod events;
#[allow(clippy::module_inception)]
mod flow;
mod policy;
mod transport;

pub use events::{FlowArrival, FlowFinished, FlowProcessing, RetxTimeout};
pub use flow::{Flow, FlowStats};
pub use policy::{CongestionPolicy, PFABRIC_INITIAL_SSTHRESH, PriorityPolicy};
