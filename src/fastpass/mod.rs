//! Fastpass：集中式时隙仲裁
//!
//! 发送端向仲裁器上报剩余包数（RTS），仲裁器每个 epoch 计算一次无冲突的时隙分配并
//! 下发给各发送主机，发送端只在分到的时隙里发包。

mod arbiter;
mod schedule;
mod sender;

pub use arbiter::{Arbiter, ArbiterEntry, ArbiterProcessing};
pub use schedule::EpochSchedule;
pub use sender::{FastpassFlowProcessing, FastpassSender, FastpassTimeout};
