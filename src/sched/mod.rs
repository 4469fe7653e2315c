//! 主机侧调度
//!
//! - [`WorkingSet`]：排序依据会变化的流集合，取最优时线性扫描
//! - 调度主机：出端口空闲时才唤醒一条流

mod scheduling_host;
mod working_set;

pub use scheduling_host::HostProcessing;
pub use working_set::WorkingSet;
