//! 轨迹事件记录（`--trace-json` 输出）
//!
//! 用结构化 JSON 事件代替解析文本日志，便于离线分析丢包位置、抢占和完成时间。

mod types;

pub use types::{
    VizDropReason, VizEvent, VizEventKind, VizLinkInfo, VizLogger, VizNodeInfo, VizNodeKind,
    VizPacketKind,
};
