//! 拥塞窗口与包优先级策略
//!
//! 流的种类不通过子类区分，而是在创建时按配置选定一组策略。

use crate::config::{FlowType, SimConfig};

/// pFabric 慢启动阈值的初始值（段数）
pub const PFABRIC_INITIAL_SSTHRESH: u64 = 100_000;

/// 拥塞窗口增长规则
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CongestionPolicy {
    /// 每个新 ACK 窗口 +1，不超过上限
    Normal,
    /// 低于 ssthresh 时慢启动，之后每收满一个窗口的 ACK 才 +1
    PFabric { ssthresh: u64, ai_count: u64 },
}

impl CongestionPolicy {
    pub fn for_flow_type(flow_type: FlowType) -> Self {
        match flow_type {
            FlowType::PFabric => CongestionPolicy::PFabric {
                ssthresh: PFABRIC_INITIAL_SSTHRESH,
                ai_count: 0,
            },
            FlowType::Normal | FlowType::Fastpass => CongestionPolicy::Normal,
        }
    }

    /// 累计确认前进时调用
    pub fn on_new_ack(&mut self, cwnd: &mut u64, max_cwnd: u64) {
        match self {
            CongestionPolicy::Normal => *cwnd += 1,
            CongestionPolicy::PFabric { ssthresh, ai_count } => {
                if *cwnd < *ssthresh {
                    *cwnd += 1;
                } else {
                    *ai_count += 1;
                    if *ai_count >= *cwnd {
                        *ai_count = 0;
                        *cwnd += 1;
                    }
                }
            }
        }
        if *cwnd > max_cwnd {
            *cwnd = max_cwnd;
        }
    }

    /// 重传超时；窗口本身由调用方收缩到 1
    pub fn on_timeout(&mut self, cwnd: u64) {
        if let CongestionPolicy::PFabric { ssthresh, .. } = self {
            *ssthresh = (cwnd / 2).max(2);
        }
    }
}

/// 数据包优先级（数值越小越优先）
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PriorityPolicy {
    /// 固定优先级
    Fixed(f64),
    /// 截止时间（微秒）
    Deadline,
    /// 剩余未确认字节数
    RemainingBytes,
}

impl PriorityPolicy {
    pub fn from_config(cfg: &SimConfig) -> Self {
        if cfg.flow_type == FlowType::Normal {
            PriorityPolicy::Fixed(1.0)
        } else if cfg.deadline && cfg.schedule_by_deadline {
            PriorityPolicy::Deadline
        } else {
            PriorityPolicy::RemainingBytes
        }
    }
}
