//! 仿真时间类型
//!
//! 定义仿真时间及其单位转换。时间以秒为单位的 `f64` 表示，
//! 与链路速率（bit/s）和传播时延（秒）直接相乘相加。

use serde::Serialize;
use std::cmp::Ordering;
use std::ops::{Add, Sub};

/// 两个时刻差值小于该值时视为同一时刻。
pub const TIME_EPSILON: f64 = 1e-15;

/// 仿真时间（秒）。
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct SimTime(pub f64);

impl SimTime {
    pub const ZERO: SimTime = SimTime(0.0);

    pub fn from_secs(s: f64) -> SimTime {
        SimTime(s)
    }

    pub fn from_millis(ms: f64) -> SimTime {
        SimTime(ms / 1e3)
    }

    pub fn from_micros(us: f64) -> SimTime {
        SimTime(us / 1e6)
    }

    pub fn as_secs(self) -> f64 {
        self.0
    }

    pub fn as_micros(self) -> f64 {
        self.0 * 1e6
    }

    /// 在 ε 容差内是否与另一时刻相同
    pub fn approx_eq(self, other: SimTime) -> bool {
        (self.0 - other.0).abs() < TIME_EPSILON
    }
}

impl PartialEq for SimTime {
    fn eq(&self, other: &Self) -> bool {
        self.0.total_cmp(&other.0) == Ordering::Equal
    }
}

impl Eq for SimTime {}

impl PartialOrd for SimTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SimTime {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// `t + secs`
impl Add<f64> for SimTime {
    type Output = SimTime;
    fn add(self, rhs: f64) -> SimTime {
        SimTime(self.0 + rhs)
    }
}

/// 两个时刻之间的间隔（秒）
impl Sub for SimTime {
    type Output = f64;
    fn sub(self, rhs: SimTime) -> f64 {
        self.0 - rhs.0
    }
}
