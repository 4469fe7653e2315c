//! 实验配置
//!
//! 逐行解析 `key: value` 配置文件。未知的键是致命错误；
//! 扩展策略（capability、DCTCP、magic 等）的参数按名字原样保存。

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::Serialize;
use tracing::debug;

use crate::error::ConfigError;

/// 队列策略
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueueType {
    DropTail,
    PFabric,
    ProbDrop,
}

impl QueueType {
    pub fn from_code(code: i64) -> Result<Self, ConfigError> {
        match code {
            1 => Ok(QueueType::DropTail),
            2 => Ok(QueueType::PFabric),
            4 => Ok(QueueType::ProbDrop),
            _ => Err(ConfigError::Unsupported {
                what: "queue_type",
                code,
            }),
        }
    }
}

/// 流的传输协议
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowType {
    Normal,
    PFabric,
    Fastpass,
}

impl FlowType {
    pub fn from_code(code: i64) -> Result<Self, ConfigError> {
        match code {
            1 => Ok(FlowType::Normal),
            2 => Ok(FlowType::PFabric),
            114 => Ok(FlowType::Fastpass),
            _ => Err(ConfigError::Unsupported {
                what: "flow_type",
                code,
            }),
        }
    }
}

/// 主机类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum HostType {
    Normal,
    Scheduling,
    Fastpass,
}

impl HostType {
    pub fn from_code(code: i64) -> Result<Self, ConfigError> {
        match code {
            1 => Ok(HostType::Normal),
            2 => Ok(HostType::Scheduling),
            14 => Ok(HostType::Fastpass),
            _ => Err(ConfigError::Unsupported {
                what: "host_type",
                code,
            }),
        }
    }
}

/// 多条核心路径之间的负载均衡方式
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadBalancing {
    /// 每个包轮询一次上行端口
    PerPacket,
    /// (src + dst + flow) 取模，同一条流走同一条路径
    PerFlow,
}

/// Fastpass 仲裁器挑选流的顺序
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FastpassOrder {
    MostRemaining,
    FewestRemaining,
    EarliestDeadline,
}

/// 实验参数
#[derive(Debug, Clone, Serialize)]
pub struct SimConfig {
    pub init_cwnd: u64,
    pub max_cwnd: u64,
    pub retx_timeout: f64,
    pub queue_size: u64,
    pub queue_type: QueueType,
    pub drop_prob: f64,
    pub flow_type: FlowType,
    pub host_type: HostType,
    pub bandwidth: f64,
    pub propagation_delay: f64,
    pub num_flow: usize,
    pub flow_trace: String,
    pub use_flow_trace: bool,
    pub cut_through: bool,
    pub load_balancing: LoadBalancing,
    pub preemptive_queue: bool,
    pub big_switch: bool,
    pub load: f64,
    pub smooth_cdf: bool,
    pub burst_at_beginning: bool,
    pub bytes_mode: bool,
    pub permutation_tm: bool,
    pub mean_flow_size: f64,
    pub hdr_size: u64,
    pub mss: u64,
    pub deadline: bool,
    pub schedule_by_deadline: bool,
    pub avg_deadline: f64,
    pub num_hosts: usize,
    pub num_agg_switches: usize,
    pub num_core_switches: usize,
    pub fastpass_epoch_pkts: usize,
    pub fastpass_order: FastpassOrder,
    pub seed: u64,
    pub watchdog_limit: u64,
    /// 扩展策略参数（本仿真器只保存，不解释）
    pub tunables: BTreeMap<String, String>,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            init_cwnd: 12,
            max_cwnd: 15,
            retx_timeout: 45e-6,
            queue_size: 36_864,
            queue_type: QueueType::PFabric,
            drop_prob: 0.0,
            flow_type: FlowType::PFabric,
            host_type: HostType::Normal,
            bandwidth: 10e9,
            propagation_delay: 0.000_000_2,
            num_flow: 1000,
            flow_trace: String::new(),
            use_flow_trace: false,
            cut_through: false,
            load_balancing: LoadBalancing::PerPacket,
            preemptive_queue: false,
            big_switch: false,
            load: 0.6,
            smooth_cdf: true,
            burst_at_beginning: false,
            bytes_mode: false,
            permutation_tm: false,
            mean_flow_size: 0.0,
            hdr_size: 40,
            mss: 1460,
            deadline: false,
            schedule_by_deadline: false,
            avg_deadline: 0.0001,
            num_hosts: 144,
            num_agg_switches: 9,
            num_core_switches: 4,
            fastpass_epoch_pkts: 8,
            fastpass_order: FastpassOrder::MostRemaining,
            seed: 0,
            watchdog_limit: crate::sim::DEFAULT_WATCHDOG_LIMIT,
            tunables: BTreeMap::new(),
        }
    }
}

const EXTENSION_KEYS: &[&str] = &[
    "capability_timeout",
    "capability_resend_timeout",
    "capability_initial",
    "capability_window",
    "capability_prio_thresh",
    "capability_third_level",
    "capability_fourth_level",
    "capability_window_timeout",
    "dctcp_mark_thresh",
    "dctcp_delayed_ack_freq",
    "magic_trans_slack",
    "magic_delay_scheduling",
    "magic_inflate",
    "reauth_limit",
    "imbalance",
    "traffic_imbalance",
    "ddc",
    "ddc_cpu_ratio",
    "ddc_mem_ratio",
    "ddc_disk_ratio",
    "ddc_normalize",
    "ddc_type",
    "num_host_types",
    "interarrival_cdf",
];

fn value<T: FromStr>(line: usize, key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.parse().map_err(|_| ConfigError::InvalidValue {
        line,
        key: key.to_string(),
        value: raw.to_string(),
    })
}

fn flag(line: usize, key: &str, raw: &str) -> Result<bool, ConfigError> {
    Ok(value::<i64>(line, key, raw)? != 0)
}

impl SimConfig {
    /// 读取并解析配置文件
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text)
    }

    /// 解析配置文本；空行和 `#` 开头的行被忽略
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let mut cfg = SimConfig::default();
        for (idx, raw_line) in text.lines().enumerate() {
            let line = idx + 1;
            let trimmed = raw_line.trim();
            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }
            let Some((key, rest)) = trimmed.split_once(':') else {
                return Err(ConfigError::Malformed {
                    line,
                    text: trimmed.to_string(),
                });
            };
            let key = key.trim();
            let Some(raw) = rest.split_whitespace().next() else {
                return Err(ConfigError::InvalidValue {
                    line,
                    key: key.to_string(),
                    value: String::new(),
                });
            };
            cfg.apply(line, key, raw)?;
        }
        cfg.validate()?;
        debug!(?cfg, "配置解析完成");
        Ok(cfg)
    }

    fn apply(&mut self, line: usize, key: &str, raw: &str) -> Result<(), ConfigError> {
        match key {
            "init_cwnd" => self.init_cwnd = value(line, key, raw)?,
            "max_cwnd" => self.max_cwnd = value(line, key, raw)?,
            "retx_timeout" => self.retx_timeout = value(line, key, raw)?,
            "queue_size" => self.queue_size = value(line, key, raw)?,
            "queue_type" => self.queue_type = QueueType::from_code(value(line, key, raw)?)?,
            "drop_prob" => self.drop_prob = value(line, key, raw)?,
            "flow_type" => self.flow_type = FlowType::from_code(value(line, key, raw)?)?,
            "host_type" => self.host_type = HostType::from_code(value(line, key, raw)?)?,
            "bandwidth" => self.bandwidth = value(line, key, raw)?,
            "propagation_delay" => self.propagation_delay = value(line, key, raw)?,
            "num_flow" => self.num_flow = value(line, key, raw)?,
            "flow_trace" => self.flow_trace = raw.to_string(),
            "use_flow_trace" => self.use_flow_trace = flag(line, key, raw)?,
            "cut_through" => self.cut_through = flag(line, key, raw)?,
            "load_balancing" => {
                self.load_balancing = match value::<i64>(line, key, raw)? {
                    0 => LoadBalancing::PerPacket,
                    1 => LoadBalancing::PerFlow,
                    code => {
                        return Err(ConfigError::Unsupported {
                            what: "load_balancing",
                            code,
                        });
                    }
                }
            }
            "preemptive_queue" => self.preemptive_queue = flag(line, key, raw)?,
            "big_switch" => self.big_switch = flag(line, key, raw)?,
            "load" => self.load = value(line, key, raw)?,
            "smooth_cdf" => self.smooth_cdf = flag(line, key, raw)?,
            "burst_at_beginning" => self.burst_at_beginning = flag(line, key, raw)?,
            "bytes_mode" => self.bytes_mode = flag(line, key, raw)?,
            "permutation_tm" => self.permutation_tm = flag(line, key, raw)?,
            "mean_flow_size" => self.mean_flow_size = value(line, key, raw)?,
            "hdr_size" => self.hdr_size = value(line, key, raw)?,
            "mss" => self.mss = value(line, key, raw)?,
            "deadline" => self.deadline = flag(line, key, raw)?,
            "schedule_by_deadline" => self.schedule_by_deadline = flag(line, key, raw)?,
            "avg_deadline" => self.avg_deadline = value(line, key, raw)?,
            "num_hosts" => self.num_hosts = value(line, key, raw)?,
            "num_agg_switches" => self.num_agg_switches = value(line, key, raw)?,
            "num_core_switches" => self.num_core_switches = value(line, key, raw)?,
            "fastpass_epoch_pkts" => self.fastpass_epoch_pkts = value(line, key, raw)?,
            "fastpass_order" => {
                self.fastpass_order = match value::<i64>(line, key, raw)? {
                    0 => FastpassOrder::MostRemaining,
                    1 => FastpassOrder::FewestRemaining,
                    2 => FastpassOrder::EarliestDeadline,
                    code => {
                        return Err(ConfigError::Unsupported {
                            what: "fastpass_order",
                            code,
                        });
                    }
                }
            }
            "seed" => self.seed = value(line, key, raw)?,
            "watchdog_limit" => self.watchdog_limit = value(line, key, raw)?,
            k if EXTENSION_KEYS.contains(&k) => {
                self.tunables.insert(k.to_string(), raw.to_string());
            }
            _ => {
                return Err(ConfigError::UnknownKey {
                    line,
                    key: key.to_string(),
                });
            }
        }
        Ok(())
    }

    /// 检查参数之间的约束
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.hdr_size == 0 {
            return Err(ConfigError::Fabric("hdr_size must be > 0".into()));
        }
        if self.mss == 0 {
            return Err(ConfigError::Fabric("mss must be > 0".into()));
        }
        if self.bandwidth <= 0.0 {
            return Err(ConfigError::Fabric("bandwidth must be > 0".into()));
        }
        if self.num_hosts < 2 {
            return Err(ConfigError::Fabric("need at least two hosts".into()));
        }
        if !self.big_switch {
            if self.num_agg_switches == 0 || self.num_core_switches == 0 {
                return Err(ConfigError::Fabric(
                    "three-tier fabric needs aggregation and core switches".into(),
                ));
            }
            if self.num_hosts % self.num_agg_switches != 0 {
                return Err(ConfigError::Fabric(format!(
                    "{} hosts do not split evenly over {} aggregation switches",
                    self.num_hosts, self.num_agg_switches
                )));
            }
        }
        if self.fastpass_epoch_pkts == 0 {
            return Err(ConfigError::Fabric("fastpass_epoch_pkts must be > 0".into()));
        }
        if !(0.0..=1.0).contains(&self.drop_prob) {
            return Err(ConfigError::Fabric("drop_prob must be within [0, 1]".into()));
        }
        Ok(())
    }

    /// 每台汇聚交换机下挂的主机数
    pub fn hosts_per_agg(&self) -> usize {
        self.num_hosts / self.num_agg_switches.max(1)
    }

    /// 一个 Fastpass epoch 的时长（秒）
    pub fn fastpass_epoch_time(&self) -> f64 {
        1500.0 * 8.0 * (self.fastpass_epoch_pkts as f64 + 0.5) / self.bandwidth
    }

    /// 仲裁器实际使用的排序：按截止时间调度时改为最早截止优先
    pub fn effective_fastpass_order(&self) -> FastpassOrder {
        if self.deadline && self.schedule_by_deadline {
            FastpassOrder::EarliestDeadline
        } else {
            self.fastpass_order
        }
    }
}
