//! 错误类型
//!
//! 配置与流量输入的错误可恢复地返回给调用方；仿真过程中的不变量破坏直接 panic。

use std::path::PathBuf;
use thiserror::Error;

/// 配置文件错误
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: expected `key: value`, got {text:?}")]
    Malformed { line: usize, text: String },

    #[error("line {line}: unknown config key `{key}`")]
    UnknownKey { line: usize, key: String },

    #[error("line {line}: invalid value {value:?} for `{key}`")]
    InvalidValue {
        line: usize,
        key: String,
        value: String,
    },

    #[error("unsupported {what} code {code}")]
    Unsupported { what: &'static str, code: i64 },

    #[error("invalid fabric: {0}")]
    Fabric(String),
}

/// 流量输入（CDF / trace）错误
#[derive(Debug, Error)]
pub enum WorkloadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cdf line {line}: expected `value [ignored] cdf`, got {text:?}")]
    MalformedCdf { line: usize, text: String },

    #[error("cdf line {line}: cumulative probability decreases")]
    NonMonotonicCdf { line: usize },

    #[error("cdf table is empty")]
    EmptyCdf,

    #[error("trace line {line}: {reason}")]
    InvalidFlow { line: usize, reason: String },

    #[error("no flow source configured (flow_trace is empty)")]
    NoSource,
}

/// 命令行入口的汇总错误
#[derive(Debug, Error)]
pub enum SimError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Workload(#[from] WorkloadError),

    #[error("unsupported experiment type {0} (expected 1 = run, 2 = generate only)")]
    UnsupportedExperiment(u32),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
