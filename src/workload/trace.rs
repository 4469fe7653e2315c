//! 流 trace 文件
//!
//! 每行 `id start _ size_pkts _ _ src dst`（空白分隔）。遇到第一行格式错误即停止读取。

use std::fs;
use std::path::Path;

use tracing::{info, warn};

use super::FlowDesc;
use crate::error::WorkloadError;
use crate::net::NodeId;
use crate::sim::SimTime;

const TRACE_COLUMNS: usize = 8;

struct TraceLine {
    id: u64,
    start: f64,
    size_pkts: f64,
    src: usize,
    dst: usize,
}

fn parse_line(raw: &str) -> Option<TraceLine> {
    let cols: Vec<&str> = raw.split_whitespace().collect();
    if cols.len() < TRACE_COLUMNS {
        return None;
    }
    Some(TraceLine {
        id: cols[0].parse().ok()?,
        start: cols[1].parse().ok()?,
        size_pkts: cols[3].parse().ok()?,
        src: cols[6].parse().ok()?,
        dst: cols[7].parse().ok()?,
    })
}

pub fn read_trace(path: impl AsRef<Path>, mss: u64, num_hosts: usize) -> Result<Vec<FlowDesc>, WorkloadError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| WorkloadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_trace(&text, mss, num_hosts)
}

/// 解析 trace 文本；大小为 0 或主机编号越界是错误
pub fn parse_trace(text: &str, mss: u64, num_hosts: usize) -> Result<Vec<FlowDesc>, WorkloadError> {
    let mut flows = Vec::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = idx + 1;
        if raw.trim().is_empty() {
            continue;
        }
        let Some(t) = parse_line(raw) else {
            warn!(line, text = raw.trim(), "trace 行格式错误，停止读取");
            break;
        };
        let size = (mss as f64 * t.size_pkts) as u64;
        if size == 0 {
            return Err(WorkloadError::InvalidFlow {
                line,
                reason: format!("flow {} has zero size", t.id),
            });
        }
        if t.src >= num_hosts || t.dst >= num_hosts || t.src == t.dst {
            return Err(WorkloadError::InvalidFlow {
                line,
                reason: format!(
                    "flow {} has invalid endpoints {} -> {} ({} hosts)",
                    t.id, t.src, t.dst, num_hosts
                ),
            });
        }
        flows.push(FlowDesc {
            id: t.id,
            start: SimTime::from_secs(t.start),
            size,
            src: NodeId(t.src),
            dst: NodeId(t.dst),
            deadline: None,
        });
    }
    info!(flows = flows.len(), "📄 trace 读取完成");
    Ok(flows)
}
