//! 经验分布（CDF 表）
//!
//! 文件每行 `value [ignored] cdf`，只有两列时第二列即为 cdf。
//! 值的单位是包数（`bytes_mode` 下为字节）。

use std::fs;
use std::path::Path;

use rand::Rng;

use crate::error::WorkloadError;

/// 每个包的负载字节数，CDF 以包为单位时用于换算
pub const CDF_PKT_BYTES: f64 = 1460.0;
/// 估算带头部流量时每包的头部字节数
const CDF_HDR_BYTES: f64 = 40.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CdfEntry {
    pub value: f64,
    pub cdf: f64,
}

/// 逆 CDF 采样器
#[derive(Debug, Clone)]
pub struct EmpiricalCdf {
    entries: Vec<CdfEntry>,
    smooth: bool,
    bytes_mode: bool,
    /// 平均流大小（字节）
    mean_bytes: f64,
    /// 平均流大小加上每包头部（字节，仅字节模式下有意义）
    mean_bytes_with_headers: f64,
}

impl EmpiricalCdf {
    pub fn from_file(path: impl AsRef<Path>, smooth: bool, bytes_mode: bool) -> Result<Self, WorkloadError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| WorkloadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&text, smooth, bytes_mode)
    }

    pub fn parse(text: &str, smooth: bool, bytes_mode: bool) -> Result<Self, WorkloadError> {
        let mut entries = Vec::new();
        let (mut prev_cdf, mut prev_value) = (0.0, 1.0);
        let (mut weighted, mut with_headers) = (0.0, 0.0);

        for (idx, raw) in text.lines().enumerate() {
            let line = idx + 1;
            let cols: Vec<&str> = raw.split_whitespace().collect();
            if cols.is_empty() {
                continue;
            }
            let malformed = || WorkloadError::MalformedCdf {
                line,
                text: raw.trim().to_string(),
            };
            if cols.len() < 2 {
                return Err(malformed());
            }
            let value: f64 = cols[0].parse().map_err(|_| malformed())?;
            let cdf: f64 = cols[cols.len().min(3) - 1].parse().map_err(|_| malformed())?;

            let freq = cdf - prev_cdf;
            if freq < 0.0 {
                return Err(WorkloadError::NonMonotonicCdf { line });
            }
            let size = if smooth { (value + prev_value) / 2.0 } else { value };
            weighted += freq * size;
            with_headers += freq * (CDF_HDR_BYTES * (size / CDF_PKT_BYTES).ceil() + size);
            prev_cdf = cdf;
            prev_value = value;
            entries.push(CdfEntry { value, cdf });
        }
        if entries.is_empty() {
            return Err(WorkloadError::EmptyCdf);
        }

        let mean_bytes = if bytes_mode { weighted } else { weighted * CDF_PKT_BYTES };
        Ok(Self {
            entries,
            smooth,
            bytes_mode,
            mean_bytes,
            mean_bytes_with_headers: with_headers,
        })
    }

    pub fn entries(&self) -> &[CdfEntry] {
        &self.entries
    }

    pub fn bytes_mode(&self) -> bool {
        self.bytes_mode
    }

    pub fn mean_bytes(&self) -> f64 {
        self.mean_bytes
    }

    /// 泊松到达率的分母：平均每条流占用的链路比特数
    pub fn mean_wire_bits(&self) -> f64 {
        if self.bytes_mode {
            self.mean_bytes_with_headers * 8.0
        } else {
            self.mean_bytes * 8.0 / CDF_PKT_BYTES * 1500.0
        }
    }

    /// 第一个 cdf >= u 的下标（从 1 开始二分）；u 超过表尾时取最后一项
    fn lookup(&self, u: f64) -> usize {
        if u <= self.entries[0].cdf || self.entries.len() == 1 {
            return 0;
        }
        let (mut lo, mut hi) = (1, self.entries.len() - 1);
        while lo < hi {
            let mid = (lo + hi) / 2;
            if u > self.entries[mid].cdf {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }
        lo
    }

    /// 给定 u ∈ [0, 1] 取分布上的值
    pub fn value_at(&self, u: f64) -> f64 {
        if !self.smooth {
            return self
                .entries
                .iter()
                .find(|e| u <= e.cdf)
                .or(self.entries.last())
                .map_or(0.0, |e| e.value);
        }
        let mid = self.lookup(u);
        let hi = self.entries[mid];
        if mid > 0 && u < hi.cdf {
            let lo = self.entries[mid - 1];
            return lo.value + (u - lo.cdf) * (hi.value - lo.value) / (hi.cdf - lo.cdf);
        }
        hi.value
    }

    pub fn sample<R: Rng>(&self, rng: &mut R) -> f64 {
        self.value_at(rng.gen_range(0.0..=1.0))
    }
}
