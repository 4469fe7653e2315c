//! 结果输出
//!
//! - 每条流完成时生成一条 [`FlowRecord`]（按完成顺序打印一行）
//! - 仿真结束后由 [`Summary`] 汇总 FCT、slowdown、丢包位置等
//! - [`Logging`] 事件周期性打印进度

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::HostType;
use crate::net::{FlowId, NetWorld, Network};
use crate::sim::{Event, EventKind, Simulator, World, world_mut};
use crate::viz::VizEventKind;

/// 周期日志的间隔（秒，仿真时间）
pub const LOGGING_INTERVAL: f64 = 0.001;

/// 一条已完成流的结果
#[derive(Debug, Clone, Serialize)]
pub struct FlowRecord {
    pub id: u64,
    pub size: u64,
    pub src: usize,
    pub dst: usize,
    pub start_us: f64,
    pub finish_us: f64,
    pub fct_us: f64,
    pub oracle_us: f64,
    pub slowdown: f64,
    pub sent: u64,
    pub size_pkts: u64,
    pub received: u64,
    pub data_drop: u64,
    pub ack_drop: u64,
    pub drop: u64,
    /// 从流开始到第一个字节离开源主机（微秒）
    pub first_byte_us: f64,
    pub deadline_met: Option<bool>,
}

impl FlowRecord {
    /// `id size src dst start finish fct oracle slowdown sent/pkts//recv drops first_byte`
    pub fn line(&self) -> String {
        format!(
            "{} {} {} {} {:.4} {:.4} {:.4} {:.4} {:.4} {}/{}//{} {}/{}/{} {:.4}",
            self.id,
            self.size,
            self.src,
            self.dst,
            self.start_us,
            self.finish_us,
            self.fct_us,
            self.oracle_us,
            self.slowdown,
            self.sent,
            self.size_pkts,
            self.received,
            self.data_drop,
            self.ack_drop,
            self.drop,
            self.first_byte_us,
        )
    }
}

/// slowdown 在 (0.9999, 1) 之间视为浮点误差，取 1
fn clamp_slowdown(slowdown: f64) -> f64 {
    if slowdown > 0.9999 && slowdown < 1.0 { 1.0 } else { slowdown }
}

/// 事件：周期性打印仿真进度
#[derive(Debug)]
pub struct Logging;

impl Event for Logging {
    fn kind(&self) -> EventKind {
        EventKind::Logging
    }

    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let w = world_mut::<NetWorld>(world);
        let s = &w.net.stats;
        info!(
            now_ms = sim.now().as_secs() * 1e3,
            arrived = s.arrived_flows,
            finished = s.finished_flows,
            total = w.net.flows.len(),
            pending_events = sim.pending(),
            delivered_pkts = s.delivered_pkts,
            drops = s.total_drops(),
            "⏱️  仿真进度"
        );
        if sim.pending() > 0 {
            sim.schedule(sim.now() + LOGGING_INTERVAL, Logging);
        }
    }
}

impl Network {
    /// 流完成：记录完成时间、计算 slowdown 并保存结果
    #[tracing::instrument(skip(self, sim))]
    pub fn on_flow_finished(&mut self, id: FlowId, sim: &mut Simulator) {
        let now = sim.now();
        let f = &mut self.flows[id.0];
        f.finished = true;
        f.finish_time = Some(now);
        let fct = now - f.start_time;
        self.stats.finished_flows += 1;

        let f = &self.flows[id.0];
        let oracle_us = self.topo.oracle_fct_us(f.size, f.src, f.dst);
        let slowdown = clamp_slowdown(1e6 * fct / oracle_us);
        if slowdown < 1.0 {
            warn!(flow = f.label, slowdown, "slowdown 小于 1");
        }
        let record = FlowRecord {
            id: f.label,
            size: f.size,
            src: f.src.0,
            dst: f.dst.0,
            start_us: f.start_time.as_micros(),
            finish_us: now.as_micros(),
            fct_us: fct * 1e6,
            oracle_us,
            slowdown,
            sent: f.stats.total_pkt_sent,
            size_pkts: f.size / f.mss,
            received: f.stats.received_count,
            data_drop: f.stats.data_pkt_drop,
            ack_drop: f.stats.ack_pkt_drop,
            drop: f.stats.pkt_drop,
            first_byte_us: f
                .stats
                .first_byte_send_time
                .map_or(0.0, |t| (t - f.start_time) * 1e6),
            deadline_met: f.deadline.map(|d| d > now),
        };
        debug!(flow = f.label, fct_us = record.fct_us, slowdown, "🏁 流完成");
        self.results.push(record);
        self.viz_flow_event(
            id,
            VizEventKind::FlowFinished {
                fct_us: fct * 1e6,
                slowdown,
            },
            now,
        );

        // 调度主机上排在后面的流只在前一条完成后才会被唤醒
        let f = &self.flows[id.0];
        if self.cfg.host_type == HostType::Scheduling && !f.is_fastpass() {
            let src = f.src;
            self.scheduling_host_send(src, sim);
        }
    }
}

/// 一组 slowdown 的均值与 99 分位
#[derive(Debug, Clone, Default, Serialize)]
pub struct Bucket {
    samples: Vec<f64>,
}

impl Bucket {
    pub fn push(&mut self, v: f64) {
        self.samples.push(v);
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn avg(&self) -> f64 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().sum::<f64>() / self.samples.len() as f64
    }

    /// 排序后取下标 `floor(p * n)`；空集合返回 -1
    pub fn percentile(&self, p: f64) -> f64 {
        if self.samples.is_empty() {
            return -1.0;
        }
        let mut sorted = self.samples.clone();
        sorted.sort_by(f64::total_cmp);
        let idx = ((p * sorted.len() as f64) as usize).min(sorted.len() - 1);
        sorted[idx]
    }
}

/// 未完成流的快照
#[derive(Debug, Clone, Serialize)]
pub struct UnfinishedFlow {
    pub id: u64,
    pub size: u64,
    pub next_seq: u64,
    pub received_bytes: u64,
    pub src: usize,
    pub dst: usize,
}

/// 整次仿真的汇总
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub flows: usize,
    pub finished: usize,
    pub average_fct_us: f64,
    pub mean_slowdown: f64,
    pub mean_inflation: f64,
    pub nfct: f64,
    /// 满足截止时间的流比例（仅在启用截止时间时）
    pub deadline_met: Option<f64>,
    pub small: Bucket,
    pub medium: Bucket,
    pub large: Bucket,
    pub drops_by_hop: [u64; 4],
    pub dead_packets: u64,
    pub duplicated: u64,
    pub data_pkt_sent: u64,
    pub data_pkt_drop: u64,
    pub unfinished: Vec<UnfinishedFlow>,
}

impl Summary {
    /// 从结束时的网络状态汇总。均值只统计已完成的流。
    pub fn from_network(net: &Network) -> Self {
        let mut small = Bucket::default();
        let mut medium = Bucket::default();
        let mut large = Bucket::default();
        let (mut fct_sum, mut oracle_sum, mut slow_sum, mut infl_sum) = (0.0, 0.0, 0.0, 0.0);
        let mut met = 0usize;

        for r in &net.results {
            fct_sum += r.fct_us;
            oracle_sum += r.oracle_us;
            slow_sum += r.slowdown;
            if r.size_pkts > 0 {
                infl_sum += r.sent as f64 / r.size_pkts as f64;
            }
            if r.deadline_met == Some(true) {
                met += 1;
            }
            if r.size < 100 * 1024 {
                small.push(r.slowdown);
            } else if r.size < 10 * 1024 * 1024 {
                medium.push(r.slowdown);
            } else {
                large.push(r.slowdown);
            }
        }

        let n = net.results.len();
        let mean = |sum: f64| if n == 0 { 0.0 } else { sum / n as f64 };
        let unfinished = net
            .unfinished_flows()
            .map(|f| UnfinishedFlow {
                id: f.label,
                size: f.size,
                next_seq: f.next_seq_no,
                received_bytes: f.stats.received_bytes,
                src: f.src.0,
                dst: f.dst.0,
            })
            .collect();

        Self {
            flows: net.flows.len(),
            finished: n,
            average_fct_us: mean(fct_sum),
            mean_slowdown: mean(slow_sum),
            mean_inflation: mean(infl_sum),
            nfct: if oracle_sum > 0.0 { fct_sum / oracle_sum } else { 0.0 },
            deadline_met: net.cfg.deadline.then(|| mean(met as f64)),
            small,
            medium,
            large,
            drops_by_hop: net.stats.drops_by_hop,
            dead_packets: net.stats.dead_packets,
            duplicated: net.flows.iter().map(|f| f.stats.duplicated).sum(),
            data_pkt_sent: net.flows.iter().map(|f| f.stats.total_pkt_sent).sum(),
            data_pkt_drop: net.flows.iter().map(|f| f.stats.data_pkt_drop).sum(),
            unfinished,
        }
    }

    pub fn total_drops(&self) -> u64 {
        self.drops_by_hop.iter().sum()
    }

    /// 汇总的文本形式（每个元素一行）
    pub fn lines(&self) -> Vec<String> {
        let mut out: Vec<String> = self
            .unfinished
            .iter()
            .map(|u| {
                format!(
                    "unfinished flow size:{} id:{} next_seq:{} recv:{} src:{} dst:{}",
                    u.size, u.id, u.next_seq, u.received_bytes, u.src, u.dst
                )
            })
            .collect();

        let mut head = format!(
            "AverageFCT {:.4} MeanSlowdown {:.4} MeanInflation {:.4} NFCT {:.4}",
            self.average_fct_us, self.mean_slowdown, self.mean_inflation, self.nfct
        );
        if let Some(dl) = self.deadline_met {
            head.push_str(&format!(" DL:{dl:.4}"));
        }
        out.push(head);

        out.push(format!(
            "[0,100k]avg: {:.4} [0,100k]99p: {:.4} [100k,10m]avg: {:.4} [100k,10m]99p: {:.4} [10m,inf]avg: {:.4} [10m,inf]99p: {:.4}",
            self.small.avg(),
            self.small.percentile(0.99),
            self.medium.avg(),
            self.medium.percentile(0.99),
            self.large.avg(),
            self.large.percentile(0.99),
        ));

        let total = self.total_drops();
        let hops = self
            .drops_by_hop
            .iter()
            .enumerate()
            .map(|(i, d)| {
                let pct = if total == 0 { 0 } else { d * 100 / total };
                format!("Hop:{i} Drp:{d}({pct}%)")
            })
            .collect::<Vec<_>>()
            .join(" ");
        out.push(hops);

        let drop_rate = if self.data_pkt_sent == 0 {
            0.0
        } else {
            self.data_pkt_drop as f64 / self.data_pkt_sent as f64
        };
        out.push(format!(
            "DeadPackets {} DuplicatedPackets {} DataPktDropRate {:.4} Finished {}/{}",
            self.dead_packets, self.duplicated, drop_rate, self.finished, self.flows
        ));
        out
    }
}
