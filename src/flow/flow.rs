//! 流状态
//!
//! `Flow` 只保存状态并提供不涉及事件调度的纯状态转移；
//! 发包、定时器等需要网络和仿真器的操作在 [`super::transport`] 中。

use std::collections::BTreeSet;

use serde::Serialize;

use super::policy::{CongestionPolicy, PriorityPolicy};
use crate::config::{FlowType, SimConfig};
use crate::fastpass::FastpassSender;
use crate::net::{FlowId, NodeId};
use crate::sim::{EventHandle, SimTime};

/// 流的计数器
#[derive(Debug, Clone, Default, Serialize)]
pub struct FlowStats {
    pub total_pkt_sent: u64,
    pub received_count: u64,
    pub received_bytes: u64,
    pub pkt_drop: u64,
    pub data_pkt_drop: u64,
    pub ack_pkt_drop: u64,
    pub duplicated: u64,
    /// 接收端累计的排队时延（秒）
    pub total_queuing_time: f64,
    pub first_byte_send_time: Option<SimTime>,
    pub first_byte_receive_time: Option<SimTime>,
    /// 离开第一跳的数据包数
    pub first_hop_departure: u64,
    /// 离开最后一跳的数据包数
    pub last_hop_departure: u64,
}

/// 一条流
#[derive(Debug)]
pub struct Flow {
    pub id: FlowId,
    /// 输出结果里使用的编号（来自 trace 或生成顺序）
    pub label: u64,
    pub src: NodeId,
    pub dst: NodeId,
    pub size: u64,
    pub size_in_pkt: u64,
    pub mss: u64,
    pub hdr_size: u64,
    pub start_time: SimTime,
    pub finish_time: Option<SimTime>,
    pub deadline: Option<SimTime>,
    pub flow_type: FlowType,

    pub cwnd: u64,
    pub max_cwnd: u64,
    pub retx_timeout: f64,
    pub next_seq_no: u64,
    pub last_unacked_seq: u64,
    pub scoreboard_sack_bytes: u64,

    pub received: BTreeSet<u64>,
    pub recv_till: u64,
    pub max_seq_no_recv: u64,

    pub retx_event: Option<EventHandle>,
    pub flow_proc_event: Option<EventHandle>,
    pub finished: bool,

    pub congestion: CongestionPolicy,
    pub priority_policy: PriorityPolicy,
    pub fastpass: Option<FastpassSender>,
    pub stats: FlowStats,
}

impl Flow {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: FlowId,
        label: u64,
        start_time: SimTime,
        size: u64,
        src: NodeId,
        dst: NodeId,
        deadline: Option<SimTime>,
        cfg: &SimConfig,
    ) -> Self {
        let size_in_pkt = size.div_ceil(cfg.mss);
        let fastpass = (cfg.flow_type == FlowType::Fastpass).then(|| FastpassSender::new(size_in_pkt));
        Self {
            id,
            label,
            src,
            dst,
            size,
            size_in_pkt,
            mss: cfg.mss,
            hdr_size: cfg.hdr_size,
            start_time,
            finish_time: None,
            deadline,
            flow_type: cfg.flow_type,
            cwnd: cfg.init_cwnd,
            max_cwnd: cfg.max_cwnd,
            retx_timeout: cfg.retx_timeout,
            next_seq_no: 0,
            last_unacked_seq: 0,
            scoreboard_sack_bytes: 0,
            received: BTreeSet::new(),
            recv_till: 0,
            max_seq_no_recv: 0,
            retx_event: None,
            flow_proc_event: None,
            finished: false,
            congestion: CongestionPolicy::for_flow_type(cfg.flow_type),
            priority_policy: PriorityPolicy::from_config(cfg),
            fastpass,
            stats: FlowStats::default(),
        }
    }

    pub fn is_fastpass(&self) -> bool {
        self.fastpass.is_some()
    }

    /// 当前可发送的字节窗口：cwnd 段加上 SACK 已确认的字节
    pub fn window_bytes(&self) -> u64 {
        self.cwnd * self.mss + self.scoreboard_sack_bytes
    }

    /// `seq` 处的段是否在窗口内且仍有数据可发
    pub fn can_send(&self, seq: u64) -> bool {
        let in_window = seq + self.mss <= self.last_unacked_seq + self.window_bytes();
        let has_data = seq + self.mss <= self.size || (seq != self.size && self.size - seq < self.mss);
        in_window && has_data
    }

    /// `seq` 之后的下一个段起点，不超过流大小
    pub fn next_segment(&self, seq: u64) -> u64 {
        (seq + self.mss).min(self.size)
    }

    /// `seq` 处数据包的线上大小；最后一段只带剩余字节
    pub fn segment_wire_bytes(&self, seq: u64) -> u32 {
        let payload = if seq + self.mss > self.size {
            self.size - seq
        } else {
            self.mss
        };
        (payload + self.hdr_size) as u32
    }

    /// 新发出数据包的优先级
    pub fn priority(&self) -> f64 {
        match self.priority_policy {
            PriorityPolicy::Fixed(p) => p,
            PriorityPolicy::Deadline => match self.deadline {
                Some(d) => (d.as_secs() * 1e6).trunc(),
                None => self.remaining_bytes() as f64,
            },
            PriorityPolicy::RemainingBytes => self.remaining_bytes() as f64,
        }
    }

    pub fn remaining_bytes(&self) -> u64 {
        self.size
            .saturating_sub(self.last_unacked_seq)
            .saturating_sub(self.scoreboard_sack_bytes)
    }

    /// 接收端记录一个数据段，返回应答的 (累计确认点, SACK 列表)
    pub fn record_data(&mut self, seq: u64, wire_bytes: u32, queuing_delay: f64) -> (u64, Vec<u64>) {
        self.stats.received_count += 1;
        self.stats.total_queuing_time += queuing_delay;

        if self.received.insert(seq) {
            self.stats.received_bytes += wire_bytes as u64 - self.hdr_size;
        } else {
            self.stats.duplicated += 1;
        }
        self.max_seq_no_recv = self.max_seq_no_recv.max(seq);

        let mut sack = Vec::new();
        let mut in_sequence = true;
        let mut s = self.recv_till;
        while s <= self.max_seq_no_recv {
            if self.received.contains(&s) {
                if in_sequence {
                    self.recv_till = (self.recv_till + self.mss).min(self.size);
                } else {
                    sack.push(s);
                }
            } else {
                in_sequence = false;
            }
            s += self.mss;
        }
        (self.recv_till, sack)
    }

    /// 发送端处理累计确认的窗口部分；返回确认点是否前进
    pub fn absorb_ack(&mut self, ack: u64, sack_len: usize) -> bool {
        self.scoreboard_sack_bytes = sack_len as u64 * self.mss;
        self.next_seq_no = self.next_seq_no.max(ack);
        if ack > self.last_unacked_seq {
            self.last_unacked_seq = ack;
            self.congestion.on_new_ack(&mut self.cwnd, self.max_cwnd);
            true
        } else {
            false
        }
    }

    /// 超时：回到最后确认点并把窗口收缩到 1
    pub fn rewind(&mut self) {
        self.congestion.on_timeout(self.cwnd);
        self.next_seq_no = self.last_unacked_seq;
        self.cwnd = 1;
    }
}
