//! DropTail（尾丢弃）队列
//!
//! 当队列容量不足时，直接丢弃新到达的 packet。

use std::collections::VecDeque;

use crate::net::Packet;

use super::{Admission, PacketQueue};

#[derive(Debug)]
pub struct DropTailQueue {
    max_bytes: u64,
    cur_bytes: u64,
    q: VecDeque<Packet>,
}

impl DropTailQueue {
    pub fn new(max_bytes: u64) -> Self {
        Self {
            max_bytes,
            cur_bytes: 0,
            q: VecDeque::new(),
        }
    }

    /// 是否还能放下 `sz` 字节
    pub(crate) fn fits(&self, sz: u64) -> bool {
        self.cur_bytes.saturating_add(sz) <= self.max_bytes
    }
}

impl PacketQueue for DropTailQueue {
    fn enqueue(&mut self, pkt: Packet) -> Admission {
        let sz = pkt.size_bytes as u64;
        if !self.fits(sz) {
            return Admission::Dropped(pkt);
        }
        self.cur_bytes += sz;
        self.q.push_back(pkt);
        Admission::Queued
    }

    fn dequeue(&mut self) -> Option<Packet> {
        let pkt = self.q.pop_front()?;
        self.cur_bytes -= pkt.size_bytes as u64;
        Some(pkt)
    }

    fn remove(&mut self, pkt_id: u64) -> Option<Packet> {
        let idx = self.q.iter().position(|p| p.id == pkt_id)?;
        let pkt = self.q.remove(idx)?;
        self.cur_bytes -= pkt.size_bytes as u64;
        Some(pkt)
    }

    fn len(&self) -> usize {
        self.q.len()
    }

    fn bytes(&self) -> u64 {
        self.cur_bytes
    }

    fn capacity_bytes(&self) -> u64 {
        self.max_bytes
    }
}
