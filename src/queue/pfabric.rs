//! pFabric 按优先级淘汰的队列
//!
//! 入队总是成功；超出容量后淘汰优先级数值最大的包（相同时淘汰最晚到的）。
//! 出队先找优先级最小的包（相同时取最早的），再发送该包所属流中最早排队的包，保证同一条流不乱序。

use crate::net::Packet;

use super::{Admission, PacketQueue};

#[derive(Debug)]
pub struct PFabricQueue {
    max_bytes: u64,
    cur_bytes: u64,
    q: Vec<Packet>,
}

impl PFabricQueue {
    pub fn new(max_bytes: u64) -> Self {
        Self {
            max_bytes,
            cur_bytes: 0,
            q: Vec::new(),
        }
    }

    fn worst_index(&self) -> Option<usize> {
        let mut worst: Option<usize> = None;
        for (i, p) in self.q.iter().enumerate() {
            match worst {
                Some(w) if p.priority < self.q[w].priority => {}
                _ => worst = Some(i),
            }
        }
        worst
    }

    fn best_index(&self) -> Option<usize> {
        let mut best: Option<usize> = None;
        for (i, p) in self.q.iter().enumerate() {
            match best {
                Some(b) if p.priority >= self.q[b].priority => {}
                _ => best = Some(i),
            }
        }
        best
    }

    fn take(&mut self, idx: usize) -> Packet {
        let pkt = self.q.remove(idx);
        self.cur_bytes -= pkt.size_bytes as u64;
        pkt
    }
}

impl PacketQueue for PFabricQueue {
    fn enqueue(&mut self, pkt: Packet) -> Admission {
        self.cur_bytes += pkt.size_bytes as u64;
        self.q.push(pkt);

        let mut evicted = Vec::new();
        while self.cur_bytes > self.max_bytes {
            let Some(idx) = self.worst_index() else { break };
            evicted.push(self.take(idx));
        }
        debug_assert_eq!(
            self.cur_bytes,
            self.q.iter().map(|p| p.size_bytes as u64).sum::<u64>()
        );

        if evicted.is_empty() {
            Admission::Queued
        } else {
            Admission::Evicted(evicted)
        }
    }

    fn dequeue(&mut self) -> Option<Packet> {
        let best = self.best_index()?;
        let flow = self.q[best].flow;
        let oldest = self.q.iter().position(|p| p.flow == flow).unwrap_or(best);
        Some(self.take(oldest))
    }

    fn remove(&mut self, pkt_id: u64) -> Option<Packet> {
        let idx = self.q.iter().position(|p| p.id == pkt_id)?;
        Some(self.take(idx))
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
