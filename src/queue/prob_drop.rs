//! 概率丢弃队列
//!
//! 容量足够时仍以 `drop_prob` 的概率静默丢弃到达的包，其余行为与 DropTail 相同。

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::net::Packet;

use super::{Admission, DropTailQueue, PacketQueue};

#[derive(Debug)]
pub struct ProbDropQueue {
    inner: DropTailQueue,
    drop_prob: f64,
    rng: ChaCha8Rng,
}

impl ProbDropQueue {
    pub fn new(max_bytes: u64, drop_prob: f64, seed: u64) -> Self {
        Self {
            inner: DropTailQueue::new(max_bytes),
            drop_prob,
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl PacketQueue for ProbDropQueue {
    fn enqueue(&mut self, pkt: Packet) -> Admission {
        if !self.inner.fits(pkt.size_bytes as u64) {
            return Admission::Dropped(pkt);
        }
        let r: f64 = self.rng.gen_range(0.0..1.0);
        if r < self.drop_prob {
            return Admission::Discarded(pkt);
        }
        self.inner.enqueue(pkt)
    }

    fn dequeue(&mut self) -> Option<Packet> {
        self.inner.dequeue()
    }

    fn remove(&mut self, pkt_id: u64) -> Option<Packet> {
        self.inner.remove(pkt_id)
    }

    fn len(&self) -> usize {
        self.inner.len()
    }

    fn bytes(&self) -> u64 {
        self.inner.bytes()
    }

    fn capacity_bytes(&self) -> u64 {
        self.inner.capacity_bytes()
    }
}
