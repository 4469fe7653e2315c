//! 队列策略（Queue disciplines）
//!
//! - DropTail：FIFO，满则丢弃新到达的包
//! - ProbDrop：在 DropTail 基础上按概率静默丢弃
//! - PFabric：总是接纳，超出容量时逐出优先级最差的包；出队按“最优包所属流的最老包”

use crate::config::QueueType;
use crate::net::Packet;

mod drop_tail;
mod pfabric;
mod prob_drop;

pub use drop_tail::DropTailQueue;
pub use pfabric::PFabricQueue;
pub use prob_drop::ProbDropQueue;

/// 入队结果
#[derive(Debug)]
pub enum Admission {
    /// 已入队
    Queued,
    /// 队列已满，到达的包被丢弃
    Dropped(Packet),
    /// 到达的包已入队，但为腾出空间逐出了这些包（可能包含到达的包本身）
    Evicted(Vec<Packet>),
    /// 随机丢弃，不计入队列溢出
    Discarded(Packet),
}

/// Packet 队列抽象
pub trait PacketQueue: std::fmt::Debug {
    /// 入队：按策略接纳、丢弃或逐出
    fn enqueue(&mut self, pkt: Packet) -> Admission;
    /// 出队：按队列策略返回下一个 packet
    fn dequeue(&mut self) -> Option<Packet>;
    /// 按包 id 取出（抢占时把正在发送的包从队列中拿走）
    fn remove(&mut self, pkt_id: u64) -> Option<Packet>;

    fn len(&self) -> usize;
    fn bytes(&self) -> u64;
    fn capacity_bytes(&self) -> u64;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// 按配置构造队列
pub fn build_queue(kind: QueueType, capacity_bytes: u64, drop_prob: f64, seed: u64) -> Box<dyn PacketQueue> {
    match kind {
        QueueType::DropTail => Box::new(DropTailQueue::new(capacity_bytes)),
        QueueType::PFabric => Box::new(PFabricQueue::new(capacity_bytes)),
        QueueType::ProbDrop => Box::new(ProbDropQueue::new(capacity_bytes, drop_prob, seed)),
    }
}
