//! 调度主机：出端口空闲时才唤醒一条流发送
//!
//! 待发送的流放在主机的工作集里，最早开始的流优先。链路忙时按“当前包发完 + 队列中
//! 已有字节的发送时间”推迟一次主机处理事件。

use std::cmp::Ordering;

use tracing::{debug, trace};

use crate::net::{FlowId, NetWorld, Network, NodeId};
use crate::sim::{Event, EventKind, Simulator, World, world_mut};

/// 事件：调度主机重新尝试发送
#[derive(Debug)]
pub struct HostProcessing {
    pub host: NodeId,
}

impl Event for HostProcessing {
    fn kind(&self) -> EventKind {
        EventKind::HostProcessing
    }

    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let w = world_mut::<NetWorld>(world);
        let h = w.net.topo.host_mut(self.host);
        if h.proc_event.map(|e| e.id) == sim.current_event() {
            h.proc_event = None;
        }
        w.net.scheduling_host_send(self.host, sim);
    }
}

impl Network {
    /// 开始较早的流排在前面
    fn earlier_start(&self, a: FlowId, b: FlowId) -> Ordering {
        self.flows[b.0].start_time.cmp(&self.flows[a.0].start_time)
    }

    /// 流在调度主机上开始
    pub fn scheduling_host_start(&mut self, host: NodeId, flow: FlowId, sim: &mut Simulator) {
        let now = sim.now();
        let h = self.topo.host_mut(host);
        h.sending.push(flow);
        let idle = match h.proc_event {
            None => true,
            Some(ev) => ev.at < now,
        };
        trace!(host = host.0, flow = flow.0, idle, "流加入调度主机");
        if idle {
            self.scheduling_host_send(host, sim);
        }
    }

    /// 出端口空闲时唤醒最优的流；否则推迟到出端口预计空闲的时刻
    pub fn scheduling_host_send(&mut self, host: NodeId, sim: &mut Simulator) {
        if self.topo.host(host).sending.is_empty() {
            return;
        }
        let link = self.topo.host_link(host);
        let l = self.topo.link(link);

        if l.busy {
            let base = l.proc_event.map_or(sim.now(), |e| e.at);
            let at = base + l.tx_delay(l.queue.bytes());
            let handle = sim.schedule(at, HostProcessing { host });
            self.topo.host_mut(host).proc_event = Some(handle);
            trace!(host = host.0, at = at.as_secs(), "出端口忙，推迟发送");
            return;
        }

        let best = loop {
            let mut sending = std::mem::take(&mut self.topo.host_mut(host).sending);
            let top = sending.peek_by(|a, b| self.earlier_start(*a, *b)).copied();
            let finished = top.is_some_and(|f| self.flows[f.0].finished);
            if finished {
                sending.pop_by(|a, b| self.earlier_start(*a, *b));
            }
            self.topo.host_mut(host).sending = sending;
            match top {
                Some(_) if finished => continue,
                other => break other,
            }
        };
        if let Some(flow) = best {
            debug!(host = host.0, flow = flow.0, "唤醒流发送");
            self.send_pending_data(flow, sim);
        }
    }
}
