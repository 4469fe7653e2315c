//! 流相关的事件

use tracing::trace;

use crate::net::{FlowId, NetWorld};
use crate::sim::{Event, EventKind, Simulator, World, world_mut};

/// 事件：流在其开始时刻到达
#[derive(Debug)]
pub struct FlowArrival {
    pub flow: FlowId,
}

impl Event for FlowArrival {
    fn kind(&self) -> EventKind {
        EventKind::FlowArrival
    }

    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let w = world_mut::<NetWorld>(world);
        w.net.on_flow_arrival(self.flow, sim);
    }
}

/// 事件：重传定时器到期
#[derive(Debug)]
pub struct RetxTimeout {
    pub flow: FlowId,
}

impl Event for RetxTimeout {
    fn kind(&self) -> EventKind {
        EventKind::RetxTimeout
    }

    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let w = world_mut::<NetWorld>(world);
        let me = sim.current_event();
        if w.net.flows[self.flow.0].retx_event.map(|h| h.id) != me {
            trace!(flow = self.flow.0, "过期的重传定时器");
            return;
        }
        w.net.handle_timeout(self.flow, sim);
        let f = &mut w.net.flows[self.flow.0];
        if f.retx_event.map(|h| h.id) == me {
            f.retx_event = None;
        }
    }
}

/// 事件：流完成，记录结果
#[derive(Debug)]
pub struct FlowFinished {
    pub flow: FlowId,
}

impl Event for FlowFinished {
    fn kind(&self) -> EventKind {
        EventKind::FlowFinished
    }

    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let w = world_mut::<NetWorld>(world);
        w.net.on_flow_finished(self.flow, sim);
    }
}

/// 事件：唤醒流继续发送
#[derive(Debug)]
pub struct FlowProcessing {
    pub flow: FlowId,
}

impl Event for FlowProcessing {
    fn kind(&self) -> EventKind {
        EventKind::FlowProcessing
    }

    fn execute(self: Box<Self>, sim: &mut Simulator, world: &mut dyn World) {
        let w = world_mut::<NetWorld>(world);
        w.net.send_pending_data(self.flow, sim);
        let f = &mut w.net.flows[self.flow.0];
        if f.flow_proc_event.map(|h| h.id) == sim.current_event() {
            f.flow_proc_event = None;
        }
    }
}
