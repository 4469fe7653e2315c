//! 世界 trait
//!
//! 定义仿真世界接口。事件只拿到 `&mut dyn World`，需要具体类型时用 [`world_mut`] 取回。

use super::simulator::Simulator;
use std::any::{Any, type_name};

/// 仿真世界：由业务层实现（例如网络拓扑/流量生成等）。
pub trait World: Any {
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn on_tick(&mut self, _sim: &mut Simulator) {}
}

/// 把事件拿到的世界还原成具体类型；类型不符说明事件被投递到了错误的世界。
pub fn world_mut<T: World>(world: &mut dyn World) -> &mut T {
    world
        .as_any_mut()
        .downcast_mut::<T>()
        .unwrap_or_else(|| panic!("world must be {}", type_name::<T>()))
}
