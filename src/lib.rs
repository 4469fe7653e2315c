pub mod config;
pub mod error;
pub mod fastpass;
pub mod flow;
pub mod net;
pub mod queue;
pub mod report;
pub mod sched;
pub mod sim;
pub mod topo;
pub mod viz;
pub mod workload;

#[cfg(test)]
mod test;
