use machine_core::{MachineSystem, SeekStats};
use machine_io::metrics::{init_metrics, record_position, record_stats, serve_metrics};
use std::thread;
use tracing::info;

pub fn init() {
    init_metrics();
}

pub fn start_metrics_server(addr: &Option<String>) -> Option<thread::JoinHandle<()>> {
    addr.as_ref().map(|addr| {
        info!(addr = %addr, "Starting metrics server");
        serve_metrics(addr.clone())
    })
}

/// Publish what changed since `before` was read.
pub fn observe(system: &MachineSystem, before: SeekStats) {
    record_stats(before, system.stats());
    record_position(system.machine_number(), system.frame(), system.machine_time());
}
