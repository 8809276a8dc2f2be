//! Pipeline threads
//!
//! The datapath is a chain of loops around the shared [`SwitchState`]:
//! capture callbacks (one per port, on capture-library threads) feed the
//! queue, a single processor thread classifies, a single egress thread
//! transmits, and an aging thread sweeps the MAC table. None of these are
//! joined; they live until the process exits.

use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, warn};
use vswitch_core::{Frame, PortIndex};

use crate::counters::Direction;
use crate::switch::SwitchState;

/// Build the ingress callback for one port. The returned closure runs on
/// the port's capture thread for every arriving frame.
pub fn ingress_handler(
    state: Arc<SwitchState>,
    port: PortIndex,
) -> impl FnMut(Frame) + Send + 'static {
    move |frame| {
        // Our own transmission coming back around: swallow it.
        if state.echoes.consume(port, &frame) {
            return;
        }

        state.counters.bump(port, frame.len(), Direction::Ingress);

        // Best-effort: a full ring drops the frame. The ingress count has
        // already been taken, which is the only visible trace of the drop.
        if !state.queue.push(frame, port) {
            debug!("queue full, dropped frame from port {}", port);
        }
    }
}

/// Spawn the processor thread: classify queued frames forever.
pub fn spawn_processor(state: Arc<SwitchState>) {
    thread::spawn(move || {
        let num_ports = state.ports.len();
        loop {
            state.queue.process(&state.mac_table, &state.vlans, num_ports);
        }
    });
}

/// Spawn the egress thread: drain classified entries and transmit to each
/// destination. The echo registration must happen before the transmit; the
/// destination port's capture callback can fire before `send` returns.
pub fn spawn_egress(state: Arc<SwitchState>) {
    thread::spawn(move || loop {
        let entry = state.queue.pop();

        for &dst in &entry.dst_ports {
            state.echoes.mark(dst, &entry.frame);
            match state.ports[dst].send(&entry.frame) {
                Ok(()) => {
                    state
                        .counters
                        .bump(dst, entry.frame.len(), Direction::Egress);
                }
                Err(e) => {
                    warn!("transmit failed on {}: {}", state.ports[dst].name(), e);
                }
            }
        }
    });
}

/// Spawn the aging thread: sleep one aging interval, sweep, repeat. The
/// interval is re-read every iteration so a CLI change applies after the
/// sleep in flight.
pub fn spawn_aging(state: Arc<SwitchState>) {
    thread::spawn(move || loop {
        thread::sleep(Duration::from_secs(state.mac_table.max_age()));
        state.mac_table.age_sweep();
    });
}
