//! Self-echo suppression registry
//!
//! The capture library re-observes every frame the bridge transmits on a
//! port. Before each transmit, the egress thread records the frame here for
//! the destination port; when that port's capture callback later reports the
//! identical bytes, the ingress path consumes the record and discards the
//! frame instead of forwarding it again.
//!
//! The same payload can legitimately be in flight more than once, so each
//! per-port record is a multiset keyed on the raw frame bytes.

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt::Write;
use vswitch_core::{Frame, PortIndex};

/// Per-port multiset of frames awaiting their own echo.
pub struct EchoRegistry {
    pending: Vec<Mutex<BTreeMap<Frame, u32>>>,
}

impl EchoRegistry {
    /// Create a registry for `num_ports` ports.
    pub fn new(num_ports: usize) -> Self {
        Self {
            pending: (0..num_ports).map(|_| Mutex::new(BTreeMap::new())).collect(),
        }
    }

    /// Number of ports this registry was sized for.
    pub fn num_ports(&self) -> usize {
        self.pending.len()
    }

    /// Record one expected echo of `frame` on `port`.
    pub fn mark(&self, port: PortIndex, frame: &Frame) {
        let mut map = self.pending[port].lock();
        *map.entry(frame.clone()).or_insert(0) += 1;
    }

    /// If `frame` has a pending echo on `port`, consume one occurrence and
    /// return true. Ports do not contend with each other.
    pub fn consume(&self, port: PortIndex, frame: &Frame) -> bool {
        let mut map = self.pending[port].lock();
        match map.get_mut(frame) {
            Some(count) if *count > 1 => {
                *count -= 1;
                true
            }
            Some(_) => {
                map.remove(frame);
                true
            }
            None => false,
        }
    }

    /// Total pending occurrences for one port.
    pub fn pending_on(&self, port: PortIndex) -> usize {
        self.pending[port]
            .lock()
            .values()
            .map(|&count| count as usize)
            .sum()
    }

    /// Human-readable dump of everything still pending, each line prefixed
    /// by `prefix`. Used by the test harness to report frames that never
    /// arrived.
    pub fn dump(&self, prefix: &str) -> String {
        let mut out = String::new();

        for (port, map) in self.pending.iter().enumerate() {
            let map = map.lock();
            if map.is_empty() {
                continue;
            }
            let _ = writeln!(out, "{}==== pending on port {} ====", prefix, port);
            for (frame, count) in map.iter() {
                let shown = frame.as_bytes().len().min(14);
                let _ = writeln!(
                    out,
                    "{}{} x {} bytes, header {:02x?}",
                    prefix,
                    count,
                    frame.len(),
                    &frame.as_bytes()[..shown]
                );
            }
        }

        out
    }
}
