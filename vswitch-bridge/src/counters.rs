//! Per-port traffic counters
//!
//! Packet and byte counts per port and direction, with a baseline snapshot
//! so the CLI reports "since last clear". Ingress and egress use separate
//! per-port mutexes: the capture callbacks and the egress thread touch
//! different locks and never contend with each other.

use parking_lot::Mutex;
use std::fmt::Write;
use vswitch_core::PortIndex;

/// Which direction a frame crossed the port in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ingress,
    Egress,
}

#[derive(Debug, Clone, Copy, Default)]
struct Tally {
    packets: u64,
    bytes: u64,
}

#[derive(Debug, Default)]
struct Cell {
    current: Tally,
    baseline: Tally,
}

/// Per-port ingress/egress counters with snapshot baselines.
pub struct Counters {
    ingress: Vec<Mutex<Cell>>,
    egress: Vec<Mutex<Cell>>,
}

impl Counters {
    /// Create zeroed counters for `num_ports` ports.
    pub fn new(num_ports: usize) -> Self {
        Self {
            ingress: (0..num_ports).map(|_| Mutex::new(Cell::default())).collect(),
            egress: (0..num_ports).map(|_| Mutex::new(Cell::default())).collect(),
        }
    }

    /// Number of ports tracked.
    pub fn num_ports(&self) -> usize {
        self.ingress.len()
    }

    /// Count one frame of `bytes` length. Out-of-range ports are ignored.
    pub fn bump(&self, port: PortIndex, bytes: usize, direction: Direction) {
        let cells = match direction {
            Direction::Ingress => &self.ingress,
            Direction::Egress => &self.egress,
        };
        if let Some(cell) = cells.get(port) {
            let mut cell = cell.lock();
            cell.current.packets += 1;
            cell.current.bytes += bytes as u64;
        }
    }

    /// Copy the current values into the baseline, one lock at a time.
    pub fn snapshot(&self) {
        for cell in self.ingress.iter().chain(self.egress.iter()) {
            let mut cell = cell.lock();
            cell.baseline = cell.current;
        }
    }

    /// (packets, bytes) accumulated since the last snapshot.
    pub fn since_snapshot(&self, port: PortIndex, direction: Direction) -> (u64, u64) {
        let cells = match direction {
            Direction::Ingress => &self.ingress,
            Direction::Egress => &self.egress,
        };
        match cells.get(port) {
            Some(cell) => {
                let cell = cell.lock();
                (
                    cell.current.packets - cell.baseline.packets,
                    cell.current.bytes - cell.baseline.bytes,
                )
            }
            None => (0, 0),
        }
    }

    /// Render the counter table for the CLI: one row per port, values since
    /// the last clear.
    pub fn render(&self, port_names: &[String]) -> String {
        const PAD: usize = 16;
        let mut out = String::new();

        let _ = write!(out, "{:<PAD$}", "Port");
        for header in ["InBytes", "InPckts", "OutBytes", "OutPckts"] {
            let _ = write!(out, "{:>PAD$}", header);
        }
        let _ = writeln!(out);

        for (port, name) in port_names.iter().enumerate() {
            let (in_pkts, in_bytes) = self.since_snapshot(port, Direction::Ingress);
            let (out_pkts, out_bytes) = self.since_snapshot(port, Direction::Egress);

            let _ = write!(out, "{:<PAD$}", name);
            let _ = write!(out, "{:>PAD$}", in_bytes);
            let _ = write!(out, "{:>PAD$}", in_pkts);
            let _ = write!(out, "{:>PAD$}", out_bytes);
            let _ = writeln!(out, "{:>PAD$}", out_pkts);
        }

        out
    }
}
