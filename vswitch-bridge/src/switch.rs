//! Bridge orchestrator
//!
//! Discovers and opens the bound ports, owns the shared datapath state,
//! and starts the pipeline. All cross-thread access goes through one
//! `Arc<SwitchState>`; nothing hides in statics.

use std::sync::Arc;
use tracing::info;
use vswitch_capture::{open_ports_with_prefix, Port};
use vswitch_core::{Error, PortIndex, Result};

use crate::counters::Counters;
use crate::echo::EchoRegistry;
use crate::mac_table::MacTable;
use crate::pipeline;
use crate::queue::PacketQueue;
use crate::vlan::VlanMembership;

/// Everything the pipeline threads and the CLI share. The port vector is
/// read-only after construction; every other member synchronizes
/// internally.
pub struct SwitchState {
    pub ports: Vec<Port>,
    pub queue: PacketQueue,
    pub mac_table: MacTable,
    pub vlans: VlanMembership,
    pub counters: Counters,
    pub echoes: EchoRegistry,
}

impl SwitchState {
    /// Build state sized for the given port set.
    pub fn new(ports: Vec<Port>) -> Self {
        let num_ports = ports.len();
        Self {
            ports,
            queue: PacketQueue::new(),
            mac_table: MacTable::new(),
            vlans: VlanMembership::new(num_ports),
            counters: Counters::new(num_ports),
            echoes: EchoRegistry::new(num_ports),
        }
    }

    /// Names of the bound ports, in index order.
    pub fn port_names(&self) -> Vec<String> {
        self.ports.iter().map(|port| port.name().to_string()).collect()
    }

    /// Index of a port by its interface name.
    pub fn port_index(&self, name: &str) -> Option<PortIndex> {
        self.ports.iter().position(|port| port.name() == name)
    }
}

/// The running bridge.
pub struct Switch {
    state: Arc<SwitchState>,
}

impl Switch {
    /// Open every interface whose name starts with `prefix` and build the
    /// shared state. Individual open failures are logged and skipped; it is
    /// an error for no port to open at all.
    pub fn open(prefix: &str) -> Result<Self> {
        let ports = open_ports_with_prefix(prefix);
        if ports.is_empty() {
            return Err(Error::Startup(format!(
                "no usable interface with prefix '{}'",
                prefix
            )));
        }

        info!(
            "Bridging {} ports: {}",
            ports.len(),
            ports
                .iter()
                .map(Port::name)
                .collect::<Vec<_>>()
                .join(", ")
        );

        Ok(Self {
            state: Arc::new(SwitchState::new(ports)),
        })
    }

    /// Shared handle to the datapath state.
    pub fn state(&self) -> Arc<SwitchState> {
        Arc::clone(&self.state)
    }

    /// Start capture on every port and spawn the processor, egress, and
    /// aging threads.
    pub fn start(&self) -> Result<()> {
        for (index, port) in self.state.ports.iter().enumerate() {
            port.start_capture(pipeline::ingress_handler(self.state(), index))?;
        }

        pipeline::spawn_processor(self.state());
        pipeline::spawn_egress(self.state());
        pipeline::spawn_aging(self.state());

        info!("Pipeline running");
        Ok(())
    }

    /// Stop capture on every port. The pipeline threads stay parked on
    /// their condition variables until the process exits.
    pub fn shutdown(&self) {
        for port in &self.state.ports {
            port.stop_capture();
        }
    }
}
