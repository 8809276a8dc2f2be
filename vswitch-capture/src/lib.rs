//! Packet capture layer for vswitch-rs
//!
//! A thin, thread-safe wrapper around pcap and pnet for the bridge's port
//! handles:
//!
//! - **Interface management**: enumerate host interfaces, select the set
//!   bound to the bridge by name prefix
//! - **Capture**: per-port capture with a per-frame callback invoked on a
//!   dedicated thread
//! - **Transmit**: a persistent datalink sender per port
//!
//! Capture and transmit deliberately use separate handles on the same
//! interface; a frame sent through the datalink channel is re-observed by
//! the capture handle, which is why the bridge tracks pending self-echoes.

pub mod interface;
pub mod port;

pub use interface::{get_interface, interfaces_with_prefix, list_interfaces, InterfaceInfo};
pub use port::{open_ports_with_prefix, Port};
