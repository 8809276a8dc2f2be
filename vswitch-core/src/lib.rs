//! vswitch-rs core library
//!
//! Fundamental types and error handling shared by every crate in the
//! workspace: the error/result pair, MAC addresses, VLAN identifiers, and
//! the raw frame type the datapath moves around.

pub mod error;
pub mod frame;
pub mod types;

pub use error::{Error, Result};
pub use frame::Frame;
pub use types::{MacAddr, PortIndex, VlanId, DEFAULT_VLAN, MAX_VLAN};
