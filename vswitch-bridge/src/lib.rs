//! Datapath core of vswitch-rs
//!
//! The forwarding pipeline and its supporting state:
//!
//! - [`echo`] — per-port registry of frames the bridge itself transmitted,
//!   so their re-capture is suppressed
//! - [`mac_table`] — self-learned MAC-to-port mappings with aging
//! - [`vlan`] — declared VLANs and per-port membership
//! - [`counters`] — per-port ingress/egress packet and byte counts
//! - [`queue`] — the bounded three-stage packet queue where forwarding
//!   decisions are made
//! - [`pipeline`] — the ingress callbacks and the processor, egress, and
//!   aging threads
//! - [`switch`] — the orchestrator wiring ports and state together

pub mod counters;
pub mod echo;
pub mod mac_table;
pub mod pipeline;
pub mod queue;
pub mod switch;
pub mod vlan;

pub use counters::{Counters, Direction};
pub use echo::EchoRegistry;
pub use mac_table::MacTable;
pub use queue::{PacketQueue, QueueEntry, QUEUE_CAPACITY};
pub use switch::{Switch, SwitchState};
pub use vlan::VlanMembership;
