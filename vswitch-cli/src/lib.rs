//! CLI for vswitch-rs
//!
//! A line-oriented REPL in the style of a network OS shell: `show`
//! commands for the MAC table, counters, interfaces, and VLANs, plus the
//! handful of configuration commands the bridge accepts at runtime.

pub mod command;
pub mod repl;

pub use command::{Command, CommandParser};
pub use repl::Repl;
