//! Integration test harness for vswitch-rs
//!
//! Runs on a tester host whose interfaces are bridged by a switch under
//! test. A scenario is a sequence of [`wave::TestWave`]s: each wave
//! transmits frames and records which frames are expected to come back on
//! which ports; anything unexpected, or anything expected that never
//! arrives, fails the scenario. Results travel as process exit codes so an
//! orchestrator can drive many scenarios.

pub mod frames;
pub mod scenarios;
pub mod wave;

pub use wave::{run, TestBed, TestStatus, TestWave};
