//! Wave harness
//!
//! Shared state for a scenario run. Capture callbacks on the tester's
//! interfaces check every arriving frame against the current wave's
//! expectations; the main thread transmits each wave, waits out its delay,
//! and then verifies that nothing expected is still outstanding.

use parking_lot::Mutex;
use std::net::Ipv4Addr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{error, warn};
use vswitch_bridge::EchoRegistry;
use vswitch_capture::{get_interface, Port};
use vswitch_core::{Frame, MacAddr, PortIndex, Result};

/// Scenario outcome, passed through the process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestStatus {
    Pass,
    Fail,
    InProgress,
}

impl TestStatus {
    pub fn exit_code(self) -> i32 {
        match self {
            TestStatus::Pass => 0,
            TestStatus::Fail => 1,
            TestStatus::InProgress => 2,
        }
    }
}

/// One wave of a scenario: frames to transmit, the frames expected to be
/// observed in response, and how long to wait for them.
pub struct TestWave {
    /// Frames expected to arrive, as a per-port multiset.
    pub expected: EchoRegistry,
    /// Frames to send and the tester port to send each from.
    pub to_transmit: Vec<(Frame, PortIndex)>,
    /// Seconds to wait after transmitting before evaluating.
    pub delay_secs: u64,
}

impl TestWave {
    pub fn new(num_ports: usize) -> Self {
        Self::with_delay(num_ports, 2)
    }

    pub fn with_delay(num_ports: usize, delay_secs: u64) -> Self {
        Self {
            expected: EchoRegistry::new(num_ports),
            to_transmit: Vec::new(),
            delay_secs,
        }
    }
}

/// Everything a scenario setup populates before the run.
pub struct TestBed {
    /// The tester's bound ports.
    pub ports: Vec<Port>,
    /// Waves to run, in order.
    pub waves: Vec<TestWave>,
    /// The tester's own transmissions, to be ignored when re-captured.
    pub echoes: EchoRegistry,
}

impl TestBed {
    pub fn new(ports: Vec<Port>) -> Self {
        let num_ports = ports.len();
        Self {
            ports,
            waves: Vec::new(),
            echoes: EchoRegistry::new(num_ports),
        }
    }

    pub fn num_ports(&self) -> usize {
        self.ports.len()
    }

    pub fn port_mac(&self, port: PortIndex) -> MacAddr {
        self.ports[port].mac()
    }

    /// First IPv4 address on the port's interface, or 0.0.0.0.
    pub fn port_ip(&self, port: PortIndex) -> Ipv4Addr {
        get_interface(self.ports[port].name())
            .ok()
            .and_then(|info| info.primary_ipv4())
            .unwrap_or(Ipv4Addr::UNSPECIFIED)
    }
}

struct RunnerShared {
    echoes: EchoRegistry,
    waves: Vec<TestWave>,
    current: AtomicUsize,
    status: Mutex<TestStatus>,
    port_names: Vec<String>,
}

impl RunnerShared {
    fn observe(&self, port: PortIndex, frame: Frame) {
        // Our own transmission re-captured on its source port.
        if self.echoes.consume(port, &frame) {
            return;
        }

        let wave = self.current.load(Ordering::SeqCst);
        if let Some(current) = self.waves.get(wave) {
            if current.expected.consume(port, &frame) {
                return;
            }
        }

        error!(
            "unexpected frame on {}: {} bytes",
            self.port_names[port],
            frame.len()
        );
        *self.status.lock() = TestStatus::Fail;
    }
}

/// Run every wave of a populated test bed. Returns the scenario outcome;
/// a scenario with no waves passes vacuously.
pub fn run(bed: TestBed) -> Result<TestStatus> {
    let TestBed {
        ports,
        waves,
        echoes,
    } = bed;

    let shared = Arc::new(RunnerShared {
        echoes,
        waves,
        current: AtomicUsize::new(0),
        status: Mutex::new(TestStatus::InProgress),
        port_names: ports.iter().map(|p| p.name().to_string()).collect(),
    });

    for (index, port) in ports.iter().enumerate() {
        let shared = Arc::clone(&shared);
        port.start_capture(move |frame| shared.observe(index, frame))?;
    }

    let mut outcome = TestStatus::Pass;

    for wave_index in 0..shared.waves.len() {
        let wave = &shared.waves[wave_index];

        for (frame, src) in &wave.to_transmit {
            if let Err(e) = ports[*src].send(frame) {
                warn!("transmit failed on {}: {}", ports[*src].name(), e);
            }
        }

        thread::sleep(Duration::from_secs(wave.delay_secs));

        let mut failed = *shared.status.lock() == TestStatus::Fail;
        for port in 0..ports.len() {
            if wave.expected.pending_on(port) > 0 {
                eprintln!(
                    "\tFAIL: not all expected frames were seen on {}",
                    shared.port_names[port]
                );
                failed = true;
            }
        }

        if failed {
            eprintln!("FAIL: at wave {}", wave_index + 1);
            eprint!("{}", wave.expected.dump("\t"));
            outcome = TestStatus::Fail;
            break;
        }

        shared.current.fetch_add(1, Ordering::SeqCst);
    }

    for port in &ports {
        port.stop_capture();
    }

    Ok(outcome)
}
