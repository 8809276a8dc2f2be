//! Bridge port: one bound interface with a capture handle and a sender

use parking_lot::{Mutex, RwLock};
use pcap::{Active, Capture, Device};
use pnet_datalink::{self, Channel, DataLinkSender};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use vswitch_core::{Error, Frame, MacAddr, Result};

use crate::interface::pnet_interface;

/// Maximum bytes captured per frame
const SNAPLEN: i32 = 65535;

/// pcap read timeout; doubles as the capture thread's stop-poll interval
const READ_TIMEOUT_MS: i32 = 1000;

/// State of a port's capture thread
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CaptureState {
    Stopped,
    Running,
}

/// One bound interface.
///
/// Holds a pcap handle for ingress (driven by a thread spawned in
/// [`Port::start_capture`]) and a persistent pnet datalink sender for
/// egress. The handle is opened once at startup and the port set never
/// changes afterwards.
pub struct Port {
    name: String,
    mac: MacAddr,
    capture: Arc<Mutex<Option<Capture<Active>>>>,
    state: Arc<RwLock<CaptureState>>,
    sender: Mutex<Box<dyn DataLinkSender>>,
}

impl Port {
    /// Open the named interface for capture and transmit.
    pub fn open(name: &str) -> Result<Self> {
        let iface = pnet_interface(name)?;

        let mac = iface
            .mac
            .map(|mac| MacAddr([mac.0, mac.1, mac.2, mac.3, mac.4, mac.5]))
            .ok_or_else(|| Error::interface(format!("interface '{}' has no MAC", name)))?;

        let capture = Capture::from_device(Device::from(name))
            .map_err(|e| Error::capture(format!("failed to create capture on {}: {}", name, e)))?
            .promisc(true)
            .snaplen(SNAPLEN)
            .timeout(READ_TIMEOUT_MS)
            .immediate_mode(true)
            .open()
            .map_err(|e| Error::capture(format!("failed to open {}: {}", name, e)))?;

        let (tx, _rx) = match pnet_datalink::channel(&iface, Default::default()) {
            Ok(Channel::Ethernet(tx, rx)) => (tx, rx),
            Ok(_) => {
                return Err(Error::interface(format!(
                    "unsupported channel type on {}",
                    name
                )))
            }
            Err(e) => {
                return Err(Error::interface(format!(
                    "failed to create channel on {}: {}",
                    name, e
                )))
            }
        };

        info!("Opened port {} ({})", name, mac);

        Ok(Self {
            name: name.to_string(),
            mac,
            capture: Arc::new(Mutex::new(Some(capture))),
            state: Arc::new(RwLock::new(CaptureState::Stopped)),
            sender: Mutex::new(tx),
        })
    }

    /// Interface name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Hardware address of the interface
    pub fn mac(&self) -> MacAddr {
        self.mac
    }

    /// Start capturing. `callback` is invoked with every arriving frame on
    /// a thread owned by this port; it must not block for long.
    pub fn start_capture<F>(&self, mut callback: F) -> Result<()>
    where
        F: FnMut(Frame) + Send + 'static,
    {
        if *self.state.read() == CaptureState::Running {
            return Err(Error::capture(format!(
                "capture already running on {}",
                self.name
            )));
        }
        *self.state.write() = CaptureState::Running;

        let capture_arc = Arc::clone(&self.capture);
        let state_arc = Arc::clone(&self.state);
        let name = self.name.clone();

        thread::Builder::new()
            .name(format!("capture-{}", name))
            .spawn(move || {
                let mut capture_guard = capture_arc.lock();
                if let Some(capture) = capture_guard.as_mut() {
                    loop {
                        if *state_arc.read() == CaptureState::Stopped {
                            debug!("Capture stopped on {}", name);
                            break;
                        }

                        match capture.next_packet() {
                            Ok(packet) => {
                                callback(Frame::from(packet.data));
                            }
                            Err(pcap::Error::TimeoutExpired) => {
                                // Idle tick; loop to re-check the stop flag.
                                continue;
                            }
                            Err(e) => {
                                error!("Capture error on {}: {}", name, e);
                                break;
                            }
                        }
                    }
                }
                drop(capture_guard);
                *state_arc.write() = CaptureState::Stopped;
            })
            .map_err(Error::Io)?;

        Ok(())
    }

    /// Stop the capture thread and release the pcap handle.
    pub fn stop_capture(&self) {
        if *self.state.read() == CaptureState::Stopped {
            return;
        }
        *self.state.write() = CaptureState::Stopped;

        // The thread notices the flag within the pcap read timeout; taking
        // the handle lock waits for it to exit.
        thread::sleep(Duration::from_millis(100));
        *self.capture.lock() = None;
        info!("Closed port {}", self.name);
    }

    /// Transmit a raw frame out this interface.
    pub fn send(&self, frame: &Frame) -> Result<()> {
        let mut sender = self.sender.lock();
        sender
            .send_to(frame.as_bytes(), None)
            .ok_or_else(|| Error::interface(format!("send unavailable on {}", self.name)))?
            .map_err(|e| Error::interface(format!("send failed on {}: {}", self.name, e)))?;
        Ok(())
    }
}

/// Open every interface whose name starts with `prefix`.
///
/// A port that fails to open is logged and skipped; the caller decides
/// whether an empty set is fatal.
pub fn open_ports_with_prefix(prefix: &str) -> Vec<Port> {
    let mut ports = Vec::new();

    for iface in crate::interface::interfaces_with_prefix(prefix) {
        match Port::open(&iface.name) {
            Ok(port) => ports.push(port),
            Err(e) => {
                warn!("Could not open {}: {}", iface.name, e);
            }
        }
    }

    ports
}
