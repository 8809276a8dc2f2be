//! Scenario definitions
//!
//! Each setup populates a [`TestBed`] with waves: the frames to inject and
//! exactly where each must (and must not) reappear. Switch-side
//! configuration for a scenario (aging time, VLAN layout) is applied by
//! the orchestrator through the switch CLI before the scenario runs.

use rand::seq::SliceRandom;
use rand::Rng;
use tracing::warn;

use crate::frames::{broadcast_frame, unicast_frame};
use crate::wave::{TestBed, TestWave};

/// A scenario setup function.
pub type SetupFn = fn(&mut TestBed);

/// Name → setup for every scenario.
pub const SCENARIOS: &[(&str, SetupFn)] = &[
    ("broadcast", broadcast),
    ("learning", learning),
    ("aging", aging),
    ("mult-mac", mult_mac),
    ("vlan-broadcast", vlan_broadcast),
    ("cross-vlan-drop", cross_vlan_drop),
];

/// Find a scenario by name.
pub fn lookup(name: &str) -> Option<SetupFn> {
    SCENARIOS
        .iter()
        .find(|(scenario, _)| *scenario == name)
        .map(|(_, setup)| *setup)
}

/// All scenario names.
pub fn names() -> Vec<&'static str> {
    SCENARIOS.iter().map(|(name, _)| *name).collect()
}

/// Every port broadcasts one frame; each must be seen exactly once on
/// every other port and never on its source. Transmit order is shuffled.
///
/// Switch configuration: default.
fn broadcast(bed: &mut TestBed) {
    let num_ports = bed.num_ports();
    let mut wave = TestWave::new(num_ports);

    for src in 0..num_ports {
        let frame = broadcast_frame(bed.port_mac(src), bed.port_ip(src));

        bed.echoes.mark(src, &frame);
        for dst in 0..num_ports {
            if dst != src {
                wave.expected.mark(dst, &frame);
            }
        }
        wave.to_transmit.push((frame, src));
    }

    wave.to_transmit.shuffle(&mut rand::thread_rng());
    bed.waves.push(wave);
}

/// One random port broadcasts, teaching the switch its MAC; every other
/// port then sends it a unicast reply, which must arrive only there.
///
/// Switch configuration: default.
fn learning(bed: &mut TestBed) {
    let num_ports = bed.num_ports();
    let origin = rand::thread_rng().gen_range(0..num_ports);

    let mut wave1 = TestWave::new(num_ports);
    let announce = broadcast_frame(bed.port_mac(origin), bed.port_ip(origin));
    bed.echoes.mark(origin, &announce);
    for dst in 0..num_ports {
        if dst != origin {
            wave1.expected.mark(dst, &announce);
        }
    }
    wave1.to_transmit.push((announce, origin));
    bed.waves.push(wave1);

    let mut wave2 = TestWave::new(num_ports);
    for src in 0..num_ports {
        if src == origin {
            continue;
        }
        let reply = unicast_frame(
            bed.port_mac(src),
            bed.port_ip(src),
            bed.port_mac(origin),
            bed.port_ip(origin),
        );
        bed.echoes.mark(src, &reply);
        wave2.expected.mark(origin, &reply);
        wave2.to_transmit.push((reply, src));
    }
    bed.waves.push(wave2);
}

/// Like `learning`, but the replies come after the learned entry has aged
/// out, so each reply floods to everyone except its sender.
///
/// Switch configuration: `mac address-table aging-time 1`.
fn aging(bed: &mut TestBed) {
    let num_ports = bed.num_ports();
    let origin = rand::thread_rng().gen_range(0..num_ports);

    let mut wave1 = TestWave::with_delay(num_ports, 5);
    let announce = broadcast_frame(bed.port_mac(origin), bed.port_ip(origin));
    bed.echoes.mark(origin, &announce);
    for dst in 0..num_ports {
        if dst != origin {
            wave1.expected.mark(dst, &announce);
        }
    }
    wave1.to_transmit.push((announce, origin));
    bed.waves.push(wave1);

    let mut wave2 = TestWave::new(num_ports);
    for src in 0..num_ports {
        if src == origin {
            continue;
        }
        let reply = unicast_frame(
            bed.port_mac(src),
            bed.port_ip(src),
            bed.port_mac(origin),
            bed.port_ip(origin),
        );
        bed.echoes.mark(src, &reply);
        for dst in 0..num_ports {
            if dst != src {
                wave2.expected.mark(dst, &reply);
            }
        }
        wave2.to_transmit.push((reply, src));
    }
    bed.waves.push(wave2);
}

/// Port 0 broadcasts; then each port i sends one unicast to every port
/// below it. With learning in effect, none of the later frames flood.
///
/// Switch configuration: `mac address-table aging-time 128`.
fn mult_mac(bed: &mut TestBed) {
    let num_ports = bed.num_ports();

    let mut wave1 = TestWave::new(num_ports);
    let first = broadcast_frame(bed.port_mac(0), bed.port_ip(0));
    bed.echoes.mark(0, &first);
    for dst in 1..num_ports {
        wave1.expected.mark(dst, &first);
    }
    wave1.to_transmit.push((first, 0));
    bed.waves.push(wave1);

    for src in 1..num_ports {
        let mut wave = TestWave::new(num_ports);
        for dst in 0..src {
            let frame = unicast_frame(
                bed.port_mac(src),
                bed.port_ip(src),
                bed.port_mac(dst),
                bed.port_ip(dst),
            );
            bed.echoes.mark(src, &frame);
            wave.expected.mark(dst, &frame);
            wave.to_transmit.push((frame, src));
        }
        bed.waves.push(wave);
    }
}

/// Six ports, the odd-indexed ones on a second VLAN. Every port
/// broadcasts; each broadcast may only reach the other ports of its VLAN.
///
/// Switch configuration (6 ports, odd-indexed switch ports on VLAN 2):
///     vlan 2
///     <port1> vlan 2
///     <port3> vlan 2
///     <port5> vlan 2
fn vlan_broadcast(bed: &mut TestBed) {
    let num_ports = bed.num_ports();
    if num_ports != 6 {
        warn!(
            "vlan-broadcast expects exactly 6 interfaces, found {}; skipping",
            num_ports
        );
        return;
    }

    let mut wave = TestWave::new(num_ports);
    for src in 0..num_ports {
        let frame = broadcast_frame(bed.port_mac(src), bed.port_ip(src));

        bed.echoes.mark(src, &frame);
        for dst in 0..num_ports {
            if dst != src && dst % 2 == src % 2 {
                wave.expected.mark(dst, &frame);
            }
        }
        wave.to_transmit.push((frame, src));
    }
    bed.waves.push(wave);
}

/// Six ports with {0, 1, 2} on VLAN 2. Port 0 broadcasts (reaching only
/// its VLAN); then port 4, still on the default VLAN, sends a unicast to
/// port 0's learned MAC. VLAN isolation must drop it everywhere.
///
/// Switch configuration (6 ports):
///     vlan 2
///     <port0> vlan 2
///     <port1> vlan 2
///     <port2> vlan 2
fn cross_vlan_drop(bed: &mut TestBed) {
    let num_ports = bed.num_ports();
    if num_ports != 6 {
        warn!(
            "cross-vlan-drop expects exactly 6 interfaces, found {}; skipping",
            num_ports
        );
        return;
    }

    let mut wave1 = TestWave::new(num_ports);
    let announce = broadcast_frame(bed.port_mac(0), bed.port_ip(0));
    bed.echoes.mark(0, &announce);
    for dst in [1, 2] {
        wave1.expected.mark(dst, &announce);
    }
    wave1.to_transmit.push((announce, 0));
    bed.waves.push(wave1);

    // Expect nothing anywhere for the cross-VLAN unicast.
    let mut wave2 = TestWave::new(num_ports);
    let stray = unicast_frame(
        bed.port_mac(4),
        bed.port_ip(4),
        bed.port_mac(0),
        bed.port_ip(0),
    );
    bed.echoes.mark(4, &stray);
    wave2.to_transmit.push((stray, 4));
    bed.waves.push(wave2);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_known_names() {
        for (name, _) in SCENARIOS {
            assert!(lookup(name).is_some(), "missing scenario {}", name);
        }
    }

    #[test]
    fn test_lookup_unknown_name() {
        assert!(lookup("no-such-scenario").is_none());
    }

    #[test]
    fn test_names_are_unique() {
        let mut names = names();
        names.sort_unstable();
        let before = names.len();
        names.dedup();
        assert_eq!(names.len(), before);
    }
}
