//! Test traffic crafting
//!
//! Frames with an Ethernet header and a bare IPv4 payload, enough for the
//! bridge to make real forwarding decisions and for expectations to key on
//! exact bytes.

use std::net::Ipv4Addr;
use vswitch_core::{Frame, MacAddr};
use vswitch_packet::{EtherType, EthernetHeader, Ipv4Builder};

const TEST_IP_ID: u16 = 2000;

/// A broadcast frame originating from the given address pair.
pub fn broadcast_frame(src_mac: MacAddr, src_ip: Ipv4Addr) -> Frame {
    let payload = Ipv4Builder::new(src_ip, Ipv4Addr::BROADCAST)
        .identification(TEST_IP_ID)
        .ttl(64)
        .build();

    EthernetHeader {
        destination: MacAddr::broadcast(),
        source: src_mac,
        ethertype: EtherType::IPv4,
    }
    .build(&payload)
}

/// A unicast frame between two address pairs.
pub fn unicast_frame(
    src_mac: MacAddr,
    src_ip: Ipv4Addr,
    dst_mac: MacAddr,
    dst_ip: Ipv4Addr,
) -> Frame {
    let payload = Ipv4Builder::new(src_ip, dst_ip)
        .identification(TEST_IP_ID)
        .ttl(64)
        .build();

    EthernetHeader {
        destination: dst_mac,
        source: src_mac,
        ethertype: EtherType::IPv4,
    }
    .build(&payload)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mac(last: u8) -> MacAddr {
        MacAddr([0x02, 0, 0, 0, 0, last])
    }

    #[test]
    fn test_broadcast_frame_header() {
        let frame = broadcast_frame(mac(1), Ipv4Addr::new(10, 0, 0, 1));
        let eth = EthernetHeader::parse(&frame).unwrap();

        assert!(eth.destination.is_broadcast());
        assert_eq!(eth.source, mac(1));
        assert_eq!(eth.ethertype, EtherType::IPv4);
        assert!(frame.len() >= EthernetHeader::MIN_FRAME_SIZE);
    }

    #[test]
    fn test_unicast_frame_header() {
        let frame = unicast_frame(
            mac(1),
            Ipv4Addr::new(10, 0, 0, 1),
            mac(2),
            Ipv4Addr::new(10, 0, 0, 2),
        );
        let eth = EthernetHeader::parse(&frame).unwrap();

        assert_eq!(eth.destination, mac(2));
        assert_eq!(eth.source, mac(1));
    }

    #[test]
    fn test_frames_from_different_sources_differ() {
        let ip = Ipv4Addr::new(10, 0, 0, 1);
        assert_ne!(broadcast_frame(mac(1), ip), broadcast_frame(mac(2), ip));
    }
}
