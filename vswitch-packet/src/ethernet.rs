//! Ethernet II frame construction and parsing

use bytes::{BufMut, BytesMut};
use std::fmt;
use vswitch_core::{Error, Frame, MacAddr, Result};

/// Common EtherType values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EtherType {
    /// IPv4 (0x0800)
    IPv4,
    /// ARP (0x0806)
    ARP,
    /// VLAN-tagged frame (0x8100)
    VLAN,
    /// IPv6 (0x86DD)
    IPv6,
    /// Length field (LLC encapsulation, value <= 1500)
    LLC,
    /// Anything else
    Custom(u16),
}

impl EtherType {
    /// Convert EtherType to its wire value
    pub fn to_u16(self) -> u16 {
        match self {
            EtherType::IPv4 => 0x0800,
            EtherType::ARP => 0x0806,
            EtherType::VLAN => 0x8100,
            EtherType::IPv6 => 0x86DD,
            EtherType::LLC => 0,
            EtherType::Custom(val) => val,
        }
    }

    /// Create EtherType from the wire value
    pub fn from_u16(value: u16) -> Self {
        match value {
            0x0800 => EtherType::IPv4,
            0x0806 => EtherType::ARP,
            0x8100 => EtherType::VLAN,
            0x86DD => EtherType::IPv6,
            v if v <= 1500 => EtherType::LLC,
            val => EtherType::Custom(val),
        }
    }
}

impl fmt::Display for EtherType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EtherType::IPv4 => write!(f, "IPv4"),
            EtherType::ARP => write!(f, "ARP"),
            EtherType::VLAN => write!(f, "VLAN"),
            EtherType::IPv6 => write!(f, "IPv6"),
            EtherType::LLC => write!(f, "LLC"),
            EtherType::Custom(val) => write!(f, "0x{:04X}", val),
        }
    }
}

/// Parsed Ethernet II header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EthernetHeader {
    /// Destination MAC address
    pub destination: MacAddr,
    /// Source MAC address
    pub source: MacAddr,
    /// EtherType or length field
    pub ethertype: EtherType,
}

impl EthernetHeader {
    /// Minimum Ethernet frame size (without FCS)
    pub const MIN_FRAME_SIZE: usize = 60;

    /// Ethernet header size (dst + src + type/length)
    pub const HEADER_SIZE: usize = 14;

    /// Parse the header of a raw frame
    pub fn parse(frame: &Frame) -> Result<Self> {
        let data = frame.as_bytes();
        if data.len() < Self::HEADER_SIZE {
            return Err(Error::PacketParsing(format!(
                "frame too short for Ethernet header: {} bytes",
                data.len()
            )));
        }

        let destination = MacAddr::from_slice(&data[0..6])
            .ok_or_else(|| Error::PacketParsing("bad destination MAC".to_string()))?;
        let source = MacAddr::from_slice(&data[6..12])
            .ok_or_else(|| Error::PacketParsing("bad source MAC".to_string()))?;
        let ethertype = EtherType::from_u16(u16::from_be_bytes([data[12], data[13]]));

        Ok(Self {
            destination,
            source,
            ethertype,
        })
    }

    /// Build a full frame from this header and a payload, padded to the
    /// 60-byte Ethernet minimum.
    pub fn build(&self, payload: &[u8]) -> Frame {
        let mut buffer = BytesMut::with_capacity(Self::HEADER_SIZE + payload.len());

        buffer.put_slice(self.destination.as_bytes());
        buffer.put_slice(self.source.as_bytes());
        buffer.put_u16(self.ethertype.to_u16());
        buffer.put_slice(payload);

        let mut result = buffer.to_vec();
        if result.len() < Self::MIN_FRAME_SIZE {
            result.resize(Self::MIN_FRAME_SIZE, 0);
        }

        Frame::new(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ethertype_conversion() {
        assert_eq!(EtherType::IPv4.to_u16(), 0x0800);
        assert_eq!(EtherType::from_u16(0x0806), EtherType::ARP);
        assert_eq!(EtherType::from_u16(100), EtherType::LLC);
        assert_eq!(EtherType::from_u16(0x88B5), EtherType::Custom(0x88B5));
    }

    #[test]
    fn test_parse_header() {
        let data = vec![
            0xff, 0xff, 0xff, 0xff, 0xff, 0xff, // dst
            0x00, 0x11, 0x22, 0x33, 0x44, 0x55, // src
            0x08, 0x00, // IPv4
            0x01, 0x02, 0x03, 0x04,
        ];

        let hdr = EthernetHeader::parse(&Frame::new(data)).unwrap();
        assert!(hdr.destination.is_broadcast());
        assert_eq!(hdr.source.octets(), [0x00, 0x11, 0x22, 0x33, 0x44, 0x55]);
        assert_eq!(hdr.ethertype, EtherType::IPv4);
    }

    #[test]
    fn test_parse_short_frame() {
        let err = EthernetHeader::parse(&Frame::new(vec![0u8; 10]));
        assert!(err.is_err());
    }

    #[test]
    fn test_build_pads_to_minimum() {
        let hdr = EthernetHeader {
            destination: MacAddr::broadcast(),
            source: MacAddr([0, 1, 2, 3, 4, 5]),
            ethertype: EtherType::IPv4,
        };

        let frame = hdr.build(&[0xaa, 0xbb]);
        assert_eq!(frame.len(), EthernetHeader::MIN_FRAME_SIZE);

        let bytes = frame.as_bytes();
        assert_eq!(&bytes[0..6], MacAddr::broadcast().as_bytes());
        assert_eq!(u16::from_be_bytes([bytes[12], bytes[13]]), 0x0800);
        assert_eq!(&bytes[14..16], &[0xaa, 0xbb]);
    }

    #[test]
    fn test_build_parse_roundtrip() {
        let hdr = EthernetHeader {
            destination: MacAddr([0xaa, 0xbb, 0xcc, 0xdd, 0xee, 0xff]),
            source: MacAddr([0, 1, 2, 3, 4, 5]),
            ethertype: EtherType::ARP,
        };

        let parsed = EthernetHeader::parse(&hdr.build(&[1, 2, 3])).unwrap();
        assert_eq!(parsed, hdr);
    }
}
