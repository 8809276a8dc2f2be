//! Network interface enumeration and information

use ipnetwork::IpNetwork;
use pnet_datalink::{self, NetworkInterface};
use std::fmt;
use std::net::IpAddr;
use vswitch_core::{Error, MacAddr, Result};

/// Information about a network interface
#[derive(Debug, Clone)]
pub struct InterfaceInfo {
    /// Interface name (e.g., "vswitch-port1")
    pub name: String,
    /// Interface index assigned by the OS
    pub index: u32,
    /// MAC address if available
    pub mac: Option<MacAddr>,
    /// IP addresses assigned to this interface
    pub ips: Vec<IpAddr>,
    /// Whether the interface is up
    pub is_up: bool,
    /// Whether the interface is a loopback
    pub is_loopback: bool,
}

impl From<&NetworkInterface> for InterfaceInfo {
    fn from(iface: &NetworkInterface) -> Self {
        let mac = iface
            .mac
            .map(|mac| MacAddr([mac.0, mac.1, mac.2, mac.3, mac.4, mac.5]));
        let ips: Vec<IpAddr> = iface
            .ips
            .iter()
            .map(|network| match network {
                IpNetwork::V4(v4) => IpAddr::V4(v4.ip()),
                IpNetwork::V6(v6) => IpAddr::V6(v6.ip()),
            })
            .collect();

        InterfaceInfo {
            name: iface.name.clone(),
            index: iface.index,
            mac,
            ips,
            is_up: iface.is_up(),
            is_loopback: iface.is_loopback(),
        }
    }
}

impl InterfaceInfo {
    /// First IPv4 address assigned to this interface, if any
    pub fn primary_ipv4(&self) -> Option<std::net::Ipv4Addr> {
        self.ips.iter().find_map(|ip| match ip {
            IpAddr::V4(v4) => Some(*v4),
            IpAddr::V6(_) => None,
        })
    }
}

impl fmt::Display for InterfaceInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mac = self
            .mac
            .map(|m| m.to_string())
            .unwrap_or_else(|| "-".to_string());
        let state = if self.is_up { "up" } else { "down" };

        write!(f, "{:<16}{:<20}{:<8}", self.name, mac, state)?;
        for ip in &self.ips {
            write!(f, " {}", ip)?;
        }
        Ok(())
    }
}

/// List all available network interfaces
pub fn list_interfaces() -> Vec<InterfaceInfo> {
    pnet_datalink::interfaces()
        .iter()
        .map(InterfaceInfo::from)
        .collect()
}

/// Get information about a specific interface by name
pub fn get_interface(name: &str) -> Result<InterfaceInfo> {
    pnet_datalink::interfaces()
        .iter()
        .find(|iface| iface.name == name)
        .map(InterfaceInfo::from)
        .ok_or_else(|| Error::InterfaceNotFound(name.to_string()))
}

/// All interfaces whose name begins with `prefix`, in enumeration order
pub fn interfaces_with_prefix(prefix: &str) -> Vec<InterfaceInfo> {
    pnet_datalink::interfaces()
        .iter()
        .filter(|iface| iface.name.starts_with(prefix))
        .map(InterfaceInfo::from)
        .collect()
}

/// Find the underlying pnet interface by name
pub(crate) fn pnet_interface(name: &str) -> Result<NetworkInterface> {
    pnet_datalink::interfaces()
        .into_iter()
        .find(|iface| iface.name == name)
        .ok_or_else(|| Error::InterfaceNotFound(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_list_interfaces() {
        // Should at least have loopback on any test machine.
        let interfaces = list_interfaces();
        assert!(!interfaces.is_empty());
        assert!(interfaces.iter().any(|iface| iface.is_loopback));
    }

    #[test]
    fn test_get_nonexistent_interface() {
        let result = get_interface("nonexistent_interface_xyz");
        match result {
            Err(Error::InterfaceNotFound(_)) => {}
            other => panic!("Expected InterfaceNotFound, got {:?}", other.map(|i| i.name)),
        }
    }

    #[test]
    fn test_prefix_filter() {
        // An absurd prefix matches nothing; the empty prefix matches all.
        assert!(interfaces_with_prefix("no_such_prefix_xyz").is_empty());
        assert_eq!(
            interfaces_with_prefix("").len(),
            list_interfaces().len()
        );
    }
}
