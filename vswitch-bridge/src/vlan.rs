//! VLAN declarations and per-port membership
//!
//! VLANs here are a local forwarding policy: each port belongs to exactly
//! one VLAN, and frames only ever flow between ports sharing one. Nothing
//! is tagged on the wire.
//!
//! The per-port mapping takes a lock per port so concurrent datapath
//! lookups on distinct ports never contend. The declared-VLAN set is only
//! touched by the CLI thread; its mutex exists to keep the type `Sync`, not
//! because mutations race.

use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::fmt::Write;
use vswitch_core::{Error, PortIndex, Result, VlanId, DEFAULT_VLAN, MAX_VLAN};

/// Declared VLANs and the port-to-VLAN mapping.
pub struct VlanMembership {
    port_vlan: Vec<Mutex<VlanId>>,
    declared: Mutex<BTreeSet<VlanId>>,
}

fn check_vlan_id(vlan: VlanId) -> Result<()> {
    if vlan == DEFAULT_VLAN {
        return Err(Error::config(format!(
            "VLAN {} is the default VLAN and cannot be changed",
            DEFAULT_VLAN
        )));
    }
    if vlan < 1 || vlan > MAX_VLAN {
        return Err(Error::config(format!(
            "VLAN id must be in [1, {}]",
            MAX_VLAN
        )));
    }
    Ok(())
}

impl VlanMembership {
    /// Create the membership map for `num_ports` ports, all in VLAN 1.
    pub fn new(num_ports: usize) -> Self {
        let mut declared = BTreeSet::new();
        declared.insert(DEFAULT_VLAN);

        Self {
            port_vlan: (0..num_ports).map(|_| Mutex::new(DEFAULT_VLAN)).collect(),
            declared: Mutex::new(declared),
        }
    }

    /// Number of ports in the mapping.
    pub fn num_ports(&self) -> usize {
        self.port_vlan.len()
    }

    /// VLAN of a port, or `None` for an out-of-range index. Datapath
    /// callers always pass valid indices.
    pub fn vlan_of(&self, port: PortIndex) -> Option<VlanId> {
        self.port_vlan.get(port).map(|cell| *cell.lock())
    }

    /// Declare a new VLAN.
    pub fn add_vlan(&self, vlan: VlanId) -> Result<()> {
        check_vlan_id(vlan)?;
        self.declared.lock().insert(vlan);
        Ok(())
    }

    /// Delete a VLAN. Every member port falls back to the default VLAN.
    pub fn remove_vlan(&self, vlan: VlanId) -> Result<()> {
        check_vlan_id(vlan)?;

        for cell in &self.port_vlan {
            let mut assigned = cell.lock();
            if *assigned == vlan {
                *assigned = DEFAULT_VLAN;
            }
        }
        self.declared.lock().remove(&vlan);
        Ok(())
    }

    /// Assign a port to a declared VLAN.
    pub fn assign(&self, port: PortIndex, vlan: VlanId) -> Result<()> {
        if !self.declared.lock().contains(&vlan) {
            return Err(Error::config(format!("VLAN {} does not exist", vlan)));
        }
        let cell = self
            .port_vlan
            .get(port)
            .ok_or_else(|| Error::config(format!("no port with index {}", port)))?;

        *cell.lock() = vlan;
        Ok(())
    }

    /// Render declared VLANs with their member ports for the CLI.
    pub fn render(&self, port_names: &[String]) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "{:<8}{}", "VLAN", "Ports");
        let _ = writeln!(out, "{:<8}{}", "----", "-----");

        let declared = self.declared.lock().clone();
        for vlan in declared {
            let mut members = Vec::new();
            for (port, cell) in self.port_vlan.iter().enumerate() {
                if *cell.lock() == vlan {
                    members.push(
                        port_names
                            .get(port)
                            .map(String::as_str)
                            .unwrap_or("?")
                            .to_string(),
                    );
                }
            }
            let _ = writeln!(out, "{:<8}{}", vlan, members.join(", "));
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_ports_start_in_default_vlan() {
        let vlans = VlanMembership::new(4);
        for port in 0..4 {
            assert_eq!(vlans.vlan_of(port), Some(DEFAULT_VLAN));
        }
        assert_eq!(vlans.vlan_of(4), None);
    }

    #[test]
    fn test_add_vlan_range_rules() {
        let vlans = VlanMembership::new(2);

        assert!(vlans.add_vlan(2).is_ok());
        assert!(vlans.add_vlan(MAX_VLAN).is_ok());
        assert!(vlans.add_vlan(DEFAULT_VLAN).is_err());
        assert!(vlans.add_vlan(0).is_err());
        assert!(vlans.add_vlan(MAX_VLAN + 1).is_err());
    }

    #[test]
    fn test_assign_requires_declared_vlan() {
        let vlans = VlanMembership::new(2);

        assert!(vlans.assign(0, 5).is_err());
        vlans.add_vlan(5).unwrap();
        assert!(vlans.assign(0, 5).is_ok());
        assert_eq!(vlans.vlan_of(0), Some(5));
        assert_eq!(vlans.vlan_of(1), Some(DEFAULT_VLAN));
    }

    #[test]
    fn test_assign_rejects_bad_port() {
        let vlans = VlanMembership::new(2);
        vlans.add_vlan(5).unwrap();
        assert!(vlans.assign(7, 5).is_err());
    }

    #[test]
    fn test_remove_vlan_reassigns_members() {
        let vlans = VlanMembership::new(3);
        vlans.add_vlan(10).unwrap();
        vlans.assign(0, 10).unwrap();
        vlans.assign(2, 10).unwrap();

        vlans.remove_vlan(10).unwrap();
        assert_eq!(vlans.vlan_of(0), Some(DEFAULT_VLAN));
        assert_eq!(vlans.vlan_of(2), Some(DEFAULT_VLAN));
        // Re-assigning to the deleted VLAN now fails.
        assert!(vlans.assign(0, 10).is_err());
    }

    #[test]
    fn test_remove_default_vlan_rejected() {
        let vlans = VlanMembership::new(1);
        assert!(vlans.remove_vlan(DEFAULT_VLAN).is_err());
    }

    #[test]
    fn test_render_groups_ports_by_vlan() {
        let vlans = VlanMembership::new(3);
        let names = vec!["a".to_string(), "b".to_string(), "c".to_string()];
        vlans.add_vlan(2).unwrap();
        vlans.assign(1, 2).unwrap();

        let rendered = vlans.render(&names);
        let default_line = rendered
            .lines()
            .find(|line| line.starts_with('1'))
            .unwrap();
        let vlan2_line = rendered
            .lines()
            .find(|line| line.starts_with('2'))
            .unwrap();

        assert!(default_line.contains("a") && default_line.contains("c"));
        assert!(vlan2_line.contains("b") && !vlan2_line.contains("a"));
    }
}
