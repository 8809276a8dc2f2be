//! Self-learning MAC address table
//!
//! Maps source MAC addresses to the port they were last seen on. The
//! processor thread learns from every frame; the aging thread periodically
//! evicts entries older than the configurable maximum age. The table is
//! small (bounded by the attached L2 domain) and written on every ingress,
//! so one mutex over the whole map is deliberate: it keeps the aging sweep
//! trivially consistent with concurrent learns.

use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fmt::Write;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;
use vswitch_core::{MacAddr, PortIndex};

/// Default aging threshold in seconds.
pub const DEFAULT_MAX_AGE_SECS: u64 = 15;

#[derive(Debug, Clone, Copy)]
struct TableEntry {
    port: PortIndex,
    last_seen: u64,
}

struct Inner {
    entries: BTreeMap<MacAddr, TableEntry>,
    max_age: u64,
}

/// Concurrent MAC-to-port map with time-based aging.
pub struct MacTable {
    inner: Mutex<Inner>,
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

impl MacTable {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: BTreeMap::new(),
                max_age: DEFAULT_MAX_AGE_SECS,
            }),
        }
    }

    /// Insert or refresh the mapping for `mac`, stamping it with the
    /// current wall-clock time.
    pub fn learn(&self, mac: MacAddr, port: PortIndex) {
        let mut inner = self.inner.lock();
        inner.entries.insert(
            mac,
            TableEntry {
                port,
                last_seen: epoch_secs(),
            },
        );
    }

    /// Port the MAC was last seen on, if the entry is still present.
    pub fn lookup(&self, mac: MacAddr) -> Option<PortIndex> {
        self.inner.lock().entries.get(&mac).map(|entry| entry.port)
    }

    /// Remove every entry older than the aging threshold. Returns the
    /// number of evicted entries.
    pub fn age_sweep(&self) -> usize {
        let now = epoch_secs();
        let mut inner = self.inner.lock();
        let max_age = inner.max_age;
        let before = inner.entries.len();

        inner
            .entries
            .retain(|_, entry| now.saturating_sub(entry.last_seen) <= max_age);

        let evicted = before - inner.entries.len();
        if evicted > 0 {
            debug!("aged out {} MAC table entries", evicted);
        }
        evicted
    }

    /// Current aging threshold in seconds.
    pub fn max_age(&self) -> u64 {
        self.inner.lock().max_age
    }

    /// Set the aging threshold. Rejects zero.
    pub fn set_max_age(&self, secs: u64) -> bool {
        if secs < 1 {
            return false;
        }
        self.inner.lock().max_age = secs;
        true
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// True when no entries are present.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Render the table for the CLI, sweeping stale entries first. Ports
    /// are shown by name; the last column is seconds of life remaining.
    pub fn render(&self, port_names: &[String]) -> String {
        self.age_sweep();

        let mut out = String::new();
        let _ = writeln!(out, "{:>30}Mac Address Table", "");
        let _ = writeln!(out, "{}", "-".repeat(80));
        let _ = writeln!(out);
        let _ = writeln!(
            out,
            "{:<20}{:<20}{:<20}",
            "Mac Address", "Port", "Time to Live"
        );
        let _ = writeln!(
            out,
            "{:<20}{:<20}{:<20}",
            "-".repeat(11),
            "-".repeat(4),
            "-".repeat(12)
        );

        let now = epoch_secs();
        let inner = self.inner.lock();
        for (mac, entry) in inner.entries.iter() {
            let ttl = inner.max_age as i64 - now.saturating_sub(entry.last_seen) as i64;
            let port = port_names
                .get(entry.port)
                .map(String::as_str)
                .unwrap_or("?");
            let _ = writeln!(out, "{:<20}{:<20}{:<20}", mac.to_string(), port, ttl);
        }

        out
    }

    #[cfg(test)]
    fn learn_at(&self, mac: MacAddr, port: PortIndex, last_seen: u64) {
        self.inner
            .lock()
            .entries
            .insert(mac, TableEntry { port, last_seen });
    }
}

impl Default for MacTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mac(last: u8) -> MacAddr {
        MacAddr([0x02, 0, 0, 0, 0, last])
    }

    #[test]
    fn test_learn_and_lookup() {
        let table = MacTable::new();
        assert_eq!(table.lookup(mac(1)), None);

        table.learn(mac(1), 3);
        assert_eq!(table.lookup(mac(1)), Some(3));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_learn_replaces_port() {
        let table = MacTable::new();
        table.learn(mac(1), 0);
        table.learn(mac(1), 2);

        // A MAC that moves ports keeps a single entry.
        assert_eq!(table.lookup(mac(1)), Some(2));
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn test_default_max_age() {
        let table = MacTable::new();
        assert_eq!(table.max_age(), DEFAULT_MAX_AGE_SECS);
    }

    #[test]
    fn test_set_max_age_rejects_zero() {
        let table = MacTable::new();
        assert!(!table.set_max_age(0));
        assert_eq!(table.max_age(), DEFAULT_MAX_AGE_SECS);

        assert!(table.set_max_age(1));
        assert_eq!(table.max_age(), 1);
    }

    #[test]
    fn test_age_sweep_evicts_only_stale() {
        let table = MacTable::new();
        let now = epoch_secs();

        table.learn_at(mac(1), 0, now);
        table.learn_at(mac(2), 1, now.saturating_sub(DEFAULT_MAX_AGE_SECS + 5));

        assert_eq!(table.age_sweep(), 1);
        assert_eq!(table.lookup(mac(1)), Some(0));
        assert_eq!(table.lookup(mac(2)), None);
    }

    #[test]
    fn test_age_sweep_boundary_is_strict() {
        let table = MacTable::new();
        let now = epoch_secs();

        // Exactly max_age old survives; one second past does not.
        table.learn_at(mac(1), 0, now.saturating_sub(DEFAULT_MAX_AGE_SECS));
        table.learn_at(mac(2), 0, now.saturating_sub(DEFAULT_MAX_AGE_SECS + 1));

        assert_eq!(table.age_sweep(), 1);
        assert_eq!(table.lookup(mac(1)), Some(0));
    }

    #[test]
    fn test_refresh_resets_age() {
        let table = MacTable::new();
        let now = epoch_secs();

        table.learn_at(mac(1), 0, now.saturating_sub(DEFAULT_MAX_AGE_SECS + 10));
        table.learn(mac(1), 0);

        assert_eq!(table.age_sweep(), 0);
        assert_eq!(table.lookup(mac(1)), Some(0));
    }

    #[test]
    fn test_render_sweeps_and_lists() {
        let table = MacTable::new();
        let now = epoch_secs();
        let names = vec!["p0".to_string(), "p1".to_string()];

        table.learn(mac(1), 1);
        table.learn_at(mac(2), 0, now.saturating_sub(1000));

        let rendered = table.render(&names);
        assert!(rendered.contains("02:00:00:00:00:01"));
        assert!(rendered.contains("p1"));
        // The stale entry was swept before printing.
        assert!(!rendered.contains("02:00:00:00:00:02"));
    }
}
