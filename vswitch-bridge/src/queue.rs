//! Bounded three-stage packet queue
//!
//! One fixed-size ring shared by three pipeline stages. Each slot is, at
//! any instant, owned by exactly one stage; the three cursors partition the
//! ring into contiguous arcs:
//!
//! ```text
//! [ out .. proc )  classified, ready for egress
//! [ proc .. in  )  produced, awaiting classification
//! [ in  .. out  )  empty
//! ```
//!
//! Ownership moves between stages by transferring counts under the stage
//! mutexes; `free + awaiting + ready == capacity` holds whenever the queue
//! is quiescent. Slot mutexes are leaves taken only by the stage that
//! currently owns the slot, so they never see contention; they exist to
//! express the handoff of the slot's contents safely.
//!
//! Producers (the per-port capture callbacks) never block: a push against a
//! full ring drops the frame. The single processor and single consumer
//! block on their stage's condition variable.

use parking_lot::{Condvar, Mutex};
use tracing::debug;
use vswitch_core::{Frame, PortIndex};
use vswitch_packet::EthernetHeader;

use crate::mac_table::MacTable;
use crate::vlan::VlanMembership;

/// Ring capacity used by the bridge.
pub const QUEUE_CAPACITY: usize = 50;

/// One slot's contents as they travel through the pipeline. The
/// destination set is empty until the processor stage fills it in.
#[derive(Debug, Clone, Default)]
pub struct QueueEntry {
    pub frame: Frame,
    pub src_port: PortIndex,
    pub dst_ports: Vec<PortIndex>,
}

struct Producer {
    cursor: usize,
    free: usize,
}

struct Stage {
    cursor: usize,
    pending: usize,
}

/// The bounded pipeline ring.
pub struct PacketQueue {
    slots: Box<[Mutex<QueueEntry>]>,
    capacity: usize,
    producer: Mutex<Producer>,
    awaiting: Mutex<Stage>,
    awaiting_cv: Condvar,
    ready: Mutex<Stage>,
    ready_cv: Condvar,
}

impl PacketQueue {
    /// Queue with the bridge's standard capacity.
    pub fn new() -> Self {
        Self::with_capacity(QUEUE_CAPACITY)
    }

    /// Queue with an explicit capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        assert!(capacity > 0, "queue capacity must be positive");
        Self {
            slots: (0..capacity)
                .map(|_| Mutex::new(QueueEntry::default()))
                .collect(),
            capacity,
            producer: Mutex::new(Producer {
                cursor: 0,
                free: capacity,
            }),
            awaiting: Mutex::new(Stage {
                cursor: 0,
                pending: 0,
            }),
            awaiting_cv: Condvar::new(),
            ready: Mutex::new(Stage {
                cursor: 0,
                pending: 0,
            }),
            ready_cv: Condvar::new(),
        }
    }

    /// Ring capacity.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Enqueue a captured frame. Returns false (dropping the frame) when
    /// the ring is full; producers never wait.
    pub fn push(&self, frame: Frame, src_port: PortIndex) -> bool {
        {
            let mut producer = self.producer.lock();
            if producer.free == 0 {
                return false;
            }

            {
                let mut slot = self.slots[producer.cursor].lock();
                slot.frame = frame;
                slot.src_port = src_port;
                slot.dst_ports.clear();
            }

            producer.cursor = (producer.cursor + 1) % self.capacity;
            producer.free -= 1;
        }

        {
            let mut awaiting = self.awaiting.lock();
            awaiting.pending += 1;
        }
        self.awaiting_cv.notify_one();

        true
    }

    /// Classify the oldest produced entry, blocking until one exists.
    ///
    /// Learns the source MAC, then resolves the destination set: a known
    /// unicast destination goes to its learned port if that port shares the
    /// source's VLAN (and is not the source itself); anything else floods
    /// to every other port in the source's VLAN. A frame too short to carry
    /// an Ethernet header is dropped by assigning it no destinations.
    pub fn process(&self, mac_table: &MacTable, vlans: &VlanMembership, num_ports: usize) {
        let mut awaiting = self.awaiting.lock();
        while awaiting.pending == 0 {
            self.awaiting_cv.wait(&mut awaiting);
        }

        {
            let mut slot = self.slots[awaiting.cursor].lock();
            let decision =
                forwarding_decision(&slot.frame, slot.src_port, mac_table, vlans, num_ports);
            slot.dst_ports = decision;
        }

        awaiting.cursor = (awaiting.cursor + 1) % self.capacity;
        awaiting.pending -= 1;
        drop(awaiting);

        {
            let mut ready = self.ready.lock();
            ready.pending += 1;
        }
        self.ready_cv.notify_one();
    }

    /// Dequeue the oldest classified entry, blocking until one exists.
    pub fn pop(&self) -> QueueEntry {
        let mut ready = self.ready.lock();
        while ready.pending == 0 {
            self.ready_cv.wait(&mut ready);
        }

        let entry = self.slots[ready.cursor].lock().clone();
        ready.cursor = (ready.cursor + 1) % self.capacity;
        ready.pending -= 1;
        drop(ready);

        // No condition variable for producers: they re-check on their next
        // push and drop in the meantime.
        self.producer.lock().free += 1;

        entry
    }

    /// Current (free, awaiting, ready) counts, sampled one stage at a time.
    /// Only meaningful when the pipeline is quiescent.
    pub fn occupancy(&self) -> (usize, usize, usize) {
        let free = self.producer.lock().free;
        let awaiting = self.awaiting.lock().pending;
        let ready = self.ready.lock().pending;
        (free, awaiting, ready)
    }
}

impl Default for PacketQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// The per-frame forwarding decision made in the processor stage.
fn forwarding_decision(
    frame: &Frame,
    src_port: PortIndex,
    mac_table: &MacTable,
    vlans: &VlanMembership,
    num_ports: usize,
) -> Vec<PortIndex> {
    let eth = match EthernetHeader::parse(frame) {
        Ok(eth) => eth,
        Err(e) => {
            debug!("dropping unparseable frame from port {}: {}", src_port, e);
            return Vec::new();
        }
    };

    mac_table.learn(eth.source, src_port);
    let src_vlan = vlans.vlan_of(src_port);

    match mac_table.lookup(eth.destination) {
        // Unknown destination: flood within the source's VLAN.
        None => (0..num_ports)
            .filter(|&port| port != src_port && vlans.vlan_of(port) == src_vlan)
            .collect(),
        // Never reflect back out the ingress port.
        Some(dst) if dst == src_port => Vec::new(),
        Some(dst) if vlans.vlan_of(dst) == src_vlan => vec![dst],
        // Learned on a port in another VLAN: isolated, drop.
        Some(_) => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use vswitch_core::MacAddr;
    use vswitch_packet::EtherType;

    fn frame_between(src: MacAddr, dst: MacAddr) -> Frame {
        EthernetHeader {
            destination: dst,
            source: src,
            ethertype: EtherType::IPv4,
        }
        .build(&[])
    }

    fn mac(last: u8) -> MacAddr {
        MacAddr([0x02, 0, 0, 0, 0, last])
    }

    #[test]
    fn test_push_until_full_then_drop() {
        let queue = PacketQueue::with_capacity(4);
        let f = frame_between(mac(1), MacAddr::broadcast());

        for _ in 0..4 {
            assert!(queue.push(f.clone(), 0));
        }
        // Tail drop once full.
        assert!(!queue.push(f.clone(), 0));
        assert_eq!(queue.occupancy(), (0, 4, 0));
    }

    #[test]
    fn test_pop_frees_space_for_producers() {
        let queue = PacketQueue::with_capacity(2);
        let table = MacTable::new();
        let vlans = VlanMembership::new(3);
        let f = frame_between(mac(1), MacAddr::broadcast());

        assert!(queue.push(f.clone(), 0));
        assert!(queue.push(f.clone(), 0));
        assert!(!queue.push(f.clone(), 0));

        queue.process(&table, &vlans, 3);
        queue.pop();
        assert!(queue.push(f, 0));
    }

    #[test]
    fn test_fifo_order_preserved() {
        let queue = PacketQueue::with_capacity(8);
        let table = MacTable::new();
        let vlans = VlanMembership::new(2);

        for i in 0..5u8 {
            let f = frame_between(mac(i + 1), MacAddr::broadcast());
            assert!(queue.push(f, 0));
        }
        for _ in 0..5 {
            queue.process(&table, &vlans, 2);
        }
        for i in 0..5u8 {
            let entry = queue.pop();
            let eth = EthernetHeader::parse(&entry.frame).unwrap();
            assert_eq!(eth.source, mac(i + 1));
        }
    }

    #[test]
    fn test_unknown_destination_floods_within_vlan() {
        let queue = PacketQueue::with_capacity(4);
        let table = MacTable::new();
        let vlans = VlanMembership::new(4);

        queue.push(frame_between(mac(1), mac(99)), 1);
        queue.process(&table, &vlans, 4);

        let entry = queue.pop();
        assert_eq!(entry.dst_ports, vec![0, 2, 3]);
        // The source MAC was learned on the ingress port.
        assert_eq!(table.lookup(mac(1)), Some(1));
    }

    #[test]
    fn test_flood_respects_vlan_membership() {
        let queue = PacketQueue::with_capacity(4);
        let table = MacTable::new();
        let vlans = VlanMembership::new(6);
        vlans.add_vlan(2).unwrap();
        for port in [1, 3, 5] {
            vlans.assign(port, 2).unwrap();
        }

        queue.push(frame_between(mac(1), MacAddr::broadcast()), 1);
        queue.process(&table, &vlans, 6);

        assert_eq!(queue.pop().dst_ports, vec![3, 5]);
    }

    #[test]
    fn test_known_destination_forwards_to_single_port() {
        let queue = PacketQueue::with_capacity(4);
        let table = MacTable::new();
        let vlans = VlanMembership::new(4);
        table.learn(mac(7), 3);

        queue.push(frame_between(mac(1), mac(7)), 0);
        queue.process(&table, &vlans, 4);

        assert_eq!(queue.pop().dst_ports, vec![3]);
    }

    #[test]
    fn test_no_reflection_to_source_port() {
        let queue = PacketQueue::with_capacity(4);
        let table = MacTable::new();
        let vlans = VlanMembership::new(4);
        table.learn(mac(7), 2);

        queue.push(frame_between(mac(1), mac(7)), 2);
        queue.process(&table, &vlans, 4);

        assert!(queue.pop().dst_ports.is_empty());
    }

    #[test]
    fn test_cross_vlan_unicast_dropped() {
        let queue = PacketQueue::with_capacity(4);
        let table = MacTable::new();
        let vlans = VlanMembership::new(4);
        vlans.add_vlan(2).unwrap();
        vlans.assign(3, 2).unwrap();
        table.learn(mac(7), 3);

        // Source is in VLAN 1, destination learned on a VLAN 2 port.
        queue.push(frame_between(mac(1), mac(7)), 0);
        queue.process(&table, &vlans, 4);

        assert!(queue.pop().dst_ports.is_empty());
    }

    #[test]
    fn test_malformed_frame_gets_no_destinations() {
        let queue = PacketQueue::with_capacity(4);
        let table = MacTable::new();
        let vlans = VlanMembership::new(4);

        queue.push(Frame::from(&[0u8; 6][..]), 0);
        queue.process(&table, &vlans, 4);

        let entry = queue.pop();
        assert!(entry.dst_ports.is_empty());
        // The slot still advanced; the ring is empty again.
        assert_eq!(queue.occupancy(), (4, 0, 0));
    }

    #[test]
    fn test_accounting_across_threads() {
        let queue = Arc::new(PacketQueue::with_capacity(16));
        let table = Arc::new(MacTable::new());
        let vlans = Arc::new(VlanMembership::new(4));
        const PER_PRODUCER: usize = 200;

        let producers: Vec<_> = (0..4)
            .map(|port| {
                let queue = Arc::clone(&queue);
                thread::spawn(move || {
                    let mut accepted = 0usize;
                    for i in 0..PER_PRODUCER {
                        let f = frame_between(mac(port as u8 + 1), mac((i % 7) as u8 + 50));
                        if queue.push(f, port) {
                            accepted += 1;
                        }
                    }
                    accepted
                })
            })
            .collect();

        // Nothing drains while producers race, so acceptances stop exactly
        // at capacity; the rest tail-drop.
        let accepted: usize = producers.into_iter().map(|h| h.join().unwrap()).sum();
        assert_eq!(accepted, 16);

        let processor = {
            let queue = Arc::clone(&queue);
            let table = Arc::clone(&table);
            let vlans = Arc::clone(&vlans);
            thread::spawn(move || {
                for _ in 0..accepted {
                    queue.process(&table, &vlans, 4);
                }
            })
        };
        let consumer = {
            let queue = Arc::clone(&queue);
            thread::spawn(move || {
                for _ in 0..accepted {
                    queue.pop();
                }
            })
        };

        processor.join().unwrap();
        consumer.join().unwrap();

        // Quiescent again: every slot back with the producer.
        assert_eq!(queue.occupancy(), (16, 0, 0));
    }
}
