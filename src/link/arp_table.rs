use crate::wire::ethernet::EthernetAddress;
use log::debug;
use std::collections::HashMap;
use std::net::Ipv4Addr;

/// How long a learned mapping stays valid.
pub const ARP_ENTRY_TTL_MS: u64 = 30_000;

#[derive(Debug, Clone, Copy)]
struct Entry {
    link_address: EthernetAddress,
    age_ms: u64,
}

/// Cache of IPv4 → link-address mappings learned from ARP traffic.
#[derive(Debug, Default)]
pub struct ArpTable {
    entries: HashMap<u32, Entry>,
}

impl ArpTable {
    pub fn new() -> Self {
        ArpTable::default()
    }

    pub fn query(&self, ipv4_numeric: u32) -> Option<EthernetAddress> {
        self.entries.get(&ipv4_numeric).map(|entry| entry.link_address)
    }

    /// Record a mapping with a fresh age.
    pub fn insert(&mut self, ipv4_numeric: u32, link_address: EthernetAddress) {
        debug!("arp: learned {} -> {}", Ipv4Addr::from(ipv4_numeric), link_address);
        self.entries.insert(ipv4_numeric, Entry { link_address, age_ms: 0 });
    }

    /// Age every entry and forget those past [`ARP_ENTRY_TTL_MS`].
    pub fn tick(&mut self, ms_since_last_tick: u64) {
        for entry in self.entries.values_mut() {
            entry.age_ms += ms_since_last_tick;
        }
        self.entries.retain(|_, entry| entry.age_ms <= ARP_ENTRY_TTL_MS);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

// -- Unit tests --
