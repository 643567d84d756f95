use crate::link::interface::NetworkInterface;
use crate::wire::ipv4::Ipv4Datagram;
use log::trace;
use std::cell::RefCell;
use std::collections::HashMap;
use std::net::Ipv4Addr;
use std::rc::Rc;

// Prefix lengths: [0, 32]
const PREFIX_LENGTH_COUNT: usize = 33;

#[derive(Debug, Clone, Copy)]
struct RouteDestination {
    next_hop: Option<Ipv4Addr>,
    interface_index: usize,
}

/// A router with multiple network interfaces, forwarding datagrams between
/// them by longest-prefix match.
///
/// The routing table keeps one bucket per prefix length; each bucket maps
/// the top `len` bits of a prefix to its destination.
pub struct Router {
    interfaces: Vec<Rc<RefCell<NetworkInterface>>>,
    routing_table: [HashMap<u32, RouteDestination>; PREFIX_LENGTH_COUNT],
}

impl Router {
    pub fn new() -> Self {
        Router {
            interfaces: Vec::new(),
            routing_table: std::array::from_fn(|_| HashMap::new()),
        }
    }

    /// Add an interface and return its index.
    pub fn add_interface(&mut self, interface: Rc<RefCell<NetworkInterface>>) -> usize {
        self.interfaces.push(interface);
        self.interfaces.len() - 1
    }

    pub fn interface(&self, index: usize) -> &Rc<RefCell<NetworkInterface>> {
        &self.interfaces[index]
    }

    /// Add a forwarding rule. A route with the same prefix and length
    /// overwrites the old destination. `next_hop` of `None` means the
    /// network is directly attached: deliver to the datagram's own
    /// destination address.
    pub fn add_route(
        &mut self,
        route_prefix: Ipv4Addr,
        prefix_length: u8,
        next_hop: Option<Ipv4Addr>,
        interface_index: usize,
    ) {
        assert!(prefix_length <= 32);
        assert!(interface_index < self.interfaces.len());

        let prefix = Self::prefix(u32::from(route_prefix), prefix_length);
        self.routing_table[prefix_length as usize]
            .insert(prefix, RouteDestination { next_hop, interface_index });
    }

    /// Drain every interface's inbound queue and forward each datagram.
    pub fn route(&mut self) {
        for index in 0..self.interfaces.len() {
            loop {
                let datagram = self.interfaces[index].borrow_mut().datagrams_received().pop_front();
                match datagram {
                    Some(datagram) => self.forward(datagram),
                    None => break,
                }
            }
        }
    }

    fn forward(&self, mut datagram: Ipv4Datagram) {
        if datagram.header.ttl <= 1 {
            trace!("router: TTL expired for datagram to {}", datagram.header.dst);
            return;
        }
        datagram.header.ttl -= 1;
        datagram.header.compute_checksum();

        let dst = u32::from(datagram.header.dst);

        // Longest prefix match
        for prefix_length in (0..=32u8).rev() {
            let bucket = &self.routing_table[prefix_length as usize];
            let Some(destination) = bucket.get(&Self::prefix(dst, prefix_length)) else {
                continue;
            };

            let next_hop = destination.next_hop.unwrap_or(datagram.header.dst);
            self.interfaces[destination.interface_index]
                .borrow_mut()
                .send_datagram(&datagram, next_hop);
            return;
        }

        trace!("router: no route to {}", datagram.header.dst);
    }

    fn prefix(ipv4_numeric: u32, prefix_length: u8) -> u32 {
        if prefix_length == 0 {
            0
        } else {
            ipv4_numeric >> (32 - prefix_length)
        }
    }
}

impl Default for Router {
    fn default() -> Self {
        Router::new()
    }
}

// -- Unit tests --
