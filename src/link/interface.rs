use crate::link::arp_table::ArpTable;
use crate::wire::arp::{ArpMessage, ArpOpcode};
use crate::wire::ethernet::{EtherType, EthernetAddress, EthernetFrame, EthernetHeader};
use crate::wire::ipv4::Ipv4Datagram;
use log::{debug, trace};
use std::collections::{HashMap, VecDeque};
use std::net::Ipv4Addr;
use std::rc::Rc;

/// Cool-down between ARP requests for the same IP, and how long a datagram
/// may wait for resolution before it is dropped.
pub const ARP_REQUEST_INTERVAL_MS: u64 = 5_000;

/// The physical output port where the interface sends its frames.
///
/// A single-method capability: the event loop supplies one, and its
/// `transmit` must not block.
pub trait OutputPort {
    fn transmit(&self, sender: &NetworkInterface, frame: &EthernetFrame);
}

#[derive(Debug, Clone)]
struct PendingDatagram {
    datagram: Ipv4Datagram,
    age_ms: u64,
}

/// A network interface connecting IP with Ethernet.
///
/// Translates outbound datagrams into link frames, resolving next-hop link
/// addresses over ARP, and hands inbound IPv4 payloads up through
/// `datagrams_received`.
pub struct NetworkInterface {
    name: String,
    port: Rc<dyn OutputPort>,
    link_address: EthernetAddress,
    ip_address: Ipv4Addr,
    arp_table: ArpTable,
    pending_datagrams: HashMap<u32, VecDeque<PendingDatagram>>,
    arp_requests_sent: HashMap<u32, u64>,
    datagrams_received: VecDeque<Ipv4Datagram>,
}

impl NetworkInterface {
    pub fn new(
        name: impl Into<String>,
        port: Rc<dyn OutputPort>,
        link_address: EthernetAddress,
        ip_address: Ipv4Addr,
    ) -> Self {
        let name = name.into();
        debug!("interface {name} has link address {link_address} and IP address {ip_address}");
        NetworkInterface {
            name,
            port,
            link_address,
            ip_address,
            arp_table: ArpTable::new(),
            pending_datagrams: HashMap::new(),
            arp_requests_sent: HashMap::new(),
            datagrams_received: VecDeque::new(),
        }
    }

    /// Send `dgram` toward `next_hop`, encapsulated in an Ethernet frame.
    ///
    /// An unresolved next hop queues the datagram and broadcasts an ARP
    /// request, at most once per [`ARP_REQUEST_INTERVAL_MS`] per IP.
    pub fn send_datagram(&mut self, dgram: &Ipv4Datagram, next_hop: Ipv4Addr) {
        let next_hop_numeric = u32::from(next_hop);

        if let Some(link_address) = self.arp_table.query(next_hop_numeric) {
            self.send_ipv4_frame(dgram, link_address);
            return;
        }

        if !self.arp_requests_sent.contains_key(&next_hop_numeric) {
            self.broadcast_arp_request(next_hop);
            self.arp_requests_sent.insert(next_hop_numeric, 0);
        }
        self.pending_datagrams
            .entry(next_hop_numeric)
            .or_default()
            .push_back(PendingDatagram { datagram: dgram.clone(), age_ms: 0 });
    }

    /// Process one inbound frame.
    pub fn recv_frame(&mut self, frame: EthernetFrame) {
        if frame.header.dst != self.link_address && frame.header.dst != EthernetAddress::BROADCAST {
            trace!("{}: ignoring frame for {}", self.name, frame.header.dst);
            return;
        }

        match frame.header.ethertype {
            EtherType::Ipv4 => match Ipv4Datagram::parse(&frame.payload) {
                Ok(datagram) => self.datagrams_received.push_back(datagram),
                Err(error) => trace!("{}: dropping unparseable datagram: {error}", self.name),
            },
            EtherType::Arp => {
                let message = match ArpMessage::parse(&frame.payload) {
                    Ok(message) => message,
                    Err(error) => {
                        trace!("{}: dropping unparseable ARP message: {error}", self.name);
                        return;
                    }
                };

                let sender_numeric = u32::from(message.sender_ip);
                self.arp_table.insert(sender_numeric, message.sender_link_address);

                // Resolution arrived: flush everything queued for that IP
                if let Some(queue) = self.pending_datagrams.remove(&sender_numeric) {
                    for pending in queue {
                        self.send_ipv4_frame(&pending.datagram, message.sender_link_address);
                    }
                }

                if message.opcode == ArpOpcode::Request && message.target_ip == self.ip_address {
                    self.send_arp_message(
                        &ArpMessage::reply(
                            self.link_address,
                            self.ip_address,
                            message.sender_link_address,
                            message.sender_ip,
                        ),
                        message.sender_link_address,
                    );
                }
            }
        }
    }

    /// `ms_since_last_tick` milliseconds have passed: age queued datagrams,
    /// request cool-downs, and the ARP cache.
    pub fn tick(&mut self, ms_since_last_tick: u64) {
        let name = &self.name;
        self.pending_datagrams.retain(|ip, queue| {
            for pending in queue.iter_mut() {
                pending.age_ms += ms_since_last_tick;
            }
            // The ARP request covering these datagrams has aged out
            while queue.front().map_or(false, |p| p.age_ms >= ARP_REQUEST_INTERVAL_MS) {
                trace!("{name}: dropping datagram awaiting resolution of {}", Ipv4Addr::from(*ip));
                queue.pop_front();
            }
            !queue.is_empty()
        });

        self.arp_requests_sent.retain(|_, age_ms| {
            *age_ms += ms_since_last_tick;
            *age_ms <= ARP_REQUEST_INTERVAL_MS
        });

        self.arp_table.tick(ms_since_last_tick);
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn link_address(&self) -> EthernetAddress {
        self.link_address
    }

    pub fn ip_address(&self) -> Ipv4Addr {
        self.ip_address
    }

    /// Inbound datagrams in arrival order
    pub fn datagrams_received(&mut self) -> &mut VecDeque<Ipv4Datagram> {
        &mut self.datagrams_received
    }

    pub fn arp_table(&self) -> &ArpTable {
        &self.arp_table
    }

    fn transmit(&self, frame: &EthernetFrame) {
        self.port.transmit(self, frame);
    }

    fn send_ipv4_frame(&self, dgram: &Ipv4Datagram, dst: EthernetAddress) {
        let frame = EthernetFrame {
            header: EthernetHeader {
                dst,
                src: self.link_address,
                ethertype: EtherType::Ipv4,
            },
            payload: dgram.serialize(),
        };
        self.transmit(&frame);
    }

    fn send_arp_message(&self, message: &ArpMessage, dst: EthernetAddress) {
        let mut payload = vec![0u8; ArpMessage::LENGTH];
        message
            .serialize(&mut payload)
            .expect("ARP buffer sized for message");
        let frame = EthernetFrame {
            header: EthernetHeader {
                dst,
                src: self.link_address,
                ethertype: EtherType::Arp,
            },
            payload,
        };
        self.transmit(&frame);
    }

    fn broadcast_arp_request(&self, unknown_ip: Ipv4Addr) {
        self.send_arp_message(
            &ArpMessage::request(self.link_address, self.ip_address, unknown_ip),
            EthernetAddress::BROADCAST,
        );
    }
}

// -- Unit tests --

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::ipv4::Ipv4Header;
    use std::cell::RefCell;

    const LOCAL_LINK: EthernetAddress = EthernetAddress([0x02, 0, 0, 0, 0, 0x01]);
    const PEER_LINK: EthernetAddress = EthernetAddress([0x02, 0, 0, 0, 0, 0x02]);

    #[derive(Default)]
    struct CapturePort {
        frames: RefCell<Vec<EthernetFrame>>,
    }

    impl OutputPort for CapturePort {
        fn transmit(&self, _sender: &NetworkInterface, frame: &EthernetFrame) {
            self.frames.borrow_mut().push(frame.clone());
        }
    }

    fn create_interface() -> (Rc<CapturePort>, NetworkInterface) {
        let port = Rc::new(CapturePort::default());
        let interface = NetworkInterface::new(
            "eth0",
            Rc::clone(&port) as Rc<dyn OutputPort>,
            LOCAL_LINK,
            Ipv4Addr::new(10, 0, 0, 1),
        );
        (port, interface)
    }

    fn datagram(src: Ipv4Addr, dst: Ipv4Addr, payload: &[u8]) -> Ipv4Datagram {
        let mut header = Ipv4Header {
            total_len: (Ipv4Header::LENGTH + payload.len()) as u16,
            src,
            dst,
            ..Ipv4Header::default()
        };
        header.compute_checksum();
        Ipv4Datagram::new(header, payload.to_vec())
    }

    fn arp_frame(message: &ArpMessage, dst: EthernetAddress, src: EthernetAddress) -> EthernetFrame {
        let mut payload = vec![0u8; ArpMessage::LENGTH];
        message.serialize(&mut payload).unwrap();
        EthernetFrame {
            header: EthernetHeader { dst, src, ethertype: EtherType::Arp },
            payload,
        }
    }

    #[test]
    fn test_unresolved_next_hop_broadcasts_request() {
        let (port, mut interface) = create_interface();
        let next_hop = Ipv4Addr::new(10, 0, 0, 2);
        let dgram = datagram(interface.ip_address(), Ipv4Addr::new(192, 168, 0, 1), b"hi");

        interface.send_datagram(&dgram, next_hop);

        let frames = port.frames.borrow();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].header.dst, EthernetAddress::BROADCAST);
        assert_eq!(frames[0].header.ethertype, EtherType::Arp);

        let request = ArpMessage::parse(&frames[0].payload).unwrap();
        assert_eq!(request.opcode, ArpOpcode::Request);
        assert_eq!(request.target_ip, next_hop);
        assert_eq!(request.sender_link_address, LOCAL_LINK);
    }

    #[test]
    fn test_reply_drains_pending_queue() {
        let (port, mut interface) = create_interface();
        let next_hop = Ipv4Addr::new(10, 0, 0, 2);
        let dgram = datagram(interface.ip_address(), Ipv4Addr::new(192, 168, 0, 1), b"hi");

        interface.send_datagram(&dgram, next_hop);
        assert_eq!(port.frames.borrow().len(), 1); // Just the ARP request

        let reply = ArpMessage::reply(PEER_LINK, next_hop, LOCAL_LINK, interface.ip_address());
        interface.recv_frame(arp_frame(&reply, LOCAL_LINK, PEER_LINK));

        let frames = port.frames.borrow();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[1].header.dst, PEER_LINK);
        assert_eq!(frames[1].header.ethertype, EtherType::Ipv4);
        assert_eq!(Ipv4Datagram::parse(&frames[1].payload).unwrap(), dgram);
    }

    #[test]
    fn test_resolved_next_hop_sends_immediately() {
        let (port, mut interface) = create_interface();
        let next_hop = Ipv4Addr::new(10, 0, 0, 2);

        let reply = ArpMessage::reply(PEER_LINK, next_hop, LOCAL_LINK, interface.ip_address());
        interface.recv_frame(arp_frame(&reply, LOCAL_LINK, PEER_LINK));

        let dgram = datagram(interface.ip_address(), Ipv4Addr::new(192, 168, 0, 1), b"hi");
        interface.send_datagram(&dgram, next_hop);

        let frames = port.frames.borrow();
        assert_eq!(frames.len(), 1); // No ARP request needed
        assert_eq!(frames[0].header.ethertype, EtherType::Ipv4);
        assert_eq!(frames[0].header.dst, PEER_LINK);
    }

    #[test]
    fn test_request_cooldown() {
        let (port, mut interface) = create_interface();
        let next_hop = Ipv4Addr::new(10, 0, 0, 2);
        let dgram = datagram(interface.ip_address(), Ipv4Addr::new(192, 168, 0, 1), b"hi");

        interface.send_datagram(&dgram, next_hop);
        interface.send_datagram(&dgram, next_hop);
        assert_eq!(port.frames.borrow().len(), 1); // One request covers both

        // After the cool-down a fresh request may go out
        interface.tick(ARP_REQUEST_INTERVAL_MS + 1);
        interface.send_datagram(&dgram, next_hop);
        assert_eq!(port.frames.borrow().len(), 2);
    }

    #[test]
    fn test_pending_datagrams_expire() {
        let (port, mut interface) = create_interface();
        let next_hop = Ipv4Addr::new(10, 0, 0, 2);
        let dgram = datagram(interface.ip_address(), Ipv4Addr::new(192, 168, 0, 1), b"hi");

        interface.send_datagram(&dgram, next_hop);
        interface.tick(ARP_REQUEST_INTERVAL_MS);

        // Too late: the queue is gone, so resolution transmits nothing
        let reply = ArpMessage::reply(PEER_LINK, next_hop, LOCAL_LINK, interface.ip_address());
        interface.recv_frame(arp_frame(&reply, LOCAL_LINK, PEER_LINK));

        let frames = port.frames.borrow();
        assert_eq!(frames.len(), 1); // Only the original ARP request
    }

    #[test]
    fn test_replies_to_arp_request_for_own_ip() {
        let (port, mut interface) = create_interface();
        let request = ArpMessage::request(PEER_LINK, Ipv4Addr::new(10, 0, 0, 2), interface.ip_address());
        interface.recv_frame(arp_frame(&request, EthernetAddress::BROADCAST, PEER_LINK));

        let frames = port.frames.borrow();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].header.dst, PEER_LINK);

        let reply = ArpMessage::parse(&frames[0].payload).unwrap();
        assert_eq!(reply.opcode, ArpOpcode::Reply);
        assert_eq!(reply.sender_ip, interface.ip_address());
        assert_eq!(reply.sender_link_address, LOCAL_LINK);
        assert_eq!(reply.target_link_address, PEER_LINK);
    }

    #[test]
    fn test_ignores_arp_request_for_other_ip() {
        let (port, mut interface) = create_interface();
        let request = ArpMessage::request(PEER_LINK, Ipv4Addr::new(10, 0, 0, 2), Ipv4Addr::new(10, 0, 0, 3));
        interface.recv_frame(arp_frame(&request, EthernetAddress::BROADCAST, PEER_LINK));

        // The sender mapping is still learned, but no reply goes out
        assert!(port.frames.borrow().is_empty());
        assert!(interface.arp_table().query(u32::from(Ipv4Addr::new(10, 0, 0, 2))).is_some());
    }

    #[test]
    fn test_inbound_ipv4_frame_is_queued() {
        let (_port, mut interface) = create_interface();
        let dgram = datagram(Ipv4Addr::new(192, 168, 0, 1), interface.ip_address(), b"hello");
        let frame = EthernetFrame {
            header: EthernetHeader { dst: LOCAL_LINK, src: PEER_LINK, ethertype: EtherType::Ipv4 },
            payload: dgram.serialize(),
        };

        interface.recv_frame(frame);
        assert_eq!(interface.datagrams_received().pop_front(), Some(dgram));
    }

    #[test]
    fn test_drops_frame_for_other_destination() {
        let (_port, mut interface) = create_interface();
        let dgram = datagram(Ipv4Addr::new(192, 168, 0, 1), interface.ip_address(), b"hello");
        let frame = EthernetFrame {
            header: EthernetHeader { dst: PEER_LINK, src: PEER_LINK, ethertype: EtherType::Ipv4 },
            payload: dgram.serialize(),
        };

        interface.recv_frame(frame);
        assert!(interface.datagrams_received().is_empty());
    }

    #[test]
    fn test_drops_corrupt_ipv4_payload() {
        let (_port, mut interface) = create_interface();
        let dgram = datagram(Ipv4Addr::new(192, 168, 0, 1), interface.ip_address(), b"hello");
        let mut payload = dgram.serialize();
        payload[8] ^= 0xff; // Break the header checksum

        let frame = EthernetFrame {
            header: EthernetHeader { dst: LOCAL_LINK, src: PEER_LINK, ethertype: EtherType::Ipv4 },
            payload,
        };
        interface.recv_frame(frame);
        assert!(interface.datagrams_received().is_empty());
    }

    #[test]
    fn test_arp_entry_expires_and_request_resumes() {
        let (port, mut interface) = create_interface();
        let next_hop = Ipv4Addr::new(10, 0, 0, 2);

        let reply = ArpMessage::reply(PEER_LINK, next_hop, LOCAL_LINK, interface.ip_address());
        interface.recv_frame(arp_frame(&reply, LOCAL_LINK, PEER_LINK));

        interface.tick(30_000 + 1);

        let dgram = datagram(interface.ip_address(), Ipv4Addr::new(192, 168, 0, 1), b"hi");
        interface.send_datagram(&dgram, next_hop);

        let frames = port.frames.borrow();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].header.ethertype, EtherType::Arp);
    }
}
