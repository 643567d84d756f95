use crate::wire::errors::WireError;
use crate::wire::ethernet::EthernetAddress;
use std::net::Ipv4Addr;

const HTYPE_ETHERNET: u16 = 1;
const PTYPE_IPV4: u16 = 0x0800;
const HLEN_ETHERNET: u8 = 6;
const PLEN_IPV4: u8 = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArpOpcode {
    Request,
    Reply,
}

impl ArpOpcode {
    pub fn value(self) -> u16 {
        match self {
            ArpOpcode::Request => 1,
            ArpOpcode::Reply => 2,
        }
    }

    pub fn from_value(value: u16) -> Result<Self, WireError> {
        match value {
            1 => Ok(ArpOpcode::Request),
            2 => Ok(ArpOpcode::Reply),
            other => Err(WireError::Unsupported { field: "ARP opcode", value: other }),
        }
    }
}

/// An ARP message for IPv4 over Ethernet (rfc826).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ArpMessage {
    pub opcode: ArpOpcode,
    pub sender_link_address: EthernetAddress,
    pub sender_ip: Ipv4Addr,
    pub target_link_address: EthernetAddress,
    pub target_ip: Ipv4Addr,
}

impl ArpMessage {
    pub const LENGTH: usize = 28;

    /// An ARP request for `target_ip`. The target link address is left
    /// zeroed; filling it in is the point of the exchange.
    pub fn request(sender_link_address: EthernetAddress, sender_ip: Ipv4Addr, target_ip: Ipv4Addr) -> Self {
        ArpMessage {
            opcode: ArpOpcode::Request,
            sender_link_address,
            sender_ip,
            target_link_address: EthernetAddress([0; 6]),
            target_ip,
        }
    }

    /// An ARP reply to the given requester.
    pub fn reply(
        sender_link_address: EthernetAddress,
        sender_ip: Ipv4Addr,
        target_link_address: EthernetAddress,
        target_ip: Ipv4Addr,
    ) -> Self {
        ArpMessage {
            opcode: ArpOpcode::Reply,
            sender_link_address,
            sender_ip,
            target_link_address,
            target_ip,
        }
    }

    /// Serialize an `ArpMessage` into a byte array of size 28.
    pub fn serialize(&self, buf: &mut [u8]) -> Result<usize, WireError> {
        if buf.len() < Self::LENGTH {
            return Err(WireError::BufferTooSmall { expected: Self::LENGTH, found: buf.len() });
        }

        buf[0..2].copy_from_slice(&HTYPE_ETHERNET.to_be_bytes());
        buf[2..4].copy_from_slice(&PTYPE_IPV4.to_be_bytes());
        buf[4] = HLEN_ETHERNET;
        buf[5] = PLEN_IPV4;
        buf[6..8].copy_from_slice(&self.opcode.value().to_be_bytes());
        buf[8..14].copy_from_slice(&self.sender_link_address.octets());
        buf[14..18].copy_from_slice(&self.sender_ip.octets());
        buf[18..24].copy_from_slice(&self.target_link_address.octets());
        buf[24..28].copy_from_slice(&self.target_ip.octets());

        Ok(Self::LENGTH)
    }

    /// Parse a byte array into an `ArpMessage`. Only IPv4-over-Ethernet
    /// messages are accepted.
    pub fn parse(buf: &[u8]) -> Result<Self, WireError> {
        if buf.len() < Self::LENGTH {
            return Err(WireError::BufferTooSmall { expected: Self::LENGTH, found: buf.len() });
        }

        let htype = u16::from_be_bytes([buf[0], buf[1]]);
        if htype != HTYPE_ETHERNET {
            return Err(WireError::Unsupported { field: "ARP hardware type", value: htype });
        }
        let ptype = u16::from_be_bytes([buf[2], buf[3]]);
        if ptype != PTYPE_IPV4 {
            return Err(WireError::Unsupported { field: "ARP protocol type", value: ptype });
        }
        if buf[4] != HLEN_ETHERNET || buf[5] != PLEN_IPV4 {
            return Err(WireError::Unsupported {
                field: "ARP address lengths",
                value: u16::from_be_bytes([buf[4], buf[5]]),
            });
        }
        let opcode = ArpOpcode::from_value(u16::from_be_bytes([buf[6], buf[7]]))?;

        let mut sender_link = [0u8; 6];
        sender_link.copy_from_slice(&buf[8..14]);
        let mut target_link = [0u8; 6];
        target_link.copy_from_slice(&buf[18..24]);

        Ok(ArpMessage {
            opcode,
            sender_link_address: EthernetAddress(sender_link),
            sender_ip: Ipv4Addr::new(buf[14], buf[15], buf[16], buf[17]),
            target_link_address: EthernetAddress(target_link),
            target_ip: Ipv4Addr::new(buf[24], buf[25], buf[26], buf[27]),
        })
    }
}

// -- Unit tests --
