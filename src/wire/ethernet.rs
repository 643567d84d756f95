use crate::wire::errors::WireError;
use std::fmt;

/// A 6-byte link-layer (hardware) address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EthernetAddress(pub [u8; 6]);

impl EthernetAddress {
    pub const BROADCAST: EthernetAddress = EthernetAddress([0xff; 6]);

    pub fn octets(&self) -> [u8; 6] {
        self.0
    }

    pub fn is_broadcast(&self) -> bool {
        *self == Self::BROADCAST
    }
}

impl fmt::Display for EthernetAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

/// Payload type carried in an Ethernet frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EtherType {
    Ipv4,
    Arp,
}

impl EtherType {
    pub fn value(self) -> u16 {
        match self {
            EtherType::Ipv4 => 0x0800,
            EtherType::Arp => 0x0806,
        }
    }

    pub fn from_value(value: u16) -> Result<Self, WireError> {
        match value {
            0x0800 => Ok(EtherType::Ipv4),
            0x0806 => Ok(EtherType::Arp),
            other => Err(WireError::Unsupported { field: "ethertype", value: other }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EthernetHeader {
    pub dst: EthernetAddress,
    pub src: EthernetAddress,
    pub ethertype: EtherType,
}

impl EthernetHeader {
    pub const LENGTH: usize = 14;

    /// Serialize an `EthernetHeader` into a byte array of size 14.
    pub fn serialize(&self, buf: &mut [u8]) -> Result<usize, WireError> {
        if buf.len() < Self::LENGTH {
            return Err(WireError::BufferTooSmall { expected: Self::LENGTH, found: buf.len() });
        }

        buf[0..6].copy_from_slice(&self.dst.octets());
        buf[6..12].copy_from_slice(&self.src.octets());
        buf[12..14].copy_from_slice(&self.ethertype.value().to_be_bytes());

        Ok(Self::LENGTH)
    }

    /// Parse a byte array into an `EthernetHeader`.
    pub fn parse(buf: &[u8]) -> Result<Self, WireError> {
        if buf.len() < Self::LENGTH {
            return Err(WireError::BufferTooSmall { expected: Self::LENGTH, found: buf.len() });
        }

        let mut dst = [0u8; 6];
        dst.copy_from_slice(&buf[0..6]);
        let mut src = [0u8; 6];
        src.copy_from_slice(&buf[6..12]);
        let ethertype = EtherType::from_value(u16::from_be_bytes([buf[12], buf[13]]))?;

        Ok(EthernetHeader {
            dst: EthernetAddress(dst),
            src: EthernetAddress(src),
            ethertype,
        })
    }
}

/// A link-layer frame: header plus opaque upper-layer payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EthernetFrame {
    pub header: EthernetHeader,
    pub payload: Vec<u8>,
}

impl EthernetFrame {
    pub fn parse(buf: &[u8]) -> Result<Self, WireError> {
        let header = EthernetHeader::parse(buf)?;
        Ok(EthernetFrame {
            header,
            payload: buf[EthernetHeader::LENGTH..].to_vec(),
        })
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = vec![0u8; EthernetHeader::LENGTH + self.payload.len()];
        self.header
            .serialize(&mut buf)
            .expect("frame buffer sized for header");
        buf[EthernetHeader::LENGTH..].copy_from_slice(&self.payload);
        buf
    }
}

// -- Unit tests --
