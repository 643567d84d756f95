use crate::wire::checksum::internet_checksum;
use crate::wire::errors::WireError;
use crate::wire::ip_flags::IpFlags;
use std::net::Ipv4Addr;

/// IPv4 header (rfc791), options-free: `ihl` is always 5 here.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ipv4Header {
    pub version: u8,
    pub ihl: u8,
    pub tos: u8,
    pub total_len: u16,
    pub id: u16,
    pub flags: IpFlags,
    pub frag_offset: u16, // 13 bits, packed with the flags
    pub ttl: u8,
    pub protocol: u8,
    pub checksum: u16,
    pub src: Ipv4Addr,
    pub dst: Ipv4Addr,
}

impl Default for Ipv4Header {
    fn default() -> Self {
        Ipv4Header {
            version: 4,
            ihl: 5,
            tos: 0,
            total_len: Self::LENGTH as u16,
            id: 0,
            flags: IpFlags::DF,
            frag_offset: 0,
            ttl: 64,
            protocol: 6,
            checksum: 0,
            src: Ipv4Addr::UNSPECIFIED,
            dst: Ipv4Addr::UNSPECIFIED,
        }
    }
}

impl Ipv4Header {
    pub const LENGTH: usize = 20;

    /// Serialize an `Ipv4Header` into a byte array of size 20, filling in
    /// the checksum field.
    pub fn serialize(&self, buf: &mut [u8]) -> Result<usize, WireError> {
        if buf.len() < Self::LENGTH {
            return Err(WireError::BufferTooSmall { expected: Self::LENGTH, found: buf.len() });
        }

        buf[0] = (self.version << 4) | self.ihl;
        buf[1] = self.tos;
        buf[2..4].copy_from_slice(&self.total_len.to_be_bytes());
        buf[4..6].copy_from_slice(&self.id.to_be_bytes());
        buf[6..8].copy_from_slice(&self.flags.pack(self.frag_offset).to_be_bytes());
        buf[8] = self.ttl;
        buf[9] = self.protocol;
        buf[10..12].fill(0); // Checksum computed over a zeroed field
        buf[12..16].copy_from_slice(&self.src.octets());
        buf[16..20].copy_from_slice(&self.dst.octets());

        let checksum = internet_checksum(&buf[0..Self::LENGTH]);
        buf[10..12].copy_from_slice(&checksum.to_be_bytes());

        Ok(Self::LENGTH)
    }

    /// Parse a byte array into an `Ipv4Header`, verifying the checksum.
    pub fn parse(buf: &[u8]) -> Result<Self, WireError> {
        if buf.len() < Self::LENGTH {
            return Err(WireError::BufferTooSmall { expected: Self::LENGTH, found: buf.len() });
        }

        if internet_checksum(&buf[0..Self::LENGTH]) != 0 {
            return Err(WireError::BadChecksum("IPv4"));
        }

        let (flags, frag_offset) = IpFlags::unpack(u16::from_be_bytes([buf[6], buf[7]]));

        Ok(Ipv4Header {
            version: buf[0] >> 4,
            ihl: buf[0] & 0x0f,
            tos: buf[1],
            total_len: u16::from_be_bytes([buf[2], buf[3]]),
            id: u16::from_be_bytes([buf[4], buf[5]]),
            flags,
            frag_offset,
            ttl: buf[8],
            protocol: buf[9],
            checksum: u16::from_be_bytes([buf[10], buf[11]]),
            src: Ipv4Addr::new(buf[12], buf[13], buf[14], buf[15]),
            dst: Ipv4Addr::new(buf[16], buf[17], buf[18], buf[19]),
        })
    }

    /// Payload bytes following the header, per `total_len`.
    pub fn payload_length(&self) -> usize {
        (self.total_len as usize).saturating_sub(self.ihl as usize * 4)
    }

    /// Recompute and store the header checksum. Required after any field
    /// edit, e.g. the router's TTL decrement.
    pub fn compute_checksum(&mut self) {
        let mut buf = [0u8; Self::LENGTH];
        if self.serialize(&mut buf).is_ok() {
            self.checksum = u16::from_be_bytes([buf[10], buf[11]]);
        }
    }
}

/// An IPv4 datagram: header plus opaque payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ipv4Datagram {
    pub header: Ipv4Header,
    pub payload: Vec<u8>,
}

impl Ipv4Datagram {
    pub fn new(header: Ipv4Header, payload: Vec<u8>) -> Self {
        Ipv4Datagram { header, payload }
    }

    pub fn parse(buf: &[u8]) -> Result<Self, WireError> {
        let header = Ipv4Header::parse(buf)?;

        let payload_end = Ipv4Header::LENGTH + header.payload_length();
        if buf.len() < payload_end {
            return Err(WireError::BufferTooSmall { expected: payload_end, found: buf.len() });
        }

        Ok(Ipv4Datagram {
            header,
            payload: buf[Ipv4Header::LENGTH..payload_end].to_vec(),
        })
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut buf = vec![0u8; Ipv4Header::LENGTH + self.payload.len()];
        self.header
            .serialize(&mut buf)
            .expect("datagram buffer sized for header");
        buf[Ipv4Header::LENGTH..].copy_from_slice(&self.payload);
        buf
    }
}

// -- Unit tests --
