use crate::tcp::wrap32::Wrap32;
use bitflags::bitflags;

bitflags! {
    // Bit positions [ CWR, ECE, URG, ACK, PSH, RST, SYN, FIN ]
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TcpFlags: u8 {
        const CWR = 1 << 7;
        const ECE = 1 << 6;
        const URG = 1 << 5;
        const ACK = 1 << 4;
        const PSH = 1 << 3;
        const RST = 1 << 2;
        const SYN = 1 << 1;
        const FIN = 1 << 0;
    }
}

/// The message a TCP sender emits: a segment's sequence number, flags, and
/// payload. SYN and FIN each occupy one sequence number; payload bytes
/// occupy one each.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TcpSenderMessage {
    pub seqno: Wrap32,
    pub flags: TcpFlags,
    pub payload: Vec<u8>,
}

impl TcpSenderMessage {
    pub fn syn(&self) -> bool {
        self.flags.contains(TcpFlags::SYN)
    }

    pub fn fin(&self) -> bool {
        self.flags.contains(TcpFlags::FIN)
    }

    pub fn rst(&self) -> bool {
        self.flags.contains(TcpFlags::RST)
    }

    /// How many sequence numbers does this segment occupy?
    pub fn sequence_length(&self) -> u64 {
        self.syn() as u64 + self.payload.len() as u64 + self.fin() as u64
    }
}

/// The message a TCP receiver emits back to the peer's sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TcpReceiverMessage {
    pub ackno: Option<Wrap32>,
    pub window_size: u16,
    pub rst: bool,
}

// -- Unit tests --
