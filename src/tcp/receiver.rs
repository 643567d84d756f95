use crate::stream::byte_stream::Reader;
use crate::stream::reassembler::Reassembler;
use crate::tcp::messages::{TcpReceiverMessage, TcpSenderMessage};
use crate::tcp::wrap32::Wrap32;

/// The receiving side of a TCP connection.
///
/// Consumes peer segments, drives the reassembler, and reports the ackno
/// and window back to the peer's sender.
#[derive(Debug)]
pub struct TcpReceiver {
    zero_point: Option<Wrap32>, // Initial seq number, learned from SYN
    finished: bool,
    reassembler: Reassembler,
}

impl TcpReceiver {
    pub fn new(reassembler: Reassembler) -> Self {
        TcpReceiver {
            zero_point: None,
            finished: false,
            reassembler,
        }
    }

    /// Process one segment from the peer.
    pub fn receive(&mut self, message: TcpSenderMessage) {
        if message.rst() {
            self.reassembler.reader().set_error();
            return;
        }

        if message.syn() {
            // A well-behaved peer repeats the same ISN, so re-latching is harmless.
            self.finished = false;
            self.zero_point = Some(message.seqno);
        }
        let Some(zero_point) = self.zero_point else {
            // No zero point to interpret the seqno against
            return;
        };

        let seqno = if message.syn() { message.seqno + 1 } else { message.seqno };
        let absolute_seqno = seqno.unwrap(zero_point, self.first_unassembled_asn());
        if absolute_seqno == 0 {
            // Would claim the SYN's own sequence number
            return;
        }

        self.reassembler.insert(absolute_seqno - 1, &message.payload, message.fin());

        if self.reassembler.output().is_closed() {
            self.finished = true;
        }
    }

    /// The acknowledgment message to send to the peer. Pure.
    pub fn send(&self) -> TcpReceiverMessage {
        // SYN occupies one sequence number, and FIN one more once the
        // stream has fully closed.
        let ackno = self
            .zero_point
            .map(|zero_point| Wrap32::wrap(self.first_unassembled_asn() + self.finished as u64, zero_point));

        TcpReceiverMessage {
            ackno,
            window_size: self.reassembler.output().available_capacity().min(u16::MAX as usize) as u16,
            rst: self.reassembler.output().has_error(),
        }
    }

    pub fn reassembler(&self) -> &Reassembler {
        &self.reassembler
    }

    /// The reading half of the assembled stream
    pub fn reader(&mut self) -> Reader<'_> {
        self.reassembler.reader()
    }

    fn first_unassembled_asn(&self) -> u64 {
        // +1 for the SYN
        self.reassembler.output().bytes_pushed() + 1
    }
}

// -- Unit tests --
