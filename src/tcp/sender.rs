use crate::stream::byte_stream::{ByteStream, Writer};
use crate::tcp::config::MAX_PAYLOAD_SIZE;
use crate::tcp::messages::{TcpFlags, TcpReceiverMessage, TcpSenderMessage};
use crate::tcp::retransmitter::Retransmitter;
use crate::tcp::wrap32::Wrap32;

/// The sending side of a TCP connection.
///
/// Reads from its outbound byte stream and produces segments that fit the
/// peer's advertised window, handing every segment that occupies sequence
/// numbers to the embedded [`Retransmitter`].
#[derive(Debug)]
pub struct TcpSender {
    input: ByteStream,
    isn: Wrap32,
    max_payload_size: usize,
    syn_sent: bool,
    fin_sent: bool,
    latest_receiver_message: Option<TcpReceiverMessage>,
    retransmitter: Retransmitter,
}

impl TcpSender {
    pub fn new(input: ByteStream, isn: Wrap32, initial_rto_ms: u64) -> Self {
        TcpSender {
            input,
            isn,
            max_payload_size: MAX_PAYLOAD_SIZE,
            syn_sent: false,
            fin_sent: false,
            latest_receiver_message: None,
            retransmitter: Retransmitter::new(initial_rto_ms),
        }
    }

    /// Emit as many segments as the stream and the peer's window allow.
    pub fn push<F>(&mut self, mut transmit: F)
    where
        F: FnMut(&TcpSenderMessage),
    {
        if !self.syn_sent {
            let message = self.build_segment(true);
            self.send(&mut transmit, message);
            self.syn_sent = true;
        }

        loop {
            if self.fin_sent || self.acceptable_length() == 0 {
                break;
            }

            let message = self.build_segment(false);
            if !message.rst() && message.sequence_length() == 0 {
                break;
            }
            let rst = message.rst();
            self.send(&mut transmit, message);
            if rst {
                break;
            }
        }
    }

    /// A segment that consumes no sequence numbers, for pure acks and RST.
    pub fn make_empty_message(&self) -> TcpSenderMessage {
        let mut flags = TcpFlags::empty();
        if self.input.has_error() {
            flags |= TcpFlags::RST;
        }
        TcpSenderMessage {
            seqno: Wrap32::wrap(self.first_unsent(), self.isn),
            flags,
            payload: Vec::new(),
        }
    }

    /// Process an acknowledgment from the peer's receiver.
    pub fn receive(&mut self, message: TcpReceiverMessage) {
        if message.rst {
            self.input.reader().set_error();
            return;
        }

        let old_first_acceptable = self.first_acceptable(self.latest_receiver_message.as_ref());
        let new_first_acceptable = self.first_acceptable(Some(&message));

        // Reject acks that regress or claim data we never sent.
        if new_first_acceptable < old_first_acceptable || self.first_unsent() < new_first_acceptable {
            return;
        }

        self.latest_receiver_message = Some(message);

        if new_first_acceptable == old_first_acceptable {
            return;
        }
        self.retransmitter.on_ack(self.isn, old_first_acceptable, new_first_acceptable);
    }

    /// `ms_since_last_tick` milliseconds have passed since the last call.
    pub fn tick<F>(&mut self, ms_since_last_tick: u64, mut transmit: F)
    where
        F: FnMut(&TcpSenderMessage),
    {
        let window_size = self.window_size();
        self.retransmitter.tick(ms_since_last_tick, &mut transmit, window_size);
    }

    /// Test accessor: outstanding sequence numbers.
    pub fn sequence_numbers_in_flight(&self) -> u64 {
        self.retransmitter.sequence_numbers_in_flight()
    }

    /// Test accessor: consecutive retransmission count.
    pub fn consecutive_retransmissions(&self) -> u64 {
        self.retransmitter.consecutive_retransmissions()
    }

    /// The writing half of the outbound stream
    pub fn writer(&mut self) -> Writer<'_> {
        self.input.writer()
    }

    /// The outbound stream itself, for inspection
    pub fn stream(&self) -> &ByteStream {
        &self.input
    }

    fn send<F>(&mut self, transmit: &mut F, message: TcpSenderMessage)
    where
        F: FnMut(&TcpSenderMessage),
    {
        transmit(&message);
        if message.fin() {
            self.fin_sent = true;
        }
        if message.sequence_length() > 0 {
            self.retransmitter.record_sent(message);
        }
    }

    fn build_segment(&mut self, syn: bool) -> TcpSenderMessage {
        let seqno = Wrap32::wrap(self.first_unsent(), self.isn);
        let acceptable_length = self.acceptable_length();
        let payload_limit = acceptable_length
            .saturating_sub(syn as u64)
            .min(self.max_payload_size as u64) as usize;

        let mut reader = self.input.reader();
        let (front, back) = reader.peek();
        let take = payload_limit.min(front.len() + back.len());
        let from_front = take.min(front.len());
        let mut payload = Vec::with_capacity(take);
        payload.extend_from_slice(&front[..from_front]);
        payload.extend_from_slice(&back[..take - from_front]);
        reader.pop(take);

        let mut flags = TcpFlags::empty();
        if syn {
            flags |= TcpFlags::SYN;
        }
        // FIN rides along only if the window still has a sequence number for it.
        if reader.is_finished() && (syn as u64 + payload.len() as u64) < acceptable_length {
            flags |= TcpFlags::FIN;
        }
        if reader.has_error() {
            flags |= TcpFlags::RST;
        }

        TcpSenderMessage { seqno, flags, payload }
    }

    // SYN and FIN each consume one sequence number.
    fn first_unsent(&self) -> u64 {
        self.syn_sent as u64 + self.input.bytes_popped() + self.fin_sent as u64
    }

    fn first_acceptable(&self, message: Option<&TcpReceiverMessage>) -> u64 {
        match message.and_then(|m| m.ackno) {
            Some(ackno) => ackno.unwrap(self.isn, self.first_unsent()),
            None => 0,
        }
    }

    fn window_size(&self) -> u64 {
        // Before any receiver message arrives, probe blindly with a window of one.
        self.latest_receiver_message.as_ref().map_or(1, |m| m.window_size as u64)
    }

    fn acceptable_length(&self) -> u64 {
        // max(window, 1) grants one sequence number of zero-window probing.
        (self.first_acceptable(self.latest_receiver_message.as_ref()) + self.window_size().max(1))
            .saturating_sub(self.first_unsent())
    }
}

// -- Unit tests --
