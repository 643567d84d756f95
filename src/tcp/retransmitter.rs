use crate::tcp::messages::TcpSenderMessage;
use crate::tcp::wrap32::Wrap32;
use std::collections::VecDeque;

/// Retransmission controller for a TCP sender.
///
/// Tracks segments in flight and a tick-driven timer with exponential
/// backoff. Invariant: the timer is active exactly while segments are
/// outstanding.
#[derive(Debug)]
pub struct Retransmitter {
    unacknowledged: VecDeque<TcpSenderMessage>,
    initial_rto_ms: u64,
    elapsed_ms: u64,
    consecutive_retransmissions: u64,
    timer_active: bool,
}

impl Retransmitter {
    pub fn new(initial_rto_ms: u64) -> Self {
        Retransmitter {
            unacknowledged: VecDeque::new(),
            initial_rto_ms,
            elapsed_ms: 0,
            consecutive_retransmissions: 0,
            timer_active: false,
        }
    }

    /// Track a transmitted segment that occupies sequence numbers.
    pub fn record_sent(&mut self, message: TcpSenderMessage) {
        self.unacknowledged.push_back(message);
        self.timer_active = true;
    }

    /// The peer has acknowledged up to `new_first_acceptable`. Resets the
    /// timer and backoff, and discards segments now fully acknowledged.
    /// `checkpoint` is the previous first-acceptable sequence number.
    pub fn on_ack(&mut self, isn: Wrap32, checkpoint: u64, new_first_acceptable: u64) {
        self.elapsed_ms = 0;
        self.consecutive_retransmissions = 0;

        while let Some(earliest) = self.unacknowledged.front() {
            let after_final = earliest.seqno.unwrap(isn, checkpoint) + earliest.sequence_length();
            if new_first_acceptable < after_final {
                break;
            }
            self.unacknowledged.pop_front();
        }
        if self.unacknowledged.is_empty() {
            self.timer_active = false;
        }
    }

    /// Advance the timer. On expiry, retransmit the earliest outstanding
    /// segment. The backoff count grows only while the peer advertises a
    /// non-zero window, so zero-window probes keep the base timeout.
    pub fn tick<F>(&mut self, ms_since_last_tick: u64, transmit: &mut F, window_size: u64)
    where
        F: FnMut(&TcpSenderMessage),
    {
        if !self.timer_active {
            return;
        }
        self.elapsed_ms += ms_since_last_tick;

        if self.elapsed_ms < self.current_timeout() {
            return;
        }

        if let Some(earliest) = self.unacknowledged.front() {
            transmit(earliest);
        }
        self.elapsed_ms = 0;
        if window_size > 0 {
            self.consecutive_retransmissions += 1;
        }
    }

    /// Test accessor: total sequence numbers outstanding.
    pub fn sequence_numbers_in_flight(&self) -> u64 {
        self.unacknowledged.iter().map(TcpSenderMessage::sequence_length).sum()
    }

    /// Test accessor: consecutive retransmission count.
    pub fn consecutive_retransmissions(&self) -> u64 {
        self.consecutive_retransmissions
    }

    pub fn is_timer_active(&self) -> bool {
        self.timer_active
    }

    fn current_timeout(&self) -> u64 {
        match 1u64.checked_shl(self.consecutive_retransmissions as u32) {
            Some(factor) => self.initial_rto_ms.saturating_mul(factor),
            None => u64::MAX,
        }
    }
}

// -- Unit tests --
