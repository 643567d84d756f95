use crate::stream::byte_stream::{ByteStream, Reader};
use std::collections::VecDeque;

/// Merges out-of-order, possibly-overlapping substrings back into the
/// original byte stream.
///
/// Pending bytes live in a dense window of `capacity` slots starting at the
/// first unassembled index (the output's `bytes_pushed`). Bytes before the
/// window are already committed; bytes beyond it are discarded for good.
#[derive(Debug)]
pub struct Reassembler {
    output: ByteStream,
    capacity: usize,
    pending: VecDeque<Option<u8>>, // One slot per stream index in the window
    end_index: Option<u64>,        // Index one past the last stream byte, once known
}

impl Reassembler {
    /// New `Reassembler` writing into the given `ByteStream`
    pub fn new(output: ByteStream) -> Self {
        let capacity = output.available_capacity();
        Reassembler {
            output,
            capacity,
            pending: VecDeque::from(vec![None; capacity]),
            end_index: None,
        }
    }

    /// Insert a substring of the stream starting at absolute index
    /// `first_index`. `is_last` marks the substring that ends the stream.
    pub fn insert(&mut self, first_index: u64, data: &[u8], is_last: bool) {
        let first_unassembled = self.output.bytes_pushed();
        let first_unaccepted = first_unassembled + self.output.available_capacity() as u64;

        // Clip `data` to the window; everything outside is dropped.
        let valid_first = first_index.max(first_unassembled);
        let valid_after_final = (first_index + data.len() as u64).min(first_unaccepted);

        let mut index = valid_first;
        while index < valid_after_final {
            self.pending[(index - first_unassembled) as usize] = Some(data[(index - first_index) as usize]);
            index += 1;
        }

        // Commit the maximal contiguous run at the front of the window.
        let mut run = Vec::new();
        for slot in self.pending.iter().take(self.output.available_capacity()) {
            match slot {
                Some(byte) => run.push(*byte),
                None => break,
            }
        }
        if !run.is_empty() {
            self.output.writer().push(&run);
            for _ in 0..run.len() {
                self.pending.pop_front();
                self.pending.push_back(None);
            }
        }

        if is_last {
            self.end_index = Some(first_index + data.len() as u64);
        }
        if self.end_index == Some(self.output.bytes_pushed()) {
            self.output.writer().close();
        }
    }

    /// How many bytes sit in the window awaiting earlier gaps? Test accessor.
    pub fn count_bytes_pending(&self) -> u64 {
        self.pending
            .iter()
            .take(self.output.available_capacity())
            .filter(|slot| slot.is_some())
            .count() as u64
    }

    /// Absolute index of the next byte to be delivered
    pub fn first_unassembled(&self) -> u64 {
        self.output.bytes_pushed()
    }

    /// The assembled output stream
    pub fn output(&self) -> &ByteStream {
        &self.output
    }

    /// The reading half of the output stream
    pub fn reader(&mut self) -> Reader<'_> {
        self.output.reader()
    }
}

// -- Unit tests --
