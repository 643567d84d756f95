use std::collections::VecDeque;

/// An in-order byte stream with bounded capacity.
///
/// The stream is mutated through two capability views over the same buffer:
/// a [`Writer`] (push, close) and a [`Reader`] (peek, pop). Read-only
/// accessors live on the stream itself so either side can be inspected
/// without taking a view.
#[derive(Debug)]
pub struct ByteStream {
    buffer: VecDeque<u8>,
    capacity: usize,
    bytes_pushed: u64,
    bytes_popped: u64,
    closed: bool,
    error: bool,
}

impl ByteStream {
    /// New `ByteStream` with capacity `N`
    pub fn new(capacity: usize) -> Self {
        ByteStream {
            buffer: VecDeque::with_capacity(capacity),
            capacity,
            bytes_pushed: 0,
            bytes_popped: 0,
            closed: false, // It's always the producer's job to close the byte stream, never the consumer
            error: false,
        }
    }

    /// The writing half of the stream
    pub fn writer(&mut self) -> Writer<'_> {
        Writer { stream: self }
    }

    /// The reading half of the stream
    pub fn reader(&mut self) -> Reader<'_> {
        Reader { stream: self }
    }

    /// The remaining capacity in the byte stream
    pub fn available_capacity(&self) -> usize {
        self.capacity - self.buffer.len()
    }

    /// The number of bytes not consumed yet
    pub fn bytes_buffered(&self) -> usize {
        self.buffer.len()
    }

    /// The total number of bytes ever pushed
    pub fn bytes_pushed(&self) -> u64 {
        self.bytes_pushed
    }

    /// The total number of bytes ever popped
    pub fn bytes_popped(&self) -> u64 {
        self.bytes_popped
    }

    /// Has the writing half been closed?
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Closed and fully drained?
    pub fn is_finished(&self) -> bool {
        self.closed && self.buffer.is_empty()
    }

    /// The sticky error flag
    pub fn has_error(&self) -> bool {
        self.error
    }
}

/// Push capability over a [`ByteStream`].
#[derive(Debug)]
pub struct Writer<'a> {
    stream: &'a mut ByteStream,
}

impl Writer<'_> {
    /// Append as much of `data` as capacity allows and return the appended
    /// count. The tail beyond capacity is silently dropped. No-op on a
    /// closed or errored stream.
    pub fn push(&mut self, data: &[u8]) -> usize {
        if self.stream.closed || self.stream.error {
            return 0;
        }

        let to_push = data.len().min(self.stream.available_capacity());
        self.stream.buffer.extend(&data[..to_push]);

        if self.stream.bytes_pushed <= u64::MAX - to_push as u64 {
            self.stream.bytes_pushed += to_push as u64;
        } else {
            self.stream.bytes_pushed = u64::MAX;
            self.stream.error = true;
        }
        to_push
    }

    /// Mark end of input. Idempotent.
    pub fn close(&mut self) {
        self.stream.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.stream.closed
    }

    pub fn available_capacity(&self) -> usize {
        self.stream.available_capacity()
    }

    pub fn bytes_pushed(&self) -> u64 {
        self.stream.bytes_pushed
    }

    pub fn has_error(&self) -> bool {
        self.stream.error
    }

    pub fn set_error(&mut self) {
        self.stream.error = true;
    }
}

/// Pop capability over a [`ByteStream`].
#[derive(Debug)]
pub struct Reader<'a> {
    stream: &'a mut ByteStream,
}

impl Reader<'_> {
    /// Borrow all buffered bytes, in order, as at most two slices.
    /// The second slice is empty unless the ring buffer has wrapped.
    pub fn peek(&self) -> (&[u8], &[u8]) {
        self.stream.buffer.as_slices()
    }

    /// Remove up to `len` bytes from the front. No-op on a finished or
    /// errored stream.
    pub fn pop(&mut self, len: usize) {
        if self.stream.is_finished() || self.stream.error {
            return;
        }

        let to_pop = len.min(self.stream.buffer.len());
        self.stream.buffer.drain(..to_pop);

        if self.stream.bytes_popped <= u64::MAX - to_pop as u64 {
            self.stream.bytes_popped += to_pop as u64;
        } else {
            self.stream.bytes_popped = u64::MAX;
            self.stream.error = true;
        }
    }

    pub fn is_finished(&self) -> bool {
        self.stream.is_finished()
    }

    pub fn bytes_buffered(&self) -> usize {
        self.stream.buffer.len()
    }

    pub fn bytes_popped(&self) -> u64 {
        self.stream.bytes_popped
    }

    pub fn has_error(&self) -> bool {
        self.stream.error
    }

    pub fn set_error(&mut self) {
        self.stream.error = true;
    }
}

// -- Unit tests --

#[cfg(test)]
mod tests {
    use super::ByteStream;

    fn generate_data(size: usize) -> Vec<u8> {
        (0..size as u8).collect()
    }

    #[test]
    fn test_construction() {
        let bs = ByteStream::new(100);
        assert_eq!(bs.available_capacity(), 100);
        assert_eq!(bs.bytes_buffered(), 0);
        assert_eq!(bs.bytes_pushed(), 0);
        assert_eq!(bs.bytes_popped(), 0);
        assert!(!bs.is_closed());
        assert!(!bs.is_finished());
        assert!(!bs.has_error());
    }

    #[test]
    fn test_available_capacity() {
        let mut bs = ByteStream::new(10);
        assert_eq!(bs.available_capacity(), 10);

        let data = generate_data(4);
        bs.writer().push(&data);
        assert_eq!(bs.available_capacity(), 6);

        let data = generate_data(6);
        bs.writer().push(&data);
        assert_eq!(bs.available_capacity(), 0);

        assert_eq!(bs.bytes_buffered(), 10);
    }

    #[test]
    fn test_single_push_and_pop() {
        let mut bs = ByteStream::new(20);
        let data = b"hello world";
        let n_pushed = bs.writer().push(data);
        assert_eq!(n_pushed, data.len());
        assert_eq!(bs.bytes_pushed(), data.len() as u64);
        assert_eq!(bs.bytes_buffered(), data.len());

        let (front, back) = {
            let reader = bs.reader();
            let (f, b) = reader.peek();
            (f.to_vec(), b.to_vec())
        };
        assert_eq!(front, data);
        assert!(back.is_empty());

        bs.reader().pop(data.len());
        assert_eq!(bs.bytes_popped(), data.len() as u64);
        assert_eq!(bs.bytes_buffered(), 0);
    }

    #[test]
    fn test_many_pushes_and_pops() {
        let mut bs = ByteStream::new(1024);
        let chunk_size = 64;
        let num_chunks = 10u64;

        for i in 1..num_chunks {
            let data = generate_data(chunk_size);
            let n_pushed = bs.writer().push(&data);
            assert_eq!(n_pushed, chunk_size);
            assert_eq!(bs.bytes_pushed(), i * chunk_size as u64);
        }

        for i in 1..num_chunks {
            bs.reader().pop(chunk_size);
            assert_eq!(bs.bytes_popped(), i * chunk_size as u64);
        }

        assert_eq!(bs.bytes_buffered(), 0);
    }

    #[test]
    fn test_push_over_capacity() {
        let capacity = 20;
        let mut bs = ByteStream::new(capacity);
        let data = generate_data(50);
        let n_pushed = bs.writer().push(&data);
        assert_eq!(n_pushed, capacity);
        assert_eq!(bs.bytes_pushed(), capacity as u64);
        assert_eq!(bs.bytes_buffered(), capacity);

        // Push again to overflow
        let n_pushed = bs.writer().push(&data);
        assert_eq!(n_pushed, 0);
    }

    #[test]
    fn test_pop_more_than_buffered() {
        let mut bs = ByteStream::new(20);
        let data = b"hello world";
        bs.writer().push(data);

        bs.reader().pop(5);
        assert_eq!(bs.bytes_popped(), 5);
        assert_eq!(bs.bytes_buffered(), 6);

        bs.reader().pop(99); // Request more than available
        assert_eq!(bs.bytes_popped(), 11);
        assert_eq!(bs.bytes_buffered(), 0);
    }

    #[test]
    fn test_peek_after_wraparound() {
        let mut bs = ByteStream::new(8);
        bs.writer().push(b"abcdef");
        bs.reader().pop(4);
        bs.writer().push(b"ghijkl");

        // All buffered bytes must be addressable in order across the two slices
        let reader = bs.reader();
        let (front, back) = reader.peek();
        let mut all = front.to_vec();
        all.extend_from_slice(back);
        assert_eq!(all, b"efghijkl");
    }

    #[test]
    fn test_close() {
        let mut bs = ByteStream::new(20);
        bs.writer().close();
        assert!(bs.is_closed());

        // Pushing after closing is a no-op
        let n_pushed = bs.writer().push(b"hello world");
        assert_eq!(n_pushed, 0);
        assert_eq!(bs.bytes_pushed(), 0);

        // close() is idempotent
        bs.writer().close();
        assert!(bs.is_closed());
    }

    #[test]
    fn test_finished() {
        let mut bs = ByteStream::new(20);
        assert!(!bs.is_finished());

        let data = b"hello world";
        bs.writer().push(data);
        bs.reader().pop(data.len());
        assert!(!bs.is_finished());

        bs.writer().close();
        assert!(bs.is_finished());
    }

    #[test]
    fn test_error_is_sticky_and_fatal() {
        let mut bs = ByteStream::new(20);
        bs.writer().push(b"abc");
        bs.reader().set_error();
        assert!(bs.has_error());

        // Errored stream refuses pushes and pops
        assert_eq!(bs.writer().push(b"def"), 0);
        bs.reader().pop(1);
        assert_eq!(bs.bytes_popped(), 0);
        assert_eq!(bs.bytes_buffered(), 3);

        // The error does not finish the stream
        assert!(!bs.is_finished());
    }

    #[test]
    fn test_error_visible_from_both_halves() {
        let mut bs = ByteStream::new(4);
        bs.writer().set_error();
        assert!(bs.reader().has_error());
        assert!(bs.writer().has_error());
    }
}
