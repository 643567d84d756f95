//! A user-space TCP/IP protocol engine.
//!
//! The pieces stack bottom-up: [`stream::ByteStream`] buffers an in-order
//! byte stream, [`stream::Reassembler`] turns out-of-order substrings into
//! one, [`tcp`] holds the sender and receiver state machines, [`link`]
//! resolves next hops over ARP and frames datagrams onto the wire, and
//! [`router`] forwards between interfaces by longest-prefix match.
//!
//! Everything is single-threaded and tick-driven: the caller owns the
//! clock and the I/O loop, and no method blocks.

pub mod link;
pub mod router;
pub mod stream;
pub mod tcp;
pub mod wire;
