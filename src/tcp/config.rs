use crate::tcp::wrap32::Wrap32;

/// Most payload bytes a segment may carry (1500 MTU minus headers and room
/// for options).
pub const MAX_PAYLOAD_SIZE: usize = 1452;

/// Default capacity of the inbound and outbound byte streams.
pub const DEFAULT_CAPACITY: usize = 64_000;

/// Default initial retransmission timeout in milliseconds.
pub const TIMEOUT_DEFAULT_MS: u64 = 1000;

/// Tunables for one TCP connection endpoint.
#[derive(Debug, Clone)]
pub struct TcpConfig {
    pub recv_capacity: usize,
    pub send_capacity: usize,
    pub max_payload_size: usize,
    pub rt_timeout_ms: u64,
    /// Fixed ISN for deterministic tests; a random one is drawn when unset.
    pub fixed_isn: Option<Wrap32>,
}

impl Default for TcpConfig {
    fn default() -> Self {
        TcpConfig {
            recv_capacity: DEFAULT_CAPACITY,
            send_capacity: DEFAULT_CAPACITY,
            max_payload_size: MAX_PAYLOAD_SIZE,
            rt_timeout_ms: TIMEOUT_DEFAULT_MS,
            fixed_isn: None,
        }
    }
}

impl TcpConfig {
    pub fn isn(&self) -> Wrap32 {
        self.fixed_isn.unwrap_or_else(|| Wrap32::new(rand::random()))
    }
}

// -- Unit tests --
