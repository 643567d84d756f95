use thiserror::Error;

#[derive(Debug, PartialEq, Error)]
pub enum WireError {
    #[error("Buffer too small: expected at least {expected} bytes, actual {found} bytes")]
    BufferTooSmall { expected: usize, found: usize },

    #[error("Bad {0} checksum")]
    BadChecksum(&'static str),

    #[error("Unsupported {field}: {value:#06x}")]
    Unsupported { field: &'static str, value: u16 },
}
