/// Errors raised by the primitive reader/writer.
///
/// Every primitive call either succeeds or yields one of these; once a call
/// fails the stream position is unspecified and the caller must stop.
#[derive(Debug, thiserror::Error)]
pub enum WireError {
    #[error("unexpected end of input: needed {needed} bytes, {remaining} remaining")]
    EndOfInput { needed: usize, remaining: usize },

    #[error("output buffer full: needed {needed} bytes, {remaining} remaining")]
    BufferFull { needed: usize, remaining: usize },

    #[error("invalid varint")]
    InvalidVarint,

    #[error("int value {0} out of 32-bit range")]
    IntOverflow(i64),

    #[error("invalid boolean byte {0:#04x}")]
    InvalidBool(u8),

    #[error("negative length {0}")]
    NegativeLength(i64),

    #[error("length {len} exceeds allocation limit {limit}")]
    AllocationLimit { len: usize, limit: usize },

    #[error("invalid utf-8 string: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}
