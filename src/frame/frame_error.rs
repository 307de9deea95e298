use thiserror::Error;

/// Failures while building an outbound frame.
///
/// All of these are deterministic for a given input, so callers should fail
/// the single request rather than retry.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameEncodeError {
    /// The header segment of a plain frame does not fit the 16-bit length field.
    #[error("head len overflows uint16: {header_len}")]
    HeadLenOverflow { header_len: usize },

    /// The frame length does not fit the 32-bit `total_len` field.
    #[error("total len overflows uint32: {total_len}")]
    TotalLenOverflow { total_len: u64 },

    #[error("length of frame {total_len} is larger than max frame size {max_frame_size}")]
    FrameTooLarge { total_len: u64, max_frame_size: usize },

    #[error(transparent)]
    Crypto(#[from] CryptoError),
}

/// Failures inside the AES-CBC transform of the encrypted frame.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// AES accepts 16, 24 or 32 byte keys only.
    #[error("AES encrypt: invalid key length {len}")]
    InvalidKeyLength { len: usize },

    #[error("AES decrypt: bad PKCS7 padding")]
    Padding,

    #[error("AES decrypt: ciphertext is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FrameDecodeError {
    /// The buffer is shorter than the fixed head of its frame kind.
    #[error("incomplete frame head: need {expected} bytes, got {actual}")]
    IncompleteHead { expected: usize, actual: usize },

    #[error("unknown frame type {0}")]
    UnknownFrameType(u8),

    /// Protocol byte of a signed or encrypted head.
    #[error("unknown protocol type {0}")]
    UnknownProtocolType(u8),
}
