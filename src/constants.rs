// Frame type codes (first byte of every frame)
pub const FRAME_TYPE_NORMAL: u8 = 0;
pub const FRAME_TYPE_SIGNATURE: u8 = 1;
pub const FRAME_TYPE_ENCRYPT: u8 = 2;

// Protocol type codes carried by signed and encrypted heads
pub const PROTOCOL_TYPE_RPC: u8 = 1;
pub const PROTOCOL_TYPE_HTTP: u8 = 2;

/// Protocol version written by all three head kinds.
pub const PROTOCOL_VERSION: u8 = 1;
pub const SIGN_VERSION: u8 = 1;
pub const ENCRYPT_VERSION: u8 = 1;

/// Default ceiling on `total_len` for every frame kind (10 MiB).
pub const DEFAULT_MAX_FRAME_SIZE: usize = 10 * 1024 * 1024;

/// Byte offset of the 1-byte frame type. Shared by all head kinds so a
/// reader can dispatch before choosing a head parser.
pub const FRAME_TYPE_OFFSET: usize = 0;
pub const FRAME_VERSION_OFFSET: usize = 1;

// Plain frame head layout
pub const FRAME_HEADER_LEN_OFFSET: usize = 2;
pub const FRAME_TOTAL_LEN_OFFSET: usize = 4;
pub const FRAME_RESERVED_OFFSET: usize = 8;
/// Total size of the plain frame head. Header bytes start right after it.
pub const FRAME_HEAD_LEN: usize = 10;

// Signed and encrypted heads share their first 11 bytes
pub const SECURE_PROTOCOL_TYPE_OFFSET: usize = 2;
pub const SECURE_TOTAL_LEN_OFFSET: usize = 3;
pub const SECURE_WORKSPACE_ID_OFFSET: usize = 7;

/// Byte offset where the 32-byte hex signature begins.
pub const SIGN_OFFSET: usize = 11;
/// Length of the hex encoded MD5 digest.
pub const SIGN_LEN: usize = 32;
/// Total size of the signed frame head. The body follows the signature.
pub const SIGN_FRAME_HEAD_LEN: usize = SIGN_OFFSET + SIGN_LEN; // 11 + 32 = 43

/// Total size of the encrypted frame head. The base64 ciphertext follows.
pub const ENCRYPT_FRAME_HEAD_LEN: usize = 11;

/// AES block size, also the number of token bytes used as the CBC IV.
pub const AES_BLOCK_SIZE: usize = 16;

/// Largest value `Msg::next_seq` returns before wrapping back to 1.
pub const MAX_LOG_SEQ: u32 = 999_999_999;
