mod any_frame_head;
mod encrypt_frame_head;
mod frame_crypto;
mod frame_error;
mod frame_head;
mod frame_type;
mod sign_frame_head;

pub use any_frame_head::{AnyFrameHead, peek_frame_type};
pub use encrypt_frame_head::EncryptFrameHead;
pub use frame_crypto::{aes_decrypt, aes_encrypt, sign_digest};
pub use frame_error::{CryptoError, FrameDecodeError, FrameEncodeError};
pub use frame_head::FrameHead;
pub use frame_type::{FrameType, ProtocolType};
pub use sign_frame_head::SignFrameHead;

use crate::config::max_frame_size;

/// Validates a computed frame length against the configured ceiling and the
/// 32-bit `total_len` field.
pub(crate) fn checked_total_len(total_len: u64) -> Result<u32, FrameEncodeError> {
    let max = max_frame_size();
    if total_len > max as u64 {
        tracing::warn!(total_len, max, "frame rejected: larger than max frame size");
        return Err(FrameEncodeError::FrameTooLarge {
            total_len,
            max_frame_size: max,
        });
    }

    u32::try_from(total_len).map_err(|_| FrameEncodeError::TotalLenOverflow { total_len })
}

pub(crate) fn ensure_len(buf: &[u8], expected: usize) -> Result<(), FrameDecodeError> {
    if buf.len() < expected {
        return Err(FrameDecodeError::IncompleteHead {
            expected,
            actual: buf.len(),
        });
    }
    Ok(())
}

#[inline]
pub(crate) fn read_u16_be(buf: &[u8], offset: usize) -> u16 {
    u16::from_be_bytes([buf[offset], buf[offset + 1]])
}

#[inline]
pub(crate) fn read_u32_be(buf: &[u8], offset: usize) -> u32 {
    u32::from_be_bytes([
        buf[offset],
        buf[offset + 1],
        buf[offset + 2],
        buf[offset + 3],
    ])
}
