use crate::constants::{
    ENCRYPT_FRAME_HEAD_LEN, FRAME_HEAD_LEN, FRAME_TYPE_OFFSET, SIGN_FRAME_HEAD_LEN,
};
use crate::frame::{EncryptFrameHead, FrameDecodeError, FrameHead, FrameType, SignFrameHead};

/// Reads the frame type from the first byte of `buf`.
pub fn peek_frame_type(buf: &[u8]) -> Result<FrameType, FrameDecodeError> {
    let byte = buf
        .get(FRAME_TYPE_OFFSET)
        .copied()
        .ok_or(FrameDecodeError::IncompleteHead {
            expected: FRAME_TYPE_OFFSET + 1,
            actual: buf.len(),
        })?;
    FrameType::try_from(byte)
}

/// A parsed head of any frame kind, selected by the frame type byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnyFrameHead {
    Normal(FrameHead),
    Signature(SignFrameHead),
    Encrypt(EncryptFrameHead),
}

impl AnyFrameHead {
    pub fn extract(buf: &[u8]) -> Result<Self, FrameDecodeError> {
        let head = match peek_frame_type(buf)? {
            FrameType::Normal => AnyFrameHead::Normal(FrameHead::extract(buf)?),
            FrameType::Signature => AnyFrameHead::Signature(SignFrameHead::extract(buf)?),
            FrameType::Encrypt => AnyFrameHead::Encrypt(EncryptFrameHead::extract(buf)?),
        };

        tracing::trace!(
            frame_type = ?head.frame_type(),
            total_len = head.total_len(),
            "extracted frame head"
        );

        Ok(head)
    }

    pub fn frame_type(&self) -> FrameType {
        match self {
            AnyFrameHead::Normal(_) => FrameType::Normal,
            AnyFrameHead::Signature(_) => FrameType::Signature,
            AnyFrameHead::Encrypt(_) => FrameType::Encrypt,
        }
    }

    pub fn total_len(&self) -> u32 {
        match self {
            AnyFrameHead::Normal(h) => h.total_len,
            AnyFrameHead::Signature(h) => h.total_len,
            AnyFrameHead::Encrypt(h) => h.total_len,
        }
    }

    /// Offset of the first byte after the fixed head. For plain frames this is
    /// where the header segment starts.
    pub fn payload_offset(&self) -> usize {
        match self {
            AnyFrameHead::Normal(_) => FRAME_HEAD_LEN,
            AnyFrameHead::Signature(_) => SIGN_FRAME_HEAD_LEN,
            AnyFrameHead::Encrypt(_) => ENCRYPT_FRAME_HEAD_LEN,
        }
    }

    /// Workspace of a signed or encrypted frame. Plain frames carry none.
    pub fn workspace_id(&self) -> Option<u32> {
        match self {
            AnyFrameHead::Normal(_) => None,
            AnyFrameHead::Signature(h) => Some(h.workspace_id),
            AnyFrameHead::Encrypt(h) => Some(h.workspace_id),
        }
    }
}
