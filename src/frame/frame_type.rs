use crate::constants::{
    FRAME_TYPE_ENCRYPT, FRAME_TYPE_NORMAL, FRAME_TYPE_SIGNATURE, PROTOCOL_TYPE_HTTP,
    PROTOCOL_TYPE_RPC,
};
use crate::frame::FrameDecodeError;
use std::convert::TryFrom;

/// Kind of a frame, carried in its first byte.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameType {
    /// Unsigned, unencrypted. Meant for private networks.
    Normal = FRAME_TYPE_NORMAL,
    /// Integrity via `md5(token + body)`, e.g. traffic through a bastion host.
    Signature = FRAME_TYPE_SIGNATURE,
    /// AES-CBC encrypted body for untrusted client devices.
    Encrypt = FRAME_TYPE_ENCRYPT,
}

impl TryFrom<u8> for FrameType {
    type Error = FrameDecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            FRAME_TYPE_NORMAL => Ok(FrameType::Normal),
            FRAME_TYPE_SIGNATURE => Ok(FrameType::Signature),
            FRAME_TYPE_ENCRYPT => Ok(FrameType::Encrypt),
            other => Err(FrameDecodeError::UnknownFrameType(other)),
        }
    }
}

/// Application protocol wrapped by a signed or encrypted frame.
#[repr(u8)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProtocolType {
    #[default]
    Rpc = PROTOCOL_TYPE_RPC,
    Http = PROTOCOL_TYPE_HTTP,
}

impl TryFrom<u8> for ProtocolType {
    type Error = FrameDecodeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            PROTOCOL_TYPE_RPC => Ok(ProtocolType::Rpc),
            PROTOCOL_TYPE_HTTP => Ok(ProtocolType::Http),
            other => Err(FrameDecodeError::UnknownProtocolType(other)),
        }
    }
}
