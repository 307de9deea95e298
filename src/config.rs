//! Process-scoped codec settings.
//!
//! `MaxFrameSize` is shared by every frame kind and can be tuned once at
//! startup. Frame construction reads it on every call, so a change applies to
//! frames built afterwards.

use crate::constants::{DEFAULT_MAX_FRAME_SIZE, PROTOCOL_VERSION};
use crate::frame::{EncryptFrameHead, FrameHead, ProtocolType, SignFrameHead};
use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicUsize, Ordering};

static MAX_FRAME_SIZE: Lazy<AtomicUsize> = Lazy::new(|| AtomicUsize::new(DEFAULT_MAX_FRAME_SIZE));

/// Returns the current ceiling on `total_len` for all frame kinds.
#[inline]
pub fn max_frame_size() -> usize {
    MAX_FRAME_SIZE.load(Ordering::Relaxed)
}

/// Replaces the process-wide frame size ceiling.
pub fn set_max_frame_size(size: usize) {
    let previous = MAX_FRAME_SIZE.swap(size, Ordering::Relaxed);
    tracing::debug!(previous, size, "max frame size updated");
}

/// Per-endpoint defaults used to build frame heads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CodecConfig {
    pub max_frame_size: usize,
    pub version: u8,
    pub protocol_type: ProtocolType,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_frame_size: max_frame_size(),
            version: PROTOCOL_VERSION,
            protocol_type: ProtocolType::Rpc,
        }
    }
}

impl CodecConfig {
    /// Installs `max_frame_size` as the process-wide ceiling.
    pub fn apply(&self) {
        set_max_frame_size(self.max_frame_size);
    }

    pub fn frame_head(&self) -> FrameHead {
        FrameHead {
            version: self.version,
            ..FrameHead::new()
        }
    }

    pub fn sign_frame_head(&self) -> SignFrameHead {
        SignFrameHead {
            version: self.version,
            protocol_type: self.protocol_type as u8,
            ..SignFrameHead::new()
        }
    }

    pub fn encrypt_frame_head(&self) -> EncryptFrameHead {
        EncryptFrameHead {
            version: self.version,
            protocol_type: self.protocol_type as u8,
            ..EncryptFrameHead::new()
        }
    }
}
