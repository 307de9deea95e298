use crate::constants::{
    FRAME_TYPE_OFFSET, FRAME_TYPE_SIGNATURE, FRAME_VERSION_OFFSET, PROTOCOL_TYPE_RPC,
    SECURE_PROTOCOL_TYPE_OFFSET, SECURE_TOTAL_LEN_OFFSET, SECURE_WORKSPACE_ID_OFFSET, SIGN_LEN,
    SIGN_OFFSET, SIGN_FRAME_HEAD_LEN, SIGN_VERSION,
};
use crate::frame::{
    FrameDecodeError, ProtocolType, FrameEncodeError, checked_total_len, ensure_len, read_u32_be, sign_digest,
};
use subtle::ConstantTimeEq;

/// Head of a signed frame.
///
/// ```text
/// 0          1        2              3..7        7..11          11..43     43..
/// frame_type version  protocol_type  total_len   workspace_id   sign(hex)  body
/// ```
///
/// There is no separate header segment. `sign` is the hex encoded
/// `md5(token || body)`; the token itself is never written to the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignFrameHead {
    pub frame_type: u8,
    pub version: u8,
    pub protocol_type: u8,
    pub total_len: u32,
    pub workspace_id: u32,
    pub sign: [u8; SIGN_LEN],
}

impl Default for SignFrameHead {
    fn default() -> Self {
        Self::new()
    }
}

impl SignFrameHead {
    pub fn new() -> Self {
        Self {
            frame_type: FRAME_TYPE_SIGNATURE,
            version: SIGN_VERSION,
            protocol_type: PROTOCOL_TYPE_RPC,
            total_len: 0,
            workspace_id: 0,
            sign: [0u8; SIGN_LEN],
        }
    }

    /// Parses the fixed 43 byte head at the start of `buf`.
    ///
    /// # Arguments
    /// * `buf` - A signed frame, or at least its first 43 bytes.
    ///
    /// # Returns
    /// * `Ok(SignFrameHead)` with every field as read from the wire. The
    ///   signature is not checked; see [`SignFrameHead::verify`].
    /// * `Err(FrameDecodeError::IncompleteHead)` if `buf` is shorter than the head.
    pub fn extract(buf: &[u8]) -> Result<Self, FrameDecodeError> {
        ensure_len(buf, SIGN_FRAME_HEAD_LEN)?;

        let mut sign = [0u8; SIGN_LEN];
        sign.copy_from_slice(&buf[SIGN_OFFSET..SIGN_FRAME_HEAD_LEN]);

        Ok(Self {
            frame_type: buf[FRAME_TYPE_OFFSET],
            version: buf[FRAME_VERSION_OFFSET],
            protocol_type: buf[SECURE_PROTOCOL_TYPE_OFFSET],
            total_len: read_u32_be(buf, SECURE_TOTAL_LEN_OFFSET),
            workspace_id: read_u32_be(buf, SECURE_WORKSPACE_ID_OFFSET),
            sign,
        })
    }

    /// Builds a signed frame for `body`.
    ///
    /// Updates `workspace_id`, `total_len` and `sign` of `self` to the values
    /// written.
    ///
    /// # Arguments
    /// * `workspace_id` - Tenant the frame belongs to.
    /// * `token` - Shared secret mixed into the signature. Any length.
    /// * `body` - Payload, written as is.
    ///
    /// # Returns
    /// * `Ok(Vec<u8>)` holding `43 + body.len()` bytes.
    /// * `Err(FrameEncodeError::FrameTooLarge)` if the frame exceeds the
    ///   configured max frame size.
    pub fn construct(
        &mut self,
        workspace_id: u32,
        token: &[u8],
        body: &[u8],
    ) -> Result<Vec<u8>, FrameEncodeError> {
        let total_len = checked_total_len(SIGN_FRAME_HEAD_LEN as u64 + body.len() as u64)?;

        self.workspace_id = workspace_id;
        self.total_len = total_len;
        self.sign = sign_digest(token, body);

        let mut buf = Vec::with_capacity(total_len as usize);
        buf.push(self.frame_type);
        buf.push(self.version);
        buf.push(self.protocol_type);
        buf.extend_from_slice(&total_len.to_be_bytes());
        buf.extend_from_slice(&workspace_id.to_be_bytes());
        buf.extend_from_slice(&self.sign);
        buf.extend_from_slice(body);

        tracing::trace!(workspace_id, total_len, "constructed signed frame");

        Ok(buf)
    }

    /// Application protocol of the frame.
    pub fn protocol(&self) -> Result<ProtocolType, FrameDecodeError> {
        ProtocolType::try_from(self.protocol_type)
    }

    /// Recomputes the signature for `body` and compares it in constant time.
    pub fn verify(&self, token: &[u8], body: &[u8]) -> bool {
        let expected = sign_digest(token, body);
        let ok: bool = self.sign[..].ct_eq(&expected[..]).into();
        if !ok {
            tracing::warn!(workspace_id = self.workspace_id, "frame signature mismatch");
        }
        ok
    }

    /// Returns the body of a frame parsed with this head.
    pub fn body<'a>(&self, frame: &'a [u8]) -> Option<&'a [u8]> {
        frame.get(SIGN_FRAME_HEAD_LEN..self.total_len as usize)
    }
}
