use crate::constants::{
    ENCRYPT_FRAME_HEAD_LEN, ENCRYPT_VERSION, FRAME_TYPE_ENCRYPT, FRAME_TYPE_OFFSET,
    FRAME_VERSION_OFFSET, PROTOCOL_TYPE_RPC, SECURE_PROTOCOL_TYPE_OFFSET, SECURE_TOTAL_LEN_OFFSET,
    SECURE_WORKSPACE_ID_OFFSET,
};
use crate::frame::{
    CryptoError, FrameDecodeError, ProtocolType, FrameEncodeError, aes_decrypt, aes_encrypt, checked_total_len, ensure_len,
    read_u32_be,
};

/// Head of an encrypted frame.
///
/// ```text
/// 0          1        2              3..7        7..11          11..
/// frame_type version  protocol_type  total_len   workspace_id   base64(aes_cbc(body))
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EncryptFrameHead {
    pub frame_type: u8,
    pub version: u8,
    pub protocol_type: u8,
    pub total_len: u32,
    pub workspace_id: u32,
}

impl Default for EncryptFrameHead {
    fn default() -> Self {
        Self::new()
    }
}

impl EncryptFrameHead {
    pub fn new() -> Self {
        Self {
            frame_type: FRAME_TYPE_ENCRYPT,
            version: ENCRYPT_VERSION,
            protocol_type: PROTOCOL_TYPE_RPC,
            total_len: 0,
            workspace_id: 0,
        }
    }

    /// Parses the fixed 11 byte head at the start of `buf`.
    ///
    /// # Arguments
    /// * `buf` - An encrypted frame, or at least its first 11 bytes.
    ///
    /// # Returns
    /// * `Ok(EncryptFrameHead)` with every field as read from the wire.
    /// * `Err(FrameDecodeError::IncompleteHead)` if `buf` is shorter than the head.
    pub fn extract(buf: &[u8]) -> Result<Self, FrameDecodeError> {
        ensure_len(buf, ENCRYPT_FRAME_HEAD_LEN)?;

        Ok(Self {
            frame_type: buf[FRAME_TYPE_OFFSET],
            version: buf[FRAME_VERSION_OFFSET],
            protocol_type: buf[SECURE_PROTOCOL_TYPE_OFFSET],
            total_len: read_u32_be(buf, SECURE_TOTAL_LEN_OFFSET),
            workspace_id: read_u32_be(buf, SECURE_WORKSPACE_ID_OFFSET),
        })
    }

    /// Encrypts `body` with `token` and builds the frame around the base64
    /// ciphertext.
    ///
    /// # Arguments
    /// * `workspace_id` - Tenant the frame belongs to.
    /// * `token` - AES key of 16, 24 or 32 bytes. Its first 16 bytes are the IV.
    /// * `body` - Plaintext payload.
    ///
    /// # Returns
    /// * `Ok(Vec<u8>)` holding the 11 byte head and the base64 ciphertext.
    /// * `Err(FrameEncodeError::Crypto)` if `token` is not a valid AES key.
    /// * `Err(FrameEncodeError::FrameTooLarge)` if the encoded frame exceeds
    ///   the configured max frame size.
    pub fn construct(
        &mut self,
        workspace_id: u32,
        token: &[u8],
        body: &[u8],
    ) -> Result<Vec<u8>, FrameEncodeError> {
        let encrypted = aes_encrypt(body, token).inspect_err(|err| {
            tracing::warn!(workspace_id, %err, "frame body encryption failed");
        })?;

        let total_len = checked_total_len(ENCRYPT_FRAME_HEAD_LEN as u64 + encrypted.len() as u64)?;

        self.workspace_id = workspace_id;
        self.total_len = total_len;

        let mut buf = Vec::with_capacity(total_len as usize);
        buf.push(self.frame_type);
        buf.push(self.version);
        buf.push(self.protocol_type);
        buf.extend_from_slice(&total_len.to_be_bytes());
        buf.extend_from_slice(&workspace_id.to_be_bytes());
        buf.extend_from_slice(&encrypted);

        tracing::trace!(workspace_id, total_len, "constructed encrypted frame");

        Ok(buf)
    }

    /// Application protocol of the frame.
    pub fn protocol(&self) -> Result<ProtocolType, FrameDecodeError> {
        ProtocolType::try_from(self.protocol_type)
    }

    /// Decrypts the payload of a frame parsed with this head.
    /// A frame shorter than `total_len` decrypts as an empty ciphertext and
    /// fails with [`CryptoError::Padding`].
    pub fn decrypt_body(&self, frame: &[u8], token: &[u8]) -> Result<Vec<u8>, CryptoError> {
        let encoded = frame
            .get(ENCRYPT_FRAME_HEAD_LEN..self.total_len as usize)
            .unwrap_or_default();
        aes_decrypt(encoded, token)
    }
}
