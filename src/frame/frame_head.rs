use crate::constants::{
    FRAME_HEAD_LEN, FRAME_HEADER_LEN_OFFSET, FRAME_RESERVED_OFFSET, FRAME_TOTAL_LEN_OFFSET,
    FRAME_TYPE_NORMAL, FRAME_TYPE_OFFSET, FRAME_VERSION_OFFSET, PROTOCOL_VERSION,
};
use crate::frame::{
    FrameDecodeError, FrameEncodeError, checked_total_len, ensure_len, read_u16_be, read_u32_be,
};

/// Head of a plain (normal) frame.
///
/// Wire layout, big-endian:
///
/// ```text
/// 0          1         2..4         4..8        8..10      10..
/// frame_type version   header_len   total_len   reserved   header | body
/// ```
///
/// `total_len` always equals `10 + header_len + body.len()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHead {
    pub frame_type: u8,
    pub version: u8,
    pub header_len: u16,
    pub total_len: u32,
    pub reserved: u16,
}

impl Default for FrameHead {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameHead {
    pub fn new() -> Self {
        Self {
            frame_type: FRAME_TYPE_NORMAL,
            version: PROTOCOL_VERSION,
            header_len: 0,
            total_len: 0,
            reserved: 0,
        }
    }

    /// Parses the fixed 10 byte head at the start of `buf`.
    ///
    /// `buf` is expected to be one already length-delimited frame; only the
    /// head bytes are inspected.
    ///
    /// # Arguments
    /// * `buf` - A frame, or at least its first 10 bytes.
    ///
    /// # Returns
    /// * `Ok(FrameHead)` with every field as read from the wire.
    /// * `Err(FrameDecodeError::IncompleteHead)` if `buf` is shorter than the head.
    pub fn extract(buf: &[u8]) -> Result<Self, FrameDecodeError> {
        ensure_len(buf, FRAME_HEAD_LEN)?;

        Ok(Self {
            frame_type: buf[FRAME_TYPE_OFFSET],
            version: buf[FRAME_VERSION_OFFSET],
            header_len: read_u16_be(buf, FRAME_HEADER_LEN_OFFSET),
            total_len: read_u32_be(buf, FRAME_TOTAL_LEN_OFFSET),
            reserved: read_u16_be(buf, FRAME_RESERVED_OFFSET),
        })
    }

    /// Builds the whole frame: head, then `header`, then `body`.
    ///
    /// On success `header_len` and `total_len` of `self` are updated to the
    /// values written. Nothing is allocated when validation fails.
    ///
    /// # Arguments
    /// * `header` - Protocol header segment, at most 65535 bytes.
    /// * `body` - Payload written after the header.
    ///
    /// # Returns
    /// * `Ok(Vec<u8>)` holding `10 + header.len() + body.len()` bytes.
    /// * `Err(FrameEncodeError::HeadLenOverflow)` if `header` exceeds 65535 bytes.
    /// * `Err(FrameEncodeError::FrameTooLarge)` if the frame exceeds the
    ///   configured max frame size.
    pub fn construct(&mut self, header: &[u8], body: &[u8]) -> Result<Vec<u8>, FrameEncodeError> {
        let header_len = u16::try_from(header.len()).map_err(|_| {
            FrameEncodeError::HeadLenOverflow {
                header_len: header.len(),
            }
        })?;

        let total_len = checked_total_len(
            FRAME_HEAD_LEN as u64 + u64::from(header_len) + body.len() as u64,
        )?;

        self.header_len = header_len;
        self.total_len = total_len;

        let mut buf = Vec::with_capacity(total_len as usize);
        buf.push(self.frame_type);
        buf.push(self.version);
        buf.extend_from_slice(&header_len.to_be_bytes());
        buf.extend_from_slice(&total_len.to_be_bytes());
        buf.extend_from_slice(&self.reserved.to_be_bytes());
        buf.extend_from_slice(header);
        buf.extend_from_slice(body);

        tracing::trace!(header_len, total_len, "constructed plain frame");

        Ok(buf)
    }

    /// Returns the header segment of a frame parsed with this head.
    pub fn header<'a>(&self, frame: &'a [u8]) -> Option<&'a [u8]> {
        frame.get(FRAME_HEAD_LEN..FRAME_HEAD_LEN + self.header_len as usize)
    }

    /// Returns the body of a frame parsed with this head.
    pub fn body<'a>(&self, frame: &'a [u8]) -> Option<&'a [u8]> {
        frame.get(FRAME_HEAD_LEN + self.header_len as usize..self.total_len as usize)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn head_is_written_big_endian() {
        let mut head = FrameHead {
            reserved: 0x0102,
            ..FrameHead::new()
        };
        let buf = head.construct(b"H", b"BODY").expect("construct failed");

        assert_eq!(
            &buf[..FRAME_HEAD_LEN],
            &[0, 1, 0x00, 0x01, 0x00, 0x00, 0x00, 0x0F, 0x01, 0x02]
        );
        assert_eq!(&buf[FRAME_HEAD_LEN..], b"HBODY");
    }

    #[test]
    fn extract_rejects_short_buffer() {
        let err = FrameHead::extract(&[0u8; 9]).unwrap_err();
        assert_eq!(
            err,
            FrameDecodeError::IncompleteHead {
                expected: 10,
                actual: 9
            }
        );
    }
}
