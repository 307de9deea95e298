use horm_codec::config::{CodecConfig, max_frame_size, set_max_frame_size};
use horm_codec::constants::DEFAULT_MAX_FRAME_SIZE;
use horm_codec::frame::{FrameEncodeError, ProtocolType};

// Single test: the frame size ceiling is process-wide.
#[test]
fn test_max_frame_size_applies_to_all_frame_kinds() {
    assert_eq!(max_frame_size(), DEFAULT_MAX_FRAME_SIZE);

    let config = CodecConfig {
        max_frame_size: 64,
        version: 1,
        protocol_type: ProtocolType::Http,
    };
    config.apply();
    assert_eq!(max_frame_size(), 64);

    let mut plain = config.frame_head();
    assert!(plain.construct(b"h", &[0u8; 53]).is_ok());
    assert_eq!(
        plain.construct(b"h", &[0u8; 54]),
        Err(FrameEncodeError::FrameTooLarge {
            total_len: 65,
            max_frame_size: 64
        })
    );

    let mut signed = config.sign_frame_head();
    assert_eq!(signed.protocol_type, ProtocolType::Http as u8);
    assert!(signed.construct(1, b"secret", &[0u8; 21]).is_ok());
    assert!(matches!(
        signed.construct(1, b"secret", &[0u8; 22]),
        Err(FrameEncodeError::FrameTooLarge { total_len: 65, .. })
    ));

    // 16 bytes pad to 32, base64 of 32 bytes is 44: 11 + 44 = 55.
    let mut encrypted = config.encrypt_frame_head();
    assert!(encrypted.construct(1, b"0123456789abcdef", &[0u8; 16]).is_ok());
    // 32 bytes pad to 48, base64 of 48 bytes is 64: 11 + 64 = 75.
    assert!(matches!(
        encrypted.construct(1, b"0123456789abcdef", &[0u8; 32]),
        Err(FrameEncodeError::FrameTooLarge { total_len: 75, .. })
    ));

    set_max_frame_size(DEFAULT_MAX_FRAME_SIZE);
    assert_eq!(CodecConfig::default().max_frame_size, DEFAULT_MAX_FRAME_SIZE);
}
