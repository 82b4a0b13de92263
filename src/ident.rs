//! Board and device identifier codec
//!
//! Hardware units are addressed either by a fixed-width numeric code or by a
//! free-form alias (an IP address, a hostname, a device name). Board codes
//! are 4 bytes wide, device codes 2 bytes. A string that parses as
//! hexadecimal within range is a code; anything else is an alias and passes
//! through conversions that accept aliases unchanged.
//!
//! Conversions between the integer, hex-string, and byte-array forms are
//! lossless round-trips. Byte arrays are most-significant byte first.

use crate::errors::{GatewayError, GatewayResult};

/// Width of a board identifier, in bytes
pub const BOARD_ID_WIDTH: usize = 4;

/// Width of a device identifier, in bytes
pub const DEVICE_ID_WIDTH: usize = 2;

/// A parsed board identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BoardId {
    /// Numeric board code, at most 4 bytes wide
    Code(u32),
    /// Opaque alias, e.g. an IP address or hostname
    Alias(String),
}

/// A parsed device identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DeviceId {
    /// Numeric device code, at most 2 bytes wide
    Code(u16),
    /// Opaque alias, e.g. a device name
    Alias(String),
}

impl BoardId {
    /// Parse a board identifier from its string form.
    ///
    /// Valid hex within the 4-byte range parses as a code. Non-hex input is
    /// an alias. Hex input outside the range is an error rather than an
    /// alias, since it was clearly meant to be numeric.
    pub fn parse(input: &str) -> GatewayResult<Self> {
        if !is_hex(input) {
            return Ok(Self::Alias(input.to_string()));
        }
        u32::from_str_radix(input, 16).map(Self::Code).map_err(|_| {
            GatewayError::InvalidIdentifier(format!("board id {} is out of range", input))
        })
    }

    /// Human-readable form: zero-padded hex for codes, the alias itself
    /// otherwise.
    pub fn normalize(&self) -> String {
        match self {
            Self::Code(value) => board_to_hex_string(*value),
            Self::Alias(alias) => alias.clone(),
        }
    }

    /// Fixed-width big-endian byte form. Aliases have no byte form.
    pub fn to_bytes(&self) -> GatewayResult<[u8; BOARD_ID_WIDTH]> {
        match self {
            Self::Code(value) => Ok(value.to_be_bytes()),
            Self::Alias(alias) => Err(GatewayError::InvalidIdentifier(format!(
                "board id {} is an alias and has no byte representation",
                alias
            ))),
        }
    }
}

impl DeviceId {
    /// Parse a device identifier from its string form. Same semantics as
    /// [`BoardId::parse`] at 2-byte width.
    pub fn parse(input: &str) -> GatewayResult<Self> {
        if !is_hex(input) {
            return Ok(Self::Alias(input.to_string()));
        }
        u16::from_str_radix(input, 16).map(Self::Code).map_err(|_| {
            GatewayError::InvalidIdentifier(format!("device id {} is out of range", input))
        })
    }

    /// Human-readable form: zero-padded hex for codes, the alias itself
    /// otherwise.
    pub fn normalize(&self) -> String {
        match self {
            Self::Code(value) => device_to_hex_string(*value),
            Self::Alias(alias) => alias.clone(),
        }
    }

    /// Fixed-width big-endian byte form. Aliases have no byte form.
    pub fn to_bytes(&self) -> GatewayResult<[u8; DEVICE_ID_WIDTH]> {
        match self {
            Self::Code(value) => Ok(value.to_be_bytes()),
            Self::Alias(alias) => Err(GatewayError::InvalidIdentifier(format!(
                "device id {} is an alias and has no byte representation",
                alias
            ))),
        }
    }
}

/// A string is a candidate numeric code only when it is entirely hex digits;
/// anything else, including signs and `0x` prefixes, is an alias
fn is_hex(input: &str) -> bool {
    !input.is_empty() && input.bytes().all(|b| b.is_ascii_hexdigit())
}

/// Normalize a board identifier string for display and logging.
///
/// Hex codes are zero-padded to 8 characters; aliases and out-of-range
/// values are returned unchanged. This never fails, so it is safe to use
/// when building error messages.
pub fn normalize_board_id(input: &str) -> String {
    match BoardId::parse(input) {
        Ok(id) => id.normalize(),
        Err(_) => input.to_string(),
    }
}

/// Normalize a device identifier string for display and logging.
pub fn normalize_device_id(input: &str) -> String {
    match DeviceId::parse(input) {
        Ok(id) => id.normalize(),
        Err(_) => input.to_string(),
    }
}

/// Convert a board code to its zero-padded hex string form (no `0x` prefix)
pub fn board_to_hex_string(value: u32) -> String {
    format!("{:08x}", value)
}

/// Convert a device code to its zero-padded hex string form (no `0x` prefix)
pub fn device_to_hex_string(value: u16) -> String {
    format!("{:04x}", value)
}

/// Join a 4-byte big-endian sequence back into a board code
pub fn board_from_bytes(bytes: &[u8]) -> GatewayResult<u32> {
    let array: [u8; BOARD_ID_WIDTH] = bytes.try_into().map_err(|_| {
        GatewayError::InvalidIdentifier(format!(
            "board id bytes must be exactly {} bytes, got {}",
            BOARD_ID_WIDTH,
            bytes.len()
        ))
    })?;
    Ok(u32::from_be_bytes(array))
}

/// Join a 2-byte big-endian sequence back into a device code
pub fn device_from_bytes(bytes: &[u8]) -> GatewayResult<u16> {
    let array: [u8; DEVICE_ID_WIDTH] = bytes.try_into().map_err(|_| {
        GatewayError::InvalidIdentifier(format!(
            "device id bytes must be exactly {} bytes, got {}",
            DEVICE_ID_WIDTH,
            bytes.len()
        ))
    })?;
    Ok(u16::from_be_bytes(array))
}

/// Validate a (board, device) identifier pair as supplied by route aliases.
///
/// Both parse independently; a range violation on either side fails the
/// whole pair.
pub fn parse_board_device(board: &str, device: &str) -> GatewayResult<(BoardId, DeviceId)> {
    Ok((BoardId::parse(board)?, DeviceId::parse(device)?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_board_round_trip() {
        for value in [0u32, 0xFF, 0xAABBCCDD, u32::MAX] {
            let id = BoardId::Code(value);
            let bytes = id.to_bytes().unwrap();
            assert_eq!(bytes.len(), BOARD_ID_WIDTH);
            assert_eq!(board_from_bytes(&bytes).unwrap(), value);
        }
    }

    #[test]
    fn test_device_round_trip() {
        for value in [0u16, 0xFF, 0xAABB, u16::MAX] {
            let id = DeviceId::Code(value);
            let bytes = id.to_bytes().unwrap();
            assert_eq!(bytes.len(), DEVICE_ID_WIDTH);
            assert_eq!(device_from_bytes(&bytes).unwrap(), value);
        }
    }

    #[test]
    fn test_board_byte_layout_is_big_endian() {
        let bytes = BoardId::Code(0xAABBCCDD).to_bytes().unwrap();
        assert_eq!(bytes, [0xAA, 0xBB, 0xCC, 0xDD]);

        let bytes = BoardId::Code(0xFF).to_bytes().unwrap();
        assert_eq!(bytes, [0x00, 0x00, 0x00, 0xFF]);
    }

    #[test]
    fn test_device_byte_layout_is_big_endian() {
        let bytes = DeviceId::Code(0xAABB).to_bytes().unwrap();
        assert_eq!(bytes, [0xAA, 0xBB]);

        let bytes = DeviceId::Code(0xFF).to_bytes().unwrap();
        assert_eq!(bytes, [0x00, 0xFF]);
    }

    #[test]
    fn test_hex_string_padding() {
        assert_eq!(board_to_hex_string(0xFF), "000000ff");
        assert_eq!(board_to_hex_string(0xAABBCCDD), "aabbccdd");
        assert_eq!(device_to_hex_string(0xFF), "00ff");
        assert_eq!(device_to_hex_string(0xAABB), "aabb");
    }

    #[test]
    fn test_hex_string_round_trip_modulo_padding() {
        let id = BoardId::parse("ff").unwrap();
        assert_eq!(id, BoardId::Code(0xFF));
        assert_eq!(id.normalize(), "000000ff");
        assert_eq!(BoardId::parse(&id.normalize()).unwrap(), id);
    }

    #[test]
    fn test_alias_passes_through() {
        assert_eq!(normalize_board_id("my-host"), "my-host");
        assert_eq!(normalize_device_id("fan-sensor"), "fan-sensor");
        assert_eq!(
            BoardId::parse("my-host").unwrap(),
            BoardId::Alias("my-host".to_string())
        );
    }

    #[test]
    fn test_alias_has_no_byte_form() {
        let err = BoardId::Alias("my-host".to_string()).to_bytes().unwrap_err();
        assert!(matches!(err, GatewayError::InvalidIdentifier(_)));

        let err = DeviceId::Alias("fan".to_string()).to_bytes().unwrap_err();
        assert!(matches!(err, GatewayError::InvalidIdentifier(_)));
    }

    #[test]
    fn test_out_of_range_is_rejected() {
        // hex-parseable but wider than 4 bytes
        let err = BoardId::parse("1ffffffff").unwrap_err();
        assert!(matches!(err, GatewayError::InvalidIdentifier(_)));

        // hex-parseable but wider than 2 bytes
        let err = DeviceId::parse("1ffff").unwrap_err();
        assert!(matches!(err, GatewayError::InvalidIdentifier(_)));

        // arbitrarily long hex is still numeric intent, not an alias
        let long_hex = "f".repeat(40);
        assert!(BoardId::parse(&long_hex).is_err());
        assert!(DeviceId::parse(&long_hex).is_err());
    }

    #[test]
    fn test_wrong_byte_width_is_rejected() {
        assert!(board_from_bytes(&[0xAA, 0xBB]).is_err());
        assert!(board_from_bytes(&[0; 5]).is_err());
        assert!(device_from_bytes(&[0xAA]).is_err());
        assert!(device_from_bytes(&[0; 4]).is_err());
    }

    #[test]
    fn test_parse_board_device_pair() {
        let (board, device) = parse_board_device("aabbccdd", "00ff").unwrap();
        assert_eq!(board, BoardId::Code(0xAABBCCDD));
        assert_eq!(device, DeviceId::Code(0xFF));

        // device may be an alias where the board is numeric
        let (board, device) = parse_board_device("aabbccdd", "fan-1x").unwrap();
        assert_eq!(board, BoardId::Code(0xAABBCCDD));
        assert_eq!(device, DeviceId::Alias("fan-1x".to_string()));

        // either side out of range fails the pair
        assert!(parse_board_device("1ffffffff", "00ff").is_err());
        assert!(parse_board_device("aabbccdd", "1ffff").is_err());
    }
}
