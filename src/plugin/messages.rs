//! Plugin RPC message types
//!
//! Wire types for the plugin `TransactionCheck` RPC. These are encoded and
//! decoded by hand against the protobuf wire format rather than generated at
//! build time, since the service surface is a single unary method.
//!
//! ## gRPC Service Definition
//!
//! ```protobuf
//! service Plugin {
//!     rpc TransactionCheck(TransactionId) returns (WriteResponse);
//! }
//!
//! message TransactionId {
//!     string id = 1;
//! }
//!
//! message WriteResponse {
//!     string created = 1;
//!     string updated = 2;
//!     int32 status = 3;
//!     int32 state = 4;
//!     string message = 5;
//! }
//! ```

/// Request identifying the transaction whose write status is being checked
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionId {
    /// The transaction id assigned when the write was dispatched
    pub id: String,
}

impl TransactionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// Encode to protobuf wire format
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.id.len() + 4);

        // Field 1: id (string) - wire type 2 (length-delimited)
        if !self.id.is_empty() {
            buf.push(0x0a); // field 1, wire type 2
            encode_varint(&mut buf, self.id.len() as u64);
            buf.extend_from_slice(self.id.as_bytes());
        }

        buf
    }
}

/// Write status reported by a plugin for a tracked transaction.
///
/// `status` and `state` are small integer enums owned by the plugin protocol;
/// the command handler maps them to human-readable strings for callers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteResponse {
    /// Timestamp string for when the write was taken up by the plugin
    pub created: String,
    /// Timestamp string for the last status change
    pub updated: String,
    /// Write status code: 0 unknown, 1 pending, 2 writing, 3 done
    pub status: u32,
    /// Write state code: 0 ok, nonzero error
    pub state: u32,
    /// Error message from the plugin, empty when the write is healthy
    pub message: String,
}

impl WriteResponse {
    /// Decode from protobuf wire format
    pub fn decode(buf: &[u8]) -> Result<Self, DecodeError> {
        let mut resp = WriteResponse::default();
        let mut pos = 0;

        while pos < buf.len() {
            let (field_tag, tag_size) = decode_varint(&buf[pos..])?;
            pos += tag_size;

            let field_number = field_tag >> 3;
            let wire_type = field_tag & 0x07;

            match (field_number, wire_type) {
                // Field 1: created (string)
                (1, 2) => {
                    let (value, end) = decode_string(buf, pos)?;
                    resp.created = value;
                    pos = end;
                }
                // Field 2: updated (string)
                (2, 2) => {
                    let (value, end) = decode_string(buf, pos)?;
                    resp.updated = value;
                    pos = end;
                }
                // Field 3: status (varint)
                (3, 0) => {
                    let (value, size) = decode_varint(&buf[pos..])?;
                    pos += size;
                    resp.status = value as u32;
                }
                // Field 4: state (varint)
                (4, 0) => {
                    let (value, size) = decode_varint(&buf[pos..])?;
                    pos += size;
                    resp.state = value as u32;
                }
                // Field 5: message (string)
                (5, 2) => {
                    let (value, end) = decode_string(buf, pos)?;
                    resp.message = value;
                    pos = end;
                }
                // Skip unknown fields
                (_, 0) => {
                    let (_, size) = decode_varint(&buf[pos..])?;
                    pos += size;
                }
                (_, 2) => {
                    let (len, len_size) = decode_varint(&buf[pos..])?;
                    pos += len_size;
                    pos += checked_len(buf, pos, len)?;
                }
                (_, 5) => {
                    pos += checked_len(buf, pos, 4)?;
                }
                (_, 1) => {
                    pos += checked_len(buf, pos, 8)?;
                }
                _ => {
                    return Err(DecodeError::UnknownWireType(wire_type as u8));
                }
            }
        }

        Ok(resp)
    }

    /// Encode to protobuf wire format.
    ///
    /// The gateway only decodes this message; encoding exists for plugin
    /// stubs and tests.
    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(
            self.created.len() + self.updated.len() + self.message.len() + 16,
        );

        if !self.created.is_empty() {
            buf.push(0x0a); // field 1, wire type 2
            encode_varint(&mut buf, self.created.len() as u64);
            buf.extend_from_slice(self.created.as_bytes());
        }
        if !self.updated.is_empty() {
            buf.push(0x12); // field 2, wire type 2
            encode_varint(&mut buf, self.updated.len() as u64);
            buf.extend_from_slice(self.updated.as_bytes());
        }
        if self.status != 0 {
            buf.push(0x18); // field 3, wire type 0
            encode_varint(&mut buf, u64::from(self.status));
        }
        if self.state != 0 {
            buf.push(0x20); // field 4, wire type 0
            encode_varint(&mut buf, u64::from(self.state));
        }
        if !self.message.is_empty() {
            buf.push(0x2a); // field 5, wire type 2
            encode_varint(&mut buf, self.message.len() as u64);
            buf.extend_from_slice(self.message.as_bytes());
        }

        buf
    }
}

/// Protobuf decoding error
#[derive(Debug, Clone, thiserror::Error)]
pub enum DecodeError {
    #[error("Buffer too short")]
    BufferTooShort,
    #[error("Invalid varint")]
    InvalidVarint,
    #[error("Unknown wire type: {0}")]
    UnknownWireType(u8),
    #[error("Invalid utf-8 in string field")]
    InvalidUtf8,
}

/// Validate that `len` bytes fit in `buf` at `pos` and return it as usize.
///
/// `len` comes off the wire and may be anything up to `u64::MAX`; comparing
/// against the remaining buffer before any addition keeps position
/// arithmetic from overflowing.
fn checked_len(buf: &[u8], pos: usize, len: u64) -> Result<usize, DecodeError> {
    match usize::try_from(len) {
        Ok(len) if len <= buf.len() - pos => Ok(len),
        _ => Err(DecodeError::BufferTooShort),
    }
}

/// Decode a length-delimited string field starting at `pos`, returning the
/// string and the position just past it
fn decode_string(buf: &[u8], pos: usize) -> Result<(String, usize), DecodeError> {
    let (len, len_size) = decode_varint(&buf[pos..])?;
    let start = pos + len_size;
    let end = start + checked_len(buf, start, len)?;
    let value =
        String::from_utf8(buf[start..end].to_vec()).map_err(|_| DecodeError::InvalidUtf8)?;
    Ok((value, end))
}

/// Encode a varint to the buffer
fn encode_varint(buf: &mut Vec<u8>, mut value: u64) {
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        buf.push(byte);
        if value == 0 {
            break;
        }
    }
}

/// Decode a varint from the buffer, returning (value, bytes_consumed)
fn decode_varint(buf: &[u8]) -> Result<(u64, usize), DecodeError> {
    let mut value: u64 = 0;
    let mut shift = 0;

    for (i, &byte) in buf.iter().enumerate() {
        value |= ((byte & 0x7F) as u64) << shift;
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
        shift += 7;
        if shift >= 64 {
            return Err(DecodeError::InvalidVarint);
        }
    }

    Err(DecodeError::BufferTooShort)
}
