//! Size codec: the checksum field holds the file's total byte size as an
//! 8-byte integer, base64-encoded into 12 characters.
//!
//! # Byte order
//! The on-disk field does not record endianness.  It is inferred by
//! magnitude: the payload is read little-endian first, and re-read as
//! big-endian when the little-endian reading exceeds [`BYTE_ORDER_CEILING`]
//! (no real naming file is ever that large).  Values straddling the
//! ceiling are inherently ambiguous; see the tests.

use base64::{engine::general_purpose, Engine as _};
use byteorder::{BigEndian, ByteOrder as _, LittleEndian};
use thiserror::Error;

/// Width of the base64 text form: 8 payload bytes encode to 12 characters.
pub const ENCODED_LEN: usize = 12;
/// Raw width of the size integer.
pub const SIZE_WIDTH: usize = 8;
/// Little-endian readings above this are assumed to be byte-swapped.
/// The original tooling used `math.MaxInt32 << 1`; kept verbatim.
pub const BYTE_ORDER_CEILING: i64 = (i32::MAX as i64) << 1;

#[derive(Error, Debug)]
pub enum SizeError {
    #[error("size field is not valid base64: {0}")]
    Base64(#[from] base64::DecodeError),
    #[error("size field decoded to {0} bytes, expected {SIZE_WIDTH}")]
    ShortPayload(usize),
    #[error("zero file size")]
    ZeroSize,
}

/// Endianness of the encoded size integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ByteOrder {
    LittleEndian,
    BigEndian,
}

/// Decodes the raw checksum field into a size, resolving byte order by
/// magnitude.  Trailing padding spaces and line terminators are ignored;
/// length validation is the caller's job.
pub fn decode_size(raw: &[u8]) -> Result<(i64, ByteOrder), SizeError> {
    let payload = general_purpose::STANDARD.decode(trim_field(raw))?;
    if payload.len() < SIZE_WIDTH {
        return Err(SizeError::ShortPayload(payload.len()));
    }
    let size = LittleEndian::read_i64(&payload);
    if size > BYTE_ORDER_CEILING {
        return Ok((BigEndian::read_i64(&payload), ByteOrder::BigEndian));
    }
    Ok((size, ByteOrder::LittleEndian))
}

/// Encodes a size in the given byte order.  Produces exactly
/// [`ENCODED_LEN`] bytes; the caller controls any line padding.
pub fn encode_size(size: i64, order: ByteOrder) -> Result<Vec<u8>, SizeError> {
    if size == 0 {
        return Err(SizeError::ZeroSize);
    }
    let mut payload = [0u8; SIZE_WIDTH];
    match order {
        ByteOrder::LittleEndian => LittleEndian::write_i64(&mut payload, size),
        ByteOrder::BigEndian => BigEndian::write_i64(&mut payload, size),
    }
    Ok(general_purpose::STANDARD.encode(payload).into_bytes())
}

/// Strips the trailing padding the checksum line carries around the
/// base64 literal.
fn trim_field(raw: &[u8]) -> &[u8] {
    let end = raw
        .iter()
        .rposition(|b| !matches!(b, b' ' | b'\r' | b'\n'))
        .map_or(0, |i| i + 1);
    &raw[..end]
}
