//! Wire codec for the driver's stdin/stdout: packed little-endian f32.
use byteorder::{ByteOrder, LittleEndian};
use enzyme_core::{Direction, EngineError, Result};

pub const F32_BYTES: usize = std::mem::size_of::<f32>();

pub fn encode_f32s(values: &[f32]) -> Vec<u8> {
    let mut bytes = vec![0u8; values.len() * F32_BYTES];
    LittleEndian::write_f32_into(values, &mut bytes);
    bytes
}

/// Decodes exactly `expected` floats; any other byte count is a protocol
/// violation on the driver's output.
pub fn decode_f32s(bytes: &[u8], expected: usize) -> Result<Vec<f32>> {
    let expected_bytes = expected * F32_BYTES;
    if bytes.len() != expected_bytes {
        return Err(EngineError::Protocol {
            direction: Direction::Output,
            expected: expected_bytes,
            actual: bytes.len(),
        });
    }
    let mut values = vec![0f32; expected];
    LittleEndian::read_f32_into(bytes, &mut values);
    Ok(values)
}
