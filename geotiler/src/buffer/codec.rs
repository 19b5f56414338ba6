//! Sample encode/decode for every supported pixel type.
//!
//! Samples are read from and written to raw bytes through `byteorder`,
//! following the buffer's byte order. Two families of accessors exist:
//!
//! - `*_int_value*` carry samples as `i64` (floats are truncated on read)
//! - `*_float_value*` carry samples as `f64` (integers are widened on read)
//!
//! The `_at` variants address a sample by index (byte offset
//! `index * bytes_per_sample`) and leave the position alone; the others read
//! or write at the buffer position and advance it.

use byteorder::{BigEndian, ByteOrder as Endian, LittleEndian};

use super::{ByteBuffer, ByteOrder, PixelType};
use crate::error::{TileError, TileResult};

#[derive(Debug, Clone, Copy)]
enum Sample {
    Int(i64),
    Float(f64),
}

impl Sample {
    fn as_i64(self) -> i64 {
        match self {
            Sample::Int(v) => v,
            Sample::Float(v) => v as i64,
        }
    }

    fn as_f64(self) -> f64 {
        match self {
            Sample::Int(v) => v as f64,
            Sample::Float(v) => v,
        }
    }
}

fn decode(bytes: &[u8], pixel_type: PixelType, order: ByteOrder) -> Sample {
    match order {
        ByteOrder::BigEndian => decode_as::<BigEndian>(bytes, pixel_type),
        ByteOrder::LittleEndian => decode_as::<LittleEndian>(bytes, pixel_type),
    }
}

fn decode_as<E: Endian>(bytes: &[u8], pixel_type: PixelType) -> Sample {
    match pixel_type {
        PixelType::UInt8 => Sample::Int(bytes[0] as i64),
        PixelType::Int16 => Sample::Int(E::read_i16(bytes) as i64),
        PixelType::UInt16 => Sample::Int(E::read_u16(bytes) as i64),
        PixelType::Int32 => Sample::Int(E::read_i32(bytes) as i64),
        PixelType::UInt32 => Sample::Int(E::read_u32(bytes) as i64),
        PixelType::Float32 => Sample::Float(E::read_f32(bytes) as f64),
        PixelType::Float64 => Sample::Float(E::read_f64(bytes)),
    }
}

fn encode(sample: Sample, pixel_type: PixelType, order: ByteOrder, out: &mut [u8]) {
    match order {
        ByteOrder::BigEndian => encode_as::<BigEndian>(sample, pixel_type, out),
        ByteOrder::LittleEndian => encode_as::<LittleEndian>(sample, pixel_type, out),
    }
}

// Integer targets keep the low bits, like a C cast
fn encode_as<E: Endian>(sample: Sample, pixel_type: PixelType, out: &mut [u8]) {
    match pixel_type {
        PixelType::UInt8 => out[0] = sample.as_i64() as u8,
        PixelType::Int16 => E::write_i16(out, sample.as_i64() as i16),
        PixelType::UInt16 => E::write_u16(out, sample.as_i64() as u16),
        PixelType::Int32 => E::write_i32(out, sample.as_i64() as i32),
        PixelType::UInt32 => E::write_u32(out, sample.as_i64() as u32),
        PixelType::Float32 => E::write_f32(out, sample.as_f64() as f32),
        PixelType::Float64 => E::write_f64(out, sample.as_f64()),
    }
}

/// Byte offset of sample `index`, checked against the limit.
fn checked_offset(index: usize, buffer: &ByteBuffer, pixel_type: PixelType) -> TileResult<usize> {
    let width = pixel_type.bytes_per_sample();
    let out_of_bounds = || TileError::IndexOutOfBounds {
        index,
        limit: buffer.limit(),
    };
    let offset = index.checked_mul(width).ok_or_else(out_of_bounds)?;
    match offset.checked_add(width) {
        Some(end) if end <= buffer.limit() => Ok(offset),
        _ => Err(out_of_bounds()),
    }
}

/// Byte offset at the cursor, advancing it by one sample.
fn advance(buffer: &mut ByteBuffer, pixel_type: PixelType) -> TileResult<usize> {
    let width = pixel_type.bytes_per_sample();
    if buffer.remaining() < width {
        return Err(TileError::IndexOutOfBounds {
            index: buffer.position(),
            limit: buffer.limit(),
        });
    }
    let offset = buffer.position();
    buffer.set_position(offset + width);
    Ok(offset)
}

fn read_at(buffer: &ByteBuffer, offset: usize, pixel_type: PixelType) -> Sample {
    let width = pixel_type.bytes_per_sample();
    decode(
        &buffer.as_slice()[offset..offset + width],
        pixel_type,
        buffer.order(),
    )
}

fn write_at(buffer: &mut ByteBuffer, offset: usize, pixel_type: PixelType, sample: Sample) {
    let width = pixel_type.bytes_per_sample();
    let order = buffer.order();
    encode(
        sample,
        pixel_type,
        order,
        &mut buffer.as_mut_slice()[offset..offset + width],
    );
}

/// Read the sample at the position as an integer and advance.
pub fn get_int_value(buffer: &mut ByteBuffer, pixel_type: PixelType) -> TileResult<i64> {
    let offset = advance(buffer, pixel_type)?;
    Ok(read_at(buffer, offset, pixel_type).as_i64())
}

/// Read sample `index` as an integer.
pub fn get_int_value_at(
    index: usize,
    buffer: &ByteBuffer,
    pixel_type: PixelType,
) -> TileResult<i64> {
    let offset = checked_offset(index, buffer, pixel_type)?;
    Ok(read_at(buffer, offset, pixel_type).as_i64())
}

/// Write an integer sample at the position and advance.
pub fn put_int_value(
    buffer: &mut ByteBuffer,
    pixel_type: PixelType,
    value: i64,
) -> TileResult<()> {
    let offset = advance(buffer, pixel_type)?;
    write_at(buffer, offset, pixel_type, Sample::Int(value));
    Ok(())
}

/// Write an integer sample at `index`.
pub fn put_int_value_at(
    index: usize,
    buffer: &mut ByteBuffer,
    pixel_type: PixelType,
    value: i64,
) -> TileResult<()> {
    let offset = checked_offset(index, buffer, pixel_type)?;
    write_at(buffer, offset, pixel_type, Sample::Int(value));
    Ok(())
}

/// Read the sample at the position as a float and advance.
pub fn get_float_value(buffer: &mut ByteBuffer, pixel_type: PixelType) -> TileResult<f64> {
    let offset = advance(buffer, pixel_type)?;
    Ok(read_at(buffer, offset, pixel_type).as_f64())
}

/// Read sample `index` as a float.
pub fn get_float_value_at(
    index: usize,
    buffer: &ByteBuffer,
    pixel_type: PixelType,
) -> TileResult<f64> {
    let offset = checked_offset(index, buffer, pixel_type)?;
    Ok(read_at(buffer, offset, pixel_type).as_f64())
}

/// Write a float sample at the position and advance.
///
/// Integer pixel types receive the value truncated toward zero.
pub fn put_float_value(
    buffer: &mut ByteBuffer,
    pixel_type: PixelType,
    value: f64,
) -> TileResult<()> {
    let offset = advance(buffer, pixel_type)?;
    write_at(buffer, offset, pixel_type, Sample::Float(value));
    Ok(())
}

/// Write a float sample at `index`.
pub fn put_float_value_at(
    index: usize,
    buffer: &mut ByteBuffer,
    pixel_type: PixelType,
    value: f64,
) -> TileResult<()> {
    let offset = checked_offset(index, buffer, pixel_type)?;
    write_at(buffer, offset, pixel_type, Sample::Float(value));
    Ok(())
}
