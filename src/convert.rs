//! Bulk element type conversion.
//!
//! Buffers hold host-order elements. Conversions between numeric types never
//! fail: values outside the destination range are clamped and counted. Char
//! data converts only to char.

use byteorder::{ByteOrder, NativeEndian};
use nep_model::NcType;

use crate::error::{AdapterError, Result};

/// A converted buffer and the number of elements that did not fit.
#[derive(Debug, Clone, PartialEq)]
pub struct Conversion {
    pub bytes: Vec<u8>,
    pub range_errors: usize,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Scalar {
    Int(i128),
    Float(f64),
}

/// Convert `src`, a buffer of `from` elements, into `to` elements.
pub fn convert(src: &[u8], from: NcType, to: NcType) -> Result<Conversion> {
    if from == to {
        return Ok(Conversion {
            bytes: src.to_vec(),
            range_errors: 0,
        });
    }
    if from.is_char() || to.is_char() {
        return Err(AdapterError::invalid(format!(
            "cannot convert {} data to {}",
            from, to
        )));
    }
    if src.len() % from.size() != 0 {
        return Err(AdapterError::invalid(format!(
            "buffer of {} bytes does not hold whole {} elements",
            src.len(),
            from
        )));
    }

    let count = src.len() / from.size();
    let mut bytes = vec![0u8; count * to.size()];
    let mut range_errors = 0;
    for (input, output) in src
        .chunks_exact(from.size())
        .zip(bytes.chunks_exact_mut(to.size()))
    {
        if !encode(decode(input, from), to, output) {
            range_errors += 1;
        }
    }

    if range_errors > 0 {
        log::debug!(
            "Converted {} {} values to {} with {} out of range",
            count,
            from,
            to,
            range_errors
        );
    }
    Ok(Conversion {
        bytes,
        range_errors,
    })
}

fn decode(bytes: &[u8], t: NcType) -> Scalar {
    match t {
        NcType::Byte => Scalar::Int(i128::from(bytes[0] as i8)),
        NcType::UByte | NcType::Char => Scalar::Int(i128::from(bytes[0])),
        NcType::Short => Scalar::Int(i128::from(NativeEndian::read_i16(bytes))),
        NcType::UShort => Scalar::Int(i128::from(NativeEndian::read_u16(bytes))),
        NcType::Int => Scalar::Int(i128::from(NativeEndian::read_i32(bytes))),
        NcType::UInt => Scalar::Int(i128::from(NativeEndian::read_u32(bytes))),
        NcType::Int64 => Scalar::Int(i128::from(NativeEndian::read_i64(bytes))),
        NcType::UInt64 => Scalar::Int(i128::from(NativeEndian::read_u64(bytes))),
        NcType::Float => Scalar::Float(f64::from(NativeEndian::read_f32(bytes))),
        NcType::Double => Scalar::Float(NativeEndian::read_f64(bytes)),
    }
}

fn int_bounds(t: NcType) -> (i128, i128) {
    match t {
        NcType::Byte => (i128::from(i8::MIN), i128::from(i8::MAX)),
        NcType::UByte | NcType::Char => (0, i128::from(u8::MAX)),
        NcType::Short => (i128::from(i16::MIN), i128::from(i16::MAX)),
        NcType::UShort => (0, i128::from(u16::MAX)),
        NcType::Int => (i128::from(i32::MIN), i128::from(i32::MAX)),
        NcType::UInt => (0, i128::from(u32::MAX)),
        NcType::Int64 => (i128::from(i64::MIN), i128::from(i64::MAX)),
        NcType::UInt64 => (0, i128::from(u64::MAX)),
        NcType::Float | NcType::Double => (i128::MIN, i128::MAX),
    }
}

/// Write `value` as a `to` element. Returns false when it had to be clamped.
fn encode(value: Scalar, to: NcType, out: &mut [u8]) -> bool {
    match to {
        NcType::Float => {
            let v = match value {
                Scalar::Int(i) => i as f64,
                Scalar::Float(f) => f,
            };
            let fits = !v.is_finite() || v.abs() <= f64::from(f32::MAX);
            let v = if fits {
                v as f32
            } else {
                f32::MAX.copysign(v as f32)
            };
            NativeEndian::write_f32(out, v);
            fits
        }
        NcType::Double => {
            let v = match value {
                Scalar::Int(i) => i as f64,
                Scalar::Float(f) => f,
            };
            NativeEndian::write_f64(out, v);
            true
        }
        _ => {
            let (min, max) = int_bounds(to);
            let (raw, mut fits) = match value {
                Scalar::Int(i) => (i, true),
                Scalar::Float(f) if f.is_nan() => (0, false),
                // Saturating cast; anything beyond the target is caught below.
                Scalar::Float(f) => (f.trunc() as i128, true),
            };
            if raw < min || raw > max {
                fits = false;
            }
            let v = raw.clamp(min, max);
            write_int(v, to, out);
            fits
        }
    }
}

fn write_int(v: i128, to: NcType, out: &mut [u8]) {
    // `v` is already clamped to the range of `to`.
    match to {
        NcType::Byte => out[0] = v as i8 as u8,
        NcType::UByte | NcType::Char => out[0] = v as u8,
        NcType::Short => NativeEndian::write_i16(out, v as i16),
        NcType::UShort => NativeEndian::write_u16(out, v as u16),
        NcType::Int => NativeEndian::write_i32(out, v as i32),
        NcType::UInt => NativeEndian::write_u32(out, v as u32),
        NcType::Int64 => NativeEndian::write_i64(out, v as i64),
        NcType::UInt64 => NativeEndian::write_u64(out, v as u64),
        NcType::Float | NcType::Double => {}
    }
}
