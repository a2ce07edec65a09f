use nep_model::NcType;

use super::TypeMapping;
use crate::constants::{SAMPLE_FORMAT_IEEEFP, SAMPLE_FORMAT_INT, SAMPLE_FORMAT_UINT};
use crate::error::{AdapterError, Result};

/// Map a TIFF `SampleFormat` and `BitsPerSample` pair.
pub fn map_sample(sample_format: u16, bits_per_sample: u16) -> Result<TypeMapping> {
    let mapping = match (sample_format, bits_per_sample) {
        (SAMPLE_FORMAT_UINT, 8) => TypeMapping::new(NcType::UByte, 1, "uint8"),
        (SAMPLE_FORMAT_UINT, 16) => TypeMapping::new(NcType::UShort, 2, "uint16"),
        (SAMPLE_FORMAT_UINT, 32) => TypeMapping::new(NcType::UInt, 4, "uint32"),
        (SAMPLE_FORMAT_UINT, 64) => TypeMapping::new(NcType::UInt64, 8, "uint64"),
        (SAMPLE_FORMAT_INT, 8) => TypeMapping::new(NcType::Byte, 1, "int8"),
        (SAMPLE_FORMAT_INT, 16) => TypeMapping::new(NcType::Short, 2, "int16"),
        (SAMPLE_FORMAT_INT, 32) => TypeMapping::new(NcType::Int, 4, "int32"),
        (SAMPLE_FORMAT_INT, 64) => TypeMapping::new(NcType::Int64, 8, "int64"),
        (SAMPLE_FORMAT_IEEEFP, 32) => TypeMapping::new(NcType::Float, 4, "float32"),
        (SAMPLE_FORMAT_IEEEFP, 64) => TypeMapping::new(NcType::Double, 8, "float64"),
        _ => {
            return Err(AdapterError::UnsupportedType {
                format: "TIFF",
                tag: format!(
                    "SampleFormat={} BitsPerSample={}",
                    sample_format, bits_per_sample
                ),
            });
        }
    };
    Ok(mapping)
}
