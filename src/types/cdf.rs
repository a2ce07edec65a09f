use nep_model::NcType;

use super::TypeMapping;
use crate::error::{AdapterError, Result};

pub const CDF_INT1: i64 = 1;
pub const CDF_INT2: i64 = 2;
pub const CDF_INT4: i64 = 4;
pub const CDF_INT8: i64 = 8;
pub const CDF_UINT1: i64 = 11;
pub const CDF_UINT2: i64 = 12;
pub const CDF_UINT4: i64 = 14;
pub const CDF_REAL4: i64 = 21;
pub const CDF_REAL8: i64 = 22;
pub const CDF_EPOCH: i64 = 31;
pub const CDF_EPOCH16: i64 = 32;
pub const CDF_TIME_TT2000: i64 = 33;
pub const CDF_BYTE: i64 = 41;
pub const CDF_FLOAT: i64 = 44;
pub const CDF_DOUBLE: i64 = 45;
pub const CDF_CHAR: i64 = 51;
pub const CDF_UCHAR: i64 = 52;

/// Every data type tag the CDF library defines.
pub const CDF_TYPES: [i64; 17] = [
    CDF_INT1,
    CDF_INT2,
    CDF_INT4,
    CDF_INT8,
    CDF_UINT1,
    CDF_UINT2,
    CDF_UINT4,
    CDF_REAL4,
    CDF_REAL8,
    CDF_EPOCH,
    CDF_EPOCH16,
    CDF_TIME_TT2000,
    CDF_BYTE,
    CDF_FLOAT,
    CDF_DOUBLE,
    CDF_CHAR,
    CDF_UCHAR,
];

/// Map a CDF data type tag.
///
/// EPOCH values are milliseconds held in a double and TT2000 values are
/// nanoseconds held in an int64, so both map onto their storage type.
/// EPOCH16 is a pair of doubles and has no single-element equivalent.
pub fn map_cdf_type(tag: i64) -> Result<TypeMapping> {
    let mapping = match tag {
        CDF_INT1 => TypeMapping::new(NcType::Byte, 1, "CDF_INT1"),
        CDF_INT2 => TypeMapping::new(NcType::Short, 2, "CDF_INT2"),
        CDF_INT4 => TypeMapping::new(NcType::Int, 4, "CDF_INT4"),
        CDF_INT8 => TypeMapping::new(NcType::Int64, 8, "CDF_INT8"),
        CDF_UINT1 => TypeMapping::new(NcType::UByte, 1, "CDF_UINT1"),
        CDF_UINT2 => TypeMapping::new(NcType::UShort, 2, "CDF_UINT2"),
        CDF_UINT4 => TypeMapping::new(NcType::UInt, 4, "CDF_UINT4"),
        CDF_REAL4 => TypeMapping::new(NcType::Float, 4, "CDF_REAL4"),
        CDF_REAL8 => TypeMapping::new(NcType::Double, 8, "CDF_REAL8"),
        CDF_EPOCH => TypeMapping::new(NcType::Double, 8, "CDF_EPOCH"),
        CDF_TIME_TT2000 => TypeMapping::new(NcType::Int64, 8, "CDF_TIME_TT2000"),
        CDF_BYTE => TypeMapping::new(NcType::Byte, 1, "CDF_BYTE"),
        CDF_FLOAT => TypeMapping::new(NcType::Float, 4, "CDF_FLOAT"),
        CDF_DOUBLE => TypeMapping::new(NcType::Double, 8, "CDF_DOUBLE"),
        CDF_CHAR => TypeMapping::new(NcType::Char, 1, "CDF_CHAR"),
        CDF_UCHAR => TypeMapping::new(NcType::Char, 1, "CDF_UCHAR"),
        CDF_EPOCH16 => {
            return Err(AdapterError::UnsupportedType {
                format: "CDF",
                tag: "CDF_EPOCH16".to_string(),
            });
        }
        other => {
            return Err(AdapterError::UnsupportedType {
                format: "CDF",
                tag: other.to_string(),
            });
        }
    };
    Ok(mapping)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_tag_resolves_or_fails_explicitly() {
        for tag in CDF_TYPES {
            match map_cdf_type(tag) {
                Ok(m) => assert_eq!(m.size, m.nc_type.size(), "{}", m.name),
                Err(e) => {
                    assert_eq!(tag, CDF_EPOCH16);
                    assert!(matches!(e, AdapterError::UnsupportedType { .. }));
                }
            }
        }
    }

    #[test]
    fn test_time_types() {
        assert_eq!(map_cdf_type(CDF_EPOCH).unwrap().nc_type, NcType::Double);
        assert_eq!(
            map_cdf_type(CDF_TIME_TT2000).unwrap().nc_type,
            NcType::Int64
        );
        assert_eq!(map_cdf_type(CDF_UCHAR).unwrap().nc_type, NcType::Char);
    }

    #[test]
    fn test_unknown_tags() {
        for tag in [0, 3, 13, 23, 50, 53, -1] {
            assert!(matches!(
                map_cdf_type(tag),
                Err(AdapterError::UnsupportedType { .. })
            ));
        }
    }
}
