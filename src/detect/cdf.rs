//! CDF detection: a magic-number check followed by a native header open.

use std::fs::File;
use std::path::Path;

use byteorder::{BigEndian, ByteOrder};

use super::{Detection, HeaderFacts, read_up_to};
use crate::constants::{
    CDF_MAGIC_COMPRESSED, CDF_MAGIC_UNCOMPRESSED, CDF_MAGIC_V25, CDF_MAGIC_V26, CDF_MAGIC_V3,
};
use crate::error::Result;
use crate::native::CdfLibrary;

/// Header generation identified by the first magic word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CdfVersion {
    V3,
    V26,
    V25,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CdfHeader {
    pub version: CdfVersion,
    pub compressed: bool,
}

/// Decode the two big-endian magic words at the start of a CDF file.
pub fn check_magic(bytes: &[u8]) -> Option<CdfHeader> {
    if bytes.len() < 8 {
        return None;
    }
    let version = match BigEndian::read_u32(&bytes[0..4]) {
        CDF_MAGIC_V3 => CdfVersion::V3,
        CDF_MAGIC_V26 => CdfVersion::V26,
        CDF_MAGIC_V25 => CdfVersion::V25,
        _ => return None,
    };
    let compressed = match BigEndian::read_u32(&bytes[4..8]) {
        CDF_MAGIC_UNCOMPRESSED => false,
        CDF_MAGIC_COMPRESSED => true,
        _ => return None,
    };
    Some(CdfHeader {
        version,
        compressed,
    })
}

/// Detect a CDF file. Any failure of the native header open declines the
/// file rather than surfacing an error.
pub fn detect_path(path: &Path, library: &dyn CdfLibrary) -> Result<Detection> {
    let mut file = File::open(path)?;
    let mut magic = [0u8; 8];
    let filled = read_up_to(&mut file, &mut magic)?;
    let Some(header) = check_magic(&magic[..filled]) else {
        return Ok(Detection::NotThisFormat);
    };

    match library.open(path) {
        Ok(mut native) => {
            if let Err(e) = native.close() {
                log::warn!("CDF detect: closing probe handle failed: {}", e);
            }
            log::debug!("CDF detect: {:?} file (compressed: {})", header.version, header.compressed);
            Ok(Detection::Detected(HeaderFacts::Cdf(header)))
        }
        Err(e) => {
            log::debug!("CDF detect: native open declined {:?}: {}", path, e);
            Ok(Detection::NotThisFormat)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_magic_words() {
        let v3 = [0xCD, 0xF3, 0x00, 0x01, 0x00, 0x00, 0xFF, 0xFF];
        assert_eq!(
            check_magic(&v3),
            Some(CdfHeader {
                version: CdfVersion::V3,
                compressed: false
            })
        );
        let v26z = [0xCD, 0xF2, 0x60, 0x02, 0xCC, 0xCC, 0x00, 0x01];
        assert_eq!(
            check_magic(&v26z),
            Some(CdfHeader {
                version: CdfVersion::V26,
                compressed: true
            })
        );
        let v25 = [0x00, 0x00, 0xFF, 0xFF, 0x00, 0x00, 0xFF, 0xFF];
        assert_eq!(check_magic(&v25).map(|h| h.version), Some(CdfVersion::V25));
    }

    #[test]
    fn test_rejects_foreign_and_short() {
        assert_eq!(check_magic(b"II*\x00\x08\x00\x00\x00"), None);
        assert_eq!(check_magic(&[0xCD, 0xF3, 0x00, 0x01]), None);
        assert_eq!(check_magic(&[0xCD, 0xF3, 0x00, 0x01, 1, 2, 3, 4]), None);
        assert_eq!(check_magic(&[]), None);
    }
}
