//! Byte-level format detection.
//!
//! Detectors inspect a candidate file and answer with a [`Detection`]. A file
//! that might simply belong to another format is declined with
//! [`Detection::NotThisFormat`]; only a file that is unambiguously a broken
//! instance of the format produces an error.

pub mod byteswap;
pub mod cdf;
pub mod tiff;

pub use self::byteswap::{read_u16_swapped, read_u32_swapped, read_u64_swapped};
pub use self::cdf::{CdfHeader, CdfVersion};
pub use self::tiff::{TiffHeader, TiffVariant};

/// Byte order of multi-byte values in a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endianness {
    Little,
    Big,
}

impl Endianness {
    /// Byte order of the running host.
    pub fn native() -> Self {
        if cfg!(target_endian = "big") {
            Endianness::Big
        } else {
            Endianness::Little
        }
    }

    /// Whether values in this order must be swapped to be read on this host.
    pub fn needs_swap(self) -> bool {
        self != Self::native()
    }
}

/// Facts decoded from a recognised header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeaderFacts {
    Tiff(TiffHeader),
    Cdf(CdfHeader),
}

/// Verdict of a detector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Detection {
    NotThisFormat,
    Detected(HeaderFacts),
}

/// Read until `buf` is full or the source is exhausted. Returns bytes read.
pub(crate) fn read_up_to<R: std::io::Read>(reader: &mut R, buf: &mut [u8]) -> std::io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
