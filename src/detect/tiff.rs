//! GeoTIFF detection from the TIFF header and first directory.

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use super::{Detection, Endianness, HeaderFacts, read_u16_swapped, read_u32_swapped, read_u64_swapped, read_up_to};
use crate::config::DetectionLimits;
use crate::constants::{
    GEOTIFF_TAGS, MAX_IFD_ENTRIES_CEILING, MIN_IFD_OFFSET, TIFF_ENTRY_LEN_BIG, TIFF_ENTRY_LEN_CLASSIC, TIFF_HEADER_LEN,
    TIFF_MAGIC_BE, TIFF_MAGIC_LE, TIFF_VERSION_BIG, TIFF_VERSION_CLASSIC,
};
use crate::error::{AdapterError, Result};

/// Classic TIFF or BigTIFF.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TiffVariant {
    Classic,
    Big,
}

impl TiffVariant {
    fn entry_len(self) -> u64 {
        match self {
            TiffVariant::Classic => TIFF_ENTRY_LEN_CLASSIC,
            TiffVariant::Big => TIFF_ENTRY_LEN_BIG,
        }
    }

    fn count_len(self) -> usize {
        match self {
            TiffVariant::Classic => 2,
            TiffVariant::Big => 8,
        }
    }
}

/// Facts decoded from a GeoTIFF header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TiffHeader {
    pub byte_order: Endianness,
    pub variant: TiffVariant,
    /// Offset of the first image file directory
    pub ifd_offset: u64,
    /// Number of entries in the first directory
    pub entry_count: u64,
    /// GeoTIFF extension tags present in the first directory, in file order
    pub geo_tags: Vec<u16>,
}

pub fn detect_path(path: &Path, limits: &DetectionLimits) -> Result<Detection> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    detect_reader(&mut reader, limits)
}

/// Detect a GeoTIFF from any seekable byte source.
///
/// Short or foreign headers and truncated directories decline the file. A
/// TIFF whose directory offset or entry count is out of bounds is reported
/// as [`AdapterError::MalformedHeader`].
pub fn detect_reader<R: Read + Seek>(reader: &mut R, limits: &DetectionLimits) -> Result<Detection> {
    reader.seek(SeekFrom::Start(0))?;
    let mut header = [0u8; TIFF_HEADER_LEN];
    let filled = read_up_to(reader, &mut header)?;
    let header = &header[..filled];

    let Some(byte_order) = decode_magic(header) else {
        log::trace!("TIFF detect: bad magic");
        return Ok(Detection::NotThisFormat);
    };
    let Some(version) = read_u16_swapped(header, 2, byte_order) else {
        return Ok(Detection::NotThisFormat);
    };

    let (variant, ifd_offset) = match version {
        TIFF_VERSION_CLASSIC => match read_u32_swapped(header, 4, byte_order) {
            Some(offset) => (TiffVariant::Classic, u64::from(offset)),
            None => return Ok(Detection::NotThisFormat),
        },
        TIFF_VERSION_BIG => {
            let (Some(offset_size), Some(pad), Some(offset)) = (
                read_u16_swapped(header, 4, byte_order),
                read_u16_swapped(header, 6, byte_order),
                read_u64_swapped(header, 8, byte_order),
            ) else {
                return Ok(Detection::NotThisFormat);
            };
            if offset_size != 8 || pad != 0 {
                return Err(AdapterError::malformed(format!(
                    "BigTIFF offset size {} with padding {}",
                    offset_size, pad
                )));
            }
            (TiffVariant::Big, offset)
        }
        other => {
            log::trace!("TIFF detect: unknown version {}", other);
            return Ok(Detection::NotThisFormat);
        }
    };

    if ifd_offset < MIN_IFD_OFFSET || ifd_offset > limits.max_ifd_offset {
        return Err(AdapterError::malformed(format!(
            "first IFD offset {} outside {}..={}",
            ifd_offset, MIN_IFD_OFFSET, limits.max_ifd_offset
        )));
    }

    reader.seek(SeekFrom::Start(ifd_offset))?;
    let mut count_buf = [0u8; 8];
    let count_len = variant.count_len();
    if read_up_to(reader, &mut count_buf[..count_len])? < count_len {
        log::trace!("TIFF detect: IFD count truncated");
        return Ok(Detection::NotThisFormat);
    }
    let entry_count = match variant {
        TiffVariant::Classic => read_u16_swapped(&count_buf, 0, byte_order).map(u64::from),
        TiffVariant::Big => read_u64_swapped(&count_buf, 0, byte_order),
    }
    .unwrap_or(0);

    let max_entries = limits.max_ifd_entries.min(MAX_IFD_ENTRIES_CEILING);
    if entry_count > max_entries {
        return Err(AdapterError::malformed(format!(
            "IFD declares {} entries, limit is {}",
            entry_count, max_entries
        )));
    }

    let entry_len = variant.entry_len();
    let table_len = entry_count
        .checked_mul(entry_len)
        .and_then(|len| usize::try_from(len).ok())
        .ok_or_else(|| {
            AdapterError::malformed(format!(
                "IFD of {} entries does not fit in memory",
                entry_count
            ))
        })?;
    let mut table = vec![0u8; table_len];
    if read_up_to(reader, &mut table)? < table_len {
        log::trace!("TIFF detect: IFD entries truncated");
        return Ok(Detection::NotThisFormat);
    }

    let geo_tags: Vec<u16> = (0..entry_count)
        .filter_map(|i| read_u16_swapped(&table, (i * entry_len) as usize, byte_order))
        .filter(|tag| GEOTIFF_TAGS.contains(tag))
        .collect();

    if geo_tags.is_empty() {
        log::debug!("TIFF detect: plain TIFF without georeferencing tags");
        return Ok(Detection::NotThisFormat);
    }

    log::debug!(
        "TIFF detect: {:?} {:?} GeoTIFF, IFD at {} with {} entries",
        byte_order,
        variant,
        ifd_offset,
        entry_count
    );
    Ok(Detection::Detected(HeaderFacts::Tiff(TiffHeader {
        byte_order,
        variant,
        ifd_offset,
        entry_count,
        geo_tags,
    })))
}

fn decode_magic(header: &[u8]) -> Option<Endianness> {
    // Both byte orders read the mark identically since its two bytes match.
    match read_u16_swapped(header, 0, Endianness::native())? {
        TIFF_MAGIC_LE => Some(Endianness::Little),
        TIFF_MAGIC_BE => Some(Endianness::Big),
        _ => None,
    }
}
