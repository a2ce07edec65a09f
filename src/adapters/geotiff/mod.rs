//! GeoTIFF adapter.
//!
//! A GeoTIFF is exposed as one variable `data` over `(y, x)`, or over
//! `(band, y, x)` when the image has more than one sample per pixel.
//! Georeferencing tags become `geotiff_*` global attributes and a GDAL nodata
//! tag becomes `_FillValue` on `data`.

pub mod metadata;
pub mod reader;

use std::path::Path;
use std::sync::Arc;

use nep_model::{FileModel, NcType, VarId};

use crate::config::{DetectionLimits, ReadLimits};
use crate::detect::{self, Detection, Endianness, HeaderFacts};
use crate::dispatch::{FormatAdapter, FormatKind, OpenFile};
use crate::error::{AdapterError, Result};
use crate::handle::{FormatHandle, NativeResource};
use crate::hyperslab::{VarData, read_elements, validate_hyperslab};
use crate::native::{TiffFile, TiffLibrary};

pub use metadata::{Organization, RasterInfo};
pub use reader::{ChunkCache, RasterSource};

/// Name used when wrapping native errors.
pub(crate) const LIBRARY: &str = "tiff";

pub struct GeoTiffAdapter {
    library: Arc<dyn TiffLibrary>,
    detection: DetectionLimits,
    read: ReadLimits,
}

impl GeoTiffAdapter {
    pub const ID: &'static str = "geotiff";

    pub fn new(library: Arc<dyn TiffLibrary>, detection: DetectionLimits, read: ReadLimits) -> Self {
        Self {
            library,
            detection,
            read,
        }
    }
}

impl FormatAdapter for GeoTiffAdapter {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn display_name(&self) -> &'static str {
        "GeoTIFF"
    }

    fn kind(&self) -> FormatKind {
        FormatKind::GeoTiff
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["tif", "tiff", "gtif"]
    }

    fn priority(&self) -> i32 {
        10
    }

    fn detect(&self, path: &Path) -> Result<Detection> {
        detect::tiff::detect_path(path, &self.detection)
    }

    fn open(&self, path: &Path, facts: HeaderFacts) -> Result<Box<dyn OpenFile>> {
        let HeaderFacts::Tiff(header) = facts else {
            return Err(AdapterError::NotThisFormat);
        };
        let file = self
            .library
            .open(path, &self.read)
            .map_err(|e| AdapterError::native(LIBRARY, e))?;
        let mut native = TiffNative(file);

        match extract(native.0.as_mut(), &self.read) {
            Ok((info, model)) => {
                log::info!(
                    "GeoTiffAdapter: opened {:?} ({}x{}, {} band(s), {}, {:?})",
                    path,
                    info.width,
                    info.height,
                    info.bands,
                    info.mapping.name,
                    info.organization
                );
                Ok(Box::new(GeoTiffFile {
                    handle: FormatHandle::new(native, model, header.byte_order, path),
                    info,
                    cache: ChunkCache::default(),
                }))
            }
            Err(e) => {
                log::debug!("GeoTiffAdapter: extraction failed for {:?}: {}", path, e);
                if let Err(close_err) = native.release() {
                    log::warn!("GeoTiffAdapter: close after failed open: {}", close_err);
                }
                Err(e)
            }
        }
    }
}

fn extract(file: &mut dyn TiffFile, limits: &ReadLimits) -> Result<(RasterInfo, FileModel)> {
    let info = RasterInfo::read(file)?;
    match info.chunk_bytes() {
        Some(bytes) if bytes <= limits.max_chunk_bytes => {}
        bytes => {
            return Err(AdapterError::invalid(format!(
                "{:?} chunk of {:?} bytes exceeds the {} byte read limit",
                info.organization, bytes, limits.max_chunk_bytes
            )));
        }
    }
    let model = metadata::build_model(&info, file)?;
    Ok((info, model))
}

struct TiffNative(Box<dyn TiffFile>);

impl NativeResource for TiffNative {
    fn release(&mut self) -> Result<()> {
        self.0
            .close()
            .map_err(|e| AdapterError::native(LIBRARY, e))
    }
}

/// An open GeoTIFF.
pub struct GeoTiffFile {
    handle: FormatHandle<TiffNative>,
    info: RasterInfo,
    cache: ChunkCache,
}

impl GeoTiffFile {
    pub fn info(&self) -> &RasterInfo {
        &self.info
    }

    /// Native scanline or tile reads issued since open.
    pub fn native_reads(&self) -> usize {
        self.cache.native_reads()
    }
}

impl OpenFile for GeoTiffFile {
    fn inq_format(&self) -> FormatKind {
        FormatKind::GeoTiff
    }

    fn model(&self) -> Result<&FileModel> {
        self.handle.model()
    }

    fn close(&mut self) -> Result<()> {
        self.handle.close()
    }

    fn abort(&mut self) -> Result<()> {
        self.handle.abort()
    }

    fn byte_order(&self) -> Result<Endianness> {
        self.handle.byte_order()
    }

    fn get_vara(
        &mut self,
        var: VarId,
        start: &[usize],
        count: &[usize],
        mem_type: Option<NcType>,
    ) -> Result<VarData> {
        let (model, native) = self.handle.parts_mut()?;
        let variable = model
            .var(var)
            .ok_or_else(|| AdapterError::invalid(format!("no variable with id {}", var.0)))?;
        let nc_type = variable.nc_type;
        let shape = model
            .var_shape(var)
            .ok_or_else(|| AdapterError::invalid("variable shape unavailable"))?;
        validate_hyperslab(&shape, start, count)?;

        let mut source = RasterSource {
            file: native.0.as_mut(),
            info: &self.info,
            cache: &mut self.cache,
        };
        let raw = read_elements(&mut source, start, count)?;
        log::trace!(
            "GeoTiffFile: read {:?}+{:?}, {} native reads so far",
            start,
            count,
            self.cache.native_reads()
        );
        VarData::from_raw(raw, nc_type, mem_type, count.to_vec())
    }
}
