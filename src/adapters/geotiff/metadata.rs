//! Raster facts read from TIFF tags and the model built from them.

use nep_model::{Attribute, FileModel, ModelBuilder, NativeType};

use crate::constants::{
    FILL_VALUE_ATT, GEOTIFF_DIM_BAND, GEOTIFF_DIM_X, GEOTIFF_DIM_Y, GEOTIFF_VAR_NAME,
    PLANAR_CONTIG, PLANAR_SEPARATE, SAMPLE_FORMAT_UINT, TAG_BITS_PER_SAMPLE, TAG_GDAL_NODATA,
    TAG_GEO_ASCII_PARAMS, TAG_GEO_DOUBLE_PARAMS, TAG_GEO_KEY_DIRECTORY, TAG_IMAGE_LENGTH,
    TAG_IMAGE_WIDTH, TAG_MODEL_PIXEL_SCALE, TAG_MODEL_TIEPOINT, TAG_MODEL_TRANSFORMATION,
    TAG_PLANAR_CONFIGURATION, TAG_ROWS_PER_STRIP, TAG_SAMPLE_FORMAT, TAG_SAMPLES_PER_PIXEL,
    TAG_TILE_LENGTH, TAG_TILE_WIDTH,
};
use crate::convert::convert;
use crate::error::{AdapterError, Result};
use crate::native::TiffFile;
use crate::types::TypeMapping;
use crate::types::tiff::map_sample;

use super::LIBRARY;

/// How pixel data is chunked on disk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Organization {
    Striped { rows_per_strip: u32 },
    Tiled { tile_width: u32, tile_height: u32 },
}

/// Layout and type of the first image, cached for the life of the handle.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterInfo {
    pub width: u32,
    pub height: u32,
    pub bands: u16,
    pub bits_per_sample: u16,
    pub sample_format: u16,
    pub mapping: TypeMapping,
    pub organization: Organization,
    /// Each band stored in its own plane
    pub planar_separate: bool,
}

fn native<T>(result: std::result::Result<T, crate::error::NativeError>) -> Result<T> {
    result.map_err(|e| AdapterError::native(LIBRARY, e))
}

/// All entries of a per-sample tag must agree; the first is returned.
fn uniform(tag_name: &str, values: Option<Vec<u16>>, default: u16) -> Result<u16> {
    let values = values.unwrap_or_default();
    let Some(&first) = values.first() else {
        return Ok(default);
    };
    if values.iter().any(|v| *v != first) {
        return Err(AdapterError::UnsupportedType {
            format: "TIFF",
            tag: format!("mixed {} {:?}", tag_name, values),
        });
    }
    Ok(first)
}

impl RasterInfo {
    pub fn read(file: &mut dyn TiffFile) -> Result<Self> {
        let width = native(file.field_u32(TAG_IMAGE_WIDTH))?
            .ok_or_else(|| AdapterError::malformed("ImageWidth tag missing"))?;
        let height = native(file.field_u32(TAG_IMAGE_LENGTH))?
            .ok_or_else(|| AdapterError::malformed("ImageLength tag missing"))?;
        if width == 0 || height == 0 {
            return Err(AdapterError::malformed(format!(
                "empty image {}x{}",
                width, height
            )));
        }

        let bands = native(file.field_u32(TAG_SAMPLES_PER_PIXEL))?.unwrap_or(1);
        let bands = u16::try_from(bands)
            .ok()
            .filter(|b| *b > 0)
            .ok_or_else(|| AdapterError::malformed(format!("SamplesPerPixel {}", bands)))?;

        let bits_per_sample = uniform(
            "BitsPerSample",
            native(file.field_u16s(TAG_BITS_PER_SAMPLE))?,
            1,
        )?;
        let sample_format = uniform(
            "SampleFormat",
            native(file.field_u16s(TAG_SAMPLE_FORMAT))?,
            SAMPLE_FORMAT_UINT,
        )?;
        let mapping = map_sample(sample_format, bits_per_sample)?;

        let organization = if native(file.is_tiled())? {
            let tile_width = native(file.field_u32(TAG_TILE_WIDTH))?.unwrap_or(0);
            let tile_height = native(file.field_u32(TAG_TILE_LENGTH))?.unwrap_or(0);
            if tile_width == 0 || tile_height == 0 {
                return Err(AdapterError::malformed(format!(
                    "tile size {}x{}",
                    tile_width, tile_height
                )));
            }
            Organization::Tiled {
                tile_width,
                tile_height,
            }
        } else {
            let rows_per_strip = native(file.field_u32(TAG_ROWS_PER_STRIP))?
                .unwrap_or(height)
                .clamp(1, height);
            Organization::Striped { rows_per_strip }
        };

        let planar = native(file.field_u32(TAG_PLANAR_CONFIGURATION))?
            .unwrap_or(u32::from(PLANAR_CONTIG));
        let planar_separate = planar == u32::from(PLANAR_SEPARATE);

        Ok(Self {
            width,
            height,
            bands,
            bits_per_sample,
            sample_format,
            mapping,
            organization,
            planar_separate,
        })
    }

    /// Samples stored per pixel within one chunk.
    pub fn samples_per_chunk_pixel(&self) -> usize {
        if self.planar_separate {
            1
        } else {
            usize::from(self.bands)
        }
    }

    /// Bytes in one scanline or tile buffer, `None` on overflow.
    pub fn chunk_bytes(&self) -> Option<usize> {
        let pixels = match self.organization {
            Organization::Striped { .. } => self.width as usize,
            Organization::Tiled {
                tile_width,
                tile_height,
            } => (tile_width as usize).checked_mul(tile_height as usize)?,
        };
        pixels
            .checked_mul(self.samples_per_chunk_pixel())?
            .checked_mul(self.mapping.size)
    }

    /// Variable shape: `(y, x)` or `(band, y, x)`.
    pub fn shape(&self) -> Vec<usize> {
        let mut shape = Vec::with_capacity(3);
        if self.bands > 1 {
            shape.push(usize::from(self.bands));
        }
        shape.push(self.height as usize);
        shape.push(self.width as usize);
        shape
    }
}

/// Build the file model. Nothing is published unless every step succeeds.
pub fn build_model(info: &RasterInfo, file: &mut dyn TiffFile) -> Result<FileModel> {
    let mut builder = ModelBuilder::new();

    let mut dims = Vec::with_capacity(3);
    if info.bands > 1 {
        dims.push(builder.add_dim(GEOTIFF_DIM_BAND, usize::from(info.bands))?);
    }
    dims.push(builder.add_dim(GEOTIFF_DIM_Y, info.height as usize)?);
    dims.push(builder.add_dim(GEOTIFF_DIM_X, info.width as usize)?);
    let var = builder.add_var(GEOTIFF_VAR_NAME, info.mapping.nc_type, dims, 0)?;

    if let Some(nodata) = native(file.field_ascii(TAG_GDAL_NODATA))? {
        match fill_value(&nodata, info) {
            Some(att) => builder.add_var_att(var, att)?,
            None => log::warn!(
                "GeoTIFF: ignoring GDAL_NODATA '{}' not representable as {}",
                nodata.trim(),
                info.mapping.nc_type
            ),
        }
    }

    for (tag, name) in [
        (TAG_MODEL_PIXEL_SCALE, "geotiff_pixel_scale"),
        (TAG_MODEL_TIEPOINT, "geotiff_tiepoint"),
        (TAG_MODEL_TRANSFORMATION, "geotiff_transformation"),
        (TAG_GEO_DOUBLE_PARAMS, "geotiff_double_params"),
    ] {
        if let Some(values) = native(file.field_f64s(tag))? {
            builder.add_global_att(Attribute::from_values(name, &values)?)?;
        }
    }
    if let Some(keys) = native(file.field_u16s(TAG_GEO_KEY_DIRECTORY))? {
        builder.add_global_att(Attribute::from_values("geotiff_key_directory", &keys)?)?;
    }
    if let Some(text) = native(file.field_ascii(TAG_GEO_ASCII_PARAMS))? {
        builder.add_global_att(Attribute::text("geotiff_ascii_params", &text)?)?;
    }

    Ok(builder.finish())
}

/// `_FillValue` in the variable's type, if the nodata text fits it exactly.
fn fill_value(nodata: &str, info: &RasterInfo) -> Option<Attribute> {
    let value: f64 = nodata.trim().trim_end_matches('\0').parse().ok()?;
    let nc_type = info.mapping.nc_type;
    if !nc_type.is_float() && value.fract() != 0.0 {
        return None;
    }
    let mut raw = Vec::new();
    f64::extend_ne(&[value], &mut raw);
    let converted = convert(&raw, nep_model::NcType::Double, nc_type).ok()?;
    if converted.range_errors > 0 {
        return None;
    }
    Attribute::new(FILL_VALUE_ATT, nc_type, converted.bytes).ok()
}
