//! TIFF library interface and its backend on the `tiff` crate.
//!
//! The interface mirrors libtiff: tag queries by field id and one scanline or
//! one tile per read. Sample values are delivered in host byte order.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::tags::Tag;
use tiff::TiffError;

use crate::config::ReadLimits;
use crate::constants::{
    PLANAR_SEPARATE, TAG_PLANAR_CONFIGURATION, TAG_ROWS_PER_STRIP, TAG_TILE_LENGTH,
    TAG_TILE_WIDTH,
};
use crate::error::NativeError;

pub trait TiffLibrary: Send + Sync {
    fn open(&self, path: &Path, limits: &ReadLimits) -> Result<Box<dyn TiffFile>, NativeError>;
}

/// An open TIFF positioned on its first image directory.
pub trait TiffFile: Send {
    fn field_u32(&mut self, tag: u16) -> Result<Option<u32>, NativeError>;

    fn field_u16s(&mut self, tag: u16) -> Result<Option<Vec<u16>>, NativeError>;

    fn field_f64s(&mut self, tag: u16) -> Result<Option<Vec<f64>>, NativeError>;

    fn field_ascii(&mut self, tag: u16) -> Result<Option<String>, NativeError>;

    fn is_tiled(&mut self) -> Result<bool, NativeError>;

    /// Read scanline `row` of sample plane `plane`. `buf` holds one row of
    /// the plane: every sample of every pixel for contiguous data, one
    /// sample per pixel for separate planes.
    fn read_scanline(&mut self, row: u32, plane: u16, buf: &mut [u8]) -> Result<(), NativeError>;

    /// Read the tile containing pixel `(x, y)` of sample plane `plane`.
    /// `buf` holds a full tile; the part outside the image is zeroed.
    fn read_tile(&mut self, x: u32, y: u32, plane: u16, buf: &mut [u8]) -> Result<(), NativeError>;

    /// Release library-side state. Dropping the file closes it as well.
    fn close(&mut self) -> Result<(), NativeError> {
        Ok(())
    }
}

fn native(e: TiffError) -> NativeError {
    NativeError::new(e.to_string())
}

/// Backend built on the pure-Rust `tiff` decoder.
#[derive(Debug, Default, Clone, Copy)]
pub struct TiffCrateLibrary;

impl TiffLibrary for TiffCrateLibrary {
    fn open(&self, path: &Path, limits: &ReadLimits) -> Result<Box<dyn TiffFile>, NativeError> {
        let file = File::open(path).map_err(|e| NativeError::new(e.to_string()))?;
        let mut decoder_limits = Limits::default();
        decoder_limits.decoding_buffer_size = limits.max_chunk_bytes;
        let mut decoder = Decoder::new(BufReader::new(file))
            .map_err(native)?
            .with_limits(decoder_limits);
        let (width, height) = decoder.dimensions().map_err(native)?;
        let geometry = ChunkGeometry::read(&mut decoder, width, height)?;
        log::trace!("tiff: opened {:?} as {:?}", path, geometry);
        Ok(Box::new(TiffCrateFile {
            decoder,
            geometry,
            cached: None,
        }))
    }
}

/// Chunk layout needed to turn a pixel position into a chunk index.
#[derive(Debug, Clone, Copy)]
struct ChunkGeometry {
    width: u32,
    height: u32,
    tile: Option<(u32, u32)>,
    rows_per_strip: u32,
    separate_planes: bool,
}

impl ChunkGeometry {
    fn read(decoder: &mut Decoder<BufReader<File>>, width: u32, height: u32) -> Result<Self, NativeError> {
        let u32_tag = |decoder: &mut Decoder<BufReader<File>>, tag: u16| {
            decoder
                .find_tag(Tag::from_u16_exhaustive(tag))
                .map_err(native)?
                .map(|v| v.into_u32().map_err(native))
                .transpose()
        };
        let tile = match (
            u32_tag(decoder, TAG_TILE_WIDTH)?,
            u32_tag(decoder, TAG_TILE_LENGTH)?,
        ) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Some((w, h)),
            _ => None,
        };
        let rows_per_strip = u32_tag(decoder, TAG_ROWS_PER_STRIP)?
            .unwrap_or(height)
            .clamp(1, height.max(1));
        let separate_planes = u32_tag(decoder, TAG_PLANAR_CONFIGURATION)?
            == Some(u32::from(PLANAR_SEPARATE));
        Ok(Self {
            width,
            height,
            tile,
            rows_per_strip,
            separate_planes,
        })
    }

    fn strips_per_plane(&self) -> u32 {
        self.height.div_ceil(self.rows_per_strip)
    }

    fn tiles_across(&self, tile_w: u32) -> u32 {
        self.width.div_ceil(tile_w)
    }

    fn tiles_down(&self, tile_h: u32) -> u32 {
        self.height.div_ceil(tile_h)
    }

    /// Index of the first chunk of a sample plane.
    fn plane_base(&self, plane: u16, chunks_per_plane: u32) -> Result<u32, NativeError> {
        if self.separate_planes {
            Ok(u32::from(plane) * chunks_per_plane)
        } else if plane == 0 {
            Ok(0)
        } else {
            Err(NativeError::new(format!(
                "plane {} requested from contiguous image",
                plane
            )))
        }
    }
}

/// A decoded strip or tile.
struct DecodedChunk {
    index: u32,
    bytes: Vec<u8>,
    rows: usize,
}

impl DecodedChunk {
    fn row_len(&self) -> usize {
        self.bytes.len() / self.rows.max(1)
    }
}

pub struct TiffCrateFile {
    decoder: Decoder<BufReader<File>>,
    geometry: ChunkGeometry,
    cached: Option<DecodedChunk>,
}

impl TiffCrateFile {
    fn find(&mut self, tag: u16) -> Result<Option<tiff::decoder::ifd::Value>, NativeError> {
        self.decoder
            .find_tag(Tag::from_u16_exhaustive(tag))
            .map_err(native)
    }

    /// Decode a chunk unless it is the one already cached.
    fn load_chunk(&mut self, index: u32) -> Result<&DecodedChunk, NativeError> {
        if self.cached.as_ref().map(|c| c.index) != Some(index) {
            let (_, rows) = self.decoder.chunk_data_dimensions(index);
            let result = self.decoder.read_chunk(index).map_err(native)?;
            self.cached = Some(DecodedChunk {
                index,
                bytes: decoding_result_bytes(result),
                rows: rows as usize,
            });
        }
        self.cached
            .as_ref()
            .ok_or_else(|| NativeError::new("chunk cache empty after decode"))
    }
}

impl TiffFile for TiffCrateFile {
    fn field_u32(&mut self, tag: u16) -> Result<Option<u32>, NativeError> {
        self.find(tag)?
            .map(|v| v.into_u32().map_err(native))
            .transpose()
    }

    fn field_u16s(&mut self, tag: u16) -> Result<Option<Vec<u16>>, NativeError> {
        self.find(tag)?
            .map(|v| v.into_u16_vec().map_err(native))
            .transpose()
    }

    fn field_f64s(&mut self, tag: u16) -> Result<Option<Vec<f64>>, NativeError> {
        self.find(tag)?
            .map(|v| v.into_f64_vec().map_err(native))
            .transpose()
    }

    fn field_ascii(&mut self, tag: u16) -> Result<Option<String>, NativeError> {
        self.find(tag)?
            .map(|v| v.into_string().map_err(native))
            .transpose()
    }

    fn is_tiled(&mut self) -> Result<bool, NativeError> {
        Ok(self.geometry.tile.is_some())
    }

    fn read_scanline(&mut self, row: u32, plane: u16, buf: &mut [u8]) -> Result<(), NativeError> {
        let geometry = self.geometry;
        if geometry.tile.is_some() {
            return Err(NativeError::new("scanline read on a tiled image"));
        }
        if row >= geometry.height {
            return Err(NativeError::new(format!("row {} beyond image height", row)));
        }
        let base = geometry.plane_base(plane, geometry.strips_per_plane())?;
        let chunk = self.load_chunk(base + row / geometry.rows_per_strip)?;
        let row_len = chunk.row_len();
        let start = (row % geometry.rows_per_strip) as usize * row_len;
        let src = chunk
            .bytes
            .get(start..start + row_len)
            .ok_or_else(|| NativeError::new(format!("strip too short for row {}", row)))?;
        let n = src.len().min(buf.len());
        buf[..n].copy_from_slice(&src[..n]);
        Ok(())
    }

    fn read_tile(&mut self, x: u32, y: u32, plane: u16, buf: &mut [u8]) -> Result<(), NativeError> {
        let geometry = self.geometry;
        let Some((tile_w, tile_h)) = geometry.tile else {
            return Err(NativeError::new("tile read on a striped image"));
        };
        if x >= geometry.width || y >= geometry.height {
            return Err(NativeError::new(format!("pixel ({}, {}) outside image", x, y)));
        }
        let across = geometry.tiles_across(tile_w);
        let per_plane = across * geometry.tiles_down(tile_h);
        let base = geometry.plane_base(plane, per_plane)?;
        let chunk = self.load_chunk(base + (y / tile_h) * across + x / tile_w)?;

        // Edge tiles decode cropped; lay them out at the full tile stride.
        let src_stride = chunk.row_len();
        let dst_stride = buf.len() / tile_h as usize;
        buf.fill(0);
        for (r, src_row) in chunk.bytes.chunks(src_stride.max(1)).take(chunk.rows).enumerate() {
            let n = src_row.len().min(dst_stride);
            let dst = r * dst_stride;
            buf[dst..dst + n].copy_from_slice(&src_row[..n]);
        }
        Ok(())
    }
}

/// Flatten decoded samples into host-order bytes.
fn decoding_result_bytes(result: DecodingResult) -> Vec<u8> {
    match result {
        DecodingResult::U8(v) => v,
        DecodingResult::I8(v) => bytemuck::cast_slice(&v).to_vec(),
        DecodingResult::U16(v) => bytemuck::cast_slice(&v).to_vec(),
        DecodingResult::I16(v) => bytemuck::cast_slice(&v).to_vec(),
        DecodingResult::U32(v) => bytemuck::cast_slice(&v).to_vec(),
        DecodingResult::I32(v) => bytemuck::cast_slice(&v).to_vec(),
        DecodingResult::U64(v) => bytemuck::cast_slice(&v).to_vec(),
        DecodingResult::I64(v) => bytemuck::cast_slice(&v).to_vec(),
        DecodingResult::F32(v) => bytemuck::cast_slice(&v).to_vec(),
        DecodingResult::F64(v) => bytemuck::cast_slice(&v).to_vec(),
    }
}
