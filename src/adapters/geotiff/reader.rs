use crate::error::{AdapterError, Result};
use crate::hyperslab::ElementSource;
use crate::native::TiffFile;

use super::LIBRARY;
use super::metadata::{Organization, RasterInfo};

/// Identifies the scanline or tile currently held by a [`ChunkCache`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChunkKey {
    Scanline { row: u32, plane: u16 },
    Tile { col: u32, row: u32, plane: u16 },
}

/// The last scanline or tile read from the native library.
#[derive(Debug, Default)]
pub struct ChunkCache {
    key: Option<ChunkKey>,
    buf: Vec<u8>,
    native_reads: usize,
}

impl ChunkCache {
    /// Number of native scanline or tile reads issued so far.
    pub fn native_reads(&self) -> usize {
        self.native_reads
    }
}

/// Serves single raster elements through the chunk cache.
pub struct RasterSource<'a> {
    pub file: &'a mut dyn TiffFile,
    pub info: &'a RasterInfo,
    pub cache: &'a mut ChunkCache,
}

impl RasterSource<'_> {
    /// Make sure the chunk holding pixel `(x, y)` of `plane` is cached.
    fn fetch(&mut self, key: ChunkKey, x: u32, y: u32, plane: u16) -> Result<()> {
        if self.cache.key == Some(key) {
            return Ok(());
        }
        let len = self.info.chunk_bytes().ok_or_else(|| {
            AdapterError::invalid("chunk size overflows the address space")
        })?;
        self.cache.key = None;
        self.cache.buf.resize(len, 0);
        let result = match key {
            ChunkKey::Scanline { .. } => self.file.read_scanline(y, plane, &mut self.cache.buf),
            ChunkKey::Tile { .. } => self.file.read_tile(x, y, plane, &mut self.cache.buf),
        };
        self.cache.native_reads += 1;
        result.map_err(|e| AdapterError::native(LIBRARY, e))?;
        self.cache.key = Some(key);
        Ok(())
    }
}

impl ElementSource for RasterSource<'_> {
    fn element_size(&self) -> usize {
        self.info.mapping.size
    }

    fn read_element(&mut self, coord: &[usize], out: &mut [u8]) -> Result<()> {
        let (band, y, x) = match coord {
            [band, y, x] => (*band, *y, *x),
            [y, x] => (0, *y, *x),
            _ => {
                return Err(AdapterError::invalid(format!(
                    "raster coordinate {:?} has the wrong rank",
                    coord
                )));
            }
        };
        let to_u32 = |v: usize| {
            u32::try_from(v).map_err(|_| AdapterError::invalid(format!("index {} too large", v)))
        };
        let (x, y) = (to_u32(x)?, to_u32(y)?);
        let band = u16::try_from(band)
            .map_err(|_| AdapterError::invalid(format!("band {} too large", band)))?;

        let (plane, sample) = if self.info.planar_separate {
            (band, 0)
        } else {
            (0, usize::from(band))
        };
        let spp = self.info.samples_per_chunk_pixel();

        let (key, pixel) = match self.info.organization {
            Organization::Striped { .. } => (ChunkKey::Scanline { row: y, plane }, x as usize),
            Organization::Tiled {
                tile_width,
                tile_height,
            } => (
                ChunkKey::Tile {
                    col: x / tile_width,
                    row: y / tile_height,
                    plane,
                },
                (y % tile_height) as usize * tile_width as usize + (x % tile_width) as usize,
            ),
        };
        self.fetch(key, x, y, plane)?;

        let size = self.element_size();
        let offset = (pixel * spp + sample) * size;
        let src = self
            .cache
            .buf
            .get(offset..offset + size)
            .ok_or_else(|| AdapterError::invalid(format!("coordinate {:?} outside chunk", coord)))?;
        out.copy_from_slice(src);
        Ok(())
    }
}
