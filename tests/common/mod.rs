#![allow(dead_code)]

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use nep::config::{AdapterConfig, ReadLimits};
use nep::native::{TiffCrateLibrary, TiffFile, TiffLibrary};
use nep::{AdapterRegistry, GeoTiffAdapter, NativeError};
use tempfile::TempDir;
use tiff::encoder::{TiffEncoder, colortype};
use tiff::tags::Tag;

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub const PIXEL_SCALE: [f64; 3] = [30.0, 30.0, 0.0];
pub const TIEPOINT: [f64; 6] = [0.0, 0.0, 0.0, 440720.0, 3751320.0, 0.0];
pub const KEY_DIRECTORY: [u16; 8] = [1, 1, 0, 1, 1024, 0, 1, 1];

/// Value stored at `(y, x)` of the 16-bit fixture.
pub fn gray16_value(y: usize, x: usize) -> u16 {
    ((y * 7 + x * 3) % 65_536) as u16
}

/// Value stored at `(band, y, x)` of the RGB fixture.
pub fn rgb_value(band: usize, y: usize, x: usize) -> u8 {
    match band {
        0 => x as u8,
        1 => y as u8,
        _ => (x + y) as u8,
    }
}

/// Georeferencing tags shared by every fixture.
macro_rules! write_geo_tags {
    ($image:expr) => {{
        let dir = $image.encoder();
        dir.write_tag(Tag::Unknown(33550), &PIXEL_SCALE[..]).unwrap();
        dir.write_tag(Tag::Unknown(33922), &TIEPOINT[..]).unwrap();
        dir.write_tag(Tag::Unknown(34735), &KEY_DIRECTORY[..]).unwrap();
    }};
}

/// Single-band 16-bit GeoTIFF.
pub fn write_gray16(dir: &TempDir, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.path().join(name);
    let mut data = Vec::with_capacity((width * height) as usize);
    for y in 0..height as usize {
        for x in 0..width as usize {
            data.push(gray16_value(y, x));
        }
    }
    let mut encoder = TiffEncoder::new(File::create(&path).unwrap()).unwrap();
    let mut image = encoder
        .new_image::<colortype::Gray16>(width, height)
        .unwrap();
    write_geo_tags!(image);
    image.write_data(&data).unwrap();
    path
}

/// Three-band 8-bit GeoTIFF with pixel-interleaved samples.
pub fn write_rgb8(dir: &TempDir, name: &str, width: u32, height: u32) -> PathBuf {
    let path = dir.path().join(name);
    let mut data = Vec::with_capacity((width * height * 3) as usize);
    for y in 0..height as usize {
        for x in 0..width as usize {
            for band in 0..3 {
                data.push(rgb_value(band, y, x));
            }
        }
    }
    let mut encoder = TiffEncoder::new(File::create(&path).unwrap()).unwrap();
    let mut image = encoder.new_image::<colortype::RGB8>(width, height).unwrap();
    write_geo_tags!(image);
    image.write_data(&data).unwrap();
    path
}

/// Single-band float GeoTIFF with a GDAL nodata tag.
pub fn write_float_with_nodata(dir: &TempDir, name: &str, nodata: &str) -> PathBuf {
    let path = dir.path().join(name);
    let data: Vec<f32> = (0..12).map(|i| i as f32 * 0.5).collect();
    let mut encoder = TiffEncoder::new(File::create(&path).unwrap()).unwrap();
    let mut image = encoder.new_image::<colortype::Gray32Float>(4, 3).unwrap();
    write_geo_tags!(image);
    image
        .encoder()
        .write_tag(Tag::Unknown(42113), nodata)
        .unwrap();
    image.write_data(&data).unwrap();
    path
}

/// 8-bit TIFF without any georeferencing tag.
pub fn write_plain_tiff(dir: &TempDir, name: &str) -> PathBuf {
    let path = dir.path().join(name);
    let mut encoder = TiffEncoder::new(File::create(&path).unwrap()).unwrap();
    encoder
        .write_image::<colortype::Gray8>(2, 2, &[1, 2, 3, 4])
        .unwrap();
    path
}

pub fn write_bytes(dir: &TempDir, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

/// Wraps the `tiff` crate backend and counts scanline and tile reads.
pub struct CountingTiffLibrary {
    pub reads: Arc<AtomicUsize>,
}

impl CountingTiffLibrary {
    pub fn new() -> Self {
        Self {
            reads: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

struct CountingTiffFile {
    inner: Box<dyn TiffFile>,
    reads: Arc<AtomicUsize>,
}

impl TiffLibrary for CountingTiffLibrary {
    fn open(&self, path: &Path, limits: &ReadLimits) -> Result<Box<dyn TiffFile>, NativeError> {
        Ok(Box::new(CountingTiffFile {
            inner: TiffCrateLibrary.open(path, limits)?,
            reads: Arc::clone(&self.reads),
        }))
    }
}

impl TiffFile for CountingTiffFile {
    fn field_u32(&mut self, tag: u16) -> Result<Option<u32>, NativeError> {
        self.inner.field_u32(tag)
    }

    fn field_u16s(&mut self, tag: u16) -> Result<Option<Vec<u16>>, NativeError> {
        self.inner.field_u16s(tag)
    }

    fn field_f64s(&mut self, tag: u16) -> Result<Option<Vec<f64>>, NativeError> {
        self.inner.field_f64s(tag)
    }

    fn field_ascii(&mut self, tag: u16) -> Result<Option<String>, NativeError> {
        self.inner.field_ascii(tag)
    }

    fn is_tiled(&mut self) -> Result<bool, NativeError> {
        self.inner.is_tiled()
    }

    fn read_scanline(&mut self, row: u32, plane: u16, buf: &mut [u8]) -> Result<(), NativeError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.read_scanline(row, plane, buf)
    }

    fn read_tile(&mut self, x: u32, y: u32, plane: u16, buf: &mut [u8]) -> Result<(), NativeError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.inner.read_tile(x, y, plane, buf)
    }
}

/// Registry holding only a GeoTIFF adapter over the given library.
pub fn geotiff_registry(library: Arc<dyn TiffLibrary>) -> AdapterRegistry {
    let config = AdapterConfig::default();
    AdapterRegistry::builder()
        .register(Box::new(GeoTiffAdapter::new(
            library,
            config.detection,
            config.read,
        )))
        .build()
}

/// Category of an expected failure, for results whose success type is not `Debug`.
pub fn error_kind<T>(result: nep::Result<T>) -> nep::ErrorKind {
    match result {
        Ok(_) => panic!("expected an error"),
        Err(e) => e.kind(),
    }
}
