//! Global constants for the adapter layer

// ============================================================================
// TIFF header layout
// ============================================================================

/// Little-endian byte order mark (`II`)
pub const TIFF_MAGIC_LE: u16 = 0x4949;

/// Big-endian byte order mark (`MM`)
pub const TIFF_MAGIC_BE: u16 = 0x4D4D;

/// Version field of classic TIFF
pub const TIFF_VERSION_CLASSIC: u16 = 42;

/// Version field of BigTIFF
pub const TIFF_VERSION_BIG: u16 = 43;

/// Bytes read to decode either header variant
pub const TIFF_HEADER_LEN: usize = 16;

/// Classic directory entry: tag, type, 4-byte count, 4-byte value
pub const TIFF_ENTRY_LEN_CLASSIC: u64 = 12;

/// BigTIFF directory entry: tag, type, 8-byte count, 8-byte value
pub const TIFF_ENTRY_LEN_BIG: u64 = 20;

/// No directory can start inside the header
pub const MIN_IFD_OFFSET: u64 = 8;

/// Default ceiling on the first directory offset (100 MiB)
pub const DEFAULT_MAX_IFD_OFFSET: u64 = 104_857_600;

/// Default ceiling on directory entry count
pub const DEFAULT_MAX_IFD_ENTRIES: u64 = 4096;

/// Hard ceiling on directory entry count, whatever the configuration says
pub const MAX_IFD_ENTRIES_CEILING: u64 = 65_535;

/// Default ceiling on one decoded scanline or tile (1 GiB)
pub const DEFAULT_MAX_CHUNK_BYTES: usize = 1 << 30;

// ============================================================================
// TIFF tags
// ============================================================================

pub const TAG_IMAGE_WIDTH: u16 = 256;
pub const TAG_IMAGE_LENGTH: u16 = 257;
pub const TAG_BITS_PER_SAMPLE: u16 = 258;
pub const TAG_SAMPLES_PER_PIXEL: u16 = 277;
pub const TAG_ROWS_PER_STRIP: u16 = 278;
pub const TAG_PLANAR_CONFIGURATION: u16 = 284;
pub const TAG_TILE_WIDTH: u16 = 322;
pub const TAG_TILE_LENGTH: u16 = 323;
pub const TAG_SAMPLE_FORMAT: u16 = 339;

pub const TAG_MODEL_PIXEL_SCALE: u16 = 33550;
pub const TAG_MODEL_TIEPOINT: u16 = 33922;
pub const TAG_MODEL_TRANSFORMATION: u16 = 34264;
pub const TAG_GEO_KEY_DIRECTORY: u16 = 34735;
pub const TAG_GEO_DOUBLE_PARAMS: u16 = 34736;
pub const TAG_GEO_ASCII_PARAMS: u16 = 34737;
pub const TAG_GDAL_NODATA: u16 = 42113;

/// Tags whose presence distinguishes a GeoTIFF from a plain TIFF
pub const GEOTIFF_TAGS: [u16; 6] = [
    TAG_GEO_KEY_DIRECTORY,
    TAG_GEO_DOUBLE_PARAMS,
    TAG_GEO_ASCII_PARAMS,
    TAG_MODEL_PIXEL_SCALE,
    TAG_MODEL_TIEPOINT,
    TAG_MODEL_TRANSFORMATION,
];

/// SampleFormat values
pub const SAMPLE_FORMAT_UINT: u16 = 1;
pub const SAMPLE_FORMAT_INT: u16 = 2;
pub const SAMPLE_FORMAT_IEEEFP: u16 = 3;

/// PlanarConfiguration values
pub const PLANAR_CONTIG: u16 = 1;
pub const PLANAR_SEPARATE: u16 = 2;

// ============================================================================
// CDF header layout
// ============================================================================

/// First magic word of a version 3 file
pub const CDF_MAGIC_V3: u32 = 0xCDF3_0001;

/// First magic word of a version 2.6/2.7 file
pub const CDF_MAGIC_V26: u32 = 0xCDF2_6002;

/// First magic word of a version 2.5 or earlier file
pub const CDF_MAGIC_V25: u32 = 0x0000_FFFF;

/// Second magic word of an uncompressed file
pub const CDF_MAGIC_UNCOMPRESSED: u32 = 0x0000_FFFF;

/// Second magic word of a compressed file
pub const CDF_MAGIC_COMPRESSED: u32 = 0xCCCC_0001;

// ============================================================================
// Model naming
// ============================================================================

pub const GEOTIFF_VAR_NAME: &str = "data";
pub const GEOTIFF_DIM_X: &str = "x";
pub const GEOTIFF_DIM_Y: &str = "y";
pub const GEOTIFF_DIM_BAND: &str = "band";

/// Fill value attribute name
pub const FILL_VALUE_ATT: &str = "_FillValue";
