//! Format adapters shipped with the crate.

pub mod cdf;
pub mod geotiff;

pub use self::cdf::{CdfAdapter, CdfOpenFile};
pub use self::geotiff::{GeoTiffAdapter, GeoTiffFile};
