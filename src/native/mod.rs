//! Interfaces to the native format libraries.
//!
//! The adapter layer never parses foreign file structures beyond the header
//! bytes it inspects during detection. Everything else goes through these
//! traits, which mirror the header-query and element-read primitives of the
//! underlying C libraries.

pub mod cdf;
pub mod tiff;

pub use self::cdf::{AttrScope, CdfAttrEntry, CdfAttrInfo, CdfFile, CdfLibrary, CdfVarInfo};
pub use self::tiff::{TiffCrateLibrary, TiffFile, TiffLibrary};
