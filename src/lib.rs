//! NEP - read-only GeoTIFF and NASA CDF adapters for a netCDF-style host
//!
//! Foreign files are detected from their leading bytes, described through a
//! [`nep_model::FileModel`] of dimensions, variables and attributes, and read
//! by rectangular hyperslab into host-order buffers. Every mutation is refused.
//!
//! ```no_run
//! use nep::{AdapterRegistry, OpenMode, Session};
//!
//! let mut session = Session::new(AdapterRegistry::new());
//! let id = session.open("scene.tif", OpenMode::ReadOnly)?;
//! let data = session.inq_varid(id, "data")?;
//! let pixels = session.get_vara_array::<f32>(id, data, &[0, 0], &[16, 16])?;
//! println!("{:?}", pixels.shape());
//! session.close(id)?;
//! # Ok::<(), nep::AdapterError>(())
//! ```

pub mod adapters;
pub mod config;
pub mod constants;
pub mod convert;
pub mod detect;
pub mod dispatch;
pub mod error;
pub mod handle;
pub mod hyperslab;
pub mod native;
pub mod registry;
pub mod session;
pub mod types;

pub use adapters::{CdfAdapter, GeoTiffAdapter};
pub use config::{AdapterConfig, ConfigError, LogLevel};
pub use detect::{Detection, Endianness, HeaderFacts};
pub use dispatch::{FileInfo, FormatAdapter, FormatKind, OpenFile, OpenMode};
pub use error::{AdapterError, ErrorKind, NativeError, Result};
pub use hyperslab::VarData;
pub use registry::{AdapterRegistry, RegistryBuilder};
pub use session::{FileId, Session};

pub use nep_model;
