//! Host-side metadata store for files opened through NEP format adapters.
//!
//! Adapters never expose foreign structures directly. Instead they describe a
//! file in terms of the host's data model: named dimensions, typed variables
//! over those dimensions, and attributes attached to the file or to a
//! variable. The model is assembled with a [`ModelBuilder`] and frozen into an
//! immutable [`FileModel`] once extraction succeeds.

pub mod attribute;
pub mod error;
pub mod model;
pub mod types;

pub use attribute::Attribute;
pub use error::{ModelError, Result};
pub use model::{DimId, Dimension, FileModel, ModelBuilder, VarId, Variable};
pub use types::{NativeType, NcType};
