//! Native element type tags mapped onto host element types.
//!
//! Each format has a pure lookup from its native tag to a [`TypeMapping`].
//! Tags without an entry fail with
//! [`AdapterError::UnsupportedType`](crate::error::AdapterError::UnsupportedType);
//! nothing is mapped by default.

pub mod cdf;
pub mod tiff;

use nep_model::NcType;

/// One row of a type table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TypeMapping {
    /// Host element type
    pub nc_type: NcType,
    /// Element size in bytes
    pub size: usize,
    /// Native name of the tag
    pub name: &'static str,
}

impl TypeMapping {
    pub(crate) const fn new(nc_type: NcType, size: usize, name: &'static str) -> Self {
        Self {
            nc_type,
            size,
            name,
        }
    }
}
