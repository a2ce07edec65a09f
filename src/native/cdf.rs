//! CDF library interface.
//!
//! No CDF backend ships with this crate. A host that links the NASA CDF
//! library provides a [`CdfLibrary`] to the registry; without one the CDF
//! adapter is not registered.

use std::path::Path;

use crate::detect::Endianness;
use crate::error::NativeError;

/// Header facts of one zVariable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CdfVarInfo {
    pub name: String,
    /// Native data type tag
    pub data_type: i64,
    /// Elements per value; the string length for character types
    pub num_elems: usize,
    pub dim_sizes: Vec<usize>,
    pub record_varying: bool,
    /// Last written record, or `None` when no record exists
    pub max_rec: Option<usize>,
}

impl CdfVarInfo {
    /// Number of records exposed on the record axis.
    pub fn num_records(&self) -> usize {
        self.max_rec.map_or(0, |m| m + 1)
    }
}

/// Scope of a CDF attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttrScope {
    Global,
    Variable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CdfAttrInfo {
    pub name: String,
    pub scope: AttrScope,
}

/// One attribute entry. `bytes` holds `num_elems` values of `data_type` in
/// host byte order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CdfAttrEntry {
    pub data_type: i64,
    pub num_elems: usize,
    pub bytes: Vec<u8>,
}

pub trait CdfLibrary: Send + Sync {
    /// Open a file for reading. Only the header is read.
    fn open(&self, path: &Path) -> Result<Box<dyn CdfFile>, NativeError>;
}

/// An open CDF file. Values are delivered in host byte order.
pub trait CdfFile: Send {
    /// Byte order the file declares for its values.
    fn encoding(&self) -> Endianness {
        Endianness::native()
    }

    fn num_zvars(&mut self) -> Result<usize, NativeError>;

    fn zvar_inquire(&mut self, var: usize) -> Result<CdfVarInfo, NativeError>;

    fn num_attrs(&mut self) -> Result<usize, NativeError>;

    fn attr_inquire(&mut self, attr: usize) -> Result<CdfAttrInfo, NativeError>;

    /// All gEntries of a global-scope attribute, in entry order.
    fn attr_gentries(&mut self, attr: usize) -> Result<Vec<CdfAttrEntry>, NativeError>;

    /// The zEntry of a variable-scope attribute for one variable, if written.
    fn attr_zentry(&mut self, attr: usize, var: usize) -> Result<Option<CdfAttrEntry>, NativeError>;

    /// Read one value at `(record, indices)` into `out`, which holds exactly
    /// `num_elems` elements of the variable's type.
    fn get_zvar_value(
        &mut self,
        var: usize,
        record: usize,
        indices: &[usize],
        out: &mut [u8],
    ) -> Result<(), NativeError>;

    fn close(&mut self) -> Result<(), NativeError>;
}
