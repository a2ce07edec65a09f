//! NASA CDF adapter.
//!
//! Every zVariable becomes a variable. Record-varying variables carry a
//! leading record axis; multi-element values add an innermost axis. Global
//! attributes become file attributes and variable-scope entries become
//! attributes of their variable.

pub mod metadata;
pub mod reader;

use std::path::Path;
use std::sync::Arc;

use nep_model::{FileModel, NcType, VarId};

use crate::detect::{self, Detection, Endianness, HeaderFacts};
use crate::dispatch::{FormatAdapter, FormatKind, OpenFile};
use crate::error::{AdapterError, Result};
use crate::handle::{FormatHandle, NativeResource};
use crate::hyperslab::{VarData, read_elements, read_records, validate_hyperslab};
use crate::native::{CdfFile, CdfLibrary};

pub use metadata::CdfVarLayout;
pub use reader::CdfSource;

pub(crate) const LIBRARY: &str = "cdf";

pub struct CdfAdapter {
    library: Arc<dyn CdfLibrary>,
}

impl CdfAdapter {
    pub const ID: &'static str = "cdf";

    pub fn new(library: Arc<dyn CdfLibrary>) -> Self {
        Self { library }
    }
}

impl FormatAdapter for CdfAdapter {
    fn id(&self) -> &'static str {
        Self::ID
    }

    fn display_name(&self) -> &'static str {
        "NASA CDF"
    }

    fn kind(&self) -> FormatKind {
        FormatKind::Cdf
    }

    fn extensions(&self) -> &'static [&'static str] {
        &["cdf"]
    }

    fn detect(&self, path: &Path) -> Result<Detection> {
        detect::cdf::detect_path(path, self.library.as_ref())
    }

    fn open(&self, path: &Path, facts: HeaderFacts) -> Result<Box<dyn OpenFile>> {
        let HeaderFacts::Cdf(header) = facts else {
            return Err(AdapterError::NotThisFormat);
        };
        let file = self
            .library
            .open(path)
            .map_err(|e| AdapterError::native(LIBRARY, e))?;
        let mut native = CdfNative(file);

        match metadata::extract(native.0.as_mut()) {
            Ok((model, layouts)) => {
                log::info!(
                    "CdfAdapter: opened {:?} ({:?}, {} variable(s), {} global attribute(s))",
                    path,
                    header.version,
                    model.nvars(),
                    model.ngatts()
                );
                let byte_order = native.0.encoding();
                Ok(Box::new(CdfOpenFile {
                    handle: FormatHandle::new(native, model, byte_order, path),
                    layouts,
                }))
            }
            Err(e) => {
                log::debug!("CdfAdapter: extraction failed for {:?}: {}", path, e);
                if let Err(close_err) = native.release() {
                    log::warn!("CdfAdapter: close after failed open: {}", close_err);
                }
                Err(e)
            }
        }
    }
}

struct CdfNative(Box<dyn CdfFile>);

impl NativeResource for CdfNative {
    fn release(&mut self) -> Result<()> {
        self.0
            .close()
            .map_err(|e| AdapterError::native(LIBRARY, e))
    }
}

/// An open CDF file.
pub struct CdfOpenFile {
    handle: FormatHandle<CdfNative>,
    layouts: Vec<CdfVarLayout>,
}

impl CdfOpenFile {
    pub fn layout(&self, var: VarId) -> Option<&CdfVarLayout> {
        let model = self.handle.model().ok()?;
        self.layouts.get(model.var(var)?.locator)
    }
}

impl OpenFile for CdfOpenFile {
    fn inq_format(&self) -> FormatKind {
        FormatKind::Cdf
    }

    fn model(&self) -> Result<&FileModel> {
        self.handle.model()
    }

    fn close(&mut self) -> Result<()> {
        self.handle.close()
    }

    fn abort(&mut self) -> Result<()> {
        self.handle.abort()
    }

    fn byte_order(&self) -> Result<Endianness> {
        self.handle.byte_order()
    }

    fn get_vara(
        &mut self,
        var: VarId,
        start: &[usize],
        count: &[usize],
        mem_type: Option<NcType>,
    ) -> Result<VarData> {
        let (model, native) = self.handle.parts_mut()?;
        let variable = model
            .var(var)
            .ok_or_else(|| AdapterError::invalid(format!("no variable with id {}", var.0)))?;
        let nc_type = variable.nc_type;
        let layout = self
            .layouts
            .get(variable.locator)
            .ok_or_else(|| AdapterError::invalid(format!("no layout for '{}'", variable.name)))?;
        let shape = model
            .var_shape(var)
            .ok_or_else(|| AdapterError::invalid("variable shape unavailable"))?;
        validate_hyperslab(&shape, start, count)?;

        let mut source = CdfSource::new(native.0.as_mut(), layout);
        let raw = if layout.record_varying {
            read_records(&mut source, start, count)?
        } else {
            read_elements(&mut source, start, count)?
        };
        VarData::from_raw(raw, nc_type, mem_type, count.to_vec())
    }
}
