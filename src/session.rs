//! Host-facing facade: open files by path and address them by id.

use std::collections::HashMap;
use std::fmt;
use std::path::Path;

use ndarray::ArrayD;
use nep_model::{Attribute, DimId, Dimension, NativeType, NcType, VarId, Variable};

use crate::convert::convert;
use crate::detect::Endianness;
use crate::dispatch::{FileInfo, FormatKind, OpenFile, OpenMode};
use crate::error::{AdapterError, Result};
use crate::hyperslab::VarData;
use crate::registry::AdapterRegistry;

/// Identifies an open file within a [`Session`]. Ids are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FileId(u32);

impl fmt::Display for FileId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

pub struct Session {
    registry: AdapterRegistry,
    files: HashMap<FileId, Box<dyn OpenFile>>,
    next_id: u32,
}

impl Session {
    pub fn new(registry: AdapterRegistry) -> Self {
        Self {
            registry,
            files: HashMap::new(),
            next_id: 1,
        }
    }

    pub fn registry(&self) -> &AdapterRegistry {
        &self.registry
    }

    /// Number of files currently open.
    pub fn open_count(&self) -> usize {
        self.files.len()
    }

    pub fn open(&mut self, path: impl AsRef<Path>, mode: OpenMode) -> Result<FileId> {
        let path = path.as_ref();
        let id = FileId(self.next_id);
        let next_id = self
            .next_id
            .checked_add(1)
            .ok_or_else(|| AdapterError::invalid("session has run out of file ids"))?;
        let file = self.registry.open(path, mode)?;
        self.next_id = next_id;
        log::debug!("Session: {:?} open as {} ({})", path, id, file.inq_format().name());
        self.files.insert(id, file);
        Ok(id)
    }

    /// Close a file. The id is retired even if the native close fails.
    pub fn close(&mut self, id: FileId) -> Result<()> {
        let mut file = self.files.remove(&id).ok_or(AdapterError::BadHandle)?;
        file.close()
    }

    pub fn abort(&mut self, id: FileId) -> Result<()> {
        let mut file = self.files.remove(&id).ok_or(AdapterError::BadHandle)?;
        file.abort()
    }

    fn file(&self, id: FileId) -> Result<&dyn OpenFile> {
        self.files
            .get(&id)
            .map(|f| f.as_ref())
            .ok_or(AdapterError::BadHandle)
    }

    fn file_mut(&mut self, id: FileId) -> Result<&mut Box<dyn OpenFile>> {
        self.files.get_mut(&id).ok_or(AdapterError::BadHandle)
    }

    pub fn inq_format(&self, id: FileId) -> Result<FormatKind> {
        Ok(self.file(id)?.inq_format())
    }

    pub fn inq(&self, id: FileId) -> Result<FileInfo> {
        self.file(id)?.inq()
    }

    pub fn inq_dim(&self, id: FileId, dim: DimId) -> Result<Dimension> {
        self.file(id)?.inq_dim(dim)
    }

    pub fn inq_dimid(&self, id: FileId, name: &str) -> Result<DimId> {
        self.file(id)?.inq_dimid(name)
    }

    pub fn inq_var(&self, id: FileId, var: VarId) -> Result<Variable> {
        self.file(id)?.inq_var(var)
    }

    pub fn inq_varid(&self, id: FileId, name: &str) -> Result<VarId> {
        self.file(id)?.inq_varid(name)
    }

    pub fn inq_var_endian(&self, id: FileId, var: VarId) -> Result<Endianness> {
        self.file(id)?.inq_var_endian(var)
    }

    /// Type and length of an attribute; `var` of `None` means global.
    pub fn inq_att(&self, id: FileId, var: Option<VarId>, name: &str) -> Result<(NcType, usize)> {
        self.file(id)?.inq_att(var, name)
    }

    pub fn get_att(&self, id: FileId, var: Option<VarId>, name: &str) -> Result<Attribute> {
        self.file(id)?.get_att(var, name)
    }

    /// Attribute values converted to `T`.
    pub fn get_att_as<T: NativeType>(
        &self,
        id: FileId,
        var: Option<VarId>,
        name: &str,
    ) -> Result<Vec<T>> {
        let att = self.get_att(id, var, name)?;
        let converted = convert(att.bytes(), att.nc_type(), T::NC_TYPE)?;
        if converted.range_errors > 0 {
            log::warn!(
                "Session: {} value(s) of attribute '{}' clamped to {}",
                converted.range_errors,
                name,
                T::NC_TYPE
            );
        }
        Ok(T::from_ne_slice(&converted.bytes))
    }

    pub fn get_vara(
        &mut self,
        id: FileId,
        var: VarId,
        start: &[usize],
        count: &[usize],
        mem_type: Option<NcType>,
    ) -> Result<VarData> {
        self.file_mut(id)?.get_vara(var, start, count, mem_type)
    }

    pub fn get_vars(
        &mut self,
        id: FileId,
        var: VarId,
        start: &[usize],
        count: &[usize],
        stride: &[usize],
        mem_type: Option<NcType>,
    ) -> Result<VarData> {
        self.file_mut(id)?
            .get_vars(var, start, count, stride, mem_type)
    }

    /// Read a whole variable.
    pub fn get_var(&mut self, id: FileId, var: VarId, mem_type: Option<NcType>) -> Result<VarData> {
        let shape = {
            let model = self.file(id)?.model()?;
            model
                .var_shape(var)
                .ok_or_else(|| AdapterError::invalid(format!("no variable with id {}", var.0)))?
        };
        let start = vec![0; shape.len()];
        self.get_vara(id, var, &start, &shape, mem_type)
    }

    /// Hyperslab read as an `ndarray` of `T`, converting as needed.
    pub fn get_vara_array<T: NativeType>(
        &mut self,
        id: FileId,
        var: VarId,
        start: &[usize],
        count: &[usize],
    ) -> Result<ArrayD<T>> {
        self.get_vara(id, var, start, count, Some(T::NC_TYPE))?
            .to_array()
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        for (id, mut file) in self.files.drain() {
            log::debug!("Session: closing {} on drop", id);
            if let Err(e) = file.close() {
                log::warn!("Session: close of {} failed: {}", id, e);
            }
        }
    }
}
