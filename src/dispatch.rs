//! The host dispatch contract.
//!
//! [`FormatAdapter`] is the per-format entry point the registry consults for
//! detection and opening. [`OpenFile`] is the table of operations the host
//! calls on an open file. Adapters implement only lifecycle, model access and
//! the plain hyperslab read; inquiry, strided and mapped reads are composed
//! from those by default methods. Every mutation slot answers
//! [`AdapterError::NotPermitted`] and every slot for a feature the foreign
//! formats cannot express answers [`AdapterError::NotApplicable`], both
//! without side effects.

use std::path::Path;

use nep_model::{Attribute, DimId, Dimension, FileModel, NcType, VarId, Variable};

use crate::detect::{Detection, Endianness, HeaderFacts};
use crate::error::{AdapterError, Result};
use crate::hyperslab::{Odometer, VarData};

/// Access mode requested by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    ReadOnly,
    Write,
}

/// Foreign format family of an open file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FormatKind {
    GeoTiff,
    Cdf,
}

impl FormatKind {
    pub fn name(&self) -> &'static str {
        match self {
            FormatKind::GeoTiff => "GeoTIFF",
            FormatKind::Cdf => "CDF",
        }
    }
}

/// Summary counts of an open file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileInfo {
    pub ndims: usize,
    pub nvars: usize,
    pub ngatts: usize,
    pub unlimdim: Option<DimId>,
}

/// A format adapter known to the registry.
pub trait FormatAdapter: Send + Sync {
    /// Unique identifier for this adapter (e.g., "geotiff", "cdf").
    fn id(&self) -> &'static str;

    /// Human-readable name for log output.
    fn display_name(&self) -> &'static str;

    fn kind(&self) -> FormatKind;

    /// File extensions this adapter usually sees (lowercase, without dots).
    fn extensions(&self) -> &'static [&'static str];

    /// Priority for detection order (higher = checked first).
    fn priority(&self) -> i32 {
        0
    }

    /// Decide whether the file at `path` belongs to this adapter.
    fn detect(&self, path: &Path) -> Result<Detection>;

    /// Open a detected file read-only and extract its metadata.
    fn open(&self, path: &Path, facts: HeaderFacts) -> Result<Box<dyn OpenFile>>;
}

fn not_permitted<T>(operation: &'static str) -> Result<T> {
    Err(AdapterError::NotPermitted { operation })
}

fn not_applicable<T>(operation: &'static str) -> Result<T> {
    Err(AdapterError::NotApplicable { operation })
}

fn var_or_err(model: &FileModel, var: VarId) -> Result<&Variable> {
    model
        .var(var)
        .ok_or_else(|| AdapterError::invalid(format!("no variable with id {}", var.0)))
}

fn att_or_err<'a>(model: &'a FileModel, var: Option<VarId>, name: &str) -> Result<&'a Attribute> {
    let att = match var {
        None => model.global_att(name),
        Some(id) => var_or_err(model, id)?.attribute(name),
    };
    att.ok_or_else(|| AdapterError::invalid(format!("no attribute named '{}'", name)))
}

/// Operations the host performs on one open file.
pub trait OpenFile: Send {
    // ------------------------------------------------------------------
    // Required
    // ------------------------------------------------------------------

    fn inq_format(&self) -> FormatKind;

    /// Metadata extracted at open. Fails with `BadHandle` once closed.
    fn model(&self) -> Result<&FileModel>;

    fn close(&mut self) -> Result<()>;

    fn abort(&mut self) -> Result<()>;

    /// Byte order the file stores values in. Fails with `BadHandle` once
    /// closed.
    fn byte_order(&self) -> Result<Endianness>;

    /// Read the box `start .. start + count` of a variable in row-major
    /// order, converted to `mem_type` when given.
    fn get_vara(
        &mut self,
        var: VarId,
        start: &[usize],
        count: &[usize],
        mem_type: Option<NcType>,
    ) -> Result<VarData>;

    // ------------------------------------------------------------------
    // Inquiry
    // ------------------------------------------------------------------

    fn inq(&self) -> Result<FileInfo> {
        let model = self.model()?;
        Ok(FileInfo {
            ndims: model.ndims(),
            nvars: model.nvars(),
            ngatts: model.ngatts(),
            unlimdim: None,
        })
    }

    fn inq_dim(&self, dim: DimId) -> Result<Dimension> {
        self.model()?
            .dim(dim)
            .cloned()
            .ok_or_else(|| AdapterError::invalid(format!("no dimension with id {}", dim.0)))
    }

    fn inq_dimid(&self, name: &str) -> Result<DimId> {
        self.model()?
            .dim_id(name)
            .ok_or_else(|| AdapterError::invalid(format!("no dimension named '{}'", name)))
    }

    fn inq_var(&self, var: VarId) -> Result<Variable> {
        var_or_err(self.model()?, var).cloned()
    }

    fn inq_varid(&self, name: &str) -> Result<VarId> {
        self.model()?
            .var_id(name)
            .ok_or_else(|| AdapterError::invalid(format!("no variable named '{}'", name)))
    }

    /// Type and length of an attribute. `var` of `None` means global.
    fn inq_att(&self, var: Option<VarId>, name: &str) -> Result<(NcType, usize)> {
        let att = att_or_err(self.model()?, var, name)?;
        Ok((att.nc_type(), att.len()))
    }

    fn inq_attname(&self, var: Option<VarId>, index: usize) -> Result<String> {
        let model = self.model()?;
        let atts = match var {
            None => model.global_atts(),
            Some(id) => var_or_err(model, id)?.attributes.as_slice(),
        };
        atts.get(index)
            .map(|a| a.name().to_string())
            .ok_or_else(|| AdapterError::invalid(format!("no attribute number {}", index)))
    }

    fn get_att(&self, var: Option<VarId>, name: &str) -> Result<Attribute> {
        att_or_err(self.model()?, var, name).cloned()
    }

    /// Every variable of a foreign file shares the file's byte order.
    fn inq_var_endian(&self, var: VarId) -> Result<Endianness> {
        var_or_err(self.model()?, var)?;
        self.byte_order()
    }

    /// Adapter-backed files have fixed-length dimensions only.
    fn inq_unlimdim(&self) -> Result<Option<DimId>> {
        self.model()?;
        Ok(None)
    }

    /// Foreign files form a single root group.
    fn inq_grps(&self) -> Result<usize> {
        self.model()?;
        Ok(0)
    }

    // ------------------------------------------------------------------
    // Composed reads
    // ------------------------------------------------------------------

    /// Strided read composed from plain hyperslab reads: one read per
    /// innermost run when the innermost stride is 1, else one per element.
    fn get_vars(
        &mut self,
        var: VarId,
        start: &[usize],
        count: &[usize],
        stride: &[usize],
        mem_type: Option<NcType>,
    ) -> Result<VarData> {
        let (nc_type, shape) = {
            let model = self.model()?;
            let variable = var_or_err(model, var)?;
            let shape = model
                .var_shape(var)
                .ok_or_else(|| AdapterError::invalid("variable shape unavailable"))?;
            (variable.nc_type, shape)
        };
        if stride.len() != shape.len() || start.len() != shape.len() || count.len() != shape.len() {
            return Err(AdapterError::invalid("start, count and stride must match the variable rank"));
        }
        if stride.iter().all(|s| *s == 1) {
            return self.get_vara(var, start, count, mem_type);
        }
        for axis in 0..shape.len() {
            if stride[axis] == 0 || count[axis] == 0 {
                return Err(AdapterError::invalid(format!("zero stride or count on axis {}", axis)));
            }
            let last = (count[axis] - 1)
                .checked_mul(stride[axis])
                .and_then(|span| span.checked_add(start[axis]));
            if last.is_none_or(|l| l >= shape[axis]) {
                return Err(AdapterError::invalid(format!(
                    "axis {}: strided selection exceeds length {}",
                    axis, shape[axis]
                )));
            }
        }

        let Some((&inner_count, outer_count)) = count.split_last() else {
            return self.get_vara(var, start, count, mem_type);
        };
        let inner_axis = outer_count.len();
        let contiguous_inner = stride[inner_axis] == 1;
        let mut raw = Vec::new();
        for outer in Odometer::new(&vec![0; outer_count.len()], outer_count) {
            let mut at: Vec<usize> = outer
                .iter()
                .enumerate()
                .map(|(axis, i)| start[axis] + i * stride[axis])
                .collect();
            at.push(start[inner_axis]);
            if contiguous_inner {
                let mut run = vec![1; inner_axis];
                run.push(inner_count);
                raw.extend(self.get_vara(var, &at, &run, None)?.bytes);
            } else {
                let one = vec![1; shape.len()];
                for i in 0..inner_count {
                    at[inner_axis] = start[inner_axis] + i * stride[inner_axis];
                    raw.extend(self.get_vara(var, &at, &one, None)?.bytes);
                }
            }
        }
        VarData::from_raw(raw, nc_type, mem_type, count.to_vec())
    }

    /// Mapped read: a strided read whose elements are placed at
    /// `sum(index[d] * imap[d])` in the output, in elements.
    fn get_varm(
        &mut self,
        var: VarId,
        start: &[usize],
        count: &[usize],
        stride: &[usize],
        imap: &[usize],
        mem_type: Option<NcType>,
    ) -> Result<VarData> {
        if imap.len() != count.len() {
            return Err(AdapterError::invalid("imap must match the variable rank"));
        }
        let data = self.get_vars(var, start, count, stride, mem_type)?;
        let size = data.nc_type.size();
        let zero = vec![0; count.len()];
        let offsets: Vec<usize> = Odometer::new(&zero, count)
            .map(|idx| idx.iter().zip(imap).map(|(i, m)| i * m).sum())
            .collect();
        let len = offsets.iter().max().map_or(0, |m| m + 1);
        let mut bytes = vec![0u8; len * size];
        for (offset, element) in offsets.iter().zip(data.bytes.chunks_exact(size)) {
            bytes[offset * size..(offset + 1) * size].copy_from_slice(element);
        }
        Ok(VarData {
            nc_type: data.nc_type,
            shape: vec![len],
            bytes,
            range_errors: data.range_errors,
        })
    }

    // ------------------------------------------------------------------
    // Mutation: not permitted on read-only files
    // ------------------------------------------------------------------

    fn redef(&mut self) -> Result<()> {
        not_permitted("redef")
    }

    fn enddef(&mut self) -> Result<()> {
        not_permitted("enddef")
    }

    fn sync(&mut self) -> Result<()> {
        not_permitted("sync")
    }

    fn set_fill(&mut self, _fill: bool) -> Result<bool> {
        not_permitted("set_fill")
    }

    fn def_dim(&mut self, _name: &str, _len: usize) -> Result<DimId> {
        not_permitted("def_dim")
    }

    fn rename_dim(&mut self, _dim: DimId, _name: &str) -> Result<()> {
        not_permitted("rename_dim")
    }

    fn def_var(&mut self, _name: &str, _nc_type: NcType, _dims: &[DimId]) -> Result<VarId> {
        not_permitted("def_var")
    }

    fn rename_var(&mut self, _var: VarId, _name: &str) -> Result<()> {
        not_permitted("rename_var")
    }

    fn put_att(&mut self, _var: Option<VarId>, _att: Attribute) -> Result<()> {
        not_permitted("put_att")
    }

    fn rename_att(&mut self, _var: Option<VarId>, _name: &str, _new_name: &str) -> Result<()> {
        not_permitted("rename_att")
    }

    fn del_att(&mut self, _var: Option<VarId>, _name: &str) -> Result<()> {
        not_permitted("del_att")
    }

    fn put_vara(&mut self, _var: VarId, _start: &[usize], _count: &[usize], _data: &[u8]) -> Result<()> {
        not_permitted("put_vara")
    }

    fn put_vars(
        &mut self,
        _var: VarId,
        _start: &[usize],
        _count: &[usize],
        _stride: &[usize],
        _data: &[u8],
    ) -> Result<()> {
        not_permitted("put_vars")
    }

    fn def_var_fill(&mut self, _var: VarId, _no_fill: bool, _fill: Option<&[u8]>) -> Result<()> {
        not_permitted("def_var_fill")
    }

    // ------------------------------------------------------------------
    // Features the foreign data models cannot express
    // ------------------------------------------------------------------

    fn def_grp(&mut self, _name: &str) -> Result<usize> {
        not_applicable("def_grp")
    }

    fn rename_grp(&mut self, _grp: usize, _name: &str) -> Result<()> {
        not_applicable("rename_grp")
    }

    fn def_compound(&mut self, _size: usize, _name: &str) -> Result<usize> {
        not_applicable("def_compound")
    }

    fn def_vlen(&mut self, _name: &str, _base: NcType) -> Result<usize> {
        not_applicable("def_vlen")
    }

    fn def_enum(&mut self, _base: NcType, _name: &str) -> Result<usize> {
        not_applicable("def_enum")
    }

    fn def_opaque(&mut self, _size: usize, _name: &str) -> Result<usize> {
        not_applicable("def_opaque")
    }

    fn def_var_deflate(&mut self, _var: VarId, _shuffle: bool, _level: Option<u8>) -> Result<()> {
        not_applicable("def_var_deflate")
    }

    fn def_var_fletcher32(&mut self, _var: VarId, _enabled: bool) -> Result<()> {
        not_applicable("def_var_fletcher32")
    }

    fn def_var_chunking(&mut self, _var: VarId, _chunks: Option<&[usize]>) -> Result<()> {
        not_applicable("def_var_chunking")
    }

    fn def_var_endian(&mut self, _var: VarId, _endian: Endianness) -> Result<()> {
        not_applicable("def_var_endian")
    }

    fn def_var_filter(&mut self, _var: VarId, _filter_id: u32, _params: &[u32]) -> Result<()> {
        not_applicable("def_var_filter")
    }

    fn set_var_chunk_cache(&mut self, _var: VarId, _size: usize, _nelems: usize, _preemption: f32) -> Result<()> {
        not_applicable("set_var_chunk_cache")
    }

    fn def_var_quantize(&mut self, _var: VarId, _mode: i32, _nsd: i32) -> Result<()> {
        not_applicable("def_var_quantize")
    }

    fn var_par_access(&mut self, _var: VarId, _collective: bool) -> Result<()> {
        not_applicable("var_par_access")
    }
}
