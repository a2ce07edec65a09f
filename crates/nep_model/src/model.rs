//! Dimensions, variables and the frozen per-file model.

use crate::attribute::Attribute;
use crate::error::{ModelError, Result};
use crate::types::NcType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DimId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct VarId(pub usize);

/// A named fixed-length axis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dimension {
    pub name: String,
    pub len: usize,
}

impl Dimension {
    /// Adapter-backed files never grow, so no dimension is unlimited.
    pub fn is_unlimited(&self) -> bool {
        false
    }
}

/// A typed n-dimensional variable.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    pub name: String,
    pub nc_type: NcType,
    pub dim_ids: Vec<DimId>,
    pub attributes: Vec<Attribute>,
    /// Adapter-private index of the backing native object.
    pub locator: usize,
}

impl Variable {
    pub fn ndims(&self) -> usize {
        self.dim_ids.len()
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.iter().find(|a| a.name() == name)
    }
}

/// Immutable description of one open file.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileModel {
    dims: Vec<Dimension>,
    vars: Vec<Variable>,
    global_atts: Vec<Attribute>,
}

impl FileModel {
    pub fn dims(&self) -> &[Dimension] {
        &self.dims
    }

    pub fn vars(&self) -> &[Variable] {
        &self.vars
    }

    pub fn global_atts(&self) -> &[Attribute] {
        &self.global_atts
    }

    pub fn ndims(&self) -> usize {
        self.dims.len()
    }

    pub fn nvars(&self) -> usize {
        self.vars.len()
    }

    pub fn ngatts(&self) -> usize {
        self.global_atts.len()
    }

    pub fn dim(&self, id: DimId) -> Option<&Dimension> {
        self.dims.get(id.0)
    }

    pub fn dim_id(&self, name: &str) -> Option<DimId> {
        self.dims.iter().position(|d| d.name == name).map(DimId)
    }

    pub fn var(&self, id: VarId) -> Option<&Variable> {
        self.vars.get(id.0)
    }

    pub fn var_id(&self, name: &str) -> Option<VarId> {
        self.vars.iter().position(|v| v.name == name).map(VarId)
    }

    pub fn global_att(&self, name: &str) -> Option<&Attribute> {
        self.global_atts.iter().find(|a| a.name() == name)
    }

    /// Dimension lengths of a variable in declaration order.
    pub fn var_shape(&self, id: VarId) -> Option<Vec<usize>> {
        let var = self.var(id)?;
        var.dim_ids
            .iter()
            .map(|d| self.dim(*d).map(|dim| dim.len))
            .collect()
    }
}

/// Accumulates a [`FileModel`]. Nothing is visible to the host until
/// [`ModelBuilder::finish`] is called, so a failed extraction simply drops the
/// builder.
#[derive(Debug, Default)]
pub struct ModelBuilder {
    model: FileModel,
}

impl ModelBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_dim(&mut self, name: impl Into<String>, len: usize) -> Result<DimId> {
        let name = name.into();
        if name.is_empty() {
            return Err(ModelError::EmptyName { kind: "dimension" });
        }
        if self.model.dim_id(&name).is_some() {
            return Err(ModelError::DuplicateName {
                kind: "dimension",
                name,
            });
        }
        self.model.dims.push(Dimension { name, len });
        Ok(DimId(self.model.dims.len() - 1))
    }

    /// Reuse a same-named dimension of the same length, or define it.
    pub fn dim_or_insert(&mut self, name: impl Into<String>, len: usize) -> Result<DimId> {
        let name = name.into();
        match self.model.dim_id(&name) {
            Some(id) => {
                let existing = self.model.dims[id.0].len;
                if existing != len {
                    return Err(ModelError::DimensionLengthMismatch {
                        name,
                        existing,
                        requested: len,
                    });
                }
                Ok(id)
            }
            None => self.add_dim(name, len),
        }
    }

    pub fn add_var(
        &mut self,
        name: impl Into<String>,
        nc_type: NcType,
        dim_ids: Vec<DimId>,
        locator: usize,
    ) -> Result<VarId> {
        let name = name.into();
        if name.is_empty() {
            return Err(ModelError::EmptyName { kind: "variable" });
        }
        if self.model.var_id(&name).is_some() {
            return Err(ModelError::DuplicateName {
                kind: "variable",
                name,
            });
        }
        if let Some(bad) = dim_ids.iter().find(|d| d.0 >= self.model.dims.len()) {
            return Err(ModelError::UnknownDimension(bad.0));
        }
        self.model.vars.push(Variable {
            name,
            nc_type,
            dim_ids,
            attributes: Vec::new(),
            locator,
        });
        Ok(VarId(self.model.vars.len() - 1))
    }

    pub fn add_global_att(&mut self, att: Attribute) -> Result<()> {
        if self.model.global_att(att.name()).is_some() {
            return Err(ModelError::DuplicateName {
                kind: "attribute",
                name: att.name().to_string(),
            });
        }
        self.model.global_atts.push(att);
        Ok(())
    }

    pub fn add_var_att(&mut self, var: VarId, att: Attribute) -> Result<()> {
        let target = self
            .model
            .vars
            .get_mut(var.0)
            .ok_or(ModelError::UnknownVariable(var.0))?;
        if target.attribute(att.name()).is_some() {
            return Err(ModelError::DuplicateName {
                kind: "attribute",
                name: att.name().to_string(),
            });
        }
        target.attributes.push(att);
        Ok(())
    }

    pub fn finish(self) -> FileModel {
        log::debug!(
            "Model finished: {} dims, {} vars, {} global attributes",
            self.model.ndims(),
            self.model.nvars(),
            self.model.ngatts()
        );
        self.model
    }
}
