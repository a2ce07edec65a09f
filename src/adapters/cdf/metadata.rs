//! CDF header walk: zVariables, their synthesized dimensions, and
//! attributes.
//!
//! Dimensions are named after the variable that declares them:
//! `<var>_rec` for the record axis of a record-varying variable,
//! `<var>_dim<d>` for its `d`-th array axis and `<var>_strlen` (character
//! data) or `<var>_nelems` (other types) for multi-element values. Since `d`
//! is numeric and the suffixes differ, no two variables can produce the same
//! dimension name.

use nep_model::{Attribute, FileModel, ModelBuilder, NcType};

use crate::error::{AdapterError, NativeError, Result};
use crate::native::{AttrScope, CdfAttrEntry, CdfFile};
use crate::types::cdf::map_cdf_type;

use super::LIBRARY;

/// How one variable is laid out natively.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CdfVarLayout {
    /// zVariable number in the file
    pub native_index: usize,
    pub record_varying: bool,
    /// Elements per native value
    pub num_elems: usize,
    /// Bytes per element
    pub element_size: usize,
    /// Whether the innermost model axis walks the elements of one value
    pub has_elem_axis: bool,
}

impl CdfVarLayout {
    pub fn value_bytes(&self) -> usize {
        self.num_elems * self.element_size
    }
}

fn native<T>(result: std::result::Result<T, NativeError>) -> Result<T> {
    result.map_err(|e| AdapterError::native(LIBRARY, e))
}

/// Walk the header and build the model. The returned layouts are indexed by
/// each variable's `locator`.
pub fn extract(file: &mut dyn CdfFile) -> Result<(FileModel, Vec<CdfVarLayout>)> {
    let mut builder = ModelBuilder::new();
    let mut layouts = Vec::new();

    let nvars = native(file.num_zvars())?;
    for index in 0..nvars {
        let info = native(file.zvar_inquire(index))?;
        let mapping = map_cdf_type(info.data_type)?;

        let mut dims = Vec::with_capacity(info.dim_sizes.len() + 2);
        if info.record_varying {
            dims.push(builder.dim_or_insert(format!("{}_rec", info.name), info.num_records())?);
        }
        for (d, size) in info.dim_sizes.iter().enumerate() {
            dims.push(builder.dim_or_insert(format!("{}_dim{}", info.name, d), *size)?);
        }
        let num_elems = info.num_elems.max(1);
        let has_elem_axis = num_elems > 1;
        if has_elem_axis {
            let suffix = if mapping.nc_type.is_char() {
                "strlen"
            } else {
                "nelems"
            };
            dims.push(builder.dim_or_insert(format!("{}_{}", info.name, suffix), num_elems)?);
        }

        builder.add_var(info.name.as_str(), mapping.nc_type, dims, layouts.len())?;
        log::trace!(
            "CDF: zVariable {} '{}' as {} ({}), dims {:?}, records {}",
            index,
            info.name,
            mapping.nc_type,
            mapping.name,
            info.dim_sizes,
            info.num_records()
        );
        layouts.push(CdfVarLayout {
            native_index: index,
            record_varying: info.record_varying,
            num_elems,
            element_size: mapping.size,
            has_elem_axis,
        });
    }

    let nattrs = native(file.num_attrs())?;
    for attr in 0..nattrs {
        let info = native(file.attr_inquire(attr))?;
        match info.scope {
            AttrScope::Global => {
                let entries = native(file.attr_gentries(attr))?;
                builder.add_global_att(merge_entries(&info.name, &entries)?)?;
            }
            AttrScope::Variable => {
                for (var, layout) in layouts.iter().enumerate() {
                    if let Some(entry) = native(file.attr_zentry(attr, layout.native_index))? {
                        let att = entry_attribute(&info.name, &entry)?;
                        builder.add_var_att(nep_model::VarId(var), att)?;
                    }
                }
            }
        }
    }

    Ok((builder.finish(), layouts))
}

/// Check an entry's size and wrap it as an attribute.
fn entry_attribute(name: &str, entry: &CdfAttrEntry) -> Result<Attribute> {
    let mapping = map_cdf_type(entry.data_type)?;
    if entry.bytes.len() != entry.num_elems * mapping.size {
        return Err(AdapterError::native(
            LIBRARY,
            NativeError::new(format!(
                "attribute '{}' entry holds {} bytes for {} {} elements",
                name,
                entry.bytes.len(),
                entry.num_elems,
                mapping.name
            )),
        ));
    }
    Ok(Attribute::new(name, mapping.nc_type, entry.bytes.clone())?)
}

/// Fold the gEntries of one global attribute into a single value.
///
/// Entries of the first entry's type are concatenated, text entries joined by
/// newlines. Entries of any other type are dropped with a warning.
fn merge_entries(name: &str, entries: &[CdfAttrEntry]) -> Result<Attribute> {
    let Some((first, rest)) = entries.split_first() else {
        return Ok(Attribute::text(name, "")?);
    };
    let first_att = entry_attribute(name, first)?;
    if rest.is_empty() {
        return Ok(first_att);
    }

    let nc_type = first_att.nc_type();
    let mut bytes = first_att.bytes().to_vec();
    for entry in rest {
        let att = entry_attribute(name, entry)?;
        if att.nc_type() != nc_type {
            log::warn!(
                "CDF: attribute '{}' mixes {} and {} entries; keeping {} only",
                name,
                nc_type,
                att.nc_type(),
                nc_type
            );
            continue;
        }
        if nc_type == NcType::Char {
            bytes.push(b'\n');
        }
        bytes.extend_from_slice(att.bytes());
    }
    Ok(Attribute::new(name, nc_type, bytes)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::cdf::{CDF_CHAR, CDF_INT2, CDF_REAL8};

    fn text(s: &str) -> CdfAttrEntry {
        CdfAttrEntry {
            data_type: CDF_CHAR,
            num_elems: s.len(),
            bytes: s.as_bytes().to_vec(),
        }
    }

    #[test]
    fn test_merge_text_entries() {
        let att = merge_entries("history", &[text("a"), text("bc")]).unwrap();
        assert_eq!(att.as_text().as_deref(), Some("a\nbc"));
    }

    #[test]
    fn test_merge_drops_foreign_types() {
        let short = CdfAttrEntry {
            data_type: CDF_INT2,
            num_elems: 1,
            bytes: 7i16.to_ne_bytes().to_vec(),
        };
        let att = merge_entries("x", &[short.clone(), text("zz"), short]).unwrap();
        assert_eq!(att.values::<i16>(), Some(vec![7, 7]));
    }

    #[test]
    fn test_empty_attribute() {
        let att = merge_entries("empty", &[]).unwrap();
        assert_eq!(att.nc_type(), NcType::Char);
        assert!(att.is_empty());
    }

    #[test]
    fn test_entry_size_checked() {
        let bad = CdfAttrEntry {
            data_type: CDF_REAL8,
            num_elems: 2,
            bytes: vec![0; 8],
        };
        let err = entry_attribute("x", &bad).unwrap_err();
        assert!(matches!(err, AdapterError::NativeLibrary { .. }));
    }
}
