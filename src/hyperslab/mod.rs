//! Hyperslab reads assembled from single-element native reads.
//!
//! A request is validated against the variable's shape before any native call
//! is made. The box is then walked with an [`Odometer`] and each coordinate is
//! fetched from an [`ElementSource`] (or a [`RecordSource`] whose outermost
//! axis is the native record number) straight into the next output slot.

pub mod odometer;

pub use odometer::Odometer;

use ndarray::{ArrayD, IxDyn};
use nep_model::{NativeType, NcType};

use crate::convert::convert;
use crate::error::{AdapterError, Result};

/// Native access to single elements of one variable.
pub trait ElementSource {
    /// Bytes per element as written to the output buffer.
    fn element_size(&self) -> usize;

    /// Read the element at `coord` into `out`, which is `element_size` long.
    fn read_element(&mut self, coord: &[usize], out: &mut [u8]) -> Result<()>;
}

/// Native access to elements addressed by record number plus the indices of
/// the remaining axes.
pub trait RecordSource {
    fn element_size(&self) -> usize;

    fn read_record_element(
        &mut self,
        record: usize,
        indices: &[usize],
        out: &mut [u8],
    ) -> Result<()>;
}

/// Check a `(start, count)` request against a variable's shape.
pub fn validate_hyperslab(shape: &[usize], start: &[usize], count: &[usize]) -> Result<()> {
    if start.len() != shape.len() || count.len() != shape.len() {
        return Err(AdapterError::invalid(format!(
            "variable has {} dimensions, got {} start and {} count values",
            shape.len(),
            start.len(),
            count.len()
        )));
    }
    for (axis, ((len, s), c)) in shape.iter().zip(start).zip(count).enumerate() {
        if *c == 0 {
            return Err(AdapterError::invalid(format!("count is zero on axis {}", axis)));
        }
        match s.checked_add(*c) {
            Some(end) if end <= *len => {}
            _ => {
                return Err(AdapterError::invalid(format!(
                    "axis {}: start {} + count {} exceeds length {}",
                    axis, s, c, len
                )));
            }
        }
    }
    Ok(())
}

/// Total element count of a validated request.
fn element_count(count: &[usize], element_size: usize) -> Result<usize> {
    count
        .iter()
        .try_fold(1usize, |acc, c| acc.checked_mul(*c))
        .filter(|total| total.checked_mul(element_size).is_some())
        .ok_or_else(|| AdapterError::invalid("requested hyperslab is too large"))
}

/// Read a box element by element in row-major order.
pub fn read_elements<S: ElementSource + ?Sized>(
    source: &mut S,
    start: &[usize],
    count: &[usize],
) -> Result<Vec<u8>> {
    let size = source.element_size();
    let total = element_count(count, size)?;
    let mut out = vec![0u8; total * size];
    let mut slots = out.chunks_exact_mut(size);
    for coord in Odometer::new(start, count) {
        let Some(slot) = slots.next() else {
            break;
        };
        source.read_element(&coord, slot)?;
    }
    Ok(out)
}

/// Read a box whose outermost axis is a record axis. Each record is read in
/// turn and the remaining axes are walked within it.
pub fn read_records<S: RecordSource + ?Sized>(
    source: &mut S,
    start: &[usize],
    count: &[usize],
) -> Result<Vec<u8>> {
    let Some((&first_record, inner_start)) = start.split_first() else {
        return Err(AdapterError::invalid("record read on a scalar variable"));
    };
    let Some((&records, inner_count)) = count.split_first() else {
        return Err(AdapterError::invalid("record read on a scalar variable"));
    };

    let size = source.element_size();
    let total = element_count(count, size)?;
    let mut out = vec![0u8; total * size];
    let mut slots = out.chunks_exact_mut(size);
    for record in first_record..first_record + records {
        for indices in Odometer::new(inner_start, inner_count) {
            let Some(slot) = slots.next() else {
                break;
            };
            source.read_record_element(record, &indices, slot)?;
        }
    }
    Ok(out)
}

/// Result of a hyperslab read.
#[derive(Debug, Clone, PartialEq)]
pub struct VarData {
    /// Element type of `bytes`
    pub nc_type: NcType,
    /// Per-axis counts of the request
    pub shape: Vec<usize>,
    /// Host-order elements in row-major order
    pub bytes: Vec<u8>,
    /// Elements clamped while converting to the requested type
    pub range_errors: usize,
}

impl VarData {
    /// Wrap raw bytes in the variable's type, converting once if another
    /// type was requested.
    pub fn from_raw(
        raw: Vec<u8>,
        var_type: NcType,
        requested: Option<NcType>,
        shape: Vec<usize>,
    ) -> Result<Self> {
        match requested {
            Some(to) if to != var_type => {
                let conversion = convert(&raw, var_type, to)?;
                Ok(Self {
                    nc_type: to,
                    shape,
                    bytes: conversion.bytes,
                    range_errors: conversion.range_errors,
                })
            }
            _ => Ok(Self {
                nc_type: var_type,
                shape,
                bytes: raw,
                range_errors: 0,
            }),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len() / self.nc_type.size()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Typed values, when `T` is the buffer's element type.
    pub fn values<T: NativeType>(&self) -> Result<Vec<T>> {
        if T::NC_TYPE != self.nc_type {
            return Err(AdapterError::invalid(format!(
                "buffer holds {} values, not {}",
                self.nc_type,
                T::NC_TYPE
            )));
        }
        Ok(T::from_ne_slice(&self.bytes))
    }

    pub fn to_array<T: NativeType>(&self) -> Result<ArrayD<T>> {
        let values = self.values::<T>()?;
        ArrayD::from_shape_vec(IxDyn(&self.shape), values)
            .map_err(|e| AdapterError::invalid(format!("shape mismatch: {}", e)))
    }

    /// Character data as text, for char variables.
    pub fn as_text(&self) -> Option<String> {
        self.nc_type
            .is_char()
            .then(|| String::from_utf8_lossy(&self.bytes).into_owned())
    }
}
