use crate::error::{AdapterError, Result};
use crate::hyperslab::{ElementSource, RecordSource};
use crate::native::CdfFile;

use super::LIBRARY;
use super::metadata::CdfVarLayout;

/// Serves elements of one zVariable.
///
/// Native reads return a whole value; for multi-element values the last
/// value read is kept so that walking its elements costs one read.
pub struct CdfSource<'a> {
    file: &'a mut dyn CdfFile,
    layout: &'a CdfVarLayout,
    value: Vec<u8>,
    cached: Option<(usize, Vec<usize>)>,
}

impl<'a> CdfSource<'a> {
    pub fn new(file: &'a mut dyn CdfFile, layout: &'a CdfVarLayout) -> Self {
        Self {
            file,
            layout,
            value: vec![0; layout.value_bytes()],
            cached: None,
        }
    }
}

impl RecordSource for CdfSource<'_> {
    fn element_size(&self) -> usize {
        self.layout.element_size
    }

    fn read_record_element(
        &mut self,
        record: usize,
        indices: &[usize],
        out: &mut [u8],
    ) -> Result<()> {
        let (dim_indices, elem) = if self.layout.has_elem_axis {
            match indices.split_last() {
                Some((&elem, rest)) => (rest, elem),
                None => return Err(AdapterError::invalid("missing element index")),
            }
        } else {
            (indices, 0)
        };

        let hit = matches!(&self.cached, Some((r, idx)) if *r == record && idx == dim_indices);
        if !hit {
            self.cached = None;
            self.file
                .get_zvar_value(self.layout.native_index, record, dim_indices, &mut self.value)
                .map_err(|e| AdapterError::native(LIBRARY, e))?;
            self.cached = Some((record, dim_indices.to_vec()));
        }

        let size = self.layout.element_size;
        let src = self
            .value
            .get(elem * size..(elem + 1) * size)
            .ok_or_else(|| AdapterError::invalid(format!("element {} outside value", elem)))?;
        out.copy_from_slice(src);
        Ok(())
    }
}

/// Variables without a record axis always live in record 0.
impl ElementSource for CdfSource<'_> {
    fn element_size(&self) -> usize {
        self.layout.element_size
    }

    fn read_element(&mut self, coord: &[usize], out: &mut [u8]) -> Result<()> {
        self.read_record_element(0, coord, out)
    }
}
