//! Per-open-file state shared by every adapter.

use std::path::{Path, PathBuf};

use nep_model::FileModel;

use crate::detect::Endianness;
use crate::error::{AdapterError, Result};

/// A native file handle that must be released exactly once.
pub trait NativeResource {
    fn release(&mut self) -> Result<()>;
}

/// Owns the native handle and the metadata model of one open file.
///
/// `close` and `abort` both release the native handle and drop the model.
/// Once either has run, every further call on the handle, including a second
/// release, fails with [`AdapterError::BadHandle`].
pub struct FormatHandle<N: NativeResource> {
    native: Option<N>,
    model: Option<FileModel>,
    byte_order: Endianness,
    path: PathBuf,
}

impl<N: NativeResource> FormatHandle<N> {
    pub fn new(native: N, model: FileModel, byte_order: Endianness, path: &Path) -> Self {
        Self {
            native: Some(native),
            model: Some(model),
            byte_order,
            path: path.to_path_buf(),
        }
    }

    /// Byte order the file declares. Fails with `BadHandle` once closed.
    pub fn byte_order(&self) -> Result<Endianness> {
        self.model()?;
        Ok(self.byte_order)
    }

    pub fn model(&self) -> Result<&FileModel> {
        self.model.as_ref().ok_or(AdapterError::BadHandle)
    }

    /// Model and native handle together, for reads that need both.
    pub fn parts_mut(&mut self) -> Result<(&FileModel, &mut N)> {
        match (self.model.as_ref(), self.native.as_mut()) {
            (Some(model), Some(native)) => Ok((model, native)),
            _ => Err(AdapterError::BadHandle),
        }
    }

    pub fn close(&mut self) -> Result<()> {
        let mut native = self.native.take().ok_or(AdapterError::BadHandle)?;
        self.model = None;
        log::debug!("Closing {:?}", self.path);
        native.release()
    }

    /// Forced close used on error unwind. Release failures are logged, not
    /// returned, since the caller is already handling an error.
    pub fn abort(&mut self) -> Result<()> {
        let mut native = self.native.take().ok_or(AdapterError::BadHandle)?;
        self.model = None;
        log::debug!("Aborting {:?}", self.path);
        if let Err(e) = native.release() {
            log::warn!("Release during abort of {:?} failed: {}", self.path, e);
        }
        Ok(())
    }
}
