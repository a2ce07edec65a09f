//! Registry of format adapters.
//!
//! The registry is assembled once, typically at process start, and is
//! read-only afterwards. Hosts hold it by value or behind an `Arc` and pass it
//! to whatever performs opens; there is no global instance.

use std::path::Path;
use std::sync::Arc;

use crate::adapters::{CdfAdapter, GeoTiffAdapter};
use crate::config::AdapterConfig;
use crate::detect::Detection;
use crate::dispatch::{FormatAdapter, OpenFile, OpenMode};
use crate::error::{AdapterError, Result};
use crate::native::{CdfLibrary, TiffCrateLibrary};

/// Immutable list of adapters, ordered by priority (highest first).
pub struct AdapterRegistry {
    adapters: Vec<Box<dyn FormatAdapter>>,
}

/// Collects adapters before the registry is frozen.
#[derive(Default)]
pub struct RegistryBuilder {
    adapters: Vec<Box<dyn FormatAdapter>>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter. A later adapter with the same id replaces the
    /// earlier one.
    pub fn register(mut self, adapter: Box<dyn FormatAdapter>) -> Self {
        self.adapters.retain(|a| a.id() != adapter.id());
        self.adapters.push(adapter);
        self
    }

    pub fn build(mut self) -> AdapterRegistry {
        // Stable sort keeps registration order for priority ties.
        self.adapters
            .sort_by(|a, b| b.priority().cmp(&a.priority()));
        log::debug!(
            "Adapter registry built with: {:?}",
            self.adapters.iter().map(|a| a.id()).collect::<Vec<_>>()
        );
        AdapterRegistry {
            adapters: self.adapters,
        }
    }
}

impl AdapterRegistry {
    /// Registry with the built-in GeoTIFF adapter and default limits.
    pub fn new() -> Self {
        Self::with_config(&AdapterConfig::default(), None)
    }

    /// Registry honouring the configuration's enabled list and limits. The
    /// CDF adapter is registered only when a CDF library is supplied.
    pub fn with_config(config: &AdapterConfig, cdf: Option<Arc<dyn CdfLibrary>>) -> Self {
        let mut builder = RegistryBuilder::new();
        if config.is_enabled(GeoTiffAdapter::ID) {
            builder = builder.register(Box::new(GeoTiffAdapter::new(
                Arc::new(TiffCrateLibrary),
                config.detection,
                config.read,
            )));
        }
        match cdf {
            Some(library) if config.is_enabled(CdfAdapter::ID) => {
                builder = builder.register(Box::new(CdfAdapter::new(library)));
            }
            Some(_) => log::debug!("CDF library supplied but the cdf adapter is disabled"),
            None if config.is_enabled(CdfAdapter::ID) => {
                log::info!("No CDF library available; CDF files will not be recognised")
            }
            None => {}
        }
        builder.build()
    }

    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Get an adapter by its id.
    pub fn get(&self, id: &str) -> Option<&dyn FormatAdapter> {
        self.adapters
            .iter()
            .find(|a| a.id() == id)
            .map(|a| a.as_ref())
    }

    pub fn ids(&self) -> Vec<&'static str> {
        self.adapters.iter().map(|a| a.id()).collect()
    }

    /// Get all supported file extensions.
    pub fn supported_extensions(&self) -> Vec<&'static str> {
        let mut extensions: Vec<&'static str> = self
            .adapters
            .iter()
            .flat_map(|a| a.extensions().iter().copied())
            .collect();
        extensions.sort();
        extensions.dedup();
        extensions
    }

    /// Adapters in detection order: those claiming the file's extension
    /// first, then the rest, each group by priority.
    fn detection_order(&self, path: &Path) -> Vec<&dyn FormatAdapter> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase());
        let claims = |a: &dyn FormatAdapter| {
            extension
                .as_deref()
                .is_some_and(|ext| a.extensions().iter().any(|e| *e == ext))
        };
        let (mut ordered, rest): (Vec<&dyn FormatAdapter>, Vec<&dyn FormatAdapter>) = self
            .adapters
            .iter()
            .map(|a| a.as_ref())
            .partition(|a| claims(*a));
        ordered.extend(rest);
        ordered
    }

    /// Find the adapter that owns a file.
    ///
    /// Adapters that decline are skipped. When none accepts, the first
    /// malformed-header report is returned, otherwise `NotThisFormat`.
    pub fn detect(&self, path: &Path) -> Result<(&dyn FormatAdapter, Detection)> {
        let mut malformed = None;
        for adapter in self.detection_order(path) {
            match adapter.detect(path) {
                Ok(detection @ Detection::Detected(_)) => {
                    log::debug!("{:?} detected as {}", path, adapter.display_name());
                    return Ok((adapter, detection));
                }
                Ok(Detection::NotThisFormat) => {
                    log::trace!("{} declined {:?}", adapter.id(), path);
                }
                Err(e @ AdapterError::MalformedHeader { .. }) => {
                    log::warn!("{} rejected {:?}: {}", adapter.id(), path, e);
                    malformed.get_or_insert(e);
                }
                Err(e) => return Err(e),
            }
        }
        Err(malformed.unwrap_or(AdapterError::NotThisFormat))
    }

    /// Detect and open a file. Write access is refused before the file is
    /// touched.
    pub fn open(&self, path: &Path, mode: OpenMode) -> Result<Box<dyn OpenFile>> {
        if mode == OpenMode::Write {
            return Err(AdapterError::NotPermitted { operation: "open" });
        }
        let (adapter, detection) = self.detect(path)?;
        match detection {
            Detection::Detected(facts) => adapter.open(path, facts),
            Detection::NotThisFormat => Err(AdapterError::NotThisFormat),
        }
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::new()
    }
}
