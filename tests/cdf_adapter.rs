mod common;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use common::*;
use nep::config::AdapterConfig;
use nep::native::{AttrScope, CdfAttrEntry, CdfAttrInfo, CdfFile, CdfLibrary, CdfVarInfo};
use nep::nep_model::NcType;
use nep::types::cdf::{CDF_CHAR, CDF_EPOCH16, CDF_INT4, CDF_REAL4, CDF_TIME_TT2000};
use nep::{AdapterError, AdapterRegistry, Endianness, ErrorKind, FormatKind, NativeError, OpenMode, Session};
use tempfile::TempDir;

#[derive(Default)]
struct Stats {
    opens: AtomicUsize,
    closes: AtomicUsize,
    reads: AtomicUsize,
}

impl Stats {
    fn get(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

struct FakeVar {
    info: CdfVarInfo,
    value: fn(usize, &[usize]) -> Vec<u8>,
}

struct FakeAttr {
    info: CdfAttrInfo,
    gentries: Vec<CdfAttrEntry>,
    /// `(variable, entry)` pairs for variable-scope attributes
    zentries: Vec<(usize, CdfAttrEntry)>,
}

#[derive(Clone)]
struct FakeLibrary {
    vars: Arc<Vec<FakeVar>>,
    attrs: Arc<Vec<FakeAttr>>,
    stats: Arc<Stats>,
}

struct FakeFile {
    lib: FakeLibrary,
}

impl CdfLibrary for FakeLibrary {
    fn open(&self, path: &Path) -> Result<Box<dyn CdfFile>, NativeError> {
        if path.to_string_lossy().contains("reject") {
            return Err(NativeError::new("not a CDF").with_status(-2006));
        }
        self.stats.opens.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeFile { lib: self.clone() }))
    }
}

impl CdfFile for FakeFile {
    fn num_zvars(&mut self) -> Result<usize, NativeError> {
        Ok(self.lib.vars.len())
    }

    fn zvar_inquire(&mut self, var: usize) -> Result<CdfVarInfo, NativeError> {
        Ok(self.lib.vars[var].info.clone())
    }

    fn num_attrs(&mut self) -> Result<usize, NativeError> {
        Ok(self.lib.attrs.len())
    }

    fn attr_inquire(&mut self, attr: usize) -> Result<CdfAttrInfo, NativeError> {
        Ok(self.lib.attrs[attr].info.clone())
    }

    fn attr_gentries(&mut self, attr: usize) -> Result<Vec<CdfAttrEntry>, NativeError> {
        Ok(self.lib.attrs[attr].gentries.clone())
    }

    fn attr_zentry(&mut self, attr: usize, var: usize) -> Result<Option<CdfAttrEntry>, NativeError> {
        Ok(self.lib.attrs[attr]
            .zentries
            .iter()
            .find(|(v, _)| *v == var)
            .map(|(_, e)| e.clone()))
    }

    fn get_zvar_value(
        &mut self,
        var: usize,
        record: usize,
        indices: &[usize],
        out: &mut [u8],
    ) -> Result<(), NativeError> {
        self.lib.stats.reads.fetch_add(1, Ordering::SeqCst);
        let bytes = (self.lib.vars[var].value)(record, indices);
        out.copy_from_slice(&bytes);
        Ok(())
    }

    fn close(&mut self) -> Result<(), NativeError> {
        self.lib.stats.closes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

fn text(s: &str) -> CdfAttrEntry {
    CdfAttrEntry {
        data_type: CDF_CHAR,
        num_elems: s.len(),
        bytes: s.as_bytes().to_vec(),
    }
}

fn var(
    name: &str,
    data_type: i64,
    num_elems: usize,
    dim_sizes: Vec<usize>,
    max_rec: Option<usize>,
) -> CdfVarInfo {
    CdfVarInfo {
        name: name.to_string(),
        data_type,
        num_elems,
        dim_sizes,
        record_varying: max_rec.is_some(),
        max_rec,
    }
}

/// Two record-varying variables, three global attributes and one
/// variable-scope attribute.
fn magnetometer() -> (Vec<FakeVar>, Vec<FakeAttr>) {
    let vars = vec![
        FakeVar {
            info: var("time", CDF_TIME_TT2000, 1, vec![], Some(3)),
            value: |record, _| (record as i64 * 1000).to_ne_bytes().to_vec(),
        },
        FakeVar {
            info: var("B_field", CDF_REAL4, 1, vec![3], Some(3)),
            value: |record, indices| ((record * 10 + indices[0]) as f32).to_ne_bytes().to_vec(),
        },
    ];
    let attrs = vec![
        FakeAttr {
            info: CdfAttrInfo {
                name: "Project".to_string(),
                scope: AttrScope::Global,
            },
            gentries: vec![text("ISTP"), text("NASA")],
            zentries: vec![],
        },
        FakeAttr {
            info: CdfAttrInfo {
                name: "UNITS".to_string(),
                scope: AttrScope::Variable,
            },
            gentries: vec![],
            zentries: vec![(1, text("nT"))],
        },
        FakeAttr {
            info: CdfAttrInfo {
                name: "Mission".to_string(),
                scope: AttrScope::Global,
            },
            gentries: vec![text("demo")],
            zentries: vec![],
        },
        FakeAttr {
            info: CdfAttrInfo {
                name: "Version".to_string(),
                scope: AttrScope::Global,
            },
            gentries: vec![CdfAttrEntry {
                data_type: CDF_INT4,
                num_elems: 1,
                bytes: 2i32.to_ne_bytes().to_vec(),
            }],
            zentries: vec![],
        },
    ];
    (vars, attrs)
}

fn library(vars: Vec<FakeVar>, attrs: Vec<FakeAttr>) -> FakeLibrary {
    FakeLibrary {
        vars: Arc::new(vars),
        attrs: Arc::new(attrs),
        stats: Arc::new(Stats::default()),
    }
}

fn session_with(lib: &FakeLibrary) -> Session {
    let registry =
        AdapterRegistry::with_config(&AdapterConfig::default(), Some(Arc::new(lib.clone())));
    Session::new(registry)
}

/// A file carrying the v3 uncompressed magic words.
fn write_cdf(dir: &TempDir, name: &str) -> PathBuf {
    let mut bytes = 0xCDF3_0001u32.to_be_bytes().to_vec();
    bytes.extend_from_slice(&0x0000_FFFFu32.to_be_bytes());
    bytes.extend_from_slice(&[0u8; 24]);
    write_bytes(dir, name, &bytes)
}

#[test]
fn test_counts_and_attributes() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let path = write_cdf(&dir, "mag.cdf");
    let (vars, attrs) = magnetometer();
    let lib = library(vars, attrs);
    let mut session = session_with(&lib);

    let id = session.open(&path, OpenMode::ReadOnly).unwrap();
    assert_eq!(session.inq_format(id).unwrap(), FormatKind::Cdf);
    let info = session.inq(id).unwrap();
    assert_eq!(info.nvars, 2);
    assert_eq!(info.ngatts, 3);

    let project = session.get_att(id, None, "Project").unwrap();
    assert_eq!(project.as_text().as_deref(), Some("ISTP\nNASA"));
    assert_eq!(session.get_att_as::<i32>(id, None, "Version").unwrap(), vec![2]);
    assert_eq!(session.get_att_as::<f64>(id, None, "Version").unwrap(), vec![2.0]);
    assert!(session.get_att(id, None, "UNITS").is_err());

    let b_field = session.inq_varid(id, "B_field").unwrap();
    let time = session.inq_varid(id, "time").unwrap();
    let units = session.get_att(id, Some(b_field), "UNITS").unwrap();
    assert_eq!(units.as_text().as_deref(), Some("nT"));
    assert!(session.inq_att(id, Some(time), "UNITS").is_err());
    assert_eq!(
        session.inq_var_endian(id, b_field).unwrap(),
        Endianness::native()
    );

    session.close(id).unwrap();
}

#[test]
fn test_record_dimensions() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let path = write_cdf(&dir, "mag.cdf");
    let (vars, attrs) = magnetometer();
    let lib = library(vars, attrs);
    let mut session = session_with(&lib);
    let id = session.open(&path, OpenMode::ReadOnly).unwrap();

    let time = session.inq_varid(id, "time").unwrap();
    let b_field = session.inq_varid(id, "B_field").unwrap();
    let time_var = session.inq_var(id, time).unwrap();
    assert_eq!(time_var.nc_type, NcType::Int64);
    assert_eq!(time_var.dim_ids.len(), 1);

    let b_var = session.inq_var(id, b_field).unwrap();
    assert_eq!(b_var.nc_type, NcType::Float);
    let rec = session.inq_dimid(id, "B_field_rec").unwrap();
    let axis = session.inq_dimid(id, "B_field_dim0").unwrap();
    assert_eq!(b_var.dim_ids, vec![rec, axis]);
    assert_eq!(session.inq_dim(id, rec).unwrap().len, 4);
    assert_eq!(session.inq_dim(id, axis).unwrap().len, 3);
    assert_eq!(session.inq(id).unwrap().ndims, 3);

    session.close(id).unwrap();
}

#[test]
fn test_record_reads() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let path = write_cdf(&dir, "mag.cdf");
    let (vars, attrs) = magnetometer();
    let lib = library(vars, attrs);
    let mut session = session_with(&lib);
    let id = session.open(&path, OpenMode::ReadOnly).unwrap();

    let b_field = session.inq_varid(id, "B_field").unwrap();
    let slab = session
        .get_vara(id, b_field, &[1, 0], &[2, 3], None)
        .unwrap();
    assert_eq!(
        slab.values::<f32>().unwrap(),
        vec![10.0, 11.0, 12.0, 20.0, 21.0, 22.0]
    );
    assert_eq!(Stats::get(&lib.stats.reads), 6);

    let time = session.inq_varid(id, "time").unwrap();
    let all = session.get_var(id, time, None).unwrap();
    assert_eq!(all.values::<i64>().unwrap(), vec![0, 1000, 2000, 3000]);

    let as_double = session
        .get_vara_array::<f64>(id, b_field, &[3, 2], &[1, 1])
        .unwrap();
    assert_eq!(as_double[[0, 0]], 32.0);

    let before = Stats::get(&lib.stats.reads);
    let err = session
        .get_vara(id, b_field, &[4, 0], &[1, 1], None)
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidRequest);
    assert_eq!(Stats::get(&lib.stats.reads), before);

    session.close(id).unwrap();
}

#[test]
fn test_string_values() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let path = write_cdf(&dir, "labels.cdf");
    let vars = vec![FakeVar {
        info: var("label", CDF_CHAR, 4, vec![2], None),
        value: |_, indices| if indices[0] == 0 { b"abcd".to_vec() } else { b"efgh".to_vec() },
    }];
    let lib = library(vars, vec![]);
    let mut session = session_with(&lib);
    let id = session.open(&path, OpenMode::ReadOnly).unwrap();

    let label = session.inq_varid(id, "label").unwrap();
    let strlen = session.inq_dimid(id, "label_strlen").unwrap();
    assert_eq!(session.inq_dim(id, strlen).unwrap().len, 4);
    assert!(session.inq_dimid(id, "label_rec").is_err());
    assert_eq!(session.inq(id).unwrap().ngatts, 0);

    let data = session.get_var(id, label, None).unwrap();
    assert_eq!(data.shape, vec![2, 4]);
    assert_eq!(data.as_text().as_deref(), Some("abcdefgh"));
    // One native read per string, not per character.
    assert_eq!(Stats::get(&lib.stats.reads), 2);

    let err = session
        .get_vara(id, label, &[0, 0], &[1, 4], Some(NcType::Int))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidRequest);

    session.close(id).unwrap();
}

#[test]
fn test_close_releases_native_handle() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let path = write_cdf(&dir, "mag.cdf");
    let (vars, attrs) = magnetometer();
    let lib = library(vars, attrs);
    let mut session = session_with(&lib);

    let id = session.open(&path, OpenMode::ReadOnly).unwrap();
    // Detection probes with its own open and close.
    assert_eq!(Stats::get(&lib.stats.opens), 2);
    assert_eq!(Stats::get(&lib.stats.closes), 1);

    session.close(id).unwrap();
    assert_eq!(Stats::get(&lib.stats.closes), 2);
    assert!(matches!(session.close(id), Err(AdapterError::BadHandle)));
    assert!(matches!(session.abort(id), Err(AdapterError::BadHandle)));
    assert_eq!(Stats::get(&lib.stats.closes), 2);
}

#[test]
fn test_unsupported_type_rolls_back() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let path = write_cdf(&dir, "epoch16.cdf");
    let vars = vec![FakeVar {
        info: var("Epoch", CDF_EPOCH16, 1, vec![], Some(0)),
        value: |_, _| vec![0; 16],
    }];
    let lib = library(vars, vec![]);
    let mut session = session_with(&lib);

    let err = session.open(&path, OpenMode::ReadOnly).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::UnsupportedType);
    assert_eq!(
        Stats::get(&lib.stats.opens),
        Stats::get(&lib.stats.closes)
    );
    assert_eq!(session.open_count(), 0);
}

#[test]
fn test_detection_declines() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let (vars, attrs) = magnetometer();
    let lib = library(vars, attrs);
    let mut session = session_with(&lib);

    let path = write_bytes(&dir, "fake.cdf", b"CDF? not really, just text");
    let err = session.open(&path, OpenMode::ReadOnly).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotThisFormat);
    assert_eq!(Stats::get(&lib.stats.opens), 0);

    // Magic matches but the library refuses the header.
    let path = write_cdf(&dir, "reject.cdf");
    let err = session.open(&path, OpenMode::ReadOnly).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotThisFormat);
}
