mod common;

use std::sync::Arc;

use common::*;
use nep::nep_model::NcType;
use nep::{AdapterError, AdapterRegistry, Endianness, ErrorKind, FormatKind, OpenMode, Session};
use tempfile::TempDir;

#[test]
fn test_tall_single_band_layout() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let path = write_gray16(&dir, "tall.tif", 250, 4800);

    let mut session = Session::new(AdapterRegistry::new());
    let id = session.open(&path, OpenMode::ReadOnly).unwrap();
    assert_eq!(session.inq_format(id).unwrap(), FormatKind::GeoTiff);

    let info = session.inq(id).unwrap();
    assert_eq!(info.ndims, 2);
    assert_eq!(info.nvars, 1);
    assert_eq!(info.unlimdim, None);

    let y = session.inq_dimid(id, "y").unwrap();
    let x = session.inq_dimid(id, "x").unwrap();
    assert_eq!(session.inq_dim(id, y).unwrap().len, 4800);
    assert_eq!(session.inq_dim(id, x).unwrap().len, 250);

    let data = session.inq_varid(id, "data").unwrap();
    let var = session.inq_var(id, data).unwrap();
    assert_eq!(var.nc_type, NcType::UShort);
    assert_eq!(var.dim_ids, vec![y, x]);
    assert_eq!(session.inq_var_endian(id, data).unwrap(), Endianness::Little);

    session.close(id).unwrap();
    assert!(matches!(
        session.inq_var_endian(id, data),
        Err(AdapterError::BadHandle)
    ));
}

#[test]
fn test_hyperslab_row_major() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let path = write_gray16(&dir, "block.tif", 250, 4800);

    let mut session = Session::new(AdapterRegistry::new());
    let id = session.open(&path, OpenMode::ReadOnly).unwrap();
    let data = session.inq_varid(id, "data").unwrap();

    let block = session
        .get_vara(id, data, &[100, 10], &[3, 4], None)
        .unwrap();
    assert_eq!(block.shape, vec![3, 4]);
    let expected: Vec<u16> = (100..103)
        .flat_map(|y| (10..14).map(move |x| gray16_value(y, x)))
        .collect();
    assert_eq!(block.values::<u16>().unwrap(), expected);

    // Last row of the image.
    let row = session
        .get_vara(id, data, &[4799, 0], &[1, 250], None)
        .unwrap();
    let expected: Vec<u16> = (0..250).map(|x| gray16_value(4799, x)).collect();
    assert_eq!(row.values::<u16>().unwrap(), expected);

    session.close(id).unwrap();
}

#[test]
fn test_three_band_layout() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let path = write_rgb8(&dir, "rgb.tif", 6, 5);

    let mut session = Session::new(AdapterRegistry::new());
    let id = session.open(&path, OpenMode::ReadOnly).unwrap();
    let data = session.inq_varid(id, "data").unwrap();
    let var = session.inq_var(id, data).unwrap();
    assert_eq!(var.nc_type, NcType::UByte);

    let band = session.inq_dimid(id, "band").unwrap();
    assert_eq!(session.inq_dim(id, band).unwrap().len, 3);
    assert_eq!(var.dim_ids[0], band);

    let slab = session
        .get_vara(id, data, &[0, 1, 2], &[3, 2, 3], None)
        .unwrap();
    let mut expected = Vec::new();
    for b in 0..3 {
        for y in 1..3 {
            for x in 2..5 {
                expected.push(rgb_value(b, y, x));
            }
        }
    }
    assert_eq!(slab.bytes, expected);

    let green = session
        .get_vara_array::<u8>(id, data, &[1, 0, 0], &[1, 5, 6])
        .unwrap();
    assert_eq!(green.shape(), &[1, 5, 6]);
    assert_eq!(green[[0, 4, 0]], rgb_value(1, 4, 0));

    session.close(id).unwrap();
}

#[test]
fn test_out_of_bounds_request_reads_nothing() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let path = write_gray16(&dir, "bounds.tif", 250, 4800);

    let library = Arc::new(CountingTiffLibrary::new());
    let mut session = Session::new(geotiff_registry(library.clone()));
    let id = session.open(&path, OpenMode::ReadOnly).unwrap();
    let data = session.inq_varid(id, "data").unwrap();

    for (start, count) in [
        ([4800, 0], [1, 1]),
        ([4799, 0], [2, 1]),
        ([0, 200], [1, 51]),
        ([0, 0], [0, 1]),
    ] {
        let err = session
            .get_vara(id, data, &start, &count, None)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidRequest, "{:?} {:?}", start, count);
    }
    assert!(matches!(
        session.get_vara(id, data, &[0], &[1], None),
        Err(AdapterError::InvalidRequest { .. })
    ));
    assert_eq!(library.reads(), 0);

    // A valid request inside one scanline costs one read.
    session.get_vara(id, data, &[7, 0], &[1, 250], None).unwrap();
    assert_eq!(library.reads(), 1);

    session.close(id).unwrap();
}

#[test]
fn test_conversion_on_read() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let path = write_gray16(&dir, "convert.tif", 64, 64);

    let mut session = Session::new(AdapterRegistry::new());
    let id = session.open(&path, OpenMode::ReadOnly).unwrap();
    let data = session.inq_varid(id, "data").unwrap();

    let doubles = session
        .get_vara_array::<f64>(id, data, &[10, 0], &[1, 4])
        .unwrap();
    assert_eq!(doubles[[0, 3]], f64::from(gray16_value(10, 3)));

    // Row 63 near x = 60 holds values above 600.
    let clamped = session
        .get_vara(id, data, &[63, 60], &[1, 4], Some(NcType::Byte))
        .unwrap();
    assert_eq!(clamped.nc_type, NcType::Byte);
    assert_eq!(clamped.range_errors, 4);
    assert_eq!(clamped.values::<i8>().unwrap(), vec![i8::MAX; 4]);

    let err = session
        .get_vara(id, data, &[0, 0], &[1, 1], Some(NcType::Char))
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidRequest);

    session.close(id).unwrap();
}

#[test]
fn test_strided_read() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let path = write_gray16(&dir, "stride.tif", 20, 10);

    let mut session = Session::new(AdapterRegistry::new());
    let id = session.open(&path, OpenMode::ReadOnly).unwrap();
    let data = session.inq_varid(id, "data").unwrap();

    let strided = session
        .get_vars(id, data, &[1, 2], &[3, 4], &[3, 5], None)
        .unwrap();
    let expected: Vec<u16> = [1, 4, 7]
        .into_iter()
        .flat_map(|y| [2, 7, 12, 17].into_iter().map(move |x| gray16_value(y, x)))
        .collect();
    assert_eq!(strided.values::<u16>().unwrap(), expected);

    let whole = session.get_var(id, data, None).unwrap();
    assert_eq!(whole.shape, vec![10, 20]);
    assert_eq!(whole.len(), 200);

    session.close(id).unwrap();
}

#[test]
fn test_georeferencing_attributes() {
    init_logging();
    let dir = TempDir::new().unwrap();
    let path = write_float_with_nodata(&dir, "nodata.tif", "-9999");

    let mut session = Session::new(AdapterRegistry::new());
    let id = session.open(&path, OpenMode::ReadOnly).unwrap();
    let data = session.inq_varid(id, "data").unwrap();
    assert_eq!(session.inq_var(id, data).unwrap().nc_type, NcType::Float);

    assert_eq!(
        session
            .get_att_as::<f64>(id, None, "geotiff_pixel_scale")
            .unwrap(),
        PIXEL_SCALE.to_vec()
    );
    assert_eq!(
        session.inq_att(id, None, "geotiff_tiepoint").unwrap(),
        (NcType::Double, 6)
    );
    let keys = session.get_att(id, None, "geotiff_key_directory").unwrap();
    assert_eq!(keys.values::<u16>(), Some(KEY_DIRECTORY.to_vec()));
    assert!(session.get_att(id, None, "geotiff_transformation").is_err());

    let fill = session.get_att(id, Some(data), "_FillValue").unwrap();
    assert_eq!(fill.values::<f32>(), Some(vec![-9999.0]));

    session.close(id).unwrap();
}
