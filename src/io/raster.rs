use crate::core::validation::ensure_shape;
use crate::types::{CompactPolMode, GeoReference, SarComplex, SarError, SarImage, SarRealImage, SarResult, Sensor};
use gdal::raster::Buffer;
use gdal::{Dataset, DriverManager, Metadata};
use ndarray::{Array2, Zip};
use std::path::Path;

/// Provenance written as GDAL metadata on every output raster
#[derive(Debug, Clone)]
pub struct ProductMetadata {
    pub mode: CompactPolMode,
    pub sensor: Sensor,
    pub product: String,
    pub processing_time: String,
}

impl ProductMetadata {
    pub fn items(&self) -> Vec<(&'static str, String)> {
        vec![
            ("COMPACT_POL_MODE", self.mode.suffix().to_string()),
            ("SENSOR", self.sensor.to_string()),
            ("PRODUCT", self.product.clone()),
            ("PROCESSING_TIME", self.processing_time.clone()),
        ]
    }
}

/// Read georeference and size from a raster without loading pixel data
pub fn read_georeference<P: AsRef<Path>>(path: P) -> SarResult<GeoReference> {
    let dataset = Dataset::open(path.as_ref())?;
    Ok(georeference_of(&dataset))
}

fn georeference_of(dataset: &Dataset) -> GeoReference {
    let (width, height) = dataset.raster_size();
    GeoReference {
        shape: (height, width),
        geo_transform: dataset.geo_transform().ok(),
        projection: dataset.projection(),
        driver: dataset.driver().short_name(),
    }
}

/// Read one band as f32 (1-based band index)
fn read_band(dataset: &Dataset, index: isize) -> SarResult<SarRealImage> {
    let (width, height) = dataset.raster_size();
    let band = dataset.rasterband(index)?;
    let buffer = band.read_as::<f32>((0, 0), (width, height), (width, height), None)?;

    Array2::from_shape_vec((height, width), buffer.data)
        .map_err(|e| SarError::Validation(format!("Band {} has unexpected layout: {}", index, e)))
}

/// Read a raster holding I in band 1 and Q in band 2 as one complex channel
pub fn read_iq_raster<P: AsRef<Path>>(path: P) -> SarResult<SarImage> {
    let path = path.as_ref();
    let dataset = Dataset::open(path)?;
    let band_count = dataset.raster_count();
    if band_count < 2 {
        return Err(SarError::Validation(format!(
            "{} has {} band(s); expected I and Q bands",
            path.display(),
            band_count
        )));
    }

    let i = read_band(&dataset, 1)?;
    let q = read_band(&dataset, 2)?;
    log::debug!("Read I/Q raster {} ({}x{})", path.display(), i.nrows(), i.ncols());

    Ok(Zip::from(&i).and(&q).map_collect(|&re, &im| SarComplex::new(re, im)))
}

/// Read the first `count` bands of a complex multi-band raster.
///
/// Complex bands are split through GDAL's derived REAL/IMAG views.
pub fn read_complex_bands<P: AsRef<Path>>(path: P, count: usize) -> SarResult<Vec<SarImage>> {
    let path = path.as_ref();
    let dataset = Dataset::open(path)?;
    let band_count = dataset.raster_count();
    if (band_count as usize) < count {
        return Err(SarError::Validation(format!(
            "{} has {} band(s); at least {} are required",
            path.display(),
            band_count,
            count
        )));
    }

    let real = Dataset::open(Path::new(&format!("DERIVED_SUBDATASET:REAL:{}", path.display())))?;
    let imag = Dataset::open(Path::new(&format!("DERIVED_SUBDATASET:IMAG:{}", path.display())))?;

    (1..=count as isize)
        .map(|index| {
            let re = read_band(&real, index)?;
            let im = read_band(&imag, index)?;
            Ok(Zip::from(&re).and(&im).map_collect(|&r, &i| SarComplex::new(r, i)))
        })
        .collect()
}

/// Write a single-band Float32 GeoTIFF inheriting the reference georeference.
///
/// The array must match the reference raster's (rows, cols) exactly.
pub fn write_single_band<P: AsRef<Path>>(
    path: P,
    data: &SarRealImage,
    reference: &GeoReference,
    metadata: &ProductMetadata,
) -> SarResult<()> {
    let path = path.as_ref();
    ensure_shape(&format!("raster output {}", path.display()), data, reference.shape)?;

    let (height, width) = data.dim();
    let driver = DriverManager::get_driver_by_name("GTiff")?;
    let mut dataset = driver.create_with_band_type::<f32, _>(path, width as isize, height as isize, 1)?;

    if let Some(transform) = reference.geo_transform {
        dataset.set_geo_transform(&transform)?;
    }
    if !reference.projection.is_empty() {
        dataset.set_projection(&reference.projection)?;
    }
    for (key, value) in metadata.items() {
        dataset.set_metadata_item(key, &value, "")?;
    }

    let mut rasterband = dataset.rasterband(1)?;
    let flat_data: Vec<f32> = data.iter().cloned().collect();
    let buffer = Buffer::new((width, height), flat_data);
    rasterband.write((0, 0), (width, height), &buffer)?;

    log::debug!("Wrote {} ({}x{})", path.display(), height, width);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use gdal::spatial_ref::SpatialRef;
    use ndarray::array;
    use tempfile::TempDir;

    const TRANSFORM: [f64; 6] = [500000.0, 12.5, 0.0, 4200000.0, 0.0, -12.5];

    fn write_fixture(path: &Path, bands: &[SarRealImage]) {
        let (height, width) = bands[0].dim();
        let driver = DriverManager::get_driver_by_name("GTiff").unwrap();
        let mut dataset = driver
            .create_with_band_type::<f32, _>(path, width as isize, height as isize, bands.len() as isize)
            .unwrap();
        dataset.set_geo_transform(&TRANSFORM).unwrap();
        let wkt = SpatialRef::from_epsg(32633).unwrap().to_wkt().unwrap();
        dataset.set_projection(&wkt).unwrap();
        for (idx, band) in bands.iter().enumerate() {
            let mut rb = dataset.rasterband(idx as isize + 1).unwrap();
            let buffer = Buffer::new((width, height), band.iter().cloned().collect());
            rb.write((0, 0), (width, height), &buffer).unwrap();
        }
    }

    fn metadata() -> ProductMetadata {
        ProductMetadata {
            mode: CompactPolMode::RightHybrid,
            sensor: Sensor::Radarsat2,
            product: "S11_real".to_string(),
            processing_time: "2024-01-01T00:00:00+00:00".to_string(),
        }
    }

    #[test]
    fn test_iq_raster_round_trip_and_georeference() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("hh.tif");
        write_fixture(&path, &[array![[1.0, 2.0, 3.0], [4.0, 5.0, 6.0]], array![[-1.0, 0.0, 1.0], [2.0, 3.0, 4.0]]]);

        let channel = read_iq_raster(&path).unwrap();
        assert_eq!(channel.dim(), (2, 3));
        assert_eq!(channel[[1, 2]], SarComplex::new(6.0, 4.0));

        let reference = read_georeference(&path).unwrap();
        assert_eq!(reference.shape, (2, 3));
        assert_eq!(reference.geo_transform, Some(TRANSFORM));
        assert!(!reference.projection.is_empty());
        assert_eq!(reference.driver, "GTiff");
    }

    #[test]
    fn test_single_band_raster_is_not_iq() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("single.tif");
        write_fixture(&path, &[array![[1.0, 2.0]]]);
        assert!(matches!(read_iq_raster(&path), Err(SarError::Validation(_))));
    }

    #[test]
    fn test_write_single_band_copies_georeference() {
        let dir = TempDir::new().unwrap();
        let reference_path = dir.path().join("ref.tif");
        write_fixture(&reference_path, &[array![[0.0, 0.0], [0.0, 0.0]], array![[0.0, 0.0], [0.0, 0.0]]]);
        let reference = read_georeference(&reference_path).unwrap();

        let out = dir.path().join("out.tif");
        let data = array![[1.5f32, -2.5], [3.25, 1e-6]];
        write_single_band(&out, &data, &reference, &metadata()).unwrap();

        let dataset = Dataset::open(&out).unwrap();
        assert_eq!(dataset.raster_count(), 1);
        assert_eq!(dataset.geo_transform().unwrap(), TRANSFORM);
        assert_eq!(dataset.projection(), reference.projection);
        assert_eq!(dataset.metadata_item("COMPACT_POL_MODE", ""), Some("RHV".to_string()));
        assert_eq!(dataset.metadata_item("SENSOR", ""), Some("RADARSAT-2".to_string()));
        assert_eq!(dataset.metadata_item("PRODUCT", ""), Some("S11_real".to_string()));
        assert_eq!(
            dataset.metadata_item("PROCESSING_TIME", ""),
            Some("2024-01-01T00:00:00+00:00".to_string())
        );
        assert_eq!(read_band(&dataset, 1).unwrap(), data);
    }

    #[test]
    fn test_write_rejects_shape_mismatch() {
        let dir = TempDir::new().unwrap();
        let reference = GeoReference {
            shape: (2, 2),
            geo_transform: None,
            projection: String::new(),
            driver: "GTiff".to_string(),
        };
        let out = dir.path().join("bad.tif");
        let err = write_single_band(&out, &Array2::zeros((2, 3)), &reference, &metadata()).unwrap_err();
        assert_eq!(err.kind(), "shape");
        assert!(!out.exists());
    }

    #[test]
    fn test_volume_needs_four_bands() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("VOL-ALPSRP000000000-P1.1__A");
        write_fixture(&path, &[array![[1.0]], array![[2.0]]]);
        let err = read_complex_bands(&path, 4).unwrap_err();
        assert!(matches!(err, SarError::Validation(ref m) if m.contains("at least 4")));
    }

    /// Four CFloat32 bands as a raw ENVI volume; sample (b, r, c) = (100b + 10r + c) + j(c - b)
    fn write_complex_volume(path: &Path, rows: usize, cols: usize) {
        let mut bytes = Vec::new();
        for b in 0..4 {
            for r in 0..rows {
                for c in 0..cols {
                    bytes.extend_from_slice(&((100 * b + 10 * r + c) as f32).to_le_bytes());
                    bytes.extend_from_slice(&(c as f32 - b as f32).to_le_bytes());
                }
            }
        }
        std::fs::write(path, bytes).unwrap();

        let header = format!(
            "ENVI\nsamples = {}\nlines = {}\nbands = 4\nheader offset = 0\nfile type = ENVI Standard\n\
             data type = 6\ninterleave = bsq\nbyte order = 0\n\
             map info = {{UTM, 1, 1, 500000, 4200000, 12.5, 12.5, 33, North, WGS-84}}\n",
            cols, rows
        );
        std::fs::write(path.with_extension("hdr"), header).unwrap();
    }

    #[test]
    fn test_complex_volume_bands_in_order() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("VOL-ALPSRP000000000-P1.1__A");
        write_complex_volume(&path, 2, 3);

        let bands = read_complex_bands(&path, 4).unwrap();
        assert_eq!(bands.len(), 4);
        for (b, band) in bands.iter().enumerate() {
            assert_eq!(band.dim(), (2, 3));
            for ((r, c), &value) in band.indexed_iter() {
                let expected = SarComplex::new((100 * b + 10 * r + c) as f32, c as f32 - b as f32);
                assert_eq!(value, expected, "band {} at ({}, {})", b + 1, r, c);
            }
        }

        let reference = read_georeference(&path).unwrap();
        assert_eq!(reference.shape, (2, 3));
        assert_eq!(reference.geo_transform, Some(TRANSFORM));
        assert_eq!(reference.driver, "ENVI");
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = read_iq_raster("/nonexistent/hh.tif").unwrap_err();
        assert_eq!(err.kind(), "io");
    }
}
