//! Sensor-specific input acquisition.
//!
//! An [`Acquisition`] bundles the raw quad-pol channels with the calibrator chosen
//! for the sensor and the georeference of the raster every output inherits.

use crate::core::calibrate::{AlosCalibrationConstants, Calibrator, QuadPolChannels};
use crate::io::calibration_table::CalibrationTable;
use crate::io::raster::{read_complex_bands, read_georeference, read_iq_raster};
use crate::types::{GeoReference, Polarization, SarError, SarResult, Sensor};
use regex::Regex;
use std::path::Path;

/// Raw channels, calibrator and reference georeference for one run
#[derive(Debug, Clone)]
pub struct Acquisition {
    pub sensor: Sensor,
    pub channels: QuadPolChannels,
    pub calibrator: Calibrator,
    pub reference: GeoReference,
}

impl Acquisition {
    /// Assemble an acquisition from data already in memory
    pub fn from_parts(
        sensor: Sensor,
        channels: QuadPolChannels,
        calibrator: Calibrator,
        reference: GeoReference,
    ) -> SarResult<Self> {
        if channels.dim() != reference.shape {
            return Err(SarError::ShapeMismatch {
                context: "acquisition reference raster".to_string(),
                expected: reference.shape,
                found: channels.dim(),
            });
        }
        Ok(Self {
            sensor,
            channels,
            calibrator,
            reference,
        })
    }

    /// RADARSAT-2: four I/Q GeoTIFFs in HH, HV, VH, VV order plus the LUT XML.
    ///
    /// The HH file is the georeference template.
    pub fn radarsat2<P: AsRef<Path>, L: AsRef<Path>>(paths: &[P], lut_path: L) -> SarResult<Self> {
        if paths.len() != 4 {
            return Err(SarError::Validation(format!(
                "Exactly 4 images (HH, HV, VH, VV) are required, got {}",
                paths.len()
            )));
        }

        log::info!("Selected {} images:", Sensor::Radarsat2);
        for (pol, path) in Polarization::ALL.iter().zip(paths) {
            log::info!("  {}: {}", pol, path.as_ref().display());
        }

        let mut raw = Vec::with_capacity(4);
        for (pol, path) in Polarization::ALL.iter().zip(paths) {
            let channel = read_iq_raster(path).map_err(|e| {
                log::error!("File not found or cannot be opened ({}): {}", pol, path.as_ref().display());
                e
            })?;
            raw.push(channel);
        }
        let mut raw = raw.into_iter();
        let (hh, hv, vh, vv) = match (raw.next(), raw.next(), raw.next(), raw.next()) {
            (Some(hh), Some(hv), Some(vh), Some(vv)) => (hh, hv, vh, vv),
            _ => return Err(SarError::Validation("Missing channel after reading".to_string())),
        };
        let channels = QuadPolChannels::new(hh, hv, vh, vv)?;
        let (rows, cols) = channels.dim();
        log::info!("Images read successfully: {} rows and {} columns", rows, cols);

        let table = CalibrationTable::from_file(lut_path)?;
        table.validate_columns(cols)?;
        let calibrator = Calibrator::Table(table.into_calibration()?);
        log::info!("Look-Up Table (LUT) for {} calibration loaded successfully", Sensor::Radarsat2);

        let reference = read_georeference(&paths[0])?;

        Ok(Self {
            sensor: Sensor::Radarsat2,
            channels,
            calibrator,
            reference,
        })
    }

    /// ALOS-PALSAR: one volume file carrying HH, HV, VH, VV as bands 1-4
    pub fn alos_palsar<P: AsRef<Path>>(path: P, constants: &AlosCalibrationConstants) -> SarResult<Self> {
        let path = path.as_ref();
        log::info!("Selected {} file: {}", Sensor::AlosPalsar, path.display());

        let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        if !is_alos_volume_name(&name) {
            log::warn!("'{}' does not look like an ALOS-PALSAR volume file (VOL-ALPSRP*.1__A)", name);
        }

        let reference = read_georeference(path)?;
        log::info!(
            "Image dimensions: {} rows, {} columns",
            reference.shape.0,
            reference.shape.1
        );

        let mut bands = read_complex_bands(path, 4)?.into_iter();
        let (hh, hv, vh, vv) = match (bands.next(), bands.next(), bands.next(), bands.next()) {
            (Some(hh), Some(hv), Some(vh), Some(vv)) => (hh, hv, vh, vv),
            _ => {
                return Err(SarError::Validation(
                    "The selected file does not contain the required 4 bands (HH, HV, VH, VV)".to_string(),
                ))
            }
        };
        let channels = QuadPolChannels::new(hh, hv, vh, vv)?;
        log::info!("{} images read successfully", Sensor::AlosPalsar);

        let calibration = constants.to_calibration()?;
        log::debug!(
            "Constant calibration factor 10^(({}) - ({}))/10 = {:e}",
            constants.cf_db,
            constants.cf_offset_db,
            calibration.linear_factor()
        );

        Ok(Self {
            sensor: Sensor::AlosPalsar,
            channels,
            calibrator: Calibrator::Constant(calibration),
            reference,
        })
    }
}

/// Whether a file name follows the ALOS-PALSAR volume naming convention
pub fn is_alos_volume_name(name: &str) -> bool {
    Regex::new(r"^VOL-ALPSRP[0-9A-Za-z\-]*\.1__A$")
        .map(|re| re.is_match(name))
        .unwrap_or(false)
}
