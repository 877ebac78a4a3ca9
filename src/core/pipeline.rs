use crate::core::calibrate::{AlosCalibrationConstants, Calibrator, QuadPolChannels};
use crate::core::covariance::CovarianceMatrix;
use crate::core::scattering::ScatteringMatrix;
use crate::core::simulate::{simulate, CompactPolVector};
use crate::io::acquisition::Acquisition;
use crate::io::raster::{write_single_band, ProductMetadata};
use crate::types::{CompactPolMode, Feature, FeatureSet, SarRealImage, SarResult};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Processing configuration for one FP -> CP run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessingConfig {
    /// Compact-pol mode to simulate
    pub mode: CompactPolMode,
    /// Products to write
    pub features: FeatureSet,
    /// Directory that receives the mode-named output folders
    pub output_dir: PathBuf,
    /// Constants for constant-factor calibrated sensors
    pub alos: AlosCalibrationConstants,
}

impl Default for ProcessingConfig {
    fn default() -> Self {
        Self {
            mode: CompactPolMode::default(),
            features: FeatureSet::default(),
            output_dir: PathBuf::from("."),
            alos: AlosCalibrationConstants::default(),
        }
    }
}

impl ProcessingConfig {
    pub fn new(mode: CompactPolMode, features: FeatureSet, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            mode,
            features,
            output_dir: output_dir.into(),
            ..Self::default()
        }
    }

    /// Build from independent mode and feature checkbox states
    pub fn from_flags(
        right_hybrid: bool,
        left_hybrid: bool,
        quarter_pi: bool,
        scattering: bool,
        covariance: bool,
        output_dir: impl Into<PathBuf>,
    ) -> SarResult<Self> {
        let mode = CompactPolMode::from_flags(right_hybrid, left_hybrid, quarter_pi)?;
        let features = FeatureSet::from_flags(scattering, covariance)?;
        Ok(Self::new(mode, features, output_dir))
    }
}

/// Where each product is written for a given mode
#[derive(Debug, Clone, PartialEq)]
pub struct OutputLayout {
    root: PathBuf,
    mode: CompactPolMode,
}

impl OutputLayout {
    pub fn new(root: impl Into<PathBuf>, mode: CompactPolMode) -> Self {
        Self { root: root.into(), mode }
    }

    pub fn scattering_dir(&self) -> PathBuf {
        self.root.join(format!("S2_{}", self.mode.suffix()))
    }

    pub fn covariance_dir(&self) -> PathBuf {
        self.root.join(format!("C2_{}", self.mode.suffix()))
    }

    pub fn dir_for(&self, feature: Feature) -> PathBuf {
        match feature {
            Feature::Scattering => self.scattering_dir(),
            Feature::Covariance => self.covariance_dir(),
        }
    }
}

/// In-memory products of one run
#[derive(Debug, Clone)]
pub struct PipelineProducts {
    pub vector: CompactPolVector,
    pub covariance: Option<CovarianceMatrix>,
}

impl PipelineProducts {
    /// Named single-band rasters for one feature, in write order
    pub fn bands(&self, feature: Feature) -> Vec<(&'static str, SarRealImage)> {
        match feature {
            Feature::Scattering => vec![
                ("S11_real", self.vector.s1.mapv(|s| s.re)),
                ("S11_imag", self.vector.s1.mapv(|s| s.im)),
                ("S21_real", self.vector.s2.mapv(|s| s.re)),
                ("S21_imag", self.vector.s2.mapv(|s| s.im)),
            ],
            Feature::Covariance => match &self.covariance {
                Some(c) => vec![
                    ("C11", c.c11.clone()),
                    ("C12_real", c.c12.mapv(|s| s.re)),
                    ("C12_imag", c.c12.mapv(|s| s.im)),
                    ("C22", c.c22.clone()),
                ],
                None => Vec::new(),
            },
        }
    }
}

/// Files written by a completed run
#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    pub scattering_dir: Option<PathBuf>,
    pub covariance_dir: Option<PathBuf>,
    pub written: Vec<PathBuf>,
}

/// Calibration -> scattering matrix -> mode simulation -> covariance -> GeoTIFF
pub struct Pipeline {
    config: ProcessingConfig,
}

impl Pipeline {
    pub fn new(config: ProcessingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ProcessingConfig {
        &self.config
    }

    /// Run every numeric stage in memory
    pub fn process(&self, channels: &QuadPolChannels, calibrator: &Calibrator) -> SarResult<PipelineProducts> {
        let calibrated = calibrator.calibrate_channels(channels)?;
        let matrix = ScatteringMatrix::from_calibrated(&calibrated)?;
        let vector = simulate(self.config.mode, &matrix)?;

        let covariance = if self.config.features.contains(Feature::Covariance) {
            log::info!("Covariance matrix selected. Processing...");
            Some(CovarianceMatrix::from_vector(&vector)?)
        } else {
            None
        };

        Ok(PipelineProducts { vector, covariance })
    }

    /// Process an acquisition and write the selected products.
    ///
    /// Nothing is written unless every numeric stage succeeded.
    pub fn run(&self, acquisition: &Acquisition) -> SarResult<PipelineReport> {
        log::info!(
            "Starting {} -> compact-pol ({}) simulation",
            acquisition.sensor,
            self.config.mode
        );
        let products = self.process(&acquisition.channels, &acquisition.calibrator)?;

        let layout = OutputLayout::new(&self.config.output_dir, self.config.mode);
        let processing_time = Utc::now().to_rfc3339();
        let mut report = PipelineReport::default();

        for feature in self.config.features.iter() {
            let dir = layout.dir_for(feature);
            std::fs::create_dir_all(&dir)?;
            log::info!("Saving {} results to '{}'", feature, dir.display());

            for (name, band) in products.bands(feature) {
                let path = dir.join(format!("{}.tif", name));
                let metadata = ProductMetadata {
                    mode: self.config.mode,
                    sensor: acquisition.sensor,
                    product: name.to_string(),
                    processing_time: processing_time.clone(),
                };
                write_single_band(&path, &band, &acquisition.reference, &metadata)?;
                report.written.push(path);
            }

            match feature {
                Feature::Scattering => report.scattering_dir = Some(dir),
                Feature::Covariance => report.covariance_dir = Some(dir),
            }
        }

        log::info!(
            "Simulation completed successfully. {} rasters saved",
            report.written.len()
        );
        Ok(report)
    }
}

/// Convenience wrapper: one in-memory run for a mode, computing the covariance
pub fn process_channels(
    channels: &QuadPolChannels,
    calibrator: &Calibrator,
    mode: CompactPolMode,
) -> SarResult<PipelineProducts> {
    let config = ProcessingConfig::new(mode, FeatureSet::all(), Path::new("."));
    Pipeline::new(config).process(channels, calibrator)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::calibrate::{ConstantCalibration, TableCalibration};
    use crate::types::{SarComplex, SarError};
    use ndarray::Array2;

    fn channels(rows: usize, cols: usize) -> QuadPolChannels {
        let hh = Array2::from_shape_fn((rows, cols), |(r, c)| SarComplex::new(r as f32 + 1.0, c as f32));
        let hv = Array2::from_shape_fn((rows, cols), |(r, c)| SarComplex::new(0.5 * c as f32, -(r as f32)));
        let vh = Array2::from_shape_fn((rows, cols), |(r, c)| SarComplex::new(0.4 * c as f32, -(r as f32) + 0.2));
        let vv = Array2::from_shape_fn((rows, cols), |(r, c)| SarComplex::new(2.0 - c as f32, r as f32 * 0.3));
        QuadPolChannels::new(hh, hv, vh, vv).unwrap()
    }

    #[test]
    fn test_layout_names_encode_mode() {
        let layout = OutputLayout::new("/out", CompactPolMode::QuarterPi);
        assert_eq!(layout.scattering_dir(), PathBuf::from("/out/S2_pi4"));
        assert_eq!(layout.covariance_dir(), PathBuf::from("/out/C2_pi4"));
        assert_eq!(
            OutputLayout::new("/out", CompactPolMode::LeftHybrid).dir_for(Feature::Covariance),
            PathBuf::from("/out/C2_LHV")
        );
    }

    #[test]
    fn test_process_preserves_shape() {
        let calibrator = Calibrator::Table(TableCalibration::new(0.5, vec![2.0, 3.0, 4.0, 5.0, 6.0]).unwrap());
        let products = process_channels(&channels(3, 5), &calibrator, CompactPolMode::RightHybrid).unwrap();

        assert_eq!(products.vector.dim(), (3, 5));
        let cov = products.covariance.as_ref().unwrap();
        assert_eq!(cov.dim(), (3, 5));
        for feature in FeatureSet::all().iter() {
            let bands = products.bands(feature);
            assert_eq!(bands.len(), 4);
            assert!(bands.iter().all(|(_, b)| b.dim() == (3, 5)));
        }
    }

    #[test]
    fn test_covariance_skipped_when_not_selected() {
        let config = ProcessingConfig::new(
            CompactPolMode::LeftHybrid,
            FeatureSet::new([Feature::Scattering]).unwrap(),
            ".",
        );
        let calibrator = Calibrator::Constant(ConstantCalibration::new(1.0).unwrap());
        let products = Pipeline::new(config).process(&channels(2, 2), &calibrator).unwrap();
        assert!(products.covariance.is_none());
        assert!(products.bands(Feature::Covariance).is_empty());
    }

    #[test]
    fn test_calibration_failure_aborts_run() {
        let calibrator = Calibrator::Table(TableCalibration::new(0.0, vec![1.0; 7]).unwrap());
        let err = process_channels(&channels(3, 5), &calibrator, CompactPolMode::QuarterPi).unwrap_err();
        assert!(matches!(err, SarError::Validation(_)));
    }

    #[test]
    fn test_config_from_flags() {
        let config = ProcessingConfig::from_flags(false, false, true, true, false, "/tmp/x").unwrap();
        assert_eq!(config.mode, CompactPolMode::QuarterPi);
        assert!(config.features.contains(Feature::Scattering));

        let err = ProcessingConfig::from_flags(true, true, false, true, true, ".").unwrap_err();
        assert_eq!(err.kind(), "selection");
        let err = ProcessingConfig::from_flags(true, false, false, false, false, ".").unwrap_err();
        assert_eq!(err.kind(), "selection");
    }
}
