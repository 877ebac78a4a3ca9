//! compactsar: Compact-polarimetric SAR simulation from quad-pol imagery
//!
//! Converts fully-polarimetric (HH, HV, VH, VV) SAR data into simulated
//! compact-pol products: calibration, reciprocal scattering matrix, right/left
//! circular hybrid or pi/4 mode simulation, and the 2x2 covariance matrix,
//! written as georeferenced single-band GeoTIFFs.

pub mod types;
pub mod io;
pub mod core;

// Re-export main types and functions for easier access
pub use types::{
    CompactPolMode, Feature, FeatureSet, GeoReference, Polarization, SarComplex, SarError, SarImage,
    SarRealImage, SarResult, Sensor,
};

pub use crate::core::{
    simulate, Calibrator, CompactPolVector, CovarianceMatrix, Pipeline, ProcessingConfig,
    QuadPolChannels, ScatteringMatrix,
};
pub use io::{Acquisition, CalibrationTable};

#[cfg(feature = "python")]
mod python {
    use super::*;
    use numpy::{Complex32, IntoPyArray, PyArray2, PyReadonlyArray2};
    use pyo3::prelude::*;

    fn to_py_err(e: SarError) -> PyErr {
        match e {
            SarError::Selection(_) | SarError::Validation(_) => {
                PyErr::new::<pyo3::exceptions::PyValueError, _>(format!("{}", e))
            }
            _ => PyErr::new::<pyo3::exceptions::PyRuntimeError, _>(format!("{}", e)),
        }
    }

    fn parse_features(features: Vec<String>) -> PyResult<FeatureSet> {
        let parsed = features
            .iter()
            .map(|f| f.parse::<Feature>())
            .collect::<SarResult<Vec<_>>>()
            .map_err(to_py_err)?;
        FeatureSet::new(parsed).map_err(to_py_err)
    }

    fn config(mode: &str, features: Vec<String>, output_dir: String) -> PyResult<ProcessingConfig> {
        let mode = mode.parse::<CompactPolMode>().map_err(to_py_err)?;
        Ok(ProcessingConfig::new(mode, parse_features(features)?, output_dir))
    }

    fn report_paths(report: crate::core::PipelineReport) -> Vec<String> {
        report
            .written
            .iter()
            .map(|p| p.display().to_string())
            .collect()
    }

    /// Resolve three checkbox states to a mode name ("RHV", "LHV" or "pi4")
    #[pyfunction]
    fn mode_from_flags(rhv: bool, lhv: bool, pi4: bool) -> PyResult<String> {
        CompactPolMode::from_flags(rhv, lhv, pi4)
            .map(|m| m.suffix().to_string())
            .map_err(to_py_err)
    }

    /// Simulate a compact-pol scattering vector from S11, S12, S22
    #[pyfunction]
    fn simulate<'py>(
        py: Python<'py>,
        mode: &str,
        s11: PyReadonlyArray2<Complex32>,
        s12: PyReadonlyArray2<Complex32>,
        s22: PyReadonlyArray2<Complex32>,
    ) -> PyResult<(&'py PyArray2<Complex32>, &'py PyArray2<Complex32>)> {
        let mode = mode.parse::<CompactPolMode>().map_err(to_py_err)?;
        let matrix = ScatteringMatrix::from_elements(
            s11.as_array().to_owned(),
            s12.as_array().to_owned(),
            s22.as_array().to_owned(),
        )
        .map_err(to_py_err)?;
        let vector = crate::core::simulate(mode, &matrix).map_err(to_py_err)?;
        Ok((vector.s1.into_pyarray(py), vector.s2.into_pyarray(py)))
    }

    /// Covariance matrix (C11, C12, C22) of a compact-pol vector
    #[pyfunction]
    fn covariance<'py>(
        py: Python<'py>,
        s1: PyReadonlyArray2<Complex32>,
        s2: PyReadonlyArray2<Complex32>,
    ) -> PyResult<(&'py PyArray2<f32>, &'py PyArray2<Complex32>, &'py PyArray2<f32>)> {
        let c = CovarianceMatrix::from_channels(&s1.as_array().to_owned(), &s2.as_array().to_owned())
            .map_err(to_py_err)?;
        Ok((c.c11.into_pyarray(py), c.c12.into_pyarray(py), c.c22.into_pyarray(py)))
    }

    /// Full RADARSAT-2 run; returns the written file paths
    #[pyfunction]
    fn run_radarsat2(
        paths: Vec<String>,
        lut_xml: String,
        mode: &str,
        features: Vec<String>,
        output_dir: String,
    ) -> PyResult<Vec<String>> {
        let config = config(mode, features, output_dir)?;
        let acquisition = Acquisition::radarsat2(&paths, &lut_xml).map_err(to_py_err)?;
        let report = Pipeline::new(config).run(&acquisition).map_err(to_py_err)?;
        Ok(report_paths(report))
    }

    /// Full ALOS-PALSAR run; returns the written file paths
    #[pyfunction]
    fn run_alos_palsar(
        path: String,
        mode: &str,
        features: Vec<String>,
        output_dir: String,
    ) -> PyResult<Vec<String>> {
        let config = config(mode, features, output_dir)?;
        let acquisition = Acquisition::alos_palsar(&path, &config.alos).map_err(to_py_err)?;
        let report = Pipeline::new(config).run(&acquisition).map_err(to_py_err)?;
        Ok(report_paths(report))
    }

    /// Python module definition
    #[pymodule]
    fn _core(_py: Python, m: &PyModule) -> PyResult<()> {
        m.add_function(wrap_pyfunction!(mode_from_flags, m)?)?;
        m.add_function(wrap_pyfunction!(self::simulate, m)?)?;
        m.add_function(wrap_pyfunction!(covariance, m)?)?;
        m.add_function(wrap_pyfunction!(run_radarsat2, m)?)?;
        m.add_function(wrap_pyfunction!(run_alos_palsar, m)?)?;
        Ok(())
    }
}
