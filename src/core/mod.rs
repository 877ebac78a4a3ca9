//! Core polarimetric processing modules

pub mod validation;
pub mod calibrate;
pub mod scattering;
pub mod simulate;
pub mod covariance;
pub mod pipeline;

// Re-export main types
pub use validation::{ensure_same_shape, ChannelStats};
pub use calibrate::{
    AlosCalibrationConstants, CalibratedChannels, Calibrator, ConstantCalibrated, ConstantCalibration,
    IqPair, QuadPolChannels, TableCalibration,
};
pub use scattering::ScatteringMatrix;
pub use simulate::{simulate, CompactPolVector};
pub use covariance::CovarianceMatrix;
pub use pipeline::{OutputLayout, Pipeline, PipelineProducts, PipelineReport, ProcessingConfig};
