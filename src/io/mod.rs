//! I/O modules for reading quad-pol rasters and LUTs and writing compact-pol products

pub mod calibration_table;
pub mod raster;
pub mod acquisition;

pub use calibration_table::CalibrationTable;
pub use raster::{read_georeference, write_single_band, ProductMetadata};
pub use acquisition::Acquisition;
