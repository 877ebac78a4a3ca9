use ndarray::Array2;
use num_complex::Complex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

/// Complex-valued SAR sample (I + jQ)
pub type SarComplex = Complex<f32>;

/// Real-valued intensity, amplitude or single component
pub type SarReal = f32;

/// 2D complex SAR data array (rows x cols)
pub type SarImage = Array2<SarComplex>;

/// 2D real SAR data array (rows x cols)
pub type SarRealImage = Array2<SarReal>;

/// Linear polarization channels of a quad-pol acquisition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Polarization {
    HH,
    HV,
    VH,
    VV,
}

impl Polarization {
    /// Channel order used for file lists and multi-band volumes
    pub const ALL: [Polarization; 4] = [
        Polarization::HH,
        Polarization::HV,
        Polarization::VH,
        Polarization::VV,
    ];
}

impl std::fmt::Display for Polarization {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Polarization::HH => write!(f, "HH"),
            Polarization::HV => write!(f, "HV"),
            Polarization::VH => write!(f, "VH"),
            Polarization::VV => write!(f, "VV"),
        }
    }
}

impl FromStr for Polarization {
    type Err = SarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "HH" => Ok(Polarization::HH),
            "HV" => Ok(Polarization::HV),
            "VH" => Ok(Polarization::VH),
            "VV" => Ok(Polarization::VV),
            _ => Err(SarError::Validation(format!("Invalid polarization: {}", s))),
        }
    }
}

/// Supported quad-pol sensors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sensor {
    /// Four single-file I/Q channels, calibrated with a gain/offset LUT
    Radarsat2,
    /// One multi-band complex volume, calibrated with a constant factor
    AlosPalsar,
}

impl std::fmt::Display for Sensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Sensor::Radarsat2 => write!(f, "RADARSAT-2"),
            Sensor::AlosPalsar => write!(f, "ALOS-PALSAR"),
        }
    }
}

/// Compact-pol acquisition mode to simulate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CompactPolMode {
    /// Hybrid mode, right-circular transmit, linear H/V receive
    RightHybrid,
    /// Hybrid mode, left-circular transmit, linear H/V receive
    LeftHybrid,
    /// Linear transmit at 45 degrees, linear H/V receive
    QuarterPi,
}

impl CompactPolMode {
    /// Convert three independent checkbox states into a single mode.
    ///
    /// Exactly one flag must be set; anything else is a selection error.
    pub fn from_flags(right_hybrid: bool, left_hybrid: bool, quarter_pi: bool) -> SarResult<Self> {
        let selected: Vec<CompactPolMode> = [
            (right_hybrid, CompactPolMode::RightHybrid),
            (left_hybrid, CompactPolMode::LeftHybrid),
            (quarter_pi, CompactPolMode::QuarterPi),
        ]
        .into_iter()
        .filter_map(|(flag, mode)| flag.then_some(mode))
        .collect();

        match selected.as_slice() {
            [mode] => Ok(*mode),
            [] => Err(SarError::Selection(
                "Please select one of the simulation modes (RHV, LHV, or Pi/4)".to_string(),
            )),
            many => Err(SarError::Selection(format!(
                "Simulation modes are mutually exclusive, got {:?}",
                many
            ))),
        }
    }

    /// Suffix used in output directory names
    pub fn suffix(&self) -> &'static str {
        match self {
            CompactPolMode::RightHybrid => "RHV",
            CompactPolMode::LeftHybrid => "LHV",
            CompactPolMode::QuarterPi => "pi4",
        }
    }
}

impl Default for CompactPolMode {
    fn default() -> Self {
        CompactPolMode::RightHybrid
    }
}

impl std::fmt::Display for CompactPolMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.suffix())
    }
}

impl FromStr for CompactPolMode {
    type Err = SarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "rhv" | "right" | "right-hybrid" => Ok(CompactPolMode::RightHybrid),
            "lhv" | "left" | "left-hybrid" => Ok(CompactPolMode::LeftHybrid),
            "pi4" | "pi/4" | "quarter-pi" => Ok(CompactPolMode::QuarterPi),
            _ => Err(SarError::Selection(format!("Unknown compact-pol mode: {}", s))),
        }
    }
}

/// Products that can be generated from a simulated compact-pol vector
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Feature {
    /// The dual-channel scattering vector (S1, S2)
    Scattering,
    /// The 2x2 covariance matrix (C11, C12, C22)
    Covariance,
}

impl std::fmt::Display for Feature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Feature::Scattering => write!(f, "scattering"),
            Feature::Covariance => write!(f, "covariance"),
        }
    }
}

impl FromStr for Feature {
    type Err = SarError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "scattering" | "s2" => Ok(Feature::Scattering),
            "covariance" | "c2" => Ok(Feature::Covariance),
            _ => Err(SarError::Selection(format!("Unknown feature: {}", s))),
        }
    }
}

/// Non-empty set of requested features.
///
/// The only constructors reject an empty selection, so a `FeatureSet` in hand
/// always names at least one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Feature>", into = "Vec<Feature>")]
pub struct FeatureSet(BTreeSet<Feature>);

impl FeatureSet {
    pub fn new<I: IntoIterator<Item = Feature>>(features: I) -> SarResult<Self> {
        let set: BTreeSet<Feature> = features.into_iter().collect();
        if set.is_empty() {
            return Err(SarError::Selection(
                "Please select at least one feature (Scattering vector or Covariance matrix)"
                    .to_string(),
            ));
        }
        Ok(Self(set))
    }

    pub fn from_flags(scattering: bool, covariance: bool) -> SarResult<Self> {
        let mut features = Vec::new();
        if scattering {
            features.push(Feature::Scattering);
        }
        if covariance {
            features.push(Feature::Covariance);
        }
        Self::new(features)
    }

    pub fn all() -> Self {
        Self([Feature::Scattering, Feature::Covariance].into_iter().collect())
    }

    pub fn contains(&self, feature: Feature) -> bool {
        self.0.contains(&feature)
    }

    pub fn iter(&self) -> impl Iterator<Item = Feature> + '_ {
        self.0.iter().copied()
    }
}

impl Default for FeatureSet {
    fn default() -> Self {
        Self::all()
    }
}

impl TryFrom<Vec<Feature>> for FeatureSet {
    type Error = SarError;

    fn try_from(value: Vec<Feature>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<FeatureSet> for Vec<Feature> {
    fn from(value: FeatureSet) -> Self {
        value.0.into_iter().collect()
    }
}

/// Georeference copied from a reference raster onto every output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoReference {
    /// Raster size as (rows, cols)
    pub shape: (usize, usize),
    /// GDAL affine transform, absent for rasters in pure image geometry
    pub geo_transform: Option<[f64; 6]>,
    /// Projection as WKT, empty when the source has none
    pub projection: String,
    /// Short name of the driver the reference was read with
    pub driver: String,
}

/// Error types for compact-pol processing
#[derive(Debug, thiserror::Error)]
pub enum SarError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GDAL error: {0}")]
    Gdal(#[from] gdal::errors::GdalError),

    #[error("XML parsing error: {0}")]
    XmlParsing(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Shape mismatch in {context}: expected {expected:?}, found {found:?}")]
    ShapeMismatch {
        context: String,
        expected: (usize, usize),
        found: (usize, usize),
    },

    #[error("Calibration error: {0}")]
    Calibration(String),

    #[error("Selection error: {0}")]
    Selection(String),
}

impl SarError {
    /// Stable short label for the failure kind
    pub fn kind(&self) -> &'static str {
        match self {
            SarError::Io(_) | SarError::Gdal(_) => "io",
            SarError::XmlParsing(_) => "parse",
            SarError::Validation(_) => "validation",
            SarError::ShapeMismatch { .. } => "shape",
            SarError::Calibration(_) => "calibration",
            SarError::Selection(_) => "selection",
        }
    }
}

/// Result type for compact-pol operations
pub type SarResult<T> = Result<T, SarError>;
