use crate::core::calibrate::TableCalibration;
use crate::types::{SarError, SarResult};
use quick_xml::de::from_str;
use serde::Deserialize;
use std::path::Path;

/// Raw layout of a gain/offset LUT document.
///
/// The root element name is not checked; only its `offset` and `gains` children matter.
#[derive(Debug, Deserialize)]
struct LutDocument {
    #[serde(rename = "offset")]
    offset: Option<String>,
    #[serde(rename = "gains")]
    gains: Option<String>,
}

/// Calibration look-up table: scalar offset plus one gain per image column
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationTable {
    pub offset: f32,
    pub gains: Vec<f32>,
}

impl CalibrationTable {
    /// Read and parse a LUT XML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> SarResult<Self> {
        let path = path.as_ref();
        log::info!("Reading calibration LUT: {}", path.display());
        let xml_content = std::fs::read_to_string(path)?;
        Self::from_xml_str(&xml_content)
    }

    /// Parse LUT XML content
    pub fn from_xml_str(xml_content: &str) -> SarResult<Self> {
        let doc: LutDocument = from_str(xml_content)
            .map_err(|e| SarError::XmlParsing(format!("Failed to parse calibration LUT: {}", e)))?;

        let offset_text = doc
            .offset
            .ok_or_else(|| SarError::Validation("Offset element not found in XML file".to_string()))?;
        let offset = offset_text.trim().parse::<f32>().map_err(|e| {
            SarError::Validation(format!("Invalid offset value '{}': {}", offset_text.trim(), e))
        })?;

        let gains_text = doc
            .gains
            .ok_or_else(|| SarError::Validation("Gains element not found in XML file".to_string()))?;
        let gains = parse_space_separated_numbers::<f32>(&gains_text)?;
        if gains.is_empty() {
            return Err(SarError::Validation("Gains element is empty".to_string()));
        }

        log::debug!("Parsed LUT: offset={} with {} gains", offset, gains.len());
        Ok(Self { offset, gains })
    }

    /// Require exactly one gain per image column
    pub fn validate_columns(&self, cols: usize) -> SarResult<()> {
        if self.gains.len() != cols {
            return Err(SarError::Validation(format!(
                "Calibration LUT has {} gains but the image has {} columns",
                self.gains.len(),
                cols
            )));
        }
        Ok(())
    }

    pub fn into_calibration(self) -> SarResult<TableCalibration> {
        TableCalibration::new(self.offset, self.gains)
    }
}

/// Parse space-separated numbers from a string
fn parse_space_separated_numbers<T>(input: &str) -> SarResult<Vec<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    input
        .split_whitespace()
        .enumerate()
        .map(|(idx, s)| {
            s.parse::<T>().map_err(|e| {
                SarError::Validation(format!("Invalid gain value '{}' at position {}: {}", s, idx, e))
            })
        })
        .collect()
}
