use crate::core::validation::{count_non_finite, ensure_same_shape, ChannelStats};
use crate::types::{Polarization, SarComplex, SarError, SarImage, SarRealImage, SarResult};
use ndarray::{Array1, ArrayView2, Zip};
use serde::{Deserialize, Serialize};

/// Calibrated in-phase / quadrature components of one channel
#[derive(Debug, Clone, PartialEq)]
pub struct IqPair {
    pub i: SarRealImage,
    pub q: SarRealImage,
}

impl IqPair {
    pub fn new(i: SarRealImage, q: SarRealImage) -> SarResult<Self> {
        ensure_same_shape("I/Q pair", &[("I", i.dim()), ("Q", q.dim())])?;
        Ok(Self { i, q })
    }

    /// (rows, cols) shared by both components
    pub fn dim(&self) -> (usize, usize) {
        self.i.dim()
    }

    /// Per-pixel power I^2 + Q^2
    pub fn power(&self) -> SarRealImage {
        Zip::from(&self.i).and(&self.q).map_collect(|&i, &q| i * i + q * q)
    }

    /// Combine into I + jQ
    pub fn to_complex(&self) -> SarImage {
        Zip::from(&self.i)
            .and(&self.q)
            .map_collect(|&i, &q| SarComplex::new(i, q))
    }
}

/// Raw quad-pol channel set, one complex array per polarization
#[derive(Debug, Clone)]
pub struct QuadPolChannels {
    hh: SarImage,
    hv: SarImage,
    vh: SarImage,
    vv: SarImage,
}

impl QuadPolChannels {
    /// Bundle four raw channels, rejecting differing dimensions
    pub fn new(hh: SarImage, hv: SarImage, vh: SarImage, vv: SarImage) -> SarResult<Self> {
        ensure_same_shape(
            "quad-pol channel set",
            &[
                ("HH", hh.dim()),
                ("HV", hv.dim()),
                ("VH", vh.dim()),
                ("VV", vv.dim()),
            ],
        )?;
        Ok(Self { hh, hv, vh, vv })
    }

    pub fn get(&self, pol: Polarization) -> &SarImage {
        match pol {
            Polarization::HH => &self.hh,
            Polarization::HV => &self.hv,
            Polarization::VH => &self.vh,
            Polarization::VV => &self.vv,
        }
    }

    pub fn dim(&self) -> (usize, usize) {
        self.hh.dim()
    }
}

/// Calibrated I/Q for all four channels
#[derive(Debug, Clone)]
pub struct CalibratedChannels {
    pub hh: IqPair,
    pub hv: IqPair,
    pub vh: IqPair,
    pub vv: IqPair,
}

impl CalibratedChannels {
    pub fn get(&self, pol: Polarization) -> &IqPair {
        match pol {
            Polarization::HH => &self.hh,
            Polarization::HV => &self.hv,
            Polarization::VH => &self.vh,
            Polarization::VV => &self.vv,
        }
    }

    pub fn dim(&self) -> (usize, usize) {
        self.hh.dim()
    }
}

/// Gain/offset look-up-table calibration (RADARSAT-2 style).
///
/// One gain per image column; the same gain row applies to every image line:
/// `I = (Re(raw) - offset) / gain[col]`, `Q = (Im(raw) - offset) / gain[col]`.
#[derive(Debug, Clone, PartialEq)]
pub struct TableCalibration {
    offset: f32,
    gains: Array1<f32>,
}

impl TableCalibration {
    pub fn new(offset: f32, gains: Vec<f32>) -> SarResult<Self> {
        if !offset.is_finite() {
            return Err(SarError::Calibration(format!("Non-finite LUT offset: {}", offset)));
        }
        if gains.is_empty() {
            return Err(SarError::Validation("Calibration LUT has no gains".to_string()));
        }
        if let Some((col, g)) = gains
            .iter()
            .enumerate()
            .find(|(_, g)| !g.is_finite() || **g == 0.0)
        {
            return Err(SarError::Calibration(format!(
                "Gain at column {} is {}; division would produce non-finite values",
                col, g
            )));
        }

        Ok(Self {
            offset,
            gains: Array1::from(gains),
        })
    }

    pub fn offset(&self) -> f32 {
        self.offset
    }

    pub fn gains(&self) -> &Array1<f32> {
        &self.gains
    }

    /// Calibrate one raw channel whose real part holds I counts and imaginary part Q counts
    pub fn calibrate(&self, raw: &SarImage) -> SarResult<IqPair> {
        let (rows, cols) = raw.dim();

        // Tiling is only valid when there is exactly one gain per column.
        if self.gains.len() != cols {
            return Err(SarError::Validation(format!(
                "Gain vector length {} does not match image column count {}",
                self.gains.len(),
                cols
            )));
        }
        let tiled = self.gains.broadcast((rows, cols)).ok_or_else(|| {
            SarError::Validation(format!(
                "Cannot tile {} gains over a {}x{} image",
                self.gains.len(),
                rows,
                cols
            ))
        })?;

        let i = apply_table(raw, tiled, self.offset, |s| s.re);
        let q = apply_table(raw, tiled, self.offset, |s| s.im);

        ensure_finite(IqPair { i, q }, "LUT")
    }
}

fn ensure_finite(iq: IqPair, source: &str) -> SarResult<IqPair> {
    let bad = count_non_finite(&iq.i) + count_non_finite(&iq.q);
    if bad > 0 {
        return Err(SarError::Calibration(format!(
            "{} non-finite values produced by {} calibration",
            bad, source
        )));
    }
    Ok(iq)
}

fn apply_table(
    raw: &SarImage,
    gains: ArrayView2<'_, f32>,
    offset: f32,
    component: fn(&SarComplex) -> f32,
) -> SarRealImage {
    let zip = Zip::from(raw).and(gains);

    #[cfg(feature = "parallel")]
    let calibrated = zip.par_map_collect(move |s, &g| (component(s) - offset) / g);

    #[cfg(not(feature = "parallel"))]
    let calibrated = zip.map_collect(move |s, &g| (component(s) - offset) / g);

    calibrated
}

/// Result of constant-factor calibration, including diagnostic products
#[derive(Debug, Clone)]
pub struct ConstantCalibrated {
    pub iq: IqPair,
    /// |raw| * sqrt(factor)
    pub intensity: SarRealImage,
    /// |raw|^2 * factor
    pub sigma0: SarRealImage,
}

/// Constant-factor calibration for log-scale calibrated sensors (ALOS-PALSAR style)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstantCalibration {
    linear_factor: f64,
}

impl ConstantCalibration {
    pub fn new(linear_factor: f64) -> SarResult<Self> {
        if !linear_factor.is_finite() || linear_factor <= 0.0 {
            return Err(SarError::Calibration(format!(
                "Calibration factor must be positive and finite, got {}",
                linear_factor
            )));
        }
        Ok(Self { linear_factor })
    }

    /// Build from a calibration constant and its offset, both in dB
    pub fn from_db(cf_db: f64, cf_offset_db: f64) -> SarResult<Self> {
        Self::new(db_to_linear(cf_db - cf_offset_db))
    }

    pub fn linear_factor(&self) -> f64 {
        self.linear_factor
    }

    pub fn calibrate(&self, raw: &SarImage) -> IqPair {
        let scale = self.linear_factor.sqrt() as f32;
        IqPair {
            i: raw.mapv(|s| s.re * scale),
            q: raw.mapv(|s| s.im * scale),
        }
    }

    /// Calibrate and also derive intensity and sigma0
    pub fn calibrate_full(&self, raw: &SarImage) -> ConstantCalibrated {
        let factor = self.linear_factor;
        let scale = factor.sqrt();

        ConstantCalibrated {
            iq: self.calibrate(raw),
            intensity: raw.mapv(|s| (s.norm() as f64 * scale) as f32),
            sigma0: raw.mapv(|s| (s.norm_sqr() as f64 * factor) as f32),
        }
    }
}

/// Calibration constant and offset (dB) for constant-factor sensors
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AlosCalibrationConstants {
    pub cf_db: f64,
    pub cf_offset_db: f64,
}

impl Default for AlosCalibrationConstants {
    fn default() -> Self {
        Self {
            cf_db: -83.0,
            cf_offset_db: 32.0,
        }
    }
}

impl AlosCalibrationConstants {
    pub fn to_calibration(&self) -> SarResult<ConstantCalibration> {
        ConstantCalibration::from_db(self.cf_db, self.cf_offset_db)
    }
}

/// Sensor calibration, selected once when the input is acquired
#[derive(Debug, Clone, PartialEq)]
pub enum Calibrator {
    Table(TableCalibration),
    Constant(ConstantCalibration),
}

impl Calibrator {
    pub fn name(&self) -> &'static str {
        match self {
            Calibrator::Table(_) => "gain/offset LUT",
            Calibrator::Constant(_) => "constant factor",
        }
    }

    /// Calibrate one raw channel
    pub fn calibrate(&self, raw: &SarImage) -> SarResult<IqPair> {
        match self {
            Calibrator::Table(table) => table.calibrate(raw),
            Calibrator::Constant(constant) => ensure_finite(constant.calibrate(raw), "constant-factor"),
        }
    }

    /// Calibrate all four channels; on failure the first bad channel in HH, HV, VH, VV order is reported
    pub fn calibrate_channels(&self, channels: &QuadPolChannels) -> SarResult<CalibratedChannels> {
        let (rows, cols) = channels.dim();
        log::info!("Applying {} calibration to {}x{} quad-pol channels", self.name(), rows, cols);

        let calibrate_one = |pol: Polarization| -> SarResult<IqPair> {
            let iq = self.calibrate(channels.get(pol)).map_err(|e| match e {
                SarError::Calibration(msg) => SarError::Calibration(format!("{}: {}", pol, msg)),
                SarError::Validation(msg) => SarError::Validation(format!("{}: {}", pol, msg)),
                other => other,
            })?;
            if log::log_enabled!(log::Level::Debug) {
                log::debug!("{} I: {}", pol, ChannelStats::compute(&iq.i));
                log::debug!("{} Q: {}", pol, ChannelStats::compute(&iq.q));
                log::debug!("{} power [dB]: {}", pol, ChannelStats::compute(&to_db(&iq.power())));
            }
            Ok(iq)
        };

        #[cfg(feature = "parallel")]
        let results: Vec<SarResult<IqPair>> = {
            use rayon::prelude::*;
            Polarization::ALL.par_iter().map(|&pol| calibrate_one(pol)).collect()
        };

        #[cfg(not(feature = "parallel"))]
        let results: Vec<SarResult<IqPair>> = Polarization::ALL.iter().map(|&pol| calibrate_one(pol)).collect();

        let mut iqs = results.into_iter().collect::<SarResult<Vec<_>>>()?.into_iter();
        let calibrated = match (iqs.next(), iqs.next(), iqs.next(), iqs.next()) {
            (Some(hh), Some(hv), Some(vh), Some(vv)) => CalibratedChannels { hh, hv, vh, vv },
            _ => return Err(SarError::Validation("Calibration did not return four channels".to_string())),
        };

        log::info!("{} calibration successfully applied on all bands", self.name());
        Ok(calibrated)
    }
}

/// Convert a dB value to linear scale
pub fn db_to_linear(db: f64) -> f64 {
    10f64.powf(db / 10.0)
}

/// Power values in dB, with non-positive values clamped to `DB_FLOOR`
pub fn to_db(power: &SarRealImage) -> SarRealImage {
    power.mapv(|p| if p > 0.0 { 10.0 * p.log10() } else { DB_FLOOR })
}

pub const DB_FLOOR: f32 = -50.0;
