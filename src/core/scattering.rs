use crate::core::calibrate::{CalibratedChannels, IqPair};
use crate::core::validation::ensure_same_shape;
use crate::types::{SarComplex, SarImage, SarResult};
use ndarray::Zip;

/// Reciprocal scattering matrix of a quad-pol acquisition.
///
/// S12 holds the arithmetic mean of the HV and VH channels.
#[derive(Debug, Clone, PartialEq)]
pub struct ScatteringMatrix {
    pub s11: SarImage,
    pub s12: SarImage,
    pub s22: SarImage,
}

impl ScatteringMatrix {
    /// Build from the calibrated I/Q of all four channels
    pub fn from_calibrated(channels: &CalibratedChannels) -> SarResult<Self> {
        Self::from_iq(&channels.hh, &channels.hv, &channels.vh, &channels.vv)
    }

    pub fn from_iq(hh: &IqPair, hv: &IqPair, vh: &IqPair, vv: &IqPair) -> SarResult<Self> {
        let (rows, cols) = ensure_same_shape(
            "scattering matrix",
            &[
                ("I_HH", hh.i.dim()),
                ("Q_HH", hh.q.dim()),
                ("I_HV", hv.i.dim()),
                ("Q_HV", hv.q.dim()),
                ("I_VH", vh.i.dim()),
                ("Q_VH", vh.q.dim()),
                ("I_VV", vv.i.dim()),
                ("Q_VV", vv.q.dim()),
            ],
        )?;
        log::debug!("Building {}x{} scattering matrix", rows, cols);

        let s11 = hh.to_complex();
        let s22 = vv.to_complex();

        // Average I and Q separately, then form the complex value
        let s12 = Zip::from(&hv.i)
            .and(&vh.i)
            .and(&hv.q)
            .and(&vh.q)
            .map_collect(|&i_hv, &i_vh, &q_hv, &q_vh| {
                SarComplex::new((i_hv + i_vh) / 2.0, (q_hv + q_vh) / 2.0)
            });

        Ok(Self { s11, s12, s22 })
    }

    /// Build directly from complex element arrays
    pub fn from_elements(s11: SarImage, s12: SarImage, s22: SarImage) -> SarResult<Self> {
        ensure_same_shape(
            "scattering matrix",
            &[("S11", s11.dim()), ("S12", s12.dim()), ("S22", s22.dim())],
        )?;
        Ok(Self { s11, s12, s22 })
    }

    pub fn dim(&self) -> (usize, usize) {
        self.s11.dim()
    }

    /// Total power |S11|^2 + 2|S12|^2 + |S22|^2 per pixel
    pub fn span(&self) -> ndarray::Array2<f32> {
        Zip::from(&self.s11)
            .and(&self.s12)
            .and(&self.s22)
            .map_collect(|a, b, c| a.norm_sqr() + 2.0 * b.norm_sqr() + c.norm_sqr())
    }
}
