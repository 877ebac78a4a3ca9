use crate::core::simulate::CompactPolVector;
use crate::core::validation::ensure_same_shape;
use crate::types::{SarComplex, SarImage, SarRealImage, SarResult};
use ndarray::Zip;

/// 2x2 Hermitian covariance matrix of a compact-pol vector.
///
/// `[[C11, C12], [conj(C12), C22]]`, positive semi-definite by construction.
#[derive(Debug, Clone, PartialEq)]
pub struct CovarianceMatrix {
    pub c11: SarRealImage,
    pub c12: SarImage,
    pub c22: SarRealImage,
}

impl CovarianceMatrix {
    pub fn from_vector(vector: &CompactPolVector) -> SarResult<Self> {
        Self::from_channels(&vector.s1, &vector.s2)
    }

    pub fn from_channels(s1: &SarImage, s2: &SarImage) -> SarResult<Self> {
        let (rows, cols) = ensure_same_shape("covariance matrix", &[("S1", s1.dim()), ("S2", s2.dim())])?;
        log::info!("Computing {}x{} covariance matrix", rows, cols);

        // Re(S * conj(S)) is exactly |S|^2
        let mut c11 = SarRealImage::zeros((rows, cols));
        let mut c12 = SarImage::zeros((rows, cols));
        let mut c22 = SarRealImage::zeros((rows, cols));
        let zip = Zip::from(&mut c11).and(&mut c12).and(&mut c22).and(s1).and(s2);
        let products = |p11: &mut f32, p12: &mut SarComplex, p22: &mut f32, a: &SarComplex, b: &SarComplex| {
            *p11 = a.norm_sqr();
            *p12 = a * b.conj();
            *p22 = b.norm_sqr();
        };

        #[cfg(feature = "parallel")]
        zip.par_for_each(products);

        #[cfg(not(feature = "parallel"))]
        zip.for_each(products);

        Ok(Self { c11, c12, c22 })
    }

    /// Lower off-diagonal element, conj(C12)
    pub fn c21(&self) -> SarImage {
        self.c12.mapv(|c| c.conj())
    }

    pub fn dim(&self) -> (usize, usize) {
        self.c11.dim()
    }

    /// Per-pixel determinant C11*C22 - |C12|^2 (zero for a single look)
    pub fn determinant(&self) -> SarRealImage {
        Zip::from(&self.c11)
            .and(&self.c12)
            .and(&self.c22)
            .map_collect(|&a, b, &d| a * d - b.norm_sqr())
    }
}
