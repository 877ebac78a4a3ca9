//! Compact-pol mode simulation from the reciprocal scattering matrix
//!
//! Each mode is a fixed linear combination of S11, S12 and S22 scaled by 1/sqrt(2):
//!
//! | mode          | S1                 | S2                 |
//! |---------------|--------------------|--------------------|
//! | right hybrid  | S11 - j S12        | S12 - j S22        |
//! | left hybrid   | S11 + j S12        | S12 + j S22        |
//! | pi/4          | S11 + S12          | S22 + S12          |

use crate::core::scattering::ScatteringMatrix;
use crate::core::validation::ensure_same_shape;
use crate::types::{CompactPolMode, SarComplex, SarImage, SarResult};
use ndarray::Zip;
use std::f32::consts::FRAC_1_SQRT_2;

/// Simulated dual-channel compact-pol scattering vector
#[derive(Debug, Clone, PartialEq)]
pub struct CompactPolVector {
    pub mode: CompactPolMode,
    pub s1: SarImage,
    pub s2: SarImage,
}

impl CompactPolVector {
    pub fn dim(&self) -> (usize, usize) {
        self.s1.dim()
    }
}

/// Per-pixel transform for one mode
#[inline]
pub fn simulate_pixel(
    mode: CompactPolMode,
    s11: SarComplex,
    s12: SarComplex,
    s22: SarComplex,
) -> (SarComplex, SarComplex) {
    let j = SarComplex::i();
    let (s1, s2) = match mode {
        CompactPolMode::RightHybrid => (s11 - j * s12, s12 - j * s22),
        CompactPolMode::LeftHybrid => (s11 + j * s12, s12 + j * s22),
        CompactPolMode::QuarterPi => (s11 + s12, s22 + s12),
    };
    (s1 * FRAC_1_SQRT_2, s2 * FRAC_1_SQRT_2)
}

/// Apply the selected mode transform to a whole scattering matrix
pub fn simulate(mode: CompactPolMode, matrix: &ScatteringMatrix) -> SarResult<CompactPolVector> {
    let (rows, cols) = ensure_same_shape(
        "mode simulation",
        &[
            ("S11", matrix.s11.dim()),
            ("S12", matrix.s12.dim()),
            ("S22", matrix.s22.dim()),
        ],
    )?;
    log::info!("Simulating {} compact-pol mode on {}x{} pixels", mode, rows, cols);

    let mut s1 = SarImage::zeros((rows, cols));
    let mut s2 = SarImage::zeros((rows, cols));
    let zip = Zip::from(&mut s1)
        .and(&mut s2)
        .and(&matrix.s11)
        .and(&matrix.s12)
        .and(&matrix.s22);
    let transform = |o1: &mut SarComplex, o2: &mut SarComplex, a: &SarComplex, b: &SarComplex, c: &SarComplex| {
        (*o1, *o2) = simulate_pixel(mode, *a, *b, *c);
    };

    #[cfg(feature = "parallel")]
    zip.par_for_each(transform);

    #[cfg(not(feature = "parallel"))]
    zip.for_each(transform);

    Ok(CompactPolVector { mode, s1, s2 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn c(re: f32, im: f32) -> SarComplex {
        SarComplex::new(re, im)
    }

    #[test]
    fn test_right_hybrid_worked_example() {
        let (s1, s2) = simulate_pixel(CompactPolMode::RightHybrid, c(2.0, 3.0), c(1.0, -1.0), c(0.0, 2.0));
        assert!((s1 - c(0.70711, 1.41421)).norm() < 1e-4, "s1 = {}", s1);
        assert!((s2 - c(2.12132, -0.70711)).norm() < 1e-4, "s2 = {}", s2);
    }

    #[test]
    fn test_left_hybrid_and_quarter_pi() {
        let (s1, s2) = simulate_pixel(CompactPolMode::LeftHybrid, c(2.0, 3.0), c(1.0, -1.0), c(0.0, 2.0));
        // S11 + jS12 = 3+4j, S12 + jS22 = -1-1j
        assert!((s1 - c(3.0, 4.0) * FRAC_1_SQRT_2).norm() < 1e-6);
        assert!((s2 - c(-1.0, -1.0) * FRAC_1_SQRT_2).norm() < 1e-6);

        let (p1, p2) = simulate_pixel(CompactPolMode::QuarterPi, c(2.0, 3.0), c(1.0, -1.0), c(0.0, 2.0));
        assert!((p1 - c(3.0, 2.0) * FRAC_1_SQRT_2).norm() < 1e-6);
        assert!((p2 - c(1.0, 1.0) * FRAC_1_SQRT_2).norm() < 1e-6);
    }

    #[test]
    fn test_simulate_array_matches_pixel_transform() {
        let matrix = ScatteringMatrix::from_elements(
            array![[c(2.0, 3.0), c(0.0, 0.0)], [c(-1.5, 0.25), c(4.0, -4.0)]],
            array![[c(1.0, -1.0), c(0.5, 0.5)], [c(0.0, 2.0), c(-3.0, 1.0)]],
            array![[c(0.0, 2.0), c(1.0, 0.0)], [c(2.5, -0.5), c(0.1, 0.2)]],
        )
        .unwrap();

        for mode in [CompactPolMode::RightHybrid, CompactPolMode::LeftHybrid, CompactPolMode::QuarterPi] {
            let v = simulate(mode, &matrix).unwrap();
            assert_eq!(v.dim(), (2, 2));
            assert_eq!(v.mode, mode);
            for ((r, col), &s1) in v.s1.indexed_iter() {
                let expected = simulate_pixel(mode, matrix.s11[[r, col]], matrix.s12[[r, col]], matrix.s22[[r, col]]);
                assert_eq!(s1, expected.0);
                assert_eq!(v.s2[[r, col]], expected.1);
            }
        }
    }

    #[test]
    fn test_simulation_is_repeatable() {
        let matrix = ScatteringMatrix::from_elements(
            array![[c(0.3, -0.7), c(11.0, 0.01)]],
            array![[c(-2.0, 0.4), c(0.0, -9.5)]],
            array![[c(1e-4, 3.0), c(-0.6, 0.6)]],
        )
        .unwrap();
        let first = simulate(CompactPolMode::LeftHybrid, &matrix).unwrap();
        let second = simulate(CompactPolMode::LeftHybrid, &matrix).unwrap();
        assert_eq!(first, second);
    }
}
