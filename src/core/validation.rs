//! Shared array checks used at every stage boundary

use crate::types::{SarError, SarResult};
use ndarray::{ArrayBase, Data, Ix2};
use num_traits::Float;

/// Require every named array dimension to equal the first one.
///
/// `context` names the stage so the error says where the mismatch was found.
pub fn ensure_same_shape(context: &str, shapes: &[(&str, (usize, usize))]) -> SarResult<(usize, usize)> {
    let (first_name, expected) = match shapes.first() {
        Some(first) => *first,
        None => {
            return Err(SarError::Validation(format!("{}: no arrays supplied", context)));
        }
    };

    for (name, found) in &shapes[1..] {
        if *found != expected {
            log::error!(
                "{}: {} is {:?} but {} is {:?}",
                context, name, found, first_name, expected
            );
            return Err(SarError::ShapeMismatch {
                context: format!("{} ({} vs {})", context, name, first_name),
                expected,
                found: *found,
            });
        }
    }

    Ok(expected)
}

/// Require an array to have exactly the given (rows, cols)
pub fn ensure_shape<S, A>(context: &str, array: &ArrayBase<S, Ix2>, expected: (usize, usize)) -> SarResult<()>
where
    S: Data<Elem = A>,
{
    let found = array.dim();
    if found != expected {
        return Err(SarError::ShapeMismatch {
            context: context.to_string(),
            expected,
            found,
        });
    }
    Ok(())
}

/// Count the non-finite values in a real array
pub fn count_non_finite<S, F>(array: &ArrayBase<S, Ix2>) -> usize
where
    S: Data<Elem = F>,
    F: Float,
{
    array.iter().filter(|v| !v.is_finite()).count()
}

/// Summary statistics of a real array, used for diagnostic logging
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChannelStats {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std: f64,
}

impl ChannelStats {
    pub fn compute<S, F>(array: &ArrayBase<S, Ix2>) -> Self
    where
        S: Data<Elem = F>,
        F: Float,
    {
        let n = array.len();
        if n == 0 {
            return Self { min: 0.0, max: 0.0, mean: 0.0, std: 0.0 };
        }

        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut sum = 0.0;
        for v in array.iter().filter_map(|v| v.to_f64()) {
            min = min.min(v);
            max = max.max(v);
            sum += v;
        }
        let mean = sum / n as f64;
        let var = array
            .iter()
            .filter_map(|v| v.to_f64())
            .map(|v| (v - mean) * (v - mean))
            .sum::<f64>()
            / n as f64;

        Self { min, max, mean, std: var.sqrt() }
    }
}

impl std::fmt::Display for ChannelStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "min={:.4e} max={:.4e} mean={:.4e} std={:.4e}",
            self.min, self.max, self.mean, self.std
        )
    }
}
