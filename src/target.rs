//! Target transform: the forest is fitted on `ln(1 + rent)`.

use ndarray::Array1;

/// `ln(1 + rent)`, numerically stable near zero.
pub fn forward(rent: f64) -> f64 {
    rent.ln_1p()
}

/// Exact inverse of [`forward`]: `exp(y) - 1`.
pub fn inverse(y: f64) -> f64 {
    y.exp_m1()
}

pub fn forward_all(rents: &[f64]) -> Array1<f64> {
    rents.iter().copied().map(forward).collect()
}

pub fn inverse_all(values: &Array1<f64>) -> Vec<f64> {
    values.iter().copied().map(inverse).collect()
}
