pub mod demonstrations;
pub mod features;
pub mod maxent;

#[cfg(test)]
mod tests;

use ndarray::Array1;
use num_traits::Float;

pub use demonstrations::{
    generate_demonstrations, generate_demonstrations_par, DemonstrationOptions, Episode, StartMode,
};
pub use features::FeatureKind;
pub use maxent::{MaxEntConfig, MaxEntIrl, MaxEntResult, ThetaInit};

/// Rescales `values` linearly onto `[0, 1]`.
///
/// A constant vector maps to all zeros.
pub fn normalize<T: Float>(values: &Array1<T>) -> Array1<T> {
    let min = values.iter().fold(T::infinity(), |m, &v| m.min(v));
    let max = values.iter().fold(T::neg_infinity(), |m, &v| m.max(v));
    let range = max - min;
    if !(range > T::zero()) {
        return Array1::from_elem(values.len(), T::zero());
    }
    values.mapv(|v| (v - min) / range)
}
