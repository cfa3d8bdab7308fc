use std::ops::{Mul, Sub};

/// Richardson extrapolation of a sequence of approximations to its limit.
///
/// `values[i]` is assumed to be computed with step size `h / step_ratio^i`, so later entries
/// are more accurate. Each level of the extrapolation table eliminates one further power of
/// the step size from the error expansion.
///
/// # Panics
///
/// Panics if fewer than two values are given.
pub fn richardson_limit<T>(step_ratio: f64, values: &[T]) -> T
where
    T: Clone + Sub<T, Output = T> + Mul<f64, Output = T>,
{
    assert!(
        values.len() > 1,
        "Richardson extrapolation requires at least two values"
    );

    let mut level = values.to_vec();
    for m in 1..values.len() {
        let mult = step_ratio.powi(m as i32);
        let factor = 1.0 / (mult - 1.0);
        level = level
            .windows(2)
            .map(|pair| {
                let low = pair[0].clone();
                let high = pair[1].clone();
                (high * mult - low) * factor
            })
            .collect();
    }

    level
        .pop()
        .expect("The final extrapolation level always contains exactly one value")
}
