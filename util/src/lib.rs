//! Test helpers shared by the test targets of the workspace.

/// Poor man's approx assertion for matrices and vectors
#[macro_export]
macro_rules! assert_approx_matrix_eq {
    ($x:expr, $y:expr, abstol = $tol:expr) => {{
        let diff = $x - $y;

        let max_absdiff = diff.abs().max();
        let approx_eq = max_absdiff <= $tol;

        if !approx_eq {
            println!("abstol: {:e}", $tol);
            println!("left: {}", $x);
            println!("right: {}", $y);
            println!("diff: {:e}", diff);
        }
        assert!(approx_eq);
    }};
}

#[macro_export]
macro_rules! assert_panics {
    ($e:expr) => {{
        use std::panic::catch_unwind;
        use std::stringify;
        let expr_string = stringify!($e);
        let result = catch_unwind(|| $e);
        if result.is_ok() {
            panic!("assert_panics!({}) failed.", expr_string);
        }
    }};
}

/// The largest absolute difference between `approx` and `exact` relative to the largest
/// magnitude in `exact`.
///
/// # Panics
///
/// Panics if the slices have different lengths.
pub fn max_relative_error(approx: &[f64], exact: &[f64]) -> f64 {
    assert_eq!(approx.len(), exact.len(), "slices must have the same length");
    let scale = exact.iter().fold(0.0f64, |m, x| m.max(x.abs()));
    let max_diff = approx
        .iter()
        .zip(exact)
        .fold(0.0f64, |m, (a, b)| m.max((a - b).abs()));
    if scale > 0.0 {
        max_diff / scale
    } else {
        max_diff
    }
}

/// Start offsets of consecutive blocks with the given sizes, beginning at `x0`.
pub fn prefix_sum(counts: impl IntoIterator<Item = usize>, x0: usize) -> impl Iterator<Item = usize> {
    counts.into_iter().scan(x0, |sum, x| {
        let current = *sum;
        *sum += x;
        Some(current)
    })
}
