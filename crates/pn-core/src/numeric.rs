/// Floating point type used throughout system
pub type Real = f64;

/// Arithmetic mean of the finite entries, `None` when there are none.
pub fn finite_mean(values: &[Real]) -> Option<Real> {
    let (sum, count) = values
        .iter()
        .filter(|v| v.is_finite())
        .fold((0.0, 0usize), |(s, n), v| (s + v, n + 1));
    (count > 0).then(|| sum / count as Real)
}
