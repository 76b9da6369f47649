//! Built-in displacement functions.

/// Absolute difference between two scalar positions.
///
/// Computes |b - a|
#[inline]
pub fn absolute_difference(a: f64, b: f64) -> f64 {
    (b - a).abs()
}

/// Euclidean distance between two planar positions.
///
/// Computes sqrt((bx - ax)^2 + (by - ay)^2)
#[inline]
pub fn euclidean(a: [f64; 2], b: [f64; 2]) -> f64 {
    (b[0] - a[0]).hypot(b[1] - a[1])
}

/// Distance between two planar positions measured along a single axis.
#[inline]
pub fn axis_difference(a: [f64; 2], b: [f64; 2], axis: usize) -> f64 {
    absolute_difference(a[axis], b[axis])
}
