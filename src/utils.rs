//! Utility functions for groundspeed.

use nalgebra::DMatrix;

use crate::{Error, Result};

/// Validate that points have shape (n_points, 2).
///
/// Zero rows is a valid (empty) point set.
pub fn validate_points(points: &DMatrix<f64>) -> Result<&DMatrix<f64>> {
    let (rows, cols) = points.shape();

    if cols != 2 {
        return Err(Error::InvalidPointsShape {
            expected: "(n_points, 2)".to_string(),
            got: format!("({}, {})", rows, cols),
        });
    }

    Ok(points)
}

/// Convert an `(n, 2)` matrix into a vector of points, row by row.
pub fn matrix_to_points(points: &DMatrix<f64>) -> Vec<[f64; 2]> {
    points
        .row_iter()
        .map(|row| [row[0], row[1]])
        .collect()
}

/// Convert points into an `(n, 2)` matrix.
pub fn points_to_matrix(points: &[[f64; 2]]) -> DMatrix<f64> {
    DMatrix::from_fn(points.len(), 2, |i, j| points[i][j])
}

/// Axis-aligned bounds `(min_x, min_y, max_x, max_y)` of a point set.
///
/// Returns `None` for an empty set.
pub fn get_bounding_box(points: &[[f64; 2]]) -> Option<(f64, f64, f64, f64)> {
    let first = points.first()?;

    let mut min_x = first[0];
    let mut max_x = first[0];
    let mut min_y = first[1];
    let mut max_y = first[1];

    for &[x, y] in &points[1..] {
        if x < min_x { min_x = x; }
        if x > max_x { max_x = x; }
        if y < min_y { min_y = y; }
        if y > max_y { max_y = y; }
    }

    Some((min_x, min_y, max_x, max_y))
}
