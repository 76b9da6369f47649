//! Homography estimation from four point correspondences.

use nalgebra::{Matrix3, SMatrix, SVector};

use crate::{Error, Result};

/// Four ordered 2D points: a quadrilateral in image space or a rectangle in target space.
pub type Quad = [[f64; 2]; 4];

/// Relative tolerance under which three points count as collinear.
///
/// Compared against the sine of the angle between the two edges spanned by the points.
const COLLINEAR_TOLERANCE: f64 = 1e-9;

/// Compute the 3x3 homography that maps each `source` point onto the matching `target` point.
///
/// Uses the normalized direct linear transform with `h33` fixed to 1, which leaves an
/// 8x8 linear system for exactly four correspondences. The returned matrix is scaled
/// so that `h33 == 1`.
///
/// # Errors
/// `Error::InvalidGeometry` when a coordinate is not finite, when any three points of
/// either quad are collinear, or when the linear system is singular.
pub fn find_homography(source: &Quad, target: &Quad) -> Result<Matrix3<f64>> {
    check_quad(source, "source")?;
    check_quad(target, "target")?;

    // Hartley normalization of both point sets
    let (source_norm, source_t) = normalize(source);
    let (target_norm, target_t_inv) = {
        let (pts, t) = normalize(target);
        (pts, denormalization(&t))
    };

    // For each correspondence (x, y) -> (x', y'):
    //   h11*x + h12*y + h13 - x'*x*h31 - x'*y*h32 = x'
    //   h21*x + h22*y + h23 - y'*x*h31 - y'*y*h32 = y'
    let mut a = SMatrix::<f64, 8, 8>::zeros();
    let mut b = SVector::<f64, 8>::zeros();

    for (i, (&[x, y], &[xp, yp])) in source_norm.iter().zip(target_norm.iter()).enumerate() {
        let row1 = i * 2;
        let row2 = row1 + 1;

        a[(row1, 0)] = x;
        a[(row1, 1)] = y;
        a[(row1, 2)] = 1.0;
        a[(row1, 6)] = -xp * x;
        a[(row1, 7)] = -xp * y;
        b[row1] = xp;

        a[(row2, 3)] = x;
        a[(row2, 4)] = y;
        a[(row2, 5)] = 1.0;
        a[(row2, 6)] = -yp * x;
        a[(row2, 7)] = -yp * y;
        b[row2] = yp;
    }

    let h = a.lu().solve(&b).ok_or_else(|| {
        Error::InvalidGeometry("point correspondences do not determine a homography".to_string())
    })?;

    let normalized = Matrix3::new(h[0], h[1], h[2], h[3], h[4], h[5], h[6], h[7], 1.0);
    let mut matrix = target_t_inv * normalized * source_t;

    // Rescale so h33 = 1 where possible, otherwise to unit Frobenius norm
    let scale = if matrix[(2, 2)].abs() > f64::EPSILON {
        matrix[(2, 2)]
    } else {
        matrix.norm()
    };
    matrix /= scale;

    if matrix.iter().any(|v| !v.is_finite()) {
        return Err(Error::InvalidGeometry(
            "homography has non-finite entries".to_string(),
        ));
    }

    Ok(matrix)
}

/// Similarity transform moving the centroid to the origin with mean distance sqrt(2).
fn normalize(quad: &Quad) -> (Quad, Matrix3<f64>) {
    let cx = quad.iter().map(|p| p[0]).sum::<f64>() / 4.0;
    let cy = quad.iter().map(|p| p[1]).sum::<f64>() / 4.0;
    let mean_dist = quad
        .iter()
        .map(|p| (p[0] - cx).hypot(p[1] - cy))
        .sum::<f64>()
        / 4.0;
    let s = std::f64::consts::SQRT_2 / mean_dist;

    let mut out = [[0.0; 2]; 4];
    for (dst, src) in out.iter_mut().zip(quad.iter()) {
        *dst = [(src[0] - cx) * s, (src[1] - cy) * s];
    }

    let t = Matrix3::new(s, 0.0, -s * cx, 0.0, s, -s * cy, 0.0, 0.0, 1.0);
    (out, t)
}

/// Inverse of a matrix produced by [`normalize`].
fn denormalization(t: &Matrix3<f64>) -> Matrix3<f64> {
    let s = t[(0, 0)];
    let cx = -t[(0, 2)] / s;
    let cy = -t[(1, 2)] / s;
    Matrix3::new(1.0 / s, 0.0, cx, 0.0, 1.0 / s, cy, 0.0, 0.0, 1.0)
}

/// Reject quads with non-finite coordinates or three collinear (or coincident) points.
fn check_quad(quad: &Quad, name: &str) -> Result<()> {
    if quad.iter().flatten().any(|v| !v.is_finite()) {
        return Err(Error::InvalidGeometry(format!(
            "{} view has non-finite coordinates: {:?}",
            name, quad
        )));
    }

    const TRIPLES: [[usize; 3]; 4] = [[0, 1, 2], [0, 1, 3], [0, 2, 3], [1, 2, 3]];
    for [i, j, k] in TRIPLES {
        if are_collinear(quad[i], quad[j], quad[k]) {
            return Err(Error::InvalidGeometry(format!(
                "{} view points {}, {} and {} are collinear: {:?}",
                name, i, j, k, quad
            )));
        }
    }

    Ok(())
}

fn are_collinear(a: [f64; 2], b: [f64; 2], c: [f64; 2]) -> bool {
    let ab = [b[0] - a[0], b[1] - a[1]];
    let ac = [c[0] - a[0], c[1] - a[1]];

    let cross = ab[0] * ac[1] - ab[1] * ac[0];
    let scale = ab[0].hypot(ab[1]) * ac[0].hypot(ac[1]);

    cross.abs() <= COLLINEAR_TOLERANCE * scale
}
