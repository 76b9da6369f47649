//! Point transformation implementations.

use nalgebra::{DMatrix, Matrix3};

use super::homography::{find_homography, Quad};
use crate::utils::{matrix_to_points, points_to_matrix, validate_points};
use crate::{Error, Result};

/// Trait for mapping image points onto the ground plane and back.
///
/// Points can be interpreted in 2 references:
/// - Image: pixel position on the current frame, (0, 0) is top left
/// - Ground: position in the target view, in output units (meters, or any scaled unit)
pub trait PointTransformation: Send + Sync + std::fmt::Debug {
    /// Transform points from image coordinates to ground-plane coordinates.
    fn transform_points(&self, points: &[[f64; 2]]) -> Vec<[f64; 2]>;

    /// Transform points from ground-plane coordinates back to image coordinates.
    fn inverse_transform_points(&self, points: &[[f64; 2]]) -> Vec<[f64; 2]>;

    /// Clone this transformation into a boxed trait object.
    fn clone_box(&self) -> Box<dyn PointTransformation>;
}

impl Clone for Box<dyn PointTransformation> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// No-op transformation that returns points unchanged.
///
/// Used to measure speeds directly in pixel space.
#[derive(Debug, Clone, Default)]
pub struct IdentityTransformation;

impl PointTransformation for IdentityTransformation {
    fn transform_points(&self, points: &[[f64; 2]]) -> Vec<[f64; 2]> {
        points.to_vec()
    }

    fn inverse_transform_points(&self, points: &[[f64; 2]]) -> Vec<[f64; 2]> {
        points.to_vec()
    }

    fn clone_box(&self) -> Box<dyn PointTransformation> {
        Box::new(self.clone())
    }
}

/// Full perspective transformation from a source quadrilateral to a target rectangle.
///
/// The homography and its inverse are computed once, at construction, and never change.
#[derive(Debug, Clone)]
pub struct ViewTransformer {
    source_view: Quad,
    target_view: Quad,
    homography: Matrix3<f64>,
    inverse_homography: Matrix3<f64>,
}

impl ViewTransformer {
    /// Create a transformer mapping `source[i]` onto `target[i]` for each of the 4 corners.
    pub fn new(source: Quad, target: Quad) -> Result<Self> {
        let homography = find_homography(&source, &target)?;

        let inverse_homography = homography
            .try_inverse()
            .ok_or_else(|| Error::InvalidGeometry("cannot invert homography matrix".to_string()))?;

        log::info!(
            "view transformer built: source={:?} target={:?} homography={:?}",
            source,
            target,
            homography
        );

        Ok(Self {
            source_view: source,
            target_view: target,
            homography,
            inverse_homography,
        })
    }

    /// Create a transformer from point slices, which must each hold exactly 4 points.
    pub fn from_points(source: &[[f64; 2]], target: &[[f64; 2]]) -> Result<Self> {
        let source: Quad = source.try_into().map_err(|_| {
            Error::InvalidGeometry(format!("source view needs 4 points, got {}", source.len()))
        })?;
        let target: Quad = target.try_into().map_err(|_| {
            Error::InvalidGeometry(format!("target view needs 4 points, got {}", target.len()))
        })?;

        Self::new(source, target)
    }

    /// Create a transformer onto the rectangle `[[0, 0], [w, 0], [w, h], [0, h]]`.
    ///
    /// Source points must be ordered top-left, top-right, bottom-right, bottom-left.
    pub fn to_rectangle(source: Quad, width: f64, height: f64) -> Result<Self> {
        Self::new(source, rectangle(width, height))
    }

    /// Map image points onto the ground plane, preserving order and count.
    pub fn transform_points(&self, points: &[[f64; 2]]) -> Vec<[f64; 2]> {
        points
            .iter()
            .map(|&p| apply_homography(&self.homography, p))
            .collect()
    }

    /// Map ground-plane points back into the image.
    pub fn inverse_transform_points(&self, points: &[[f64; 2]]) -> Vec<[f64; 2]> {
        points
            .iter()
            .map(|&p| apply_homography(&self.inverse_homography, p))
            .collect()
    }

    /// Map a single image point onto the ground plane.
    pub fn transform_point(&self, point: [f64; 2]) -> [f64; 2] {
        apply_homography(&self.homography, point)
    }

    /// Map an `(n, 2)` matrix of image points onto the ground plane.
    pub fn transform_matrix(&self, points: &DMatrix<f64>) -> Result<DMatrix<f64>> {
        let points = validate_points(points)?;
        let transformed = self.transform_points(&matrix_to_points(points));
        Ok(points_to_matrix(&transformed))
    }

    /// The ordered source quadrilateral in image pixels.
    pub fn source_view(&self) -> &Quad {
        &self.source_view
    }

    /// The ordered target rectangle in output units.
    pub fn target_view(&self) -> &Quad {
        &self.target_view
    }

    /// The 3x3 image-to-ground homography.
    pub fn homography(&self) -> &Matrix3<f64> {
        &self.homography
    }
}

impl PointTransformation for ViewTransformer {
    fn transform_points(&self, points: &[[f64; 2]]) -> Vec<[f64; 2]> {
        ViewTransformer::transform_points(self, points)
    }

    fn inverse_transform_points(&self, points: &[[f64; 2]]) -> Vec<[f64; 2]> {
        ViewTransformer::inverse_transform_points(self, points)
    }

    fn clone_box(&self) -> Box<dyn PointTransformation> {
        Box::new(self.clone())
    }
}

/// Corners of an axis-aligned `width x height` rectangle anchored at the origin.
pub fn rectangle(width: f64, height: f64) -> Quad {
    [[0.0, 0.0], [width, 0.0], [width, height], [0.0, height]]
}

/// Apply a homography to one point: `[x', y', w'] = H * [x, y, 1]^T`, then divide by `w'`.
#[inline]
fn apply_homography(h: &Matrix3<f64>, [x, y]: [f64; 2]) -> [f64; 2] {
    let x_prime = h[(0, 0)] * x + h[(0, 1)] * y + h[(0, 2)];
    let y_prime = h[(1, 0)] * x + h[(1, 1)] * y + h[(1, 2)];
    let w_prime = h[(2, 0)] * x + h[(2, 1)] * y + h[(2, 2)];

    // Points on the vanishing line have w' == 0
    let w = if w_prime == 0.0 { 0.0000001 } else { w_prime };
    [x_prime / w, y_prime / w]
}
