//! Perspective transformation module.
//!
//! Maps pixel coordinates inside a quadrilateral region of interest onto a
//! rectangle on the ground plane, so that distances can be measured in
//! real-world units. Supports:
//!
//! - Homography estimation from 4 point correspondences
//! - Forward (image to ground) and inverse (ground to image) mapping
//! - An identity transformation for measuring in pixel space

mod homography;
mod transformations;

pub use homography::{find_homography, Quad};
pub use transformations::{rectangle, IdentityTransformation, PointTransformation, ViewTransformer};
