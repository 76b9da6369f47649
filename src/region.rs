//! Polygon zones restricting processing to a region of the frame.

use serde::{Deserialize, Serialize};

use crate::detection::{Anchor, Detection};
use crate::perspective::Quad;
use crate::utils::get_bounding_box;
use crate::{Error, Result};

const BOUNDARY_TOLERANCE: f64 = 1e-9;

/// A fixed image-space polygon. A detection is inside when its anchor point is.
///
/// Points on the polygon's boundary count as inside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ZoneSpec", into = "ZoneSpec")]
pub struct PolygonZone {
    vertices: Vec<[f64; 2]>,
    anchor: Anchor,
    bounds: (f64, f64, f64, f64),
}

#[derive(Serialize, Deserialize)]
struct ZoneSpec {
    vertices: Vec<[f64; 2]>,
    #[serde(default)]
    anchor: Anchor,
}

impl PolygonZone {
    /// Create a zone from at least 3 vertices, triggering on bottom-center anchors.
    pub fn new(vertices: Vec<[f64; 2]>) -> Result<Self> {
        Self::with_anchor(vertices, Anchor::BottomCenter)
    }

    /// Create a zone triggering on the given anchor.
    pub fn with_anchor(vertices: Vec<[f64; 2]>, anchor: Anchor) -> Result<Self> {
        if vertices.len() < 3 {
            return Err(Error::InvalidGeometry(format!(
                "polygon zone needs at least 3 vertices, got {}",
                vertices.len()
            )));
        }

        if vertices.iter().flatten().any(|v| !v.is_finite()) {
            return Err(Error::InvalidGeometry(
                "polygon zone has non-finite vertices".to_string(),
            ));
        }

        let bounds = get_bounding_box(&vertices).ok_or_else(|| {
            Error::InvalidGeometry("polygon zone has no vertices".to_string())
        })?;

        Ok(Self {
            vertices,
            anchor,
            bounds,
        })
    }

    /// Zone covering a transformer's source view.
    pub fn from_quad(quad: &Quad) -> Result<Self> {
        Self::new(quad.to_vec())
    }

    /// Whether a point lies inside the polygon or on its boundary.
    pub fn contains(&self, [x, y]: [f64; 2]) -> bool {
        let (min_x, min_y, max_x, max_y) = self.bounds;
        if x < min_x || x > max_x || y < min_y || y > max_y {
            return false;
        }

        let n = self.vertices.len();
        let mut inside = false;
        let mut j = n - 1;

        for i in 0..n {
            let [xi, yi] = self.vertices[i];
            let [xj, yj] = self.vertices[j];

            if on_segment([x, y], [xi, yi], [xj, yj]) {
                return true;
            }

            // Crossing number: count edges straddling the horizontal ray to +x
            if (yi > y) != (yj > y) {
                let x_cross = xi + (y - yi) * (xj - xi) / (yj - yi);
                if x < x_cross {
                    inside = !inside;
                }
            }

            j = i;
        }

        inside
    }

    /// For each detection, whether its anchor lies inside the zone.
    pub fn trigger(&self, detections: &[Detection]) -> Vec<bool> {
        detections
            .iter()
            .map(|det| self.contains(det.anchor(self.anchor)))
            .collect()
    }

    /// The polygon's vertices, in order.
    pub fn vertices(&self) -> &[[f64; 2]] {
        &self.vertices
    }

    /// The anchor tested against the polygon.
    pub fn anchor(&self) -> Anchor {
        self.anchor
    }
}

impl TryFrom<ZoneSpec> for PolygonZone {
    type Error = Error;

    fn try_from(spec: ZoneSpec) -> Result<Self> {
        Self::with_anchor(spec.vertices, spec.anchor)
    }
}

impl From<PolygonZone> for ZoneSpec {
    fn from(zone: PolygonZone) -> Self {
        Self {
            vertices: zone.vertices,
            anchor: zone.anchor,
        }
    }
}

fn on_segment(p: [f64; 2], a: [f64; 2], b: [f64; 2]) -> bool {
    let cross = (b[0] - a[0]) * (p[1] - a[1]) - (b[1] - a[1]) * (p[0] - a[0]);
    let edge = (b[0] - a[0]).hypot(b[1] - a[1]);
    // |cross| / edge is the distance from p to the line through a and b
    if cross.abs() > BOUNDARY_TOLERANCE * edge.max(1.0) {
        return false;
    }

    p[0] >= a[0].min(b[0]) && p[0] <= a[0].max(b[0]) && p[1] >= a[1].min(b[1]) && p[1] <= a[1].max(b[1])
}
