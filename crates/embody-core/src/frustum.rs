//! Perception field attached to a body.
//!
//! A [`Frustum`] is a small `Copy` value: the shape parameters chosen at construction plus the
//! pose of the owning body. Only the body updates the pose (see `Body::set_pose`), so a query made
//! through the body always sees the current extent.

use core::f32::consts::PI;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ShapeError;
use crate::math::{wrap_angle, Aabb, Vec2};

/// Position and facing of a body. `heading` is in radians, 0 along +X.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Pose {
    pub position: Vec2,
    pub heading: f32,
}

impl Pose {
    pub fn new(position: Vec2, heading: f32) -> Self {
        Self {
            position,
            heading: wrap_angle(heading),
        }
    }

    pub fn at(position: Vec2) -> Self {
        Self::new(position, 0.0)
    }

    pub fn forward(&self) -> Vec2 {
        Vec2::from_angle(self.heading)
    }
}

/// Shape of the perceivable region, relative to the body pose.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "type", rename_all = "snake_case"))]
pub enum FrustumShape {
    /// Omnidirectional disc.
    Circle { range: f32 },
    /// Sector centered on the heading. `half_aperture` is in radians, within `(0, π]`.
    Cone { range: f32, half_aperture: f32 },
    /// Axis-aligned window centered on the body, independent of heading.
    Rect { half_extents: Vec2 },
}

impl FrustumShape {
    pub fn validate(&self) -> Result<(), ShapeError> {
        match *self {
            FrustumShape::Circle { range } => check_range(range),
            FrustumShape::Cone {
                range,
                half_aperture,
            } => {
                check_range(range)?;
                if !half_aperture.is_finite() || half_aperture <= 0.0 || half_aperture > PI {
                    return Err(ShapeError::InvalidAperture(half_aperture));
                }
                Ok(())
            }
            FrustumShape::Rect { half_extents } => {
                if !half_extents.is_finite() || half_extents.x < 0.0 || half_extents.y < 0.0 {
                    return Err(ShapeError::InvalidExtents {
                        x: half_extents.x,
                        y: half_extents.y,
                    });
                }
                Ok(())
            }
        }
    }

    /// Largest distance from the origin still covered by the shape.
    pub fn range(&self) -> f32 {
        match *self {
            FrustumShape::Circle { range } | FrustumShape::Cone { range, .. } => range,
            FrustumShape::Rect { half_extents } => half_extents.length(),
        }
    }
}

fn check_range(range: f32) -> Result<(), ShapeError> {
    if !range.is_finite() || range < 0.0 {
        return Err(ShapeError::InvalidRange(range));
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "FrustumFields"))]
pub struct Frustum {
    shape: FrustumShape,
    pose: Pose,
}

/// Unchecked wire form; deserialized frusta go through [`Frustum::new`].
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct FrustumFields {
    shape: FrustumShape,
    pose: Pose,
}

#[cfg(feature = "serde")]
impl TryFrom<FrustumFields> for Frustum {
    type Error = ShapeError;

    fn try_from(fields: FrustumFields) -> Result<Self, Self::Error> {
        Frustum::new(fields.shape, fields.pose)
    }
}

impl Frustum {
    pub fn new(shape: FrustumShape, pose: Pose) -> Result<Self, ShapeError> {
        shape.validate()?;
        Ok(Self { shape, pose })
    }

    /// Recompute the world-space extent for a new pose of the owning body.
    pub(crate) fn update(&mut self, pose: Pose) {
        self.pose = pose;
    }

    pub fn shape(&self) -> FrustumShape {
        self.shape
    }

    pub fn pose(&self) -> Pose {
        self.pose
    }

    pub fn origin(&self) -> Vec2 {
        self.pose.position
    }

    pub fn range(&self) -> f32 {
        self.shape.range()
    }

    pub fn contains(&self, point: Vec2) -> bool {
        let origin = self.pose.position;
        match self.shape {
            FrustumShape::Circle { range } => point.distance(origin) <= range,
            FrustumShape::Cone {
                range,
                half_aperture,
            } => {
                let delta = point - origin;
                let dist = delta.length();
                if dist > range {
                    return false;
                }
                if dist <= f32::EPSILON {
                    return true;
                }
                let off_axis = wrap_angle(delta.angle() - self.pose.heading).abs();
                off_axis <= half_aperture + 1e-6
            }
            FrustumShape::Rect { half_extents } => {
                Aabb::from_center_half_extents(origin, half_extents).contains(point)
            }
        }
    }

    /// Broad-phase box enclosing the whole frustum.
    pub fn bounds(&self) -> Aabb {
        let origin = self.pose.position;
        match self.shape {
            FrustumShape::Circle { range } | FrustumShape::Cone { range, .. } => {
                Aabb::from_center_half_extents(origin, Vec2::new(range, range))
            }
            FrustumShape::Rect { half_extents } => {
                Aabb::from_center_half_extents(origin, half_extents)
            }
        }
    }

    /// Whether any part of `area` may lie inside the frustum.
    ///
    /// Exact for circles and rectangles; for cones the test samples the box corners, its
    /// closest point and the cone edges, which is exact for boxes smaller than the cone.
    pub fn touches(&self, area: &Aabb) -> bool {
        let origin = self.pose.position;
        if area.contains(origin) {
            return true;
        }
        match self.shape {
            FrustumShape::Circle { range } => area.closest_point(origin).distance(origin) <= range,
            FrustumShape::Rect { half_extents } => {
                Aabb::from_center_half_extents(origin, half_extents).intersects(area)
            }
            FrustumShape::Cone {
                range,
                half_aperture,
            } => {
                let closest = area.closest_point(origin);
                if closest.distance(origin) > range {
                    return false;
                }
                let samples = [
                    closest,
                    area.center(),
                    area.min,
                    area.max,
                    Vec2::new(area.min.x, area.max.y),
                    Vec2::new(area.max.x, area.min.y),
                ];
                if samples.iter().any(|p| self.contains(*p)) {
                    return true;
                }
                let heading = self.pose.heading;
                [heading - half_aperture, heading, heading + half_aperture]
                    .into_iter()
                    .map(|angle| origin + Vec2::from_angle(angle) * range)
                    .any(|end| area.segment_intersects(origin, end))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cone_excludes_points_behind_the_body() {
        let frustum = Frustum::new(
            FrustumShape::Cone {
                range: 10.0,
                half_aperture: PI / 4.0,
            },
            Pose::at(Vec2::ZERO),
        )
        .unwrap();

        assert!(frustum.contains(Vec2::new(5.0, 1.0)));
        assert!(!frustum.contains(Vec2::new(-5.0, 0.0)));
        assert!(!frustum.contains(Vec2::new(11.0, 0.0)));
        assert!(frustum.contains(Vec2::ZERO));
    }

    #[test]
    fn update_moves_the_extent() {
        let mut frustum =
            Frustum::new(FrustumShape::Circle { range: 2.0 }, Pose::at(Vec2::ZERO)).unwrap();
        assert!(!frustum.contains(Vec2::new(10.0, 0.0)));

        frustum.update(Pose::at(Vec2::new(9.0, 0.0)));
        assert!(frustum.contains(Vec2::new(10.0, 0.0)));
        assert_eq!(frustum.origin(), Vec2::new(9.0, 0.0));
    }

    #[test]
    fn invalid_shapes_are_rejected() {
        assert!(matches!(
            FrustumShape::Circle { range: -1.0 }.validate(),
            Err(ShapeError::InvalidRange(_))
        ));
        assert!(matches!(
            FrustumShape::Cone {
                range: 1.0,
                half_aperture: 4.0
            }
            .validate(),
            Err(ShapeError::InvalidAperture(_))
        ));
    }

    #[test]
    fn cone_touches_wide_wall_crossing_its_axis() {
        let frustum = Frustum::new(
            FrustumShape::Cone {
                range: 10.0,
                half_aperture: 0.1,
            },
            Pose::at(Vec2::ZERO),
        )
        .unwrap();
        let wall = Aabb::new(Vec2::new(5.0, -50.0), Vec2::new(6.0, 50.0));
        assert!(frustum.touches(&wall));

        let behind = Aabb::new(Vec2::new(-6.0, -50.0), Vec2::new(-5.0, 50.0));
        assert!(!frustum.touches(&behind));
    }
}
