//! Regions of the planning space.
//!
//! The planner only ever talks to a region through the three core methods of [`Shape`]:
//! point membership, segment intersection and uniform sampling. Everything else on the
//! trait exists for domain validation and plotting.
mod circle;
mod domain;
mod free_form;
mod rectangle;

use rand::RngCore;

pub use self::circle::Circle;
pub use self::domain::{Domain, Region};
pub use self::free_form::FreeForm;
pub use self::rectangle::Rectangle;

/// A configuration in the planning space.
pub type Point<const D: usize> = nalgebra::SVector<f64, D>;

pub trait Shape<const D: usize>: std::fmt::Debug {
    /// Membership test, inclusive of the boundary.
    fn is_point_inside(&self, point: &Point<D>) -> bool;

    /// Does the segment `p1 -> p2` cross this region?
    ///
    /// Only defined for endpoints that lie outside the region.
    fn is_intersected_by_edge(&self, p1: &Point<D>, p2: &Point<D>) -> bool;

    /// Draw a point uniformly distributed over the interior.
    fn sample_random_point(&self, rng: &mut dyn RngCore) -> Point<D>;

    /// Axis-aligned bounding box of the region.
    fn bounds(&self) -> Bounds<D>;

    /// Distance from `point` to the farthest point of the region.
    fn max_distance_from(&self, point: &Point<D>) -> f64 {
        self.bounds()
            .corners()
            .map(|corner| (corner - point).norm())
            .fold(0.0, f64::max)
    }

    /// Does `other` lie entirely within this region?
    fn contains_shape(&self, other: &dyn Shape<D>) -> bool {
        other
            .bounds()
            .corners()
            .all(|corner| self.is_point_inside(&corner))
    }
}

/// An axis-aligned box given by its lower and upper corners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds<const D: usize> {
    pub lower: Point<D>,
    pub upper: Point<D>,
}

impl<const D: usize> Bounds<D> {
    pub fn new(lower: Point<D>, upper: Point<D>) -> Self {
        Self { lower, upper }
    }

    /// Box of the given half width on every axis around `center`.
    pub fn around(center: &Point<D>, half_width: f64) -> Self {
        Self {
            lower: center.map(|x| x - half_width),
            upper: center.map(|x| x + half_width),
        }
    }

    /// Strict interior test; points on a face are outside.
    pub fn contains_strictly(&self, point: &Point<D>) -> bool {
        (0..D).all(|axis| point[axis] > self.lower[axis] && point[axis] < self.upper[axis])
    }

    pub fn center(&self) -> Point<D> {
        (self.lower + self.upper) / 2.0
    }

    /// All 2^D corners of the box.
    pub fn corners(&self) -> impl Iterator<Item = Point<D>> + '_ {
        (0..1usize << D).map(move |mask| {
            Point::<D>::from_fn(|axis, _| {
                if (mask >> axis) & 1 == 1 {
                    self.upper[axis]
                } else {
                    self.lower[axis]
                }
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_corners_cover_the_box() {
        let bounds = Bounds::new(Point::<2>::new(0.0, 1.0), Point::<2>::new(2.0, 3.0));
        let corners: Vec<_> = bounds.corners().collect();
        assert_eq!(corners.len(), 4);
        assert!(corners.contains(&Point::<2>::new(0.0, 1.0)));
        assert!(corners.contains(&Point::<2>::new(2.0, 3.0)));
        assert!(corners.contains(&Point::<2>::new(2.0, 1.0)));
        assert!(corners.contains(&Point::<2>::new(0.0, 3.0)));

        let cube = Bounds::around(&Point::<3>::zeros(), 1.0);
        assert_eq!(cube.corners().count(), 8);
    }

    #[test]
    fn strict_containment_excludes_faces() {
        let bounds = Bounds::around(&Point::<2>::new(1.0, 1.0), 0.5);
        assert!(bounds.contains_strictly(&Point::<2>::new(1.2, 0.9)));
        assert!(!bounds.contains_strictly(&Point::<2>::new(1.5, 1.0)));
        assert!(!bounds.contains_strictly(&Point::<2>::new(1.0, 0.4)));
    }
}
