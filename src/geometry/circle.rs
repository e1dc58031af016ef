use rand::{Rng, RngCore};
use rand_distr::StandardNormal;

use super::{Bounds, Point, Shape};
use crate::error::{PlanError, Result};

/// A disc in two dimensions, a ball in three.
#[derive(Debug, Clone, PartialEq)]
pub struct Circle<const D: usize> {
    center: Point<D>,
    radius: f64,
}

impl<const D: usize> Circle<D> {
    pub fn new(center: Point<D>, radius: f64) -> Result<Self> {
        if !(radius.is_finite() && radius > 0.0) {
            return Err(PlanError::Config(format!(
                "circle radius must be positive, got {radius}"
            )));
        }
        Ok(Self { center, radius })
    }

    pub fn center(&self) -> &Point<D> {
        &self.center
    }

    pub fn radius(&self) -> f64 {
        self.radius
    }
}

impl<const D: usize> Shape<D> for Circle<D> {
    fn is_point_inside(&self, point: &Point<D>) -> bool {
        (self.center - point).norm() <= self.radius
    }

    fn is_intersected_by_edge(&self, p1: &Point<D>, p2: &Point<D>) -> bool {
        debug_assert!(!self.is_point_inside(p1), "edge start lies inside the circle");
        debug_assert!(!self.is_point_inside(p2), "edge end lies inside the circle");
        // Solve |p1 + t (p2 - p1) - c|^2 = r^2 for t
        let direction = p2 - p1;
        let offset = p1 - self.center;
        let a = direction.dot(&direction);
        if a == 0.0 {
            return false;
        }
        let b = 2.0 * offset.dot(&direction);
        let c = offset.dot(&offset) - self.radius * self.radius;
        let discriminant = b * b - 4.0 * a * c;
        if discriminant < 0.0 {
            return false;
        }
        let on_segment = |t: f64| (0.0..=1.0).contains(&t);
        if discriminant == 0.0 {
            // Tangent
            return on_segment(-b / (2.0 * a));
        }
        let root = discriminant.sqrt();
        let t1 = (-b + root) / (2.0 * a);
        let t2 = (-b - root) / (2.0 * a);
        on_segment(t1) && on_segment(t2)
    }

    fn sample_random_point(&self, rng: &mut dyn RngCore) -> Point<D> {
        // Gaussian direction is uniform on the sphere; r ~ u^(1/D) keeps the density uniform
        let direction = loop {
            let candidate = Point::<D>::from_fn(|_, _| rng.sample::<f64, _>(StandardNormal));
            let norm = candidate.norm();
            if norm > f64::EPSILON {
                break candidate / norm;
            }
        };
        let r = self.radius * rng.random::<f64>().powf(1.0 / D as f64);
        self.center + direction * r
    }

    fn bounds(&self) -> Bounds<D> {
        Bounds::around(&self.center, self.radius)
    }

    fn max_distance_from(&self, point: &Point<D>) -> f64 {
        (self.center - point).norm() + self.radius
    }

    fn contains_shape(&self, other: &dyn Shape<D>) -> bool {
        other.max_distance_from(&self.center) <= self.radius
    }
}
