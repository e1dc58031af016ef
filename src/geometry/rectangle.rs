use rand::{Rng, RngCore};

use super::{Bounds, Point, Shape};
use crate::error::{PlanError, Result};

/// Axis-aligned rectangle (a box in three dimensions).
#[derive(Debug, Clone, PartialEq)]
pub struct Rectangle<const D: usize> {
    lower_left: Point<D>,
    upper_right: Point<D>,
}

impl<const D: usize> Rectangle<D> {
    pub fn new(lower_left: Point<D>, upper_right: Point<D>) -> Result<Self> {
        if (0..D).any(|axis| !(lower_left[axis] < upper_right[axis])) {
            return Err(PlanError::Config(format!(
                "rectangle lower corner {:?} must be below upper corner {:?} on every axis",
                lower_left.as_slice(),
                upper_right.as_slice()
            )));
        }
        Ok(Self {
            lower_left,
            upper_right,
        })
    }

    pub fn lower_left(&self) -> &Point<D> {
        &self.lower_left
    }

    pub fn upper_right(&self) -> &Point<D> {
        &self.upper_right
    }
}

impl<const D: usize> Shape<D> for Rectangle<D> {
    fn is_point_inside(&self, point: &Point<D>) -> bool {
        (0..D).all(|axis| {
            point[axis] >= self.lower_left[axis] && point[axis] <= self.upper_right[axis]
        })
    }

    fn is_intersected_by_edge(&self, p1: &Point<D>, p2: &Point<D>) -> bool {
        debug_assert!(!self.is_point_inside(p1), "edge start lies inside the rectangle");
        debug_assert!(!self.is_point_inside(p2), "edge end lies inside the rectangle");
        // Clip the parameter range [0, 1] against each slab
        let direction = p2 - p1;
        let (mut t_enter, mut t_exit) = (0.0_f64, 1.0_f64);
        for axis in 0..D {
            if direction[axis] == 0.0 {
                if p1[axis] < self.lower_left[axis] || p1[axis] > self.upper_right[axis] {
                    return false;
                }
                continue;
            }
            let inv = 1.0 / direction[axis];
            let mut t_near = (self.lower_left[axis] - p1[axis]) * inv;
            let mut t_far = (self.upper_right[axis] - p1[axis]) * inv;
            if t_near > t_far {
                std::mem::swap(&mut t_near, &mut t_far);
            }
            t_enter = t_enter.max(t_near);
            t_exit = t_exit.min(t_far);
            if t_enter > t_exit {
                return false;
            }
        }
        true
    }

    fn sample_random_point(&self, rng: &mut dyn RngCore) -> Point<D> {
        let extent = self.upper_right - self.lower_left;
        Point::<D>::from_fn(|axis, _| self.lower_left[axis] + rng.random::<f64>() * extent[axis])
    }

    fn bounds(&self) -> Bounds<D> {
        Bounds::new(self.lower_left, self.upper_right)
    }
}
