use std::path::Path;

use image::GrayImage;
use rand::{Rng, RngCore};

use super::{Bounds, Point, Shape};
use crate::error::{PlanError, Result};

/// Tolerance on the membership radius, in pixel pitches.
const MEMBERSHIP_RADIUS: f64 = 2.1;

/// A free-form planar region traced from the black pixels of a bitmap.
///
/// Every black pixel becomes a sample point, scaled so that the cloud exactly fills
/// the declared bounding box. A location belongs to the region when it is within a
/// couple of pixel pitches of one of those points. Only defined for `D == 2`.
#[derive(Debug, Clone)]
pub struct FreeForm<const D: usize> {
    points: Vec<Point<D>>,
    // Pixel pitch along x and y after scaling
    hx: f64,
    hy: f64,
    bounds: Bounds<D>,
}

impl<const D: usize> FreeForm<D> {
    /// Load the bitmap at `path` and place it in the box `lower_left..upper_right`.
    pub fn open(path: &Path, lower_left: Point<D>, upper_right: Point<D>) -> Result<Self> {
        let image = image::open(path)?.to_luma8();
        Self::from_image(&image, lower_left, upper_right)
    }

    pub fn from_image(image: &GrayImage, lower_left: Point<D>, upper_right: Point<D>) -> Result<Self> {
        if D != 2 {
            return Err(PlanError::Config(format!(
                "free-form regions are only defined in two dimensions, not {D}"
            )));
        }
        let (n_columns, n_rows) = image.dimensions();
        if n_rows < 2 || n_columns < 2 {
            return Err(PlanError::Config(format!(
                "free-form bitmap must be at least 2x2 pixels, got {n_columns}x{n_rows}"
            )));
        }
        // Unit pitch in x, aspect-corrected pitch in y
        let rows = f64::from(n_rows - 1);
        let columns = f64::from(n_columns - 1);
        let hx = 1.0 / rows;
        let hy = (1.0 / columns) * (rows / columns);

        let raw: Vec<(f64, f64)> = image
            .enumerate_pixels()
            .filter(|(_, _, pixel)| pixel.0[0] == 0)
            .map(|(column, row, _)| (f64::from(column) * hx, 1.0 - f64::from(row) * hy))
            .collect();
        if raw.is_empty() {
            return Err(PlanError::Config(
                "free-form bitmap contains no black pixels".to_string(),
            ));
        }

        let (x_min, x_max) = min_max(raw.iter().map(|p| p.0));
        let (y_min, y_max) = min_max(raw.iter().map(|p| p.1));
        let (width, height) = (x_max - x_min, y_max - y_min);
        if width <= 0.0 || height <= 0.0 {
            return Err(PlanError::Config(
                "free-form bitmap must span more than one row and one column".to_string(),
            ));
        }
        let x_scale = (upper_right[0] - lower_left[0]) / width;
        let y_scale = (upper_right[1] - lower_left[1]) / height;
        if !(x_scale > 0.0 && y_scale > 0.0) {
            return Err(PlanError::Config(
                "free-form bounding box must have positive width and height".to_string(),
            ));
        }

        let points: Vec<Point<D>> = raw
            .into_iter()
            .map(|(x, y)| {
                let mut point = Point::<D>::zeros();
                point[0] = (x - x_min) * x_scale + lower_left[0];
                point[1] = (y - y_min) * y_scale + lower_left[1];
                point
            })
            .collect();
        let (x_min, x_max) = min_max(points.iter().map(|p| p[0]));
        let (y_min, y_max) = min_max(points.iter().map(|p| p[1]));
        let mut lower = Point::<D>::zeros();
        let mut upper = Point::<D>::zeros();
        lower[0] = x_min;
        lower[1] = y_min;
        upper[0] = x_max;
        upper[1] = y_max;

        Ok(Self {
            points,
            hx: hx * x_scale,
            hy: hy * y_scale,
            bounds: Bounds::new(lower, upper),
        })
    }

    pub fn points(&self) -> &[Point<D>] {
        &self.points
    }
}

fn min_max(values: impl Iterator<Item = f64>) -> (f64, f64) {
    values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
        (lo.min(v), hi.max(v))
    })
}

impl<const D: usize> Shape<D> for FreeForm<D> {
    fn is_point_inside(&self, point: &Point<D>) -> bool {
        let (x, y) = (point[0], point[1]);
        if x < self.bounds.lower[0]
            || x > self.bounds.upper[0]
            || y < self.bounds.lower[1]
            || y > self.bounds.upper[1]
        {
            return false;
        }
        let y_band = MEMBERSHIP_RADIUS * self.hy;
        let test_radius = self.hx.max(self.hy) * MEMBERSHIP_RADIUS;
        self.points
            .iter()
            .filter(|p| p[1] < y + y_band && p[1] > y - y_band)
            .any(|p| ((p[0] - x).powi(2) + (p[1] - y).powi(2)).sqrt() < test_radius)
    }

    fn is_intersected_by_edge(&self, p1: &Point<D>, p2: &Point<D>) -> bool {
        debug_assert!(!self.is_point_inside(p1), "edge start lies inside the region");
        debug_assert!(!self.is_point_inside(p2), "edge end lies inside the region");
        // Walk the segment at pixel pitch
        let length = (p2 - p1).norm();
        let divisions = (length / self.hx).ceil() as usize;
        (1..divisions).any(|i| {
            let t = i as f64 / divisions as f64;
            self.is_point_inside(&(p1 + (p2 - p1) * t))
        })
    }

    fn sample_random_point(&self, rng: &mut dyn RngCore) -> Point<D> {
        loop {
            let anchor = self.points[rng.random_range(0..self.points.len())];
            let mut candidate = anchor;
            candidate[0] += rng.random::<f64>() * self.hx;
            candidate[1] += rng.random::<f64>() * self.hy;
            if self.is_point_inside(&candidate) {
                return candidate;
            }
        }
    }

    fn bounds(&self) -> Bounds<D> {
        self.bounds
    }
}

#[cfg(test)]
mod tests {
    use image::Luma;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;

    /// 11x11 white bitmap with a filled black square in the middle.
    fn square_bitmap() -> GrayImage {
        GrayImage::from_fn(11, 11, |x, y| {
            if (3..=7).contains(&x) && (3..=7).contains(&y) {
                Luma([0])
            } else {
                Luma([255])
            }
        })
    }

    fn square_region() -> FreeForm<2> {
        FreeForm::from_image(
            &square_bitmap(),
            Point::<2>::new(1.0, 1.0),
            Point::<2>::new(2.0, 2.0),
        )
        .unwrap()
    }

    #[test]
    fn rejects_three_dimensions() {
        let result = FreeForm::<3>::from_image(
            &square_bitmap(),
            Point::<3>::new(0.0, 0.0, 0.0),
            Point::<3>::new(1.0, 1.0, 1.0),
        );
        assert!(matches!(result, Err(PlanError::Config(_))));
    }

    #[test]
    fn rejects_blank_bitmap() {
        let blank = GrayImage::from_pixel(5, 5, Luma([255]));
        let result = FreeForm::<2>::from_image(
            &blank,
            Point::<2>::new(0.0, 0.0),
            Point::<2>::new(1.0, 1.0),
        );
        assert!(result.is_err());
    }

    #[test]
    fn pixels_fill_the_bounding_box() {
        let region = square_region();
        assert_eq!(region.points().len(), 25);
        let bounds = region.bounds();
        approx::assert_relative_eq!(bounds.lower[0], 1.0, epsilon = 1e-12);
        approx::assert_relative_eq!(bounds.lower[1], 1.0, epsilon = 1e-12);
        approx::assert_relative_eq!(bounds.upper[0], 2.0, epsilon = 1e-12);
        approx::assert_relative_eq!(bounds.upper[1], 2.0, epsilon = 1e-12);
    }

    #[test]
    fn membership_follows_the_pixels() {
        let region = square_region();
        assert!(region.is_point_inside(&Point::<2>::new(1.5, 1.5)));
        assert!(region.is_point_inside(&Point::<2>::new(1.0, 1.0)));
        assert!(!region.is_point_inside(&Point::<2>::new(0.5, 1.5)));
        assert!(!region.is_point_inside(&Point::<2>::new(2.5, 2.5)));
    }

    #[test]
    fn edge_through_region_intersects() {
        let region = square_region();
        assert!(region.is_intersected_by_edge(
            &Point::<2>::new(0.0, 1.5),
            &Point::<2>::new(3.0, 1.5)
        ));
        assert!(!region.is_intersected_by_edge(
            &Point::<2>::new(0.0, 0.5),
            &Point::<2>::new(3.0, 0.5)
        ));
    }

    #[test]
    fn samples_are_members() {
        let region = square_region();
        let mut rng = StdRng::seed_from_u64(5);
        for _ in 0..200 {
            let p = region.sample_random_point(&mut rng);
            assert!(region.is_point_inside(&p));
        }
    }
}
