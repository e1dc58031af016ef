use log::trace;
use rand::RngCore;

use super::store::TreeStore;
use crate::error::{PlanError, Result};
use crate::geometry::{Domain, Point};

/// Decimal places kept on steered coordinates.
const COORDINATE_DECIMALS: i32 = 6;

/// A candidate vertex produced by steering.
#[derive(Debug, Clone, PartialEq)]
pub struct Steered<const D: usize> {
    pub point: Point<D>,
    pub parent: usize,
    pub edge_length: f64,
}

/// Draw a raw configuration from the domain's sampling region.
pub fn sample_configuration<const D: usize>(domain: &Domain<D>, rng: &mut dyn RngCore) -> Point<D> {
    domain.region().sample_random_point(rng)
}

/// Index of and distance to the vertex nearest to `target`.
///
/// Ties keep the lowest index. Returns `None` for an empty vertex set.
pub fn nearest_vertex<'a, const D: usize>(
    vertices: impl IntoIterator<Item = (usize, &'a Point<D>)>,
    target: &Point<D>,
) -> Option<(usize, f64)> {
    nearest(vertices, target).map(|(index, distance, _)| (index, distance))
}

fn nearest<'a, const D: usize>(
    vertices: impl IntoIterator<Item = (usize, &'a Point<D>)>,
    target: &Point<D>,
) -> Option<(usize, f64, &'a Point<D>)> {
    let mut nearest: Option<(usize, f64, &'a Point<D>)> = None;
    for (index, vertex) in vertices {
        let distance = (vertex - target).norm();
        match nearest {
            Some((_, best, _)) if distance >= best => {}
            _ => nearest = Some((index, distance, vertex)),
        }
    }
    nearest
}

/// Pull `sample` to within `step_size` of its nearest vertex.
pub fn steer<'a, const D: usize>(
    vertices: impl IntoIterator<Item = (usize, &'a Point<D>)>,
    sample: &Point<D>,
    step_size: f64,
) -> Option<Steered<D>> {
    let (parent, distance, near) = nearest(vertices, sample)?;
    if distance < step_size {
        return Some(Steered {
            point: *sample,
            parent,
            edge_length: distance,
        });
    }
    let direction = (sample - near) / distance;
    let point = (near + direction * step_size).map(round_coordinate);
    Some(Steered {
        point,
        parent,
        edge_length: step_size,
    })
}

fn round_coordinate(value: f64) -> f64 {
    let scale = 10f64.powi(COORDINATE_DECIMALS);
    (value * scale).round() / scale
}

/// Produces collision-free candidate vertices for the planners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexGenerator {
    step_size: f64,
    max_attempts: usize,
}

impl VertexGenerator {
    pub fn new(step_size: f64, max_attempts: usize) -> Result<Self> {
        if !(step_size.is_finite() && step_size > 0.0) {
            return Err(PlanError::Config(format!(
                "step_size must be positive, got {step_size}"
            )));
        }
        if max_attempts == 0 {
            return Err(PlanError::Config(
                "max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            step_size,
            max_attempts,
        })
    }

    /// Sample and steer until the edge from the steering parent is unobstructed.
    pub fn generate<const D: usize>(
        &self,
        domain: &Domain<D>,
        tree: &TreeStore<D>,
        iteration: usize,
        rng: &mut dyn RngCore,
    ) -> Result<Steered<D>> {
        for attempt in 1..=self.max_attempts {
            let sample = sample_configuration(domain, rng);
            let candidate = steer(tree.vertices(), &sample, self.step_size).ok_or_else(|| {
                PlanError::CorruptTree("tree has no assigned vertices".to_string())
            })?;
            let parent = &tree.node(candidate.parent)?.node;
            if !domain.is_edge_blocked(parent, &candidate.point) {
                trace!("Iteration {iteration}: accepted sample after {attempt} attempt(s)");
                return Ok(candidate);
            }
        }
        Err(PlanError::StalledIteration {
            iteration,
            attempts: self.max_attempts,
        })
    }
}
