use super::{Point, Shape};
use crate::error::{PlanError, Result};

/// A named region: an obstacle or a goal.
#[derive(Debug)]
pub struct Region<const D: usize> {
    pub name: String,
    shape: Box<dyn Shape<D>>,
}

impl<const D: usize> Region<D> {
    pub fn new(name: impl Into<String>, shape: impl Shape<D> + 'static) -> Self {
        Self::boxed(name, Box::new(shape))
    }

    pub fn boxed(name: impl Into<String>, shape: Box<dyn Shape<D>>) -> Self {
        Self {
            name: name.into(),
            shape,
        }
    }

    pub fn shape(&self) -> &dyn Shape<D> {
        self.shape.as_ref()
    }
}

/// The assembled planning problem: where to sample, what to avoid, where to start
/// and where to go.
#[derive(Debug)]
pub struct Domain<const D: usize> {
    region: Box<dyn Shape<D>>,
    origin: Point<D>,
    obstacles: Vec<Region<D>>,
    goals: Vec<Region<D>>,
}

impl<const D: usize> Domain<D> {
    /// Assemble a domain, rejecting geometry the planner cannot start from.
    pub fn new(
        region: Box<dyn Shape<D>>,
        origin: Point<D>,
        obstacles: Vec<Region<D>>,
        goals: Vec<Region<D>>,
    ) -> Result<Self> {
        if !region.is_point_inside(&origin) {
            return Err(PlanError::Config(format!(
                "origin {:?} lies outside the domain",
                origin.as_slice()
            )));
        }
        for obstacle in &obstacles {
            if obstacle.shape().is_point_inside(&origin) {
                return Err(PlanError::Config(format!(
                    "origin lies inside obstacle '{}'",
                    obstacle.name
                )));
            }
            if !region.contains_shape(obstacle.shape()) {
                return Err(PlanError::Config(format!(
                    "obstacle '{}' does not fit inside the domain",
                    obstacle.name
                )));
            }
        }
        if let Some(goal) = goals.iter().find(|g| g.shape().is_point_inside(&origin)) {
            return Err(PlanError::Config(format!(
                "origin lies inside goal '{}'",
                goal.name
            )));
        }
        Ok(Self {
            region,
            origin,
            obstacles,
            goals,
        })
    }

    /// The sampling region.
    pub fn region(&self) -> &dyn Shape<D> {
        self.region.as_ref()
    }

    pub fn origin(&self) -> &Point<D> {
        &self.origin
    }

    pub fn obstacles(&self) -> &[Region<D>] {
        &self.obstacles
    }

    /// Goals in declared order.
    pub fn goals(&self) -> &[Region<D>] {
        &self.goals
    }

    /// Is the straight edge between `p1` and `p2` blocked by any obstacle?
    pub fn is_edge_blocked(&self, p1: &Point<D>, p2: &Point<D>) -> bool {
        crate::rrt::edge_blocked(p1, p2, self.obstacles.iter().map(Region::shape))
    }
}
