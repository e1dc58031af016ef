//! Tree growth: the basic RRT and the optimizing RRT* planners, the tree store they
//! share, and post-processing of the finished tree into goal paths.
mod node;
mod rrt;
mod rrt_star;
mod solution;
mod solver;
mod store;
mod vertex;

use rand::RngCore;

pub use self::node::RRTNode;
pub use self::rrt::RRT;
pub use self::rrt_star::{
    find_neighborhood, refresh_subtree_costs, rewire, select_parent, Neighbor, RRTStar,
};
pub use self::solution::{
    extract_paths, lowest_cost_vertex, path_cost, path_to, reaching_vertices, GoalPath,
};
pub use self::solver::{GrowthReport, Solver};
pub use self::store::{HistoryStage, ParentHistory, TreeStore};
pub use self::vertex::{nearest_vertex, sample_configuration, steer, Steered, VertexGenerator};

use crate::error::Result;
use crate::geometry::{Point, Shape};

/// What one planner iteration did to the tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepSummary {
    /// Index of the new vertex's parent.
    pub parent: usize,
    /// Existing vertices re-parented onto the new vertex.
    pub rewired: usize,
    /// The steering parent was used because no neighbor could connect.
    pub fallback: bool,
}

/// One tree-growth strategy.
pub trait Planner<const D: usize> {
    fn name(&self) -> &'static str;

    /// Grow the tree by the vertex for `iteration`.
    fn step(
        &mut self,
        tree: &mut TreeStore<D>,
        iteration: usize,
        rng: &mut dyn RngCore,
    ) -> Result<StepSummary>;
}

/// True if either endpoint lies in an obstacle or the segment crosses one.
///
/// Obstacles are checked in order and the first hit wins.
pub fn edge_blocked<'a, S, const D: usize>(
    p1: &Point<D>,
    p2: &Point<D>,
    obstacles: impl IntoIterator<Item = &'a S>,
) -> bool
where
    S: Shape<D> + ?Sized + 'a,
{
    obstacles.into_iter().any(|obstacle| {
        obstacle.is_point_inside(p1)
            || obstacle.is_point_inside(p2)
            || obstacle.is_intersected_by_edge(p1, p2)
    })
}
