use log::warn;
use serde::Serialize;

use super::store::TreeStore;
use crate::error::Result;
use crate::geometry::{Region, Shape};

/// The cheapest path found to one goal.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalPath {
    pub goal: String,
    /// Vertex indices from the origin to the goal, `None` if the goal was not reached.
    pub path: Option<Vec<usize>>,
    pub cost: Option<f64>,
}

impl GoalPath {
    pub fn is_reached(&self) -> bool {
        self.path.is_some()
    }
}

/// Indices of the vertices lying in `goal`, in index order.
///
/// Scanning stops at the first unassigned slot: a tree that did not grow to
/// capacity reaches nothing.
pub fn reaching_vertices<const D: usize>(tree: &TreeStore<D>, goal: &dyn Shape<D>) -> Vec<usize> {
    let mut reached = Vec::new();
    for (index, slot) in tree.slots().iter().enumerate() {
        let Some(vertex) = slot else {
            return Vec::new();
        };
        if goal.is_point_inside(&vertex.node) {
            reached.push(index);
        }
    }
    reached
}

/// The cheapest of `candidates`; ties keep the first.
pub fn lowest_cost_vertex<const D: usize>(tree: &TreeStore<D>, candidates: &[usize]) -> Result<Option<usize>> {
    let mut best: Option<(usize, f64)> = None;
    for &index in candidates {
        let cost = tree.node(index)?.cumulative_cost;
        if !matches!(best, Some((_, lowest)) if cost >= lowest) {
            best = Some((index, cost));
        }
    }
    Ok(best.map(|(index, _)| index))
}

/// Vertex indices from the origin to `index`.
pub fn path_to<const D: usize>(tree: &TreeStore<D>, index: usize) -> Result<Vec<usize>> {
    let mut path = tree.parent_chain(index)?;
    path.reverse();
    Ok(path)
}

/// Total length of `path`, summed edge by edge from the recorded costs.
pub fn path_cost<const D: usize>(tree: &TreeStore<D>, path: &[usize]) -> Result<f64> {
    let mut cost = 0.0;
    for pair in path.windows(2) {
        cost += tree.node(pair[1])?.cumulative_cost - tree.node(pair[0])?.cumulative_cost;
    }
    Ok(cost)
}

/// The lowest-cost path to each goal, in declared order.
pub fn extract_paths<const D: usize>(tree: &TreeStore<D>, goals: &[Region<D>]) -> Result<Vec<GoalPath>> {
    if !tree.is_full() {
        warn!(
            "Tree holds {} of {} vertices, no goal can be reported as reached",
            tree.len(),
            tree.capacity()
        );
    }
    goals
        .iter()
        .map(|goal| {
            let reached = reaching_vertices(tree, goal.shape());
            let Some(best) = lowest_cost_vertex(tree, &reached)? else {
                return Ok(GoalPath {
                    goal: goal.name.clone(),
                    path: None,
                    cost: None,
                });
            };
            let path = path_to(tree, best)?;
            let cost = path_cost(tree, &path)?;
            Ok(GoalPath {
                goal: goal.name.clone(),
                path: Some(path),
                cost: Some(cost),
            })
        })
        .collect()
}
