use log::{debug, warn};
use rand::RngCore;

use super::node::RRTNode;
use super::store::{HistoryStage, TreeStore};
use super::vertex::VertexGenerator;
use super::{Planner, StepSummary};
use crate::error::{PlanError, Result};
use crate::geometry::{Bounds, Domain, Point};

/// Inflation of the neighborhood prefilter box over the true radius.
const NEIGHBOR_OFFSET: f64 = 1.1;

/// An existing vertex close enough to the new one to be wired to it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub index: usize,
    pub distance: f64,
}

/// Assigned vertices within `radius` of `point`, in index order.
///
/// A box of half width `radius * 1.1` discards most of the tree before the exact
/// distance test.
pub fn find_neighborhood<const D: usize>(
    tree: &TreeStore<D>,
    point: &Point<D>,
    radius: f64,
) -> Vec<Neighbor> {
    let prefilter = Bounds::around(point, radius * NEIGHBOR_OFFSET);
    tree.vertices()
        .filter(|(_, vertex)| prefilter.contains_strictly(vertex))
        .filter_map(|(index, vertex)| {
            let distance = (vertex - point).norm();
            (distance <= radius).then_some(Neighbor { index, distance })
        })
        .collect()
}

/// The neighbor giving `point` the cheapest unblocked path from the origin.
///
/// Ties keep the neighbor found first. `None` if no neighbor can connect.
pub fn select_parent<const D: usize>(
    tree: &TreeStore<D>,
    point: &Point<D>,
    neighbors: &[Neighbor],
    is_blocked: impl Fn(&Point<D>, &Point<D>) -> bool,
) -> Option<Neighbor> {
    let mut best: Option<(Neighbor, f64)> = None;
    for neighbor in neighbors {
        let Some(candidate) = tree.get(neighbor.index) else {
            continue;
        };
        let cost = candidate.cumulative_cost + neighbor.distance;
        if matches!(best, Some((_, best_cost)) if cost >= best_cost) {
            continue;
        }
        if is_blocked(&candidate.node, point) {
            continue;
        }
        best = Some((*neighbor, cost));
    }
    best.map(|(neighbor, _)| neighbor)
}

/// Re-parent every neighbor that becomes strictly cheaper through `new_index`.
///
/// Each neighbor is judged against the new vertex's cost alone, in neighborhood
/// order. Ancestors of the new vertex are never touched. Returns the rewired
/// indices; costs below them are left for the caller to refresh.
pub fn rewire<const D: usize>(
    tree: &mut TreeStore<D>,
    new_index: usize,
    neighbors: &[Neighbor],
    is_blocked: impl Fn(&Point<D>, &Point<D>) -> bool,
) -> Result<Vec<usize>> {
    let new_node = tree.node(new_index)?.clone();
    let ancestors = tree.parent_chain(new_index)?;
    let mut rewired = Vec::new();
    for neighbor in neighbors {
        // Don't make a cycle
        if ancestors.contains(&neighbor.index) {
            continue;
        }
        let candidate = tree.node(neighbor.index)?;
        let updated_cost = new_node.cumulative_cost + neighbor.distance;
        if updated_cost >= candidate.cumulative_cost {
            continue;
        }
        if is_blocked(&new_node.node, &candidate.node) {
            continue;
        }
        tree.reparent(neighbor.index, new_index, updated_cost)?;
        rewired.push(neighbor.index);
    }
    Ok(rewired)
}

/// Recompute the cost of every vertex below `roots` from its edge lengths.
pub fn refresh_subtree_costs<const D: usize>(tree: &mut TreeStore<D>, roots: &[usize]) -> Result<()> {
    if roots.is_empty() {
        return Ok(());
    }
    let children = tree.children();
    let mut stack: Vec<usize> = roots.to_vec();
    let mut visited = 0;
    while let Some(parent) = stack.pop() {
        visited += 1;
        if visited > tree.len() {
            return Err(PlanError::CorruptTree(format!(
                "subtree below {roots:?} contains a cycle"
            )));
        }
        let parent_node = tree.node(parent)?.clone();
        for &child in &children[parent] {
            let edge = (tree.node(child)?.node - parent_node.node).norm();
            tree.set_cost(child, parent_node.cumulative_cost + edge)?;
            stack.push(child);
        }
    }
    Ok(())
}

/// RRT*: new vertices pick the cheapest parent nearby, then offer themselves as a
/// cheaper parent to their neighbors.
pub struct RRTStar<'a, const D: usize> {
    domain: &'a Domain<D>,
    generator: VertexGenerator,
    neighborhood: f64,
}

impl<'a, const D: usize> RRTStar<'a, D> {
    pub fn new(domain: &'a Domain<D>, generator: VertexGenerator, neighborhood: f64) -> Result<Self> {
        if !(neighborhood.is_finite() && neighborhood > 0.0) {
            return Err(PlanError::Config(format!(
                "neighborhood must be positive, got {neighborhood}"
            )));
        }
        Ok(Self {
            domain,
            generator,
            neighborhood,
        })
    }
}

impl<const D: usize> Planner<D> for RRTStar<'_, D> {
    fn name(&self) -> &'static str {
        "rrt_star"
    }

    fn step(
        &mut self,
        tree: &mut TreeStore<D>,
        iteration: usize,
        rng: &mut dyn RngCore,
    ) -> Result<StepSummary> {
        let candidate = self.generator.generate(self.domain, tree, iteration, rng)?;
        let is_blocked = |a: &Point<D>, b: &Point<D>| self.domain.is_edge_blocked(a, b);

        let neighbors = find_neighborhood(tree, &candidate.point, self.neighborhood);
        let (parent, cumulative_cost, fallback) =
            match select_parent(tree, &candidate.point, &neighbors, is_blocked) {
                Some(best) => (best.index, tree.node(best.index)?.cumulative_cost + best.distance, false),
                None => {
                    // The steering edge is already known to be clear
                    warn!(
                        "Iteration {iteration}: no neighbor within {} can connect, using steering parent {}",
                        self.neighborhood, candidate.parent
                    );
                    let cost = tree.node(candidate.parent)?.cumulative_cost + candidate.edge_length;
                    (candidate.parent, cost, true)
                }
            };
        tree.record(
            iteration,
            RRTNode {
                node: candidate.point,
                cumulative_cost,
                parent: Some(parent),
            },
        )?;
        tree.snapshot_parents(iteration, HistoryStage::Attached);

        let rewired = rewire(tree, iteration, &neighbors, is_blocked)?;
        refresh_subtree_costs(tree, &rewired)?;
        tree.snapshot_parents(iteration, HistoryStage::Rewired);

        debug!(
            "Iteration {iteration}: vertex attached to {parent} at cost {cumulative_cost:.4}, {} of {} neighbors rewired",
            rewired.len(),
            neighbors.len()
        );
        Ok(StepSummary {
            parent,
            rewired: rewired.len(),
            fallback,
        })
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::geometry::{Circle, Rectangle, Region};
    use crate::rrt::store::tests::store_with_parents;

    fn never_blocked(_: &Point<2>, _: &Point<2>) -> bool {
        false
    }

    fn neighbors(indices: &[usize], distances: &[f64]) -> Vec<Neighbor> {
        indices
            .iter()
            .zip(distances)
            .map(|(&index, &distance)| Neighbor { index, distance })
            .collect()
    }

    #[test]
    fn neighborhood_keeps_vertices_within_radius() {
        let tree = store_with_parents(
            &[(0.0, 0.0), (1.0, 1.3), (1.0, 1.4), (1.0, 1.45)],
            &[-1, 0, 0, 0],
            &[0.0, 1.0, 1.0, 1.0],
        );
        let found = find_neighborhood(&tree, &Point::<2>::new(1.0, 1.39), 0.3);
        let indices: Vec<usize> = found.iter().map(|n| n.index).collect();
        assert_eq!(indices, vec![1, 2, 3]);
        for (neighbor, expected) in found.iter().zip([0.09, 0.01, 0.06]) {
            assert_relative_eq!(neighbor.distance, expected, epsilon = 1e-9);
        }
    }

    #[test]
    fn neighborhood_drops_box_corners_outside_radius() {
        let tree = store_with_parents(
            &[(0.0, 0.0), (1.0, 1.3), (1.0, 1.4), (1.0, 1.45)],
            &[-1, 0, 0, 0],
            &[0.0, 1.0, 1.0, 1.0],
        );
        // Vertex 3 passes the inflated box but not the radius
        assert!(find_neighborhood(&tree, &Point::<2>::new(1.0, 1.779), 0.3).is_empty());
    }

    #[test]
    fn parent_minimizes_cost_through_neighbor() {
        let tree = store_with_parents(
            &[(0.0, 0.0), (1.0, 1.0), (1.0, 1.1), (1.0, 1.2)],
            &[-1, 0, 0, 0],
            &[0.0, 1.3, 1.4, 1.5],
        );
        let candidates = neighbors(&[1, 2, 3], &[10.0, 0.1, 10.0]);
        let best = select_parent(&tree, &Point::<2>::new(1.0, 1.15), &candidates, never_blocked).unwrap();
        assert_eq!(best.index, 2);
        assert_relative_eq!(best.distance, 0.1);
    }

    #[test]
    fn parent_ties_keep_the_first() {
        let tree = store_with_parents(&[(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)], &[-1, 0, 0], &[0.0, 1.0, 1.0]);
        let candidates = neighbors(&[2, 1], &[0.5, 0.5]);
        let best = select_parent(&tree, &Point::<2>::new(0.5, 0.5), &candidates, never_blocked).unwrap();
        assert_eq!(best.index, 2);
    }

    #[test]
    fn blocked_neighbors_cannot_be_parents() {
        let tree = store_with_parents(&[(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)], &[-1, 0, 0], &[0.0, 1.0, 2.0]);
        let candidates = neighbors(&[1, 2], &[0.5, 0.5]);
        let blocked_from_1 = |a: &Point<2>, _: &Point<2>| *a == Point::<2>::new(1.0, 0.0);
        let best = select_parent(&tree, &Point::<2>::new(0.5, 0.5), &candidates, blocked_from_1).unwrap();
        assert_eq!(best.index, 2);
        assert!(select_parent(&tree, &Point::<2>::new(0.5, 0.5), &candidates, |_, _| true).is_none());
        assert!(select_parent(&tree, &Point::<2>::new(0.5, 0.5), &[], never_blocked).is_none());
    }

    #[test]
    fn rewires_only_strictly_cheaper_neighbors() {
        let mut tree = store_with_parents(
            &[(0.0, 0.0); 5],
            &[-1, 0, 1, 2, 0],
            &[0.0, 1.7, 1.4, 1.9, 1.5],
        );
        let candidates = neighbors(&[1, 2, 3], &[0.1, 0.1, 0.1]);
        let rewired = rewire(&mut tree, 4, &candidates, never_blocked).unwrap();
        assert_eq!(rewired, vec![1, 3]);
        assert_eq!(tree.parents(), vec![None, Some(4), Some(1), Some(4), Some(0)]);
        let costs: Vec<f64> = tree.iter().map(|(_, n)| n.cumulative_cost).collect();
        for (cost, expected) in costs.iter().zip([0.0, 1.6, 1.4, 1.6, 1.5]) {
            assert_relative_eq!(*cost, expected, epsilon = 1e-12);
        }
    }

    #[test]
    fn rewiring_skips_blocked_edges_and_ancestors() {
        // Vertex 2 claims a cost its chain cannot justify, luring its own ancestor
        let mut tree = store_with_parents(
            &[(0.0, 0.0); 4],
            &[-1, 0, 1, 0],
            &[0.0, 5.0, 1.0, 1.0],
        );
        let all_blocked = |_: &Point<2>, _: &Point<2>| true;
        assert!(rewire(&mut tree, 3, &neighbors(&[1, 2], &[0.1, 0.1]), all_blocked)
            .unwrap()
            .is_empty());
        assert!(rewire(&mut tree, 2, &neighbors(&[1], &[0.1]), never_blocked)
            .unwrap()
            .is_empty());
        assert_eq!(tree.parents(), vec![None, Some(0), Some(1), Some(0)]);

        let rewired = rewire(&mut tree, 3, &neighbors(&[1, 2], &[0.1, 0.1]), never_blocked).unwrap();
        assert_eq!(rewired, vec![1]);
        assert_eq!(tree.parents(), vec![None, Some(3), Some(1), Some(0)]);
    }

    #[test]
    fn subtree_costs_follow_a_rewire() {
        let mut tree = store_with_parents(
            &[(0.0, 0.0), (3.0, 0.0), (3.0, 1.0), (3.0, 2.0), (2.0, 0.0)],
            &[-1, 0, 1, 2, 0],
            &[0.0, 3.0, 4.0, 5.0, 2.0],
        );
        tree.reparent(2, 4, 2.0 + 2f64.sqrt()).unwrap();
        refresh_subtree_costs(&mut tree, &[2]).unwrap();
        assert_relative_eq!(tree.node(2).unwrap().cumulative_cost, 2.0 + 2f64.sqrt());
        assert_relative_eq!(tree.node(3).unwrap().cumulative_cost, 3.0 + 2f64.sqrt());
        assert_relative_eq!(tree.node(1).unwrap().cumulative_cost, 3.0);
    }

    #[test]
    fn empty_neighborhood_falls_back_to_the_steering_parent() {
        let region = Rectangle::new(Point::<2>::new(0.0, 0.0), Point::<2>::new(3.0, 3.0)).unwrap();
        let domain = Domain::new(Box::new(region), Point::<2>::new(0.1, 0.1), vec![], vec![]).unwrap();
        let n_trials = 200;
        let mut tree = TreeStore::new(*domain.origin(), n_trials, false).unwrap();
        // Radius far below the step, so most new vertices have no neighbors at all
        let mut planner = RRTStar::new(&domain, VertexGenerator::new(0.5, 10_000).unwrap(), 0.05).unwrap();
        let mut rng = StdRng::seed_from_u64(21);
        let mut fallbacks = 0;
        for i in 1..n_trials {
            // The step draws its candidate first, so a cloned generator replays it
            let steered = planner
                .generator
                .generate(&domain, &tree, i, &mut rng.clone())
                .unwrap();
            let summary = planner.step(&mut tree, i, &mut rng).unwrap();
            let node = tree.node(i).unwrap();
            assert_eq!(node.node, steered.point);
            if !summary.fallback {
                continue;
            }
            fallbacks += 1;
            assert!(find_neighborhood(&tree, &node.node, 0.05)
                .iter()
                .all(|n| n.index == i));
            assert_eq!(summary.parent, steered.parent);
            assert_eq!(node.parent, Some(steered.parent));
            let parent_cost = tree.node(steered.parent).unwrap().cumulative_cost;
            assert_relative_eq!(
                node.cumulative_cost,
                parent_cost + steered.edge_length,
                epsilon = 1e-12
            );
        }
        assert!(fallbacks > n_trials / 2, "only {fallbacks} fallbacks");
    }

    #[test]
    fn rejects_non_positive_neighborhood() {
        let region = Rectangle::new(Point::<2>::new(0.0, 0.0), Point::<2>::new(1.0, 1.0)).unwrap();
        let domain = Domain::new(Box::new(region), Point::<2>::new(0.1, 0.1), vec![], vec![]).unwrap();
        let generator = VertexGenerator::new(0.2, 100).unwrap();
        assert!(RRTStar::new(&domain, generator, 0.0).is_err());
        assert!(RRTStar::new(&domain, generator, f64::NAN).is_err());
    }

    #[test]
    fn grows_a_consistent_tree_with_history() {
        let region = Rectangle::new(Point::<2>::new(0.0, 0.0), Point::<2>::new(3.0, 4.0)).unwrap();
        let domain = Domain::new(
            Box::new(region),
            Point::<2>::new(0.1, 0.1),
            vec![Region::new("obstacle_1", Circle::new(Point::<2>::new(1.5, 1.5), 0.5).unwrap())],
            vec![],
        )
        .unwrap();
        let n_trials = 300;
        let mut tree = TreeStore::new(*domain.origin(), n_trials, true).unwrap();
        let mut planner = RRTStar::new(&domain, VertexGenerator::new(0.2, 10_000).unwrap(), 0.4).unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        let mut rewires = 0;
        for i in 1..n_trials {
            rewires += planner.step(&mut tree, i, &mut rng).unwrap().rewired;
        }
        assert!(rewires > 0);
        for (i, node) in tree.iter().skip(1) {
            let parent = tree.node(node.parent.unwrap()).unwrap();
            let edge = (node.node - parent.node).norm();
            assert_relative_eq!(
                node.cumulative_cost,
                parent.cumulative_cost + edge,
                epsilon = 1e-9
            );
            assert!(!domain.is_edge_blocked(&parent.node, &node.node));
            assert_eq!(*tree.parent_chain(i).unwrap().last().unwrap(), 0);
        }
        let history = tree.history().unwrap();
        assert_eq!(history.columns().len(), 2 * n_trials);
        let last = history.column(2 * n_trials - 1).unwrap();
        assert_eq!(last, tree.parents().as_slice());
    }
}
