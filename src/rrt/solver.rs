use log::{info, warn};
use rand::RngCore;
use serde::Serialize;

use super::rrt::RRT;
use super::rrt_star::RRTStar;
use super::solution::{extract_paths, GoalPath};
use super::store::TreeStore;
use super::vertex::VertexGenerator;
use super::Planner;
use crate::config::{AlgorithmInfo, Method};
use crate::error::{PlanError, Result};
use crate::geometry::Domain;

/// What happened while growing the tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct GrowthReport {
    /// Iterations that added a vertex.
    pub completed: usize,
    /// Iteration whose rejection sampling gave up, ending growth.
    pub stalled_at: Option<usize>,
    /// Vertices attached to their steering parent for lack of a connectable neighbor.
    pub parent_fallbacks: usize,
    pub rewires: usize,
}

/// Runs one planning problem: owns the tree and the chosen planner.
pub struct Solver<'a, const D: usize> {
    domain: &'a Domain<D>,
    method: Method,
    tree: TreeStore<D>,
    planner: Box<dyn Planner<D> + 'a>,
}

impl<'a, const D: usize> Solver<'a, D> {
    pub fn new(domain: &'a Domain<D>, info: &AlgorithmInfo) -> Result<Self> {
        let generator = VertexGenerator::new(info.step_size, info.max_attempts)?;
        let planner: Box<dyn Planner<D> + 'a> = match info.method {
            Method::RrtBasic => Box::new(RRT::new(domain, generator)),
            Method::RrtStar => {
                let radius = info.neighborhood.ok_or_else(|| {
                    PlanError::Config("rrt_star requires a neighborhood radius".to_string())
                })?;
                Box::new(RRTStar::new(domain, generator, radius)?)
            }
        };
        let track_history = info.method == Method::RrtStar;
        Ok(Self {
            domain,
            method: info.method,
            tree: TreeStore::new(*domain.origin(), info.n_trials, track_history)?,
            planner,
        })
    }

    pub fn method(&self) -> Method {
        self.method
    }

    pub fn tree(&self) -> &TreeStore<D> {
        &self.tree
    }

    /// Grow the tree until it is full or an iteration stalls.
    pub fn run(&mut self, rng: &mut dyn RngCore) -> Result<GrowthReport> {
        info!(
            "Growing {} tree: {} trials",
            self.planner.name(),
            self.tree.capacity()
        );
        let mut report = GrowthReport::default();
        for iteration in self.tree.len()..self.tree.capacity() {
            match self.planner.step(&mut self.tree, iteration, rng) {
                Ok(summary) => {
                    report.completed += 1;
                    report.rewires += summary.rewired;
                    if summary.fallback {
                        report.parent_fallbacks += 1;
                    }
                }
                Err(PlanError::StalledIteration { iteration, attempts }) => {
                    warn!(
                        "Iteration {iteration} found no collision-free edge in {attempts} samples, stopping growth"
                    );
                    report.stalled_at = Some(iteration);
                    break;
                }
                Err(e) => return Err(e),
            }
        }
        info!(
            "Tree holds {} vertices after {} iterations ({} rewires, {} parent fallbacks)",
            self.tree.len(),
            report.completed,
            report.rewires,
            report.parent_fallbacks
        );
        Ok(report)
    }

    /// Cheapest path to every goal, in declared order.
    pub fn solutions(&self) -> Result<Vec<GoalPath>> {
        let paths = extract_paths(&self.tree, self.domain.goals())?;
        for path in &paths {
            match (&path.path, path.cost) {
                (Some(vertices), Some(cost)) => info!(
                    "Goal '{}' reached in {} vertices, cost {cost:.4}",
                    path.goal,
                    vertices.len()
                ),
                _ => info!("Goal '{}' not reached", path.goal),
            }
        }
        Ok(paths)
    }
}

#[cfg(test)]
mod tests {
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    use super::*;
    use crate::config::DEFAULT_MAX_ATTEMPTS;
    use crate::geometry::{Circle, Point, Rectangle, Region};

    fn domain() -> Domain<2> {
        let region = Rectangle::new(Point::<2>::new(0.0, 0.0), Point::<2>::new(2.0, 2.0)).unwrap();
        Domain::new(
            Box::new(region),
            Point::<2>::new(0.1, 0.1),
            vec![Region::new("obstacle_1", Circle::new(Point::<2>::new(1.0, 1.0), 0.3).unwrap())],
            vec![
                Region::new("goal_1", Circle::new(Point::<2>::new(1.8, 1.8), 0.2).unwrap()),
                Region::new(
                    "goal_2",
                    Rectangle::new(Point::<2>::new(1.6, 0.0), Point::<2>::new(2.0, 0.4)).unwrap(),
                ),
            ],
        )
        .unwrap()
    }

    fn info(method: Method, n_trials: usize) -> AlgorithmInfo {
        AlgorithmInfo {
            method,
            n_trials,
            step_size: 0.2,
            dim: 2,
            neighborhood: Some(0.4),
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            seed: None,
        }
    }

    #[test]
    fn basic_run_fills_the_tree() {
        let domain = domain();
        let mut solver = Solver::new(&domain, &info(Method::RrtBasic, 400)).unwrap();
        let report = solver.run(&mut StdRng::seed_from_u64(1)).unwrap();
        assert_eq!(report.completed, 399);
        assert_eq!(report.stalled_at, None);
        assert_eq!(report.rewires, 0);
        assert!(solver.tree().is_full());
        assert!(solver.tree().history().is_none());
    }

    #[test]
    fn optimizing_run_reaches_the_goals() {
        let domain = domain();
        let mut solver = Solver::new(&domain, &info(Method::RrtStar, 1500)).unwrap();
        let report = solver.run(&mut StdRng::seed_from_u64(2)).unwrap();
        assert_eq!(report.completed, 1499);
        assert!(solver.tree().history().is_some());
        let paths = solver.solutions().unwrap();
        assert_eq!(paths.len(), 2);
        for path in &paths {
            let vertices = path.path.as_ref().unwrap();
            assert_eq!(vertices[0], 0);
            // Straight-line distance is a lower bound on any path
            let target = &solver.tree().node(*vertices.last().unwrap()).unwrap().node;
            assert!(path.cost.unwrap() >= (target - domain.origin()).norm() - 1e-9);
        }
    }

    #[test]
    fn single_trial_tree_is_just_the_origin() {
        let domain = domain();
        let mut solver = Solver::new(&domain, &info(Method::RrtStar, 1)).unwrap();
        let report = solver.run(&mut StdRng::seed_from_u64(3)).unwrap();
        assert_eq!(report.completed, 0);
        assert_eq!(solver.tree().len(), 1);
        assert!(solver.solutions().unwrap().iter().all(|p| !p.is_reached()));
    }

    #[test]
    fn stalled_growth_is_reported_not_raised() {
        let region = Rectangle::new(Point::<2>::new(0.0, 0.0), Point::<2>::new(3.0, 3.0)).unwrap();
        let east = Rectangle::new(Point::<2>::new(0.001, 0.0), Point::<2>::new(0.002, 0.003)).unwrap();
        let north = Rectangle::new(Point::<2>::new(0.0, 0.001), Point::<2>::new(0.003, 0.002)).unwrap();
        let domain = Domain::new(
            Box::new(region),
            Point::<2>::new(0.0005, 0.0005),
            vec![Region::new("east", east), Region::new("north", north)],
            vec![Region::new("goal_1", Circle::new(Point::<2>::new(2.5, 2.5), 0.3).unwrap())],
        )
        .unwrap();
        let mut algorithm = info(Method::RrtBasic, 10);
        algorithm.step_size = 1.0;
        algorithm.max_attempts = 100;
        let mut solver = Solver::new(&domain, &algorithm).unwrap();
        let report = solver.run(&mut StdRng::seed_from_u64(4)).unwrap();
        assert_eq!(report.stalled_at, Some(1));
        assert_eq!(report.completed, 0);
        let paths = solver.solutions().unwrap();
        assert!(!paths[0].is_reached());
    }

    #[test]
    fn parent_fallbacks_are_counted() {
        let domain = domain();
        let mut algorithm = info(Method::RrtStar, 200);
        algorithm.step_size = 0.5;
        algorithm.neighborhood = Some(0.05);
        let mut solver = Solver::new(&domain, &algorithm).unwrap();
        let report = solver.run(&mut StdRng::seed_from_u64(6)).unwrap();
        assert_eq!(report.completed, 199);
        assert!(report.parent_fallbacks > 0);
        assert!(report.parent_fallbacks <= report.completed);

        // Basic growth never selects among neighbors
        algorithm.method = Method::RrtBasic;
        let mut solver = Solver::new(&domain, &algorithm).unwrap();
        let report = solver.run(&mut StdRng::seed_from_u64(6)).unwrap();
        assert_eq!(report.parent_fallbacks, 0);
    }

    #[test]
    fn optimizing_needs_a_radius() {
        let domain = domain();
        let mut algorithm = info(Method::RrtStar, 10);
        algorithm.neighborhood = None;
        assert!(matches!(
            Solver::new(&domain, &algorithm),
            Err(PlanError::Config(_))
        ));
    }
}
