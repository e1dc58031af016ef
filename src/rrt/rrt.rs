use log::debug;
use rand::RngCore;

use super::node::RRTNode;
use super::store::TreeStore;
use super::vertex::VertexGenerator;
use super::{Planner, StepSummary};
use crate::error::Result;
use crate::geometry::Domain;

/// Basic RRT: every new vertex hangs off its nearest existing vertex.
pub struct RRT<'a, const D: usize> {
    domain: &'a Domain<D>,
    generator: VertexGenerator,
}

impl<'a, const D: usize> RRT<'a, D> {
    pub fn new(domain: &'a Domain<D>, generator: VertexGenerator) -> Self {
        Self { domain, generator }
    }
}

impl<const D: usize> Planner<D> for RRT<'_, D> {
    fn name(&self) -> &'static str {
        "rrt_basic"
    }

    fn step(
        &mut self,
        tree: &mut TreeStore<D>,
        iteration: usize,
        rng: &mut dyn RngCore,
    ) -> Result<StepSummary> {
        let candidate = self.generator.generate(self.domain, tree, iteration, rng)?;
        let cumulative_cost = tree.node(candidate.parent)?.cumulative_cost + candidate.edge_length;
        tree.record(
            iteration,
            RRTNode {
                node: candidate.point,
                cumulative_cost,
                parent: Some(candidate.parent),
            },
        )?;
        debug!(
            "Iteration {iteration}: vertex attached to {} at cost {cumulative_cost:.4}",
            candidate.parent
        );
        Ok(StepSummary {
            parent: candidate.parent,
            ..Default::default()
        })
    }
}
