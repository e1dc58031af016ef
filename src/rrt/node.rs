use crate::geometry::Point;

/// One vertex of the tree.
#[derive(Debug, Clone, PartialEq)]
pub struct RRTNode<const D: usize> {
    pub node: Point<D>,
    // Path length from the origin through the parent chain
    pub cumulative_cost: f64,
    // None only for the origin
    pub parent: Option<usize>,
}

impl<const D: usize> RRTNode<D> {
    pub fn root(origin: Point<D>) -> Self {
        Self {
            node: origin,
            cumulative_cost: 0.0,
            parent: None,
        }
    }
}
