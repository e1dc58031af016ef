use super::node::RRTNode;
use crate::error::{PlanError, Result};
use crate::geometry::Point;

/// Which of the two per-iteration parent snapshots to write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryStage {
    /// Right after the new vertex was attached to its parent.
    Attached,
    /// After rewiring finished.
    Rewired,
}

/// Parent-array snapshots across iterations, two columns per iteration.
///
/// Column `2 * i` holds the parents right after vertex `i` was attached, column
/// `2 * i + 1` the parents after rewiring. Every column spans the full capacity;
/// row 0 is the origin and any other `None` row is an unassigned slot. Columns of
/// iterations that never ran keep that unassigned fill. Only consumed by
/// visualisation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParentHistory {
    columns: Vec<Vec<Option<usize>>>,
}

impl ParentHistory {
    fn new(capacity: usize) -> Self {
        Self {
            columns: vec![vec![None; capacity]; 2 * capacity],
        }
    }

    pub fn column(&self, index: usize) -> Option<&[Option<usize>]> {
        self.columns.get(index).map(Vec::as_slice)
    }

    pub fn columns(&self) -> &[Vec<Option<usize>>] {
        &self.columns
    }

    fn record(&mut self, iteration: usize, stage: HistoryStage, parents: Vec<Option<usize>>) {
        let offset = match stage {
            HistoryStage::Attached => 0,
            HistoryStage::Rewired => 1,
        };
        if let Some(column) = self.columns.get_mut(2 * iteration + offset) {
            *column = parents;
        }
    }
}

/// Fixed-capacity store of tree vertices, indexed by the iteration that created them.
///
/// Slots are filled strictly in index order; anything past [`TreeStore::len`] is
/// unassigned. Parents and costs of existing slots may be rewritten by rewiring.
#[derive(Debug, Clone)]
pub struct TreeStore<const D: usize> {
    slots: Vec<Option<RRTNode<D>>>,
    len: usize,
    history: Option<ParentHistory>,
}

impl<const D: usize> TreeStore<D> {
    /// Create a store with room for `capacity` vertices, slot 0 holding the origin.
    pub fn new(origin: Point<D>, capacity: usize, track_history: bool) -> Result<Self> {
        if capacity == 0 {
            return Err(PlanError::Config(
                "tree capacity (n_trials) must be at least 1".to_string(),
            ));
        }
        let mut slots = vec![None; capacity];
        slots[0] = Some(RRTNode::root(origin));
        Ok(Self {
            slots,
            len: 1,
            history: track_history.then(|| ParentHistory::new(capacity)),
        })
    }

    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Number of assigned vertices.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == self.slots.len()
    }

    /// Every slot, unassigned ones included.
    pub fn slots(&self) -> &[Option<RRTNode<D>>] {
        &self.slots
    }

    pub fn get(&self, index: usize) -> Option<&RRTNode<D>> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    pub fn node(&self, index: usize) -> Result<&RRTNode<D>> {
        self.get(index)
            .ok_or_else(|| PlanError::CorruptTree(format!("vertex {index} is not assigned")))
    }

    /// Assigned vertices in index order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &RRTNode<D>)> + '_ {
        self.slots[..self.len]
            .iter()
            .enumerate()
            .filter_map(|(i, slot)| slot.as_ref().map(|n| (i, n)))
    }

    /// Coordinates of assigned vertices in index order.
    pub fn vertices(&self) -> impl Iterator<Item = (usize, &Point<D>)> + '_ {
        self.iter().map(|(i, n)| (i, &n.node))
    }

    /// Write the vertex created at iteration `index`.
    pub fn record(&mut self, index: usize, node: RRTNode<D>) -> Result<()> {
        if index >= self.slots.len() {
            return Err(PlanError::TreeFull {
                capacity: self.slots.len(),
            });
        }
        if index != self.len {
            return Err(PlanError::OutOfOrder {
                expected: self.len,
                got: index,
            });
        }
        match node.parent {
            Some(parent) if parent < self.len => {}
            other => {
                return Err(PlanError::CorruptTree(format!(
                    "vertex {index} must hang off an existing vertex, got parent {other:?}"
                )))
            }
        }
        self.slots[index] = Some(node);
        self.len += 1;
        Ok(())
    }

    /// Point an existing vertex at a new parent with the given path cost.
    pub fn reparent(&mut self, index: usize, parent: usize, cumulative_cost: f64) -> Result<()> {
        if index == 0 || index == parent || parent >= self.len {
            return Err(PlanError::CorruptTree(format!(
                "cannot attach vertex {index} to {parent}"
            )));
        }
        let node = self.node_mut(index)?;
        node.parent = Some(parent);
        node.cumulative_cost = cumulative_cost;
        Ok(())
    }

    pub(crate) fn set_cost(&mut self, index: usize, cumulative_cost: f64) -> Result<()> {
        self.node_mut(index)?.cumulative_cost = cumulative_cost;
        Ok(())
    }

    fn node_mut(&mut self, index: usize) -> Result<&mut RRTNode<D>> {
        self.slots
            .get_mut(index)
            .and_then(Option::as_mut)
            .ok_or_else(|| PlanError::CorruptTree(format!("vertex {index} is not assigned")))
    }

    /// Parent of every slot, in index order, over the full capacity.
    ///
    /// `None` marks the origin at index 0 and every unassigned slot.
    pub fn parents(&self) -> Vec<Option<usize>> {
        self.slots
            .iter()
            .map(|slot| slot.as_ref().and_then(|n| n.parent))
            .collect()
    }

    /// Children of every assigned vertex.
    pub fn children(&self) -> Vec<Vec<usize>> {
        let mut children = vec![Vec::new(); self.len];
        for (index, node) in self.iter() {
            if let Some(parent) = node.parent {
                children[parent].push(index);
            }
        }
        children
    }

    /// `index` followed by its ancestors up to and including the origin.
    pub fn parent_chain(&self, index: usize) -> Result<Vec<usize>> {
        let mut chain = vec![index];
        let mut current = self.node(index)?;
        while let Some(parent) = current.parent {
            if chain.len() > self.len {
                return Err(PlanError::CorruptTree(format!(
                    "parent chain of vertex {index} does not reach the origin"
                )));
            }
            chain.push(parent);
            current = self.node(parent)?;
        }
        Ok(chain)
    }

    pub fn history(&self) -> Option<&ParentHistory> {
        self.history.as_ref()
    }

    /// Store a snapshot of the current parents, if history is tracked.
    pub fn snapshot_parents(&mut self, iteration: usize, stage: HistoryStage) {
        if self.history.is_some() {
            let parents = self.parents();
            if let Some(history) = self.history.as_mut() {
                history.record(iteration, stage, parents);
            }
        }
    }
}
