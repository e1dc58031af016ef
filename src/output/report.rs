use std::fmt;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::Serialize;

use crate::config::Method;
use crate::error::Result;
use crate::rrt::{GoalPath, GrowthReport, Solver, TreeStore};

/// Solution to one goal, with coordinates resolved.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GoalSolution {
    pub goal: String,
    pub path: Option<Vec<usize>>,
    pub vertices: Option<Vec<Vec<f64>>>,
    pub cost: Option<f64>,
}

/// The tree store flattened into plain arrays.
///
/// Parents use -1 for the origin; unassigned slots are `null` throughout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TreeArrays {
    pub vertices: Vec<Option<Vec<f64>>>,
    pub parents: Vec<Option<i64>>,
    pub costs: Vec<Option<f64>>,
}

impl TreeArrays {
    pub fn new<const D: usize>(tree: &TreeStore<D>) -> Self {
        let slots = tree.slots();
        Self {
            vertices: slots
                .iter()
                .map(|slot| slot.as_ref().map(|n| n.node.as_slice().to_vec()))
                .collect(),
            parents: slots
                .iter()
                .map(|slot| slot.as_ref().map(|n| parent_index(n.parent)))
                .collect(),
            costs: slots
                .iter()
                .map(|slot| slot.as_ref().map(|n| n.cumulative_cost))
                .collect(),
        }
    }
}

fn parent_index(parent: Option<usize>) -> i64 {
    parent.map_or(-1, |p| p as i64)
}

/// Everything a planning run produced.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub title: String,
    pub method: Method,
    pub dim: usize,
    pub growth: GrowthReport,
    pub solutions: Vec<GoalSolution>,
    pub tree: TreeArrays,
    /// Parent arrays after attaching and after rewiring, per iteration, each as
    /// long as the tree capacity and encoded like [`TreeArrays::parents`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parents_history: Option<Vec<Vec<Option<i64>>>>,
}

impl Report {
    pub fn new<const D: usize>(
        title: impl Into<String>,
        solver: &Solver<'_, D>,
        growth: GrowthReport,
        paths: &[GoalPath],
    ) -> Result<Self> {
        let tree = solver.tree();
        let solutions = paths
            .iter()
            .map(|goal_path| {
                let vertices = match &goal_path.path {
                    Some(path) => Some(
                        path.iter()
                            .map(|&i| Ok(tree.node(i)?.node.as_slice().to_vec()))
                            .collect::<Result<Vec<_>>>()?,
                    ),
                    None => None,
                };
                Ok(GoalSolution {
                    goal: goal_path.goal.clone(),
                    path: goal_path.path.clone(),
                    vertices,
                    cost: goal_path.cost,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        let parents_history = tree.history().map(|history| {
            history
                .columns()
                .iter()
                .map(|column| {
                    column
                        .iter()
                        .enumerate()
                        .map(|(row, &parent)| match (row, parent) {
                            (0, _) => Some(-1),
                            (_, Some(p)) => Some(p as i64),
                            (_, None) => None,
                        })
                        .collect()
                })
                .collect()
        });
        Ok(Self {
            title: title.into(),
            method: solver.method(),
            dim: D,
            growth,
            solutions,
            tree: TreeArrays::new(tree),
            parents_history,
        })
    }

    /// Write the text rendering to `path`.
    pub fn save_text(&self, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        write!(writer, "{self}")?;
        writer.flush()?;
        Ok(())
    }

    /// Write the full report, tree arrays included, as JSON.
    pub fn save_json(&self, path: &Path) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }
}

struct Coordinates<'a>(&'a [f64]);

impl fmt::Display for Coordinates<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, x) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{x:.3}")?;
        }
        write!(f, "]")
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Solution Path(s)")?;
        writeln!(f)?;
        for solution in &self.solutions {
            match &solution.path {
                Some(path) => writeln!(f, "{}: {path:?}", solution.goal)?,
                None => writeln!(f, "{}: no path", solution.goal)?,
            }
        }

        writeln!(f)?;
        writeln!(f, "Solution Vertices")?;
        for solution in &self.solutions {
            writeln!(f)?;
            writeln!(f, "{}:", solution.goal)?;
            match &solution.vertices {
                Some(vertices) => {
                    for vertex in vertices {
                        writeln!(f, "{}", Coordinates(vertex))?;
                    }
                }
                None => writeln!(f, "no path")?,
            }
        }

        writeln!(f)?;
        writeln!(f, "Solution Cost(s)")?;
        writeln!(f)?;
        for solution in &self.solutions {
            match solution.cost {
                Some(cost) => writeln!(f, "{}: {cost:.3}", solution.goal)?,
                None => writeln!(f, "{}: no path", solution.goal)?,
            }
        }
        if let Some(iteration) = self.growth.stalled_at {
            writeln!(f)?;
            writeln!(
                f,
                "Tree growth stalled at iteration {iteration} of {}",
                self.tree.parents.len()
            )?;
        }
        Ok(())
    }
}
