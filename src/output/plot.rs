use std::path::Path;

use svg::node::element::{Circle, Group, Line, Polyline, Rectangle, Text};
use svg::Document;

use crate::error::Result;
use crate::geometry::{Bounds, Domain, Point, Shape};
use crate::rrt::{GoalPath, TreeStore};

mod colors {
    pub const DOMAIN: &str = "#F4F4F4";
    pub const OBSTACLE: &str = "#555555";
    pub const GOAL: &str = "#009E73";
    pub const TREE: &str = "#56B4E9";
    pub const PATH: &str = "#D55E00";
    pub const ORIGIN: &str = "#0072B2";
}

/// Rendering settings for [`Plot`].
#[derive(Debug, Clone)]
pub struct PlotConfig {
    /// Width of the drawing area in pixels, padding excluded.
    pub width: f64,
    pub padding: f64,
    /// Cells along the longer side when rasterising regions.
    pub resolution: usize,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            width: 800.0,
            padding: 40.0,
            resolution: 200,
        }
    }
}

/// SVG picture of a planning run, projected onto the first two axes.
///
/// Regions are drawn by sampling their membership on a grid, so every shape kind
/// renders the same way. In three dimensions the regions are cut at the middle of
/// the domain's third axis.
pub struct Plot {
    title: String,
    config: PlotConfig,
}

/// Maps domain coordinates to SVG pixels, y pointing up.
struct Frame {
    lower: (f64, f64),
    upper: (f64, f64),
    scale: f64,
    padding: f64,
}

impl Frame {
    fn pixel(&self, x: f64, y: f64) -> (f64, f64) {
        (
            self.padding + (x - self.lower.0) * self.scale,
            self.padding + (self.upper.1 - y) * self.scale,
        )
    }

    fn size(&self) -> (f64, f64) {
        (
            (self.upper.0 - self.lower.0) * self.scale + 2.0 * self.padding,
            (self.upper.1 - self.lower.1) * self.scale + 2.0 * self.padding,
        )
    }
}

impl Plot {
    pub fn new(title: impl Into<String>) -> Self {
        Self::with_config(title, PlotConfig::default())
    }

    pub fn with_config(title: impl Into<String>, config: PlotConfig) -> Self {
        Self {
            title: title.into(),
            config,
        }
    }

    /// Build the document for a grown tree and its goal paths.
    pub fn render<const D: usize>(
        &self,
        domain: &Domain<D>,
        tree: &TreeStore<D>,
        paths: &[GoalPath],
    ) -> Document {
        let bounds = domain.region().bounds();
        let longest = (bounds.upper[0] - bounds.lower[0]).max(bounds.upper[1] - bounds.lower[1]);
        let frame = Frame {
            lower: (bounds.lower[0], bounds.lower[1]),
            upper: (bounds.upper[0], bounds.upper[1]),
            scale: self.config.width / longest,
            padding: self.config.padding,
        };
        let (width, height) = frame.size();

        let mut regions = Group::new()
            .set("id", "regions")
            .add(self.raster(domain.region(), &bounds, &frame, colors::DOMAIN));
        for obstacle in domain.obstacles() {
            regions = regions.add(self.raster(obstacle.shape(), &bounds, &frame, colors::OBSTACLE));
        }
        for goal in domain.goals() {
            regions = regions.add(self.raster(goal.shape(), &bounds, &frame, colors::GOAL));
        }

        let (ox, oy) = frame.pixel(domain.origin()[0], domain.origin()[1]);
        Document::new()
            .set("width", width)
            .set("height", height)
            .set("viewBox", (0.0, 0.0, width, height))
            .add(
                Rectangle::new()
                    .set("width", width)
                    .set("height", height)
                    .set("fill", "white"),
            )
            .add(regions)
            .add(tree_edges(tree, &frame))
            .add(solution_paths(tree, paths, &frame))
            .add(
                Circle::new()
                    .set("cx", ox)
                    .set("cy", oy)
                    .set("r", 5.0)
                    .set("fill", colors::ORIGIN),
            )
            .add(
                Text::new(self.title.as_str())
                    .set("x", self.config.padding)
                    .set("y", self.config.padding / 2.0)
                    .set("font-family", "sans-serif")
                    .set("font-size", 16),
            )
    }

    pub fn save<const D: usize>(
        &self,
        path: &Path,
        domain: &Domain<D>,
        tree: &TreeStore<D>,
        paths: &[GoalPath],
    ) -> Result<()> {
        svg::save(path, &self.render(domain, tree, paths))?;
        Ok(())
    }

    /// One rectangle per horizontal run of grid cells whose centers lie in `shape`.
    fn raster<const D: usize>(
        &self,
        shape: &dyn Shape<D>,
        bounds: &Bounds<D>,
        frame: &Frame,
        fill: &str,
    ) -> Group {
        let extent = (bounds.upper - bounds.lower).map(|x| x.max(f64::EPSILON));
        let longest = extent[0].max(extent[1]);
        let cell = longest / self.config.resolution.max(1) as f64;
        let columns = (extent[0] / cell).ceil() as usize;
        let rows = (extent[1] / cell).ceil() as usize;

        // Cut through the middle of any further axes
        let mut probe: Point<D> = bounds.center();
        let mut group = Group::new().set("fill", fill);
        for row in 0..rows {
            let y = bounds.lower[1] + (row as f64 + 0.5) * cell;
            probe[1] = y;
            let mut run_start: Option<usize> = None;
            for column in 0..=columns {
                let inside = column < columns && {
                    probe[0] = bounds.lower[0] + (column as f64 + 0.5) * cell;
                    shape.is_point_inside(&probe)
                };
                match (inside, run_start) {
                    (true, None) => run_start = Some(column),
                    (false, Some(start)) => {
                        let (x, top) = frame.pixel(
                            bounds.lower[0] + start as f64 * cell,
                            bounds.lower[1] + (row + 1) as f64 * cell,
                        );
                        group = group.add(
                            Rectangle::new()
                                .set("x", x)
                                .set("y", top)
                                .set("width", (column - start) as f64 * cell * frame.scale)
                                .set("height", cell * frame.scale),
                        );
                        run_start = None;
                    }
                    _ => {}
                }
            }
        }
        group
    }
}

fn tree_edges<const D: usize>(tree: &TreeStore<D>, frame: &Frame) -> Group {
    let mut group = Group::new()
        .set("id", "tree")
        .set("stroke", colors::TREE)
        .set("stroke-width", 1.0);
    for (_, node) in tree.iter() {
        let Some(parent) = node.parent.and_then(|p| tree.get(p)) else {
            continue;
        };
        let (x1, y1) = frame.pixel(parent.node[0], parent.node[1]);
        let (x2, y2) = frame.pixel(node.node[0], node.node[1]);
        group = group.add(
            Line::new()
                .set("x1", x1)
                .set("y1", y1)
                .set("x2", x2)
                .set("y2", y2),
        );
    }
    group
}

fn solution_paths<const D: usize>(tree: &TreeStore<D>, paths: &[GoalPath], frame: &Frame) -> Group {
    let mut group = Group::new().set("id", "solutions");
    for goal_path in paths {
        let Some(path) = &goal_path.path else {
            continue;
        };
        let points = path
            .iter()
            .filter_map(|&i| tree.get(i))
            .map(|n| {
                let (x, y) = frame.pixel(n.node[0], n.node[1]);
                format!("{x:.2},{y:.2}")
            })
            .collect::<Vec<_>>()
            .join(" ");
        group = group.add(
            Polyline::new()
                .set("points", points)
                .set("fill", "none")
                .set("stroke", colors::PATH)
                .set("stroke-width", 3.0)
                .set("stroke-linejoin", "round"),
        );
    }
    group
}
