//! Presentation of a finished run: a text/JSON report and an SVG plot.
mod plot;
mod report;

pub use self::plot::{Plot, PlotConfig};
pub use self::report::{GoalSolution, Report, TreeArrays};
