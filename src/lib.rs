//! Sampling-based path planning with rapidly-exploring random trees.
//!
//! A tree is grown from an origin toward random samples of a bounded domain,
//! avoiding obstacles, until it holds `n_trials` vertices. Afterwards the cheapest
//! vertex inside every goal region is traced back to the origin.
//!
//! Two growth strategies are provided: [`rrt::RRT`], which hangs every new vertex
//! off its nearest neighbor, and [`rrt::RRTStar`], which picks the cheapest parent
//! nearby and rewires neighbors through the new vertex when that shortens their
//! path.
//!
//! ```no_run
//! use std::path::Path;
//!
//! use pathplanner::config::InputFile;
//! use pathplanner::rrt::Solver;
//! use rand::SeedableRng;
//!
//! let input = InputFile::load(Path::new("scenario.json"))?;
//! let domain = input.build_domain::<2>(Path::new("."))?;
//! let mut solver = Solver::new(&domain, &input.algorithm)?;
//! solver.run(&mut rand::rngs::StdRng::seed_from_u64(7))?;
//! for goal in solver.solutions()? {
//!     println!("{}: {:?}", goal.goal, goal.path);
//! }
//! # Ok::<(), pathplanner::PlanError>(())
//! ```
pub mod config;
pub mod error;
pub mod geometry;
pub mod output;
pub mod rrt;

pub use error::{PlanError, Result};
