//! Command line front end: plan a path for a JSON scenario and write the results.
//!
//! Usage:
//!   pathplanner scenarios/circle_obstacles.json --output-dir out
//!
//! Per-iteration detail is logged at debug level:
//!   RUST_LOG=debug pathplanner scenarios/circle_obstacles.json

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::Parser;
use log::info;
use rand::rngs::StdRng;
use rand::SeedableRng;

use pathplanner::config::InputFile;
use pathplanner::output::{Plot, Report};
use pathplanner::rrt::Solver;

/// Grow an RRT or RRT* tree through a scenario and report the path to each goal
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Scenario file (JSON)
    input: PathBuf,

    /// Directory for the .txt, .json and .svg results
    #[arg(short, long, default_value = ".")]
    output_dir: PathBuf,

    /// Random seed, overriding the scenario's
    #[arg(long)]
    seed: Option<u64>,

    /// Skip writing the SVG plot
    #[arg(long)]
    no_plot: bool,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    let input = InputFile::load(&args.input)
        .with_context(|| format!("Failed to load scenario {}", args.input.display()))?;
    match input.dim() {
        2 => run_planner::<2>(&args, &input),
        3 => run_planner::<3>(&args, &input),
        dim => bail!("Unsupported dimension {dim}"),
    }
}

fn run_planner<const D: usize>(args: &Args, input: &InputFile) -> anyhow::Result<()> {
    let base_dir = args.input.parent().unwrap_or(Path::new("."));
    let domain = input
        .build_domain::<D>(base_dir)
        .context("Failed to assemble the planning domain")?;
    info!(
        "Domain ready: {} obstacle(s), {} goal(s)",
        domain.obstacles().len(),
        domain.goals().len()
    );

    let mut rng = match args.seed.or(input.algorithm.seed) {
        Some(seed) => {
            info!("Seeding sampler with {seed}");
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_os_rng(),
    };

    let mut solver = Solver::new(&domain, &input.algorithm)?;
    let growth = solver.run(&mut rng).context("Tree growth failed")?;
    let paths = solver.solutions().context("Path extraction failed")?;

    let title = args
        .input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "pathplanner".to_string());
    let report = Report::new(title.as_str(), &solver, growth, &paths)?;
    println!("{report}");

    std::fs::create_dir_all(&args.output_dir).with_context(|| {
        format!("Failed to create output directory {}", args.output_dir.display())
    })?;
    let text_path = args.output_dir.join(format!("{title}.txt"));
    report
        .save_text(&text_path)
        .with_context(|| format!("Failed to write {}", text_path.display()))?;
    let json_path = args.output_dir.join(format!("{title}.json"));
    report
        .save_json(&json_path)
        .with_context(|| format!("Failed to write {}", json_path.display()))?;
    info!("Results written to {} and {}", text_path.display(), json_path.display());

    if !args.no_plot {
        let plot_path = args.output_dir.join(format!("{title}.svg"));
        Plot::new(format!("Path Planning Solution: {title}"))
            .save(&plot_path, &domain, solver.tree(), &paths)
            .with_context(|| format!("Failed to write {}", plot_path.display()))?;
        info!("Plot written to {}", plot_path.display());
    }
    Ok(())
}
