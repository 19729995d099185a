//! physcheck: inspect and repair URDF link inertias.
//!
//! # Commands
//!
//! - `physcheck check [TARGET]` - Run the inertia checks and print the report
//! - `physcheck tree [TARGET]` - Print the kinematic tree with per-link status
//! - `physcheck fix [TARGET]` - Write a copy with geometry-based inertias
//!
//! TARGET is a URDF file, a directory with URDF files, or a robot name under
//! `--robots-dir`. Without it the robot is picked interactively.

use std::io::{self, IsTerminal, StdinLock, Stdout, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use sim_inertia::{
    default_output_path, fix_inertias, summarize, GeometrySource, RewriteOptions,
};
use sim_physcheck::{
    build_tree_scene, compute_tree_layout, resolve_urdf_path, write_check_report,
    write_rewrite_report, write_tree, Prompter,
};
use sim_urdf::{load_urdf_file, validate_structure, KinematicTree, UrdfRobot};
use tracing::{debug, warn};
use tracing_subscriber::EnvFilter;

type StdPrompter = Prompter<StdinLock<'static>, Stdout>;

/// Physical plausibility checks for URDF inertias
#[derive(Parser)]
#[command(name = "physcheck")]
#[command(about = "Check and repair URDF link inertias", long_about = None)]
#[command(version)]
struct Cli {
    /// Directory holding one subdirectory per robot
    #[arg(long, global = true, default_value = "robots")]
    robots_dir: PathBuf,

    /// Log debug output (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the inertia checks on every link
    Check {
        /// Robot name, URDF file or directory
        target: Option<String>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Print the kinematic tree with check status per link
    Tree {
        /// Robot name, URDF file or directory
        target: Option<String>,

        /// Print the scene as JSON
        #[arg(long)]
        json: bool,
    },

    /// Replace implausible inertias with geometry-based estimates
    Fix(FixArgs),
}

#[derive(clap::Args)]
struct FixArgs {
    /// Robot name, URDF file or directory
    target: Option<String>,

    /// Output URDF path (default: <name>_fixed.urdf next to the source)
    #[arg(long)]
    output: Option<PathBuf>,

    /// Include warning-level issues (not only errors)
    #[arg(long)]
    include_warnings: bool,

    /// Include triangle-inequality violations without prompting
    #[arg(long, conflicts_with = "skip_triangle")]
    include_triangle: bool,

    /// Skip triangle-inequality violations without prompting
    #[arg(long)]
    skip_triangle: bool,

    /// Preferred geometry when both are present
    #[arg(long, value_enum)]
    prefer_geometry: Option<GeometryArg>,

    /// Do not prompt; unspecified options take their defaults
    #[arg(short, long)]
    yes: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum GeometryArg {
    Collision,
    Visual,
}

impl From<GeometryArg> for GeometrySource {
    fn from(arg: GeometryArg) -> Self {
        match arg {
            GeometryArg::Collision => Self::Collision,
            GeometryArg::Visual => Self::Visual,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut prompter = Prompter::new(io::stdin().lock(), io::stdout());
    let color = io::stdout().is_terminal();

    match cli.command {
        Commands::Check { target, json } => {
            let robot = load(target.as_deref(), &cli.robots_dir, &mut prompter)?;
            check(&robot, json, color)
        }
        Commands::Tree { target, json } => {
            let robot = load(target.as_deref(), &cli.robots_dir, &mut prompter)?;
            tree(&robot, json, color)
        }
        Commands::Fix(args) => fix(&args, &cli.robots_dir, &mut prompter),
    }
}

fn init_tracing(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .compact()
        .init();
}

fn resolve(target: Option<&str>, robots_dir: &Path, prompter: &mut StdPrompter) -> Result<PathBuf> {
    let path = resolve_urdf_path(target, robots_dir, prompter)?;
    debug!(path = %path.display(), "resolved target");
    Ok(path)
}

fn load(target: Option<&str>, robots_dir: &Path, prompter: &mut StdPrompter) -> Result<UrdfRobot> {
    let path = resolve(target, robots_dir, prompter)?;
    load_urdf_file(&path).with_context(|| format!("failed to load {}", path.display()))
}

fn check(robot: &UrdfRobot, json: bool, color: bool) -> Result<()> {
    let summary = summarize(&robot.links);
    let mut out = io::stdout().lock();

    if json {
        serde_json::to_writer_pretty(&mut out, &summary)?;
        writeln!(out)?;
    } else {
        writeln!(out, "Inertia checks:")?;
        write_check_report(&mut out, &summary, color)?;
    }
    Ok(())
}

fn tree(robot: &UrdfRobot, json: bool, color: bool) -> Result<()> {
    if let Err(err) = validate_structure(robot) {
        warn!(%err, "robot does not form a single tree");
    }

    let summary = summarize(&robot.links);
    let tree = KinematicTree::from_robot(robot);
    let layout = compute_tree_layout(&tree);
    let scene = build_tree_scene(robot, &tree, &layout, &summary);
    let mut out = io::stdout().lock();

    if json {
        serde_json::to_writer_pretty(&mut out, &scene)?;
        writeln!(out)?;
    } else {
        writeln!(out, "Inertia checks:")?;
        write_check_report(&mut out, &summary, color)?;
        writeln!(out)?;
        write_tree(&mut out, &scene, color)?;
    }
    Ok(())
}

fn fix(args: &FixArgs, robots_dir: &Path, prompter: &mut StdPrompter) -> Result<()> {
    let source = resolve(args.target.as_deref(), robots_dir, prompter)?;

    let include_warnings = if args.include_warnings {
        true
    } else if args.yes {
        false
    } else {
        prompter.confirm("Fix warning-level issues in addition to errors?", Some(false))?
    };

    let include_triangle = if args.include_triangle {
        true
    } else if args.skip_triangle {
        false
    } else if args.yes {
        true
    } else {
        prompter.confirm("Fix triangle-inequality violations?", Some(true))?
    };

    let prefer = match args.prefer_geometry {
        Some(arg) => arg.into(),
        None if args.yes => GeometrySource::Collision,
        None => {
            let choice = prompter.choose_with_default(
                "Preferred geometry source (used when both are present):",
                &["collision (recommended)", "visual"],
                0,
            )?;
            if choice == 0 {
                GeometrySource::Collision
            } else {
                GeometrySource::Visual
            }
        }
    };

    let output = args
        .output
        .clone()
        .unwrap_or_else(|| default_output_path(&source));

    if !args.yes {
        let question = format!("Proceed to write fixed URDF to {}?", output.display());
        if !prompter.confirm(&question, Some(false))? {
            println!("Aborted.");
            return Ok(());
        }
    }

    let options = RewriteOptions::default()
        .include_warnings(include_warnings)
        .include_triangle(include_triangle)
        .prefer(prefer);
    let report = fix_inertias(&source, Some(&output), &options)?;

    write_rewrite_report(&mut io::stdout().lock(), &report)?;
    Ok(())
}
