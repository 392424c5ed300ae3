mod transport;
mod tui;

use anyhow::{Context, Result, anyhow};
use clap::Parser;
use std::{
    io::{self, BufRead},
    path::{Path, PathBuf},
};
use tracing::info;
use tracing_subscriber::EnvFilter;
use treasure_hunt_core::{
    ViewConfig,
    agent::{ManualAgent, PlanningAgent},
    environment::{ActionResult, Environment, load_environment_from_string},
};

use transport::Connection;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Port of the game server on localhost
    #[arg(short, long, value_name = "PORT", required_unless_present = "map")]
    port: Option<u16>,

    /// Map file to play offline instead of connecting to a server
    #[arg(short, long, value_name = "MAP_FILE")]
    map: Option<PathBuf>,

    /// Watch the offline game in a terminal UI
    #[arg(long, requires = "map", conflicts_with = "manual")]
    tui: bool,

    /// Type actions (f, l, r, c, u) on stdin instead of planning
    #[arg(long)]
    manual: bool,

    /// Give up on an offline game after this many ticks
    #[arg(long, default_value_t = 10_000)]
    max_steps: usize,

    /// Side of the square sensor window (odd, at least 3)
    #[arg(long, default_value = "5", value_parser = parse_view_size)]
    view_size: ViewConfig,

    /// Log planner decisions to stderr
    #[arg(short, long)]
    debug: bool,
}

fn parse_view_size(s: &str) -> Result<ViewConfig, String> {
    let size: usize = s.parse().map_err(|_| format!("`{s}` is not a number"))?;
    ViewConfig::square(size).ok_or_else(|| format!("{size} is not an odd size of at least 3"))
}

/// Logs go to stderr so they never mix with the game's byte stream on stdout.
fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.debug);

    match (&args.port, &args.map) {
        (_, Some(map_file)) => play_offline(&args, map_file),
        (Some(port), None) => play_online(&args, *port),
        (None, None) => Err(anyhow!("either --port or --map is required")),
    }
}

fn play_online(args: &Args, port: u16) -> Result<()> {
    let mut connection = Connection::connect(port, args.view_size)?;
    let sent = if args.manual {
        let mut agent = ManualAgent::new(args.view_size, io::stdin().lock());
        transport::play(&mut connection, &mut agent)?
    } else {
        let mut agent = PlanningAgent::new(args.view_size);
        transport::play(&mut connection, &mut agent)?
    };
    info!(sent, "game over");
    Ok(())
}

fn play_offline(args: &Args, map_file: &Path) -> Result<()> {
    let map = std::fs::read_to_string(map_file)
        .with_context(|| format!("failed to read map file {}", map_file.display()))?;
    let mut environment = load_environment_from_string(&map, args.view_size)
        .with_context(|| format!("failed to load map {}", map_file.display()))?;

    let outcome = if args.tui {
        tui::run(environment, args.max_steps)?
    } else if args.manual {
        let mut agent = ManualAgent::new(args.view_size, io::stdin().lock());
        play_manually(&mut environment, &mut agent, args.max_steps)
    } else {
        let mut agent = PlanningAgent::new(args.view_size);
        let outcome = environment.run(&mut agent, args.max_steps);
        print!("{}", environment.render());
        Some(outcome)
    };

    match outcome {
        Some(ActionResult::Win) => println!("Gold brought home."),
        Some(ActionResult::Lost(reason)) => println!("Lost: {reason}"),
        Some(ActionResult::Failure(reason)) => println!("{reason}"),
        Some(ActionResult::Success) | None => println!("Game abandoned."),
    }
    Ok(())
}

/// Shows the island before every typed action until the game ends or input runs out.
fn play_manually<R: BufRead>(
    environment: &mut Environment,
    agent: &mut ManualAgent<R>,
    max_steps: usize,
) -> Option<ActionResult> {
    for _ in 0..max_steps {
        println!("{}", environment.render());
        match environment.step(agent)? {
            result @ (ActionResult::Win | ActionResult::Lost(_)) => return Some(result),
            ActionResult::Failure(reason) => println!("{reason}"),
            ActionResult::Success => {}
        }
    }
    None
}
