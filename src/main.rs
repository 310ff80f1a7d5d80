//! # Emberdeep Headless Driver
//!
//! Runs a session in the terminal: key tokens are read line by line from
//! stdin while a periodic tick drives monsters and lights. Each branch of the
//! loop mutates the session to completion before the next one is polled.

use clap::Parser;
use emberdeep::{
    describe_event, render_ascii, status_line, EmberResult, GameConfig, GameSession, InputHandler,
    PlayerInput, KEY_HELP,
};
use log::{error, info};
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::time::MissedTickBehavior;

/// Command line arguments for the Emberdeep driver.
#[derive(Parser, Debug)]
#[command(name = "emberdeep")]
#[command(about = "Headless driver for the Emberdeep cave roguelike core")]
#[command(version)]
struct Args {
    /// Random seed; overrides the seed from the config file
    #[arg(short, long)]
    seed: Option<u64>,

    /// JSON configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Print game events as JSON lines instead of text
    #[arg(long)]
    json_events: bool,

    /// Stop after this many ticks; keeps ticking after stdin closes
    #[arg(long)]
    ticks: Option<u64>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args = Args::parse();
    initialize_logging(&args.log_level);

    if let Err(e) = run(&args).await {
        error!("{}", e);
        std::process::exit(1);
    }
}

/// Initializes env_logger from the requested level; `RUST_LOG` style
/// filters such as `emberdeep=debug` work too.
fn initialize_logging(log_level: &str) {
    env_logger::Builder::new()
        .parse_filters(log_level)
        .format_timestamp_millis()
        .init();
}

fn load_config(args: &Args) -> EmberResult<GameConfig> {
    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from {}", path.display());
            GameConfig::load(path)?
        }
        None => GameConfig::default(),
    };
    if let Some(seed) = args.seed {
        config.seed = seed;
    }
    config.validate()?;
    Ok(config)
}

async fn run(args: &Args) -> EmberResult<()> {
    info!("Starting Emberdeep v{}", emberdeep::VERSION);
    let config = load_config(args)?;
    let tick_interval = Duration::from_millis(config.tick_interval_ms);
    let mut session = GameSession::new(config)?;
    let input = InputHandler::new();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut interval = tokio::time::interval(tick_interval);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first tick of a tokio interval completes immediately
    interval.tick().await;

    let mut stdin_open = true;
    let mut ticks_run = 0u64;
    draw(&mut session, args)?;

    loop {
        tokio::select! {
            line = lines.next_line(), if stdin_open => {
                let Some(line) = line? else {
                    stdin_open = false;
                    if args.ticks.is_none() {
                        break;
                    }
                    continue;
                };
                for player_input in input.parse_line(&line) {
                    match player_input {
                        PlayerInput::Quit => {
                            finish(&session, args)?;
                            return Ok(());
                        }
                        PlayerInput::Help => println!("{}", KEY_HELP),
                        PlayerInput::Wait => session.tick()?,
                        PlayerInput::Command(command) => session.handle_command(command)?,
                    }
                }
                draw(&mut session, args)?;
            }
            _ = interval.tick() => {
                session.tick()?;
                ticks_run += 1;
                flush_events(&mut session, args)?;
                if args.ticks.is_some_and(|limit| ticks_run >= limit) {
                    break;
                }
            }
        }
    }

    finish(&session, args)
}

/// Prints pending events, then the map and status in text mode.
fn draw(session: &mut GameSession, args: &Args) -> EmberResult<()> {
    flush_events(session, args)?;
    if !args.json_events {
        print!("{}", render_ascii(session));
        println!("{}", status_line(session));
    }
    Ok(())
}

fn flush_events(session: &mut GameSession, args: &Args) -> EmberResult<()> {
    for event in session.drain_events() {
        if args.json_events {
            println!("{}", serde_json::to_string(&event)?);
        } else if let Some(message) = describe_event(&event) {
            println!("{}", message);
        }
    }
    Ok(())
}

fn finish(session: &GameSession, args: &Args) -> EmberResult<()> {
    if args.json_events {
        println!("{}", serde_json::to_string(session.stats())?);
    } else {
        println!("{}", status_line(session));
    }
    info!(
        "Session ended at depth {} after {} ticks",
        session.depth(),
        session.current_tick()
    );
    Ok(())
}
