//! Rampart headless runtime
//!
//! Plays a number of enemy waves against the default building layout at a
//! fixed tick, with a minimal physics stand-in generating the contacts the
//! engine would, and prints a summary per wave.
//!
//! Run with: cargo run -p rampart_runtime -- 10
//!       or: RAMPART_CONFIG=rampart.toml cargo run --bin rampart

mod physics;
mod run_config;
mod session;

use run_config::RunConfig;
use session::Session;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = RunConfig::load()?;
    config.print_summary();

    let mut session = Session::new(config.gameplay.clone(), config.run.clone())?;
    session.start()?;

    let mut played = 0;
    while played < config.run.waves {
        let summary = session.play_wave()?;
        println!("{}", summary);
        played += 1;

        if session.game().is_game_over() {
            println!("Game over after {} wave(s)", played);
            break;
        }
        if !summary.survived {
            break;
        }
        if played < config.run.waves && !session.next_wave() {
            log::warn!("Could not start wave {}", played);
            break;
        }
    }

    let game = session.game();
    println!(
        "Finished: {} wave(s), {} building(s) standing, funds {}",
        played,
        game.buildings().standing_count(),
        game.economy().funds()
    );
    Ok(())
}
