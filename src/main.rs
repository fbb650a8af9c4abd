//! Flappy Gates headless runner
//!
//! Plays a number of sessions with the idle pilot, records them in the stats
//! file and prints the lifetime totals.
//!
//! Usage: `flappy-gates [settings.json]`

use std::path::PathBuf;

use anyhow::Context;
use chrono::Utc;

use flappy_gates::sim::{GameSession, SessionState, TickInput};
use flappy_gates::{JsonFileStore, Settings, Tuning};

const DEFAULT_SETTINGS_PATH: &str = "flappy_gates_settings.json";

fn main() -> anyhow::Result<()> {
    env_logger::init();
    log::info!("Flappy Gates (headless) starting...");

    let settings_path = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_PATH));
    let settings = Settings::load(&settings_path);

    let tuning = settings
        .tuning_path
        .as_deref()
        .map(Tuning::load)
        .unwrap_or_default();
    tuning.validate().context("built-in tuning is invalid")?;

    let store = JsonFileStore::open(&settings.stats_path)
        .with_context(|| format!("opening stats at {}", settings.stats_path.display()))?;

    let seed = settings
        .seed
        .unwrap_or_else(|| Utc::now().timestamp_millis().unsigned_abs());
    log::info!("Seed: {}", seed);

    let mut session = GameSession::new(tuning, seed).with_store(Box::new(store));
    if !settings.pickups_enabled {
        session = session.without_pickups();
    }
    session.subscribe(|event| log::debug!("{:?}", event));

    if !settings.autopilot {
        log::warn!("Autopilot disabled and no input attached; the flyer will just fall");
    }
    let input = TickInput {
        lift: false,
        autopilot: settings.autopilot,
    };

    for round in 0..settings.sessions {
        if round == 0 {
            session.start_game();
        } else {
            session.restart_game();
        }

        let start_frame = session.frame();
        while session.state() != SessionState::GameOver || session.has_pending_start() {
            session.advance(&input, settings.frame_dt);
            if session.frame() - start_frame >= settings.max_frames {
                log::info!("Frame cap reached, ending session");
                session.end_game();
                break;
            }
        }

        println!(
            "Session {}: score {}, coins {}, level {}",
            round + 1,
            session.score(),
            session.coins_collected(),
            session.difficulty_level()
        );
    }

    if let Some(stats) = session.statistics() {
        println!();
        println!("High score:      {}", stats.high_score);
        println!("Games played:    {}", stats.total_games_played);
        println!("Average score:   {}", stats.average_score);
        println!("Obstacles total: {}", stats.total_obstacles_passed);
        println!("Coins total:     {}", stats.total_coins_collected);
    }
    for record in session.recent_sessions(flappy_gates::stats::DEFAULT_RECENT_LIMIT) {
        println!(
            "  #{:<4} {}  score {:>3}  {:.1}s",
            record.id,
            record.played_at.format("%Y-%m-%d %H:%M:%S"),
            record.score,
            record.duration_secs
        );
    }

    Ok(())
}
