use std::{sync::Arc, time::Duration};

use anyhow::Result;
use app::{config::Config, persistence::MemoryResultStore, state::AppState};
use models::schemas::contestant::Contestant;
use tracing::info;

pub mod demo;

/// Longest a demo match may run before it is called off.
const DEMO_MATCH_LIMIT: Duration = Duration::from_secs(300);

/// Boots the engine with an in-memory result store and plays one headless
/// match between two bots: one tracks the ball, the other never moves.
pub async fn run() -> Result<()> {
    let config = Config::from_env()?;
    info!(
        "Engine configured: countdown {:?}, tick {:?}, retention {:?}, first to {}",
        config.countdown, config.tick_period, config.retention, config.winning_score
    );

    let state = AppState::new(config, Arc::new(MemoryResultStore::new()));

    let tracker = Contestant::new(1, "tracker");
    let statue = Contestant::new(2, "statue");
    let winner = demo::play_match(&state, tracker.clone(), statue.clone(), DEMO_MATCH_LIMIT).await?;
    info!("Demo match over. Winner: {}", winner.as_deref().unwrap_or("none"));

    for contestant in [&tracker, &statue] {
        let history = state.games.match_history(contestant.id)?;
        info!(
            "{} has {} recorded result(s)",
            contestant.display_name,
            history.results.len()
        );
    }

    Ok(())
}
