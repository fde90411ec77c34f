use std::time::Duration;

use anyhow::{Result, bail};
use app::state::AppState;
use models::schemas::{
    contestant::Contestant,
    game::{LivePhase, MatchSnapshot, QueueStatus},
};
use tracing::{debug, warn};

/// Dead zone around the paddle center inside which the bot stops.
const TRACKING_SLACK: f64 = 2.0;

/// Queues both contestants, then steers `tracker`'s paddle towards the ball
/// by polling snapshots once per tick until the match finishes. Returns the
/// winner's display name.
pub async fn play_match(
    state: &AppState,
    tracker: Contestant,
    idle: Contestant,
    limit: Duration,
) -> Result<Option<String>> {
    let tracker_id = tracker.id;
    state.games.enqueue(tracker);
    state.games.enqueue(idle);

    let match_id = match state.games.status(tracker_id) {
        QueueStatus::Starting { match_id, .. } | QueueStatus::Running { match_id } => match_id,
        other => bail!("contestants were not paired: {:?}", other),
    };
    debug!(match_id = %match_id, "Demo match paired");

    let poll = state.config.tick_period;
    let played = tokio::time::timeout(limit, async {
        loop {
            tokio::time::sleep(poll).await;
            match state.games.snapshot(&match_id) {
                Some(MatchSnapshot::Live(live)) if live.status == LivePhase::Running => {
                    let paddle = if live.players.left.user_id == tracker_id {
                        live.players.left.y
                    } else {
                        live.players.right.y
                    };
                    let direction = if live.ball.y < paddle - TRACKING_SLACK {
                        "UP"
                    } else if live.ball.y > paddle + TRACKING_SLACK {
                        "DOWN"
                    } else {
                        "STOP"
                    };
                    // A move can race the final tick; the next poll sees the finish.
                    if let Err(err) = state.games.apply_move(tracker_id, direction) {
                        debug!(match_id = %match_id, code = err.code(), "Demo move rejected: {}", err);
                    }
                }
                Some(MatchSnapshot::Live(_)) => {}
                Some(MatchSnapshot::Finished(finished)) => return finished.winner,
                None => return None,
            }
        }
    })
    .await;

    match played {
        Ok(winner) => Ok(winner),
        Err(_) => {
            warn!(match_id = %match_id, "Demo match ran too long, calling it off");
            if let Some(session) = state.games.session(&match_id) {
                session.force_finish();
            }
            Ok(None)
        }
    }
}
