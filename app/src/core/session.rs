use std::{
    ops::ControlFlow,
    sync::{
        Arc, Mutex, MutexGuard, PoisonError,
        atomic::{AtomicU64, Ordering},
    },
};

use models::schemas::{
    contestant::Contestant,
    game::{
        BallView, Direction, FinishedMatch, LiveMatch, LivePhase, MatchSnapshot, PaddleView,
        PlayersView, QueueStatus, ScoreView,
    },
};
use tracing::{debug, error, info};

use crate::{
    config::Config,
    core::simulation::{Paddle, Side, Simulation},
    error::MoveError,
    persistence::ResultStore,
    scheduler,
};

static NEXT_SEQUENCE: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Starting,
    Running,
    Finished,
}

/// What the owner of a session learns once it has finished.
#[derive(Debug, Clone)]
pub struct MatchOutcome {
    pub match_id: String,
    pub left: Contestant,
    pub right: Contestant,
    pub left_score: u32,
    pub right_score: u32,
    /// Strictly higher scorer, `None` on a tie.
    pub winner: Option<Contestant>,
}

impl MatchOutcome {
    pub fn winner_name(&self) -> Option<String> {
        self.winner.as_ref().map(|w| w.display_name.clone())
    }

    fn seated(&self, side: Side) -> &Contestant {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }
}

struct SessionState {
    phase: Phase,
    simulation: Simulation,
    winner: Option<Contestant>,
}

struct SessionInner {
    id: String,
    sequence: u64,
    left: Contestant,
    right: Contestant,
    state: Mutex<SessionState>,
}

impl SessionInner {
    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn contestant(&self, side: Side) -> &Contestant {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    fn side_of(&self, contestant_id: i64) -> Option<Side> {
        if contestant_id == self.left.id {
            Some(Side::Left)
        } else if contestant_id == self.right.id {
            Some(Side::Right)
        } else {
            None
        }
    }

    /// Runs one tick. Returns the outcome, plus the side that won on points
    /// if the result should be stored, on the tick the match finishes.
    fn tick(&self) -> Option<(MatchOutcome, Option<Side>)> {
        let mut state = self.lock();
        if state.phase != Phase::Running || !state.simulation.step() {
            return None;
        }

        state.phase = Phase::Finished;
        let (left_score, right_score) = state.simulation.scores();
        let winner = state
            .simulation
            .leader()
            .map(|side| self.contestant(side).clone());
        state.winner = winner.clone();

        let outcome = MatchOutcome {
            match_id: self.id.clone(),
            left: self.left.clone(),
            right: self.right.clone(),
            left_score,
            right_score,
            winner,
        };
        Some((outcome, state.simulation.decided_by()))
    }
}

/// One contest between two contestants, driven by its own countdown and
/// tick timers. Clones are handles to the same session; once every handle is
/// dropped the pending timers find nothing to do and stop.
#[derive(Clone)]
pub struct MatchSession {
    inner: Arc<SessionInner>,
}

impl MatchSession {
    /// Creates the session in `Starting` and schedules its countdown.
    /// `on_finish` runs exactly once, after the tick that ends the match.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start<F>(
        left: Contestant,
        right: Contestant,
        config: &Config,
        store: Arc<dyn ResultStore>,
        on_finish: F,
    ) -> Self
    where
        F: FnOnce(MatchOutcome) + Send + 'static,
    {
        let inner = Arc::new(SessionInner {
            id: uuid::Uuid::new_v4().to_string(),
            sequence: NEXT_SEQUENCE.fetch_add(1, Ordering::Relaxed),
            left,
            right,
            state: Mutex::new(SessionState {
                phase: Phase::Starting,
                simulation: Simulation::new(config.winning_score),
                winner: None,
            }),
        });

        info!(
            match_id = %inner.id,
            "Match created: {} vs {}. Starting in {:?}",
            inner.left.display_name,
            inner.right.display_name,
            config.countdown
        );

        let weak = Arc::downgrade(&inner);
        let tick_period = config.tick_period;
        scheduler::schedule_after(config.countdown, async move {
            let Some(session) = weak.upgrade() else {
                debug!("Countdown elapsed for a match that no longer exists");
                return;
            };
            session.lock().phase = Phase::Running;
            info!(match_id = %session.id, "Match started");
            drop(session);

            let mut finished = None;
            scheduler::repeat_every(tick_period, || {
                let Some(session) = weak.upgrade() else {
                    return ControlFlow::Break(());
                };
                match session.tick() {
                    Some(result) => {
                        finished = Some(result);
                        ControlFlow::Break(())
                    }
                    None => ControlFlow::Continue(()),
                }
            })
            .await;

            let Some((outcome, decided_by)) = finished else {
                return;
            };

            info!(
                match_id = %outcome.match_id,
                "Match finished {}-{}. Winner: {}",
                outcome.left_score,
                outcome.right_score,
                outcome.winner_name().as_deref().unwrap_or("none")
            );

            if let Some(side) = decided_by {
                let (winner, loser) = (outcome.seated(side), outcome.seated(side.opponent()));
                match store.record(winner.id, loser.id) {
                    Ok(()) => debug!(match_id = %outcome.match_id, "Result stored"),
                    Err(err) => {
                        error!(match_id = %outcome.match_id, "Failed to store result: {}", err)
                    }
                }
            }

            on_finish(outcome);
        });

        Self { inner }
    }

    pub fn id(&self) -> &str {
        &self.inner.id
    }

    /// Creation order across all sessions of the process.
    pub fn sequence(&self) -> u64 {
        self.inner.sequence
    }

    pub fn left(&self) -> &Contestant {
        &self.inner.left
    }

    pub fn right(&self) -> &Contestant {
        &self.inner.right
    }

    pub fn phase(&self) -> Phase {
        self.inner.lock().phase
    }

    /// Latest intent wins; each call overwrites the paddle's direction.
    pub fn apply_move(&self, contestant_id: i64, direction: &str) -> Result<(), MoveError> {
        let mut state = self.inner.lock();
        match state.phase {
            Phase::Starting => return Err(MoveError::NotStarted),
            Phase::Finished => return Err(MoveError::NoMatch),
            Phase::Running => {}
        }

        let side = self
            .inner
            .side_of(contestant_id)
            .ok_or(MoveError::NotInMatch)?;
        let direction: Direction = direction.parse().map_err(|_| MoveError::InvalidDirection)?;

        state.simulation.set_direction(side, direction);
        Ok(())
    }

    /// Credits a point to `contestant_id` outside of play. The finish, if
    /// this reaches the winning score, is picked up by the next tick.
    /// Returns false when the contestant is not in this match.
    pub fn award_point(&self, contestant_id: i64) -> bool {
        let Some(side) = self.inner.side_of(contestant_id) else {
            return false;
        };
        self.inner.lock().simulation.award_point(side);
        true
    }

    /// Ends the match on the next tick with the scores as they stand.
    pub fn force_finish(&self) {
        self.inner.lock().simulation.force_finish();
    }

    pub fn scores(&self) -> (u32, u32) {
        self.inner.lock().simulation.scores()
    }

    pub fn queue_status(&self) -> QueueStatus {
        let state = self.inner.lock();
        let match_id = self.inner.id.clone();
        match state.phase {
            Phase::Starting => QueueStatus::Starting {
                match_id,
                left_player: self.inner.left.display_name.clone(),
                right_player: self.inner.right.display_name.clone(),
            },
            Phase::Running => QueueStatus::Running { match_id },
            Phase::Finished => QueueStatus::Finished {
                match_id,
                winner: state.winner.as_ref().map(|w| w.display_name.clone()),
            },
        }
    }

    pub fn snapshot(&self) -> MatchSnapshot {
        let state = self.inner.lock();
        let status = match state.phase {
            Phase::Starting => LivePhase::Starting,
            Phase::Running => LivePhase::Running,
            Phase::Finished => {
                return MatchSnapshot::Finished(FinishedMatch::new(
                    self.inner.id.clone(),
                    state.winner.as_ref().map(|w| w.display_name.clone()),
                ));
            }
        };

        let sim = &state.simulation;
        let (left_score, right_score) = sim.scores();
        MatchSnapshot::Live(LiveMatch {
            status,
            match_id: self.inner.id.clone(),
            players: PlayersView {
                left: paddle_view(&self.inner.left, sim.left()),
                right: paddle_view(&self.inner.right, sim.right()),
            },
            ball: BallView {
                x: sim.ball().x,
                y: sim.ball().y,
            },
            score: ScoreView {
                left: left_score,
                right: right_score,
            },
        })
    }
}

fn paddle_view(contestant: &Contestant, paddle: &Paddle) -> PaddleView {
    PaddleView {
        user_id: contestant.id,
        username: contestant.display_name.clone(),
        y: paddle.y(),
    }
}
