use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use models::schemas::{
    contestant::Contestant,
    game::MatchSnapshot,
    tournament::{
        NoTournament, TournamentMatchView, TournamentStatus, TournamentStatusSchema,
        TournamentView,
    },
};
use tracing::{error, info, warn};

use crate::{
    config::Config,
    core::{
        bracket::Tournament,
        session::{MatchOutcome, MatchSession},
    },
    error::{MoveError, TournamentError},
    persistence::ResultStore,
};

struct TournamentMatch {
    stage: TournamentStatus,
    session: MatchSession,
}

#[derive(Default)]
struct TournamentState {
    active: Option<Tournament>,
    // Kept beside the bracket rather than inside it.
    current: Option<TournamentMatch>,
    previous_winner: Option<String>,
}

impl TournamentState {
    fn view(&self) -> TournamentStatusSchema {
        let Some(tournament) = &self.active else {
            return TournamentStatusSchema::NoTournament(NoTournament::default());
        };

        let current_match = self.current.as_ref().and_then(|m| {
            let match_type = m.stage.match_type()?;
            match m.session.snapshot() {
                MatchSnapshot::Live(live) => Some(TournamentMatchView { match_type, live }),
                MatchSnapshot::Finished(_) => None,
            }
        });

        TournamentStatusSchema::Active(TournamentView {
            bracket: tournament.view(),
            current_match,
        })
    }
}

struct TournamentServiceInner {
    config: Config,
    store: Arc<dyn ResultStore>,
    state: Mutex<TournamentState>,
}

impl TournamentServiceInner {
    fn lock(&self) -> MutexGuard<'_, TournamentState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Runs at most one knockout at a time, playing its three matches back to
/// back on the same engine the queue uses.
#[derive(Clone)]
pub struct TournamentService {
    inner: Arc<TournamentServiceInner>,
}

impl TournamentService {
    pub fn new(config: Config, store: Arc<dyn ResultStore>) -> Self {
        Self {
            inner: Arc::new(TournamentServiceInner {
                config,
                store,
                state: Mutex::new(TournamentState::default()),
            }),
        }
    }

    pub fn create(&self, creator: Contestant) -> Result<TournamentView, TournamentError> {
        let mut state = self.inner.lock();

        if state.active.as_ref().is_some_and(|t| !t.is_complete()) {
            return Err(TournamentError::AlreadyActive);
        }

        info!(contestant_id = creator.id, "{} created a tournament", creator.display_name);
        let tournament = Tournament::new(creator, state.previous_winner.clone());
        let view = TournamentView {
            bracket: tournament.view(),
            current_match: None,
        };
        state.active = Some(tournament);
        state.current = None;
        Ok(view)
    }

    pub fn join(&self, contestant: Contestant) -> Result<TournamentView, TournamentError> {
        let mut state = self.inner.lock();
        let tournament = state
            .active
            .as_mut()
            .ok_or(TournamentError::NoActiveTournament)?;

        if !tournament.contains(contestant.id) {
            let (id, name) = (contestant.id, contestant.display_name.clone());
            tournament.join(contestant)?;
            info!(contestant_id = id, "{} joined the tournament", name);

            if tournament.status() == TournamentStatus::Semifinal1 {
                start_next_match(&self.inner, &mut state);
            }
        }

        match state.view() {
            TournamentStatusSchema::Active(view) => Ok(view),
            TournamentStatusSchema::NoTournament(_) => Err(TournamentError::NoActiveTournament),
        }
    }

    pub fn status(&self) -> TournamentStatusSchema {
        self.inner.lock().view()
    }

    pub fn apply_move(&self, contestant_id: i64, direction: &str) -> Result<(), MoveError> {
        let session = self
            .current_session()
            .ok_or(MoveError::NoActiveMatch)?;
        session
            .apply_move(contestant_id, direction)
            .map_err(|err| match err {
                // The stage just ended and the next one is not seated yet.
                MoveError::NoMatch => MoveError::NoActiveMatch,
                other => other,
            })
    }

    /// Handle to the match being played, for administrative overrides.
    pub fn current_session(&self) -> Option<MatchSession> {
        self.inner
            .lock()
            .current
            .as_ref()
            .map(|m| m.session.clone())
    }
}

fn start_next_match(inner: &Arc<TournamentServiceInner>, state: &mut TournamentState) {
    if state.current.is_some() {
        return;
    }
    let Some(tournament) = &state.active else {
        return;
    };
    let stage = tournament.status();
    let Some((left, right)) = tournament.current_pairing() else {
        error!(?stage, "No pairing available for the current stage");
        return;
    };
    let (left, right) = (left.clone(), right.clone());

    info!(
        "Tournament {} created: {} vs {}",
        stage.match_type().unwrap_or("match"),
        left.display_name,
        right.display_name
    );

    let weak = Arc::downgrade(inner);
    let session = MatchSession::start(
        left,
        right,
        &inner.config,
        inner.store.clone(),
        move |outcome| on_match_finished(weak, outcome),
    );
    state.current = Some(TournamentMatch { stage, session });
}

fn on_match_finished(weak: Weak<TournamentServiceInner>, outcome: MatchOutcome) {
    let Some(inner) = weak.upgrade() else {
        return;
    };
    let mut state = inner.lock();

    let is_current = state
        .current
        .as_ref()
        .is_some_and(|m| m.session.id() == outcome.match_id);
    if !is_current {
        warn!(match_id = %outcome.match_id, "Ignoring result of a superseded tournament match");
        return;
    }
    state.current = None;

    // A tie can only come from an override; the left contestant goes through.
    let winner = outcome.winner.as_ref().unwrap_or(&outcome.left);

    let Some(tournament) = state.active.as_mut() else {
        return;
    };
    if !tournament.record_winner(winner.id) {
        error!(
            match_id = %outcome.match_id,
            "Winner {} does not belong to the current stage", winner.display_name
        );
        return;
    }

    if let Some(champion) = tournament.champion() {
        let name = champion.display_name.clone();
        tournament.set_previous_winner(name.clone());
        info!("Tournament complete! Winner: {}", name);
        state.previous_winner = Some(name);
        return;
    }

    info!(stage = ?tournament.status(), "Tournament advanced");
    start_next_match(&inner, &mut state);
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tokio::time::sleep;

    use super::*;
    use crate::{core::session::Phase, persistence::MemoryResultStore};

    #[tokio::test(start_paused = true)]
    async fn ended_stage_awaiting_release_has_no_active_match() {
        let config = Config::default();
        let service = TournamentService::new(config.clone(), Arc::new(MemoryResultStore::new()));

        // Nothing releases this session, so it stays current after it ends.
        let session = MatchSession::start(
            Contestant::new(1, "a"),
            Contestant::new(2, "b"),
            &config,
            service.inner.store.clone(),
            |_| {},
        );
        service.inner.lock().current = Some(TournamentMatch {
            stage: TournamentStatus::Semifinal1,
            session: session.clone(),
        });

        sleep(config.countdown + Duration::from_millis(1)).await;
        assert_eq!(service.apply_move(1, "UP"), Ok(()));

        session.force_finish();
        sleep(config.tick_period * 2).await;
        assert_eq!(session.phase(), Phase::Finished);
        assert!(service.current_session().is_some());
        assert_eq!(service.apply_move(1, "UP"), Err(MoveError::NoActiveMatch));
        assert_eq!(service.apply_move(3, "UP"), Err(MoveError::NoActiveMatch));
    }
}
