use std::{
    collections::{HashMap, VecDeque},
    sync::{Arc, Mutex, MutexGuard, PoisonError, Weak},
};

use anyhow::Result;
use models::schemas::{
    contestant::Contestant,
    game::{ActiveMatch, ActiveMatchList, FinishedMatch, MatchSnapshot, QueueStatus},
    history::MatchHistorySchema,
};
use tracing::{debug, info, warn};

use crate::{
    cache::Cache,
    config::Config,
    core::session::{MatchOutcome, MatchSession, Phase},
    error::MoveError,
    persistence::ResultStore,
    scheduler,
};

#[derive(Clone, Debug)]
struct FinishedEntry {
    match_id: String,
    winner: Option<String>,
}

#[derive(Default)]
struct Lobby {
    waiting: VecDeque<Contestant>,
    player_to_match: HashMap<i64, String>,
}

struct GameServiceInner {
    config: Config,
    store: Arc<dyn ResultStore>,
    // Lock order: lobby, then the caches, then a session.
    lobby: Mutex<Lobby>,
    matches: Cache<String, MatchSession>,
    finished_matches: Cache<String, FinishedMatch>,
    finished_players: Cache<i64, FinishedEntry>,
}

impl GameServiceInner {
    fn lock_lobby(&self) -> MutexGuard<'_, Lobby> {
        self.lobby.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// FIFO matchmaking plus the registry of the sessions it created.
#[derive(Clone)]
pub struct GameService {
    inner: Arc<GameServiceInner>,
}

impl GameService {
    pub fn new(config: Config, store: Arc<dyn ResultStore>) -> Self {
        Self {
            inner: Arc::new(GameServiceInner {
                config,
                store,
                lobby: Mutex::new(Lobby::default()),
                matches: Cache::new(),
                finished_matches: Cache::new(),
                finished_players: Cache::new(),
            }),
        }
    }

    /// Queues `contestant` unless they are already queued or playing, then
    /// pairs the queue two at a time in arrival order.
    pub fn enqueue(&self, contestant: Contestant) {
        let mut lobby = self.inner.lock_lobby();

        if lobby.player_to_match.contains_key(&contestant.id) {
            debug!(contestant_id = contestant.id, "Already in a match, not queueing");
            return;
        }

        if !lobby.waiting.iter().any(|c| c.id == contestant.id) {
            info!(contestant_id = contestant.id, "{} joined the queue", contestant.display_name);
            lobby.waiting.push_back(contestant);
        }

        self.try_start_matches(&mut lobby);
    }

    fn try_start_matches(&self, lobby: &mut Lobby) {
        while lobby.waiting.len() >= 2 {
            let (Some(left), Some(right)) = (lobby.waiting.pop_front(), lobby.waiting.pop_front())
            else {
                break;
            };

            let weak = Arc::downgrade(&self.inner);
            let session = MatchSession::start(
                left,
                right,
                &self.inner.config,
                self.inner.store.clone(),
                move |outcome| on_match_finished(weak, outcome),
            );

            let match_id = session.id().to_owned();
            lobby
                .player_to_match
                .insert(session.left().id, match_id.clone());
            lobby
                .player_to_match
                .insert(session.right().id, match_id.clone());
            self.inner.matches.set_data(match_id, session);
        }
    }

    /// Active match first, then the queue, then a recently finished match.
    pub fn status(&self, contestant_id: i64) -> QueueStatus {
        let lobby = self.inner.lock_lobby();

        if let Some(match_id) = lobby.player_to_match.get(&contestant_id) {
            if let Some(status) = self
                .inner
                .matches
                .read_data(match_id.as_str(), MatchSession::queue_status)
            {
                return status;
            }
            warn!(contestant_id, match_id = %match_id, "Contestant mapped to a missing match");
        }

        if lobby.waiting.iter().any(|c| c.id == contestant_id) {
            return QueueStatus::Waiting;
        }

        self.inner
            .finished_players
            .read_data(&contestant_id, |finished| QueueStatus::Finished {
                match_id: finished.match_id.clone(),
                winner: finished.winner.clone(),
            })
            .unwrap_or(QueueStatus::Idle)
    }

    pub fn apply_move(&self, contestant_id: i64, direction: &str) -> Result<(), MoveError> {
        let session = {
            let lobby = self.inner.lock_lobby();
            let match_id = lobby
                .player_to_match
                .get(&contestant_id)
                .ok_or(MoveError::NoMatch)?;
            self.inner
                .matches
                .get_data(match_id.as_str())
                .ok_or(MoveError::NoMatch)?
        };

        session.apply_move(contestant_id, direction)
    }

    pub fn snapshot(&self, match_id: &str) -> Option<MatchSnapshot> {
        if let Some(session) = self.inner.matches.get_data(match_id) {
            return Some(session.snapshot());
        }
        self.inner
            .finished_matches
            .get_data(match_id)
            .map(MatchSnapshot::Finished)
    }

    /// Live sessions in the order they were paired.
    pub fn list_active_sessions(&self) -> ActiveMatchList {
        let mut sessions = self.inner.matches.values();
        sessions.sort_by_key(MatchSession::sequence);

        ActiveMatchList {
            match_ids: sessions
                .iter()
                .map(|s| ActiveMatch {
                    match_id: s.id().to_owned(),
                    left: s.left().display_name.clone(),
                    right: s.right().display_name.clone(),
                    started: s.phase() != Phase::Starting,
                })
                .collect(),
        }
    }

    /// Handle to a live session, for administrative overrides.
    pub fn session(&self, match_id: &str) -> Option<MatchSession> {
        self.inner.matches.get_data(match_id)
    }

    pub fn waiting(&self) -> Vec<Contestant> {
        self.inner.lock_lobby().waiting.iter().cloned().collect()
    }

    pub fn match_history(&self, contestant_id: i64) -> Result<MatchHistorySchema> {
        let results = self
            .inner
            .store
            .recent_for(contestant_id, self.inner.config.history_limit)?;
        Ok(MatchHistorySchema {
            contestant_id,
            results,
        })
    }
}

fn on_match_finished(weak: Weak<GameServiceInner>, outcome: MatchOutcome) {
    let Some(inner) = weak.upgrade() else {
        return;
    };

    let match_id = outcome.match_id.clone();
    let winner = outcome.winner_name();
    {
        let mut lobby = inner.lock_lobby();
        for contestant in [&outcome.left, &outcome.right] {
            if lobby.player_to_match.get(&contestant.id) == Some(&match_id) {
                lobby.player_to_match.remove(&contestant.id);
            }
            inner.finished_players.set_data(
                contestant.id,
                FinishedEntry {
                    match_id: match_id.clone(),
                    winner: winner.clone(),
                },
            );
        }
        inner.finished_matches.set_data(
            match_id.clone(),
            FinishedMatch::new(match_id.clone(), winner),
        );
        inner.matches.delete_data(match_id.as_str());
    }

    let retention = inner.config.retention;
    let weak = Arc::downgrade(&inner);
    scheduler::schedule_after(retention, async move {
        let Some(inner) = weak.upgrade() else {
            return;
        };

        for contestant in [&outcome.left, &outcome.right] {
            // A contestant may already have finished a newer match.
            inner
                .finished_players
                .delete_if(&contestant.id, |f| f.match_id == outcome.match_id);
        }
        inner
            .finished_matches
            .delete_data(outcome.match_id.as_str());
        info!(match_id = %outcome.match_id, "Finished match purged");
    });
}
