use std::sync::{Mutex, PoisonError};

use anyhow::Result;
use chrono::Utc;
use models::schemas::history::MatchResult;

/// Where decided matches are written. The engine only ever appends; reads
/// serve the match-history feature.
pub trait ResultStore: Send + Sync {
    fn record(&self, winner_id: i64, loser_id: i64) -> Result<()>;

    /// Most recent results involving `contestant_id`, newest first.
    fn recent_for(&self, contestant_id: i64, limit: usize) -> Result<Vec<MatchResult>>;
}

#[derive(Default)]
pub struct MemoryResultStore {
    rows: Mutex<Vec<MatchResult>>,
}

impl MemoryResultStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ResultStore for MemoryResultStore {
    fn record(&self, winner_id: i64, loser_id: i64) -> Result<()> {
        let mut rows = self.rows.lock().unwrap_or_else(PoisonError::into_inner);
        rows.push(MatchResult {
            winner_id,
            loser_id,
            played_at: Utc::now(),
        });
        Ok(())
    }

    fn recent_for(&self, contestant_id: i64, limit: usize) -> Result<Vec<MatchResult>> {
        let rows = self.rows.lock().unwrap_or_else(PoisonError::into_inner);
        // Rows are appended in play order, so walking backwards is newest first.
        Ok(rows
            .iter()
            .rev()
            .filter(|r| r.winner_id == contestant_id || r.loser_id == contestant_id)
            .take(limit)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_is_newest_first_and_limited() {
        let store = MemoryResultStore::new();
        store.record(1, 2).unwrap();
        store.record(3, 1).unwrap();
        store.record(4, 5).unwrap();
        store.record(1, 6).unwrap();

        let history = store.recent_for(1, 2).unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!((history[0].winner_id, history[0].loser_id), (1, 6));
        assert_eq!((history[1].winner_id, history[1].loser_id), (3, 1));

        assert!(store.recent_for(7, 20).unwrap().is_empty());
        assert_eq!(store.len(), 4);
    }
}
