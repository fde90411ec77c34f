use models::schemas::{
    contestant::Contestant,
    tournament::{BracketView, StageView, TournamentStatus},
};

use crate::error::TournamentError;

pub const DEFAULT_PREVIOUS_WINNER: &str = "Chuck Norris";

/// Bookkeeping for one four-contestant knockout. Holds no match state.
#[derive(Debug, Clone)]
pub struct Tournament {
    status: TournamentStatus,
    slots: [Option<Contestant>; 4],
    semifinal1_winner: Option<Contestant>,
    semifinal2_winner: Option<Contestant>,
    final_winner: Option<Contestant>,
    previous_winner: String,
}

impl Tournament {
    pub fn new(creator: Contestant, previous_winner: Option<String>) -> Self {
        Self {
            status: TournamentStatus::Waiting,
            slots: [Some(creator), None, None, None],
            semifinal1_winner: None,
            semifinal2_winner: None,
            final_winner: None,
            previous_winner: previous_winner.unwrap_or_else(|| DEFAULT_PREVIOUS_WINNER.to_owned()),
        }
    }

    pub fn status(&self) -> TournamentStatus {
        self.status
    }

    pub fn is_complete(&self) -> bool {
        self.status == TournamentStatus::Completed
    }

    pub fn is_full(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    pub fn contains(&self, contestant_id: i64) -> bool {
        self.slots.iter().flatten().any(|c| c.id == contestant_id)
    }

    pub fn players(&self) -> Vec<Contestant> {
        self.slots.iter().flatten().cloned().collect()
    }

    pub fn previous_winner(&self) -> &str {
        &self.previous_winner
    }

    pub fn set_previous_winner(&mut self, name: String) {
        self.previous_winner = name;
    }

    /// Takes the next free slot. Filling the last one starts semifinal 1.
    pub fn join(&mut self, contestant: Contestant) -> Result<(), TournamentError> {
        if self.status != TournamentStatus::Waiting {
            return Err(TournamentError::NotWaiting);
        }
        if self.contains(contestant.id) {
            return Ok(());
        }

        let Some(slot) = self.slots.iter_mut().find(|s| s.is_none()) else {
            return Err(TournamentError::NotWaiting);
        };
        *slot = Some(contestant);

        if self.is_full() {
            self.status = TournamentStatus::Semifinal1;
        }
        Ok(())
    }

    /// The two contestants who should be playing in the current stage.
    pub fn current_pairing(&self) -> Option<(&Contestant, &Contestant)> {
        let (left, right) = match self.status {
            TournamentStatus::Semifinal1 => (&self.slots[0], &self.slots[1]),
            TournamentStatus::Semifinal2 => (&self.slots[2], &self.slots[3]),
            TournamentStatus::Final => (&self.semifinal1_winner, &self.semifinal2_winner),
            TournamentStatus::Waiting | TournamentStatus::Completed => return None,
        };
        Some((left.as_ref()?, right.as_ref()?))
    }

    /// Records the winner of the current stage and moves to the next one.
    /// Returns false, leaving the bracket untouched, when no stage is being
    /// played or `winner_id` is not one of its two contestants.
    pub fn record_winner(&mut self, winner_id: i64) -> bool {
        let Some(winner) = self
            .current_pairing()
            .and_then(|(l, r)| [l, r].into_iter().find(|c| c.id == winner_id))
            .cloned()
        else {
            return false;
        };

        match self.status {
            TournamentStatus::Semifinal1 => {
                self.semifinal1_winner = Some(winner);
                self.status = TournamentStatus::Semifinal2;
            }
            TournamentStatus::Semifinal2 => {
                self.semifinal2_winner = Some(winner);
                self.status = TournamentStatus::Final;
            }
            TournamentStatus::Final => {
                self.final_winner = Some(winner);
                self.status = TournamentStatus::Completed;
            }
            TournamentStatus::Waiting | TournamentStatus::Completed => return false,
        }
        true
    }

    pub fn champion(&self) -> Option<&Contestant> {
        if self.is_complete() {
            self.final_winner.as_ref()
        } else {
            None
        }
    }

    pub fn view(&self) -> BracketView {
        BracketView {
            status: self.status,
            previous_winner: self.previous_winner.clone(),
            players: self.players(),
            semifinal1: StageView {
                player1: self.slots[0].clone(),
                player2: self.slots[1].clone(),
                winner: self.semifinal1_winner.clone(),
            },
            semifinal2: StageView {
                player1: self.slots[2].clone(),
                player2: self.slots[3].clone(),
                winner: self.semifinal2_winner.clone(),
            },
            final_match: StageView {
                player1: self.semifinal1_winner.clone(),
                player2: self.semifinal2_winner.clone(),
                winner: self.final_winner.clone(),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn player(id: i64, name: &str) -> Contestant {
        Contestant::new(id, name)
    }

    fn full_bracket() -> Tournament {
        let mut t = Tournament::new(player(1, "arne"), None);
        t.join(player(2, "daniel")).unwrap();
        t.join(player(3, "paula")).unwrap();
        t.join(player(4, "johannes")).unwrap();
        t
    }

    fn names(pair: Option<(&Contestant, &Contestant)>) -> Option<(String, String)> {
        pair.map(|(l, r)| (l.display_name.clone(), r.display_name.clone()))
    }

    #[test]
    fn starts_waiting_with_the_creator() {
        let t = Tournament::new(player(1, "arne"), None);
        assert_eq!(t.status(), TournamentStatus::Waiting);
        assert_eq!(t.previous_winner(), "Chuck Norris");
        assert_eq!(t.players(), vec![player(1, "arne")]);
        assert!(!t.is_full());
        assert!(t.current_pairing().is_none());

        let view = t.view();
        assert_eq!(view.semifinal1.player1, Some(player(1, "arne")));
        assert_eq!(view.semifinal1.player2, None);
        assert_eq!(view.semifinal1.winner, None);
    }

    #[test]
    fn carries_the_previous_winner() {
        let t = Tournament::new(player(1, "arne"), Some("paula".into()));
        assert_eq!(t.previous_winner(), "paula");
    }

    #[test]
    fn fourth_join_starts_semifinal_one() {
        let mut t = Tournament::new(player(1, "arne"), None);
        t.join(player(2, "daniel")).unwrap();
        t.join(player(3, "paula")).unwrap();
        assert_eq!(t.status(), TournamentStatus::Waiting);
        t.join(player(4, "johannes")).unwrap();
        assert_eq!(t.status(), TournamentStatus::Semifinal1);
        assert!(t.is_full());
        assert_eq!(t.join(player(5, "late")), Err(TournamentError::NotWaiting));
        assert_eq!(t.players().len(), 4);
    }

    #[test]
    fn joining_twice_keeps_one_slot() {
        let mut t = Tournament::new(player(1, "arne"), None);
        t.join(player(2, "daniel")).unwrap();
        t.join(player(2, "daniel")).unwrap();
        assert_eq!(t.players().len(), 2);
    }

    #[test]
    fn stages_advance_in_order() {
        let mut t = full_bracket();
        assert_eq!(
            names(t.current_pairing()),
            Some(("arne".into(), "daniel".into()))
        );

        assert!(t.record_winner(1));
        assert_eq!(t.status(), TournamentStatus::Semifinal2);
        assert_eq!(
            names(t.current_pairing()),
            Some(("paula".into(), "johannes".into()))
        );

        assert!(t.record_winner(3));
        assert_eq!(t.status(), TournamentStatus::Final);
        assert_eq!(
            names(t.current_pairing()),
            Some(("arne".into(), "paula".into()))
        );

        assert!(t.champion().is_none());
        assert!(t.record_winner(3));
        assert_eq!(t.status(), TournamentStatus::Completed);
        assert_eq!(t.champion(), Some(&player(3, "paula")));
        assert!(t.current_pairing().is_none());
        assert!(!t.record_winner(3));
    }

    #[test]
    fn winners_must_come_from_the_current_stage() {
        let mut t = full_bracket();
        assert!(!t.record_winner(3));
        assert!(!t.record_winner(99));
        assert_eq!(t.status(), TournamentStatus::Semifinal1);

        let mut waiting = Tournament::new(player(1, "arne"), None);
        assert!(!waiting.record_winner(1));
        assert_eq!(waiting.status(), TournamentStatus::Waiting);
    }

    #[test]
    fn view_reflects_results() {
        let mut t = full_bracket();
        t.record_winner(2);
        t.record_winner(4);
        let view = t.view();
        assert_eq!(view.status, TournamentStatus::Final);
        assert_eq!(view.semifinal1.winner, Some(player(2, "daniel")));
        assert_eq!(view.semifinal2.winner, Some(player(4, "johannes")));
        assert_eq!(view.final_match.player1, Some(player(2, "daniel")));
        assert_eq!(view.final_match.player2, Some(player(4, "johannes")));
        assert_eq!(view.final_match.winner, None);
    }
}
