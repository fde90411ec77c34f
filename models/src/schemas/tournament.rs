use serde::{Deserialize, Serialize};

use super::{contestant::Contestant, game::LiveMatch};

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TournamentStatus {
    Waiting,
    #[serde(rename = "semifinal_1")]
    Semifinal1,
    #[serde(rename = "semifinal_2")]
    Semifinal2,
    Final,
    Completed,
}

impl TournamentStatus {
    /// Label shown next to the match currently being played in this stage.
    pub fn match_type(self) -> Option<&'static str> {
        match self {
            TournamentStatus::Semifinal1 => Some("Semifinal 1"),
            TournamentStatus::Semifinal2 => Some("Semifinal 2"),
            TournamentStatus::Final => Some("Final"),
            TournamentStatus::Waiting | TournamentStatus::Completed => None,
        }
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StageView {
    pub player1: Option<Contestant>,
    pub player2: Option<Contestant>,
    pub winner: Option<Contestant>,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BracketView {
    pub status: TournamentStatus,
    pub previous_winner: String,
    pub players: Vec<Contestant>,
    pub semifinal1: StageView,
    pub semifinal2: StageView,
    #[serde(rename = "final")]
    pub final_match: StageView,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TournamentMatchView {
    pub match_type: &'static str,
    #[serde(flatten)]
    pub live: LiveMatch,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TournamentView {
    #[serde(flatten)]
    pub bracket: BracketView,
    pub current_match: Option<TournamentMatchView>,
}

/// Result of polling the orchestrator.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum TournamentStatusSchema {
    NoTournament(NoTournament),
    Active(TournamentView),
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct NoTournament {
    pub status: &'static str,
    pub current_match: Option<TournamentMatchView>,
}

impl Default for NoTournament {
    fn default() -> Self {
        Self {
            status: "no_tournament",
            current_match: None,
        }
    }
}
