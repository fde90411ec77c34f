use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Movement intent for a paddle. Parsed from the wire values `UP`, `DOWN`
/// and `STOP`; anything else is rejected by the caller.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Direction {
    Up,
    Down,
    Stop,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownDirection(pub String);

impl fmt::Display for UnknownDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown direction: {}", self.0)
    }
}

impl std::error::Error for UnknownDirection {}

impl FromStr for Direction {
    type Err = UnknownDirection;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "UP" => Ok(Direction::Up),
            "DOWN" => Ok(Direction::Down),
            "STOP" => Ok(Direction::Stop),
            other => Err(UnknownDirection(other.to_owned())),
        }
    }
}

/// What a contestant should see when polling the matchmaking queue.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum QueueStatus {
    Idle,
    Waiting,
    #[serde(rename_all = "camelCase")]
    Starting {
        match_id: String,
        left_player: String,
        right_player: String,
    },
    #[serde(rename_all = "camelCase")]
    Running { match_id: String },
    #[serde(rename_all = "camelCase")]
    Finished {
        match_id: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        winner: Option<String>,
    },
}

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum LivePhase {
    Starting,
    Running,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PaddleView {
    pub user_id: i64,
    pub username: String,
    pub y: f64,
}

#[derive(Serialize, Clone, Copy, Debug, PartialEq)]
pub struct BallView {
    pub x: f64,
    pub y: f64,
}

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub struct ScoreView {
    pub left: u32,
    pub right: u32,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
pub struct PlayersView {
    pub left: PaddleView,
    pub right: PaddleView,
}

/// Positions and scores of a session that has not finished yet.
#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LiveMatch {
    pub status: LivePhase,
    pub match_id: String,
    pub players: PlayersView,
    pub ball: BallView,
    pub score: ScoreView,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(untagged)]
pub enum MatchSnapshot {
    Live(LiveMatch),
    Finished(FinishedMatch),
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct FinishedMatch {
    /// Always `"finished"`; kept as a field so both snapshot shapes carry `status`.
    pub status: &'static str,
    pub match_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub winner: Option<String>,
}

impl FinishedMatch {
    pub fn new(match_id: String, winner: Option<String>) -> Self {
        Self {
            status: "finished",
            match_id,
            winner,
        }
    }
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActiveMatch {
    pub match_id: String,
    pub left: String,
    pub right: String,
    pub started: bool,
}

#[derive(Serialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActiveMatchList {
    pub match_ids: Vec<ActiveMatch>,
}
