use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MatchResult {
    pub winner_id: i64,
    pub loser_id: i64,
    pub played_at: DateTime<Utc>,
}

#[derive(Serialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct MatchHistorySchema {
    pub contestant_id: i64,
    pub results: Vec<MatchResult>,
}
