use serde::{Deserialize, Serialize};

/// A player as seen by the engine: an authenticated id plus the display name
/// captured when they queued or joined. The name is never refreshed.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub struct Contestant {
    pub id: i64,
    pub display_name: String,
}

impl Contestant {
    pub fn new(id: i64, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
        }
    }
}
