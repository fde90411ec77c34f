/// Rejections on the movement path. These are routine (a poll racing the
/// countdown, a stale client) and are returned rather than logged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveError {
    NoMatch,
    NoActiveMatch,
    NotStarted,
    NotInMatch,
    InvalidDirection,
}

impl MoveError {
    pub fn code(&self) -> &'static str {
        match self {
            MoveError::NoMatch => "no_match",
            MoveError::NoActiveMatch => "no_active_match",
            MoveError::NotStarted => "not_started",
            MoveError::NotInMatch => "not_in_match",
            MoveError::InvalidDirection => "invalid_direction",
        }
    }
}

impl std::fmt::Display for MoveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let message = match self {
            MoveError::NoMatch => "Contestant is not in a match",
            MoveError::NoActiveMatch => "No tournament match is being played",
            MoveError::NotStarted => "Match has not started yet",
            MoveError::NotInMatch => "Contestant is not playing in this match",
            MoveError::InvalidDirection => "Direction must be UP, DOWN or STOP",
        };
        write!(f, "{}", message)
    }
}

impl std::error::Error for MoveError {}

/// Misuse of the bracket: creating over a live tournament or joining one
/// that is no longer accepting contestants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TournamentError {
    AlreadyActive,
    NoActiveTournament,
    NotWaiting,
}

impl TournamentError {
    pub fn code(&self) -> &'static str {
        match self {
            TournamentError::AlreadyActive => "already_active",
            TournamentError::NoActiveTournament => "no_active_tournament",
            TournamentError::NotWaiting => "not_waiting",
        }
    }
}

impl std::fmt::Display for TournamentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let message = match self {
            TournamentError::AlreadyActive => "Tournament already active",
            TournamentError::NoActiveTournament => "No active tournament",
            TournamentError::NotWaiting => "Tournament is not in waiting state",
        };
        write!(f, "{}", message)
    }
}

impl std::error::Error for TournamentError {}
