mod bracket;
mod matchmaking;
mod session;
mod simulation;
mod tournament;

pub use bracket::*;
pub use matchmaking::*;
pub use session::*;
pub use simulation::*;
pub use tournament::*;
