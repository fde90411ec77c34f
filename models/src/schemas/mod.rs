pub mod contestant;
pub mod game;
pub mod history;
pub mod tournament;
