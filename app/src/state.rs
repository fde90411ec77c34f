use std::sync::Arc;

use crate::{
    config::Config,
    core::{GameService, TournamentService},
    persistence::ResultStore,
};

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn ResultStore>,
    pub games: GameService,
    pub tournaments: TournamentService,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn ResultStore>) -> Self {
        Self {
            games: GameService::new(config.clone(), store.clone()),
            tournaments: TournamentService::new(config.clone(), store.clone()),
            config,
            store,
        }
    }
}
