use crate::tournament_manager::schedule::TournamentSchedule;
use serde::{Deserialize, Serialize};
pub use uwh_common::config::{ConfigError, Game};

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    pub game: Game,
    pub schedule: TournamentSchedule,
}

impl Config {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.game.validate()
    }
}
