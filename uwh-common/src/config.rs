use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Timing rules for a single game and the break that follows it
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    #[serde(with = "secs_only_duration")]
    pub half_play_duration: Duration,
    #[serde(with = "secs_only_duration")]
    pub half_time_duration: Duration,
    #[serde(with = "secs_only_duration")]
    pub team_timeout_duration: Duration,
    #[serde(with = "secs_only_duration")]
    pub nominal_break: Duration,
    #[serde(with = "secs_only_duration")]
    pub minimum_break: Duration,
}

impl Default for Game {
    fn default() -> Self {
        Self {
            half_play_duration: Duration::from_secs(600),
            half_time_duration: Duration::from_secs(180),
            team_timeout_duration: Duration::from_secs(60),
            nominal_break: Duration::from_secs(900),
            minimum_break: Duration::from_secs(240),
        }
    }
}

impl Game {
    /// The length of a game if it runs without any stoppages
    pub fn expected_game_duration(&self) -> Duration {
        2 * self.half_play_duration + self.half_time_duration
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.minimum_break > self.nominal_break {
            return Err(ConfigError::MinimumBreakTooLong {
                minimum: self.minimum_break,
                nominal: self.nominal_break,
            });
        }
        if self.half_play_duration.is_zero() {
            return Err(ConfigError::ZeroHalfDuration);
        }
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("The minimum break ({minimum:?}) is longer than the nominal break ({nominal:?})")]
    MinimumBreakTooLong { minimum: Duration, nominal: Duration },
    #[error("The half play duration must be longer than zero")]
    ZeroHalfDuration,
}

pub mod secs_only_duration {
    use serde::{self, Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(dur: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(dur.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(Duration::from_secs(u64::deserialize(deserializer)?))
    }
}
