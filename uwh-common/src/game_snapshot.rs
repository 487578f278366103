use crate::config::Game;
pub use crate::color::Color;
use core::{
    cmp::{Ordering, PartialOrd},
    time::Duration,
};
use enum_iterator::Sequence;
use serde::{Deserialize, Serialize};

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct GameSnapshot {
    pub current_period: GamePeriod,
    pub secs_in_period: u32,
    pub timeout: TimeoutSnapshot,
    pub b_score: u8,
    pub w_score: u8,
    pub b_penalties: Vec<PenaltySnapshot>,
    pub w_penalties: Vec<PenaltySnapshot>,
}

#[derive(Debug, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub struct PenaltySnapshot {
    pub player_number: u8,
    pub time: PenaltyTime,
}

#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash, Serialize, Deserialize, Sequence)]
pub enum GamePeriod {
    PreGame,
    FirstHalf,
    HalfTime,
    SecondHalf,
    GameOver,
}

impl GamePeriod {
    /// Penalties only count down while the puck is in play
    pub fn penalties_run(self) -> bool {
        match self {
            Self::PreGame | Self::HalfTime | Self::GameOver => false,
            Self::FirstHalf | Self::SecondHalf => true,
        }
    }

    /// Team, ref and penalty shot timeouts are allowed in every period except `GameOver`
    pub fn timeouts_allowed(self) -> bool {
        self != Self::GameOver
    }

    pub fn duration(self, config: &Game) -> Option<Duration> {
        match self {
            Self::PreGame | Self::GameOver => None,
            Self::FirstHalf | Self::SecondHalf => Some(config.half_play_duration),
            Self::HalfTime => Some(config.half_time_duration),
        }
    }

    /// The period that follows when the clock runs out. `GameOver` only leaves through a reset.
    pub fn next_period(self) -> Option<GamePeriod> {
        match self {
            Self::PreGame => Some(Self::FirstHalf),
            Self::FirstHalf => Some(Self::HalfTime),
            Self::HalfTime => Some(Self::SecondHalf),
            Self::SecondHalf => Some(Self::GameOver),
            Self::GameOver => None,
        }
    }
}

impl core::fmt::Display for GamePeriod {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match *self {
            GamePeriod::PreGame => write!(f, "Pre Game"),
            GamePeriod::FirstHalf => write!(f, "First Half"),
            GamePeriod::HalfTime => write!(f, "Half Time"),
            GamePeriod::SecondHalf => write!(f, "Second Half"),
            GamePeriod::GameOver => write!(f, "Game Over"),
        }
    }
}

/// The timeout currently in progress. Team timeouts carry the seconds left on the timeout clock.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum TimeoutSnapshot {
    None,
    White(u16),
    Black(u16),
    Ref(u16),
    PenaltyShot(u16),
}

impl core::fmt::Display for TimeoutSnapshot {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match *self {
            TimeoutSnapshot::None => write!(f, "No Timeout"),
            TimeoutSnapshot::Black(_) => write!(f, "Black Timeout"),
            TimeoutSnapshot::White(_) => write!(f, "White Timeout"),
            TimeoutSnapshot::Ref(_) => write!(f, "Ref Timeout"),
            TimeoutSnapshot::PenaltyShot(_) => write!(f, "Penalty Shot"),
        }
    }
}

#[derive(Debug, PartialEq, Eq, Clone, Copy, Serialize, Deserialize)]
pub enum PenaltyTime {
    Seconds(u16),
    TotalDismissal,
}

impl Ord for PenaltyTime {
    fn cmp(&self, other: &Self) -> Ordering {
        match self {
            PenaltyTime::TotalDismissal => match other {
                PenaltyTime::TotalDismissal => Ordering::Equal,
                PenaltyTime::Seconds(_) => Ordering::Greater,
            },
            PenaltyTime::Seconds(mine) => match other {
                PenaltyTime::Seconds(theirs) => mine.cmp(theirs),
                PenaltyTime::TotalDismissal => Ordering::Less,
            },
        }
    }
}

impl PartialOrd for PenaltyTime {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
