use crate::tournament_manager::{
    Result, TimeoutKind, TournamentManager,
    penalty::{PenaltyBook, PenaltyLedger},
};
use log::*;
use std::{
    fmt::{Display, Formatter},
    time::Duration,
};
use uwh_common::game_snapshot::GamePeriod;

/// What the single control button will do when pressed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConsoleState {
    Start,
    Resume,
    Timeout,
    ReadyToReset,
}

impl ConsoleState {
    pub fn from_game(period: GamePeriod, timeout: Option<TimeoutKind>) -> Self {
        match (period, timeout) {
            (GamePeriod::GameOver, _) => Self::ReadyToReset,
            (_, Some(_)) => Self::Resume,
            (GamePeriod::PreGame, None) => Self::Start,
            (_, None) => Self::Timeout,
        }
    }
}

impl Display for ConsoleState {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            Self::Start => write!(f, "START"),
            Self::Resume => write!(f, "RESUME"),
            Self::Timeout => write!(f, "TIMEOUT"),
            Self::ReadyToReset => write!(f, "RESET"),
        }
    }
}

/// Turns presses of the one control button into game actions. Invalid presses are logged and
/// otherwise ignored.
#[derive(Debug)]
pub struct Console<L: PenaltyLedger = PenaltyBook> {
    tm: TournamentManager<L>,
}

impl<L: PenaltyLedger> Console<L> {
    pub fn new(tm: TournamentManager<L>) -> Self {
        Self { tm }
    }

    pub fn state(&self) -> ConsoleState {
        ConsoleState::from_game(self.tm.current_period(), self.tm.timeout_kind())
    }

    pub fn manager(&self) -> &TournamentManager<L> {
        &self.tm
    }

    pub fn manager_mut(&mut self) -> &mut TournamentManager<L> {
        &mut self.tm
    }

    pub fn on_primary_button(&mut self, requested: Option<TimeoutKind>) -> ConsoleState {
        let before = self.state();
        if let Err(e) = self.dispatch(before, requested) {
            warn!("{} Ignoring {before} press: {e}", self.tm.status_string());
        }
        let after = self.state();
        if after != before {
            info!(
                "{} Button changed from {before} to {after}",
                self.tm.status_string()
            );
        }
        after
    }

    fn dispatch(&mut self, state: ConsoleState, requested: Option<TimeoutKind>) -> Result<()> {
        match state {
            ConsoleState::ReadyToReset => self.tm.reset_game(),
            ConsoleState::Resume => self.tm.end_timeout(),
            ConsoleState::Start => {
                self.tm.start_game()?;
                match requested {
                    Some(kind) => self.tm.start_timeout(kind),
                    None => Ok(()),
                }
            }
            ConsoleState::Timeout => match requested {
                Some(kind) => self.tm.start_timeout(kind),
                None => {
                    debug!("{} No timeout was requested", self.tm.status_string());
                    Ok(())
                }
            },
        }
    }

    pub fn begin_clock_edit(&mut self) {
        self.tm.begin_clock_edit();
    }

    pub fn on_manual_clock_edit(&mut self, new_value: Duration) {
        self.tm.set_game_clock_time(new_value);
    }

    pub fn cancel_clock_edit(&mut self) {
        self.tm.cancel_clock_edit();
    }

    pub fn on_tick(&mut self, elapsed: Duration) -> ConsoleState {
        self.tm.tick(elapsed);
        self.state()
    }
}
