use log::*;
use std::{cmp::min, time::Duration};
use time::Duration as SignedDuration;
use uwh_common::drawing_support::MAX_LONG_STRINGABLE_SECS;

const MAX_TIME_VAL: Duration = Duration::from_secs(MAX_LONG_STRINGABLE_SECS as u64);

/// Everything the break calculation needs to know about the game that just ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakInputs {
    pub actual_game_duration: Duration,
    pub expected_game_duration: Duration,
    pub nominal_break: Duration,
    pub minimum_break: Duration,
    /// `next_game_start - now`, present only when wallclock scheduling is enabled and both times
    /// are known. Negative if the next game is already late.
    pub time_to_next_game: Option<SignedDuration>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakBasis {
    /// The break runs until the scheduled start of the next game
    Wallclock,
    /// The next game is scheduled too soon, so the minimum break is used
    WallclockMinimum,
    /// The nominal break, shortened by the accumulated delay
    Ledger,
    /// The accumulated delay is too large to recover in one break
    LedgerMinimum,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakPlan {
    pub duration: Duration,
    pub basis: BreakBasis,
}

/// Running total of how far behind schedule the session is.
///
/// Each game that runs longer than its nominal length adds its overrun, and each break that is
/// shorter than nominal pays some of it back. Lives for the whole session, across games.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DelayLedger {
    total_delay: SignedDuration,
}

fn to_signed(dur: Duration) -> SignedDuration {
    SignedDuration::try_from(dur).unwrap_or(SignedDuration::MAX)
}

impl DelayLedger {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub(super) fn with_delay(total_delay: SignedDuration) -> Self {
        Self { total_delay }
    }

    pub fn total_delay(&self) -> SignedDuration {
        self.total_delay
    }

    /// Computes the length of the break after a game and updates the running delay.
    ///
    /// The result is never shorter than `inputs.minimum_break`. A game that finishes early is not
    /// credited back to the ledger.
    pub fn schedule_break(&mut self, inputs: &BreakInputs) -> BreakPlan {
        let overrun = inputs
            .actual_game_duration
            .saturating_sub(inputs.expected_game_duration);
        self.total_delay += to_signed(overrun);
        info!(
            "Game ran {:?}, expected {:?}. Accumulated delay is now {}",
            inputs.actual_game_duration, inputs.expected_game_duration, self.total_delay
        );

        let nominal = to_signed(inputs.nominal_break);
        let minimum = to_signed(inputs.minimum_break);

        let (duration, basis) = match inputs.time_to_next_game {
            Some(start_delay) if start_delay < minimum => {
                self.total_delay -= nominal - minimum;
                (inputs.minimum_break, BreakBasis::WallclockMinimum)
            }
            Some(start_delay) => {
                self.total_delay = SignedDuration::ZERO;
                (
                    Duration::try_from(start_delay).unwrap_or(inputs.minimum_break),
                    BreakBasis::Wallclock,
                )
            }
            None if nominal - self.total_delay < minimum => {
                self.total_delay -= nominal - minimum;
                (inputs.minimum_break, BreakBasis::LedgerMinimum)
            }
            None => {
                let duration = Duration::try_from(nominal - self.total_delay)
                    .unwrap_or(inputs.minimum_break);
                self.total_delay = SignedDuration::ZERO;
                (duration, BreakBasis::Ledger)
            }
        };

        let duration = min(duration, MAX_TIME_VAL);
        info!(
            "Break will be {duration:?} ({basis:?}), delay carried forward is {}",
            self.total_delay
        );

        BreakPlan { duration, basis }
    }
}
