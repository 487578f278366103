use derivative::Derivative;
use log::*;
use std::{convert::TryInto, time::Duration};
use thiserror::Error;
use uwh_common::{
    bundles::BlackWhiteBundle,
    color::Color,
    game_snapshot::{PenaltySnapshot, PenaltyTime},
};

#[derive(Derivative)]
#[derivative(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum PenaltyKind {
    ThirtySecond,
    #[derivative(Default)]
    OneMinute,
    TwoMinute,
    FourMinute,
    FiveMinute,
    TotalDismissal,
}

impl PenaltyKind {
    pub fn as_duration(self) -> Option<Duration> {
        match self {
            Self::ThirtySecond => Some(Duration::from_secs(30)),
            Self::OneMinute => Some(Duration::from_secs(60)),
            Self::TwoMinute => Some(Duration::from_secs(120)),
            Self::FourMinute => Some(Duration::from_secs(240)),
            Self::FiveMinute => Some(Duration::from_secs(300)),
            Self::TotalDismissal => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Penalty {
    kind: PenaltyKind,
    player_number: u8,
    time_remaining: Duration,
    paused: bool,
}

impl Penalty {
    pub fn new(player_number: u8, kind: PenaltyKind, paused: bool) -> Self {
        Self {
            kind,
            player_number,
            time_remaining: kind.as_duration().unwrap_or(Duration::ZERO),
            paused,
        }
    }

    pub fn kind(&self) -> PenaltyKind {
        self.kind
    }

    pub fn player_number(&self) -> u8 {
        self.player_number
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    pub fn is_dismissed(&self) -> bool {
        self.kind == PenaltyKind::TotalDismissal
    }

    pub fn is_served(&self) -> bool {
        !self.is_dismissed() && self.time_remaining.is_zero()
    }

    pub fn is_outstanding(&self) -> bool {
        !self.is_dismissed() && !self.is_served()
    }

    /// `None` for a total dismissal, which has no duration to serve
    pub fn time_remaining(&self) -> Option<Duration> {
        (!self.is_dismissed()).then_some(self.time_remaining)
    }

    fn tick(&mut self, elapsed: Duration) {
        if self.paused || !self.is_outstanding() {
            return;
        }
        self.time_remaining = self.time_remaining.saturating_sub(elapsed);
        if self.time_remaining.is_zero() {
            debug!("Player #{} has served their penalty", self.player_number);
        }
    }

    pub fn printable_time(&self) -> PenaltyTimePrintable {
        if self.is_dismissed() {
            PenaltyTimePrintable::TotalDismissal
        } else if self.is_served() {
            PenaltyTimePrintable::Served
        } else {
            // Round up so that a penalty never shows 0:00 while it is still being served
            let secs = self.time_remaining.as_secs()
                + u64::from(self.time_remaining.subsec_nanos() > 0);
            PenaltyTimePrintable::Remaining(secs)
        }
    }

    pub fn as_snapshot(&self) -> PenaltyResult<PenaltySnapshot> {
        let time = match self.time_remaining() {
            Some(dur) => PenaltyTime::Seconds(dur.as_secs().try_into()?),
            None => PenaltyTime::TotalDismissal,
        };

        Ok(PenaltySnapshot {
            player_number: self.player_number,
            time,
        })
    }
}

#[derive(Debug, PartialEq, Eq, Error)]
pub enum PenaltyError {
    #[error("A penalty snapshot overflowed the maximum value of a u16")]
    SnapshotOverflow(#[from] core::num::TryFromIntError),
    #[error("No {0} penalty exists at the index {1}")]
    InvalidIndex(Color, usize),
    #[error("The penalty ledger is unavailable: {0}")]
    Unavailable(String),
}

pub type PenaltyResult<T> = std::result::Result<T, PenaltyError>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PenaltyTimePrintable {
    Served,
    TotalDismissal,
    Remaining(u64),
}

impl std::fmt::Display for PenaltyTimePrintable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Served => write!(f, "Served"),
            Self::TotalDismissal => write!(f, "Dismissed"),
            Self::Remaining(secs) => write!(f, "{}:{:02}", secs / 60, secs % 60),
        }
    }
}

/// What the game core needs from whatever keeps the per-player penalty records.
///
/// The core pauses and resumes penalties in step with the game clock, but it never rolls back
/// its own state if the ledger reports an error.
pub trait PenaltyLedger {
    fn pause_all(&mut self, color: Color) -> PenaltyResult<()>;

    fn resume_all(&mut self, color: Color) -> PenaltyResult<()>;

    /// Penalties that are neither served nor total dismissals
    fn query_outstanding(&self, color: Color) -> Vec<PenaltySnapshot>;

    /// Counts down every penalty that is not paused
    fn tick(&mut self, elapsed: Duration);

    fn clear(&mut self);
}

/// The default in-memory penalty ledger
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct PenaltyBook {
    penalties: BlackWhiteBundle<Vec<Penalty>>,
}

impl PenaltyBook {
    pub fn list(&self, color: Color) -> &[Penalty] {
        &self.penalties[color]
    }

    pub fn add(&mut self, color: Color, penalty: Penalty) {
        info!(
            "Adding a {:?} penalty for {color} player #{}",
            penalty.kind, penalty.player_number
        );
        self.penalties[color].push(penalty);
    }

    /// Changing the kind restarts the countdown from the new kind's full duration
    pub fn edit(
        &mut self,
        old_color: Color,
        index: usize,
        new_color: Color,
        new_player_number: u8,
        new_kind: PenaltyKind,
    ) -> PenaltyResult<()> {
        let penalty = self.penalties[old_color]
            .get_mut(index)
            .ok_or(PenaltyError::InvalidIndex(old_color, index))?;
        info!(
            "Editing {old_color} player #{}'s {:?} penalty: \
            it is now {new_color} player #{new_player_number}'s {new_kind:?} penalty",
            penalty.player_number, penalty.kind
        );

        penalty.player_number = new_player_number;
        if penalty.kind != new_kind {
            *penalty = Penalty::new(new_player_number, new_kind, penalty.paused);
        }
        if old_color != new_color {
            let penalty = self.penalties[old_color].remove(index);
            self.penalties[new_color].push(penalty);
        }
        Ok(())
    }

    pub fn delete(&mut self, color: Color, index: usize) -> PenaltyResult<Penalty> {
        if index >= self.penalties[color].len() {
            return Err(PenaltyError::InvalidIndex(color, index));
        }
        let penalty = self.penalties[color].remove(index);
        info!(
            "Deleting {color} player #{}'s {:?} penalty",
            penalty.player_number, penalty.kind
        );
        Ok(penalty)
    }

    fn set_paused(&mut self, color: Color, paused: bool) {
        self.penalties[color]
            .iter_mut()
            .filter(|pen| pen.is_outstanding())
            .for_each(|pen| pen.paused = paused);
    }
}

impl PenaltyLedger for PenaltyBook {
    fn pause_all(&mut self, color: Color) -> PenaltyResult<()> {
        debug!("Pausing {color} penalties");
        self.set_paused(color, true);
        Ok(())
    }

    fn resume_all(&mut self, color: Color) -> PenaltyResult<()> {
        debug!("Resuming {color} penalties");
        self.set_paused(color, false);
        Ok(())
    }

    fn query_outstanding(&self, color: Color) -> Vec<PenaltySnapshot> {
        self.penalties[color]
            .iter()
            .filter(|pen| pen.is_outstanding())
            .filter_map(|pen| match pen.as_snapshot() {
                Ok(snapshot) => Some(snapshot),
                Err(e) => {
                    error!(
                        "Failed to snapshot {color} player #{}'s penalty: {e}",
                        pen.player_number
                    );
                    None
                }
            })
            .collect()
    }

    fn tick(&mut self, elapsed: Duration) {
        self.penalties
            .for_each_mut(|_, list| list.iter_mut().for_each(|pen| pen.tick(elapsed)));
    }

    fn clear(&mut self) {
        self.penalties.for_each_mut(|_, list| list.clear());
    }
}
