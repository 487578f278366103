use log::*;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};
use time::{OffsetDateTime, PrimitiveDateTime, UtcOffset};

/// Source of the current time of day. `None` means the time is not known.
pub trait WallClock {
    fn now(&self) -> Option<OffsetDateTime>;
}

/// Where the start time of the next game comes from
pub trait MatchSchedule {
    fn next_match_start(&self, after_game: u32) -> Option<OffsetDateTime>;

    fn wallclock_mode_enabled(&self) -> bool;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl WallClock for SystemClock {
    fn now(&self) -> Option<OffsetDateTime> {
        Some(OffsetDateTime::now_utc())
    }
}

/// A clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<Mutex<Option<OffsetDateTime>>>,
}

impl ManualClock {
    pub fn new(now: Option<OffsetDateTime>) -> Self {
        Self {
            now: Arc::new(Mutex::new(now)),
        }
    }

    pub fn set(&self, now: Option<OffsetDateTime>) {
        match self.now.lock() {
            Ok(mut guard) => *guard = now,
            Err(e) => error!("Manual clock lock was poisoned: {e}"),
        }
    }

    pub fn advance(&self, by: time::Duration) {
        match self.now.lock() {
            Ok(mut guard) => *guard = guard.map(|now| now + by),
            Err(e) => error!("Manual clock lock was poisoned: {e}"),
        }
    }
}

impl WallClock for ManualClock {
    fn now(&self) -> Option<OffsetDateTime> {
        self.now.lock().ok().and_then(|guard| *guard)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledGame {
    pub number: u32,
    pub start_time: PrimitiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentSchedule {
    pub use_wallclock: bool,
    pub timezone: UtcOffset,
    pub games: Vec<ScheduledGame>,
}

impl Default for TournamentSchedule {
    fn default() -> Self {
        Self {
            use_wallclock: false,
            timezone: UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC),
            games: Vec::new(),
        }
    }
}

impl MatchSchedule for TournamentSchedule {
    fn next_match_start(&self, after_game: u32) -> Option<OffsetDateTime> {
        let next = self
            .games
            .iter()
            .filter(|game| game.number > after_game)
            .min_by_key(|game| game.number)?;
        let start = next.start_time.assume_offset(self.timezone);
        debug!("Game {} is scheduled to start at {start}", next.number);
        Some(start)
    }

    fn wallclock_mode_enabled(&self) -> bool {
        self.use_wallclock
    }
}

/// Used when there is no schedule to follow
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSchedule;

impl MatchSchedule for NoSchedule {
    fn next_match_start(&self, _after_game: u32) -> Option<OffsetDateTime> {
        None
    }

    fn wallclock_mode_enabled(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use time::macros::{datetime, offset};

    fn schedule() -> TournamentSchedule {
        TournamentSchedule {
            use_wallclock: true,
            timezone: offset!(-5),
            games: vec![
                ScheduledGame {
                    number: 4,
                    start_time: datetime!(2024-03-02 10:30),
                },
                ScheduledGame {
                    number: 2,
                    start_time: datetime!(2024-03-02 09:30),
                },
                ScheduledGame {
                    number: 3,
                    start_time: datetime!(2024-03-02 10:00),
                },
            ],
        }
    }

    #[test]
    fn test_next_match_start() {
        let sched = schedule();
        assert_eq!(
            sched.next_match_start(1),
            Some(datetime!(2024-03-02 09:30 -5))
        );
        assert_eq!(
            sched.next_match_start(2),
            Some(datetime!(2024-03-02 10:00 -5))
        );
        assert_eq!(sched.next_match_start(4), None);
        assert!(sched.wallclock_mode_enabled());
    }

    #[test]
    fn test_no_schedule() {
        assert_eq!(NoSchedule.next_match_start(0), None);
        assert!(!NoSchedule.wallclock_mode_enabled());
    }

    #[test]
    fn test_manual_clock() {
        let clock = ManualClock::new(None);
        assert_eq!(clock.now(), None);

        let shared = clock.clone();
        shared.set(Some(datetime!(2024-03-02 09:00 UTC)));
        clock.advance(time::Duration::minutes(5));
        assert_eq!(shared.now(), Some(datetime!(2024-03-02 09:05 UTC)));
    }

    #[test]
    fn test_ser_schedule() {
        let sched = schedule();
        let serialized = toml::to_string(&sched).unwrap();
        let deser = toml::from_str(&serialized);
        assert_eq!(deser, Ok(sched));
    }
}
