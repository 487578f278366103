use derivative::Derivative;
use log::*;
use std::{
    cmp::min,
    fmt::{Display, Formatter},
    time::Duration,
};
use thiserror::Error;
use time::{Duration as SignedDuration, OffsetDateTime};
use tokio::sync::watch;
use uwh_common::{
    bundles::BlackWhiteBundle,
    config::Game as GameConfig,
    game_snapshot::{Color, GamePeriod, GameSnapshot, TimeoutSnapshot},
};

pub mod break_scheduler;
use break_scheduler::*;

pub mod clock;
use clock::*;

pub mod game_stats;
use game_stats::*;

pub mod penalty;
use penalty::*;

pub mod schedule;
use schedule::*;

pub const MAX_SCORE: u8 = 99;

/// The kinds of timeout an operator can call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutKind {
    Ref,
    PenaltyShot,
    Team(Color),
}

impl TimeoutKind {
    fn as_snapshot(self, secs: u16) -> TimeoutSnapshot {
        match self {
            Self::Ref => TimeoutSnapshot::Ref(secs),
            Self::PenaltyShot => TimeoutSnapshot::PenaltyShot(secs),
            Self::Team(Color::Black) => TimeoutSnapshot::Black(secs),
            Self::Team(Color::White) => TimeoutSnapshot::White(secs),
        }
    }
}

impl Display for TimeoutKind {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            Self::Ref => write!(f, "Ref Timeout"),
            Self::PenaltyShot => write!(f, "Penalty Shot"),
            Self::Team(color) => write!(f, "{color} Timeout"),
        }
    }
}

/// Each active timeout owns the game clock value it interrupted
#[derive(Debug, PartialEq, Eq)]
enum TimeoutState {
    None,
    Team(Color, ClockSnapshot),
    Ref(ClockSnapshot),
    PenaltyShot(ClockSnapshot),
}

impl TimeoutState {
    fn kind(&self) -> Option<TimeoutKind> {
        match self {
            Self::None => None,
            Self::Team(color, _) => Some(TimeoutKind::Team(*color)),
            Self::Ref(_) => Some(TimeoutKind::Ref),
            Self::PenaltyShot(_) => Some(TimeoutKind::PenaltyShot),
        }
    }

    fn clock_snapshot(&self) -> Option<&ClockSnapshot> {
        match self {
            Self::None => None,
            Self::Team(_, cs) | Self::Ref(cs) | Self::PenaltyShot(cs) => Some(cs),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextGameInfo {
    pub number: u32,
    pub start_time: Option<OffsetDateTime>,
}

#[derive(Derivative)]
#[derivative(Debug)]
pub struct TournamentManager<L: PenaltyLedger = PenaltyBook> {
    config: GameConfig,
    game_number: u32,
    current_period: GamePeriod,
    clock: GameClock,
    timeout_state: TimeoutState,
    team_timeouts_available: BlackWhiteBundle<bool>,
    scores: BlackWhiteBundle<u8>,
    penalties: L,
    delay_ledger: DelayLedger,
    last_break: Option<BreakPlan>,
    #[derivative(Debug = "ignore")]
    wall_clock: Box<dyn WallClock + Send>,
    #[derivative(Debug = "ignore")]
    schedule: Box<dyn MatchSchedule + Send>,
    next_game: Option<NextGameInfo>,
    game_start_time: Option<OffsetDateTime>,
    game_elapsed: Duration,
    clock_edit_was_running: Option<bool>,
    start_stop_tx: watch::Sender<bool>,
    start_stop_rx: watch::Receiver<bool>,
    buzzer_tx: watch::Sender<u32>,
    current_game_stats: GameStats,
    last_game_stats: Option<GameStats>,
}

impl<L: PenaltyLedger + Default> TournamentManager<L> {
    pub fn new(config: GameConfig) -> Self {
        Self::with_collaborators(
            config,
            L::default(),
            Box::new(SystemClock),
            Box::new(NoSchedule),
        )
    }
}

impl<L: PenaltyLedger> TournamentManager<L> {
    pub fn with_collaborators(
        config: GameConfig,
        penalties: L,
        wall_clock: Box<dyn WallClock + Send>,
        schedule: Box<dyn MatchSchedule + Send>,
    ) -> Self {
        let (start_stop_tx, start_stop_rx) = watch::channel(false);
        let (buzzer_tx, _) = watch::channel(0);
        Self {
            game_number: 0,
            current_period: GamePeriod::PreGame,
            clock: GameClock::new(config.half_play_duration),
            timeout_state: TimeoutState::None,
            team_timeouts_available: BlackWhiteBundle::splat(true),
            scores: Default::default(),
            penalties,
            delay_ledger: DelayLedger::new(),
            last_break: None,
            wall_clock,
            schedule,
            next_game: None,
            game_start_time: None,
            game_elapsed: Duration::ZERO,
            clock_edit_was_running: None,
            start_stop_tx,
            start_stop_rx,
            buzzer_tx,
            current_game_stats: GameStats::new(1),
            last_game_stats: None,
            config,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    /// The config can only be changed before a game starts
    pub fn set_config(&mut self, config: GameConfig) -> Result<()> {
        if self.current_period != GamePeriod::PreGame {
            return Err(TournamentManagerError::GameInProgress);
        }
        self.clock.set(config.half_play_duration);
        self.config = config;
        info!("{} Config updated", self.status_string());
        Ok(())
    }

    pub fn current_period(&self) -> GamePeriod {
        self.current_period
    }

    pub fn game_number(&self) -> u32 {
        self.game_number
    }

    pub fn next_game_number(&self) -> u32 {
        self.next_game
            .as_ref()
            .map(|info| info.number)
            .unwrap_or(self.game_number + 1)
    }

    pub fn next_game_info(&self) -> Option<&NextGameInfo> {
        self.next_game.as_ref()
    }

    /// Overrides the schedule for the game after the current one
    pub fn set_next_game(&mut self, info: NextGameInfo) {
        info!("{} Next Game Info set to {info:?}", self.status_string());
        if self.current_period == GamePeriod::PreGame || self.current_period == GamePeriod::GameOver
        {
            self.current_game_stats = GameStats::new(info.number);
        }
        self.next_game = Some(info);
    }

    pub fn clock_is_running(&self) -> bool {
        self.clock.is_running()
    }

    /// The time left in the current period, which is frozen while any timeout is active
    pub fn game_clock_time(&self) -> Duration {
        self.timeout_state
            .clock_snapshot()
            .map(|cs| cs.value_at_pause())
            .unwrap_or_else(|| self.clock.clock_time())
    }

    /// The time left on a team timeout
    pub fn timeout_clock_time(&self) -> Option<Duration> {
        match self.timeout_state {
            TimeoutState::Team(..) => Some(self.clock.clock_time()),
            _ => None,
        }
    }

    pub fn timeout_kind(&self) -> Option<TimeoutKind> {
        self.timeout_state.kind()
    }

    pub fn team_timeout_available(&self, color: Color) -> bool {
        self.team_timeouts_available[color]
    }

    pub fn scores(&self) -> BlackWhiteBundle<u8> {
        self.scores
    }

    pub fn penalties(&self) -> &L {
        &self.penalties
    }

    pub fn delay_ledger(&self) -> &DelayLedger {
        &self.delay_ledger
    }

    /// The break calculated when the last game ended
    pub fn last_break(&self) -> Option<BreakPlan> {
        self.last_break
    }

    pub fn current_game_stats(&self) -> &GameStats {
        &self.current_game_stats
    }

    pub fn last_game_stats(&self) -> Option<&GameStats> {
        self.last_game_stats.as_ref()
    }

    pub fn get_start_stop_rx(&self) -> watch::Receiver<bool> {
        self.start_stop_rx.clone()
    }

    /// The value counts up each time the buzzer should sound
    pub fn get_buzzer_rx(&self) -> watch::Receiver<u32> {
        self.buzzer_tx.subscribe()
    }

    pub fn add_score(&mut self, color: Color, player_num: Option<u8>) {
        match player_num {
            Some(num) => info!("{} Score by {color} player #{num}", self.status_string()),
            None => info!("{} Score by {color}", self.status_string()),
        }
        let now = self.wall_clock.now();
        self.current_game_stats.add_goal(
            self.current_period,
            self.game_clock_time(),
            color,
            player_num,
            now,
        );
        let mut scores = self.scores;
        scores[color] = scores[color].saturating_add(1);
        self.set_scores(scores);
    }

    pub fn set_scores(&mut self, scores: BlackWhiteBundle<u8>) {
        self.scores = scores.map(|score| min(score, MAX_SCORE));
        info!("{} Scores set to {}", self.status_string(), self.scores);
    }

    pub fn start_game(&mut self) -> Result<()> {
        if self.current_period != GamePeriod::PreGame {
            return Err(TournamentManagerError::GameInProgress);
        }
        if self.timeout_state != TimeoutState::None {
            return Err(TournamentManagerError::AlreadyInTimeout(
                self.timeout_snapshot(),
            ));
        }
        self.discard_clock_edit();

        self.game_number = self.next_game_number();
        self.next_game = None;
        self.current_period = GamePeriod::FirstHalf;
        self.clock.set(self.config.half_play_duration);
        self.clock.start();

        self.game_start_time = self.wall_clock.now();
        self.game_elapsed = Duration::ZERO;
        if self.current_game_stats.game_number() != self.game_number {
            self.current_game_stats = GameStats::new(self.game_number);
        }
        self.current_game_stats.add_start_time(self.game_start_time);

        self.set_penalties_running(true);
        self.publish_clock_state();
        info!(
            "{} Starting game {}, wall clock time is {:?}",
            self.status_string(),
            self.game_number,
            self.game_start_time
        );
        Ok(())
    }

    /// Returns `Ok` if the timeout can be started, otherwise returns `Err` describing why not
    pub fn can_start_timeout(&self, kind: TimeoutKind) -> Result<()> {
        if self.timeout_state != TimeoutState::None {
            return Err(TournamentManagerError::AlreadyInTimeout(
                self.timeout_snapshot(),
            ));
        }
        if !self.current_period.timeouts_allowed() {
            return Err(TournamentManagerError::WrongGamePeriod(
                kind.as_snapshot(0),
                self.current_period,
            ));
        }
        if let TimeoutKind::Team(color) = kind {
            if !self.team_timeouts_available[color] {
                return Err(TournamentManagerError::TooManyTeamTimeouts(color));
            }
        }
        Ok(())
    }

    pub fn start_timeout(&mut self, kind: TimeoutKind) -> Result<()> {
        self.can_start_timeout(kind)?;
        self.discard_clock_edit();

        if let TimeoutKind::Team(color) = kind {
            self.team_timeouts_available[color] = false;
        }
        let snapshot = self.clock.snapshot_and_stop();
        self.set_penalties_running(false);

        self.timeout_state = match kind {
            TimeoutKind::Ref => TimeoutState::Ref(snapshot),
            TimeoutKind::PenaltyShot => TimeoutState::PenaltyShot(snapshot),
            TimeoutKind::Team(color) => {
                self.clock.set(self.config.team_timeout_duration);
                self.clock.start();
                TimeoutState::Team(color, snapshot)
            }
        };

        self.publish_clock_state();
        info!("{} Starting a {kind}", self.status_string());
        Ok(())
    }

    pub fn end_timeout(&mut self) -> Result<()> {
        let (kind, snapshot) =
            match std::mem::replace(&mut self.timeout_state, TimeoutState::None) {
                TimeoutState::None => return Err(TournamentManagerError::NotInTimeout),
                TimeoutState::Team(color, cs) => (TimeoutKind::Team(color), cs),
                TimeoutState::Ref(cs) => (TimeoutKind::Ref, cs),
                TimeoutState::PenaltyShot(cs) => (TimeoutKind::PenaltyShot, cs),
            };
        self.discard_clock_edit();

        self.clock.restore_and_start(snapshot);
        if self.current_period == GamePeriod::PreGame {
            // The game clock doesn't run before the game starts
            self.clock.stop();
        }
        if self.current_period.penalties_run() {
            self.set_penalties_running(true);
        }

        self.publish_clock_state();
        info!("{} Ending {kind}", self.status_string());
        Ok(())
    }

    /// Counts the clock down and moves to the next period when the clock runs out
    pub fn tick(&mut self, elapsed: Duration) {
        if matches!(
            self.current_period,
            GamePeriod::FirstHalf | GamePeriod::HalfTime | GamePeriod::SecondHalf
        ) {
            self.game_elapsed += elapsed;
        }

        if !self.clock.is_running() {
            return;
        }
        self.penalties.tick(elapsed);
        if !self.clock.tick(elapsed) {
            return;
        }

        if let Some(kind) = self.timeout_state.kind() {
            info!("{} The {kind} clock ran out", self.status_string());
            self.clock.stop();
            self.publish_clock_state();
            self.sound_buzzer();
            return;
        }

        match self.current_period {
            GamePeriod::FirstHalf | GamePeriod::HalfTime => {
                if let Some(next) = self.current_period.next_period() {
                    self.enter_period(next);
                }
            }
            GamePeriod::SecondHalf => {
                self.end_game();
                self.sound_buzzer();
            }
            GamePeriod::PreGame | GamePeriod::GameOver => {
                info!("{} Break is over", self.status_string());
                self.clock.stop();
                self.publish_clock_state();
                self.sound_buzzer();
            }
        }
    }

    fn enter_period(&mut self, period: GamePeriod) {
        self.set_penalties_running(period.penalties_run());
        self.current_period = period;
        if let Some(duration) = period.duration(&self.config) {
            self.clock.set(duration);
        }
        info!("{} Entering {period}", self.status_string());
        self.sound_buzzer();
    }

    fn end_game(&mut self) {
        self.set_penalties_running(false);
        self.current_period = GamePeriod::GameOver;

        info!(
            "{} Ending game {}. Score is {}",
            self.status_string(),
            self.game_number,
            self.scores,
        );

        let now = self.wall_clock.now();
        let actual_game_duration = self.actual_game_duration(now);
        let time_to_next_game = self.time_to_next_game(now);

        let plan = self.delay_ledger.schedule_break(&BreakInputs {
            actual_game_duration,
            expected_game_duration: self.config.expected_game_duration(),
            nominal_break: self.config.nominal_break,
            minimum_break: self.config.minimum_break,
            time_to_next_game,
        });
        self.last_break = Some(plan);

        self.clock.set(plan.duration);
        self.clock.start();
        self.publish_clock_state();
        info!(
            "{} Entering break, time to next game is {:?}",
            self.status_string(),
            plan.duration
        );

        self.current_game_stats.add_end_time(now, self.scores);
        let next_game_number = self.next_game_number();
        let stats = std::mem::replace(
            &mut self.current_game_stats,
            GameStats::new(next_game_number),
        );
        match stats.as_json() {
            Ok(json) => info!("{} Game stats: {json}", self.status_string()),
            Err(e) => error!("Failed to serialize game stats: {e}"),
        }
        self.last_game_stats = Some(stats);

        self.scores = Default::default();
        self.penalties.clear();
    }

    fn actual_game_duration(&self, now: Option<OffsetDateTime>) -> Duration {
        match (self.game_start_time, now) {
            (Some(start), Some(now)) => match (now - start).try_into() {
                Ok(dur) => dur,
                Err(e) => {
                    warn!("Wall clock went backwards during the game ({e}), using tick time");
                    self.game_elapsed
                }
            },
            _ => {
                debug!("Wall clock unavailable, using tick time for the game duration");
                self.game_elapsed
            }
        }
    }

    fn time_to_next_game(&self, now: Option<OffsetDateTime>) -> Option<SignedDuration> {
        if !self.schedule.wallclock_mode_enabled() {
            return None;
        }
        let start_time = self
            .next_game
            .as_ref()
            .and_then(|info| info.start_time)
            .or_else(|| self.schedule.next_match_start(self.game_number));

        match (start_time, now) {
            (Some(start_time), Some(now)) => {
                let time_to_game = start_time - now;
                info!("Next game starts at {start_time}, which is {time_to_game} from now");
                Some(time_to_game)
            }
            (None, _) => {
                warn!("No start time known for the next game, using the delay ledger");
                None
            }
            (_, None) => {
                warn!("Current time is unknown, using the delay ledger");
                None
            }
        }
    }

    pub fn reset_game(&mut self) -> Result<()> {
        if self.current_period != GamePeriod::GameOver {
            return Err(TournamentManagerError::GameNotOver(self.current_period));
        }
        info!("{} Resetting Game", self.status_string());
        self.discard_clock_edit();

        self.current_period = GamePeriod::PreGame;
        self.timeout_state = TimeoutState::None;
        self.team_timeouts_available = BlackWhiteBundle::splat(true);
        self.scores = Default::default();
        self.penalties.clear();
        self.current_game_stats = GameStats::new(self.next_game_number());
        self.game_start_time = None;
        self.game_elapsed = Duration::ZERO;

        self.clock.stop();
        self.clock.set(self.config.half_play_duration);
        self.publish_clock_state();
        Ok(())
    }

    /// Stops the clock so the operator can type a new value
    pub fn begin_clock_edit(&mut self) {
        if self.clock_edit_was_running.is_some() {
            return;
        }
        let was_running = self.clock.stop();
        self.clock_edit_was_running = Some(was_running);
        self.publish_clock_state();
        debug!("{} Starting clock edit", self.status_string());
    }

    /// Sets the displayed clock. If an edit is in progress it is finished, and the clock is
    /// restarted if it was running when the edit began.
    ///
    /// During a ref or penalty shot timeout the game clock is frozen in the timeout, so the new
    /// value is stored there and is restored when the timeout ends.
    pub fn set_game_clock_time(&mut self, clock_time: Duration) {
        match &mut self.timeout_state {
            TimeoutState::Ref(cs) | TimeoutState::PenaltyShot(cs) => {
                cs.set_value_at_pause(clock_time);
                info!(
                    "{} Clock set to {clock_time:?}, resumes when the timeout ends",
                    self.status_string()
                );
            }
            TimeoutState::None | TimeoutState::Team(..) => {
                self.clock.set(clock_time);
                info!("{} Clock set to {clock_time:?}", self.status_string());
            }
        }
        self.finish_clock_edit();
    }

    pub fn cancel_clock_edit(&mut self) {
        debug!("{} Cancelling clock edit", self.status_string());
        self.finish_clock_edit();
    }

    fn finish_clock_edit(&mut self) {
        if let Some(true) = self.clock_edit_was_running.take() {
            self.clock.start();
            self.publish_clock_state();
        }
    }

    fn discard_clock_edit(&mut self) {
        if self.clock_edit_was_running.take().is_some() {
            debug!("{} Discarding open clock edit", self.status_string());
        }
    }

    pub fn generate_snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            current_period: self.current_period,
            secs_in_period: self.game_clock_time().as_secs().try_into().unwrap_or(u32::MAX),
            timeout: self.timeout_snapshot(),
            b_score: self.scores.black,
            w_score: self.scores.white,
            b_penalties: self.penalties.query_outstanding(Color::Black),
            w_penalties: self.penalties.query_outstanding(Color::White),
        }
    }

    fn timeout_snapshot(&self) -> TimeoutSnapshot {
        let secs = self
            .timeout_clock_time()
            .map(|dur| dur.as_secs().try_into().unwrap_or(u16::MAX))
            .unwrap_or(0);
        self.timeout_state
            .kind()
            .map(|kind| kind.as_snapshot(secs))
            .unwrap_or(TimeoutSnapshot::None)
    }

    /// The text shown above the clock
    pub fn status_label(&self) -> String {
        match self.timeout_state {
            TimeoutState::Ref(_) => "TIMEOUT".to_string(),
            _ => self.current_period.to_string(),
        }
    }

    fn set_penalties_running(&mut self, running: bool) {
        for color in enum_iterator::all::<Color>() {
            let result = if running {
                self.penalties.resume_all(color)
            } else {
                self.penalties.pause_all(color)
            };
            if let Err(e) = result {
                warn!(
                    "{} Failed to {} {color} penalties: {e}",
                    self.status_string(),
                    if running { "resume" } else { "pause" }
                );
            }
        }
    }

    fn penalties_should_run(&self) -> bool {
        self.clock.is_running()
            && self.timeout_state == TimeoutState::None
            && self.current_period.penalties_run()
    }

    fn publish_clock_state(&self) {
        let running = self.clock.is_running();
        self.start_stop_tx.send_if_modified(|state| {
            let changed = *state != running;
            *state = running;
            changed
        });
    }

    fn sound_buzzer(&self) {
        info!("{} Sounding buzzer", self.status_string());
        self.buzzer_tx
            .send_modify(|count| *count = count.wrapping_add(1));
    }

    pub fn status_string(&self) -> String {
        let time = self.game_clock_time().as_secs_f64();
        format!(
            "[{:02.0}:{:06.3} {}]",
            (time / 60.0).floor(),
            time % 60.0,
            match self.current_period {
                GamePeriod::PreGame => "PREGAME",
                GamePeriod::FirstHalf => "FRSTHLF",
                GamePeriod::HalfTime => "HLFTIME",
                GamePeriod::SecondHalf => "SCNDHLF",
                GamePeriod::GameOver => "GAMEOVR",
            }
        )
    }
}

impl TournamentManager<PenaltyBook> {
    pub fn start_penalty(&mut self, color: Color, player_number: u8, kind: PenaltyKind) {
        let paused = !self.penalties_should_run();
        info!(
            "{} Starting a {kind:?} penalty for {color} player #{player_number}",
            self.status_string()
        );
        let now = self.wall_clock.now();
        self.current_game_stats.add_penalty(
            self.current_period,
            self.game_clock_time(),
            color,
            player_number,
            kind,
            now,
        );
        self.penalties
            .add(color, Penalty::new(player_number, kind, paused));
    }

    pub fn edit_penalty(
        &mut self,
        old_color: Color,
        index: usize,
        new_color: Color,
        new_player_number: u8,
        new_kind: PenaltyKind,
    ) -> Result<()> {
        self.penalties
            .edit(old_color, index, new_color, new_player_number, new_kind)?;
        Ok(())
    }

    pub fn delete_penalty(&mut self, color: Color, index: usize) -> Result<()> {
        self.penalties.delete(color, index)?;
        Ok(())
    }
}

#[derive(Debug, PartialEq, Eq, Error)]
pub enum TournamentManagerError {
    #[error("Can't start a {0} during {1}")]
    WrongGamePeriod(TimeoutSnapshot, GamePeriod),
    #[error("The {0} team has no more timeouts to use")]
    TooManyTeamTimeouts(Color),
    #[error("Already in a {0}")]
    AlreadyInTimeout(TimeoutSnapshot),
    #[error("Need to be in a timeout to end it")]
    NotInTimeout,
    #[error("Action impossible unless in the Pre Game period")]
    GameInProgress,
    #[error("Can't reset the game during {0}")]
    GameNotOver(GamePeriod),
    #[error("Penalty error: {0}")]
    PenaltyError(#[from] PenaltyError),
}

pub type Result<T> = std::result::Result<T, TournamentManagerError>;
