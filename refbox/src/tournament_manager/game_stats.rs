use super::{Color, GamePeriod, PenaltyKind};
use serde::Serialize;
use std::time::Duration;
use time::{
    OffsetDateTime,
    format_description::well_known::{Iso8601, iso8601},
};
use uwh_common::bundles::BlackWhiteBundle;

const CONFIG: iso8601::EncodedConfig = iso8601::Config::DEFAULT
    .set_year_is_six_digits(false)
    .encode();
const FORMAT: Iso8601<CONFIG> = Iso8601::<CONFIG>;
time::serde::format_description!(iso8601_short_year, OffsetDateTime, FORMAT);

/// A record of one game, kept for the log after the game is over
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GameStats {
    #[serde(rename = "gameNumber")]
    game_number: u32,
    #[serde(with = "iso8601_short_year::option")]
    #[serde(rename = "startedOn")]
    start_timestamp: Option<OffsetDateTime>,
    #[serde(with = "iso8601_short_year::option")]
    #[serde(rename = "endedOn")]
    end_timestamp: Option<OffsetDateTime>,
    #[serde(rename = "finalScore")]
    final_score: BlackWhiteBundle<u8>,
    events: Vec<Event>,
}

impl GameStats {
    pub fn new(game_number: u32) -> Self {
        Self {
            game_number,
            start_timestamp: None,
            end_timestamp: None,
            final_score: BlackWhiteBundle::default(),
            events: Vec::new(),
        }
    }

    pub fn game_number(&self) -> u32 {
        self.game_number
    }

    pub fn goal_count(&self) -> usize {
        self.events
            .iter()
            .filter(|event| matches!(event, Event::Goal { .. }))
            .count()
    }

    pub fn penalty_count(&self) -> usize {
        self.events
            .iter()
            .filter(|event| matches!(event, Event::Penalty { .. }))
            .count()
    }

    pub fn final_score(&self) -> BlackWhiteBundle<u8> {
        self.final_score
    }

    pub fn add_start_time(&mut self, now: Option<OffsetDateTime>) {
        self.start_timestamp = now;
    }

    pub fn add_end_time(
        &mut self,
        now: Option<OffsetDateTime>,
        final_score: BlackWhiteBundle<u8>,
    ) {
        self.end_timestamp = now;
        self.final_score = final_score;
    }

    pub fn add_goal(
        &mut self,
        period: GamePeriod,
        time_left_in_period: Duration,
        color: Color,
        player_num: Option<u8>,
        now: Option<OffsetDateTime>,
    ) {
        self.events.push(Event::Goal {
            player_cap_number: player_num,
            side: side_name(color),
            game_period: period,
            period_time: time_left_in_period.as_secs_f32(),
            occurred_on: now,
        });
    }

    pub fn add_penalty(
        &mut self,
        period: GamePeriod,
        time_left_in_period: Duration,
        color: Color,
        player_num: u8,
        kind: PenaltyKind,
        now: Option<OffsetDateTime>,
    ) {
        self.events.push(Event::Penalty {
            player_cap_number: player_num,
            side: side_name(color),
            game_period: period,
            period_time: time_left_in_period.as_secs_f32(),
            occurred_on: now,
            duration: kind.as_duration().map(|dur| dur.as_secs()),
            is_total_dismissal: kind == PenaltyKind::TotalDismissal,
        });
    }

    pub fn as_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

fn side_name(color: Color) -> String {
    match color {
        Color::Black => "dark".to_string(),
        Color::White => "light".to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "$type")]
enum Event {
    #[serde(rename = "goal")]
    Goal {
        #[serde(rename = "playerCapNumber")]
        player_cap_number: Option<u8>,
        side: String,
        #[serde(rename = "gamePeriod")]
        game_period: GamePeriod,
        #[serde(rename = "periodTime")]
        period_time: f32,
        #[serde(with = "iso8601_short_year::option")]
        #[serde(rename = "occurredOn")]
        occurred_on: Option<OffsetDateTime>,
    },
    #[serde(rename = "penalty")]
    Penalty {
        #[serde(rename = "playerCapNumber")]
        player_cap_number: u8,
        side: String,
        #[serde(rename = "gamePeriod")]
        game_period: GamePeriod,
        #[serde(rename = "periodTime")]
        period_time: f32,
        #[serde(with = "iso8601_short_year::option")]
        #[serde(rename = "occurredOn")]
        occurred_on: Option<OffsetDateTime>,
        duration: Option<u64>,
        #[serde(rename = "isTotalDismissal")]
        is_total_dismissal: bool,
    },
}
