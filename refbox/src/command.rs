use crate::tournament_manager::{TimeoutKind, penalty::PenaltyKind};
use std::{str::FromStr, time::Duration};
use thiserror::Error;
use uwh_common::color::Color;

/// One line typed by the operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Press the main button, optionally asking for a timeout
    Button(Option<TimeoutKind>),
    BeginEdit,
    EditClock(Duration),
    CancelEdit,
    Score(Color, Option<u8>),
    Penalty(Color, u8, PenaltyKind),
    Status,
    Quit,
}

#[derive(Debug, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Unknown command `{0}`")]
    Unknown(String),
    #[error("Missing the {0}")]
    MissingArgument(&'static str),
    #[error("`{0}` is not a valid {1}")]
    InvalidArgument(String, &'static str),
    #[error("Unexpected extra input `{0}`")]
    TrailingInput(String),
}

fn parse_color(word: &str) -> Result<Color, CommandError> {
    match word.to_ascii_lowercase().as_str() {
        "b" | "black" => Ok(Color::Black),
        "w" | "white" => Ok(Color::White),
        _ => Err(CommandError::InvalidArgument(word.to_string(), "team color")),
    }
}

fn parse_timeout(word: &str) -> Result<TimeoutKind, CommandError> {
    match word.to_ascii_lowercase().as_str() {
        "ref" => Ok(TimeoutKind::Ref),
        "shot" => Ok(TimeoutKind::PenaltyShot),
        _ => parse_color(word)
            .map(TimeoutKind::Team)
            .map_err(|_| CommandError::InvalidArgument(word.to_string(), "timeout kind")),
    }
}

fn parse_player(word: &str) -> Result<u8, CommandError> {
    word.parse()
        .map_err(|_| CommandError::InvalidArgument(word.to_string(), "player number"))
}

fn parse_penalty_kind(word: &str) -> Result<PenaltyKind, CommandError> {
    match word.to_ascii_lowercase().as_str() {
        "30s" => Ok(PenaltyKind::ThirtySecond),
        "1m" => Ok(PenaltyKind::OneMinute),
        "2m" => Ok(PenaltyKind::TwoMinute),
        "4m" => Ok(PenaltyKind::FourMinute),
        "5m" => Ok(PenaltyKind::FiveMinute),
        "td" => Ok(PenaltyKind::TotalDismissal),
        _ => Err(CommandError::InvalidArgument(
            word.to_string(),
            "penalty kind",
        )),
    }
}

/// Accepts `m:ss` or a plain number of seconds
fn parse_clock_time(word: &str) -> Result<Duration, CommandError> {
    let invalid = || CommandError::InvalidArgument(word.to_string(), "clock time");
    let secs = match word.split_once(':') {
        Some((mins, secs)) => {
            let mins: u64 = mins.parse().map_err(|_| invalid())?;
            let secs: u64 = secs.parse().map_err(|_| invalid())?;
            if secs >= 60 {
                return Err(invalid());
            }
            mins.checked_mul(60)
                .and_then(|mins| mins.checked_add(secs))
                .ok_or_else(invalid)?
        }
        None => word.parse().map_err(|_| invalid())?,
    };
    Ok(Duration::from_secs(secs))
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut words = s.split_whitespace();
        // A blank line is a press of the main button
        let Some(name) = words.next() else {
            return Ok(Command::Button(None));
        };

        let command = match name.to_ascii_lowercase().as_str() {
            "button" | "press" => {
                Command::Button(words.next().map(parse_timeout).transpose()?)
            }
            "edit" => match words.next() {
                Some(time) => Command::EditClock(parse_clock_time(time)?),
                None => Command::BeginEdit,
            },
            "cancel" => Command::CancelEdit,
            "score" => {
                let color = parse_color(
                    words
                        .next()
                        .ok_or(CommandError::MissingArgument("team color"))?,
                )?;
                Command::Score(color, words.next().map(parse_player).transpose()?)
            }
            "pen" | "penalty" => {
                let color = parse_color(
                    words
                        .next()
                        .ok_or(CommandError::MissingArgument("team color"))?,
                )?;
                let player = parse_player(
                    words
                        .next()
                        .ok_or(CommandError::MissingArgument("player number"))?,
                )?;
                let kind = words
                    .next()
                    .map(parse_penalty_kind)
                    .transpose()?
                    .unwrap_or_default();
                Command::Penalty(color, player, kind)
            }
            "status" => Command::Status,
            "quit" | "exit" => Command::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };

        match words.next() {
            Some(extra) => Err(CommandError::TrailingInput(extra.to_string())),
            None => Ok(command),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_parse_button() {
        assert_eq!("button".parse(), Ok(Command::Button(None)));
        assert_eq!(
            "press ref".parse(),
            Ok(Command::Button(Some(TimeoutKind::Ref)))
        );
        assert_eq!(
            "button shot".parse(),
            Ok(Command::Button(Some(TimeoutKind::PenaltyShot)))
        );
        assert_eq!(
            "button W".parse(),
            Ok(Command::Button(Some(TimeoutKind::Team(Color::White))))
        );
        assert_eq!(
            "button green".parse::<Command>(),
            Err(CommandError::InvalidArgument(
                "green".to_string(),
                "timeout kind"
            ))
        );
    }

    #[test]
    fn test_parse_edit() {
        assert_eq!("edit".parse(), Ok(Command::BeginEdit));
        assert_eq!(
            "edit 4:05".parse(),
            Ok(Command::EditClock(Duration::from_secs(245)))
        );
        assert_eq!(
            "edit 90".parse(),
            Ok(Command::EditClock(Duration::from_secs(90)))
        );
        assert!("edit 4:75".parse::<Command>().is_err());
        assert_eq!(
            "edit 307445734561825861:00".parse::<Command>(),
            Err(CommandError::InvalidArgument(
                "307445734561825861:00".to_string(),
                "clock time"
            ))
        );
        assert_eq!("cancel".parse(), Ok(Command::CancelEdit));
    }

    #[test]
    fn test_parse_score_and_penalty() {
        assert_eq!(
            "score black 7".parse(),
            Ok(Command::Score(Color::Black, Some(7)))
        );
        assert_eq!("score w".parse(), Ok(Command::Score(Color::White, None)));
        assert_eq!(
            "pen w 12 td".parse(),
            Ok(Command::Penalty(
                Color::White,
                12,
                PenaltyKind::TotalDismissal
            ))
        );
        assert_eq!(
            "pen b 3".parse(),
            Ok(Command::Penalty(Color::Black, 3, PenaltyKind::OneMinute))
        );
        assert_eq!(
            "pen b".parse::<Command>(),
            Err(CommandError::MissingArgument("player number"))
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("  ".parse(), Ok(Command::Button(None)));
        assert_eq!(
            "jump".parse::<Command>(),
            Err(CommandError::Unknown("jump".to_string()))
        );
        assert_eq!(
            "quit now".parse::<Command>(),
            Err(CommandError::TrailingInput("now".to_string()))
        );
        assert_eq!("status".parse(), Ok(Command::Status));
    }
}
