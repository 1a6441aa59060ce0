use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;
use crate::quiz::catalog::QuestionCatalog;
use crate::quiz::media::PlayerConfig;
use crate::quiz::session::SessionConfig;
use crate::quiz::timeline::TimelineConfig;

#[derive(Debug, Clone, PartialEq)]
pub struct SfxSettings {
    pub endpoint: String,
    pub api_key: String,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub session: SessionConfig,
    pub timeline: TimelineConfig,
    pub player: PlayerConfig,
    /// A chat's session is closed after this long without a command.
    pub idle_timeout: Option<Duration>,
    /// `None` keeps the bot silent.
    pub sfx: Option<SfxSettings>,
}

impl Settings {
    /// Reads the process environment (after `.env` has been loaded).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let tolerance: f64 = parse_or(&lookup, "QUIZ_TOLERANCE_SECS", 0.02)?;
        if !(0.0..=0.25).contains(&tolerance) {
            return Err(invalid("QUIZ_TOLERANCE_SECS", "must be between 0 and 0.25 seconds"));
        }

        let fallback = millis_or(&lookup, "QUIZ_FALLBACK_MS", 500)?;
        let end_fallback = millis_or(&lookup, "QUIZ_FINALE_FALLBACK_MS", 2000)?;
        let watchdog_grace = millis_or(&lookup, "QUIZ_WATCHDOG_GRACE_MS", 1500)?;
        let fade = millis_or(&lookup, "QUIZ_FADE_MS", 200)?;

        let duration: f64 = parse_or(&lookup, "QUIZ_VIDEO_DURATION_SECS", 4.5)?;
        if !(duration > 0.0) {
            return Err(invalid("QUIZ_VIDEO_DURATION_SECS", "must be positive"));
        }
        let tick = millis_or(&lookup, "QUIZ_TICK_MS", 250)?;
        if tick.is_zero() {
            return Err(invalid("QUIZ_TICK_MS", "must be positive"));
        }
        let autoplay_blocked: bool = parse_or(&lookup, "QUIZ_AUTOPLAY_BLOCKED", false)?;
        let idle_secs: u64 = parse_or(&lookup, "QUIZ_SESSION_IDLE_SECS", 1800)?;

        let door_marks = match lookup("QUIZ_DOOR_MARKS") {
            Some(raw) => parse_marks(&raw)?,
            None => SessionConfig::default().door_marks,
        };
        validate_marks(&door_marks, duration)?;

        let sfx = match (lookup("SFX_ENDPOINT"), lookup("SFX_API_KEY")) {
            (Some(endpoint), Some(api_key)) if !endpoint.is_empty() => Some(SfxSettings { endpoint, api_key }),
            (Some(endpoint), None) if !endpoint.is_empty() => {
                return Err(invalid("SFX_API_KEY", "required when SFX_ENDPOINT is set"))
            }
            _ => None,
        };

        Ok(Self {
            session: SessionConfig {
                door_marks,
                tolerance,
                fade,
            },
            timeline: TimelineConfig {
                fallback,
                end_fallback,
                watchdog_grace: (!watchdog_grace.is_zero()).then_some(watchdog_grace),
            },
            player: PlayerConfig {
                duration,
                tick,
                autoplay_blocked,
            },
            idle_timeout: (idle_secs > 0).then(|| Duration::from_secs(idle_secs)),
            sfx,
        })
    }
}

fn invalid(key: &'static str, reason: &str) -> ConfigError {
    ConfigError::Invalid {
        key,
        reason: reason.to_string(),
    }
}

fn parse_or<T, F>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Parse { key, value: raw }),
        None => Ok(default),
    }
}

fn millis_or<F>(lookup: &F, key: &'static str, default: u64) -> Result<Duration, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    parse_or(lookup, key, default).map(Duration::from_millis)
}

fn parse_marks(raw: &str) -> Result<Vec<f64>, ConfigError> {
    raw.split(',')
        .map(|mark| {
            mark.trim().parse::<f64>().map_err(|_| ConfigError::Parse {
                key: "QUIZ_DOOR_MARKS",
                value: raw.to_string(),
            })
        })
        .collect()
}

fn validate_marks(marks: &[f64], duration: f64) -> Result<(), ConfigError> {
    let expected = QuestionCatalog::standard().count();
    if marks.len() != expected {
        return Err(ConfigError::Invalid {
            key: "QUIZ_DOOR_MARKS",
            reason: format!("expected {} marks, got {}", expected, marks.len()),
        });
    }
    if marks.first().map_or(false, |first| *first <= 0.0) {
        return Err(invalid("QUIZ_DOOR_MARKS", "marks must be after the first frame"));
    }
    if marks.windows(2).any(|pair| pair[0] >= pair[1]) {
        return Err(invalid("QUIZ_DOOR_MARKS", "marks must be strictly increasing"));
    }
    if marks.last().map_or(false, |last| *last >= duration) {
        return Err(invalid("QUIZ_DOOR_MARKS", "marks must lie inside the video"));
    }
    Ok(())
}
