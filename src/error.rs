use thiserror::Error;

/// Startup configuration problems. The bot refuses to run with any of these.
#[derive(Error, Debug, PartialEq)]
pub enum ConfigError {
    #[error("{key}: cannot parse {value:?}")]
    Parse { key: &'static str, value: String },

    #[error("{key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

/// Failures of the remote sound generator. Callers log these and move on.
#[derive(Error, Debug)]
pub enum SfxError {
    #[error("sound request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("sound generator answered {0}")]
    Status(reqwest::StatusCode),

    #[error("{0} is already being generated")]
    InFlight(String),
}
