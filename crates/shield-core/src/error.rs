//! Pipeline error taxonomy (spec §7). Only [`ShieldError::Config`] is
//! process-fatal; every other variant is scoped to a single attack or a
//! single transport attempt and the pipeline continues past it.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ShieldError {
    /// Missing section/option or unparsable config value. Fatal at startup.
    #[error("configuration error: {0}")]
    Config(String),

    /// Missing/unreadable file, empty file, invalid CSV line. Abandons the
    /// current attack; the pipeline continues.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A generated HSPL/MSPL set failed its schema validation. Fatal for
    /// that attack; surfaced upward.
    #[error("invalid policy XML: {0}")]
    InvalidPolicyXml(#[from] shield_policy::PolicyError),

    /// Recipe selection returned no match. Not an error condition: callers
    /// should log at info level and emit nothing for the attack.
    #[error("no recipe matches this attack")]
    NoRecipe,

    /// No `(plugin, node)` pair satisfies the HSPL action. Treated upstream
    /// as NoRecipe-equivalent (spec §7).
    #[error("no enforcement node can satisfy this HSPL set")]
    NoEnforcer,

    /// A broker/HTTP publish failed after the configured retry budget.
    /// Logged at critical level; the pipeline continues.
    #[error("transport error: {0}")]
    Transport(String),

    /// A CSV/line-level ingestion parse failure.
    #[error("parse error: {0}")]
    Parse(String),
}

pub type Result<T> = std::result::Result<T, ShieldError>;

impl From<csv::Error> for ShieldError {
    fn from(err: csv::Error) -> Self {
        ShieldError::Parse(err.to_string())
    }
}

impl From<toml::de::Error> for ShieldError {
    fn from(err: toml::de::Error) -> Self {
        ShieldError::Config(err.to_string())
    }
}

impl From<reqwest::Error> for ShieldError {
    fn from(err: reqwest::Error) -> Self {
        ShieldError::Transport(err.to_string())
    }
}

impl From<notify::Error> for ShieldError {
    fn from(err: notify::Error) -> Self {
        ShieldError::Io(std::io::Error::other(err))
    }
}
