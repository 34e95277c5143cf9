//! Error types for the bot steps

use std::path::PathBuf;
use thiserror::Error;

/// Result type for buildbot operations
pub type BotResult<T> = Result<T, BotError>;

#[derive(Debug, Error)]
pub enum BotError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Neither `BUILDBOT_BUILDERNAME` nor `--name` was given
    #[error("Use -n $BUILDBOT_NAME for the bot you would like to emulate.")]
    MissingBuilderName,

    /// Builder system differs from the host
    #[error("You cannot emulate a buildbot with a platform different from your own ({system} on {host}).")]
    PlatformMismatch { system: String, host: String },

    /// Command could not be started at all
    #[error("Failed to run {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// Unknown clobber mode, arch or os
    #[error("Unknown {kind} {value}")]
    UnknownOption { kind: &'static str, value: String },

    #[error("Directory not found: {0}")]
    MissingDirectory(PathBuf),
}

impl BotError {
    pub fn unknown_option(kind: &'static str, value: impl Into<String>) -> Self {
        Self::UnknownOption {
            kind,
            value: value.into(),
        }
    }
}
