//! Error types for the engine.
//!
//! Every failure the engine can see is recovered locally: playback-start
//! failures leave the player paused, metadata and artwork failures are
//! logged and absorbed. These types exist so the recovery sites can log
//! something precise.

use radio_proto::protocol::PlayerId;

pub type Result<T> = std::result::Result<T, DeckError>;

/// Coordinator-level errors.
#[derive(Debug, thiserror::Error)]
pub enum DeckError {
    #[error("player `{0}` is already registered")]
    DuplicatePlayer(PlayerId),

    #[error("unknown player `{0}`")]
    UnknownPlayer(PlayerId),

    /// Setup could not wire the player; it stays inert.
    #[error("player `{id}` is missing {what}")]
    MissingWiring { id: PlayerId, what: &'static str },

    #[error("playback failed to start for `{id}`: {source}")]
    PlaybackStart {
        id: PlayerId,
        #[source]
        source: PlaybackError,
    },
}

/// Raised by a [`MediaElement`](crate::media::MediaElement) that cannot start.
#[derive(Debug, Clone, thiserror::Error)]
pub enum PlaybackError {
    #[error("no stream is bound to the media element")]
    NoSource,

    #[error("playback blocked: {0}")]
    Blocked(String),

    #[error("media backend error: {0}")]
    Backend(String),
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum AnalyzerError {
    #[error("media element exposes no audio tap")]
    NoAudioTap,

    #[error("audio analysis unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    #[error("metadata request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("metadata endpoint returned status {0}")]
    Status(u16),

    #[error("metadata payload is not JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum LookupError {
    #[error("lookup request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("lookup service returned status {0}")]
    Status(u16),
}
