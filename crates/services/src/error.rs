//! Shared error types for the services crate.

use gateway::GatewayError;
use thiserror::Error;

/// What the user was waiting for when a fetch failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchTarget {
    Decks,
    Cards,
    Progress,
}

impl FetchTarget {
    /// Message that can be shown to the user as-is.
    #[must_use]
    pub fn user_message(self) -> &'static str {
        match self {
            FetchTarget::Decks => "Could not load decks. Check your connection and try again.",
            FetchTarget::Cards => "Could not load this deck. Check your connection and try again.",
            FetchTarget::Progress => {
                "Could not load your progress. Check your connection and try again."
            }
        }
    }
}

/// A failed fetch, carrying a message that can be shown as-is.
///
/// Fetches are never retried automatically; the caller offers a retry.
#[derive(Debug, Error)]
#[error("{}", .target.user_message())]
pub struct FetchFailure {
    pub target: FetchTarget,
    pub source: GatewayError,
}

impl FetchFailure {
    #[must_use]
    pub fn new(target: FetchTarget, source: GatewayError) -> Self {
        Self { target, source }
    }

    #[must_use]
    pub fn user_message(&self) -> &'static str {
        self.target.user_message()
    }
}

/// Errors emitted by `SentenceService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SentenceError {
    #[error("sentence generation is not configured")]
    Disabled,
    #[error("sentence generation returned an empty response")]
    EmptyResponse,
    #[error("sentence generation failed with status {0}")]
    HttpStatus(reqwest::StatusCode),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
}

/// Errors emitted by `DeckService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DeckServiceError {
    #[error("word cannot be empty")]
    EmptyWord,
    #[error("\"{0}\" is already in this deck")]
    DuplicateWord(String),
    #[error(transparent)]
    Fetch(#[from] FetchFailure),
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}

/// Errors emitted by review sessions.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("session already completed")]
    Completed,
    #[error(transparent)]
    Fetch(#[from] FetchFailure),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error("no backend configured; set ENGRAVE_BACKEND_URL or pass --backend")]
    MissingBackend,
    #[error(transparent)]
    Gateway(#[from] GatewayError),
}
