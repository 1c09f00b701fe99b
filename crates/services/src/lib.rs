#![forbid(unsafe_code)]

pub mod app_services;
pub mod deck_service;
pub mod error;
pub mod sentence_service;
pub mod sessions;

pub use engrave_core::Clock;

pub use app_services::{AppServices, ReviewOptions};
pub use deck_service::DeckService;
pub use error::{
    AppServicesError, DeckServiceError, FetchFailure, FetchTarget, SentenceError, SessionError,
};
pub use sentence_service::{SentenceConfig, SentenceService};
pub use sessions::{
    ReviewLoopService, ReviewSession, SessionOutcome, SessionProgressTracker, Swipe, SwipeResult,
};
