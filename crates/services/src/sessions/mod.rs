mod progress;
mod service;
mod workflow;

// Public API of the review subsystem.
pub use crate::error::SessionError;
pub use progress::{SessionOutcome, SessionProgressTracker};
pub use service::{ReviewSession, Swipe, SwipeResult};
pub use workflow::ReviewLoopService;
