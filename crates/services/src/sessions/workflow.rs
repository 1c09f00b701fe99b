use std::sync::Arc;

use engrave_core::Clock;
use engrave_core::model::DeckId;
use gateway::RemoteDeckGateway;
use tracing::debug;

use super::service::{ReviewSession, Swipe, SwipeResult};
use crate::error::{FetchFailure, FetchTarget, SessionError};

/// Starts review passes from the gateway and stamps swipes with the clock.
#[derive(Clone)]
pub struct ReviewLoopService {
    clock: Clock,
    gateway: Arc<dyn RemoteDeckGateway>,
    shuffle: bool,
    requeue_incorrect: bool,
}

impl ReviewLoopService {
    #[must_use]
    pub fn new(clock: Clock, gateway: Arc<dyn RemoteDeckGateway>) -> Self {
        Self {
            clock,
            gateway,
            shuffle: false,
            requeue_incorrect: false,
        }
    }

    #[must_use]
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    #[must_use]
    pub fn with_requeue_incorrect(mut self, requeue: bool) -> Self {
        self.requeue_incorrect = requeue;
        self
    }

    /// Fetch the deck's cards and history and open a pass over them.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Fetch` if either fetch fails; nothing is retried.
    pub async fn start_session(&self, deck_id: &DeckId) -> Result<ReviewSession, SessionError> {
        let cards = self
            .gateway
            .fetch_cards(deck_id)
            .await
            .map_err(|e| FetchFailure::new(FetchTarget::Cards, e))?;
        let history = self
            .gateway
            .fetch_progress(deck_id)
            .await
            .map_err(|e| FetchFailure::new(FetchTarget::Progress, e))?;

        debug!(
            deck_id = %deck_id,
            cards = cards.len(),
            history = history.len(),
            "starting review pass"
        );

        let mut session = ReviewSession::new(
            Arc::clone(&self.gateway),
            deck_id.clone(),
            cards,
            &history,
            self.clock.now(),
        )
        .with_requeue_incorrect(self.requeue_incorrect);
        if self.shuffle {
            session.shuffle_queue();
        }
        Ok(session)
    }

    /// Swipe the current card of `session`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` if the pass is over.
    pub fn swipe(
        &self,
        session: &mut ReviewSession,
        swipe: Swipe,
    ) -> Result<SwipeResult, SessionError> {
        session.swipe(swipe, self.clock.now())
    }
}
