use std::collections::{HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use engrave_core::model::{Card, CardId, DeckId, ProgressRecord, ProgressStats};
use gateway::RemoteDeckGateway;
use rand::seq::SliceRandom;
use tokio::sync::watch;
use tracing::debug;

use super::progress::SessionProgressTracker;
use crate::error::SessionError;

/// Direction of a swipe on the current card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Swipe {
    /// Knew it.
    Left,
    /// Did not know it.
    Right,
}

impl Swipe {
    #[must_use]
    pub fn is_correct(self) -> bool {
        matches!(self, Swipe::Left)
    }
}

/// What happened when the current card was swiped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwipeResult {
    pub card_id: CardId,
    pub correct: bool,
    /// The card went back to the end of the queue.
    pub requeued: bool,
    pub stats: ProgressStats,
    pub is_complete: bool,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// One pass over a deck's cards, driven by swipes.
///
/// Cards are shown in queue order. With requeueing enabled an incorrect card
/// is put back at the end of the queue and shown again later in the same pass.
/// The pass is complete when the queue is empty.
pub struct ReviewSession {
    deck_id: DeckId,
    cards: Vec<Card>,
    queue: VecDeque<usize>,
    tracker: SessionProgressTracker,
    requeue_incorrect: bool,
    started_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl ReviewSession {
    /// Create a session over `cards`, seeding progress from `history`.
    ///
    /// Cards repeating an earlier id are dropped. An empty deck yields a
    /// session that is already complete.
    #[must_use]
    pub fn new(
        gateway: Arc<dyn RemoteDeckGateway>,
        deck_id: DeckId,
        cards: Vec<Card>,
        history: &[ProgressRecord],
        started_at: DateTime<Utc>,
    ) -> Self {
        let mut seen = HashSet::new();
        let cards: Vec<Card> = cards
            .into_iter()
            .filter(|card| {
                let fresh = seen.insert(card.id().clone());
                if !fresh {
                    debug!(card_id = %card.id(), "dropping duplicate card");
                }
                fresh
            })
            .collect();

        let tracker = SessionProgressTracker::new(
            gateway,
            deck_id.clone(),
            cards.iter().map(|card| card.id().clone()),
            history,
        );
        let queue = (0..cards.len()).collect();
        let completed_at = cards.is_empty().then_some(started_at);

        Self {
            deck_id,
            cards,
            queue,
            tracker,
            requeue_incorrect: false,
            started_at,
            completed_at,
        }
    }

    #[must_use]
    pub fn with_requeue_incorrect(mut self, requeue: bool) -> Self {
        self.requeue_incorrect = requeue;
        self
    }

    pub(crate) fn shuffle_queue(&mut self) {
        self.queue.make_contiguous().shuffle(&mut rand::rng());
    }

    #[must_use]
    pub fn deck_id(&self) -> &DeckId {
        &self.deck_id
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completed_at.is_some()
    }

    /// Total number of distinct cards in the deck.
    #[must_use]
    pub fn total_cards(&self) -> usize {
        self.cards.len()
    }

    /// Cards still waiting to be shown, requeued ones included.
    #[must_use]
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    #[must_use]
    pub fn stats(&self) -> ProgressStats {
        self.tracker.stats()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ProgressStats> {
        self.tracker.subscribe()
    }

    #[must_use]
    pub fn tracker(&self) -> &SessionProgressTracker {
        &self.tracker
    }

    #[must_use]
    pub fn current_card(&self) -> Option<&Card> {
        self.queue.front().and_then(|idx| self.cards.get(*idx))
    }

    /// Judge the current card and move on.
    ///
    /// `swiped_at` should come from the services layer clock.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Completed` if no card is left to swipe.
    pub fn swipe(
        &mut self,
        swipe: Swipe,
        swiped_at: DateTime<Utc>,
    ) -> Result<SwipeResult, SessionError> {
        let Some(idx) = self.queue.pop_front() else {
            return Err(SessionError::Completed);
        };
        let card_id = self
            .cards
            .get(idx)
            .map(|card| card.id().clone())
            .ok_or(SessionError::Completed)?;

        let correct = swipe.is_correct();
        let stats = self.tracker.record_outcome(&card_id, correct);

        let requeued = !correct && self.requeue_incorrect;
        if requeued {
            self.queue.push_back(idx);
        }
        if self.queue.is_empty() {
            self.completed_at = Some(swiped_at);
            debug!(deck_id = %self.deck_id, "review pass complete");
        }

        Ok(SwipeResult {
            card_id,
            correct,
            requeued,
            stats,
            is_complete: self.is_complete(),
        })
    }

    /// Wait for pending saves and return the final stats.
    pub async fn finish(mut self) -> ProgressStats {
        self.tracker.flush().await;
        self.tracker.stats()
    }

    /// Leave the session now; saves still in flight are abandoned.
    pub fn dismiss(self) {
        debug!(
            deck_id = %self.deck_id,
            pending_saves = self.tracker.pending_saves(),
            "review session dismissed"
        );
    }
}

impl fmt::Debug for ReviewSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReviewSession")
            .field("deck_id", &self.deck_id)
            .field("cards_len", &self.cards.len())
            .field("queued", &self.queue.len())
            .field("requeue_incorrect", &self.requeue_incorrect)
            .field("started_at", &self.started_at)
            .field("completed_at", &self.completed_at)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
