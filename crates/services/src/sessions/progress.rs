use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use engrave_core::model::{CardId, DeckId, ProgressBoard, ProgressRecord, ProgressStats};
use gateway::RemoteDeckGateway;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// One judgment made during the current pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionOutcome {
    pub card_id: CardId,
    pub correct: bool,
}

/// Background writer that sends saves to the gateway one at a time, in the
/// order they were queued.
struct SaveQueue {
    sender: mpsc::UnboundedSender<SessionOutcome>,
    worker: JoinHandle<()>,
}

/// Running correct/incorrect/remaining summary for one review pass.
///
/// Seeded from the backend's history, then advanced by `record_outcome`. Each
/// card moves the aggregate at most once per pass; every outcome, repeats
/// included, is still saved to the gateway. Saves run in the background in
/// swipe order and their failures are logged, never reflected in the stats.
///
/// Dropping the tracker abandons saves that are still queued or in flight.
pub struct SessionProgressTracker {
    gateway: Arc<dyn RemoteDeckGateway>,
    deck_id: DeckId,
    board: ProgressBoard,
    outcomes: Vec<SessionOutcome>,
    scored: HashSet<CardId>,
    saves: Option<SaveQueue>,
    pending: Arc<AtomicUsize>,
    notifier: watch::Sender<ProgressStats>,
}

impl SessionProgressTracker {
    #[must_use]
    pub fn new(
        gateway: Arc<dyn RemoteDeckGateway>,
        deck_id: DeckId,
        card_ids: impl IntoIterator<Item = CardId>,
        history: &[ProgressRecord],
    ) -> Self {
        let board = ProgressBoard::seeded(card_ids, history);
        let (notifier, _) = watch::channel(board.stats());
        Self {
            gateway,
            deck_id,
            board,
            outcomes: Vec::new(),
            scored: HashSet::new(),
            saves: None,
            pending: Arc::new(AtomicUsize::new(0)),
            notifier,
        }
    }

    #[must_use]
    pub fn deck_id(&self) -> &DeckId {
        &self.deck_id
    }

    #[must_use]
    pub fn stats(&self) -> ProgressStats {
        self.board.stats()
    }

    /// Every outcome recorded this pass, in order.
    #[must_use]
    pub fn outcomes(&self) -> &[SessionOutcome] {
        &self.outcomes
    }

    /// True if the card has already been judged during this pass.
    #[must_use]
    pub fn has_scored(&self, card_id: &CardId) -> bool {
        self.scored.contains(card_id)
    }

    /// Receiver that always holds the latest stats.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<ProgressStats> {
        self.notifier.subscribe()
    }

    /// Saves queued or in flight.
    #[must_use]
    pub fn pending_saves(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }

    /// Record a judgment for `card_id` and return the resulting stats.
    ///
    /// Unknown cards leave the aggregate untouched but are still logged and saved.
    pub fn record_outcome(&mut self, card_id: &CardId, correct: bool) -> ProgressStats {
        let outcome = SessionOutcome {
            card_id: card_id.clone(),
            correct,
        };
        self.outcomes.push(outcome.clone());
        self.queue_save(outcome);

        if !self.scored.insert(card_id.clone()) {
            debug!(card_id = %card_id, "card already scored this pass");
            return self.board.stats();
        }

        match self.board.classify(card_id, correct) {
            Some(stats) => {
                self.notifier.send_replace(stats);
            }
            None => debug!(card_id = %card_id, deck_id = %self.deck_id, "outcome for unknown card"),
        }
        self.board.stats()
    }

    /// Wait until every queued save has been sent.
    pub async fn flush(&mut self) {
        let Some(SaveQueue { sender, worker }) = self.saves.take() else {
            return;
        };
        drop(sender);
        if let Err(err) = worker.await {
            warn!(error = %err, "progress save worker did not complete");
        }
    }

    fn queue_save(&mut self, outcome: SessionOutcome) {
        if self.saves.is_none() {
            let Ok(handle) = Handle::try_current() else {
                warn!(card_id = %outcome.card_id, "no async runtime; progress not saved");
                return;
            };
            self.saves = Some(self.start_worker(&handle));
        }
        let Some(queue) = &self.saves else {
            return;
        };

        self.pending.fetch_add(1, Ordering::SeqCst);
        if let Err(mpsc::error::SendError(lost)) = queue.sender.send(outcome) {
            self.pending.fetch_sub(1, Ordering::SeqCst);
            warn!(card_id = %lost.card_id, "progress save worker is gone; progress not saved");
        }
    }

    fn start_worker(&self, handle: &Handle) -> SaveQueue {
        let (sender, mut receiver) = mpsc::unbounded_channel::<SessionOutcome>();
        let gateway = Arc::clone(&self.gateway);
        let deck_id = self.deck_id.clone();
        let pending = Arc::clone(&self.pending);

        let worker = handle.spawn(async move {
            while let Some(SessionOutcome { card_id, correct }) = receiver.recv().await {
                if let Err(err) = gateway.save_progress(&deck_id, &card_id, correct).await {
                    warn!(
                        deck_id = %deck_id,
                        card_id = %card_id,
                        error = %err,
                        "failed to save progress"
                    );
                }
                pending.fetch_sub(1, Ordering::SeqCst);
            }
        });
        SaveQueue { sender, worker }
    }
}

impl Drop for SessionProgressTracker {
    fn drop(&mut self) {
        if let Some(queue) = self.saves.take() {
            queue.worker.abort();
        }
    }
}

impl fmt::Debug for SessionProgressTracker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionProgressTracker")
            .field("deck_id", &self.deck_id)
            .field("stats", &self.board.stats())
            .field("outcomes_len", &self.outcomes.len())
            .field("pending_saves", &self.pending_saves())
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
