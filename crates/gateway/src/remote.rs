use async_trait::async_trait;
use chrono::{DateTime, Utc};
use engrave_core::Clock;
use engrave_core::model::{Card, CardError, CardId, Deck, DeckError, DeckId, ProgressRecord};
use engrave_core::scheduler::WordSchedule;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

/// Errors surfaced by gateway adapters.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum GatewayError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("backend rejected the call: {message}")]
    Remote { message: String },

    #[error("transport error: {0}")]
    Transport(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error(transparent)]
    Card(#[from] CardError),

    #[error(transparent)]
    Deck(#[from] DeckError),
}

/// Request to add a word to a deck.
///
/// Fields left as `None` are generated by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCardRequest {
    pub word: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sentence: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translated_sentence: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub translated_word: Option<String>,
}

impl NewCardRequest {
    #[must_use]
    pub fn word(word: impl Into<String>) -> Self {
        Self {
            word: word.into().trim().to_owned(),
            language: None,
            sentence: None,
            translated_sentence: None,
            translated_word: None,
        }
    }
}

/// Operations the managed backend exposes for decks, cards and progress.
///
/// All business state lives behind this trait; clients only hold what a call
/// returned.
#[async_trait]
pub trait RemoteDeckGateway: Send + Sync {
    /// List the decks available to the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` if the backend cannot be reached or replies with garbage.
    async fn fetch_decks(&self) -> Result<Vec<Deck>, GatewayError>;

    /// Fetch a deck's cards in presentation order.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::NotFound` for an unknown deck, or other gateway errors.
    async fn fetch_cards(&self, deck_id: &DeckId) -> Result<Vec<Card>, GatewayError>;

    /// Fetch previously saved outcomes for a deck.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::NotFound` for an unknown deck, or other gateway errors.
    async fn fetch_progress(&self, deck_id: &DeckId) -> Result<Vec<ProgressRecord>, GatewayError>;

    /// Persist one outcome.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError` if the backend did not acknowledge the save.
    async fn save_progress(
        &self,
        deck_id: &DeckId,
        card_id: &CardId,
        correct: bool,
    ) -> Result<(), GatewayError>;

    /// Add a word to a deck and return the card(s) the backend created.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Conflict` if the word is already in the deck, or other
    /// gateway errors.
    async fn add_card(
        &self,
        deck_id: &DeckId,
        request: NewCardRequest,
    ) -> Result<Vec<Card>, GatewayError>;
}

//
// ─── IN-MEMORY GATEWAY ─────────────────────────────────────────────────────────
//

#[derive(Default)]
struct State {
    decks: Vec<Deck>,
    cards: HashMap<DeckId, Vec<Card>>,
    progress: HashMap<DeckId, Vec<ProgressRecord>>,
    schedules: HashMap<(DeckId, CardId), WordSchedule>,
    fail_saves: bool,
    fail_fetches: bool,
    next_card: u64,
}

/// In-process gateway for tests and offline runs.
///
/// Mirrors the backend's behaviour closely enough for sessions: saves are
/// appended to the deck's history and move the word along the level ladder.
#[derive(Clone, Default)]
pub struct InMemoryGateway {
    clock: Clock,
    state: Arc<Mutex<State>>,
}

impl InMemoryGateway {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, GatewayError> {
        self.state
            .lock()
            .map_err(|e| GatewayError::Transport(e.to_string()))
    }

    /// Insert or replace a deck.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Transport` if the state lock is poisoned.
    pub fn upsert_deck(&self, deck: Deck) -> Result<(), GatewayError> {
        let mut state = self.lock()?;
        match state.decks.iter_mut().find(|d| d.id() == deck.id()) {
            Some(existing) => *existing = deck,
            None => {
                state.cards.entry(deck.id().clone()).or_default();
                state.decks.push(deck);
            }
        }
        Ok(())
    }

    /// Append a card to a deck, creating its schedule.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::NotFound` if the deck does not exist.
    pub fn push_card(&self, deck_id: &DeckId, card: Card) -> Result<(), GatewayError> {
        let now = self.clock.now();
        let mut state = self.lock()?;
        let cards = state.cards.get_mut(deck_id).ok_or(GatewayError::NotFound)?;
        let card_id = card.id().clone();
        cards.push(card);
        state
            .schedules
            .insert((deck_id.clone(), card_id), WordSchedule::new(now));
        Ok(())
    }

    /// Seed a historical outcome without going through `save_progress`.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Transport` if the state lock is poisoned.
    pub fn push_progress(&self, deck_id: &DeckId, record: ProgressRecord) -> Result<(), GatewayError> {
        let mut state = self.lock()?;
        state.progress.entry(deck_id.clone()).or_default().push(record);
        Ok(())
    }

    /// Make every subsequent `save_progress` fail.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Transport` if the state lock is poisoned.
    pub fn set_fail_saves(&self, fail: bool) -> Result<(), GatewayError> {
        self.lock()?.fail_saves = fail;
        Ok(())
    }

    /// Make every subsequent fetch fail.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Transport` if the state lock is poisoned.
    pub fn set_fail_fetches(&self, fail: bool) -> Result<(), GatewayError> {
        self.lock()?.fail_fetches = fail;
        Ok(())
    }

    /// All outcomes stored for a deck, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Transport` if the state lock is poisoned.
    pub fn saved_progress(&self, deck_id: &DeckId) -> Result<Vec<ProgressRecord>, GatewayError> {
        Ok(self.lock()?.progress.get(deck_id).cloned().unwrap_or_default())
    }

    /// Current level-ladder position of a card.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Transport` if the state lock is poisoned.
    pub fn schedule(
        &self,
        deck_id: &DeckId,
        card_id: &CardId,
    ) -> Result<Option<WordSchedule>, GatewayError> {
        Ok(self
            .lock()?
            .schedules
            .get(&(deck_id.clone(), card_id.clone()))
            .copied())
    }

    fn check_fetch(state: &State) -> Result<(), GatewayError> {
        if state.fail_fetches {
            return Err(GatewayError::Transport("fetch failure injected".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteDeckGateway for InMemoryGateway {
    async fn fetch_decks(&self) -> Result<Vec<Deck>, GatewayError> {
        let state = self.lock()?;
        Self::check_fetch(&state)?;
        Ok(state.decks.clone())
    }

    async fn fetch_cards(&self, deck_id: &DeckId) -> Result<Vec<Card>, GatewayError> {
        let state = self.lock()?;
        Self::check_fetch(&state)?;
        state.cards.get(deck_id).cloned().ok_or(GatewayError::NotFound)
    }

    async fn fetch_progress(&self, deck_id: &DeckId) -> Result<Vec<ProgressRecord>, GatewayError> {
        let state = self.lock()?;
        Self::check_fetch(&state)?;
        if !state.cards.contains_key(deck_id) {
            return Err(GatewayError::NotFound);
        }
        Ok(state.progress.get(deck_id).cloned().unwrap_or_default())
    }

    async fn save_progress(
        &self,
        deck_id: &DeckId,
        card_id: &CardId,
        correct: bool,
    ) -> Result<(), GatewayError> {
        let now: DateTime<Utc> = self.clock.now();
        let mut state = self.lock()?;
        if state.fail_saves {
            return Err(GatewayError::Transport("save failure injected".into()));
        }

        state
            .progress
            .entry(deck_id.clone())
            .or_default()
            .push(ProgressRecord::new(card_id.clone(), correct, now));

        if let Some(schedule) = state.schedules.get_mut(&(deck_id.clone(), card_id.clone())) {
            if correct {
                schedule.promote();
            } else {
                schedule.reset(now);
            }
        }
        Ok(())
    }

    async fn add_card(
        &self,
        deck_id: &DeckId,
        request: NewCardRequest,
    ) -> Result<Vec<Card>, GatewayError> {
        let now = self.clock.now();
        let mut state = self.lock()?;
        let duplicate = state
            .cards
            .get(deck_id)
            .ok_or(GatewayError::NotFound)?
            .iter()
            .any(|c| c.target_word().eq_ignore_ascii_case(&request.word));
        if duplicate {
            return Err(GatewayError::Conflict);
        }

        state.next_card += 1;
        let card_id = CardId::new(format!("{deck_id}-{}", state.next_card));
        let sentence = request.sentence.unwrap_or_else(|| request.word.clone());
        let card = Card::new(
            card_id.clone(),
            sentence.clone(),
            request.word.clone(),
            request.translated_sentence.unwrap_or(sentence),
            request.translated_word.unwrap_or(request.word),
        )?;

        state
            .cards
            .entry(deck_id.clone())
            .or_default()
            .push(card.clone());
        state
            .schedules
            .insert((deck_id.clone(), card_id), WordSchedule::new(now));
        Ok(vec![card])
    }
}
