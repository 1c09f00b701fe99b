use chrono::{DateTime, Utc};
use engrave_core::model::{Card, CardId, Deck, DeckId, ProgressRecord};
use serde::Deserialize;
use tracing::warn;

use crate::remote::GatewayError;

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> GatewayError {
    GatewayError::Serialization(e.to_string())
}

/// Deck as returned by `getDecks`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct DeckRecord {
    id: String,
    name: String,
    language: String,
}

impl DeckRecord {
    pub(crate) fn into_deck(self) -> Result<Deck, GatewayError> {
        let id: DeckId = self.id.parse().map_err(ser)?;
        Ok(Deck::new(id, self.name, self.language)?)
    }
}

/// Card as returned by `getCards` and `addCard`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct CardRecord {
    id: String,
    sentence: String,
    #[serde(default)]
    target_word: String,
    translated_sentence: String,
    #[serde(default)]
    translated_word: String,
}

impl CardRecord {
    pub(crate) fn into_card(self) -> Result<Card, GatewayError> {
        Ok(Card::new(
            CardId::new(self.id),
            self.sentence,
            self.target_word,
            self.translated_sentence,
            self.translated_word,
        )?)
    }
}

/// One history row as returned by `getDeckProgress`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ProgressRow {
    card_id: String,
    correct: bool,
    timestamp: DateTime<Utc>,
}

impl ProgressRow {
    pub(crate) fn into_record(self) -> ProgressRecord {
        ProgressRecord::new(CardId::new(self.card_id), self.correct, self.timestamp)
    }
}

/// Converts card rows, skipping rows that do not form a valid card.
pub(crate) fn map_cards(rows: Vec<CardRecord>) -> Vec<Card> {
    rows.into_iter()
        .filter_map(|row| {
            let id = row.id.clone();
            match row.into_card() {
                Ok(card) => Some(card),
                Err(err) => {
                    warn!(card_id = %id, error = %err, "skipping malformed card row");
                    None
                }
            }
        })
        .collect()
}
