use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::model::ids::CardId;

//
// ─── PROGRESS RECORD ───────────────────────────────────────────────────────────
//

/// A persisted correctness judgment for one card, as reported by the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressRecord {
    pub card_id: CardId,
    pub correct: bool,
    pub recorded_at: DateTime<Utc>,
}

impl ProgressRecord {
    #[must_use]
    pub fn new(card_id: CardId, correct: bool, recorded_at: DateTime<Utc>) -> Self {
        Self {
            card_id,
            correct,
            recorded_at,
        }
    }
}

//
// ─── CARD STATUS ───────────────────────────────────────────────────────────────
//

/// Which bucket a card is counted in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CardStatus {
    #[default]
    Remaining,
    Correct,
    Incorrect,
}

impl CardStatus {
    #[must_use]
    pub fn from_outcome(correct: bool) -> Self {
        if correct { Self::Correct } else { Self::Incorrect }
    }
}

//
// ─── PROGRESS STATS ────────────────────────────────────────────────────────────
//

/// Aggregate counts for one review pass over a deck.
///
/// `correct + incorrect + remaining == total` holds for every value of this
/// type; the fields are private and only move between buckets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProgressStats {
    total: usize,
    correct: usize,
    incorrect: usize,
    remaining: usize,
}

impl ProgressStats {
    /// Stats for `total` cards, none of them judged yet.
    #[must_use]
    pub fn new(total: usize) -> Self {
        Self {
            total,
            correct: 0,
            incorrect: 0,
            remaining: total,
        }
    }

    #[must_use]
    pub fn from_counts(correct: usize, incorrect: usize, remaining: usize) -> Self {
        Self {
            total: correct + incorrect + remaining,
            correct,
            incorrect,
            remaining,
        }
    }

    #[must_use]
    pub fn total(&self) -> usize {
        self.total
    }

    #[must_use]
    pub fn correct(&self) -> usize {
        self.correct
    }

    #[must_use]
    pub fn incorrect(&self) -> usize {
        self.incorrect
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    /// `round(100 × correct / total)`, or 0 for an empty deck.
    #[must_use]
    pub fn percentage(&self) -> u8 {
        rounded_percent(self.correct, self.total)
    }

    /// Share of cards that have been judged either way, rounded like `percentage`.
    #[must_use]
    pub fn completion(&self) -> u8 {
        rounded_percent(self.correct + self.incorrect, self.total)
    }

    /// True once no card is left in the remaining bucket.
    #[must_use]
    pub fn is_resolved(&self) -> bool {
        self.remaining == 0
    }

    /// Moves one card from `from` to `to`.
    ///
    /// Returns the stats unchanged when the buckets are equal or `from` is empty.
    #[must_use]
    pub fn transition(self, from: CardStatus, to: CardStatus) -> Self {
        if from == to || self.count(from) == 0 {
            return self;
        }
        let mut next = self;
        *next.bucket_mut(from) -= 1;
        *next.bucket_mut(to) += 1;
        next
    }

    fn count(&self, status: CardStatus) -> usize {
        match status {
            CardStatus::Remaining => self.remaining,
            CardStatus::Correct => self.correct,
            CardStatus::Incorrect => self.incorrect,
        }
    }

    fn bucket_mut(&mut self, status: CardStatus) -> &mut usize {
        match status {
            CardStatus::Remaining => &mut self.remaining,
            CardStatus::Correct => &mut self.correct,
            CardStatus::Incorrect => &mut self.incorrect,
        }
    }
}

/// Half-up rounding in integer arithmetic.
fn rounded_percent(part: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let part = part as u128;
    let total = total as u128;
    let pct = (200 * part + total) / (2 * total);
    u8::try_from(pct).unwrap_or(100)
}

//
// ─── PROGRESS BOARD ────────────────────────────────────────────────────────────
//

/// Per-card classification for a deck plus the aggregate derived from it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProgressBoard {
    statuses: HashMap<CardId, CardStatus>,
    stats: ProgressStats,
}

impl ProgressBoard {
    /// Seeds the board from the deck's card ids and the backend's history.
    ///
    /// Duplicate ids count once. For each card the record with the latest
    /// `recorded_at` wins; on equal timestamps the later record in `history`
    /// wins. Records for cards outside the deck are ignored.
    #[must_use]
    pub fn seeded(card_ids: impl IntoIterator<Item = CardId>, history: &[ProgressRecord]) -> Self {
        let mut statuses: HashMap<CardId, CardStatus> = card_ids
            .into_iter()
            .map(|id| (id, CardStatus::Remaining))
            .collect();

        let mut latest: HashMap<&CardId, &ProgressRecord> = HashMap::new();
        for record in history {
            if !statuses.contains_key(&record.card_id) {
                continue;
            }
            match latest.get(&record.card_id) {
                Some(existing) if existing.recorded_at > record.recorded_at => {}
                _ => {
                    latest.insert(&record.card_id, record);
                }
            }
        }

        let mut stats = ProgressStats::new(statuses.len());
        for (card_id, record) in latest {
            let status = CardStatus::from_outcome(record.correct);
            stats = stats.transition(CardStatus::Remaining, status);
            if let Some(slot) = statuses.get_mut(card_id) {
                *slot = status;
            }
        }

        Self { statuses, stats }
    }

    #[must_use]
    pub fn stats(&self) -> ProgressStats {
        self.stats
    }

    #[must_use]
    pub fn status(&self, card_id: &CardId) -> Option<CardStatus> {
        self.statuses.get(card_id).copied()
    }

    #[must_use]
    pub fn contains(&self, card_id: &CardId) -> bool {
        self.statuses.contains_key(card_id)
    }

    /// Puts a card in the bucket matching `correct`.
    ///
    /// Returns `None` for a card that is not on the board.
    pub fn classify(&mut self, card_id: &CardId, correct: bool) -> Option<ProgressStats> {
        let slot = self.statuses.get_mut(card_id)?;
        let next = CardStatus::from_outcome(correct);
        self.stats = self.stats.transition(*slot, next);
        *slot = next;
        Some(self.stats)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
