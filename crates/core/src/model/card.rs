use thiserror::Error;

use crate::model::ids::CardId;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum CardError {
    #[error("card id cannot be empty")]
    EmptyId,

    #[error("card sentence cannot be empty")]
    EmptySentence,

    #[error("card translation cannot be empty")]
    EmptyTranslation,
}

//
// ─── CARD ──────────────────────────────────────────────────────────────────────
//

/// A single vocabulary item: a sentence in the target language with the word
/// being practised, plus the translated pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    id: CardId,
    sentence: String,
    target_word: String,
    translated_sentence: String,
    translated_word: String,
}

impl Card {
    /// Creates a validated card.
    ///
    /// # Errors
    ///
    /// Returns `CardError` if the id, the sentence or the translated sentence is blank.
    pub fn new(
        id: CardId,
        sentence: impl Into<String>,
        target_word: impl Into<String>,
        translated_sentence: impl Into<String>,
        translated_word: impl Into<String>,
    ) -> Result<Self, CardError> {
        if id.as_str().trim().is_empty() {
            return Err(CardError::EmptyId);
        }

        let sentence = sentence.into();
        if sentence.trim().is_empty() {
            return Err(CardError::EmptySentence);
        }

        let translated_sentence = translated_sentence.into();
        if translated_sentence.trim().is_empty() {
            return Err(CardError::EmptyTranslation);
        }

        Ok(Self {
            id,
            sentence: sentence.trim().to_owned(),
            target_word: target_word.into().trim().to_owned(),
            translated_sentence: translated_sentence.trim().to_owned(),
            translated_word: translated_word.into().trim().to_owned(),
        })
    }

    #[must_use]
    pub fn id(&self) -> &CardId {
        &self.id
    }

    #[must_use]
    pub fn sentence(&self) -> &str {
        &self.sentence
    }

    #[must_use]
    pub fn target_word(&self) -> &str {
        &self.target_word
    }

    #[must_use]
    pub fn translated_sentence(&self) -> &str {
        &self.translated_sentence
    }

    #[must_use]
    pub fn translated_word(&self) -> &str {
        &self.translated_word
    }

    /// Splits the sentence around the first occurrence of the target word.
    ///
    /// Returns `None` when the word is empty or does not occur in the sentence.
    #[must_use]
    pub fn highlight(&self) -> Option<Highlight<'_>> {
        if self.target_word.is_empty() {
            return None;
        }
        let start = self.sentence.find(&self.target_word)?;
        let end = start + self.target_word.len();
        Some(Highlight {
            before: &self.sentence[..start],
            word: &self.sentence[start..end],
            after: &self.sentence[end..],
        })
    }
}

/// Borrowed view of a sentence with the target word cut out for emphasis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Highlight<'a> {
    pub before: &'a str,
    pub word: &'a str,
    pub after: &'a str,
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
