use thiserror::Error;

use crate::model::ids::DeckId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DeckError {
    #[error("deck name cannot be empty")]
    EmptyName,

    #[error("deck language cannot be empty")]
    EmptyLanguage,
}

/// A named collection of flashcards for one target language.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deck {
    id: DeckId,
    name: String,
    language: String,
}

impl Deck {
    /// Creates a new Deck.
    ///
    /// # Errors
    ///
    /// Returns `DeckError` if the name or language is empty or whitespace-only.
    pub fn new(
        id: DeckId,
        name: impl Into<String>,
        language: impl Into<String>,
    ) -> Result<Self, DeckError> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DeckError::EmptyName);
        }
        let language = language.into();
        if language.trim().is_empty() {
            return Err(DeckError::EmptyLanguage);
        }

        Ok(Self {
            id,
            name: name.trim().to_owned(),
            language: language.trim().to_owned(),
        })
    }

    #[must_use]
    pub fn id(&self) -> &DeckId {
        &self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Target language, e.g. "Spanish".
    #[must_use]
    pub fn language(&self) -> &str {
        &self.language
    }
}
