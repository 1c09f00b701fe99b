use std::sync::Arc;

use engrave_core::model::{Card, Deck, DeckId};
use gateway::{GatewayError, NewCardRequest, RemoteDeckGateway};
use tracing::{info, warn};

use crate::error::{DeckServiceError, FetchFailure, FetchTarget, SentenceError};
use crate::sentence_service::SentenceService;

/// Deck listing and new-word intake.
#[derive(Clone)]
pub struct DeckService {
    gateway: Arc<dyn RemoteDeckGateway>,
    sentences: Arc<SentenceService>,
}

impl DeckService {
    #[must_use]
    pub fn new(gateway: Arc<dyn RemoteDeckGateway>, sentences: Arc<SentenceService>) -> Self {
        Self { gateway, sentences }
    }

    /// List the decks available to the user.
    ///
    /// # Errors
    ///
    /// Returns a `FetchFailure` whose message can be shown directly.
    pub async fn list_decks(&self) -> Result<Vec<Deck>, FetchFailure> {
        self.gateway
            .fetch_decks()
            .await
            .map_err(|e| FetchFailure::new(FetchTarget::Decks, e))
    }

    /// Fetch the cards of a deck in backend order.
    ///
    /// # Errors
    ///
    /// Returns a `FetchFailure` whose message can be shown directly.
    pub async fn cards(&self, deck_id: &DeckId) -> Result<Vec<Card>, FetchFailure> {
        self.gateway
            .fetch_cards(deck_id)
            .await
            .map_err(|e| FetchFailure::new(FetchTarget::Cards, e))
    }

    /// Add a word to `deck`, generating its sentence and translations when the
    /// sentence service is configured.
    ///
    /// Generation failures fall back to a bare request; the backend fills in
    /// whatever is missing.
    ///
    /// # Errors
    ///
    /// Returns `DeckServiceError::EmptyWord` for a blank word,
    /// `DeckServiceError::DuplicateWord` if the deck already has it,
    /// and `DeckServiceError::Gateway` for other backend failures.
    pub async fn add_word(
        &self,
        deck: &Deck,
        word: &str,
        native_language: &str,
    ) -> Result<Vec<Card>, DeckServiceError> {
        let word = word.trim();
        if word.is_empty() {
            return Err(DeckServiceError::EmptyWord);
        }

        let mut request = NewCardRequest::word(word);
        request.language = Some(deck.language().to_owned());

        if self.sentences.enabled() {
            match self.generate(deck.language(), word, native_language).await {
                Ok((sentence, translated_sentence, translated_word)) => {
                    request.sentence = Some(sentence);
                    request.translated_sentence = Some(translated_sentence);
                    request.translated_word = Some(translated_word);
                }
                Err(err) => {
                    warn!(error = %err, word, "sentence generation failed; sending bare word");
                }
            }
        }

        let cards = self
            .gateway
            .add_card(deck.id(), request)
            .await
            .map_err(|e| match e {
                GatewayError::Conflict => DeckServiceError::DuplicateWord(word.to_owned()),
                other => DeckServiceError::Gateway(other),
            })?;
        info!(deck_id = %deck.id(), word, created = cards.len(), "word added");
        Ok(cards)
    }

    async fn generate(
        &self,
        language: &str,
        word: &str,
        native_language: &str,
    ) -> Result<(String, String, String), SentenceError> {
        let sentence = self.sentences.sentence_for(language, word).await?;
        let translated_sentence = self
            .sentences
            .translate(&sentence, language, native_language)
            .await?;
        let translated_word = self
            .sentences
            .translate(word, language, native_language)
            .await?;
        Ok((sentence, translated_sentence, translated_word))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use engrave_core::model::CardId;
    use engrave_core::time::fixed_clock;
    use gateway::InMemoryGateway;
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::sentence_service::SentenceConfig;

    fn spanish_deck(gateway: &InMemoryGateway) -> Deck {
        let deck = Deck::new(DeckId::new("es"), "Basics", "Spanish").unwrap();
        gateway.upsert_deck(deck.clone()).unwrap();
        deck
    }

    fn offline_service(gateway: &InMemoryGateway) -> DeckService {
        DeckService::new(
            Arc::new(gateway.clone()),
            Arc::new(SentenceService::new(None)),
        )
    }

    #[tokio::test]
    async fn list_decks_passes_through() {
        let gateway = InMemoryGateway::new().with_clock(fixed_clock());
        spanish_deck(&gateway);
        let service = offline_service(&gateway);

        let decks = service.list_decks().await.unwrap();
        assert_eq!(decks.len(), 1);
        assert_eq!(decks[0].name(), "Basics");
    }

    #[tokio::test]
    async fn fetch_failures_carry_user_message() {
        let gateway = InMemoryGateway::new();
        gateway.set_fail_fetches(true).unwrap();
        let service = offline_service(&gateway);

        let err = service.list_decks().await.unwrap_err();
        assert_eq!(err.target, FetchTarget::Decks);
        assert_eq!(
            err.to_string(),
            "Could not load decks. Check your connection and try again."
        );

        let err = service.cards(&DeckId::new("es")).await.unwrap_err();
        assert_eq!(err.target, FetchTarget::Cards);
    }

    #[tokio::test]
    async fn add_word_without_generation_sends_bare_word() {
        let gateway = InMemoryGateway::new().with_clock(fixed_clock());
        let deck = spanish_deck(&gateway);
        let service = offline_service(&gateway);

        let cards = service.add_word(&deck, "  gato ", "English").await.unwrap();
        assert_eq!(cards.len(), 1);
        assert_eq!(cards[0].target_word(), "gato");
        assert_eq!(service.cards(deck.id()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn blank_and_duplicate_words_are_rejected() {
        let gateway = InMemoryGateway::new().with_clock(fixed_clock());
        let deck = spanish_deck(&gateway);
        let service = offline_service(&gateway);

        let err = service.add_word(&deck, "   ", "English").await.unwrap_err();
        assert!(matches!(err, DeckServiceError::EmptyWord));

        service.add_word(&deck, "gato", "English").await.unwrap();
        let err = service.add_word(&deck, "Gato", "English").await.unwrap_err();
        assert!(matches!(err, DeckServiceError::DuplicateWord(w) if w == "Gato"));
    }

    #[tokio::test]
    async fn unknown_deck_surfaces_gateway_error() {
        let gateway = InMemoryGateway::new();
        let service = offline_service(&gateway);
        let deck = Deck::new(DeckId::new("missing"), "Ghost", "Spanish").unwrap();

        let err = service.add_word(&deck, "gato", "English").await.unwrap_err();
        assert!(matches!(err, DeckServiceError::Gateway(GatewayError::NotFound)));
    }

    fn reply(content: &str) -> ResponseTemplate {
        ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{ "message": { "content": content } }]
        }))
    }

    #[tokio::test]
    async fn add_word_uses_generated_sentence() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_string_contains("containing the word"))
            .respond_with(reply("El gato duerme."))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_string_contains("El gato duerme."))
            .respond_with(reply("The cat sleeps."))
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_string_contains("text into English"))
            .respond_with(reply("cat"))
            .mount(&server)
            .await;

        let gateway = InMemoryGateway::new().with_clock(fixed_clock());
        let deck = spanish_deck(&gateway);
        let sentences = SentenceService::new(Some(SentenceConfig::new(server.uri(), "key")));
        let service = DeckService::new(Arc::new(gateway.clone()), Arc::new(sentences));

        let cards = service.add_word(&deck, "gato", "English").await.unwrap();
        let card = &cards[0];
        assert_eq!(card.sentence(), "El gato duerme.");
        assert_eq!(card.translated_sentence(), "The cat sleeps.");
        assert_eq!(card.translated_word(), "cat");
        assert_eq!(card.id(), &CardId::new("es-1"));
    }

    #[tokio::test]
    async fn generation_failure_falls_back_to_bare_word() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let gateway = InMemoryGateway::new().with_clock(fixed_clock());
        let deck = spanish_deck(&gateway);
        let sentences = SentenceService::new(Some(SentenceConfig::new(server.uri(), "key")));
        let service = DeckService::new(Arc::new(gateway.clone()), Arc::new(sentences));

        let cards = service.add_word(&deck, "gato", "English").await.unwrap();
        assert_eq!(cards[0].sentence(), "gato");
    }
}
