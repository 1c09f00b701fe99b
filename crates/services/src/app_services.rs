use std::sync::Arc;

use gateway::{HttpGateway, HttpGatewayConfig, RemoteDeckGateway};

use crate::Clock;
use crate::deck_service::DeckService;
use crate::error::AppServicesError;
use crate::sentence_service::SentenceService;
use crate::sessions::ReviewLoopService;

/// How review passes are ordered and how misses are handled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReviewOptions {
    pub shuffle: bool,
    pub requeue_incorrect: bool,
}

/// Assembles app-facing services around one gateway.
#[derive(Clone)]
pub struct AppServices {
    gateway: Arc<dyn RemoteDeckGateway>,
    deck_service: Arc<DeckService>,
    review_loop: Arc<ReviewLoopService>,
}

impl AppServices {
    /// Build services over an existing gateway, with sentence generation read
    /// from the environment.
    #[must_use]
    pub fn with_gateway(
        gateway: Arc<dyn RemoteDeckGateway>,
        clock: Clock,
        options: ReviewOptions,
    ) -> Self {
        Self::assemble(gateway, clock, options, SentenceService::from_env())
    }

    fn assemble(
        gateway: Arc<dyn RemoteDeckGateway>,
        clock: Clock,
        options: ReviewOptions,
        sentences: SentenceService,
    ) -> Self {
        let deck_service = Arc::new(DeckService::new(
            Arc::clone(&gateway),
            Arc::new(sentences),
        ));
        let review_loop = Arc::new(
            ReviewLoopService::new(clock, Arc::clone(&gateway))
                .with_shuffle(options.shuffle)
                .with_requeue_incorrect(options.requeue_incorrect),
        );
        Self {
            gateway,
            deck_service,
            review_loop,
        }
    }

    /// Build services backed by the HTTP gateway.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::Gateway` if the HTTP client cannot be built.
    pub fn http(
        config: HttpGatewayConfig,
        clock: Clock,
        options: ReviewOptions,
    ) -> Result<Self, AppServicesError> {
        let gateway = HttpGateway::new(config)?;
        Ok(Self::with_gateway(Arc::new(gateway), clock, options))
    }

    /// Build services from `ENGRAVE_BACKEND_URL` and friends.
    ///
    /// # Errors
    ///
    /// Returns `AppServicesError::MissingBackend` if no backend URL is set.
    pub fn from_env(clock: Clock, options: ReviewOptions) -> Result<Self, AppServicesError> {
        let config = HttpGatewayConfig::from_env().ok_or(AppServicesError::MissingBackend)?;
        Self::http(config, clock, options)
    }

    #[must_use]
    pub fn gateway(&self) -> Arc<dyn RemoteDeckGateway> {
        Arc::clone(&self.gateway)
    }

    #[must_use]
    pub fn deck_service(&self) -> Arc<DeckService> {
        Arc::clone(&self.deck_service)
    }

    #[must_use]
    pub fn review_loop(&self) -> Arc<ReviewLoopService> {
        Arc::clone(&self.review_loop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use engrave_core::model::{Card, CardId, Deck, DeckId};
    use engrave_core::time::fixed_clock;
    use gateway::InMemoryGateway;

    use crate::sessions::Swipe;

    #[tokio::test]
    async fn services_share_one_gateway() {
        let gateway = InMemoryGateway::new().with_clock(fixed_clock());
        let deck_id = DeckId::new("es");
        gateway
            .upsert_deck(Deck::new(deck_id.clone(), "Basics", "Spanish").unwrap())
            .unwrap();
        gateway
            .push_card(
                &deck_id,
                Card::new(CardId::new("c1"), "Hola amigo.", "amigo", "Hello friend.", "friend")
                    .unwrap(),
            )
            .unwrap();

        let services = AppServices::assemble(
            Arc::new(gateway.clone()),
            fixed_clock(),
            ReviewOptions::default(),
            SentenceService::new(None),
        );

        let decks = services.deck_service().list_decks().await.unwrap();
        assert_eq!(decks.len(), 1);

        let review = services.review_loop();
        let mut session = review.start_session(&deck_id).await.unwrap();
        let result = review.swipe(&mut session, Swipe::Left).unwrap();
        assert!(result.is_complete);
        session.finish().await;

        assert_eq!(gateway.saved_progress(&deck_id).unwrap().len(), 1);
    }

    #[test]
    fn http_services_build_without_network() {
        let config = HttpGatewayConfig::new("http://127.0.0.1:9");
        assert!(AppServices::http(config, fixed_clock(), ReviewOptions::default()).is_ok());
    }
}
