//! Gateway backed by the managed backend's callable functions.
//!
//! Every operation is a `POST {base_url}/{function}` with a JSON body of the
//! form `{"data": {...}}`. The backend answers `{"result": ...}` on success or
//! `{"error": {"message": ..., "status": ...}}` on failure.

use std::env;
use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use engrave_core::model::{Card, CardId, Deck, DeckId, ProgressRecord};
use reqwest::Client;
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, instrument};

use crate::remote::{GatewayError, NewCardRequest, RemoteDeckGateway};

mod mapping;

use mapping::{CardRecord, DeckRecord, ProgressRow, map_cards, ser};

pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const FN_GET_DECKS: &str = "getDecks";
const FN_GET_CARDS: &str = "getCards";
const FN_GET_PROGRESS: &str = "getDeckProgress";
const FN_SAVE_PROGRESS: &str = "saveDeckProgress";
const FN_ADD_CARD: &str = "addCard";

#[derive(Clone)]
pub struct HttpGatewayConfig {
    pub base_url: String,
    pub auth_token: Option<String>,
    pub timeout: Duration,
}

impl HttpGatewayConfig {
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            auth_token: None,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }

    #[must_use]
    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Reads `ENGRAVE_BACKEND_URL` and the optional `ENGRAVE_AUTH_TOKEN`.
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let base_url = env::var("ENGRAVE_BACKEND_URL").ok()?;
        if base_url.trim().is_empty() {
            return None;
        }
        let auth_token = env::var("ENGRAVE_AUTH_TOKEN")
            .ok()
            .filter(|token| !token.trim().is_empty());
        Some(Self {
            base_url,
            auth_token,
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        })
    }
}

impl fmt::Debug for HttpGatewayConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpGatewayConfig")
            .field("base_url", &self.base_url)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "<redacted>"))
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[derive(Debug, Deserialize)]
struct CallableResponse<T> {
    result: Option<T>,
    error: Option<CallableError>,
}

#[derive(Debug, Deserialize)]
struct CallableError {
    message: String,
    #[serde(default)]
    status: Option<String>,
}

impl CallableError {
    fn into_gateway_error(self) -> GatewayError {
        match self.status.as_deref() {
            Some("NOT_FOUND") => GatewayError::NotFound,
            Some("ALREADY_EXISTS") => GatewayError::Conflict,
            _ => GatewayError::Remote {
                message: self.message,
            },
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct AddCardPayload<'a> {
    deck_id: &'a DeckId,
    #[serde(flatten)]
    request: &'a NewCardRequest,
}

fn transport(e: reqwest::Error) -> GatewayError {
    GatewayError::Transport(e.to_string())
}

#[derive(Clone, Debug)]
pub struct HttpGateway {
    client: Client,
    config: HttpGatewayConfig,
}

impl HttpGateway {
    /// Build a gateway for the given backend.
    ///
    /// # Errors
    ///
    /// Returns `GatewayError::Transport` if the HTTP client cannot be built.
    pub fn new(config: HttpGatewayConfig) -> Result<Self, GatewayError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(transport)?;
        Ok(Self { client, config })
    }

    #[must_use]
    pub fn config(&self) -> &HttpGatewayConfig {
        &self.config
    }

    /// Invoke a callable function; `Ok(None)` when the backend returned no result.
    #[instrument(skip(self, data), level = "debug")]
    async fn invoke<T: DeserializeOwned>(
        &self,
        function: &'static str,
        data: Value,
    ) -> Result<Option<T>, GatewayError> {
        let url = format!(
            "{}/{function}",
            self.config.base_url.trim_end_matches('/')
        );

        let mut request = self.client.post(url).json(&json!({ "data": data }));
        if let Some(token) = &self.config.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(transport)?;
        let status = response.status();
        debug!(%status, "backend replied");

        let body: CallableResponse<T> = match response.json().await {
            Ok(body) => body,
            Err(_) if !status.is_success() => {
                return Err(GatewayError::Transport(format!(
                    "{function} failed with status {status}"
                )));
            }
            Err(e) => return Err(ser(e)),
        };

        if let Some(error) = body.error {
            return Err(error.into_gateway_error());
        }
        if !status.is_success() {
            return Err(GatewayError::Transport(format!(
                "{function} failed with status {status}"
            )));
        }
        Ok(body.result)
    }

    async fn call<T: DeserializeOwned>(
        &self,
        function: &'static str,
        data: Value,
    ) -> Result<T, GatewayError> {
        self.invoke(function, data)
            .await?
            .ok_or_else(|| GatewayError::Serialization(format!("{function} returned no result")))
    }
}

#[async_trait]
impl RemoteDeckGateway for HttpGateway {
    async fn fetch_decks(&self) -> Result<Vec<Deck>, GatewayError> {
        let rows: Vec<DeckRecord> = self.call(FN_GET_DECKS, json!({})).await?;
        rows.into_iter().map(DeckRecord::into_deck).collect()
    }

    async fn fetch_cards(&self, deck_id: &DeckId) -> Result<Vec<Card>, GatewayError> {
        let rows: Vec<CardRecord> = self
            .call(FN_GET_CARDS, json!({ "deckId": deck_id }))
            .await?;
        Ok(map_cards(rows))
    }

    async fn fetch_progress(&self, deck_id: &DeckId) -> Result<Vec<ProgressRecord>, GatewayError> {
        let rows: Vec<ProgressRow> = self
            .call(FN_GET_PROGRESS, json!({ "deckId": deck_id }))
            .await?;
        Ok(rows.into_iter().map(ProgressRow::into_record).collect())
    }

    async fn save_progress(
        &self,
        deck_id: &DeckId,
        card_id: &CardId,
        correct: bool,
    ) -> Result<(), GatewayError> {
        let data = json!({ "deckId": deck_id, "cardId": card_id, "correct": correct });
        self.invoke::<IgnoredAny>(FN_SAVE_PROGRESS, data).await?;
        Ok(())
    }

    async fn add_card(
        &self,
        deck_id: &DeckId,
        request: NewCardRequest,
    ) -> Result<Vec<Card>, GatewayError> {
        let payload = AddCardPayload {
            deck_id,
            request: &request,
        };
        let data = serde_json::to_value(&payload).map_err(ser)?;
        let rows: Vec<CardRecord> = self.call(FN_ADD_CARD, data).await?;
        Ok(map_cards(rows))
    }
}
