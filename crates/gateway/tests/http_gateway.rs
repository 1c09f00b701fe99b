use engrave_core::model::{CardId, DeckId};
use engrave_core::time::fixed_now;
use gateway::{GatewayError, HttpGateway, HttpGatewayConfig, NewCardRequest, RemoteDeckGateway};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn gateway_for(server: &MockServer) -> HttpGateway {
    HttpGateway::new(HttpGatewayConfig::new(server.uri()).with_auth_token("secret")).unwrap()
}

#[tokio::test]
async fn fetch_cards_maps_callable_result() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/getCards"))
        .and(header("authorization", "Bearer secret"))
        .and(body_json(serde_json::json!({ "data": { "deckId": "es-1" } })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "result": [
                {
                    "id": "c1",
                    "sentence": "El perro corre.",
                    "targetWord": "perro",
                    "translatedSentence": "The dog runs.",
                    "translatedWord": "dog"
                },
                {
                    "id": "c2",
                    "sentence": "El gato duerme.",
                    "targetWord": "gato",
                    "translatedSentence": "The cat sleeps.",
                    "translatedWord": "cat"
                }
            ]
        })))
        .mount(&server)
        .await;

    let cards = gateway_for(&server)
        .fetch_cards(&DeckId::new("es-1"))
        .await
        .unwrap();

    assert_eq!(cards.len(), 2);
    assert_eq!(cards[0].id(), &CardId::new("c1"));
    assert_eq!(cards[1].translated_word(), "cat");
}

#[tokio::test]
async fn fetch_decks_and_progress() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/getDecks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "result": [{ "id": "es-1", "name": "Basics", "language": "Spanish" }]
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/getDeckProgress"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "result": [{ "cardId": "c1", "correct": true, "timestamp": "2023-11-14T22:13:20Z" }]
        })))
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    let decks = gateway.fetch_decks().await.unwrap();
    assert_eq!(decks[0].language(), "Spanish");

    let progress = gateway.fetch_progress(&DeckId::new("es-1")).await.unwrap();
    assert_eq!(progress.len(), 1);
    assert!(progress[0].correct);
    assert_eq!(progress[0].recorded_at, fixed_now());
}

#[tokio::test]
async fn save_progress_accepts_null_result() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/saveDeckProgress"))
        .and(body_json(serde_json::json!({
            "data": { "deckId": "es-1", "cardId": "c1", "correct": false }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({ "result": null })))
        .expect(1)
        .mount(&server)
        .await;

    gateway_for(&server)
        .save_progress(&DeckId::new("es-1"), &CardId::new("c1"), false)
        .await
        .unwrap();
}

#[tokio::test]
async fn callable_errors_are_mapped() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/getCards"))
        .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
            "error": { "message": "no such deck", "status": "NOT_FOUND" }
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/addCard"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "error": { "message": "word too long", "status": "INVALID_ARGUMENT" }
        })))
        .mount(&server)
        .await;

    let gateway = gateway_for(&server);
    let err = gateway.fetch_cards(&DeckId::new("zz")).await.unwrap_err();
    assert!(matches!(err, GatewayError::NotFound));

    let err = gateway
        .add_card(&DeckId::new("es-1"), NewCardRequest::word("x"))
        .await
        .unwrap_err();
    match err {
        GatewayError::Remote { message } => assert_eq!(message, "word too long"),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn server_error_without_body_is_transport_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/getDecks"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .mount(&server)
        .await;

    let err = gateway_for(&server).fetch_decks().await.unwrap_err();
    assert!(matches!(err, GatewayError::Transport(_)));
}

#[tokio::test]
async fn add_card_flattens_request_fields() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/addCard"))
        .and(body_json(serde_json::json!({
            "data": { "deckId": "es-1", "word": "gato", "language": "Spanish" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "result": [{
                "id": "c9",
                "sentence": "El gato duerme.",
                "targetWord": "gato",
                "translatedSentence": "The cat sleeps.",
                "translatedWord": "cat"
            }]
        })))
        .mount(&server)
        .await;

    let mut request = NewCardRequest::word("gato");
    request.language = Some("Spanish".into());
    let created = gateway_for(&server)
        .add_card(&DeckId::new("es-1"), request)
        .await
        .unwrap();
    assert_eq!(created[0].id(), &CardId::new("c9"));
}

#[tokio::test]
async fn malformed_card_rows_are_skipped() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/getCards"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "result": [
                {
                    "id": "c1",
                    "sentence": "El perro corre.",
                    "targetWord": "perro",
                    "translatedSentence": "The dog runs.",
                    "translatedWord": "dog"
                },
                {
                    "id": "",
                    "sentence": "Sin id.",
                    "translatedSentence": "No id."
                },
                {
                    "id": "c3",
                    "sentence": "   ",
                    "translatedSentence": "Blank sentence."
                },
                {
                    "id": "c4",
                    "sentence": "El gato duerme.",
                    "targetWord": "gato",
                    "translatedSentence": "The cat sleeps.",
                    "translatedWord": "cat"
                }
            ]
        })))
        .mount(&server)
        .await;

    let cards = gateway_for(&server)
        .fetch_cards(&DeckId::new("es-1"))
        .await
        .unwrap();

    let ids: Vec<&CardId> = cards.iter().map(|card| card.id()).collect();
    assert_eq!(ids, vec![&CardId::new("c1"), &CardId::new("c4")]);
}
