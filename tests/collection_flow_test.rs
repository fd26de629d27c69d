use coleta_leads::core::export::leads_to_csv;
use coleta_leads::core::{BatchStatus, LeadRepository, SearchCriteria};
use coleta_leads::domain::model::{current_month, AccessRecord};
use coleta_leads::{AppConfig, CollectionEngine, GooglePlacesClient, InMemoryStore, LeadError};
use httpmock::prelude::*;
use std::sync::Arc;

fn mock_config(server: &MockServer) -> AppConfig {
    let mut config = AppConfig::default();
    config.places.api_key = "test-key".to_string();
    config.places.search_url = server.url("/v1/places:searchText");
    config.places.details_url = server.url("/v1/places");
    config.places.geocode_url = server.url("/geocode/json");
    config.collection.page_delay_ms = 0;
    config.collection.detail_delay_ms = 0;
    config
}

async fn mock_search(server: &MockServer, ids: &[&str]) {
    let places: Vec<serde_json::Value> = ids
        .iter()
        .map(|id| serde_json::json!({"id": id, "displayName": {"text": id}}))
        .collect();
    server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/places:searchText");
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(serde_json::json!({ "places": places }));
        })
        .await;
}

async fn mock_details(server: &MockServer, id: &str, name: &str, rating: f64) {
    let path = format!("/v1/places/{}", id);
    let body = serde_json::json!({
        "displayName": {"text": name, "languageCode": "pt-BR"},
        "formattedAddress": format!("Rua {}, 100 - Curitiba", name),
        "nationalPhoneNumber": "(41) 3333-0000",
        "websiteUri": "https://exemplo.com.br",
        "rating": rating,
        "userRatingCount": 42
    });
    server
        .mock_async(|when, then| {
            when.method(GET).path(path);
            then.status(200)
                .header("Content-Type", "application/json")
                .json_body(body);
        })
        .await;
}

async fn engine_for(
    server: &MockServer,
    access: Vec<AccessRecord>,
) -> (
    CollectionEngine<GooglePlacesClient, InMemoryStore>,
    Arc<InMemoryStore>,
) {
    let config = mock_config(server);
    let store = Arc::new(InMemoryStore::with_access(access).await);
    let places = Arc::new(GooglePlacesClient::new(&config).unwrap());
    let engine = CollectionEngine::from_config(places, Arc::clone(&store), &config);
    (engine, store)
}

#[tokio::test]
async fn test_collection_dedups_and_exports() {
    let server = MockServer::start_async().await;
    mock_search(
        &server,
        &["places/p1", "places/p2", "places/p1", "places/p3"],
    )
    .await;
    mock_details(&server, "p1", "Padaria Central", 4.5).await;
    mock_details(&server, "p2", "Padaria do Bairro", 4.0).await;
    // p3 sem detalhes: o mock server responde 404

    let (engine, store) = engine_for(&server, vec![AccessRecord::new(1, "basico", 10)]).await;
    let batch = engine
        .prepare(1, SearchCriteria::new("padaria", "Curitiba", "Centro"))
        .await
        .unwrap();
    let report = engine.run_now(batch.id).await.unwrap();

    assert_eq!(report.status, BatchStatus::Completed);
    assert_eq!(report.collected, 2);
    assert_eq!(report.skipped_duplicates, 1);
    assert_eq!(report.missing_details, 1);

    let leads = store.leads_since(batch.id, 0).await.unwrap();
    assert_eq!(leads.len(), 2);
    assert_eq!(leads[0].name, "Padaria Central");
    assert_eq!(leads[0].category, "padaria");
    assert_eq!(leads[0].neighborhood, "Centro");
    assert_eq!(leads[0].rating_display(), "4.50");
    assert_eq!(leads[0].review_count, 42);

    let access = store.get_access(1).await.unwrap().unwrap();
    assert_eq!(access.consumed_this_month, 2);
    assert_eq!(access.reference_month, current_month());

    let csv = String::from_utf8(leads_to_csv(&leads).unwrap()).unwrap();
    assert!(csv.starts_with('\u{feff}'));
    assert!(csv.contains("padaria;Curitiba;Centro;Padaria Central;(41) 3333-0000;"));
    assert_eq!(csv.lines().count(), 3);
}

#[tokio::test]
async fn test_collection_stops_at_monthly_quota() {
    let server = MockServer::start_async().await;
    mock_search(&server, &["a", "b", "c", "d"]).await;
    for id in ["a", "b", "c", "d"] {
        mock_details(&server, id, &format!("Loja {}", id), 3.0).await;
    }

    let (engine, store) = engine_for(&server, vec![AccessRecord::new(7, "basico", 2)]).await;
    let criteria = SearchCriteria::new("loja", "Curitiba", "");

    let batch = engine.prepare(7, criteria.clone()).await.unwrap();
    let report = engine.run_now(batch.id).await.unwrap();
    assert_eq!(report.status, BatchStatus::Completed);
    assert_eq!(report.collected, 2);
    assert_eq!(store.count_leads(batch.id).await.unwrap(), 2);

    let access = store.get_access(7).await.unwrap().unwrap();
    assert_eq!(access.consumed_this_month, 2);

    // Cota do mês esgotada: nova coleta é recusada antes de criar o lote
    let err = engine.prepare(7, criteria).await.unwrap_err();
    assert!(matches!(err, LeadError::QuotaExhausted { user_id: 7 }));
    assert_eq!(store.list_batches(7).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_radius_collection_fails_when_geocoding_fails() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/geocode/json");
            then.status(200)
                .json_body(serde_json::json!({"status": "ZERO_RESULTS", "results": []}));
        })
        .await;
    let search = server
        .mock_async(|when, then| {
            when.method(POST).path("/v1/places:searchText");
            then.status(200).json_body(serde_json::json!({"places": []}));
        })
        .await;

    let (engine, store) = engine_for(&server, vec![AccessRecord::new(3, "basico", 10)]).await;
    let criteria = SearchCriteria::new("academia", "Curitiba", "Batel").with_radius(5.0);
    let batch = engine.prepare(3, criteria).await.unwrap();
    let report = engine.run_now(batch.id).await.unwrap();

    assert_eq!(report.status, BatchStatus::Failed);
    assert_eq!(report.message, "Não foi possível geocodificar: Batel, Curitiba");
    search.assert_hits_async(0).await;

    let stored = store.get_batch(batch.id).await.unwrap().unwrap();
    assert_eq!(stored.status, BatchStatus::Failed);
    assert_eq!(stored.error_message, report.message);
}

#[tokio::test]
async fn test_radius_collection_sends_circle() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/geocode/json");
            then.status(200).json_body(serde_json::json!({
                "status": "OK",
                "results": [{"geometry": {"location": {"lat": -25.44, "lng": -49.29}}}]
            }));
        })
        .await;
    let search = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/v1/places:searchText")
                .json_body(serde_json::json!({
                    "textQuery": "academia",
                    "languageCode": "pt-BR",
                    "maxResultCount": 20,
                    "locationRestriction": {
                        "circle": {
                            "center": {"latitude": -25.44, "longitude": -49.29},
                            "radius": 5000.0
                        }
                    }
                }));
            then.status(200).json_body(serde_json::json!({"places": []}));
        })
        .await;

    let (engine, _store) = engine_for(&server, vec![AccessRecord::new(3, "basico", 10)]).await;
    let criteria = SearchCriteria::new("academia", "Curitiba", "Batel").with_radius(5.0);
    let batch = engine.prepare(3, criteria).await.unwrap();
    let report = engine.run_now(batch.id).await.unwrap();

    search.assert_async().await;
    assert_eq!(report.status, BatchStatus::Completed);
    assert_eq!(report.collected, 0);
}
