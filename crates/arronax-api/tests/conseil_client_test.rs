#![allow(clippy::unwrap_used)]

use arronax_api::{ConseilClient, ConseilQuery, Error, Operation, SortDirection, TransportConfig};
use secrecy::SecretString;
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

// ── Helpers ─────────────────────────────────────────────────────────

async fn setup() -> (MockServer, ConseilClient) {
    let server = MockServer::start().await;
    let client = ConseilClient::new(
        &server.uri(),
        &SecretString::from("test-key"),
        &TransportConfig::default(),
    )
    .unwrap();
    (server, client)
}

// ── Metadata ────────────────────────────────────────────────────────

#[tokio::test]
async fn test_get_platforms_sends_api_key() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v2/metadata/platforms"))
        .and(header("apiKey", "test-key"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"name": "tezos", "displayName": "Tezos"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let platforms = client.get_platforms().await.unwrap();
    assert_eq!(platforms.len(), 1);
    assert_eq!(platforms[0].name, "tezos");
    assert_eq!(platforms[0].display_name, "Tezos");
}

#[tokio::test]
async fn test_get_networks_and_entities() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v2/metadata/tezos/networks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"name": "mainnet", "displayName": "Mainnet", "platform": "tezos", "network": "mainnet"},
            {"name": "babylonnet", "displayName": "Babylonnet", "platform": "tezos", "network": "babylonnet"}
        ])))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v2/metadata/tezos/mainnet/entities"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"name": "blocks", "displayName": "Blocks", "count": 650_000},
            {"name": "accounts", "displayName": "Accounts", "count": 30_000}
        ])))
        .mount(&server)
        .await;

    let networks = client.get_networks("tezos").await.unwrap();
    assert_eq!(networks.len(), 2);
    assert_eq!(networks[1].network, "babylonnet");

    let entities = client.get_entities("tezos", "mainnet").await.unwrap();
    assert_eq!(entities[0].name, "blocks");
    assert_eq!(entities[0].count, 650_000);
}

#[tokio::test]
async fn test_get_attributes() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v2/metadata/tezos/mainnet/blocks/attributes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"name": "level", "displayName": "Level", "dataType": "Int",
             "cardinality": 650_000, "keyType": "UniqueKey", "entity": "blocks"},
            {"name": "hash", "displayName": "Hash", "dataType": "Hash",
             "keyType": "UniqueKey", "entity": "blocks"},
            {"name": "timestamp", "displayName": "Timestamp", "dataType": "DateTime",
             "keyType": "NonKey", "entity": "blocks"}
        ])))
        .mount(&server)
        .await;

    let attrs = client
        .get_attributes("tezos", "mainnet", "blocks")
        .await
        .unwrap();
    let names: Vec<_> = attrs.iter().map(|a| a.name.as_str()).collect();
    assert_eq!(names, ["level", "hash", "timestamp"]);
    assert!(attrs[0].is_unique_key());
    assert!(!attrs[2].is_unique_key());
}

#[tokio::test]
async fn test_get_attribute_values() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v2/metadata/tezos/mainnet/operations/kind"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            "transaction", "origination", "delegation"
        ])))
        .mount(&server)
        .await;

    let values = client
        .get_attribute_values("tezos", "mainnet", "operations", "kind")
        .await
        .unwrap();
    assert_eq!(values, ["transaction", "origination", "delegation"]);
}

#[tokio::test]
async fn test_get_attribute_values_for_prefix() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v2/metadata/tezos/mainnet/accounts/manager/tz1a"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["tz1abc", "tz1abd"])))
        .mount(&server)
        .await;

    let values = client
        .get_attribute_values_for_prefix("tezos", "mainnet", "accounts", "manager", "tz1a")
        .await
        .unwrap();
    assert_eq!(values.len(), 2);
}

// ── Data ────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_execute_entity_query_posts_query_body() {
    let (server, client) = setup().await;

    let query = ConseilQuery::blank()
        .add_fields(["level", "hash"])
        .add_predicate("level", Operation::Gt, ["100"], false)
        .unwrap()
        .add_ordering("level", SortDirection::Desc)
        .set_limit(2)
        .unwrap();

    Mock::given(method("POST"))
        .and(path("/v2/data/tezos/mainnet/blocks"))
        .and(body_json(json!({
            "fields": ["level", "hash"],
            "predicates": [
                {"field": "level", "operation": "gt", "set": ["100"], "inverse": false}
            ],
            "orderBy": [{"field": "level", "direction": "desc"}],
            "limit": 2,
            "output": "json"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"level": 102, "hash": "BLc"},
            {"level": 101, "hash": "BLb"}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let rows = client
        .execute_entity_query("tezos", "mainnet", "blocks", &query)
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0]["level"], json!(102));
    assert_eq!(rows[1]["hash"], json!("BLb"));
}

#[tokio::test]
async fn test_execute_entity_query_keeps_column_order() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v2/data/tezos/mainnet/accounts"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(r#"[{"zeta": 1, "account_id": "tz1x", "balance": 5}]"#, "application/json"),
        )
        .mount(&server)
        .await;

    let rows = client
        .execute_entity_query("tezos", "mainnet", "accounts", &ConseilQuery::blank())
        .await
        .unwrap();
    let keys: Vec<_> = rows[0].keys().map(String::as_str).collect();
    assert_eq!(keys, ["zeta", "account_id", "balance"]);
}

// ── Errors ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_unauthorized_maps_to_invalid_api_key() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v2/metadata/platforms"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let result = client.get_platforms().await;
    assert!(matches!(result, Err(Error::InvalidApiKey)));
}

#[tokio::test]
async fn test_server_error_carries_body() {
    let (server, client) = setup().await;

    Mock::given(method("POST"))
        .and(path("/v2/data/tezos/mainnet/blocks"))
        .respond_with(ResponseTemplate::new(400).set_body_string("Unknown field: levl\n"))
        .mount(&server)
        .await;

    let result = client
        .execute_entity_query("tezos", "mainnet", "blocks", &ConseilQuery::blank())
        .await;
    match result {
        Err(Error::Api { status, message }) => {
            assert_eq!(status, 400);
            assert_eq!(message, "Unknown field: levl");
        }
        other => panic!("expected Api error, got {other:?}"),
    }
}

#[tokio::test]
async fn test_not_found_with_empty_body() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v2/metadata/tezos/nowhere/entities"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let err = client.get_entities("tezos", "nowhere").await.unwrap_err();
    assert!(err.is_not_found());
    assert!(matches!(err, Error::Api { ref message, .. } if message.contains("404")));
}

#[tokio::test]
async fn test_malformed_body_is_deserialization_error() {
    let (server, client) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v2/metadata/platforms"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
        .mount(&server)
        .await;

    let err = client.get_platforms().await.unwrap_err();
    match err {
        Error::Deserialization { message, body } => {
            assert!(message.contains("body preview"));
            assert_eq!(body, "<html>maintenance</html>");
        }
        other => panic!("expected Deserialization error, got {other:?}"),
    }
}
