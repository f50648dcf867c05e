#![allow(clippy::unwrap_used)]
// Integration tests for the `Explorer` thunks against a mocked Conseil server.

use std::time::Duration;

use pretty_assertions::assert_eq;
use secrecy::SecretString;
use serde_json::{Value, json};
use url::Url;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use arronax_core::{
    CommandResult, CoreError, EntityKind, Explorer, ExplorerCommand, ExplorerConfig, Filter,
    NetworkConfig, Operation, SortDirection, StoreAction, TlsVerification, selectors,
};

// ── Helpers ─────────────────────────────────────────────────────────

fn network(server: &MockServer, display_name: &str) -> NetworkConfig {
    NetworkConfig {
        url: Url::parse(&server.uri()).unwrap(),
        api_key: SecretString::from("hooman"),
        platform: "tezos".into(),
        display_name: display_name.into(),
        tls: TlsVerification::SystemDefaults,
        timeout: Duration::from_secs(5),
    }
}

async fn setup() -> (MockServer, Explorer) {
    let server = MockServer::start().await;
    let mut config = ExplorerConfig::single("mainnet", network(&server, "Mainnet"));
    config
        .networks
        .insert("carthagenet".into(), network(&server, "Carthagenet"));
    let explorer = Explorer::new(config).unwrap();
    (server, explorer)
}

fn attribute(entity: &str, name: &str, data_type: &str, key_type: &str) -> Value {
    json!({
        "name": name,
        "displayName": name,
        "dataType": data_type,
        "keyType": key_type,
        "entity": entity
    })
}

fn block_attributes() -> Value {
    json!([
        attribute("blocks", "hash", "Hash", "UniqueKey"),
        attribute("blocks", "level", "Int", "NonKey"),
        attribute("blocks", "timestamp", "DateTime", "NonKey"),
        attribute("blocks", "predecessor", "Hash", "NonKey"),
        attribute("blocks", "protocol", "String", "NonKey"),
    ])
}

fn block_rows() -> Value {
    json!([
        {"hash": "BLnewest", "level": 101, "timestamp": 1_600_000_060_000_i64, "predecessor": "BLolder", "protocol": "PsCARTHA"},
        {"hash": "BLolder", "level": 100, "timestamp": 1_600_000_000_000_i64, "predecessor": "BLfirst", "protocol": "PsCARTHA"},
    ])
}

async fn mount_blocks(server: &MockServer, network: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/v2/metadata/tezos/{network}/blocks/attributes")))
        .and(header("apiKey", "hooman"))
        .respond_with(ResponseTemplate::new(200).set_body_json(block_attributes()))
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path(format!("/v2/data/tezos/{network}/blocks")))
        .and(body_partial_json(json!({"limit": 100})))
        .respond_with(ResponseTemplate::new(200).set_body_json(block_rows()))
        .mount(server)
        .await;
}

fn column_names(explorer: &Explorer) -> Vec<String> {
    explorer.store().select(|s| {
        selectors::columns(s)
            .iter()
            .map(|c| c.name.clone())
            .collect()
    })
}

// ── Initial load ────────────────────────────────────────────────────

#[tokio::test]
async fn test_fetch_items_loads_attributes_columns_and_rows() {
    let (server, explorer) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v2/metadata/tezos/mainnet/blocks/attributes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(block_attributes()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v2/data/tezos/mainnet/blocks"))
        .and(body_partial_json(json!({
            "fields": ["hash", "level", "timestamp", "predecessor", "protocol"],
            "predicates": [],
            "orderBy": [{"field": "level", "direction": "desc"}],
            "limit": 100
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(block_rows()))
        .expect(1)
        .mount(&server)
        .await;

    explorer.fetch_items(EntityKind::Blocks).await.unwrap();

    let state = explorer.snapshot();
    assert_eq!(selectors::attributes(&state).len(), 5);
    assert_eq!(
        column_names(&explorer),
        ["level", "timestamp", "hash", "predecessor"]
    );
    assert_eq!(selectors::items(&state).len(), 2);
    assert!(selectors::is_full_loaded(&state));
    assert!(!selectors::loading(&state));
    assert!(state.last_error.is_none());
}

#[tokio::test]
async fn test_fetch_items_skips_entity_with_rows() {
    let (server, explorer) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v2/metadata/tezos/mainnet/blocks/attributes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(block_attributes()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v2/data/tezos/mainnet/blocks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(block_rows()))
        .expect(1)
        .mount(&server)
        .await;

    explorer.fetch_items(EntityKind::Blocks).await.unwrap();
    explorer.fetch_items(EntityKind::Blocks).await.unwrap();
}

#[tokio::test]
async fn test_refresh_fetches_again() {
    let (server, explorer) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v2/metadata/tezos/mainnet/blocks/attributes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(block_attributes()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v2/data/tezos/mainnet/blocks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(block_rows()))
        .expect(2)
        .mount(&server)
        .await;

    explorer.fetch_items(EntityKind::Blocks).await.unwrap();
    explorer.refresh().await.unwrap();

    assert_eq!(explorer.store().select(|s| selectors::items(s).len()), 2);
}

#[tokio::test]
async fn test_failed_fetch_clears_loading_and_records_error() {
    let (server, explorer) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v2/metadata/tezos/mainnet/blocks/attributes"))
        .respond_with(ResponseTemplate::new(500).set_body_string("database unavailable"))
        .mount(&server)
        .await;

    let result = explorer.fetch_items(EntityKind::Blocks).await;

    assert!(
        matches!(result, Err(CoreError::Api { .. })),
        "expected Api error, got: {result:?}"
    );
    let state = explorer.snapshot();
    assert!(!state.is_loading());
    assert!(state.last_error.is_some());
    assert!(selectors::items(&state).is_empty());
}

#[tokio::test]
async fn test_rejected_api_key_maps_to_authentication_error() {
    let (server, explorer) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v2/metadata/tezos/mainnet/blocks/attributes"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&server)
        .await;

    let result = explorer.fetch_attributes().await;
    assert!(matches!(
        result,
        Err(CoreError::AuthenticationFailed { .. })
    ));
}

// ── Entity and network switching ────────────────────────────────────

#[tokio::test]
async fn test_change_entity_loads_first_six_columns() {
    let (server, explorer) = setup().await;

    let attributes: Vec<Value> = [
        "account_id",
        "manager",
        "balance",
        "spendable",
        "delegate_setable",
        "delegate_value",
        "counter",
        "block_level",
    ]
    .iter()
    .map(|name| attribute("accounts", name, "String", "NonKey"))
    .collect();

    Mock::given(method("GET"))
        .and(path("/v2/metadata/tezos/mainnet/accounts/attributes"))
        .respond_with(ResponseTemplate::new(200).set_body_json(attributes))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v2/data/tezos/mainnet/accounts"))
        .and(body_partial_json(json!({
            "orderBy": [{"field": "block_level", "direction": "desc"}]
        })))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([{"account_id": "tz1abc"}])),
        )
        .expect(1)
        .mount(&server)
        .await;

    explorer.change_entity(EntityKind::Accounts).await.unwrap();

    assert_eq!(
        explorer.store().select(selectors::entity),
        EntityKind::Accounts
    );
    assert_eq!(
        column_names(&explorer),
        [
            "account_id",
            "manager",
            "balance",
            "spendable",
            "delegate_setable",
            "delegate_value"
        ]
    );
    assert_eq!(
        explorer.store().select(selectors::primary_key),
        "account_id"
    );
}

#[tokio::test]
async fn test_change_network_resets_and_reloads() {
    let (server, explorer) = setup().await;
    mount_blocks(&server, "mainnet").await;
    mount_blocks(&server, "carthagenet").await;

    explorer.fetch_items(EntityKind::Blocks).await.unwrap();
    explorer.dispatch(StoreAction::AddFilter {
        entity: EntityKind::Blocks,
        filter: Filter::new("protocol", Operation::Eq),
    });

    explorer.change_network("carthagenet").await.unwrap();

    let state = explorer.snapshot();
    assert_eq!(selectors::network(&state), "carthagenet");
    assert_eq!(selectors::platform(&state), "tezos");
    assert!(selectors::selected_filters(&state).is_empty());
    assert_eq!(selectors::items(&state).len(), 2);
    assert!(!state.is_loading());
}

#[tokio::test]
async fn test_change_network_to_same_network_is_noop() {
    let (_server, explorer) = setup().await;
    // No mocks mounted: any request would fail.
    explorer.change_network("mainnet").await.unwrap();
    assert!(explorer.snapshot().last_error.is_none());
}

#[tokio::test]
async fn test_change_network_rejects_unknown_network() {
    let (_server, explorer) = setup().await;
    let result = explorer.change_network("zeronet").await;
    assert!(matches!(
        result,
        Err(CoreError::NetworkNotConfigured { ref network }) if network == "zeronet"
    ));
    assert_eq!(explorer.store().select(|s| s.network.clone()), "mainnet");
}

// ── Queries and sorting ─────────────────────────────────────────────

#[tokio::test]
async fn test_submit_query_sends_filters_and_row_count() {
    let (server, explorer) = setup().await;
    mount_blocks(&server, "mainnet").await;

    Mock::given(method("POST"))
        .and(path("/v2/data/tezos/mainnet/blocks"))
        .and(body_partial_json(json!({
            "predicates": [{
                "field": "level",
                "operation": "between",
                "set": ["90", "100"],
                "inverse": false
            }],
            "orderBy": [{"field": "level", "direction": "desc"}],
            "limit": 25
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"hash": "BLolder", "level": 100}
        ])))
        .expect(1)
        .mount(&server)
        .await;

    explorer.fetch_items(EntityKind::Blocks).await.unwrap();
    explorer.dispatch(StoreAction::SetRowCount(25));
    explorer.dispatch(StoreAction::AddFilter {
        entity: EntityKind::Blocks,
        filter: Filter::new("level", Operation::Between),
    });
    explorer.dispatch(StoreAction::SetSelectedValue {
        entity: EntityKind::Blocks,
        attribute: "level".into(),
        values: vec!["90".into(), "100".into()],
    });

    explorer.submit_query().await.unwrap();

    let state = explorer.snapshot();
    assert_eq!(selectors::items(&state).len(), 1);
    assert!(selectors::is_full_loaded(&state));
}

#[tokio::test]
async fn test_set_sort_toggles_and_requeries() {
    let (server, explorer) = setup().await;
    mount_blocks(&server, "mainnet").await;

    Mock::given(method("POST"))
        .and(path("/v2/data/tezos/mainnet/blocks"))
        .and(body_partial_json(json!({
            "orderBy": [{"field": "level", "direction": "asc"}],
            "limit": 10
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(block_rows()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v2/data/tezos/mainnet/blocks"))
        .and(body_partial_json(json!({
            "orderBy": [{"field": "hash", "direction": "desc"}],
            "limit": 10
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(block_rows()))
        .expect(1)
        .mount(&server)
        .await;

    explorer.fetch_items(EntityKind::Blocks).await.unwrap();

    // Default sort is level descending, so the first click flips it.
    explorer.set_sort("level").await.unwrap();
    let sort = explorer.store().select(selectors::sort).unwrap();
    assert_eq!(sort.order_by, "level");
    assert_eq!(sort.order, SortDirection::Asc);

    explorer.set_sort("hash").await.unwrap();
    let sort = explorer.store().select(selectors::sort).unwrap();
    assert_eq!(sort.order_by, "hash");
    assert_eq!(sort.order, SortDirection::Desc);
}

// ── Attribute values ────────────────────────────────────────────────

#[tokio::test]
async fn test_fetch_values_publishes_and_caches() {
    let (server, explorer) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v2/metadata/tezos/mainnet/blocks/protocol"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!(["PsBabyM1", "PsCARTHA"])),
        )
        .expect(1)
        .mount(&server)
        .await;

    explorer.fetch_values("protocol").await.unwrap();
    explorer.fetch_values("protocol").await.unwrap();

    let state = explorer.snapshot();
    let available = selectors::available_values(&state).unwrap();
    assert_eq!(available.entity, EntityKind::Blocks);
    assert_eq!(available.attribute, "protocol");
    assert_eq!(available.values, ["PsBabyM1", "PsCARTHA"]);
}

#[tokio::test]
async fn test_fetch_values_for_prefix() {
    let (server, explorer) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v2/metadata/tezos/mainnet/blocks/hash/BLn"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["BLnewest"])))
        .mount(&server)
        .await;

    explorer.fetch_values_for_prefix("hash", "BLn").await.unwrap();

    let values = explorer
        .store()
        .select(|s| selectors::available_values(s).map(|v| v.values.clone()));
    assert_eq!(values, Some(vec!["BLnewest".to_owned()]));
}

// ── Primary key lookup ──────────────────────────────────────────────

#[tokio::test]
async fn test_get_item_by_primary_key_sets_modal() {
    let (server, explorer) = setup().await;
    mount_blocks(&server, "mainnet").await;

    Mock::given(method("POST"))
        .and(path("/v2/data/tezos/mainnet/blocks"))
        .and(body_partial_json(json!({
            "predicates": [{"field": "hash", "operation": "eq", "set": ["BLolder"]}],
            "limit": 1
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"hash": "BLolder", "level": 100}
        ])))
        .mount(&server)
        .await;

    let item = explorer
        .get_item_by_primary_key("hash", "BLolder")
        .await
        .unwrap();
    assert_eq!(item["level"], json!(100));

    let state = explorer.snapshot();
    let modal = state.modal.as_ref().unwrap();
    assert_eq!(modal.key, "hash");
    assert_eq!(modal.value, "BLolder");
    assert_eq!(selectors::modal_item(&state), Some(&item));
}

#[tokio::test]
async fn test_get_item_by_primary_key_not_found() {
    let (server, explorer) = setup().await;
    mount_blocks(&server, "mainnet").await;

    Mock::given(method("POST"))
        .and(path("/v2/data/tezos/mainnet/blocks"))
        .and(body_partial_json(json!({"limit": 1})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let result = explorer.get_item_by_primary_key("hash", "BLmissing").await;

    assert!(matches!(result, Err(CoreError::RecordNotFound { .. })));
    let state = explorer.snapshot();
    assert!(state.modal.is_some());
    assert!(selectors::modal_item(&state).is_none());
}

// ── Command processor ───────────────────────────────────────────────

#[tokio::test]
async fn test_execute_requires_started_processor() {
    let (_server, explorer) = setup().await;
    let result = explorer.execute(ExplorerCommand::SubmitQuery).await;
    assert!(matches!(result, Err(CoreError::ExplorerStopped)));
}

#[tokio::test]
async fn test_execute_routes_commands_until_shutdown() {
    let (server, explorer) = setup().await;
    mount_blocks(&server, "mainnet").await;

    Mock::given(method("POST"))
        .and(path("/v2/data/tezos/mainnet/blocks"))
        .and(body_partial_json(json!({"limit": 1})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"hash": "BLnewest", "level": 101}
        ])))
        .mount(&server)
        .await;

    explorer.start().await;

    let result = explorer
        .execute(ExplorerCommand::FetchItems {
            entity: EntityKind::Blocks,
        })
        .await
        .unwrap();
    assert!(matches!(result, CommandResult::Ok));

    let result = explorer
        .execute(ExplorerCommand::GetItemByPrimaryKey {
            key: "hash".into(),
            value: "BLnewest".into(),
        })
        .await
        .unwrap();
    match result {
        CommandResult::Item(item) => assert_eq!(item["level"], json!(101)),
        CommandResult::Ok => panic!("expected an item"),
    }

    explorer.shutdown().await;
    let result = explorer.execute(ExplorerCommand::Refresh).await;
    assert!(matches!(result, Err(CoreError::ExplorerStopped)));
}

#[tokio::test]
async fn test_subscribers_see_loaded_items() {
    let (server, explorer) = setup().await;
    mount_blocks(&server, "mainnet").await;

    let mut stream = explorer.subscribe();
    assert!(selectors::items(stream.current()).is_empty());

    explorer.fetch_items(EntityKind::Blocks).await.unwrap();

    assert_eq!(selectors::items(&stream.latest()).len(), 2);
    assert!(stream.changed().await.is_some());
}

// ── Server metadata ─────────────────────────────────────────────────

#[tokio::test]
async fn test_remote_networks_cover_every_platform() {
    let (server, explorer) = setup().await;

    Mock::given(method("GET"))
        .and(path("/v2/metadata/platforms"))
        .and(header("apiKey", "hooman"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"name": "tezos", "displayName": "Tezos"},
            {"name": "bitcoin", "displayName": "Bitcoin"}
        ])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/metadata/tezos/networks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"name": "mainnet", "displayName": "Mainnet", "platform": "tezos", "network": "mainnet"},
            {"name": "carthagenet", "displayName": "Carthagenet", "platform": "tezos", "network": "carthagenet"}
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/metadata/bitcoin/networks"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"name": "mainnet", "displayName": "Mainnet", "platform": "bitcoin", "network": "mainnet"}
        ])))
        .mount(&server)
        .await;

    let networks = explorer.remote_networks().await.unwrap();
    let listed: Vec<(&str, &str)> = networks
        .iter()
        .map(|n| (n.platform.as_str(), n.network.as_str()))
        .collect();
    assert_eq!(
        listed,
        vec![
            ("tezos", "mainnet"),
            ("tezos", "carthagenet"),
            ("bitcoin", "mainnet")
        ]
    );
}

// ── Export ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_export_csv_writes_visible_columns() {
    let (server, explorer) = setup().await;
    mount_blocks(&server, "mainnet").await;

    explorer.fetch_items(EntityKind::Blocks).await.unwrap();

    let mut out = Vec::new();
    let rows = explorer.export_csv(&mut out).unwrap();
    assert_eq!(rows, 2);

    let text = String::from_utf8(out).unwrap();
    let mut lines = text.lines();
    assert_eq!(lines.next(), Some("level,timestamp,hash,predecessor"));
    assert_eq!(lines.next(), Some("101,1600000060000,BLnewest,BLolder"));
}
