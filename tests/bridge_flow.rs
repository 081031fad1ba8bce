//! End-to-end flow against a mock eLights API: discovery, a local command,
//! and the echoed push coming back.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use elights_bridge::host::CharacteristicKind;
use elights_bridge::listener::{ListenerState, router};
use elights_bridge::{
    AccessoryHost, ComponentRegistry, DiscoveryEngine, ElightsClient, LocalChange, LocalHost,
    WriteOutcome,
};
use serde_json::json;
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

struct Bridge {
    host: Arc<LocalHost>,
    registry: Arc<ComponentRegistry>,
    discovery: DiscoveryEngine,
}

fn bridge(server: &MockServer, host: Arc<LocalHost>) -> Bridge {
    let client = ElightsClient::from_reqwest(&format!("{}/api", server.uri()), reqwest::Client::new())
        .unwrap();
    let registry = Arc::new(ComponentRegistry::new());
    let discovery = DiscoveryEngine::new(Arc::new(client), host.clone(), registry.clone());
    Bridge {
        host,
        registry,
        discovery,
    }
}

async fn push(bridge: &Bridge, uri: &str) -> StatusCode {
    router(ListenerState::new(bridge.registry.clone(), bridge.host.clone()))
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap()
        .status()
}

async fn mount_inventory(server: &MockServer, inventory: serde_json::Value) {
    Mock::given(method("GET"))
        .and(path("/api/uuid"))
        .respond_with(ResponseTemplate::new(200).set_body_json(inventory))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_local_command_echo_is_not_written_back() {
    let server = MockServer::start().await;
    mount_inventory(
        &server,
        json!([{ "uuid": "a-a-a-a", "room": "Kitchen", "name": "Ceiling", "type": "RelayOutput", "value": false }]),
    )
    .await;
    Mock::given(method("PUT"))
        .and(path("/api/uuid/a-a-a-a"))
        .and(body_json(json!({ "value": true })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let bridge = bridge(&server, Arc::new(LocalHost::in_memory()));
    bridge.discovery.run_discovery().await.unwrap();
    assert_eq!(bridge.registry.len(), 1);

    let outcome = bridge
        .registry
        .dispatch_local("a-a-a-a", LocalChange::On(true))
        .await
        .unwrap();
    assert_eq!(outcome, WriteOutcome::Written);

    let accessory = bridge.host.cached_accessory("a-a-a-a").unwrap();
    let version = accessory.characteristic(CharacteristicKind::On).version();

    assert_eq!(push(&bridge, "/uuid/a-a-a-a/true").await, StatusCode::NO_CONTENT);
    assert!(accessory.is_on());
    assert_eq!(accessory.characteristic(CharacteristicKind::On).version(), version);

    // Same command again: the remote already holds it
    let outcome = bridge
        .registry
        .dispatch_local("a-a-a-a", LocalChange::On(true))
        .await
        .unwrap();
    assert_eq!(outcome, WriteOutcome::Skipped);
    // `expect(1)` on the PUT mock is verified when the server drops
}

#[tokio::test]
async fn test_dimmer_remembers_level_across_remote_off() {
    let server = MockServer::start().await;
    let id = "11111111-2222-3333-4444-555555555555";
    mount_inventory(
        &server,
        json!([{ "uuid": id, "room": "Hall", "name": "Spots", "type": "DimmerOutput", "value": 40 }]),
    )
    .await;
    Mock::given(method("PUT"))
        .and(path(format!("/api/uuid/{id}")))
        .and(body_json(json!({ "value": 40 })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&server)
        .await;

    let bridge = bridge(&server, Arc::new(LocalHost::in_memory()));
    bridge.discovery.run_discovery().await.unwrap();

    push(&bridge, &format!("/uuid/{id}/0")).await;
    let accessory = bridge.host.cached_accessory(id).unwrap();
    assert!(!accessory.is_on());
    assert_eq!(accessory.brightness(), 40);

    let outcome = bridge
        .registry
        .dispatch_local(id, LocalChange::On(true))
        .await
        .unwrap();
    assert_eq!(outcome, WriteOutcome::Written);
    assert!(accessory.is_on());
}

#[tokio::test]
async fn test_restart_restores_from_cache_and_remove_all() {
    let server = MockServer::start().await;
    let id = "0f1e2d3c-4b5a-6978-8796-a5b4c3d2e1f0";
    mount_inventory(
        &server,
        json!([
            { "uuid": id, "room": "Kitchen", "name": "Ceiling", "type": "RelayOutput", "value": true },
            { "uuid": "ffffffff-0000-0000-0000-000000000000", "room": "Hall", "name": "Fan", "type": "Thermostat", "value": 21 }
        ]),
    )
    .await;

    let dir = tempfile::tempdir().unwrap();
    let cache = dir.path().join("accessories.json");

    {
        let first = bridge(&server, Arc::new(LocalHost::new(cache.clone())));
        let report = first.discovery.run_discovery().await.unwrap();
        assert_eq!(report.created, 1);
        first.host.flush().unwrap();
    }

    let second = bridge(&server, Arc::new(LocalHost::new(cache.clone())));
    assert_eq!(second.host.len(), 1);
    let report = second.discovery.run_discovery().await.unwrap();
    assert_eq!(report.restored, 1);
    assert_eq!(report.created, 0);
    assert!(second.host.cached_accessory(id).unwrap().is_on());

    assert_eq!(push(&second, "/removeAll").await, StatusCode::NO_CONTENT);
    assert!(second.registry.is_empty());
    assert!(second.host.is_empty());
    assert!(LocalHost::new(cache).is_empty());
}
