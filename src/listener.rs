//! Push listener.
//!
//! The eLights controller reports value changes by calling
//! `GET /uuid/{id}/{value}`. `/removeAll` drops every bridged accessory.
//! Every request is answered with `204 No Content`, whatever it contained.

use crate::host::AccessoryHost;
use crate::registry::ComponentRegistry;
use crate::remote::RemoteValue;
use axum::Router;
use axum::extract::State;
use axum::http::{StatusCode, Uri};
use log::{debug, error, info};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

const UPDATE_PREFIX: &str = "/uuid/";
const REMOVE_ALL: &str = "/removeAll";

/// Shared state of the push listener.
#[derive(Clone)]
pub struct ListenerState {
    pub registry: Arc<ComponentRegistry>,
    pub host: Arc<dyn AccessoryHost>,
}

impl ListenerState {
    pub fn new(registry: Arc<ComponentRegistry>, host: Arc<dyn AccessoryHost>) -> Self {
        Self { registry, host }
    }
}

/// A value pushed for one component.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PushedValue {
    pub id: String,
    pub value: RemoteValue,
}

impl PushedValue {
    /// Extract `{id}/{value}` following the first `/uuid/` in `path`.
    ///
    /// The id must be a non-empty run of lowercase hex digits and dashes
    /// terminated by `/`; the value is everything after it.
    pub fn from_path(path: &str) -> Option<Self> {
        let start = path.find(UPDATE_PREFIX)? + UPDATE_PREFIX.len();
        let (id, raw) = path[start..].split_once('/')?;
        let valid_id = !id.is_empty()
            && id
                .chars()
                .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c) || c == '-');
        if !valid_id {
            return None;
        }
        Some(Self {
            id: id.to_string(),
            value: RemoteValue::parse(raw),
        })
    }
}

/// Build the push router. All paths and methods land in one handler.
pub fn router(state: ListenerState) -> Router {
    Router::new().fallback(handle_push).with_state(state)
}

async fn handle_push(State(state): State<ListenerState>, uri: Uri) -> StatusCode {
    let path = uri.path();
    debug!("[Push] {}", path);

    if let Some(pushed) = PushedValue::from_path(path) {
        apply_pushed_value(&state, &pushed);
    }

    if path.contains(REMOVE_ALL) {
        remove_all(&state);
    }

    StatusCode::NO_CONTENT
}

fn apply_pushed_value(state: &ListenerState, pushed: &PushedValue) {
    let adapter = match state.registry.lookup(&pushed.id) {
        Ok(adapter) => adapter,
        Err(e) => {
            error!("[Push] {}", e);
            return;
        }
    };
    if let Err(e) = adapter.apply_remote_change(&pushed.value) {
        error!("[Push] {}", e);
    }
}

/// Unregister everything the host knows, including cached accessories no
/// adapter was ever bound to, then empty the registry.
fn remove_all(state: &ListenerState) {
    let accessories = state.host.accessories();
    info!("[Push] Removing all {} accessories", accessories.len());
    state.host.unregister_accessories(&accessories);
    state.registry.clear();
}

/// Serve the push router on `addr` until `shutdown` is cancelled.
pub async fn run_listener(
    addr: SocketAddr,
    state: ListenerState,
    shutdown: CancellationToken,
) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("[Push] Listening for pushes on {}", addr);
    axum::serve(listener, router(state))
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapter::Adapter;
    use crate::host::LocalHost;
    use crate::remote::fake::FakeRemote;
    use crate::remote::{ComponentKind, RemoteApi};
    use axum::body::Body;
    use axum::http::{Method, Request};
    use tower::ServiceExt;

    const RELAY: &str = "0f1e2d3c-4b5a-6978-8796-a5b4c3d2e1f0";
    const DIMMER: &str = "11111111-2222-3333-4444-555555555555";

    fn setup() -> (ListenerState, Arc<LocalHost>, Arc<FakeRemote>) {
        let fake = Arc::new(FakeRemote::default());
        let remote: Arc<dyn RemoteApi> = fake.clone();
        let host = Arc::new(LocalHost::in_memory());
        let registry = Arc::new(ComponentRegistry::new());

        for (id, kind) in [(RELAY, ComponentKind::Switch), (DIMMER, ComponentKind::Dimmer)] {
            let accessory = host.create_accessory("Test", id);
            host.register_accessory(accessory.clone());
            registry.insert(Adapter::bind(kind, accessory, remote.clone()));
        }

        (ListenerState::new(registry, host.clone()), host, fake)
    }

    async fn send(state: &ListenerState, method: Method, uri: &str) -> StatusCode {
        router(state.clone())
            .oneshot(
                Request::builder()
                    .method(method)
                    .uri(uri)
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap()
            .status()
    }

    #[test]
    fn test_parse_push_path() {
        let pushed = PushedValue::from_path(&format!("/uuid/{RELAY}/true")).unwrap();
        assert_eq!(pushed.id, RELAY);
        assert_eq!(pushed.value, RemoteValue::Bool(true));

        let pushed = PushedValue::from_path("/prefix/uuid/a-a-a-a/42").unwrap();
        assert_eq!(pushed.id, "a-a-a-a");
        assert_eq!(pushed.value, RemoteValue::Number(42));

        let pushed = PushedValue::from_path("/uuid/abc/").unwrap();
        assert_eq!(pushed.value, RemoteValue::Unparsed(String::new()));

        assert!(PushedValue::from_path("/uuid/ABC/true").is_none());
        assert!(PushedValue::from_path("/uuid/xyz/true").is_none());
        assert!(PushedValue::from_path("/uuid//true").is_none());
        assert!(PushedValue::from_path("/uuid/abc").is_none());
        assert!(PushedValue::from_path("/status").is_none());
    }

    #[tokio::test]
    async fn test_push_updates_accessories() {
        let (state, host, fake) = setup();

        let status = send(&state, Method::GET, &format!("/uuid/{RELAY}/true")).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(host.cached_accessory(RELAY).unwrap().is_on());

        send(&state, Method::GET, &format!("/uuid/{DIMMER}/65")).await;
        let dimmer = host.cached_accessory(DIMMER).unwrap();
        assert!(dimmer.is_on());
        assert_eq!(dimmer.brightness(), 65);

        send(&state, Method::GET, &format!("/uuid/{DIMMER}/0")).await;
        assert!(!dimmer.is_on());
        assert_eq!(dimmer.brightness(), 65);

        assert!(fake.writes().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_id_is_ignored() {
        let (state, host, _fake) = setup();

        let status = send(&state, Method::GET, "/uuid/deadbeef/true").await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert_eq!(state.registry.len(), 2);
        assert_eq!(host.len(), 2);
    }

    #[tokio::test]
    async fn test_unparseable_value_is_ignored() {
        let (state, host, _fake) = setup();
        send(&state, Method::GET, &format!("/uuid/{DIMMER}/40")).await;

        for value in ["abc", "150", "true"] {
            let status = send(&state, Method::GET, &format!("/uuid/{DIMMER}/{value}")).await;
            assert_eq!(status, StatusCode::NO_CONTENT);
        }
        assert_eq!(host.cached_accessory(DIMMER).unwrap().brightness(), 40);
    }

    #[tokio::test]
    async fn test_remove_all() {
        let (state, host, _fake) = setup();

        let status = send(&state, Method::GET, "/removeAll").await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(state.registry.is_empty());
        assert!(host.is_empty());

        // Pushes for removed ids are now unknown
        send(&state, Method::GET, &format!("/uuid/{RELAY}/true")).await;
        assert!(state.registry.is_empty());

        let status = send(&state, Method::GET, "/removeAll").await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(state.registry.is_empty());
    }

    #[tokio::test]
    async fn test_remove_all_clears_unbound_cached_accessories() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("accessories.json");
        {
            let host = LocalHost::new(path.clone());
            host.register_accessory(host.create_accessory("Cellar Lamp", "dead-beef"));
        }

        // Restored from cache, but discovery never bound an adapter to it
        let host = Arc::new(LocalHost::new(path.clone()));
        assert_eq!(host.len(), 1);
        let state = ListenerState::new(Arc::new(ComponentRegistry::new()), host.clone());

        let status = send(&state, Method::GET, "/removeAll").await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(host.is_empty());
        assert!(state.registry.is_empty());
        assert!(LocalHost::new(path).is_empty());
    }

    #[tokio::test]
    async fn test_any_request_gets_no_content() {
        let (state, _host, _fake) = setup();
        let put = format!("/uuid/{RELAY}/false");

        for (method, uri) in [
            (Method::GET, "/"),
            (Method::POST, "/whatever"),
            (Method::PUT, put.as_str()),
            (Method::DELETE, "/uuid/not-hex!/true"),
        ] {
            assert_eq!(send(&state, method, uri).await, StatusCode::NO_CONTENT);
        }
        assert_eq!(state.registry.len(), 2);
    }
}
