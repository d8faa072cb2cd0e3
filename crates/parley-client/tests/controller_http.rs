//! Controller against a mocked HTTP backend (request/response transport).

use std::sync::Arc;
use std::time::Duration;

use parley_client::{ChatController, HttpChatApi, Outcome, Render};
use parley_core::{ActionMethod, PendingAction};
use parley_settings::{ParleySettings, TransportMode};
use parley_store::{ClientStore, FileStore};
use serde_json::json;
use tokio::time::timeout;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TIMEOUT: Duration = Duration::from_secs(5);

fn settings(server: &MockServer, dir: &std::path::Path) -> ParleySettings {
    let mut settings = ParleySettings::default();
    settings.api.base_url = format!("{}/api", server.uri());
    settings.transport.mode = TransportMode::Request;
    settings.data_dir = Some(dir.to_path_buf());
    settings
}

fn controller(settings: ParleySettings) -> (Arc<FileStore>, ChatController) {
    let api = Arc::new(HttpChatApi::new(&settings.api).unwrap());
    let store = Arc::new(FileStore::new(settings.store_path()));
    let controller = ChatController::new(settings, api, store.clone());
    (store, controller)
}

async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({"email": "reader@example.com", "password": "secret"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "jwt-1",
            "token_type": "bearer",
            "user": {"id": 1, "email": "reader@example.com", "username": "reader"}
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn login_chat_and_reply() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    mount_login(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/sessions/current"))
        .and(header("authorization", "Bearer jwt-1"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"detail": "No session"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/sessions/new"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 4,
            "session_id": "b1c2d3e4-0000-4000-8000-000000000000",
            "created_at": "2024-05-01T10:00:00Z"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/chat/message"))
        .and(body_json(json!({
            "session_id": "b1c2d3e4-0000-4000-8000-000000000000",
            "text": "Hello"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"reply": "Hi, reader"})))
        .expect(1)
        .mount(&server)
        .await;

    let (store, mut controller) = controller(settings(&server, dir.path()));
    let _ = controller.login("reader@example.com", "secret").await.unwrap();
    assert_eq!(store.token().as_deref(), Some("jwt-1"));

    let out = controller.start_chat().await.unwrap();
    assert!(out.contains(&Render::SessionLabel(Some("#b1c2d3e4".into()))));

    let _ = controller.submit("Hello").unwrap();
    let event = timeout(TIMEOUT, controller.next_event()).await.unwrap();
    let out = controller.handle(event).await;
    assert!(out.contains(&Render::Busy(false)));
    assert_eq!(controller.state().messages.len(), 2);
    assert_eq!(controller.state().messages[1].text, "Hi, reader");
}

#[tokio::test]
async fn server_error_becomes_bot_styled_failure() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    mount_login(&server).await;
    Mock::given(method("GET"))
        .and(path("/api/sessions/current"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": 8})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/sessions/8/messages"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/chat/message"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({"detail": "model offline"})))
        .mount(&server)
        .await;

    let (_store, mut controller) = controller(settings(&server, dir.path()));
    let _ = controller.login("reader@example.com", "secret").await.unwrap();
    let _ = controller.start_chat().await.unwrap();
    let _ = controller.submit("Hello").unwrap();

    let event = timeout(TIMEOUT, controller.next_event()).await.unwrap();
    let _ = controller.handle(event).await;
    let last = controller.state().messages.last().unwrap();
    assert!(last.text.contains("model offline"), "{}", last.text);
    assert!(!controller.state().busy);
}

#[tokio::test]
async fn sync_replays_until_first_failure() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    Mock::given(method("POST"))
        .and(path("/api/user/lists/reading"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/user/lists/wishlist"))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let settings = settings(&server, dir.path());
    {
        let store = FileStore::new(settings.store_path());
        let actions: Vec<_> = ["reading", "wishlist", "finished"]
            .iter()
            .map(|list| {
                PendingAction::new(
                    format!("/user/lists/{list}"),
                    ActionMethod::Post,
                    Some(json!({"bookId": 1})),
                )
            })
            .collect();
        store.set_offline_actions(&actions).unwrap();
    }

    let (store, mut controller) = controller(settings);
    let (report, _) = controller.sync().await;
    assert_eq!(report.replayed, 1);
    assert_eq!(report.remaining, 2);
    assert!(report.error.unwrap().source.is_connectivity());

    let left: Vec<_> = store
        .offline_actions()
        .into_iter()
        .map(|a| a.endpoint)
        .collect();
    assert_eq!(left, ["/user/lists/wishlist", "/user/lists/finished"]);
}

#[tokio::test]
async fn unreachable_backend_defers_list_changes() {
    let dir = tempfile::tempdir().unwrap();
    let mut settings = ParleySettings::default();
    settings.api.base_url = "http://127.0.0.1:1/api".into();
    settings.data_dir = Some(dir.path().to_path_buf());

    let (store, mut controller) = controller(settings);
    let outcome = controller.add_to_list("reading", "12").await.unwrap();
    assert_eq!(outcome, Outcome::Deferred { pending: 1 });

    let logged = store.offline_actions();
    assert_eq!(logged[0].endpoint, "/user/lists/reading");
    assert_eq!(logged[0].payload, Some(json!({"bookId": 12})));
}

#[tokio::test]
async fn lists_hit_the_network_once_within_ttl() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    Mock::given(method("GET"))
        .and(path("/api/user/lists"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"reading": [1, 2]})))
        .expect(1)
        .mount(&server)
        .await;

    let (_store, mut controller) = controller(settings(&server, dir.path()));
    let first = controller.lists().await.unwrap();
    let second = controller.lists().await.unwrap();
    assert_eq!(first, second);
    assert_eq!(first["reading"], json!([1, 2]));
}
