use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use clap::Parser;
use reqwest::{Method, Url};
use serde_json::{json, Value};

use crate::app::{build_settings, App};
use crate::cli::args::{CliArgs, Command, ListArgs};
use crate::client::{ApiRequest, RawResponse, RequestClient, RetryPolicy, Transport, TransportError};
use crate::config::ConfigFile;
use crate::session::{FileStorage, SessionStore};

/// Routes by method and path; unknown routes answer 404.
struct Backend {
    routes: Vec<(Method, &'static str, u16, Value)>,
    seen: Mutex<Vec<ApiRequest>>,
}

impl Backend {
    fn new(routes: Vec<(Method, &'static str, u16, Value)>) -> Arc<Self> {
        Arc::new(Self {
            routes,
            seen: Mutex::new(Vec::new()),
        })
    }

    fn seen(&self) -> Vec<ApiRequest> {
        self.seen.lock().unwrap().clone()
    }

    fn body_of(&self, method: Method, path: &str) -> Option<Value> {
        self.seen()
            .into_iter()
            .find(|r| r.method == method && Url::parse(&r.url).unwrap().path() == path)
            .and_then(|r| r.body)
    }
}

#[async_trait]
impl Transport for Backend {
    async fn send(&self, request: &ApiRequest) -> Result<RawResponse, TransportError> {
        self.seen.lock().unwrap().push(request.clone());
        let path = Url::parse(&request.url).unwrap().path().to_string();
        match self
            .routes
            .iter()
            .find(|(m, p, _, _)| *m == request.method && *p == path)
        {
            Some((_, _, status, body)) => Ok(RawResponse::json_body(*status, body)),
            None => Ok(RawResponse::new(404, "")),
        }
    }
}

fn app(backend: Arc<Backend>, session: SessionStore) -> App {
    let args = CliArgs::parse_from(["paws", "health"]);
    let settings = build_settings(&args, ConfigFile::default()).unwrap();
    let policy = RetryPolicy {
        backoff: Duration::ZERO,
        ..settings.retry.clone()
    };
    App::with_client(settings, RequestClient::new(backend, policy), session).unwrap()
}

fn command(argv: &[&str]) -> Command {
    let mut full = vec!["paws"];
    full.extend_from_slice(argv);
    CliArgs::parse_from(full).command
}

fn animals(n: usize) -> Value {
    Value::Array(
        (1..=n)
            .map(|i| {
                json!({
                    "id": i,
                    "name": format!("Pet{i}"),
                    "type": if i % 2 == 0 { "Dog" } else { "Cat" },
                    "breed": if i == 4 { "Beagle" } else { "Mixed Breed" },
                    "status": "AVAILABLE"
                })
            })
            .collect(),
    )
}

#[tokio::test]
async fn list_applies_filters_and_page() {
    let backend = Backend::new(vec![(Method::GET, "/animals/available", 200, animals(20))]);
    let mut app = app(backend, SessionStore::in_memory());

    app.run(command(&["list", "--type", "dog", "--page", "2"]))
        .await
        .unwrap();
    let list = app.listing().unwrap();
    assert_eq!(list.filtered_count(), 10);
    assert_eq!(list.page_number(), 2);
    let names: Vec<_> = list.view().items.iter().map(|a| a.name.clone()).collect();
    assert_eq!(names, vec!["Pet14", "Pet16", "Pet18", "Pet20"]);
}

#[tokio::test]
async fn list_page_out_of_range_is_an_error() {
    let backend = Backend::new(vec![(Method::GET, "/animals/available", 200, animals(3))]);
    let mut app = app(backend, SessionStore::in_memory());

    let err = app
        .run(Command::List(ListArgs {
            page: Some(4),
            ..ListArgs::default()
        }))
        .await
        .unwrap_err();
    assert!(err.contains("out of range"));
}

#[tokio::test]
async fn list_all_requires_login() {
    let backend = Backend::new(vec![]);
    let mut app = app(backend.clone(), SessionStore::in_memory());

    let err = app.run(command(&["list", "--all"])).await.unwrap_err();
    assert!(err.contains("login"));
    assert!(backend.seen().is_empty());
}

#[tokio::test]
async fn forbidden_all_listing_surfaces_server_message() {
    let backend = Backend::new(vec![(
        Method::GET,
        "/animals/all",
        403,
        json!({"message": "Admin access required"}),
    )]);
    let session = SessionStore::in_memory();
    let admin = serde_json::from_value(json!({"id": 1, "fullName": "Root", "role": "ADMIN"})).unwrap();
    session.save("admin-token", Some(&admin)).unwrap();
    let mut app = app(backend, session);

    let err = app.run(command(&["list", "--all"])).await.unwrap_err();
    assert_eq!(err, "Admin access required");
    assert!(app.api().session().is_authenticated());
}

#[tokio::test]
async fn list_all_falls_back_to_available_for_non_admins() {
    let backend = Backend::new(vec![
        (Method::GET, "/animals/available", 200, animals(2)),
        (Method::GET, "/animals/all", 200, animals(9)),
    ]);
    let session = SessionStore::in_memory();
    let user = serde_json::from_value(json!({"id": 2, "fullName": "Ada", "role": "USER"})).unwrap();
    session.save("user-token", Some(&user)).unwrap();
    let mut app = app(backend.clone(), session);

    app.run(command(&["list", "--all"])).await.unwrap();
    assert_eq!(app.listing().unwrap().records().len(), 2);
    let paths: Vec<_> = backend
        .seen()
        .iter()
        .map(|r| Url::parse(&r.url).unwrap().path().to_string())
        .collect();
    assert_eq!(paths, vec!["/animals/available"]);
}

#[tokio::test]
async fn admin_lists_every_animal() {
    let backend = Backend::new(vec![(Method::GET, "/animals/all", 200, animals(9))]);
    let session = SessionStore::in_memory();
    let admin = serde_json::from_value(json!({"id": 1, "fullName": "Root", "role": "admin"})).unwrap();
    session.save("admin-token", Some(&admin)).unwrap();
    let mut app = app(backend.clone(), session);

    app.run(command(&["list", "--all"])).await.unwrap();
    assert_eq!(app.listing().unwrap().records().len(), 9);
    assert_eq!(
        backend.seen()[0].header_value("Authorization"),
        Some("Bearer admin-token")
    );
}

#[tokio::test]
async fn corrupt_storage_file_does_not_block_login_or_logout() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("storage.json");
    std::fs::write(&path, "{\"authToken\": \"trunc").unwrap();
    let backend = Backend::new(vec![
        (
            Method::POST,
            "/users/login",
            200,
            json!({"token": "fake-jwt-token-3", "user": {"id": 3, "fullName": "Ada", "email": "ada@example.com"}}),
        ),
        (Method::POST, "/users/logout", 200, json!({})),
    ]);
    let session = SessionStore::new(Box::new(FileStorage::new(&path)));
    let mut app = app(backend, session);
    let login = ["login", "--email", "ada@example.com", "--password", "pw"];

    app.run(command(&login)).await.unwrap();
    assert!(app.api().session().is_authenticated());

    app.run(Command::Logout).await.unwrap();
    assert!(!app.api().session().is_authenticated());

    app.run(command(&login)).await.unwrap();
    let restored = SessionStore::new(Box::new(FileStorage::new(&path)));
    assert_eq!(restored.token().as_deref(), Some("fake-jwt-token-3"));
}

#[tokio::test]
async fn register_logs_in_afterwards() {
    let backend = Backend::new(vec![
        (
            Method::POST,
            "/users/register",
            200,
            json!({"message": "User registered successfully"}),
        ),
        (
            Method::POST,
            "/users/login",
            200,
            json!({"token": "fake-jwt-token-9", "user": {"id": 9, "fullName": "Grace", "email": "grace@example.com"}}),
        ),
    ]);
    let mut app = app(backend.clone(), SessionStore::in_memory());

    app.run(command(&[
        "register",
        "--name",
        "Grace",
        "--email",
        "grace@example.com",
        "--password",
        "pw",
        "--phone",
        "555-0100",
    ]))
    .await
    .unwrap();

    let session = app.api().session().load().unwrap();
    assert_eq!(session.token, "fake-jwt-token-9");
    assert_eq!(session.user.unwrap().id.as_deref(), Some("9"));
    let body = backend.body_of(Method::POST, "/users/login").unwrap();
    assert_eq!(body["email"], "grace@example.com");
}

#[tokio::test]
async fn donate_fills_donor_from_session() {
    let backend = Backend::new(vec![(
        Method::POST,
        "/donations/donate",
        200,
        json!({"message": "Thank you!"}),
    )]);
    let session = SessionStore::in_memory();
    let user = serde_json::from_value(json!({"id": "u1", "fullName": "Ada", "email": "ada@example.com"}))
        .unwrap();
    session.save("tok", Some(&user)).unwrap();
    let mut app = app(backend.clone(), session);

    app.run(command(&["donate", "--amount", "25"])).await.unwrap();

    let body = backend.body_of(Method::POST, "/donations/donate").unwrap();
    assert_eq!(body["amount"], 25.0);
    assert_eq!(body["donorEmail"], "ada@example.com");
    assert_eq!(body["donorName"], "Ada");
    assert_eq!(body["userId"], "u1");
    assert_eq!(body["paymentMethod"], "card");
}

#[tokio::test]
async fn update_fetches_patches_and_puts() {
    let backend = Backend::new(vec![
        (
            Method::GET,
            "/animals/7",
            200,
            json!({"id": 7, "name": "Rocky", "type": "dog", "breed": "Beagle", "status": "AVAILABLE"}),
        ),
        (
            Method::PUT,
            "/animals/7",
            200,
            json!({"message": "updated", "animal": {"id": 7, "name": "Rocky", "type": "dog", "status": "ADOPTED"}}),
        ),
    ]);
    let session = SessionStore::in_memory();
    session.save("admin-token", None).unwrap();
    let mut app = app(backend.clone(), session);

    app.run(command(&["update", "7", "--status", "adopted", "--location", "Oslo"]))
        .await
        .unwrap();

    let put = backend.body_of(Method::PUT, "/animals/7").unwrap();
    assert_eq!(put["status"], "ADOPTED");
    assert_eq!(put["location"], "Oslo");
    assert_eq!(put["breed"], "Beagle");
    let seen = backend.seen();
    assert_eq!(seen.last().unwrap().header_value("Authorization"), Some("Bearer admin-token"));
}

#[tokio::test]
async fn home_survives_a_failing_half() {
    let backend = Backend::new(vec![
        (Method::GET, "/animals/available", 200, animals(5)),
        (Method::GET, "/donations/recent", 500, json!({})),
        (Method::GET, "/health", 200, json!({"status": "UP"})),
    ]);
    let mut app = app(backend, SessionStore::in_memory());

    app.run(Command::Home).await.unwrap();
    assert_eq!(app.listing().unwrap().records().len(), 3);
}

#[tokio::test]
async fn home_features_only_available_animals() {
    let mut records = animals(5);
    records[0]["status"] = json!("ADOPTED");
    records[2]["status"] = json!("RESERVED");
    let backend = Backend::new(vec![
        (Method::GET, "/animals/available", 200, records),
        (Method::GET, "/donations/recent", 200, json!([])),
    ]);
    let mut app = app(backend, SessionStore::in_memory());

    app.run(Command::Home).await.unwrap();
    let ids: Vec<_> = app
        .listing()
        .unwrap()
        .records()
        .iter()
        .map(|a| a.id.clone())
        .collect();
    assert_eq!(ids, vec!["2", "4", "5"]);
}

#[tokio::test]
async fn home_fails_when_nothing_loads() {
    let backend = Backend::new(vec![]);
    let mut app = app(backend, SessionStore::in_memory());
    assert!(app.run(Command::Home).await.is_err());
}

#[tokio::test]
async fn expired_session_is_cleared_on_whoami() {
    let backend = Backend::new(vec![(
        Method::GET,
        "/users/me",
        401,
        json!({}),
    )]);
    let session = SessionStore::in_memory();
    session.save("stale", None).unwrap();
    let mut app = app(backend, session);

    let err = app.run(command(&["whoami", "--remote"])).await.unwrap_err();
    assert_eq!(err, "Session expired. Please login again.");
    assert!(!app.api().session().is_authenticated());
}

#[tokio::test]
async fn health_reports_unreachable_backend() {
    let backend = Backend::new(vec![]);
    let mut app = app(backend, SessionStore::in_memory());
    let err = app.run(Command::Health).await.unwrap_err();
    assert!(err.contains("not responding"));
}
