//! Discovery and API client against real local HTTP servers.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::Path;
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{delete, get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

use mooori_admin_lib::api::{AdminApi, ApiClient, API_TIMEOUT};
use mooori_admin_lib::candidates::{BackendEndpoint, CandidateProvider};
use mooori_admin_lib::config::{AppConfig, Platform};
use mooori_admin_lib::models::OrderStatus;
use mooori_admin_lib::network::ConnectionResolver;
use mooori_admin_lib::probe::{HttpProbe, Probe};
use mooori_admin_lib::screens::{
    DataSource, MutationOutcome, NoticeLevel, OrdersScreen, ProductsScreen,
};
use mooori_admin_lib::store::{MemoryStore, TOKEN_KEY, WORKING_URL_KEY};
use mooori_admin_lib::{AdminApp, Error};

const PROBE_TIMEOUT: Duration = Duration::from_millis(300);

async fn serve(router: Router) -> BackendEndpoint {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    BackendEndpoint::parse(&format!("http://{}", addr)).unwrap()
}

/// Accepts connections but answers long after any probe gave up.
async fn slow_backend() -> BackendEndpoint {
    serve(Router::new().fallback(|| async {
        tokio::time::sleep(Duration::from_secs(5)).await;
        "late"
    }))
    .await
}

async fn healthy_backend() -> BackendEndpoint {
    serve(Router::new().route("/api/health", get(|| async { "ok" }))).await
}

/// Port that was bound once and then released.
async fn dead_endpoint() -> BackendEndpoint {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    BackendEndpoint::parse(&format!("http://{}", addr)).unwrap()
}

fn resolver(store: &Arc<MemoryStore>) -> ConnectionResolver<HttpProbe> {
    let provider = CandidateProvider::new(Platform::Web, 4000, "http://127.0.0.1:4000")
        .with_fallback_hosts(Vec::<String>::new());
    ConnectionResolver::new(provider, HttpProbe::new(PROBE_TIMEOUT).unwrap(), store.clone())
}

#[tokio::test]
async fn slow_candidate_is_skipped_for_healthy_one() {
    let a = slow_backend().await;
    let b = healthy_backend().await;
    let store = Arc::new(MemoryStore::new());

    let started = std::time::Instant::now();
    let found = resolver(&store).resolve_from(&[a, b.clone()]).await.unwrap();

    assert_eq!(found, b);
    assert!(started.elapsed() < Duration::from_secs(3));
    assert_eq!(store.writes(), vec![(WORKING_URL_KEY.to_string(), b.to_string())]);
}

#[tokio::test]
async fn nothing_reachable_writes_nothing() {
    let store = Arc::new(MemoryStore::new());
    let candidates = [dead_endpoint().await, slow_backend().await];
    let err = resolver(&store).resolve_from(&candidates).await.unwrap_err();
    assert!(matches!(err, Error::NoBackendReachable));
    assert!(store.writes().is_empty());
}

#[tokio::test]
async fn probe_falls_through_to_root_path() {
    let root_only = serve(Router::new().route("/", get(|| async { "Mooori API" }))).await;
    let not_found = serve(Router::new()).await;
    let probe = HttpProbe::new(PROBE_TIMEOUT).unwrap();
    assert!(probe.probe(&root_only).await);
    assert!(!probe.probe(&not_found).await);
}

type Seen = Arc<Mutex<Vec<(String, Option<String>, Value)>>>;

/// Fake store backend recording (path, token header, body) per request.
async fn store_backend(seen: Seen) -> BackendEndpoint {
    fn record(seen: &Seen, path: &str, headers: &HeaderMap, body: Value) {
        let token = headers
            .get("token")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        seen.lock().unwrap().push((path.to_string(), token, body));
    }

    let s1 = seen.clone();
    let s2 = seen.clone();
    let s3 = seen.clone();
    let s4 = seen.clone();
    let router = Router::new()
        .route("/", get(|| async { "API Working" }))
        .route(
            "/api/user/profile",
            get(|headers: HeaderMap| async move {
                if headers.get("token").and_then(|v| v.to_str().ok()) == Some("jwt-1") {
                    Json(json!({ "success": true }))
                } else {
                    Json(json!({ "success": false, "message": "Not Authorized Login Again" }))
                }
            }),
        )
        .route(
            "/api/user/admin",
            post(|Json(body): Json<Value>| async move {
                if body["password"] == "123456789" {
                    Json(json!({ "success": true, "token": "jwt-1" }))
                } else {
                    Json(json!({ "success": false, "message": "Invalid credentials" }))
                }
            }),
        )
        .route(
            "/api/product/list",
            get(move |headers: HeaderMap| async move {
                record(&s1, "/api/product/list", &headers, Value::Null);
                Json(json!({
                    "success": true,
                    "products": [
                        { "_id": "p1", "name": "Linen Shirt", "category": "Men", "price": 39.5,
                          "image": ["https://cdn.example/p1.png"], "bestseller": true },
                    ],
                }))
            }),
        )
        .route(
            "/api/order/list",
            post(move |headers: HeaderMap, Json(body): Json<Value>| async move {
                record(&s2, "/api/order/list", &headers, body);
                Json(json!({
                    "success": true,
                    "orders": [{
                        "_id": "o1", "date": 1697328000000_i64, "status": "Order Placed",
                        "address": { "firstName": "Ann" },
                        "items": [{ "name": "Linen Shirt", "quantity": 2, "size": "M", "price": 39.5 }],
                        "amount": 79.0,
                    }],
                }))
            }),
        )
        .route(
            "/api/order/status",
            post(move |headers: HeaderMap, Json(body): Json<Value>| async move {
                record(&s3, "/api/order/status", &headers, body);
                Json(json!({ "success": true, "message": "Status Updated" }))
            }),
        )
        .route(
            "/api/review/delete/{id}",
            delete(move |Path(id): Path<String>, headers: HeaderMap| async move {
                record(&s4, "/api/review/delete", &headers, json!(id));
                Json(json!({ "success": true }))
            }),
        )
        .route(
            "/api/review/all",
            get(|| async {
                (
                    StatusCode::UNAUTHORIZED,
                    Json(json!({ "success": false, "message": "Not Authorized" })),
                )
            }),
        );
    serve(router).await
}

#[tokio::test]
async fn client_sends_token_and_decodes_envelopes() {
    let seen: Seen = Arc::default();
    let base = store_backend(seen.clone()).await;
    let client = ApiClient::new(base, Some("jwt-1"), API_TIMEOUT).unwrap();

    client.ping().await.unwrap();

    let products = client.list_products().await.unwrap().into_result("x").unwrap();
    assert_eq!(products.products.len(), 1);
    assert_eq!(products.products[0].id, "p1");

    let orders = client.list_orders().await.unwrap().into_result("x").unwrap().orders;
    assert_eq!(orders[0].total(), 79.0);
    assert_eq!(orders[0].status, OrderStatus::OrderPlaced);

    client
        .update_order_status("o1", OrderStatus::OutForDelivery)
        .await
        .unwrap()
        .into_result("x")
        .unwrap();
    client.delete_review("a/b").await.unwrap();

    let seen = seen.lock().unwrap().clone();
    assert!(seen.iter().all(|(_, token, _)| token.as_deref() == Some("jwt-1")));
    assert_eq!(seen[1].2, json!({}));
    assert_eq!(seen[2].2, json!({ "orderId": "o1", "status": "Out for delivery" }));
    assert_eq!(seen[3].2, json!("a/b"));
}

#[tokio::test]
async fn login_and_rejections() {
    let base = store_backend(Arc::default()).await;
    let client = ApiClient::new(base, None, API_TIMEOUT).unwrap();

    let ok = client.login("admin@gmail.com", "123456789").await.unwrap();
    assert_eq!(ok.into_result("x").unwrap().token.as_deref(), Some("jwt-1"));

    let refused = client.login("admin@gmail.com", "nope").await.unwrap();
    assert_eq!(
        refused.into_result("Login failed").unwrap_err().to_string(),
        "Invalid credentials"
    );

    let err = client.list_reviews().await.unwrap_err();
    assert!(matches!(err, Error::Unauthorized));
    assert!(err.is_auth());
}

#[tokio::test]
async fn screens_against_live_and_dead_backends() {
    let base = store_backend(Arc::default()).await;
    let client = ApiClient::new(base, Some("jwt-1"), API_TIMEOUT).unwrap();

    let mut products = ProductsScreen::new();
    products.refresh(Some(&client)).await;
    assert_eq!(products.state().source(), DataSource::Live);
    assert_eq!(products.state().items()[0].name, "Linen Shirt");

    let mut orders = OrdersScreen::new();
    orders.refresh(Some(&client)).await;
    assert_eq!(orders.state().source(), DataSource::Live);

    let dead = ApiClient::new(dead_endpoint().await, Some("jwt-1"), API_TIMEOUT).unwrap();
    let outcome = orders.set_status(Some(&dead), "o1", OrderStatus::Shipped).await;
    assert_eq!(outcome, MutationOutcome::LocalOnly);
    assert_eq!(orders.state().items()[0].status, OrderStatus::Shipped);

    let mut fallback = ProductsScreen::new();
    fallback.refresh(Some(&dead)).await;
    assert!(fallback.state().is_sample());
    assert_eq!(
        fallback.state().items(),
        mooori_admin_lib::sample::products().as_slice()
    );
}

fn app_for(base: &BackendEndpoint, tokens: &Arc<MemoryStore>) -> AdminApp {
    let urls = Arc::new(MemoryStore::with(WORKING_URL_KEY, base.as_str()));
    AdminApp::with_stores(AppConfig::default(), urls, tokens.clone())
}

#[tokio::test]
async fn startup_keeps_a_token_the_backend_accepts() {
    let seen: Seen = Arc::default();
    let base = store_backend(seen.clone()).await;
    let tokens = Arc::new(MemoryStore::with(TOKEN_KEY, "jwt-1"));
    let mut app = app_for(&base, &tokens);

    app.start_with(HttpProbe::new(PROBE_TIMEOUT).unwrap()).await.unwrap();

    assert_eq!(app.backend_url(), Some(&base));
    assert_eq!(app.session().token(), Some("jwt-1"));
    assert_eq!(tokens.peek(TOKEN_KEY).as_deref(), Some("jwt-1"));

    let mut orders = OrdersScreen::new();
    app.refresh_orders(&mut orders).await.unwrap();
    assert_eq!(orders.state().source(), DataSource::Live);
    let seen = seen.lock().unwrap().clone();
    assert_eq!(seen[0].0, "/api/order/list");
    assert_eq!(seen[0].1.as_deref(), Some("jwt-1"));
}

#[tokio::test]
async fn startup_drops_a_token_the_backend_refuses() {
    let base = store_backend(Arc::default()).await;
    let tokens = Arc::new(MemoryStore::with(TOKEN_KEY, "expired"));
    let mut app = app_for(&base, &tokens);

    app.start_with(HttpProbe::new(PROBE_TIMEOUT).unwrap()).await.unwrap();

    assert!(app.backend_url().is_some());
    assert!(!app.session().is_authenticated());
    assert_eq!(tokens.peek(TOKEN_KEY), None);
}

#[tokio::test]
async fn malformed_rows_are_an_error_not_offline_mode() {
    let base = serve(Router::new().route(
        "/api/product/list",
        get(|| async {
            Json(json!({
                "success": true,
                "products": [{ "_id": "1", "name": "x", "price": "12" }],
            }))
        }),
    ))
    .await;
    let client = ApiClient::new(base, None, API_TIMEOUT).unwrap();

    let err = client.list_products().await.unwrap_err();
    assert!(!err.is_network());

    let mut products = ProductsScreen::new();
    products.refresh(Some(&client)).await;
    assert!(products.state().is_sample());
    let notices = products.state_mut().take_notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].level, NoticeLevel::Error);
    assert_eq!(notices[0].title, "Failed to load products");
}

#[tokio::test]
async fn unknown_order_status_keeps_the_live_list() {
    let base = serve(Router::new().route(
        "/api/order/list",
        post(|| async {
            Json(json!({
                "success": true,
                "orders": [
                    { "_id": "o1", "status": "Returned", "items": [] },
                    { "_id": "o2", "status": "Shipped", "items": [] },
                ],
            }))
        }),
    ))
    .await;
    let client = ApiClient::new(base, Some("jwt-1"), API_TIMEOUT).unwrap();

    let mut orders = OrdersScreen::new();
    orders.refresh(Some(&client)).await;
    assert_eq!(orders.state().source(), DataSource::Live);
    assert_eq!(orders.state().items()[0].status, OrderStatus::Unknown);
    assert_eq!(orders.state().items()[1].status, OrderStatus::Shipped);
}
