//! In-process mock of the marketplace backend.

#![allow(dead_code)]

use axum::extract::{Multipart, Path, Request, State};
use axum::http::{HeaderMap, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use software_market::auth::AuthFlow;
use software_market::{session_channel, ApiClient, ClientConfig};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const TOKEN: &str = "tok-123";
pub const PASSWORD: &str = "secret1";

/// One multipart part as the server saw it.
#[derive(Debug, Clone, PartialEq)]
pub struct Part {
    pub name: String,
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl Part {
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }
}

pub struct MockState {
    hits: AtomicUsize,
    pub uploads: Mutex<Vec<Vec<Part>>>,
    pub json_bodies: Mutex<Vec<(String, Value)>>,
    pub auth_headers: Mutex<Vec<Option<String>>>,
    pub upload_status: Mutex<StatusCode>,
    pub upload_delay: Mutex<Option<Duration>>,
    pub wrap_created: Mutex<bool>,
}

impl Default for MockState {
    fn default() -> Self {
        Self {
            hits: AtomicUsize::new(0),
            uploads: Mutex::new(Vec::new()),
            json_bodies: Mutex::new(Vec::new()),
            auth_headers: Mutex::new(Vec::new()),
            upload_status: Mutex::new(StatusCode::CREATED),
            upload_delay: Mutex::new(None),
            wrap_created: Mutex::new(true),
        }
    }
}

impl MockState {
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn fail_uploads_with(&self, status: StatusCode) {
        *self.upload_status.lock().unwrap() = status;
    }

    pub fn delay_uploads(&self, delay: Duration) {
        *self.upload_delay.lock().unwrap() = Some(delay);
    }

    pub fn last_json(&self, route: &str) -> Option<Value> {
        self.json_bodies
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(r, _)| r == route)
            .map(|(_, body)| body.clone())
    }

    fn record_json(&self, route: &str, body: Value) {
        self.json_bodies
            .lock()
            .unwrap()
            .push((route.to_string(), body));
    }
}

pub struct MockBackend {
    pub base_url: String,
    pub state: Arc<MockState>,
}

impl MockBackend {
    pub async fn spawn() -> Self {
        let state = Arc::new(MockState::default());
        let app = router(state.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url: format!("http://{addr}/api"),
            state,
        }
    }

    /// A signed-out auth flow talking to this backend.
    pub fn auth_flow(&self) -> AuthFlow {
        let (writer, reader) = session_channel();
        let api = ApiClient::new(ClientConfig::new(&self.base_url), reader).unwrap();
        AuthFlow::new(api, writer)
    }

    pub async fn signed_in(&self) -> AuthFlow {
        let flow = self.auth_flow();
        flow.login("ada@example.org", PASSWORD).await.unwrap();
        flow
    }
}

fn router(state: Arc<MockState>) -> Router {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
        .route("/api/auth/forgot-password", post(forgot_password))
        .route("/api/products", get(list_products).post(create_product))
        .route(
            "/api/products/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/api/user", get(current_user))
        .route("/api/user/products", get(my_products))
        .route("/api/user/change-password", post(change_password))
        .route("/api/reviews/:id", get(list_reviews).post(post_review))
        .layer(middleware::from_fn_with_state(state.clone(), count_hits))
        .with_state(state)
}

async fn count_hits(State(state): State<Arc<MockState>>, request: Request, next: Next) -> Response {
    state.hits.fetch_add(1, Ordering::SeqCst);
    let auth = request
        .headers()
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    state.auth_headers.lock().unwrap().push(auth);
    next.run(request).await
}

fn bearer_ok(headers: &HeaderMap) -> bool {
    headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {TOKEN}"))
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": "Invalid or expired token" })),
    )
        .into_response()
}

fn user_json() -> Value {
    json!({
        "id": 7,
        "name": "Ada",
        "email": "ada@example.org",
        "role": "seller",
        "created_at": "2024-01-01T00:00:00"
    })
}

pub fn alpha() -> Value {
    json!({
        "id": 1,
        "title": "Alpha",
        "description": "First tool in the list",
        "category": "utilities",
        "tags": ["x"],
        "version": 1.0,
        "license": "MIT",
        "oncodash_version": "0.6.0",
        "price": 0,
        "downloadCount": 10,
        "rating": "4.5",
        "featured": true,
        "createdAt": "2024-01-01T00:00:00Z",
        "seller": { "id": 7, "name": "Ada" }
    })
}

pub fn beta() -> Value {
    json!({
        "id": "2",
        "title": "Beta",
        "description": "Second tool, paid",
        "category": "design",
        "tags": ["y"],
        "price": 30,
        "download_count": 100,
        "rating": null,
        "created_at": "2024-03-01"
    })
}

async fn register(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    state.record_json("register", body.clone());
    if body["email"] == "taken@example.org" {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Email already registered" })),
        )
            .into_response();
    }
    let mut user = user_json();
    user["name"] = body["name"].clone();
    (StatusCode::CREATED, Json(json!({ "user": user }))).into_response()
}

async fn login(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    state.record_json("login", body.clone());
    if body["password"] != PASSWORD {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "error": "Invalid email or password" })),
        )
            .into_response();
    }
    Json(json!({ "token": TOKEN, "user": user_json() })).into_response()
}

async fn forgot_password(State(state): State<Arc<MockState>>, Json(body): Json<Value>) -> Response {
    state.record_json("forgot-password", body);
    Json(json!({ "message": "Reset email sent" })).into_response()
}

async fn list_products() -> Json<Value> {
    Json(json!([alpha(), beta()]))
}

async fn get_product(Path(id): Path<String>) -> Response {
    let product = match id.as_str() {
        "1" => alpha(),
        "2" => beta(),
        _ => {
            return (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "Product not found" })),
            )
                .into_response()
        }
    };
    let mut detail = product;
    detail["reviews"] = json!([{
        "id": 3,
        "productId": id,
        "userId": 9,
        "userName": "Grace",
        "rating": 5,
        "comment": "Great",
        "createdAt": "2024-02-02T10:00:00Z"
    }]);
    detail["versions"] = json!([{ "id": 11, "version": "0.9.0" }]);
    Json(detail).into_response()
}

async fn create_product(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    if !bearer_ok(&headers) {
        return unauthorized();
    }

    let mut parts = Vec::new();
    while let Some(field) = multipart.next_field().await.unwrap() {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await.unwrap().to_vec();
        parts.push(Part {
            name,
            file_name,
            content_type,
            data,
        });
    }

    let delay = *state.upload_delay.lock().unwrap();
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    state.uploads.lock().unwrap().push(parts.clone());

    let status = *state.upload_status.lock().unwrap();
    if !status.is_success() {
        return (status, Json(json!({ "error": "rejected by mock" }))).into_response();
    }

    let title = parts
        .iter()
        .find(|p| p.name == "title")
        .map(Part::text)
        .unwrap_or_default();
    let product = json!({ "id": 42, "title": title, "price": 0 });
    let body = if *state.wrap_created.lock().unwrap() {
        json!({ "message": "Product created", "product": product })
    } else {
        product
    };
    (StatusCode::CREATED, Json(body)).into_response()
}

async fn update_product(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if !bearer_ok(&headers) {
        return unauthorized();
    }
    state.record_json("update", body.clone());
    let mut product = body;
    product["id"] = json!(id);
    Json(json!({ "message": "Product updated", "product": product })).into_response()
}

async fn delete_product(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if !bearer_ok(&headers) {
        return unauthorized();
    }
    if id == "1" {
        return (
            StatusCode::FORBIDDEN,
            Json(json!({ "message": "You can only delete your own products" })),
        )
            .into_response();
    }
    state.record_json("delete", json!({ "id": id }));
    Json(json!({ "message": "Product deleted" })).into_response()
}

async fn current_user(headers: HeaderMap) -> Response {
    if !bearer_ok(&headers) {
        return unauthorized();
    }
    Json(user_json()).into_response()
}

async fn my_products(headers: HeaderMap) -> Response {
    if !bearer_ok(&headers) {
        return unauthorized();
    }
    Json(json!([alpha()])).into_response()
}

async fn change_password(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if !bearer_ok(&headers) {
        return unauthorized();
    }
    state.record_json("change-password", body.clone());
    if body["currentPassword"] != PASSWORD {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Current password is incorrect" })),
        )
            .into_response();
    }
    Json(json!({ "message": "Password updated" })).into_response()
}

async fn list_reviews(Path(id): Path<String>) -> Json<Value> {
    Json(json!([{ "id": 3, "product_id": id, "user_name": "Grace", "rating": 4, "comment": "Good" }]))
}

async fn post_review(
    State(state): State<Arc<MockState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if !bearer_ok(&headers) {
        return unauthorized();
    }
    state.record_json("review", body.clone());
    (
        StatusCode::CREATED,
        Json(json!({
            "id": 99,
            "productId": id,
            "userId": 7,
            "userName": "Ada",
            "rating": body["rating"],
            "comment": body["comment"]
        })),
    )
        .into_response()
}
