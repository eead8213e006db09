use crate::booking::{total_price, valid_seat, FORMATS, SHOWTIMES, SHOW_LANGUAGES, THEATRES};
use crate::credential::CredentialHasher;
use crate::filter::{filter_media, FilterSpec, MediaCategory, SortBy};
use crate::recommend::{QuestionnaireAnswers, Recommender, DEFAULT_RECOMMENDATIONS};
use crate::store::{
    new_object_id, BookingRecord, BookingStore, MemoryStore, UserRecord, UserStore,
};
use crate::tmdb::{self, collect_pages, CatalogApi, TmdbClient};
use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    routing::{delete, get, post, put},
    Json, Router,
};
use axum_extra::TypedHeader;
use chrono::{NaiveDate, Utc};
use constant_time_eq::constant_time_eq;
use headers::{authorization::Bearer, Authorization};
use hmac::{Hmac, Mac};
use serde::Deserialize;
use serde_json::{json, Value};
use sha2::Sha256;
use std::{collections::HashMap, env, net::SocketAddr, sync::Arc};
use tokio::sync::Mutex;
use tracing::{error, info, warn};

const MAX_BODY_BYTES: usize = 1024 * 1024; // 1MB safety cap
const PER_IP_LIMIT: u32 = 10; // credential attempts per minute
const PER_IP_BURST: u32 = 5;
const GLOBAL_LIMIT: u32 = 200; // per minute
const GLOBAL_BURST: u32 = 20;
const MAX_RATE_LIMIT_ENTRIES: usize = 10_000;
const TOKEN_TTL_SECS: i64 = 7 * 24 * 60 * 60;

#[derive(Clone)]
pub struct AppState {
    pub catalog: Arc<dyn CatalogApi>,
    pub users: Arc<dyn UserStore>,
    pub bookings: Arc<dyn BookingStore>,
    pub recommender: Arc<Recommender>,
    pub hasher: CredentialHasher,
    pub token_secret: String,
    pub rate_limits: Arc<Mutex<HashMap<String, WindowCounter>>>,
    pub global_limit: Arc<Mutex<WindowCounter>>,
}

#[derive(Clone, Debug)]
pub struct WindowCounter {
    pub window: u64,
    pub count: u32,
}

pub async fn run_server() -> Result<()> {
    let catalog: Arc<dyn CatalogApi> = Arc::new(TmdbClient::from_env()?);
    let token_secret = env::var("TOKEN_SECRET")
        .ok()
        .filter(|s| !s.is_empty())
        .ok_or_else(|| anyhow::anyhow!("TOKEN_SECRET must be set"))?;

    let recommender = match (env::var("CATALOG_PATH"), env::var("TOP_RATED_PATH")) {
        (Ok(movies_path), Ok(top_rated_path)) => {
            match Recommender::from_files(&movies_path, &top_rated_path) {
                Ok(r) => r,
                Err(e) => {
                    warn!(
                        "Failed to load recommendation datasets, recommendations disabled: {}",
                        e
                    );
                    Recommender::default()
                }
            }
        }
        _ => {
            warn!("CATALOG_PATH/TOP_RATED_PATH not set, recommendations disabled");
            Recommender::default()
        }
    };

    let store = Arc::new(MemoryStore::new());
    let state = AppState {
        catalog,
        users: store.clone(),
        bookings: store,
        recommender: Arc::new(recommender),
        hasher: CredentialHasher::from_env(),
        token_secret,
        rate_limits: Arc::new(Mutex::new(HashMap::new())),
        global_limit: Arc::new(Mutex::new(WindowCounter {
            window: 0,
            count: 0,
        })),
    };

    let app = build_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], 5000));
    info!("Listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/user/signup", post(signup))
        .route("/user/signin", post(signin))
        .route("/user/info", get(user_info))
        .route("/user/update-password", put(update_password))
        .route("/user/remove-user", delete(remove_user))
        .route("/media/filters", get(media_filters))
        .route("/media/discover", post(discover_media))
        .route("/media/search", get(search_media))
        .route("/media/:category/:id", get(media_detail))
        .route("/recommend", post(recommend_media))
        .route("/bookings", post(create_booking).get(list_bookings))
        .route("/bookings/:id", delete(remove_booking))
        .layer(tower_http::trace::TraceLayer::new_for_http())
        .layer(tower_http::limit::RequestBodyLimitLayer::new(MAX_BODY_BYTES))
        .with_state(state)
}

async fn health() -> &'static str {
    "OK"
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignupRequest {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
    #[serde(default)]
    confirm_password: String,
    #[serde(default)]
    display_name: String,
    #[serde(default)]
    email: String,
    #[serde(default)]
    phone_no: String,
}

fn validate_signup(req: &SignupRequest) -> Option<&'static str> {
    if req.username.trim().len() < 3 {
        return Some("username minimum 3 characters");
    }
    if req.password.len() < 8 {
        return Some("password minimum 8 characters");
    }
    if req.confirm_password != req.password {
        return Some("confirmPassword not match");
    }
    if req.display_name.trim().len() < 3 {
        return Some("displayName minimum 3 characters");
    }
    if req.email.trim().is_empty() {
        return Some("email is required");
    }
    if req.phone_no.trim().is_empty() {
        return Some("phoneNo is required");
    }
    None
}

async fn signup(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<SignupRequest>,
) -> (StatusCode, Json<Value>) {
    let ip = extract_ip(&headers);
    if !check_rate_limit(&state, &ip).await || !check_global_rate_limit(&state).await {
        warn!("Rate limit exceeded for {}", ip);
        return too_many_requests();
    }

    if let Some(message) = validate_signup(&req) {
        return bad_request(message);
    }

    match state.users.find_by_username(&req.username).await {
        Ok(Some(_)) => return bad_request("username already used"),
        Ok(None) => {}
        Err(e) => return internal_error(e),
    }

    let credential = match state.hasher.derive(&req.password) {
        Ok(c) => c,
        Err(e) => return internal_error(e),
    };
    let id = match new_object_id() {
        Ok(id) => id,
        Err(e) => return internal_error(e),
    };
    let user = UserRecord {
        id,
        username: req.username,
        display_name: req.display_name,
        email: req.email,
        phone_no: req.phone_no,
        password_hash: credential.hash,
        salt: credential.salt,
    };
    if let Err(e) = state.users.insert_user(user.clone()).await {
        warn!("Signup rejected: {}", e);
        return bad_request("username already used");
    }

    let token = match mint_token(&state.token_secret, &user.id) {
        Ok(t) => t,
        Err(e) => return internal_error(e),
    };
    info!("New user '{}' signed up", user.username);
    user_response(&user, token)
}

#[derive(Deserialize)]
struct SigninRequest {
    #[serde(default)]
    username: String,
    #[serde(default)]
    password: String,
}

async fn signin(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<SigninRequest>,
) -> (StatusCode, Json<Value>) {
    let ip = extract_ip(&headers);
    if !check_rate_limit(&state, &ip).await || !check_global_rate_limit(&state).await {
        warn!("Rate limit exceeded for {}", ip);
        return too_many_requests();
    }

    let user = match state.users.find_by_username(&req.username).await {
        Ok(Some(user)) => user,
        Ok(None) => return bad_request("User not exist"),
        Err(e) => return internal_error(e),
    };
    if !state.hasher.verify(&req.password, &user.salt, &user.password_hash) {
        return bad_request("Wrong password");
    }

    let token = match mint_token(&state.token_secret, &user.id) {
        Ok(t) => t,
        Err(e) => return internal_error(e),
    };
    info!("User '{}' signed in", user.username);
    user_response(&user, token)
}

async fn user_info(
    State(state): State<AppState>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
) -> (StatusCode, Json<Value>) {
    let user = match require_user(&state, auth).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    (StatusCode::OK, Json(json!(user)))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UpdatePasswordRequest {
    #[serde(default)]
    password: String,
    #[serde(default)]
    new_password: String,
    #[serde(default)]
    confirm_new_password: String,
}

async fn update_password(
    State(state): State<AppState>,
    headers: HeaderMap,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    Json(req): Json<UpdatePasswordRequest>,
) -> (StatusCode, Json<Value>) {
    let ip = extract_ip(&headers);
    if !check_rate_limit(&state, &ip).await || !check_global_rate_limit(&state).await {
        warn!("Rate limit exceeded for {}", ip);
        return too_many_requests();
    }

    let user = match require_user(&state, auth).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    if req.new_password.len() < 8 {
        return bad_request("newPassword minimum 8 characters");
    }
    if req.confirm_new_password != req.new_password {
        return bad_request("confirmNewPassword not match");
    }
    if !state.hasher.verify(&req.password, &user.salt, &user.password_hash) {
        return bad_request("Wrong password");
    }

    let credential = match state.hasher.derive(&req.new_password) {
        Ok(c) => c,
        Err(e) => return internal_error(e),
    };
    match state
        .users
        .update_credentials(&user.id, &credential.hash, &credential.salt)
        .await
    {
        Ok(true) => {
            info!("User '{}' updated password", user.username);
            (StatusCode::OK, Json(json!({ "message": "Password updated" })))
        }
        Ok(false) => unauthorized(),
        Err(e) => internal_error(e),
    }
}

async fn remove_user(
    State(state): State<AppState>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
) -> (StatusCode, Json<Value>) {
    let user = match require_user(&state, auth).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    if let Err(e) = state.bookings.remove_bookings_for_user(&user.id).await {
        return internal_error(e);
    }
    match state.users.remove_user(&user.id).await {
        Ok(true) => {
            info!("User '{}' removed their account", user.username);
            (StatusCode::OK, Json(json!({ "message": "User removed" })))
        }
        Ok(false) => unauthorized(),
        Err(e) => internal_error(e),
    }
}

async fn media_filters() -> (StatusCode, Json<Value>) {
    let genres: Vec<Value> = tmdb::GENRES
        .iter()
        .map(|(id, name)| json!({ "id": id, "name": name }))
        .collect();
    let languages: Vec<Value> = tmdb::LANGUAGES
        .iter()
        .map(|(code, name)| json!({ "code": code, "name": name }))
        .collect();
    let sorts: Vec<&str> = SortBy::ALL.iter().map(|s| s.as_str()).collect();
    (
        StatusCode::OK,
        Json(json!({
            "genres": genres,
            "languages": languages,
            "certifications": tmdb::CERTIFICATIONS,
            "certificationCountry": tmdb::CERTIFICATION_COUNTRY,
            "sortBy": sorts,
        })),
    )
}

fn default_page() -> u32 {
    1
}

#[derive(Deserialize)]
struct DiscoverRequest {
    #[serde(flatten)]
    spec: FilterSpec,
    #[serde(default = "default_page")]
    pages: u32,
}

async fn discover_media(
    State(state): State<AppState>,
    Json(req): Json<DiscoverRequest>,
) -> (StatusCode, Json<Value>) {
    let records = match collect_pages(state.catalog.as_ref(), &req.spec, req.pages).await {
        Ok(records) => records,
        Err(e) => return internal_error(e),
    };
    let results = filter_media(records, &req.spec);
    let total = results.len();
    (
        StatusCode::OK,
        Json(json!({ "results": results, "total_results": total })),
    )
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchQuery {
    #[serde(default)]
    media_category: MediaCategory,
    #[serde(default)]
    query: String,
    #[serde(default = "default_page")]
    page: u32,
}

async fn search_media(
    State(state): State<AppState>,
    Query(params): Query<SearchQuery>,
) -> (StatusCode, Json<Value>) {
    if params.query.trim().is_empty() {
        return bad_request("query is required");
    }
    match state
        .catalog
        .search(params.media_category, &params.query, params.page)
        .await
    {
        Ok(page) => (StatusCode::OK, Json(json!(page))),
        Err(e) => internal_error(e),
    }
}

async fn media_detail(
    State(state): State<AppState>,
    Path((category, id)): Path<(MediaCategory, i64)>,
) -> (StatusCode, Json<Value>) {
    match state.catalog.fetch_detail(category, id).await {
        Ok(detail) => (StatusCode::OK, Json(detail)),
        Err(e) => internal_error(e),
    }
}

#[derive(Deserialize)]
struct RecommendRequest {
    #[serde(flatten)]
    answers: QuestionnaireAnswers,
    #[serde(default)]
    limit: Option<usize>,
}

async fn recommend_media(
    State(state): State<AppState>,
    Json(req): Json<RecommendRequest>,
) -> (StatusCode, Json<Value>) {
    let limit = req.limit.unwrap_or(DEFAULT_RECOMMENDATIONS);
    let today = Utc::now().date_naive();
    let ids = state
        .recommender
        .recommend(&req.answers, limit, today, &mut rand::rng());
    (StatusCode::OK, Json(json!(ids)))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct BookingRequest {
    #[serde(default)]
    media_id: i64,
    #[serde(default)]
    media_title: String,
    #[serde(default)]
    media_poster: Option<String>,
    #[serde(default)]
    showtime: String,
    #[serde(default)]
    theater: String,
    #[serde(default)]
    language: Option<String>,
    #[serde(default)]
    format: Option<String>,
    #[serde(default)]
    booking_date: Option<NaiveDate>,
    #[serde(default)]
    selected_seats: Vec<String>,
    // Client-computed totals are ignored; the server reprices the seats.
    #[serde(default)]
    #[allow(dead_code)]
    total_price: Option<u32>,
}

fn validate_booking(req: &BookingRequest) -> Option<String> {
    if req.media_id == 0 {
        return Some("mediaId is required".to_string());
    }
    if req.media_title.trim().is_empty() {
        return Some("mediaTitle is required".to_string());
    }
    if !THEATRES.contains(&req.theater.as_str()) {
        return Some(format!("unknown theater {}", req.theater));
    }
    if !SHOWTIMES.contains(&req.showtime.as_str()) {
        return Some(format!("unknown showtime {}", req.showtime));
    }
    if let Some(language) = &req.language {
        if !SHOW_LANGUAGES.contains(&language.as_str()) {
            return Some(format!("unknown language {language}"));
        }
    }
    if let Some(format) = &req.format {
        if !FORMATS.contains(&format.as_str()) {
            return Some(format!("unknown format {format}"));
        }
    }
    if req.selected_seats.is_empty() {
        return Some("selectedSeats is required".to_string());
    }
    if let Some(seat) = req.selected_seats.iter().find(|s| !valid_seat(s)) {
        return Some(format!("invalid seat {seat}"));
    }
    None
}

async fn create_booking(
    State(state): State<AppState>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    Json(req): Json<BookingRequest>,
) -> (StatusCode, Json<Value>) {
    let user = match require_user(&state, auth).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    let Some(booking_date) = req.booking_date else {
        return bad_request("bookingDate is required");
    };
    if let Some(message) = validate_booking(&req) {
        return bad_request(&message);
    }

    let id = match new_object_id() {
        Ok(id) => id,
        Err(e) => return internal_error(e),
    };
    let total = total_price(&req.selected_seats);
    let booking = BookingRecord {
        id,
        user_id: user.id,
        media_id: req.media_id,
        media_title: req.media_title,
        media_poster: req.media_poster,
        showtime: req.showtime,
        theater: req.theater,
        language: req.language,
        format: req.format,
        booking_date,
        seats: req.selected_seats,
        total_price: total,
        created_at: Utc::now(),
    };
    match state.bookings.insert_booking(booking.clone()).await {
        Ok(()) => {
            info!(
                "Booked {} seat(s) for '{}' at {}",
                booking.seats.len(),
                booking.media_title,
                booking.theater
            );
            (StatusCode::OK, Json(json!(booking)))
        }
        Err(e) => internal_error(e),
    }
}

async fn list_bookings(
    State(state): State<AppState>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
) -> (StatusCode, Json<Value>) {
    let user = match require_user(&state, auth).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    match state.bookings.bookings_for_user(&user.id).await {
        Ok(rows) => (StatusCode::OK, Json(json!(rows))),
        Err(e) => internal_error(e),
    }
}

async fn remove_booking(
    State(state): State<AppState>,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
    Path(booking_id): Path<String>,
) -> (StatusCode, Json<Value>) {
    let user = match require_user(&state, auth).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    match state.bookings.remove_booking(&user.id, &booking_id).await {
        Ok(true) => (StatusCode::OK, Json(json!({ "message": "Booking removed" }))),
        Ok(false) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "Booking not found" })),
        ),
        Err(e) => internal_error(e),
    }
}

fn user_response(user: &UserRecord, token: String) -> (StatusCode, Json<Value>) {
    let mut body = json!(user);
    if let Value::Object(map) = &mut body {
        map.insert("token".to_string(), Value::String(token));
    }
    (StatusCode::OK, Json(body))
}

fn bad_request(message: &str) -> (StatusCode, Json<Value>) {
    (StatusCode::BAD_REQUEST, Json(json!({ "message": message })))
}

fn unauthorized() -> (StatusCode, Json<Value>) {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "message": "Unauthorized" })),
    )
}

fn too_many_requests() -> (StatusCode, Json<Value>) {
    (
        StatusCode::TOO_MANY_REQUESTS,
        Json(json!({ "message": "Too many requests" })),
    )
}

fn internal_error(err: anyhow::Error) -> (StatusCode, Json<Value>) {
    error!("Request failed: {:?}", err);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({ "message": "Oops! Something went wrong" })),
    )
}

async fn require_user(
    state: &AppState,
    auth: Option<TypedHeader<Authorization<Bearer>>>,
) -> Result<UserRecord, (StatusCode, Json<Value>)> {
    let Some(TypedHeader(auth)) = auth else {
        return Err(unauthorized());
    };
    let Some(user_id) = verify_token(&state.token_secret, auth.token()) else {
        return Err(unauthorized());
    };
    match state.users.find_by_id(&user_id).await {
        Ok(Some(user)) => Ok(user),
        Ok(None) => Err(unauthorized()),
        Err(e) => Err(internal_error(e)),
    }
}

fn sign_token(secret: &str, user_id: &str, expiry: i64) -> Result<String> {
    let payload = format!("{user_id}.{expiry}");
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .map_err(|e| anyhow::anyhow!("Failed to key token mac: {e}"))?;
    mac.update(payload.as_bytes());
    Ok(format!("{payload}.{}", hex::encode(mac.finalize().into_bytes())))
}

fn mint_token(secret: &str, user_id: &str) -> Result<String> {
    sign_token(secret, user_id, Utc::now().timestamp() + TOKEN_TTL_SECS)
}

fn verify_token(secret: &str, token: &str) -> Option<String> {
    let mut parts = token.splitn(3, '.');
    let (Some(user_id), Some(expiry), Some(tag_hex)) = (parts.next(), parts.next(), parts.next())
    else {
        return None;
    };
    let Ok(expected) = hex::decode(tag_hex) else {
        return None;
    };
    let Ok(mut mac) = Hmac::<Sha256>::new_from_slice(secret.as_bytes()) else {
        return None;
    };
    mac.update(format!("{user_id}.{expiry}").as_bytes());
    let computed = mac.finalize().into_bytes();
    if expected.len() != computed.len() || !constant_time_eq(&computed, &expected) {
        return None;
    }
    let expiry: i64 = expiry.parse().ok()?;
    if expiry < Utc::now().timestamp() {
        return None;
    }
    Some(user_id.to_string())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        let mut term = signal(SignalKind::terminate()).expect("failed to install SIGTERM handler");
        term.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Shutdown signal received (Ctrl+C)");
        }
        _ = terminate => {
            info!("Shutdown signal received (SIGTERM)");
        }
    }
}

fn extract_ip(headers: &HeaderMap) -> String {
    headers
        .get("cf-connecting-ip")
        .or_else(|| headers.get("x-real-ip"))
        .or_else(|| headers.get("x-forwarded-for"))
        .and_then(|v| v.to_str().ok())
        .map(|s| s.split(',').next().unwrap_or(s).trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

async fn check_rate_limit(state: &AppState, ip: &str) -> bool {
    let window = (Utc::now().timestamp() / 60) as u64;
    let mut guards = state.rate_limits.lock().await;
    if guards.len() > MAX_RATE_LIMIT_ENTRIES {
        guards.retain(|_, v| v.window == window);
    }
    let entry = guards
        .entry(ip.to_string())
        .or_insert(WindowCounter { window, count: 0 });
    if entry.window != window {
        entry.window = window;
        entry.count = 0;
    }
    if entry.count >= PER_IP_LIMIT + PER_IP_BURST {
        return false;
    }
    entry.count += 1;
    true
}

async fn check_global_rate_limit(state: &AppState) -> bool {
    let window = (Utc::now().timestamp() / 60) as u64;
    let mut guard = state.global_limit.lock().await;
    if guard.window != window {
        guard.window = window;
        guard.count = 0;
    }
    if guard.count >= GLOBAL_LIMIT + GLOBAL_BURST {
        return false;
    }
    guard.count += 1;
    true
}
