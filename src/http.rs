use crate::availability::{date_availability, is_working_hour, local_today, month_availability};
use crate::backend::BookingBackend;
use crate::configuration::Configuration;
use crate::error::BookingError;
use crate::notifier::Notifier;
use crate::session::{verify_password, SessionStore};
use crate::types::DateAvailability;
use crate::validation::{parse_iso_date, parse_month, validate_submission, BookingSubmission};
use axum::extract::{FromRequestParts, Query, State};
use axum::http::request::Parts;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, warn};

const SESSION_COOKIE: &str = "admin_session";
const DEFAULT_BLOCK_REASON: &str = "Blocked by administrator";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct LoginRequest {
    password: String,
}

/// Body of the four block/unblock actions. `time` is ignored by the
/// all-day actions, `reason` by the unblock ones.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct BlockRequest {
    date: String,
    time: String,
    reason: Option<String>,
}

#[derive(Serialize)]
struct DateAvailabilityResponse {
    success: bool,
    #[serde(flatten)]
    availability: DateAvailability,
}

#[derive(Clone)]
pub struct AppState<B: BookingBackend, C: Configuration> {
    pub bookings: B,
    pub configuration: C,
    pub sessions: Arc<SessionStore>,
    pub notifier: Arc<dyn Notifier>,
}

/// Extractor that admits a request only when its session cookie maps to
/// a live admin session.
pub struct AdminSession;

#[axum::async_trait]
impl<B, C> FromRequestParts<AppState<B, C>> for AdminSession
where
    B: BookingBackend,
    C: Configuration,
{
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<B, C>,
    ) -> Result<Self, Self::Rejection> {
        if authenticated(&parts.headers, &state.sessions) {
            Ok(AdminSession)
        } else {
            Err(error_response(
                StatusCode::UNAUTHORIZED,
                "Authorization required",
            ))
        }
    }
}

pub fn create_app<B: BookingBackend, C: Configuration>(
    bookings: B,
    configuration: C,
    sessions: Arc<SessionStore>,
    notifier: Arc<dyn Notifier>,
) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let state = AppState {
        bookings,
        configuration,
        sessions,
        notifier,
    };

    Router::new()
        .route(
            "/auth",
            get(auth_get).post(auth_post).fallback(method_not_allowed),
        )
        .route(
            "/availability",
            get(get_availability).fallback(method_not_allowed),
        )
        .route(
            "/bookings",
            get(get_bookings)
                .post(manage_blocks)
                .delete(delete_booking)
                .fallback(method_not_allowed),
        )
        .route("/send", post(submit_booking).fallback(method_not_allowed))
        .fallback(not_found)
        .with_state(state)
        .layer(cors)
}

async fn auth_get<B: BookingBackend, C: Configuration>(
    State(state): State<AppState<B, C>>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    match params.get("action").map(String::as_str).unwrap_or("") {
        "check" => Json(json!({
            "success": true,
            "authenticated": authenticated(&headers, &state.sessions),
        }))
        .into_response(),
        "login" | "logout" => error_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed"),
        _ => error_response(StatusCode::BAD_REQUEST, "Unknown action"),
    }
}

async fn auth_post<B: BookingBackend, C: Configuration>(
    State(state): State<AppState<B, C>>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
    body: String,
) -> Response {
    match params.get("action").map(String::as_str).unwrap_or("") {
        "login" => login(&state, &body),
        "logout" => logout(&state, &headers),
        "check" => error_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed"),
        _ => error_response(StatusCode::BAD_REQUEST, "Unknown action"),
    }
}

fn login<B: BookingBackend, C: Configuration>(state: &AppState<B, C>, body: &str) -> Response {
    let request: LoginRequest = parse_body(body);
    if request.password.is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "Password is required");
    }
    if !verify_password(
        &request.password,
        &state.configuration.admin_password_hash(),
    ) {
        return error_response(StatusCode::UNAUTHORIZED, "Invalid password");
    }

    let token = state.sessions.create();
    let cookie = format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Strict");
    (
        [(header::SET_COOKIE, cookie)],
        Json(json!({ "success": true, "message": "Logged in successfully" })),
    )
        .into_response()
}

fn logout<B: BookingBackend, C: Configuration>(
    state: &AppState<B, C>,
    headers: &HeaderMap,
) -> Response {
    if let Some(token) = session_token(headers) {
        state.sessions.remove(&token);
    }

    let cookie = format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Strict; Max-Age=0");
    (
        [(header::SET_COOKIE, cookie)],
        Json(json!({ "success": true, "message": "Logged out" })),
    )
        .into_response()
}

async fn get_availability<B: BookingBackend, C: Configuration>(
    State(state): State<AppState<B, C>>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    if let Some(month) = params.get("month").filter(|value| !value.is_empty()) {
        let Some((year, month)) = parse_month(month) else {
            return error_response(StatusCode::BAD_REQUEST, "Invalid month format. Use YYYY-MM");
        };
        let dates = month_availability(&state.bookings.snapshot(), year, month, local_today());
        return Json(json!({ "success": true, "dates": dates })).into_response();
    }

    if let Some(date) = params.get("date").filter(|value| !value.is_empty()) {
        let Some(date) = parse_iso_date(date) else {
            return error_response(
                StatusCode::BAD_REQUEST,
                "Invalid date format. Use YYYY-MM-DD",
            );
        };
        let availability = date_availability(&state.bookings.snapshot(), date);
        return Json(DateAvailabilityResponse {
            success: true,
            availability,
        })
        .into_response();
    }

    error_response(
        StatusCode::BAD_REQUEST,
        "No month or date parameter specified",
    )
}

async fn get_bookings<B: BookingBackend, C: Configuration>(
    State(state): State<AppState<B, C>>,
    Query(params): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    // Listing is public, but any action variant is admin territory and
    // gets the auth check before the action is even looked at.
    let action = params.get("action").map(String::as_str).unwrap_or("");
    if !action.is_empty() {
        if !authenticated(&headers, &state.sessions) {
            return error_response(StatusCode::UNAUTHORIZED, "Authorization required");
        }
        return error_response(StatusCode::BAD_REQUEST, "Unknown action");
    }

    let data = state.bookings.snapshot();
    Json(json!({
        "success": true,
        "bookings": data.bookings,
        "blocked_dates": data.blocked_dates,
        "blocked_slots": data.blocked_slots,
    }))
    .into_response()
}

async fn manage_blocks<B: BookingBackend, C: Configuration>(
    State(state): State<AppState<B, C>>,
    Query(params): Query<HashMap<String, String>>,
    _session: AdminSession,
    body: String,
) -> Response {
    match params.get("action").map(String::as_str).unwrap_or("") {
        "block_slot" => block_slot(&state, &body),
        "unblock_slot" => unblock_slot(&state, &body),
        "block_date" => block_date(&state, &body),
        "unblock_date" => unblock_date(&state, &body),
        _ => error_response(StatusCode::BAD_REQUEST, "Unknown action"),
    }
}

fn block_slot<B: BookingBackend, C: Configuration>(state: &AppState<B, C>, body: &str) -> Response {
    let request: BlockRequest = parse_body(body);
    let Some(date) = parse_iso_date(&request.date) else {
        return error_response(StatusCode::BAD_REQUEST, "Invalid date format");
    };
    if !is_working_hour(&request.time) {
        return error_response(StatusCode::BAD_REQUEST, "Invalid time");
    }
    let reason = request
        .reason
        .unwrap_or_else(|| DEFAULT_BLOCK_REASON.to_string());

    match state.bookings.block_slot(date, request.time, reason) {
        Ok(()) => success_message("Slot blocked"),
        Err(err) => booking_error_response(err),
    }
}

fn unblock_slot<B: BookingBackend, C: Configuration>(
    state: &AppState<B, C>,
    body: &str,
) -> Response {
    let request: BlockRequest = parse_body(body);
    let Some(date) = parse_iso_date(&request.date) else {
        return error_response(StatusCode::BAD_REQUEST, "Invalid date format");
    };
    if !is_working_hour(&request.time) {
        return error_response(StatusCode::BAD_REQUEST, "Invalid time");
    }

    match state.bookings.unblock_slot(date, request.time) {
        Ok(()) => success_message("Slot unblocked"),
        Err(err) => booking_error_response(err),
    }
}

fn block_date<B: BookingBackend, C: Configuration>(state: &AppState<B, C>, body: &str) -> Response {
    let request: BlockRequest = parse_body(body);
    let Some(date) = parse_iso_date(&request.date) else {
        return error_response(StatusCode::BAD_REQUEST, "Invalid date format");
    };
    let reason = request
        .reason
        .unwrap_or_else(|| DEFAULT_BLOCK_REASON.to_string());

    match state.bookings.block_date(date, reason) {
        Ok(()) => success_message("Date blocked"),
        Err(err) => booking_error_response(err),
    }
}

fn unblock_date<B: BookingBackend, C: Configuration>(
    state: &AppState<B, C>,
    body: &str,
) -> Response {
    let request: BlockRequest = parse_body(body);
    let Some(date) = parse_iso_date(&request.date) else {
        return error_response(StatusCode::BAD_REQUEST, "Invalid date format");
    };

    match state.bookings.unblock_date(date) {
        Ok(()) => success_message("Date unblocked"),
        Err(err) => booking_error_response(err),
    }
}

async fn delete_booking<B: BookingBackend, C: Configuration>(
    State(state): State<AppState<B, C>>,
    Query(params): Query<HashMap<String, String>>,
    _session: AdminSession,
) -> Response {
    let id = params
        .get("id")
        .and_then(|raw| raw.parse::<u64>().ok())
        .unwrap_or(0);
    if id == 0 {
        return error_response(StatusCode::BAD_REQUEST, "No id specified");
    }

    match state.bookings.delete_booking(id) {
        Ok(()) => success_message("Booking deleted"),
        Err(err) => booking_error_response(err),
    }
}

async fn submit_booking<B: BookingBackend, C: Configuration>(
    State(state): State<AppState<B, C>>,
    body: String,
) -> Response {
    let submission: BookingSubmission = parse_body(&body);
    let booking = match validate_submission(&submission) {
        Ok(booking) => booking,
        Err(violations) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "success": false,
                    "error": violations.join("; "),
                    "errors": violations,
                })),
            )
                .into_response();
        }
    };

    match state.bookings.submit_booking(booking) {
        Ok(booking) => {
            let notifier = Arc::clone(&state.notifier);
            tokio::spawn(async move {
                if let Err(err) = notifier.booking_created(booking).await {
                    warn!("Failed to deliver the booking notification: {err}");
                }
            });

            Json(json!({
                "success": true,
                "message": "Your booking has been submitted! We will contact you shortly.",
            }))
            .into_response()
        }
        Err(err) => booking_error_response(err),
    }
}

async fn method_not_allowed() -> Response {
    error_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
}

async fn not_found() -> Response {
    error_response(StatusCode::NOT_FOUND, "Not found")
}

/// Malformed or empty bodies deserialize to the default value, so field
/// validation reports exactly what is missing.
fn parse_body<T: DeserializeOwned + Default>(body: &str) -> T {
    serde_json::from_str(body).unwrap_or_default()
}

fn session_token(headers: &HeaderMap) -> Option<String> {
    let cookies = headers.get(header::COOKIE)?.to_str().ok()?;
    for pair in cookies.split(';') {
        if let Some((name, value)) = pair.trim().split_once('=') {
            if name == SESSION_COOKIE {
                return Some(value.to_string());
            }
        }
    }
    None
}

fn authenticated(headers: &HeaderMap, sessions: &SessionStore) -> bool {
    session_token(headers)
        .map(|token| sessions.is_valid(&token))
        .unwrap_or(false)
}

fn success_message(message: &str) -> Response {
    Json(json!({ "success": true, "message": message })).into_response()
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "success": false, "error": message }))).into_response()
}

fn booking_error_response(err: BookingError) -> Response {
    match err {
        BookingError::Validation(_) | BookingError::Rejected(_) | BookingError::Conflict(_) => {
            error_response(StatusCode::BAD_REQUEST, &err.to_string())
        }
        BookingError::NotFound(_) => error_response(StatusCode::NOT_FOUND, &err.to_string()),
        BookingError::Storage(err) => {
            error!("Storage failure while handling a request: {err}");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Storage error. Please try again.",
            )
        }
    }
}
