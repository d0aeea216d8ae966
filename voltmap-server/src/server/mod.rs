mod accounts;
pub mod auth;
mod charging;
mod config;
mod rewards;
mod social;
mod stations;

use crate::server::auth::AuthCtx;
use crate::storage::{StorageError, Store};
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts};
use axum::http::{HeaderName, HeaderValue};
use axum::middleware;
use axum::response::Response as AxumResponse;
use axum::{
    Router,
    http::{Method, StatusCode, header},
    routing::{delete, get, post, put},
};
use chrono::NaiveDateTime;
pub use config::{AppConfig, ConfigError};
use tokio_util::sync::CancellationToken;
use tower_http::services::{ServeDir, ServeFile};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{Span, info_span};
use uuid::Uuid;
use voltmap_shared::api::ErrorDto;

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub store: Store,
    shutdown: CancellationToken,
}

impl AppState {
    pub fn new(config: AppConfig, store: Store) -> Self {
        Self {
            config,
            store,
            shutdown: CancellationToken::new(),
        }
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }
}

#[derive(Clone, Debug)]
struct ReqId(pub String);

pub fn router(state: AppState) -> Router {
    let private = Router::new()
        .route("/api/logout", post(accounts::logout))
        .route("/api/user", get(accounts::me))
        .route("/api/user/stations", get(accounts::my_stations))
        .route("/api/user/reviews", get(accounts::my_reviews))
        .route("/api/stations", post(stations::create_station))
        .route("/api/stations/{id}", put(stations::update_station))
        .route("/api/stations/{id}/reviews", post(social::create_review))
        .route("/api/stations/{id}/promotions", post(social::create_promotion))
        .route(
            "/api/favorites",
            get(social::list_favorites).post(social::add_favorite),
        )
        .route("/api/favorites/{station_id}", delete(social::remove_favorite))
        .route(
            "/api/favorites/check/{station_id}",
            get(social::check_favorite),
        )
        .route("/api/charging/start", post(charging::start))
        .route("/api/charging/{id}/end", post(charging::end))
        .route("/api/charging/{id}/cancel", post(charging::cancel))
        .route("/api/charging/history", get(charging::history))
        .route("/api/rewards/{id}/claim", post(rewards::claim))
        .route("/api/user/rewards", get(rewards::list_mine))
        .route("/api/user/rewards/{id}/use", post(rewards::use_reward))
        .with_state(state.clone())
        .layer(middleware::from_fn(set_auth_span_fields))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_bearer,
        ));

    // Trace with request context (method, path, request_id)
    let trace = TraceLayer::new_for_http().make_span_with(|req: &axum::http::Request<_>| {
        let request_id = req
            .extensions()
            .get::<ReqId>()
            .map(|r| r.0.clone())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        info_span!(
            "request",
            method = %req.method(),
            path = %req.uri().path(),
            request_id = %request_id,
            username = tracing::field::Empty,
            user_id = tracing::field::Empty
        )
    });

    let mut app = Router::new()
        .route("/healthz", get(health))
        .route("/api/register", post(accounts::register))
        .route("/api/login", post(accounts::login))
        .route("/api/stations", get(stations::list_stations))
        .route("/api/stations/{id}", get(stations::get_station))
        .route("/api/stations/{id}/reviews", get(social::list_reviews))
        .route("/api/stations/{id}/promotions", get(social::list_promotions))
        .route("/api/rewards", get(rewards::catalog))
        .merge(private)
        .with_state(state.clone());

    app = match &state.config.web_dir {
        Some(dir) => {
            // Unknown client routes resolve to the SPA entry point
            let spa = ServeDir::new(dir).fallback(ServeFile::new(dir.join("index.html")));
            app.fallback_service(spa)
        }
        None => app.fallback(api_not_found),
    };

    let app = app
        .layer(trace)
        .layer(middleware::from_fn(add_security_headers))
        .layer(middleware::from_fn(add_request_id));

    // Optionally add CORS for dev if configured
    if let Some(origin) = &state.config.dev_cors_origin {
        let hv = header::HeaderValue::from_str(origin)
            .unwrap_or(header::HeaderValue::from_static("http://localhost:5173"));
        let cors = CorsLayer::new()
            .allow_origin(hv)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PUT,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);
        app.layer(cors)
    } else {
        app
    }
}

async fn health() -> &'static str {
    "ok"
}

async fn api_not_found() -> AppError {
    AppError::not_found("Not found")
}

async fn add_request_id(
    mut req: axum::http::Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> Result<AxumResponse, AppError> {
    let hdr = HeaderName::from_static("x-request-id");
    // Use provided x-request-id if present, else generate
    let rid = req
        .headers()
        .get(&hdr)
        .and_then(|v| v.to_str().ok())
        .map(|s| s.to_string())
        .unwrap_or_else(|| Uuid::new_v4().to_string());
    req.extensions_mut().insert(ReqId(rid.clone()));
    let mut resp = next.run(req).await;
    if let Ok(hv) = HeaderValue::from_str(&rid) {
        resp.headers_mut().insert(hdr, hv);
    }
    Ok(resp)
}

async fn add_security_headers(
    req: axum::http::Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> Result<AxumResponse, AppError> {
    let path = req.uri().path().to_string();
    let mut resp = next.run(req).await;

    let headers = resp.headers_mut();
    headers.insert(
        HeaderName::from_static("x-content-type-options"),
        HeaderValue::from_static("nosniff"),
    );
    headers.insert(
        HeaderName::from_static("x-frame-options"),
        HeaderValue::from_static("SAMEORIGIN"),
    );
    headers.insert(
        HeaderName::from_static("referrer-policy"),
        HeaderValue::from_static("no-referrer"),
    );
    // The map view asks for the browser's position
    headers.insert(
        HeaderName::from_static("permissions-policy"),
        HeaderValue::from_static("geolocation=(self), microphone=(), camera=()"),
    );
    headers.insert(
        HeaderName::from_static("cross-origin-opener-policy"),
        HeaderValue::from_static("same-origin"),
    );

    if path == "/healthz" || path.starts_with("/api/") || path == "/api" {
        headers.insert(
            HeaderName::from_static("cache-control"),
            HeaderValue::from_static("no-store, no-cache, must-revalidate, private"),
        );
        headers.insert(
            HeaderName::from_static("pragma"),
            HeaderValue::from_static("no-cache"),
        );
    }

    Ok(resp)
}

async fn set_auth_span_fields(
    req: axum::http::Request<axum::body::Body>,
    next: axum::middleware::Next,
) -> Result<AxumResponse, AppError> {
    if let Some(auth) = req.extensions().get::<AuthCtx>() {
        let span = Span::current();
        span.record("username", tracing::field::display(auth.username()));
        span.record("user_id", auth.user_id());
    }
    Ok(next.run(req).await)
}

/// `axum::Json` with rejections reported as [`AppError::BadRequest`].
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// `axum::extract::Query` with rejections reported as [`AppError::BadRequest`].
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(AppError))]
pub struct ApiQuery<T>(pub T);

/// Parses a numeric path segment into a positive row id.
pub(crate) fn parse_id(raw: &str, invalid: &'static str) -> Result<i32, AppError> {
    match raw.trim().parse::<i32>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(AppError::bad_request(invalid)),
    }
}

/// Storage timestamps are naive UTC; the wire format is RFC3339.
pub(crate) fn rfc3339(dt: NaiveDateTime) -> String {
    chrono::DateTime::<chrono::Utc>::from_naive_utc_and_offset(dt, chrono::Utc).to_rfc3339()
}

#[derive(Debug)]
pub enum AppError {
    BadRequest(String),
    Unauthorized,
    Forbidden(String),
    NotFound(String),
    Internal(String),
}

impl AppError {
    fn bad_request<T: Into<String>>(msg: T) -> Self {
        Self::BadRequest(msg.into())
    }
    fn unauthorized() -> Self {
        Self::Unauthorized
    }
    fn forbidden<T: Into<String>>(msg: T) -> Self {
        Self::Forbidden(msg.into())
    }
    fn not_found<T: Into<String>>(msg: T) -> Self {
        Self::NotFound(msg.into())
    }
    fn internal<E: std::fmt::Display>(e: E) -> Self {
        Self::Internal(e.to_string())
    }
}

impl From<StorageError> for AppError {
    fn from(e: StorageError) -> Self {
        match e {
            StorageError::InvalidInput(m) => AppError::BadRequest(m),
            StorageError::NotFound(m) => AppError::NotFound(m.to_string()),
            StorageError::InvalidState(m) | StorageError::Duplicate(m) => {
                AppError::BadRequest(m.to_string())
            }
            e @ StorageError::InsufficientPoints { .. } => AppError::BadRequest(e.to_string()),
            e @ (StorageError::Database(_)
            | StorageError::Pool(_)
            | StorageError::Task(_)
            | StorageError::Migration(_)) => AppError::internal(e),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let (status, msg, kind, detail) = match self {
            AppError::BadRequest(m) => (StatusCode::BAD_REQUEST, m, "bad_request", None),
            AppError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "unauthorized".into(),
                "unauthorized",
                None,
            ),
            AppError::Forbidden(m) => (StatusCode::FORBIDDEN, m, "forbidden", None),
            AppError::NotFound(m) => (StatusCode::NOT_FOUND, m, "not_found", None),
            // Do not leak internal error details to clients, but log them
            AppError::Internal(m) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal server error".into(),
                "internal",
                Some(m),
            ),
        };
        if let Some(detail) = detail {
            tracing::error!(
                status = %status,
                kind = kind,
                message = %msg,
                detail = %detail,
                "request failed"
            );
        } else {
            tracing::warn!(status = %status, kind = kind, message = %msg, "request failed");
        }
        let body = axum::Json(ErrorDto { message: msg });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    #[test]
    fn parse_id_accepts_only_positive_integers() {
        assert_eq!(parse_id("42", "bad").unwrap(), 42);
        for raw in ["0", "-1", "abc", "", "1.5", "99999999999"] {
            assert!(matches!(
                parse_id(raw, "Invalid station ID"),
                Err(AppError::BadRequest(m)) if m == "Invalid station ID"
            ));
        }
    }

    #[test]
    fn storage_errors_map_to_statuses() {
        let cases = [
            (StorageError::NotFound("Station not found"), StatusCode::NOT_FOUND),
            (StorageError::Duplicate("Already in favorites"), StatusCode::BAD_REQUEST),
            (
                StorageError::InvalidState("Charging session is not in progress"),
                StatusCode::BAD_REQUEST,
            ),
            (
                StorageError::InsufficientPoints {
                    balance: 1,
                    required: 2,
                },
                StatusCode::BAD_REQUEST,
            ),
            (
                StorageError::Migration("boom".into()),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, status) in cases {
            let resp = AppError::from(err).into_response();
            assert_eq!(resp.status(), status);
        }
    }

    #[test]
    fn timestamps_render_as_utc_rfc3339() {
        let dt = chrono::NaiveDate::from_ymd_opt(2025, 3, 1)
            .unwrap()
            .and_hms_opt(12, 30, 0)
            .unwrap();
        assert_eq!(rfc3339(dt), "2025-03-01T12:30:00+00:00");
    }
}
