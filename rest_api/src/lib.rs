// rest_api/src/lib.rs

//! HTTP surface of the visit documentation service. Routing, CORS, the JSON
//! request/error envelope, and server startup live here; per-resource request
//! semantics live in the handler modules.

mod config;
mod handlers_admin;
mod handlers_auth;
mod handlers_contact;
mod handlers_interventions;
mod handlers_patients;
mod handlers_reports;
mod handlers_visits;

pub use config::{ApiConfig, load_config};

use std::time::Duration;

use anyhow::{Context, Error as AnyhowError};
use axum::async_trait;
use axum::extract::{FromRef, FromRequest, Request};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use models::ApiError;
use security::AuthService;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use storage::Store;
use tokio::net::TcpListener;
use tokio::signal;
use tower_http::cors::{AllowHeaders, AllowOrigin, Any, CorsLayer};
use tracing::{error, info, warn};

/// Shared handler state: the sled-backed store and the token service.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub auth: AuthService,
}

impl FromRef<AppState> for Store {
    fn from_ref(state: &AppState) -> Store {
        state.store.clone()
    }
}

impl FromRef<AppState> for AuthService {
    fn from_ref(state: &AppState) -> AuthService {
        state.auth.clone()
    }
}

/// JSON body extractor that funnels malformed payloads through the standard
/// error envelope as a 422 instead of axum's plain-text rejection.
pub struct Payload<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for Payload<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(Payload(value)),
            Err(rejection) => Err(ApiError::Validation(rejection.body_text())),
        }
    }
}

// CORS policy from the comma-separated `cors_origins` setting. `*` opens
// every origin without credentials; an explicit origin list is echoed back
// with credentials allowed. tower-http panics when credentials are combined
// with a wildcard origin, method, or header set, so the branches never mix.
fn cors_layer(origins: &str) -> CorsLayer {
    let explicit: Vec<HeaderValue> = origins
        .split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty() && *origin != "*")
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!(origin, "ignoring malformed CORS origin");
                None
            }
        })
        .collect();

    if origins.trim() == "*" || explicit.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(explicit))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true)
}

// Handler for the /api/ health endpoint.
async fn health_check_handler() -> (StatusCode, Json<Value>) {
    (
        StatusCode::OK,
        Json(json!({ "message": "Home Nurse Visit API", "status": "healthy" })),
    )
}

/// Builds the full route table against the given state.
pub fn app(state: AppState, cors_origins: &str) -> Router {
    Router::new()
        .route("/api/", get(health_check_handler))
        .route("/api/auth/register", post(handlers_auth::register))
        .route("/api/auth/login", post(handlers_auth::login))
        .route("/api/auth/me", get(handlers_auth::me))
        .route("/api/admin/nurses", get(handlers_admin::list_nurses))
        .route(
            "/api/admin/nurses/:id/promote",
            post(handlers_admin::promote_nurse),
        )
        .route(
            "/api/admin/patients/:id/assign",
            post(handlers_admin::assign_nurses),
        )
        .route(
            "/api/patients",
            post(handlers_patients::create_patient).get(handlers_patients::list_patients),
        )
        .route(
            "/api/patients/:id",
            get(handlers_patients::get_patient)
                .put(handlers_patients::update_patient)
                .delete(handlers_patients::delete_patient),
        )
        .route(
            "/api/patients/:id/visits",
            post(handlers_visits::create_visit).get(handlers_visits::list_visits),
        )
        .route(
            "/api/visits/:id",
            get(handlers_visits::get_visit).delete(handlers_visits::delete_visit),
        )
        .route(
            "/api/interventions",
            post(handlers_interventions::create_intervention),
        )
        .route(
            "/api/patients/:id/interventions",
            get(handlers_interventions::list_interventions),
        )
        .route(
            "/api/interventions/:id",
            get(handlers_interventions::get_intervention)
                .delete(handlers_interventions::delete_intervention),
        )
        .route(
            "/api/patients/:id/unable-to-contact",
            post(handlers_contact::create_record).get(handlers_contact::list_records),
        )
        .route(
            "/api/unable-to-contact/:id",
            get(handlers_contact::get_record).delete(handlers_contact::delete_record),
        )
        .route("/api/reports/monthly", post(handlers_reports::monthly_report))
        .with_state(state)
        .layer(cors_layer(cors_origins))
}

// Main function to start the REST API server.
pub async fn start_server(config: ApiConfig) -> Result<(), AnyhowError> {
    let op_timeout = Duration::from_millis(config.op_timeout_ms);
    let store = Store::open(&config.data_dir, op_timeout)
        .context(format!("Failed to open data store at {}", config.data_dir))?;

    let state = AppState {
        auth: AuthService::new(&config.jwt_secret),
        store: store.clone(),
    };
    let app = app(state, &config.cors_origins);

    let addr = config.bind_addr()?;
    let listener = TcpListener::bind(&addr)
        .await
        .context(format!("Failed to bind to address: {}", addr))?;
    info!(%addr, data_dir = %config.data_dir, "REST API server listening");

    axum::serve(listener, app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("REST API server failed to start or run")?;

    store
        .flush()
        .await
        .context("Failed to flush data store on shutdown")?;
    info!("REST API server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(err) => {
            error!(error = %err, "Failed to listen for shutdown signal");
            std::future::pending::<()>().await;
        }
    }
}
