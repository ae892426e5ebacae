use axum::{
    Router,
    extract::{Path, Query, State},
    http::{HeaderValue, Request, StatusCode},
    middleware::{Next, from_fn},
    response::Json,
    routing::{get, post, put},
};
use booking_flow::{
    AdvanceOutcome, AvailabilityState, BookingError, BookingModal, BookingServices, FieldUpdate,
    Service, SessionStorage, Theme, ThemeSettings, WizardView, evict_after_close,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{Instrument, error, info};
use uuid::Uuid;

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<Value>)>;
type ApiError = (StatusCode, Json<Value>);

fn internal_error(message: &str, details: &str) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(json!({
            "error": message,
            "details": details
        })),
    )
}

fn booking_error(e: BookingError) -> ApiError {
    let status = match &e {
        BookingError::UnknownField(_)
        | BookingError::ReadOnlyField(_)
        | BookingError::InvalidFieldValue { .. }
        | BookingError::UnknownService(_) => StatusCode::BAD_REQUEST,
        BookingError::SessionClosed => StatusCode::CONFLICT,
        BookingError::SessionNotFound(_) => StatusCode::NOT_FOUND,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    (status, Json(json!({ "error": e.to_string() })))
}

#[derive(Clone)]
pub struct AppState {
    pub session_storage: Arc<dyn SessionStorage>,
    pub services: BookingServices,
    pub theme: Arc<ThemeSettings>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OpenRequest {
    #[serde(default)]
    pub preselected_service_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FieldRequest {
    pub field: String,
    #[serde(default)]
    pub value: Value,
}

#[derive(Debug, Default, Deserialize)]
pub struct AvailabilityQuery {
    /// Block until the lookup for the current open has finished
    #[serde(default)]
    pub wait: bool,
}

#[derive(Debug, Serialize)]
pub struct AdvanceResponse {
    pub outcome: AdvanceOutcome,
    pub view: WizardView,
}

#[derive(Debug, Serialize)]
pub struct OpenResponse {
    /// `false` when the session was already open and nothing changed
    pub opened: bool,
    #[serde(flatten)]
    pub view: WizardView,
}

#[derive(Debug, Serialize)]
pub struct ThemeResponse {
    pub theme: Theme,
}

/// Middleware to add correlation ID to all requests
async fn correlation_id_middleware(
    mut request: Request<axum::body::Body>,
    next: Next,
) -> axum::response::Response {
    let correlation_id = Uuid::new_v4().to_string();

    if let Ok(value) = HeaderValue::from_str(&correlation_id) {
        request.headers_mut().insert("x-correlation-id", value);
    }

    let span = tracing::info_span!("http_request", correlation_id = %correlation_id);
    next.run(request).instrument(span).await
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/services", get(list_services))
        .route("/booking", post(create_session))
        .route("/booking/{session_id}", get(get_session))
        .route("/booking/{session_id}/open", post(open_session))
        .route("/booking/{session_id}/close", post(close_session))
        .route("/booking/{session_id}/field", put(set_field))
        .route("/booking/{session_id}/availability", get(get_availability))
        .route("/booking/{session_id}/advance", post(advance))
        .route("/booking/{session_id}/retreat", post(retreat))
        .route("/booking/{session_id}/notice/dismiss", post(dismiss_notice))
        .route("/settings/theme", get(get_theme))
        .route("/settings/theme/toggle", post(toggle_theme))
        .layer(from_fn(correlation_id_middleware))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

fn today() -> chrono::NaiveDate {
    chrono::Local::now().date_naive()
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn list_services(State(state): State<AppState>) -> Json<Vec<Service>> {
    Json(state.services.catalog.services().to_vec())
}

async fn load_session(state: &AppState, session_id: &str) -> Result<BookingModal, ApiError> {
    match state.session_storage.get(session_id).await {
        Ok(Some(modal)) => Ok(modal),
        Ok(None) => Err(booking_error(BookingError::SessionNotFound(session_id.to_string()))),
        Err(e) => {
            error!(session_id = %session_id, error = %e, "Failed to load session");
            Err(internal_error("Failed to load session", &e.to_string()))
        }
    }
}

async fn create_session(
    State(state): State<AppState>,
    Json(request): Json<OpenRequest>,
) -> ApiResult<WizardView> {
    let session_id = Uuid::new_v4().to_string();
    info!(
        session_id = %session_id,
        preselected = ?request.preselected_service_id,
        "Creating booking session"
    );

    let modal = BookingModal::new(session_id.clone(), state.services.clone());
    modal.open(request.preselected_service_id.as_deref(), today());

    state.session_storage.save(modal.clone()).await.map_err(|e| {
        error!(session_id = %session_id, error = %e, "Failed to save session");
        internal_error("Failed to create booking session", &e.to_string())
    })?;

    Ok(Json(modal.view()))
}

async fn get_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<WizardView> {
    let modal = load_session(&state, &session_id).await?;
    Ok(Json(modal.view()))
}

async fn open_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<OpenRequest>,
) -> ApiResult<OpenResponse> {
    let modal = load_session(&state, &session_id).await?;
    let opened = modal.open(request.preselected_service_id.as_deref(), today());
    if !opened {
        info!(session_id = %session_id, "Open ignored, session already open");
    }
    Ok(Json(OpenResponse {
        opened,
        view: modal.view(),
    }))
}

async fn close_session(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<WizardView> {
    let modal = load_session(&state, &session_id).await?;
    modal.close();
    evict_after_close(
        state.session_storage.clone(),
        modal.clone(),
        state.services.config.reset_grace(),
    );
    Ok(Json(modal.view()))
}

async fn set_field(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Json(request): Json<FieldRequest>,
) -> ApiResult<WizardView> {
    let modal = load_session(&state, &session_id).await?;
    let update = FieldUpdate::parse(&request.field, request.value).map_err(booking_error)?;
    modal.set_field(update).map_err(booking_error)?;
    Ok(Json(modal.view()))
}

async fn get_availability(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
    Query(query): Query<AvailabilityQuery>,
) -> ApiResult<AvailabilityState> {
    let modal = load_session(&state, &session_id).await?;
    let availability = if query.wait {
        modal.wait_for_availability().await
    } else {
        modal.availability()
    };
    Ok(Json(availability))
}

async fn advance(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<AdvanceResponse> {
    let modal = load_session(&state, &session_id).await?;
    let outcome = modal.advance().await.map_err(booking_error)?;
    info!(session_id = %session_id, outcome = ?outcome, "Advance handled");
    Ok(Json(AdvanceResponse {
        outcome,
        view: modal.view(),
    }))
}

async fn retreat(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<WizardView> {
    let modal = load_session(&state, &session_id).await?;
    modal.retreat().map_err(booking_error)?;
    Ok(Json(modal.view()))
}

async fn dismiss_notice(
    State(state): State<AppState>,
    Path(session_id): Path<String>,
) -> ApiResult<WizardView> {
    let modal = load_session(&state, &session_id).await?;
    modal.dismiss_notice().map_err(booking_error)?;
    Ok(Json(modal.view()))
}

async fn get_theme(State(state): State<AppState>) -> Json<ThemeResponse> {
    Json(ThemeResponse {
        theme: state.theme.theme(),
    })
}

async fn toggle_theme(State(state): State<AppState>) -> ApiResult<ThemeResponse> {
    let theme = state.theme.toggle().map_err(|e| {
        error!(error = %e, "Failed to persist theme");
        booking_error(e)
    })?;
    Ok(Json(ThemeResponse { theme }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{Body, to_bytes};
    use booking_flow::{
        BookingConfig, BookingFlow, Catalog, InMemorySessionStorage, InMemorySettingsStore,
        MockAvailability, MockBookingBackend,
    };
    use std::time::Duration;
    use tower::ServiceExt;

    fn app() -> Router {
        app_with_storage().0
    }

    fn app_with_storage() -> (Router, Arc<InMemorySessionStorage>) {
        let config = BookingConfig::default();
        let services = BookingServices {
            flow: Arc::new(BookingFlow::standard()),
            catalog: Arc::new(Catalog::builtin()),
            availability: Arc::new(MockAvailability::seeded(
                config.availability.clone(),
                Duration::ZERO,
                11,
            )),
            backend: Arc::new(MockBookingBackend::new(Duration::ZERO)),
            config: Arc::new(config),
        };
        let storage = Arc::new(InMemorySessionStorage::new());
        let router = build_router(AppState {
            session_storage: storage.clone(),
            services,
            theme: Arc::new(ThemeSettings::init(Arc::new(InMemorySettingsStore::default()), false)),
        });
        (router, storage)
    }

    async fn call(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .body(match body {
                Some(body) => Body::from(body.to_string()),
                None => Body::empty(),
            })
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, value)
    }

    async fn set(app: &Router, id: &str, field: &str, value: Value) -> (StatusCode, Value) {
        call(
            app,
            "PUT",
            &format!("/booking/{}/field", id),
            Some(json!({ "field": field, "value": value })),
        )
        .await
    }

    #[tokio::test]
    async fn booking_walks_through_all_steps() {
        let app = app();

        let (status, view) = call(
            &app,
            "POST",
            "/booking",
            Some(json!({ "preselected_service_id": "neuro" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(view["step"], 1);
        assert_eq!(view["draft"]["selectedService"]["id"], "neuro");
        let id = view["sessionId"].as_str().unwrap().to_string();

        let (_, availability) =
            call(&app, "GET", &format!("/booking/{}/availability?wait=true", id), None).await;
        assert_eq!(availability["status"], "ready");
        let day = &availability["days"][0];

        let (_, outcome) = call(&app, "POST", &format!("/booking/{}/advance", id), None).await;
        assert_eq!(outcome["outcome"]["outcome"], "blocked");

        set(&app, &id, "selectedDate", day["date"].clone()).await;
        set(&app, &id, "selectedSlot", day["slots"][0]["time"].clone()).await;
        let (_, outcome) = call(&app, "POST", &format!("/booking/{}/advance", id), None).await;
        assert_eq!(outcome["view"]["step"], 2);

        for (field, value) in [
            ("firstName", "Anna"),
            ("lastName", "Muster"),
            ("email", "anna@beispiel.ch"),
            ("phone", "+41 79 123 45 67"),
        ] {
            let (status, _) = set(&app, &id, field, json!(value)).await;
            assert_eq!(status, StatusCode::OK);
        }
        let (_, outcome) = call(&app, "POST", &format!("/booking/{}/advance", id), None).await;
        assert_eq!(outcome["view"]["step"], 3);

        set(&app, &id, "concern", json!("Schlafprobleme")).await;
        set(&app, &id, "consent", json!(true)).await;
        let (_, outcome) = call(&app, "POST", &format!("/booking/{}/advance", id), None).await;
        assert_eq!(outcome["outcome"]["outcome"], "confirmed");
        assert!(!outcome["outcome"]["confirmation"]["id"].as_str().unwrap().is_empty());
        assert_eq!(outcome["view"]["step"], 4);
        assert_eq!(outcome["view"]["summary"]["priceLabel"], "CHF 120");
    }

    #[tokio::test]
    async fn step_cannot_be_set_directly() {
        let app = app();
        let (_, view) = call(&app, "POST", "/booking", Some(json!({}))).await;
        let id = view["sessionId"].as_str().unwrap().to_string();

        let (status, body) = set(&app, &id, "step", json!(4)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().contains("read-only"));

        let (_, view) = call(&app, "GET", &format!("/booking/{}", id), None).await;
        assert_eq!(view["step"], 1);
    }

    #[tokio::test]
    async fn closed_session_rejects_edits() {
        let app = app();
        let (_, view) = call(&app, "POST", "/booking", Some(json!({}))).await;
        let id = view["sessionId"].as_str().unwrap().to_string();

        let (_, view) = call(&app, "POST", &format!("/booking/{}/close", id), None).await;
        assert_eq!(view["isOpen"], false);

        let (status, _) = set(&app, &id, "firstName", json!("Anna")).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let app = app();
        let (status, body) = call(&app, "GET", "/booking/missing", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "Session not found: missing");
    }

    #[tokio::test(start_paused = true)]
    async fn closed_session_is_evicted_after_grace() {
        let (app, storage) = app_with_storage();
        let (_, view) = call(&app, "POST", "/booking", Some(json!({}))).await;
        let id = view["sessionId"].as_str().unwrap().to_string();

        let (_, view) = call(&app, "POST", &format!("/booking/{}/open", id), Some(json!({}))).await;
        assert_eq!(view["opened"], false);
        assert_eq!(view["isOpen"], true);

        call(&app, "POST", &format!("/booking/{}/close", id), None).await;
        assert_eq!(storage.len().await.unwrap(), 1);

        tokio::time::sleep(Duration::from_millis(501)).await;
        assert_eq!(storage.len().await.unwrap(), 0);
        let (status, _) = call(&app, "GET", &format!("/booking/{}", id), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn notice_can_be_dismissed_while_open() {
        let app = app();
        let (_, view) = call(&app, "POST", "/booking", Some(json!({}))).await;
        let id = view["sessionId"].as_str().unwrap().to_string();

        let (status, view) =
            call(&app, "POST", &format!("/booking/{}/notice/dismiss", id), None).await;
        assert_eq!(status, StatusCode::OK);
        assert!(view["notice"].is_null());

        call(&app, "POST", &format!("/booking/{}/close", id), None).await;
        let (status, _) =
            call(&app, "POST", &format!("/booking/{}/notice/dismiss", id), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn theme_toggle_round_trips() {
        let app = app();
        let (_, body) = call(&app, "GET", "/settings/theme", None).await;
        assert_eq!(body["theme"], "light");

        let (status, body) = call(&app, "POST", "/settings/theme/toggle", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["theme"], "dark");
    }

    #[tokio::test]
    async fn services_lists_catalog() {
        let app = app();
        let (_, body) = call(&app, "GET", "/services", None).await;
        let ids: Vec<&str> = body
            .as_array()
            .unwrap()
            .iter()
            .map(|s| s["id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["reflex", "neuro"]);
    }
}
