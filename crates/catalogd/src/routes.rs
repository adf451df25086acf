//! HTTP surface of the daemon
//!
//! Handlers are thin: they check the caller's role, call into catalog-core
//! and map the outcome onto a status code. No catalog rules live here.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use catalog_core::model::external_views;
use catalog_core::validation::FieldViolation;
use catalog_core::{
    CatalogService, Error, ExternalSource, FilmDraft, FilmUpdate, Record, SyncEngine,
};
use serde::Deserialize;
use serde_json::json;
use tower_http::trace::TraceLayer;

use crate::access::{AccessError, MaybePrincipal, Role, require_role};

const NOT_FOUND_MESSAGE: &str = "Película no encontrada";
const DELETED_MESSAGE: &str = "Película eliminada exitosamente";
const SYNC_FAILED_MESSAGE: &str = "Error al sincronizar películas";

/// Shared handler state
#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<SyncEngine>,
    pub service: CatalogService,
    pub source: Arc<dyn ExternalSource>,
}

/// Build the router with every catalog route
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/catalog", get(list_records).post(create_record))
        .route("/catalog/external", get(list_external))
        .route("/catalog/external/:uid", get(get_external))
        .route("/catalog/sync", post(run_sync))
        .route(
            "/catalog/:id",
            get(get_record).put(update_record).delete(delete_record),
        )
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Errors a handler can return
#[derive(Debug)]
pub enum ApiError {
    Access(AccessError),
    NotFound,
    Sync(Error),
    Core(Error),
}

impl From<AccessError> for ApiError {
    fn from(e: AccessError) -> Self {
        ApiError::Access(e)
    }
}

impl From<Error> for ApiError {
    fn from(e: Error) -> Self {
        ApiError::Core(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Access(e) => e.into_response(),
            ApiError::NotFound => (
                StatusCode::NOT_FOUND,
                Json(json!({ "message": NOT_FOUND_MESSAGE })),
            )
                .into_response(),
            ApiError::Sync(e) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "message": SYNC_FAILED_MESSAGE, "error": e.to_string() })),
            )
                .into_response(),
            ApiError::Core(Error::Validation(violations)) => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "message": "Validation failed", "errors": violations })),
            )
                .into_response(),
            ApiError::Core(e @ Error::DuplicateKey(_)) => (
                StatusCode::CONFLICT,
                Json(json!({ "message": e.to_string() })),
            )
                .into_response(),
            ApiError::Core(e) => {
                tracing::error!("Request failed: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "message": e.to_string() })),
                )
                    .into_response()
            }
        }
    }
}

/// Turn a body that failed to decode into a validation error naming the field
///
/// Runs after the role check, so anonymous callers see 401 rather than a
/// decode error.
fn body_violation(rejection: JsonRejection) -> ApiError {
    let text = rejection.body_text();
    let detail = text
        .split_once("target type: ")
        .map_or(text.as_str(), |(_, rest)| rest);

    let violation = match detail.split_once(": ") {
        Some((field, reason)) if !field.is_empty() && !field.contains(char::is_whitespace) => {
            FieldViolation::new(field, reason)
        }
        _ => FieldViolation::new("body", detail),
    };
    ApiError::Core(Error::Validation(vec![violation]))
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

async fn list_records(State(state): State<AppState>) -> Result<Json<Vec<Record>>, ApiError> {
    Ok(Json(state.service.list().await?))
}

#[derive(Debug, Default, Deserialize)]
struct ExternalQuery {
    fullinfo: Option<String>,
}

impl ExternalQuery {
    fn full(&self) -> bool {
        matches!(
            self.fullinfo.as_deref().map(str::to_ascii_lowercase).as_deref(),
            Some("true" | "1")
        )
    }
}

async fn list_external(
    State(state): State<AppState>,
    Query(query): Query<ExternalQuery>,
) -> Result<Response, ApiError> {
    let films = state.source.fetch_collection().await?;
    Ok(Json(external_views(&films, query.full())).into_response())
}

async fn get_external(
    State(state): State<AppState>,
    Path(uid): Path<String>,
) -> Result<Response, ApiError> {
    let film = state.source.fetch_one(&uid).await?;
    Ok(Json(film.detail()).into_response())
}

async fn run_sync(
    State(state): State<AppState>,
    MaybePrincipal(principal): MaybePrincipal,
) -> Result<Response, ApiError> {
    let caller = require_role(principal.as_ref(), &[Role::Admin])?;
    tracing::info!("Sync requested by {}", caller.username);

    let report = state.engine.run_sync().await.map_err(ApiError::Sync)?;
    Ok(Json(report).into_response())
}

async fn create_record(
    State(state): State<AppState>,
    MaybePrincipal(principal): MaybePrincipal,
    body: Result<Json<FilmDraft>, JsonRejection>,
) -> Result<Response, ApiError> {
    require_role(principal.as_ref(), &[Role::Admin])?;
    let Json(draft) = body.map_err(body_violation)?;

    let record = state.service.create(draft).await?;
    Ok((StatusCode::CREATED, Json(record)).into_response())
}

async fn get_record(
    State(state): State<AppState>,
    MaybePrincipal(principal): MaybePrincipal,
    Path(id): Path<String>,
) -> Result<Json<Record>, ApiError> {
    require_role(principal.as_ref(), &[Role::User, Role::Admin])?;

    state.service.get(&id).await?.map(Json).ok_or(ApiError::NotFound)
}

async fn update_record(
    State(state): State<AppState>,
    MaybePrincipal(principal): MaybePrincipal,
    Path(id): Path<String>,
    body: Result<Json<FilmUpdate>, JsonRejection>,
) -> Result<Json<Record>, ApiError> {
    require_role(principal.as_ref(), &[Role::Admin])?;
    let Json(update) = body.map_err(body_violation)?;

    state
        .service
        .update(&id, update)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound)
}

async fn delete_record(
    State(state): State<AppState>,
    MaybePrincipal(principal): MaybePrincipal,
    Path(id): Path<String>,
) -> Result<Response, ApiError> {
    require_role(principal.as_ref(), &[Role::Admin])?;

    let film = state.service.delete(&id).await?.ok_or(ApiError::NotFound)?;
    Ok(Json(json!({ "message": DELETED_MESSAGE, "film": film })).into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::{PRINCIPAL_ID_HEADER, PRINCIPAL_ROLE_HEADER, PRINCIPAL_USERNAME_HEADER};
    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Method, Request};
    use catalog_core::model::{ExternalProperties, ExternalRecord};
    use catalog_core::{MemoryRecordStore, RecordStore, SyncConfig};
    use serde_json::Value;
    use tower::ServiceExt;

    struct StaticSource {
        films: Option<Vec<ExternalRecord>>,
    }

    #[async_trait]
    impl ExternalSource for StaticSource {
        async fn fetch_collection(&self) -> catalog_core::Result<Vec<ExternalRecord>> {
            self.films
                .clone()
                .ok_or_else(|| Error::source_unavailable("connection refused"))
        }

        async fn fetch_one(&self, external_id: &str) -> catalog_core::Result<ExternalRecord> {
            self.fetch_collection()
                .await?
                .into_iter()
                .find(|f| f.uid == external_id)
                .ok_or_else(|| Error::source_unavailable(format!("404 for film {}", external_id)))
        }

        fn source_name(&self) -> &'static str {
            "static"
        }
    }

    fn film(uid: &str, title: &str) -> ExternalRecord {
        ExternalRecord {
            uid: uid.to_string(),
            description: Some("A Star Wars Film".to_string()),
            properties: ExternalProperties {
                title: Some(title.to_string()),
                episode_id: Some(4),
                opening_crawl: Some("It is a period of civil war...".to_string()),
                director: Some("George Lucas".to_string()),
                producer: Some("Gary Kurtz".to_string()),
                release_date: Some("1977-05-25".to_string()),
                characters: vec!["people/1".to_string()],
                ..ExternalProperties::default()
            },
        }
    }

    fn app_with(films: Option<Vec<ExternalRecord>>) -> (Router, MemoryRecordStore) {
        let store = MemoryRecordStore::new();
        let source: Arc<dyn ExternalSource> = Arc::new(StaticSource { films });
        let records: Arc<dyn RecordStore> = Arc::new(store.clone());
        let (engine, _events) =
            SyncEngine::new(source.clone(), records.clone(), SyncConfig::default()).unwrap();

        let state = AppState {
            engine: Arc::new(engine),
            service: CatalogService::new(records),
            source,
        };
        (router(state), store)
    }

    fn app() -> (Router, MemoryRecordStore) {
        app_with(Some(vec![film("1", "A New Hope")]))
    }

    fn request(method: Method, uri: &str, role: Option<&str>, body: Option<Value>) -> Request<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(role) = role {
            builder = builder
                .header(PRINCIPAL_ID_HEADER, "1")
                .header(PRINCIPAL_USERNAME_HEADER, "obiwan")
                .header(PRINCIPAL_ROLE_HEADER, role);
        }
        match body {
            Some(body) => builder
                .header("content-type", "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        }
    }

    async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
        let response = app.clone().oneshot(req).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    fn new_film() -> Value {
        json!({
            "title": "New Film",
            "episode_id": 10,
            "opening_crawl": "A new adventure...",
            "director": "New Director",
            "producer": "New Producer",
            "release_date": "2024-01-01"
        })
    }

    #[tokio::test]
    async fn test_health() {
        let (app, _) = app();
        let (status, body) = send(&app, request(Method::GET, "/health", None, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_sync_requires_admin() {
        let (app, _) = app();

        let (status, _) = send(&app, request(Method::POST, "/catalog/sync", None, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) =
            send(&app, request(Method::POST, "/catalog/sync", Some("user"), None)).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_sync_returns_report() {
        let (app, store) = app();

        let (status, body) =
            send(&app, request(Method::POST, "/catalog/sync", Some("admin"), None)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Sincronización completada");
        assert_eq!(body["total"], 1);
        assert_eq!(body["success"], 1);
        assert_eq!(body["failed"], 0);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_sync_failure_body() {
        let (app, _) = app_with(None);

        let (status, body) =
            send(&app, request(Method::POST, "/catalog/sync", Some("admin"), None)).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["message"], "Error al sincronizar películas");
        assert!(body["error"].as_str().unwrap().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_create_then_get() {
        let (app, _) = app();

        let (status, created) = send(
            &app,
            request(Method::POST, "/catalog", Some("admin"), Some(new_film())),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(created["source"], "local");
        assert_eq!(created["isModified"], false);

        let uri = format!("/catalog/{}", created["id"].as_str().unwrap());
        let (status, _) = send(&app, request(Method::GET, &uri, None, None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, fetched) = send(&app, request(Method::GET, &uri, Some("user"), None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(fetched["title"], "New Film");
    }

    #[tokio::test]
    async fn test_create_reports_every_missing_field() {
        let (app, store) = app();

        let (status, body) = send(
            &app,
            request(Method::POST, "/catalog", Some("admin"), Some(json!({ "title": "Only" }))),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        let fields: Vec<_> = body["errors"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v["field"].as_str().unwrap().to_string())
            .collect();
        assert!(fields.contains(&"episode_id".to_string()));
        assert!(fields.contains(&"release_date".to_string()));
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_wrong_typed_field_is_validation_error() {
        let (app, store) = app();
        let mut payload = new_film();
        payload["episode_id"] = json!("four");

        let (status, body) = send(
            &app,
            request(Method::POST, "/catalog", Some("admin"), Some(payload.clone())),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Validation failed");
        assert_eq!(body["errors"][0]["field"], "episode_id");
        assert!(body["errors"][0]["reason"].as_str().unwrap().contains("invalid type"));
        assert!(store.is_empty().await);

        send(&app, request(Method::POST, "/catalog/sync", Some("admin"), None)).await;
        let record = store.find_by_external_id("1").await.unwrap().unwrap();
        let (status, body) = send(
            &app,
            request(
                Method::PUT,
                &format!("/catalog/{}", record.id),
                Some("admin"),
                Some(json!({ "episode_id": "four" })),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["field"], "episode_id");
    }

    #[tokio::test]
    async fn test_role_is_checked_before_body() {
        let (app, _) = app();
        let mut payload = new_film();
        payload["episode_id"] = json!("four");

        let (status, _) = send(
            &app,
            request(Method::POST, "/catalog", None, Some(payload.clone())),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(
            &app,
            request(Method::PUT, "/catalog/nope", Some("user"), Some(payload)),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let bad_json = Request::builder()
            .method(Method::POST)
            .uri("/catalog")
            .header("content-type", "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let (status, _) = send(&app, bad_json).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_malformed_json_is_body_violation() {
        let (app, _) = app();
        let req = Request::builder()
            .method(Method::POST)
            .uri("/catalog")
            .header("content-type", "application/json")
            .header(PRINCIPAL_ID_HEADER, "1")
            .header(PRINCIPAL_USERNAME_HEADER, "obiwan")
            .header(PRINCIPAL_ROLE_HEADER, "admin")
            .body(Body::from("{not json"))
            .unwrap();

        let (status, body) = send(&app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["errors"][0]["field"], "body");
    }

    #[tokio::test]
    async fn test_update_synced_record_marks_modified() {
        let (app, store) = app();
        send(&app, request(Method::POST, "/catalog/sync", Some("admin"), None)).await;
        let record = store.find_by_external_id("1").await.unwrap().unwrap();

        let uri = format!("/catalog/{}", record.id);
        let (status, body) = send(
            &app,
            request(
                Method::PUT,
                &uri,
                Some("admin"),
                Some(json!({ "title": "A New Hope (Special Edition)", "isModified": false })),
            ),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["isModified"], true);
        assert_eq!(body["source"], "external");

        let (_, report) =
            send(&app, request(Method::POST, "/catalog/sync", Some("admin"), None)).await;
        assert_eq!(report["success"], 0);
        assert!(report["errors"][0].as_str().unwrap().contains("omitida:"));
    }

    #[tokio::test]
    async fn test_missing_record_is_404() {
        let (app, _) = app();

        let (status, body) =
            send(&app, request(Method::GET, "/catalog/nope", Some("admin"), None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "Película no encontrada");

        let (status, _) = send(
            &app,
            request(Method::PUT, "/catalog/nope", Some("admin"), Some(json!({}))),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) =
            send(&app, request(Method::DELETE, "/catalog/nope", Some("admin"), None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_delete_returns_message_and_film() {
        let (app, store) = app();
        let (_, created) = send(
            &app,
            request(Method::POST, "/catalog", Some("admin"), Some(new_film())),
        )
        .await;

        let uri = format!("/catalog/{}", created["id"].as_str().unwrap());
        let (status, body) = send(&app, request(Method::DELETE, &uri, Some("admin"), None)).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Película eliminada exitosamente");
        assert_eq!(body["film"]["id"], created["id"]);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_duplicate_uid_is_conflict() {
        let (app, _) = app();
        let mut payload = new_film();
        payload["uid"] = json!("77");

        let (status, _) = send(
            &app,
            request(Method::POST, "/catalog", Some("admin"), Some(payload.clone())),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, _) = send(
            &app,
            request(Method::POST, "/catalog", Some("admin"), Some(payload)),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_external_views() {
        let (app, store) = app();

        let (status, summary) =
            send(&app, request(Method::GET, "/catalog/external", None, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(summary[0]["uid"], "1");
        assert_eq!(summary[0]["title"], "A New Hope");
        assert!(summary[0].get("characters").is_none());

        let (_, full) = send(
            &app,
            request(Method::GET, "/catalog/external?fullinfo=true", None, None),
        )
        .await;
        assert_eq!(full[0]["characters"][0], "people/1");
        assert_eq!(full[0]["description"], "A Star Wars Film");

        let (status, one) =
            send(&app, request(Method::GET, "/catalog/external/1", None, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(one["uid"], "1");

        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_list_is_public() {
        let (app, _) = app();
        send(&app, request(Method::POST, "/catalog/sync", Some("admin"), None)).await;

        let (status, body) = send(&app, request(Method::GET, "/catalog", None, None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body.as_array().unwrap().len(), 1);
    }
}
