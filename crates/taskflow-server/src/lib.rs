//! TaskFlow CRUD API.
//!
//! `/tasks` and `/events` each answer `GET` (list), `POST` (create),
//! `PUT` (patch, id in the body) and `DELETE` (id in the query string).
//! Every response is JSON; failures are `{"success": false, "message"}`.

use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, MethodRouter};
use axum::Router;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tracing::{debug, error, info};

use taskflow_core::{
    Database, DatabaseError, EntityKind, Event, EventPatch, NewEvent, NewTask, Record, Task,
    TaskPatch, ValidationError,
};

type SharedDb = Arc<Mutex<Database>>;

/// Request failures, rendered as a JSON error envelope.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0} not found")]
    NotFound(EntityKind),

    #[error("Method not allowed")]
    MethodNotAllowed,

    #[error("{0}")]
    Storage(#[from] DatabaseError),
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) | ApiError::Storage(DatabaseError::NotFound { .. }) => {
                StatusCode::NOT_FOUND
            }
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Storage(DatabaseError::Duplicate { .. }) => StatusCode::CONFLICT,
            ApiError::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            ApiError::Storage(DatabaseError::NotFound { entity, .. }) => format!("{entity} not found"),
            other => other.to_string(),
        };
        if status.is_server_error() {
            error!(%message, "request failed");
        }
        (status, Json(json!({"success": false, "message": message}))).into_response()
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

/// A record kind served as one collection.
trait Resource: Record {
    type Input: DeserializeOwned;
    type Patch: DeserializeOwned;

    fn list(db: &Database) -> Result<Vec<Self>, DatabaseError>;

    fn insert(db: &Database, input: Self::Input) -> Result<Self, ApiError>;

    /// `None` when the patch names no updatable field.
    fn update(db: &Database, id: &str, patch: Self::Patch) -> Result<Option<Self>, ApiError>;

    fn delete(db: &Database, id: &str) -> Result<(), DatabaseError>;
}

impl Resource for Task {
    type Input = NewTask;
    type Patch = TaskPatch;

    fn list(db: &Database) -> Result<Vec<Self>, DatabaseError> {
        db.list_tasks()
    }

    fn insert(db: &Database, input: NewTask) -> Result<Self, ApiError> {
        let input = input.normalized().map_err(|e| match e {
            ValidationError::EmptyField { .. } => ApiError::BadRequest("Title is required".into()),
            other => other.into(),
        })?;
        Ok(db.insert_task(&input)?)
    }

    fn update(db: &Database, id: &str, patch: TaskPatch) -> Result<Option<Self>, ApiError> {
        if patch.is_empty() {
            return Ok(None);
        }
        patch.validate()?;
        Ok(Some(db.update_task(id, &patch)?))
    }

    fn delete(db: &Database, id: &str) -> Result<(), DatabaseError> {
        db.delete_task(id)
    }
}

impl Resource for Event {
    type Input = NewEvent;
    type Patch = EventPatch;

    fn list(db: &Database) -> Result<Vec<Self>, DatabaseError> {
        db.list_events()
    }

    fn insert(db: &Database, input: NewEvent) -> Result<Self, ApiError> {
        let input = input.normalized().map_err(|e| match e {
            ValidationError::EmptyField { .. } | ValidationError::MissingField { .. } => {
                ApiError::BadRequest("Title and Date are required".into())
            }
            other => other.into(),
        })?;
        Ok(db.insert_event(&input)?)
    }

    fn update(db: &Database, id: &str, patch: EventPatch) -> Result<Option<Self>, ApiError> {
        if patch.is_empty() {
            return Ok(None);
        }
        let current = db
            .get_event(id)?
            .ok_or(ApiError::NotFound(EntityKind::Event))?;
        patch.validate_against(&current)?;
        Ok(Some(db.update_event(id, &patch)?))
    }

    fn delete(db: &Database, id: &str) -> Result<(), DatabaseError> {
        db.delete_event(id)
    }
}

fn with_db<T>(db: &SharedDb, f: impl FnOnce(&Database) -> Result<T, ApiError>) -> Result<T, ApiError> {
    let guard = db
        .lock()
        .map_err(|_| ApiError::Storage(DatabaseError::Locked))?;
    f(&guard)
}

fn parse_body<T: DeserializeOwned>(body: Value) -> Result<T, ApiError> {
    serde_json::from_value(body).map_err(|e| ApiError::BadRequest(format!("Invalid request body: {e}")))
}

fn parse_json(body: &Bytes) -> Result<Value, ApiError> {
    serde_json::from_slice(body).map_err(|_| ApiError::BadRequest("Invalid JSON".into()))
}

async fn list<R: Resource>(State(db): State<SharedDb>) -> Result<Json<Vec<R>>, ApiError> {
    debug!(collection = R::KIND.collection(), "list");
    let records = with_db(&db, |db| Ok(R::list(db)?))?;
    Ok(Json(records))
}

async fn create<R: Resource>(State(db): State<SharedDb>, body: Bytes) -> Result<Response, ApiError> {
    let input: R::Input = parse_body(parse_json(&body)?)?;
    let record = with_db(&db, |db| R::insert(db, input))?;
    info!(collection = R::KIND.collection(), id = record.id(), "created");
    let key = R::KIND.singular();
    Ok((StatusCode::CREATED, Json(json!({"success": true, key: record}))).into_response())
}

/// Accepts string or numeric ids.
fn body_id(body: &Value) -> Option<String> {
    match body.get("id")? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

async fn update<R: Resource>(State(db): State<SharedDb>, body: Bytes) -> Result<Response, ApiError> {
    let body = parse_json(&body)?;
    let id = body_id(&body).ok_or_else(|| ApiError::BadRequest("ID is required".into()))?;
    let patch: R::Patch = parse_body(body)?;
    let record = with_db(&db, |db| R::update(db, &id, patch))?
        .ok_or_else(|| ApiError::BadRequest("No fields to update".into()))?;
    info!(collection = R::KIND.collection(), %id, "updated");
    let key = R::KIND.singular();
    Ok(Json(json!({"success": true, key: record})).into_response())
}

#[derive(Debug, Deserialize)]
struct IdParam {
    id: Option<String>,
}

async fn delete<R: Resource>(
    State(db): State<SharedDb>,
    Query(params): Query<IdParam>,
) -> Result<Response, ApiError> {
    let id = params
        .id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::BadRequest("ID is required".into()))?;
    with_db(&db, |db| Ok(R::delete(db, &id)?))?;
    info!(collection = R::KIND.collection(), %id, "deleted");
    let message = format!("{} deleted", R::KIND);
    Ok(Json(json!({"success": true, "message": message})).into_response())
}

async fn preflight() -> StatusCode {
    StatusCode::OK
}

async fn method_not_allowed() -> ApiError {
    ApiError::MethodNotAllowed
}

fn collection<R: Resource>() -> MethodRouter<SharedDb> {
    get(list::<R>)
        .post(create::<R>)
        .put(update::<R>)
        .delete(delete::<R>)
        .options(preflight)
        .fallback(method_not_allowed)
}

/// Build the API router over `db`.
pub fn router(db: Database) -> Router {
    let state: SharedDb = Arc::new(Mutex::new(db));
    Router::new()
        .route("/tasks", collection::<Task>())
        .route("/events", collection::<Event>())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// The API served on a background task.
pub struct ApiServer {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl ApiServer {
    /// Bind to `bind` (port `0` picks a free port) and start serving.
    ///
    /// # Errors
    ///
    /// Returns an error if the TCP listener cannot bind.
    pub async fn start(db: Database, bind: &str) -> std::io::Result<Self> {
        let listener = TcpListener::bind(bind).await?;
        let addr = listener.local_addr()?;
        let app = router(db);

        info!("TaskFlow API listening on http://{addr}/");

        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                error!("API server error: {e}");
            }
        });

        Ok(Self { addr, handle })
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Base URL clients should use.
    pub fn base_url(&self) -> String {
        format!("http://{}/", self.addr)
    }

    /// Abort the server task.
    pub fn shutdown(&self) {
        self.handle.abort();
    }
}

impl Drop for ApiServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
