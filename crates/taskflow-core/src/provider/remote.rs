//! RemoteProvider: the HTTP+JSON CRUD API.
//!
//! `GET /{collection}` returns a bare array. Mutations answer with an envelope
//! `{"success": bool, "<singular>": record}` or `{"success": false, "message"}`.
//! `DELETE` takes the id as a query parameter, `PUT` carries it in the body.

use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::debug;
use url::Url;

use super::{Provider, ProviderError, ProviderResult};
use crate::calendar::{Event, EventPatch, NewEvent};
use crate::record::{EntityKind, Record};
use crate::task::{NewTask, Task, TaskPatch};

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Provider backed by the TaskFlow HTTP API.
pub struct RemoteProvider {
    base: Url,
    http_client: Client,
}

impl RemoteProvider {
    /// Create a provider for the API rooted at `base_url`.
    pub fn new(base_url: &str, timeout: Duration) -> ProviderResult<Self> {
        let mut base = Url::parse(base_url)?;
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self { base, http_client })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn endpoint(&self, kind: EntityKind) -> ProviderResult<Url> {
        Ok(self.base.join(kind.collection())?)
    }

    async fn list<R: Record>(&self) -> ProviderResult<Vec<R>> {
        let url = self.endpoint(R::KIND)?;
        debug!(%url, "GET");
        let response = self.http_client.get(url).send().await?;
        let body = read_body(response, R::KIND, None).await?;
        serde_json::from_value(body).map_err(|e| {
            ProviderError::Malformed(format!("expected an array of {}: {e}", R::KIND.collection()))
        })
    }

    async fn create<R: Record>(&self, input: &(impl Serialize + Sync)) -> ProviderResult<R> {
        let url = self.endpoint(R::KIND)?;
        debug!(%url, "POST");
        let response = self.http_client.post(url).json(input).send().await?;
        let body = read_body(response, R::KIND, None).await?;
        record_from_envelope(body)
    }

    async fn update<R: Record>(&self, id: &str, patch: &(impl Serialize + Sync)) -> ProviderResult<R> {
        let mut payload = serde_json::to_value(patch)?;
        let Some(fields) = payload.as_object_mut() else {
            return Err(ProviderError::Malformed("patch must serialize to an object".into()));
        };
        fields.insert("id".into(), Value::String(id.to_string()));

        let url = self.endpoint(R::KIND)?;
        debug!(%url, id, "PUT");
        let response = self.http_client.put(url).json(&payload).send().await?;
        let body = read_body(response, R::KIND, Some(id)).await?;
        record_from_envelope(body)
    }

    async fn delete(&self, kind: EntityKind, id: &str) -> ProviderResult<()> {
        let url = self.endpoint(kind)?;
        debug!(%url, id, "DELETE");
        let response = self.http_client.delete(url).query(&[("id", id)]).send().await?;
        let body = read_body(response, kind, Some(id)).await?;
        if body.get("success").and_then(Value::as_bool) == Some(false) {
            return Err(ProviderError::Rejected(message_of(&body)));
        }
        Ok(())
    }
}

fn message_of(body: &Value) -> String {
    body.get("message")
        .and_then(Value::as_str)
        .unwrap_or("request was not successful")
        .to_string()
}

/// Read a response as JSON, mapping 404 on an addressed record to `NotFound`
/// and any other non-2xx status to `Status` with the server's message.
async fn read_body(response: Response, kind: EntityKind, id: Option<&str>) -> ProviderResult<Value> {
    let status = response.status();
    let text = response.text().await?;
    let parsed: Result<Value, _> = serde_json::from_str(&text);

    if status == StatusCode::NOT_FOUND {
        if let Some(id) = id {
            return Err(ProviderError::not_found(kind, id));
        }
    }
    if !status.is_success() {
        let message = parsed
            .ok()
            .as_ref()
            .and_then(|body| body.get("message"))
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
        return Err(ProviderError::Status {
            status: status.as_u16(),
            message,
        });
    }
    parsed.map_err(|e| ProviderError::Malformed(format!("invalid JSON: {e}")))
}

fn record_from_envelope<R: Record>(mut body: Value) -> ProviderResult<R> {
    if body.get("success").and_then(Value::as_bool) != Some(true) {
        return Err(ProviderError::Rejected(message_of(&body)));
    }
    let key = R::KIND.singular();
    let record = body
        .get_mut(key)
        .map(Value::take)
        .ok_or_else(|| ProviderError::Malformed(format!("missing '{key}' in response")))?;
    serde_json::from_value(record)
        .map_err(|e| ProviderError::Malformed(format!("invalid {key} in response: {e}")))
}

#[async_trait]
impl Provider for RemoteProvider {
    fn name(&self) -> &str {
        "remote"
    }

    async fn list_tasks(&self) -> ProviderResult<Vec<Task>> {
        self.list().await
    }

    async fn create_task(&self, input: &NewTask) -> ProviderResult<Task> {
        self.create(input).await
    }

    async fn update_task(&self, id: &str, patch: &TaskPatch) -> ProviderResult<Task> {
        self.update(id, patch).await
    }

    async fn delete_task(&self, id: &str) -> ProviderResult<()> {
        self.delete(EntityKind::Task, id).await
    }

    async fn list_events(&self) -> ProviderResult<Vec<Event>> {
        self.list().await
    }

    async fn create_event(&self, input: &NewEvent) -> ProviderResult<Event> {
        self.create(input).await
    }

    async fn update_event(&self, id: &str, patch: &EventPatch) -> ProviderResult<Event> {
        self.update(id, patch).await
    }

    async fn delete_event(&self, id: &str) -> ProviderResult<()> {
        self.delete(EntityKind::Event, id).await
    }
}
