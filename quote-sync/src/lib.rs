//! Best-effort mirroring of local state to a remote backend.
//!
//! The local repository is the source of truth. Every local mutation is
//! queued here as a fire-and-forget upsert or delete; a failed call is
//! logged and dropped, never retried, and never rolls back local state.
//! The remote API is PostgREST-shaped: one REST resource per entity table,
//! rows keyed by `(id, user_id)`, last write wins.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("sync not configured: {0}")]
    Config(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("remote returned {status}: {body}")]
    Status {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// The remote entity tables. `Settings` is a single row per user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Quotations,
    Invoices,
    Clients,
    Expenses,
    Settings,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Quotations => "quotations",
            Self::Invoices => "invoices",
            Self::Clients => "clients",
            Self::Expenses => "expenses",
            Self::Settings => "settings",
        }
    }
}

/// Wire shape of a mirrored row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncRecord {
    pub id: String,
    pub user_id: String,
    pub data: serde_json::Value,
    pub updated_at: DateTime<Utc>,
}

/// Connection settings for the remote backend.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    pub base_url: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            api_key: String::new(),
            timeout: Duration::from_secs(15),
        }
    }
}

impl SyncConfig {
    /// Both a URL and a key are required; anything less means the remote
    /// mirror is off and the application runs purely locally.
    pub fn is_configured(&self) -> bool {
        !self.api_key.is_empty()
            && (self.base_url.starts_with("https://") || self.base_url.starts_with("http://"))
    }
}

/// Low-level REST client for the remote tables.
pub struct RemoteStore {
    http: reqwest::Client,
    config: SyncConfig,
}

impl RemoteStore {
    pub fn new(config: SyncConfig) -> Result<Self, SyncError> {
        if !config.is_configured() {
            return Err(SyncError::Config(
                "base URL or API key missing".to_string(),
            ));
        }
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        Ok(Self { http, config })
    }

    fn endpoint(&self, table: Table) -> String {
        format!(
            "{}/rest/v1/{}",
            self.config.base_url.trim_end_matches('/'),
            table.as_str()
        )
    }

    fn authed(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        builder
            .header("apikey", &self.config.api_key)
            .bearer_auth(&self.config.api_key)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, SyncError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(SyncError::Status { status, body })
    }

    /// Bulk read of one table, used once at session start.
    pub async fn fetch_all(
        &self,
        table: Table,
        user_id: &str,
    ) -> Result<Vec<SyncRecord>, SyncError> {
        let response = self
            .authed(self.http.get(self.endpoint(table)))
            .query(&[("user_id", format!("eq.{user_id}")), ("select", "*".to_string())])
            .send()
            .await?;
        let response = Self::check(response).await?;
        Ok(response.json().await?)
    }

    /// Upsert by id. Last write wins on conflict.
    pub async fn upsert(&self, table: Table, record: &SyncRecord) -> Result<(), SyncError> {
        let response = self
            .authed(self.http.post(self.endpoint(table)))
            .header("Prefer", "resolution=merge-duplicates")
            .json(record)
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    /// Delete by id, scoped to the owning user.
    pub async fn delete(&self, table: Table, user_id: &str, id: &str) -> Result<(), SyncError> {
        let response = self
            .authed(self.http.delete(self.endpoint(table)))
            .query(&[("id", format!("eq.{id}")), ("user_id", format!("eq.{user_id}"))])
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }
}

/// Fire-and-forget mirror used by the application after local commits.
///
/// When unconfigured the service is inert: every queue call is a no-op.
pub struct SyncService {
    store: Option<Arc<RemoteStore>>,
    user_id: String,
}

impl SyncService {
    pub fn new(config: SyncConfig, user_id: impl Into<String>) -> Self {
        let user_id = user_id.into();
        if !config.is_configured() {
            info!("remote sync disabled; running locally only");
            return Self {
                store: None,
                user_id,
            };
        }
        match RemoteStore::new(config) {
            Ok(store) => Self {
                store: Some(Arc::new(store)),
                user_id,
            },
            Err(error) => {
                warn!(%error, "remote sync unavailable; running locally only");
                Self {
                    store: None,
                    user_id,
                }
            }
        }
    }

    pub fn disabled(user_id: impl Into<String>) -> Self {
        Self {
            store: None,
            user_id: user_id.into(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.store.is_some()
    }

    /// Mirrors an entity upsert in the background. The returned handle is
    /// only interesting to tests; callers drop it.
    pub fn queue_upsert<T: Serialize>(
        &self,
        table: Table,
        id: &str,
        entity: &T,
    ) -> Option<JoinHandle<()>> {
        let store = self.store.clone()?;
        let record = match serde_json::to_value(entity) {
            Ok(data) => SyncRecord {
                id: id.to_string(),
                user_id: self.user_id.clone(),
                data,
                updated_at: Utc::now(),
            },
            Err(error) => {
                warn!(table = table.as_str(), id, %error, "skipping unserializable record");
                return None;
            }
        };
        Some(tokio::spawn(async move {
            match store.upsert(table, &record).await {
                Ok(()) => debug!(table = table.as_str(), id = %record.id, "mirrored upsert"),
                Err(error) => {
                    warn!(table = table.as_str(), id = %record.id, %error, "remote upsert failed")
                }
            }
        }))
    }

    /// Mirrors an entity delete in the background.
    pub fn queue_delete(&self, table: Table, id: &str) -> Option<JoinHandle<()>> {
        let store = self.store.clone()?;
        let user_id = self.user_id.clone();
        let id = id.to_string();
        Some(tokio::spawn(async move {
            match store.delete(table, &user_id, &id).await {
                Ok(()) => debug!(table = table.as_str(), %id, "mirrored delete"),
                Err(error) => warn!(table = table.as_str(), %id, %error, "remote delete failed"),
            }
        }))
    }

    /// Bulk read for session start. Errors are logged and yield an empty
    /// list; the local store remains authoritative either way.
    pub async fn pull_all(&self, table: Table) -> Vec<SyncRecord> {
        let Some(store) = &self.store else {
            return Vec::new();
        };
        match store.fetch_all(table, &self.user_id).await {
            Ok(records) => records,
            Err(error) => {
                warn!(table = table.as_str(), %error, "remote load failed");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn config(base_url: &str) -> SyncConfig {
        SyncConfig {
            base_url: base_url.to_string(),
            api_key: "test-key".to_string(),
            timeout: Duration::from_secs(5),
        }
    }

    fn record() -> SyncRecord {
        SyncRecord {
            id: "q-1".to_string(),
            user_id: "user-1".to_string(),
            data: serde_json::json!({"status": "Pending"}),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn missing_key_or_url_means_unconfigured() {
        assert!(!SyncConfig::default().is_configured());
        assert!(!config("").is_configured());
        assert!(config("https://example.test").is_configured());
    }

    #[tokio::test]
    async fn fetch_all_selects_rows_for_the_user() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/quotations"))
            .and(query_param("user_id", "eq.user-1"))
            .and(header("apikey", "test-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(vec![record()]))
            .expect(1)
            .mount(&server)
            .await;
        let store = RemoteStore::new(config(&server.uri())).unwrap();

        let records = store.fetch_all(Table::Quotations, "user-1").await.unwrap();

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "q-1");
    }

    #[tokio::test]
    async fn upsert_posts_with_merge_duplicates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/invoices"))
            .and(header("Prefer", "resolution=merge-duplicates"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;
        let store = RemoteStore::new(config(&server.uri())).unwrap();

        store.upsert(Table::Invoices, &record()).await.unwrap();
    }

    #[tokio::test]
    async fn delete_scopes_to_id_and_user() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/rest/v1/clients"))
            .and(query_param("id", "eq.c-9"))
            .and(query_param("user_id", "eq.user-1"))
            .respond_with(ResponseTemplate::new(204))
            .expect(1)
            .mount(&server)
            .await;
        let store = RemoteStore::new(config(&server.uri())).unwrap();

        store.delete(Table::Clients, "user-1", "c-9").await.unwrap();
    }

    #[tokio::test]
    async fn error_status_surfaces_as_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/quotations"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;
        let store = RemoteStore::new(config(&server.uri())).unwrap();

        let result = store.upsert(Table::Quotations, &record()).await;

        assert!(matches!(result, Err(SyncError::Status { .. })));
    }

    #[tokio::test]
    async fn queued_upsert_reaches_the_remote() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/expenses"))
            .respond_with(ResponseTemplate::new(201))
            .expect(1)
            .mount(&server)
            .await;
        let service = SyncService::new(config(&server.uri()), "user-1");

        let handle = service
            .queue_upsert(Table::Expenses, "e-1", &serde_json::json!({"amount": "2500"}))
            .expect("service is enabled");
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn queued_failure_is_swallowed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;
        let service = SyncService::new(config(&server.uri()), "user-1");

        let handle = service
            .queue_upsert(Table::Quotations, "q-1", &serde_json::json!({}))
            .expect("service is enabled");
        // Completes without panicking; the error only reaches the log.
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn disabled_service_is_inert() {
        let service = SyncService::disabled("user-1");

        assert!(!service.is_enabled());
        assert!(service.queue_upsert(Table::Clients, "c-1", &serde_json::json!({})).is_none());
        assert!(service.queue_delete(Table::Clients, "c-1").is_none());
        assert!(service.pull_all(Table::Clients).await.is_empty());
    }
}
