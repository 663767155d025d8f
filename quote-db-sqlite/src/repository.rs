use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use serde::de::DeserializeOwned;
use sqlx::{Row, sqlite::SqlitePool};
use tracing::warn;

use quote_core::models::{Client, Expense, Invoice, Quotation, Settings};
use quote_core::{QuoteRepository, RepositoryError};

/// Local-first storage over SQLite.
///
/// Each collection table holds `(id, user_id, data, updated_at)` rows where
/// `data` is the entity serialized as JSON. A row that no longer parses is
/// skipped with a warning instead of poisoning the whole session load.
pub struct SqliteRepository {
    pool: SqlitePool,
}

impl SqliteRepository {
    pub async fn new(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .with_context(|| format!("Failed to connect to database: {}", database_url))?;
        Ok(Self { pool })
    }

    pub fn new_with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .context("Failed to run database migrations")?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    async fn load_entities<T: DeserializeOwned>(
        &self,
        table: &'static str,
        user_id: &str,
    ) -> Result<Vec<T>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT id, data FROM {table} WHERE user_id = ? ORDER BY updated_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        let mut entities = Vec::with_capacity(rows.len());
        for row in rows {
            let data: String = row
                .try_get("data")
                .map_err(|e| RepositoryError::Database(e.to_string()))?;
            match serde_json::from_str(&data) {
                Ok(entity) => entities.push(entity),
                Err(error) => {
                    let id: String = row.try_get("id").unwrap_or_default();
                    warn!(table, %id, %error, "skipping unreadable record");
                }
            }
        }
        Ok(entities)
    }

    async fn upsert_entity<T: Serialize>(
        &self,
        table: &'static str,
        user_id: &str,
        id: &str,
        entity: &T,
    ) -> Result<(), RepositoryError> {
        let data = serde_json::to_string(entity)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;

        sqlx::query(&format!(
            "INSERT INTO {table} (id, user_id, data, updated_at) VALUES (?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET user_id = excluded.user_id,
                                           data = excluded.data,
                                           updated_at = excluded.updated_at"
        ))
        .bind(id)
        .bind(user_id)
        .bind(data)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        Ok(())
    }

    async fn delete_entity(
        &self,
        table: &'static str,
        user_id: &str,
        id: &str,
    ) -> Result<(), RepositoryError> {
        sqlx::query(&format!("DELETE FROM {table} WHERE id = ? AND user_id = ?"))
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl QuoteRepository for SqliteRepository {
    async fn load_quotations(&self, user_id: &str) -> Result<Vec<Quotation>, RepositoryError> {
        self.load_entities("quotations", user_id).await
    }

    async fn upsert_quotation(
        &self,
        user_id: &str,
        quotation: &Quotation,
    ) -> Result<(), RepositoryError> {
        self.upsert_entity("quotations", user_id, &quotation.id, quotation)
            .await
    }

    async fn delete_quotation(&self, user_id: &str, id: &str) -> Result<(), RepositoryError> {
        self.delete_entity("quotations", user_id, id).await
    }

    async fn load_invoices(&self, user_id: &str) -> Result<Vec<Invoice>, RepositoryError> {
        self.load_entities("invoices", user_id).await
    }

    async fn upsert_invoice(
        &self,
        user_id: &str,
        invoice: &Invoice,
    ) -> Result<(), RepositoryError> {
        self.upsert_entity("invoices", user_id, &invoice.id, invoice)
            .await
    }

    async fn delete_invoice(&self, user_id: &str, id: &str) -> Result<(), RepositoryError> {
        self.delete_entity("invoices", user_id, id).await
    }

    async fn load_clients(&self, user_id: &str) -> Result<Vec<Client>, RepositoryError> {
        self.load_entities("clients", user_id).await
    }

    async fn upsert_client(&self, user_id: &str, client: &Client) -> Result<(), RepositoryError> {
        self.upsert_entity("clients", user_id, &client.id, client)
            .await
    }

    async fn delete_client(&self, user_id: &str, id: &str) -> Result<(), RepositoryError> {
        self.delete_entity("clients", user_id, id).await
    }

    async fn load_expenses(&self, user_id: &str) -> Result<Vec<Expense>, RepositoryError> {
        self.load_entities("expenses", user_id).await
    }

    async fn upsert_expense(
        &self,
        user_id: &str,
        expense: &Expense,
    ) -> Result<(), RepositoryError> {
        self.upsert_entity("expenses", user_id, &expense.id, expense)
            .await
    }

    async fn delete_expense(&self, user_id: &str, id: &str) -> Result<(), RepositoryError> {
        self.delete_entity("expenses", user_id, id).await
    }

    async fn load_settings(&self, user_id: &str) -> Result<Option<Settings>, RepositoryError> {
        let row = sqlx::query("SELECT data FROM settings WHERE user_id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        let Some(row) = row else {
            return Ok(None);
        };
        let data: String = row
            .try_get("data")
            .map_err(|e| RepositoryError::Database(e.to_string()))?;

        serde_json::from_str(&data)
            .map(Some)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))
    }

    async fn save_settings(
        &self,
        user_id: &str,
        settings: &Settings,
    ) -> Result<(), RepositoryError> {
        let data = serde_json::to_string(settings)
            .map_err(|e| RepositoryError::Serialization(e.to_string()))?;

        sqlx::query(
            "INSERT INTO settings (user_id, data, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(user_id) DO UPDATE SET data = excluded.data,
                                                updated_at = excluded.updated_at",
        )
        .bind(user_id)
        .bind(data)
        .bind(Utc::now().to_rfc3339())
        .execute(&self.pool)
        .await
        .map_err(|e| RepositoryError::Database(e.to_string()))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;
    use sqlx::sqlite::SqlitePoolOptions;

    use quote_core::models::QuotationStatus;

    use super::*;

    async fn repo() -> SqliteRepository {
        let pool = SqlitePoolOptions::new()
            .connect("sqlite::memory:")
            .await
            .expect("in-memory database");
        let repo = SqliteRepository::new_with_pool(pool);
        repo.run_migrations().await.expect("migrations");
        repo
    }

    fn quotation() -> Quotation {
        let mut q = Quotation::new(Utc::now());
        q.client_details.client_name = "Mrs. Adeyemi".to_string();
        q.workmanship_rate = dec!(1500);
        q
    }

    #[tokio::test]
    async fn quotation_round_trips_through_the_blob() {
        let repo = repo().await;
        let q = quotation();

        repo.upsert_quotation("user-1", &q).await.unwrap();
        let loaded = repo.load_quotations("user-1").await.unwrap();

        assert_eq!(loaded, vec![q]);
    }

    #[tokio::test]
    async fn upsert_replaces_an_existing_record() {
        let repo = repo().await;
        let mut q = quotation();
        repo.upsert_quotation("user-1", &q).await.unwrap();

        q.status = QuotationStatus::Accepted;
        repo.upsert_quotation("user-1", &q).await.unwrap();

        let loaded = repo.load_quotations("user-1").await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].status, QuotationStatus::Accepted);
    }

    #[tokio::test]
    async fn delete_removes_only_the_named_record() {
        let repo = repo().await;
        let first = quotation();
        let second = quotation();
        repo.upsert_quotation("user-1", &first).await.unwrap();
        repo.upsert_quotation("user-1", &second).await.unwrap();

        repo.delete_quotation("user-1", &first.id).await.unwrap();

        let loaded = repo.load_quotations("user-1").await.unwrap();
        assert_eq!(loaded, vec![second]);
    }

    #[tokio::test]
    async fn records_are_scoped_to_their_owner() {
        let repo = repo().await;
        repo.upsert_quotation("user-1", &quotation()).await.unwrap();

        let other = repo.load_quotations("user-2").await.unwrap();

        assert!(other.is_empty());
    }

    #[tokio::test]
    async fn unreadable_blob_is_skipped_not_fatal() {
        let repo = repo().await;
        repo.upsert_quotation("user-1", &quotation()).await.unwrap();
        sqlx::query(
            "INSERT INTO quotations (id, user_id, data, updated_at) VALUES ('bad', 'user-1', '{not json', '2026-01-01T00:00:00Z')",
        )
        .execute(repo.pool())
        .await
        .unwrap();

        let loaded = repo.load_quotations("user-1").await.unwrap();

        assert_eq!(loaded.len(), 1);
    }

    #[tokio::test]
    async fn settings_row_is_one_per_user() {
        let repo = repo().await;
        assert_eq!(repo.load_settings("user-1").await.unwrap(), None);

        let mut settings = Settings::default();
        repo.save_settings("user-1", &settings).await.unwrap();
        settings.billing.invoice_prefix = "HG".to_string();
        repo.save_settings("user-1", &settings).await.unwrap();

        let loaded = repo.load_settings("user-1").await.unwrap().unwrap();
        assert_eq!(loaded.billing.invoice_prefix, "HG");
    }

    #[tokio::test]
    async fn all_entity_kinds_round_trip() {
        let repo = repo().await;
        let client = Client::new("Chief Okafor");
        let expense = Expense {
            id: "e1".to_string(),
            date: Utc::now(),
            category: "Transport".to_string(),
            description: "Site visit".to_string(),
            amount: dec!(2500),
            quotation_id: None,
        };
        let q = quotation();
        let invoice = quote_core::numbering::invoice_from_quotation(
            &q,
            &Settings::default(),
            "INV-2026-0001".to_string(),
            Utc::now(),
        );

        repo.upsert_client("user-1", &client).await.unwrap();
        repo.upsert_expense("user-1", &expense).await.unwrap();
        repo.upsert_invoice("user-1", &invoice).await.unwrap();

        assert_eq!(repo.load_clients("user-1").await.unwrap(), vec![client]);
        assert_eq!(repo.load_expenses("user-1").await.unwrap(), vec![expense]);
        assert_eq!(repo.load_invoices("user-1").await.unwrap(), vec![invoice]);
    }
}
