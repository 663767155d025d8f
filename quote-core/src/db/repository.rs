use async_trait::async_trait;
use thiserror::Error;

use crate::models::{Client, Expense, Invoice, Quotation, Settings};

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Record not found")]
    NotFound,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Connection error: {0}")]
    Connection(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Local-first storage for every entity collection plus the settings row.
///
/// All reads and writes are scoped to an owning user. Collections load in
/// bulk once per session; every local mutation is an upsert or delete by id.
#[async_trait]
pub trait QuoteRepository: Send + Sync {
    // Quotations
    async fn load_quotations(&self, user_id: &str) -> Result<Vec<Quotation>, RepositoryError>;
    async fn upsert_quotation(
        &self,
        user_id: &str,
        quotation: &Quotation,
    ) -> Result<(), RepositoryError>;
    async fn delete_quotation(&self, user_id: &str, id: &str) -> Result<(), RepositoryError>;

    // Invoices
    async fn load_invoices(&self, user_id: &str) -> Result<Vec<Invoice>, RepositoryError>;
    async fn upsert_invoice(
        &self,
        user_id: &str,
        invoice: &Invoice,
    ) -> Result<(), RepositoryError>;
    async fn delete_invoice(&self, user_id: &str, id: &str) -> Result<(), RepositoryError>;

    // Clients
    async fn load_clients(&self, user_id: &str) -> Result<Vec<Client>, RepositoryError>;
    async fn upsert_client(&self, user_id: &str, client: &Client) -> Result<(), RepositoryError>;
    async fn delete_client(&self, user_id: &str, id: &str) -> Result<(), RepositoryError>;

    // Expenses
    async fn load_expenses(&self, user_id: &str) -> Result<Vec<Expense>, RepositoryError>;
    async fn upsert_expense(
        &self,
        user_id: &str,
        expense: &Expense,
    ) -> Result<(), RepositoryError>;
    async fn delete_expense(&self, user_id: &str, id: &str) -> Result<(), RepositoryError>;

    // Settings (single row per user)
    async fn load_settings(&self, user_id: &str) -> Result<Option<Settings>, RepositoryError>;
    async fn save_settings(
        &self,
        user_id: &str,
        settings: &Settings,
    ) -> Result<(), RepositoryError>;
}
