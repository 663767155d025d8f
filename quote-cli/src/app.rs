//! Application context and command handlers.
//!
//! Every mutation follows the same shape: write to the local repository
//! first (that write must succeed), then queue a best-effort remote mirror
//! and return. A sync failure therefore never disturbs local state.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::Utc;
use rust_decimal::Decimal;

use quote_assist::{Assistant, assistant_from_key};
use quote_core::db::{DbConfig, RepositoryRegistry};
use quote_core::metrics::DashboardMetrics;
use quote_core::models::{
    Client, DocumentView, Expense, Invoice, InvoiceStatus, Quotation, QuotationStatus, Settings,
};
use quote_core::numbering::{generate_invoice_number, invoice_from_quotation};
use quote_core::QuoteRepository;
use quote_db_sqlite::SqliteRepositoryFactory;
use quote_sync::{SyncConfig, SyncService, Table};
use tracing::info;

use crate::config::{AppConfig, Theme};

/// Which file format an export produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    Pdf,
    Word,
    Excel,
    Csv,
}

impl ExportFormat {
    fn extension(self) -> &'static str {
        match self {
            Self::Pdf => "pdf",
            Self::Word => "doc",
            Self::Excel => "xls",
            Self::Csv => "csv",
        }
    }
}

pub struct App {
    pub repo: Box<dyn QuoteRepository>,
    pub sync: SyncService,
    pub assistant: Box<dyn Assistant>,
    pub settings: Settings,
    pub user_id: String,
    pub theme: Theme,
}

impl App {
    /// Opens the repository, loads (or seeds) settings, and wires up the
    /// remote mirror and the assistant.
    pub async fn bootstrap(config: &AppConfig, data_dir: &Path) -> Result<Self> {
        let mut registry = RepositoryRegistry::new();
        registry.register(Box::new(SqliteRepositoryFactory));
        let db_config = DbConfig {
            backend: "sqlite".to_string(),
            connection_string: config
                .database_path(data_dir)
                .to_string_lossy()
                .into_owned(),
        };
        let repo = registry.create(&db_config).await?;

        let settings = match repo.load_settings(&config.user_id).await? {
            Some(settings) => settings,
            None => {
                let settings = Settings::default();
                repo.save_settings(&config.user_id, &settings).await?;
                settings
            }
        };

        let sync = SyncService::new(
            SyncConfig {
                base_url: config.sync_url.clone(),
                api_key: config.sync_key.clone(),
                ..Default::default()
            },
            config.user_id.clone(),
        );

        let assistant = assistant_from_key(match config.assist_key.is_empty() {
            true => None,
            false => Some(config.assist_key.clone()),
        });

        Ok(Self {
            repo,
            sync,
            assistant,
            settings,
            user_id: config.user_id.clone(),
            theme: config.theme.resolve(),
        })
    }

    // ── quotations ───────────────────────────────────────────────────────

    /// Drafts a quotation from job notes via the assistant and stores it.
    ///
    /// Empty notes abort before any state change.
    pub async fn draft_quotation(&self, notes: &[String]) -> Result<Quotation> {
        if notes.iter().all(|note| note.trim().is_empty()) {
            bail!("no measurements or notes entered; add at least one note first");
        }
        let combined = notes.join("\n");
        let draft = self.assistant.draft_quotation(&combined, &self.settings).await;
        let quotation = draft.into_quotation(Utc::now());

        self.repo.upsert_quotation(&self.user_id, &quotation).await?;
        self.sync
            .queue_upsert(Table::Quotations, &quotation.id, &quotation);
        Ok(quotation)
    }

    /// Revises a quotation per a natural-language instruction.
    pub async fn refine_quotation(&self, id: &str, instruction: &str) -> Result<Quotation> {
        let quotation = self.find_quotation(id).await?;
        let revised = self.assistant.refine_quotation(&quotation, instruction).await;

        self.repo.upsert_quotation(&self.user_id, &revised).await?;
        self.sync.queue_upsert(Table::Quotations, &revised.id, &revised);
        Ok(revised)
    }

    pub async fn set_quotation_status(
        &self,
        id: &str,
        status: QuotationStatus,
    ) -> Result<Quotation> {
        let mut quotation = self.find_quotation(id).await?;
        quotation.status = status;

        self.repo.upsert_quotation(&self.user_id, &quotation).await?;
        self.sync
            .queue_upsert(Table::Quotations, &quotation.id, &quotation);
        Ok(quotation)
    }

    pub async fn delete_quotation(&self, id: &str) -> Result<()> {
        let quotation = self.find_quotation(id).await?;
        self.repo.delete_quotation(&self.user_id, &quotation.id).await?;
        self.sync.queue_delete(Table::Quotations, &quotation.id);
        Ok(())
    }

    /// Finds a quotation by id prefix (full ids are unwieldy to type).
    pub async fn find_quotation(&self, id: &str) -> Result<Quotation> {
        let quotations = self.repo.load_quotations(&self.user_id).await?;
        let mut matches: Vec<_> = quotations
            .into_iter()
            .filter(|q| q.id.starts_with(id))
            .collect();
        match matches.len() {
            0 => bail!("no quotation matches '{id}'"),
            1 => Ok(matches.remove(0)),
            n => bail!("'{id}' is ambiguous ({n} quotations match)"),
        }
    }

    // ── invoices ─────────────────────────────────────────────────────────

    /// Converts a quotation into a numbered invoice and links the two.
    pub async fn raise_invoice(&self, quotation_id: &str) -> Result<Invoice> {
        let mut quotation = self.find_quotation(quotation_id).await?;
        if quotation.invoice_id.is_some() {
            bail!(
                "quotation '{}' already has invoice {}",
                quotation_id,
                quotation.invoice_number.as_deref().unwrap_or("?")
            );
        }

        let invoices = self.repo.load_invoices(&self.user_id).await?;
        let now = Utc::now();
        let number = generate_invoice_number(
            &invoices,
            &self.settings,
            chrono::Datelike::year(&now),
        );
        let invoice = invoice_from_quotation(&quotation, &self.settings, number, now);

        self.repo.upsert_invoice(&self.user_id, &invoice).await?;
        quotation.status = QuotationStatus::Invoiced;
        quotation.invoice_id = Some(invoice.id.clone());
        quotation.invoice_number = Some(invoice.invoice_number.clone());
        self.repo.upsert_quotation(&self.user_id, &quotation).await?;

        self.sync.queue_upsert(Table::Invoices, &invoice.id, &invoice);
        self.sync
            .queue_upsert(Table::Quotations, &quotation.id, &quotation);
        Ok(invoice)
    }

    pub async fn mark_invoice_paid(&self, id: &str) -> Result<Invoice> {
        let mut invoice = self.find_invoice(id).await?;
        invoice.status = InvoiceStatus::Paid;
        invoice.payment_date = Some(Utc::now());

        self.repo.upsert_invoice(&self.user_id, &invoice).await?;
        self.sync.queue_upsert(Table::Invoices, &invoice.id, &invoice);
        Ok(invoice)
    }

    /// Finds an invoice by id prefix or exact invoice number.
    pub async fn find_invoice(&self, key: &str) -> Result<Invoice> {
        let invoices = self.repo.load_invoices(&self.user_id).await?;
        let mut matches: Vec<_> = invoices
            .into_iter()
            .filter(|i| i.id.starts_with(key) || i.invoice_number == key)
            .collect();
        match matches.len() {
            0 => bail!("no invoice matches '{key}'"),
            1 => Ok(matches.remove(0)),
            n => bail!("'{key}' is ambiguous ({n} invoices match)"),
        }
    }

    /// Unpaid invoices past their due date read as overdue.
    pub fn effective_status(invoice: &Invoice) -> InvoiceStatus {
        if invoice.status == InvoiceStatus::Unpaid && invoice.due_date < Utc::now() {
            InvoiceStatus::Overdue
        } else {
            invoice.status
        }
    }

    // ── exports ──────────────────────────────────────────────────────────

    /// Exports a document; `key` matches a quotation first, then an invoice.
    pub async fn export_document(
        &self,
        key: &str,
        format: ExportFormat,
        out: Option<PathBuf>,
    ) -> Result<PathBuf> {
        enum Found {
            Quotation(Quotation),
            Invoice(Invoice),
        }
        let found = match self.find_quotation(key).await {
            Ok(q) => Found::Quotation(q),
            Err(_) => Found::Invoice(self.find_invoice(key).await?),
        };
        let doc: DocumentView<'_> = match &found {
            Found::Quotation(q) => q.into(),
            Found::Invoice(i) => i.into(),
        };

        let path = out.unwrap_or_else(|| {
            PathBuf::from(quote_export::suggested_filename(doc, format.extension()))
        });
        match format {
            ExportFormat::Pdf => quote_export::export_document_pdf(doc, &self.settings, &path)?,
            ExportFormat::Word => quote_export::export_document_word(doc, &self.settings, &path)?,
            ExportFormat::Excel => {
                quote_export::export_document_excel(doc, &self.settings, &path)?
            }
            ExportFormat::Csv => quote_export::export_document_csv(doc, &self.settings, &path)?,
        }
        Ok(path)
    }

    // ── clients ──────────────────────────────────────────────────────────

    pub async fn add_client(
        &self,
        name: String,
        address: String,
        phone: String,
        email: Option<String>,
    ) -> Result<Client> {
        let client = Client {
            address,
            phone,
            email,
            ..Client::new(name)
        };
        self.repo.upsert_client(&self.user_id, &client).await?;
        self.sync.queue_upsert(Table::Clients, &client.id, &client);
        Ok(client)
    }

    pub async fn remove_client(&self, id: &str) -> Result<()> {
        let clients = self.repo.load_clients(&self.user_id).await?;
        let client = clients
            .into_iter()
            .find(|c| c.id.starts_with(id) || c.name == id)
            .with_context(|| format!("no client matches '{id}'"))?;
        self.repo.delete_client(&self.user_id, &client.id).await?;
        self.sync.queue_delete(Table::Clients, &client.id);
        Ok(())
    }

    // ── expenses ─────────────────────────────────────────────────────────

    pub async fn add_expense(
        &self,
        category: String,
        description: String,
        amount: Decimal,
        quotation_id: Option<String>,
    ) -> Result<Expense> {
        if !self.settings.expense_categories.contains(&category) {
            tracing::warn!(%category, "category not in the configured list");
        }
        let expense = Expense {
            quotation_id,
            ..Expense::new(category, description, amount, Utc::now())
        };
        self.repo.upsert_expense(&self.user_id, &expense).await?;
        self.sync.queue_upsert(Table::Expenses, &expense.id, &expense);
        Ok(expense)
    }

    pub async fn remove_expense(&self, id: &str) -> Result<()> {
        let expenses = self.repo.load_expenses(&self.user_id).await?;
        let expense = expenses
            .into_iter()
            .find(|e| e.id.starts_with(id))
            .with_context(|| format!("no expense matches '{id}'"))?;
        self.repo.delete_expense(&self.user_id, &expense.id).await?;
        self.sync.queue_delete(Table::Expenses, &expense.id);
        Ok(())
    }

    // ── settings & dashboard ─────────────────────────────────────────────

    /// The one mutation path for settings: apply, persist, mirror.
    pub async fn update_settings(&mut self, apply: impl FnOnce(&mut Settings)) -> Result<()> {
        apply(&mut self.settings);
        self.repo.save_settings(&self.user_id, &self.settings).await?;
        let user_id = self.user_id.clone();
        self.sync
            .queue_upsert(Table::Settings, &user_id, &self.settings);
        Ok(())
    }

    pub async fn dashboard(&self) -> Result<DashboardMetrics> {
        let quotations = self.repo.load_quotations(&self.user_id).await?;
        let invoices = self.repo.load_invoices(&self.user_id).await?;
        let expenses = self.repo.load_expenses(&self.user_id).await?;
        Ok(DashboardMetrics::compute(
            &quotations,
            &invoices,
            &expenses,
            &self.settings,
            Utc::now(),
        ))
    }

    // ── remote sync ──────────────────────────────────────────────────────

    /// Pulls every remote collection into the local store (session-start
    /// hydration). Remote failures yield empty lists and are only logged;
    /// unreadable records are skipped.
    pub async fn pull_remote(&mut self) -> Result<usize> {
        if !self.sync.is_enabled() {
            bail!("remote sync is not configured (set sync_url and sync_key)");
        }
        let mut merged = 0usize;

        for record in self.sync.pull_all(Table::Quotations).await {
            if let Ok(q) = serde_json::from_value::<Quotation>(record.data) {
                self.repo.upsert_quotation(&self.user_id, &q).await?;
                merged += 1;
            }
        }
        for record in self.sync.pull_all(Table::Invoices).await {
            if let Ok(i) = serde_json::from_value::<Invoice>(record.data) {
                self.repo.upsert_invoice(&self.user_id, &i).await?;
                merged += 1;
            }
        }
        for record in self.sync.pull_all(Table::Clients).await {
            if let Ok(c) = serde_json::from_value::<Client>(record.data) {
                self.repo.upsert_client(&self.user_id, &c).await?;
                merged += 1;
            }
        }
        for record in self.sync.pull_all(Table::Expenses).await {
            if let Ok(e) = serde_json::from_value::<Expense>(record.data) {
                self.repo.upsert_expense(&self.user_id, &e).await?;
                merged += 1;
            }
        }
        if let Some(record) = self.sync.pull_all(Table::Settings).await.into_iter().next()
            && let Ok(settings) = serde_json::from_value::<Settings>(record.data)
        {
            self.settings = settings;
            self.repo.save_settings(&self.user_id, &self.settings).await?;
            merged += 1;
        }

        info!(merged, "remote records merged into the local store");
        Ok(merged)
    }
}
