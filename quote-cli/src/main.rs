mod app;
mod config;
mod notes;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use comfy_table::{Attribute, Cell, Color, Table, presets::UTF8_FULL};
use rust_decimal::Decimal;
use tracing::debug;
use tracing_subscriber::EnvFilter;

use quote_core::calculate_totals;
use quote_core::models::QuotationStatus;
use quote_export::format_money;

use crate::app::{App, ExportFormat};
use crate::config::{AppConfig, Theme};

// ─── CLI definition ──────────────────────────────────────────────────────────

/// Quotation and invoicing tool for tiling projects.
///
/// Drafts quotations from job notes, tracks clients and expenses, raises
/// invoices and exports documents. All data lives in a local database;
/// remote sync and AI drafting are optional extras configured in
/// `config.toml`.
#[derive(Debug, Parser)]
#[command(name = "quote", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Draft a new quotation from job notes.
    Draft {
        /// A job note; repeat for several lines. Omit to open the editor.
        #[arg(short, long = "note")]
        notes: Vec<String>,
    },
    /// Edit notes interactively, then draft from them.
    Notes,
    /// List quotations.
    List {
        /// Filter by status.
        #[arg(long)]
        status: Option<String>,
    },
    /// Show one quotation (or invoice) with its cost breakdown.
    Show { id: String },
    /// Revise a quotation with a natural-language instruction.
    Refine { id: String, instruction: String },
    /// Mark a quotation accepted.
    Accept { id: String },
    /// Mark a quotation rejected.
    Reject { id: String },
    /// Delete a quotation.
    Delete { id: String },
    /// Raise an invoice from a quotation.
    Invoice { id: String },
    /// List invoices.
    Invoices,
    /// Mark an invoice paid.
    Pay { id: String },
    /// Export a document.
    Export {
        id: String,
        #[arg(long, value_enum)]
        format: ExportFormat,
        /// Output path; defaults to a name derived from the client.
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Extract text from a photographed job note.
    Ocr { image: PathBuf },
    /// Assess site conditions from a photo.
    Assess { image: PathBuf },
    /// Manage the client register.
    Clients {
        #[command(subcommand)]
        command: ClientCommand,
    },
    /// Track expenses.
    Expenses {
        #[command(subcommand)]
        command: ExpenseCommand,
    },
    /// Business overview.
    Dashboard {
        /// Also write the metrics to a CSV file.
        #[arg(long)]
        export: Option<PathBuf>,
    },
    /// Show or change settings.
    Settings {
        #[command(subcommand)]
        command: SettingsCommand,
    },
    /// Remote mirror operations.
    Sync {
        #[command(subcommand)]
        command: SyncCommand,
    },
}

#[derive(Debug, Subcommand)]
enum ClientCommand {
    List,
    Add {
        name: String,
        #[arg(long, default_value = "")]
        address: String,
        #[arg(long, default_value = "")]
        phone: String,
        #[arg(long)]
        email: Option<String>,
    },
    Remove { id: String },
}

#[derive(Debug, Subcommand)]
enum ExpenseCommand {
    List,
    Add {
        category: String,
        description: String,
        amount: Decimal,
        /// Link the expense to a quotation.
        #[arg(long)]
        quotation: Option<String>,
    },
    Remove { id: String },
}

#[derive(Debug, Subcommand)]
enum SettingsCommand {
    Show,
    /// Set the tax percentage applied after adjustments.
    SetTax { percentage: Decimal },
    /// Set the theme preference: light, dark or system.
    SetTheme { theme: String },
}

#[derive(Debug, Subcommand)]
enum SyncCommand {
    /// Pull every remote collection into the local store.
    Pull,
}

// ─── tracing ─────────────────────────────────────────────────────────────────

/// Initialise the tracing subscriber.
///
/// * Honours `RUST_LOG` when set.
/// * Falls back to `info` so normal runs are quiet.
/// * Strips timestamps and target names to keep CLI output clean.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::from("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .without_time()
        .with_target(false)
        .init();
}

// ─── output helpers ──────────────────────────────────────────────────────────

fn header_color(theme: Theme) -> Color {
    match theme {
        Theme::Dark => Color::Yellow,
        _ => Color::DarkYellow,
    }
}

fn table(app: &App, headers: &[&str]) -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(
        headers
            .iter()
            .map(|h| {
                Cell::new(h)
                    .add_attribute(Attribute::Bold)
                    .fg(header_color(app.theme))
            })
            .collect::<Vec<_>>(),
    );
    table
}

fn short(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

fn mime_for(path: &PathBuf) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}

fn parse_status(s: &str) -> Result<QuotationStatus> {
    match s.to_ascii_lowercase().as_str() {
        "pending" => Ok(QuotationStatus::Pending),
        "accepted" => Ok(QuotationStatus::Accepted),
        "rejected" => Ok(QuotationStatus::Rejected),
        "invoiced" => Ok(QuotationStatus::Invoiced),
        other => anyhow::bail!("unknown status '{other}'"),
    }
}

// ─── command handlers ────────────────────────────────────────────────────────

fn print_quotation(app: &App, quotation: &quote_core::models::Quotation) {
    let totals = calculate_totals(Some(quotation.into()), &app.settings);
    println!(
        "{} - {} ({:?})",
        short(&quotation.id),
        quotation.client_details.client_name,
        quotation.status
    );
    if !quotation.client_details.project_name.is_empty() {
        println!("Project: {}", quotation.client_details.project_name);
    }

    let mut items = table(app, &["Item", "Qty", "Unit Price", "Amount"]);
    for tile in &quotation.tiles {
        items.add_row(vec![
            Cell::new(&tile.category),
            Cell::new(format!("{} ctn / {} m2", tile.cartons, tile.sqm)),
            Cell::new(format_money(tile.unit_price)),
            Cell::new(format_money(tile.cost())),
        ]);
    }
    for material in &quotation.materials {
        items.add_row(vec![
            Cell::new(&material.item),
            Cell::new(format!("{} {}", material.quantity, material.unit)),
            Cell::new(format_money(material.unit_price)),
            Cell::new(format_money(material.cost())),
        ]);
    }
    println!("{items}");

    let mut summary = table(app, &["", ""]);
    let rows = [
        ("Tile Cost", totals.total_tile_cost),
        ("Materials", totals.total_material_cost),
        ("Workmanship & Maintenance", totals.workmanship_and_maintenance),
        ("Profit", totals.profit_amount),
        ("Adjustments", totals.total_adjustments),
        ("Tax", totals.tax_amount),
        ("Grand Total", totals.grand_total),
    ];
    for (label, amount) in rows {
        summary.add_row(vec![Cell::new(label), Cell::new(format_money(amount))]);
    }
    if !totals.deposit_amount.is_zero() {
        summary.add_row(vec![
            Cell::new("Deposit Due"),
            Cell::new(format_money(totals.deposit_amount)),
        ]);
    }
    println!("{summary}");

    for tip in &quotation.pro_tips {
        println!("tip: {tip}");
    }
}

async fn run(cli: Cli) -> Result<()> {
    let dirs = config::project_dirs()?;
    let app_config = AppConfig::load_or_create(dirs.config_dir())?;
    std::fs::create_dir_all(dirs.data_dir())
        .with_context(|| format!("cannot create data dir '{}'", dirs.data_dir().display()))?;
    let mut app = App::bootstrap(&app_config, dirs.data_dir()).await?;
    debug!(user = %app.user_id, "session ready");

    match cli.command {
        Command::Draft { notes } => {
            let notes = if notes.is_empty() {
                notes::edit_notes(Vec::new())?
            } else {
                notes
            };
            let quotation = app.draft_quotation(&notes).await?;
            print_quotation(&app, &quotation);
        }
        Command::Notes => {
            let notes = notes::edit_notes(Vec::new())?;
            let quotation = app.draft_quotation(&notes).await?;
            print_quotation(&app, &quotation);
        }
        Command::List { status } => {
            let filter = status.as_deref().map(parse_status).transpose()?;
            let quotations = app.repo.load_quotations(&app.user_id).await?;
            let mut t = table(&app, &["Id", "Date", "Client", "Status", "Grand Total"]);
            for q in quotations
                .iter()
                .filter(|q| filter.is_none_or(|f| q.status == f))
            {
                let totals = calculate_totals(Some(q.into()), &app.settings);
                t.add_row(vec![
                    Cell::new(short(&q.id)),
                    Cell::new(q.date.format("%Y-%m-%d")),
                    Cell::new(&q.client_details.client_name),
                    Cell::new(format!("{:?}", q.status)),
                    Cell::new(format_money(totals.grand_total)),
                ]);
            }
            println!("{t}");
        }
        Command::Show { id } => match app.find_quotation(&id).await {
            Ok(quotation) => print_quotation(&app, &quotation),
            Err(_) => {
                let invoice = app.find_invoice(&id).await?;
                let totals = calculate_totals(Some((&invoice).into()), &app.settings);
                println!(
                    "{} - {} ({:?})",
                    invoice.invoice_number,
                    invoice.client_details.client_name,
                    App::effective_status(&invoice)
                );
                println!("Due: {}", invoice.due_date.format("%Y-%m-%d"));
                println!("Grand Total: {}", format_money(totals.grand_total));
            }
        },
        Command::Refine { id, instruction } => {
            let quotation = app.refine_quotation(&id, &instruction).await?;
            print_quotation(&app, &quotation);
        }
        Command::Accept { id } => {
            let q = app
                .set_quotation_status(&id, QuotationStatus::Accepted)
                .await?;
            println!("accepted {}", short(&q.id));
        }
        Command::Reject { id } => {
            let q = app
                .set_quotation_status(&id, QuotationStatus::Rejected)
                .await?;
            println!("rejected {}", short(&q.id));
        }
        Command::Delete { id } => {
            app.delete_quotation(&id).await?;
            println!("deleted");
        }
        Command::Invoice { id } => {
            let invoice = app.raise_invoice(&id).await?;
            println!("raised {}", invoice.invoice_number);
        }
        Command::Invoices => {
            let invoices = app.repo.load_invoices(&app.user_id).await?;
            let mut t = table(&app, &["Number", "Client", "Due", "Status", "Amount"]);
            for i in &invoices {
                let totals = calculate_totals(Some(i.into()), &app.settings);
                t.add_row(vec![
                    Cell::new(&i.invoice_number),
                    Cell::new(&i.client_details.client_name),
                    Cell::new(i.due_date.format("%Y-%m-%d")),
                    Cell::new(format!("{:?}", App::effective_status(i))),
                    Cell::new(format_money(totals.grand_total)),
                ]);
            }
            println!("{t}");
        }
        Command::Pay { id } => {
            let invoice = app.mark_invoice_paid(&id).await?;
            println!("{} marked paid", invoice.invoice_number);
        }
        Command::Export { id, format, out } => {
            let path = app.export_document(&id, format, out).await?;
            println!("wrote {}", path.display());
        }
        Command::Ocr { image } => {
            let bytes = std::fs::read(&image)
                .with_context(|| format!("cannot read image '{}'", image.display()))?;
            let text = app.assistant.text_from_image(&bytes, mime_for(&image)).await;
            println!("{text}");
        }
        Command::Assess { image } => {
            let bytes = std::fs::read(&image)
                .with_context(|| format!("cannot read image '{}'", image.display()))?;
            let assessment = app.assistant.assess_site(&bytes, mime_for(&image)).await;
            println!("{assessment}");
        }
        Command::Clients { command } => match command {
            ClientCommand::List => {
                let clients = app.repo.load_clients(&app.user_id).await?;
                let mut t = table(&app, &["Id", "Name", "Phone", "Address"]);
                for c in &clients {
                    t.add_row(vec![
                        Cell::new(short(&c.id)),
                        Cell::new(&c.name),
                        Cell::new(&c.phone),
                        Cell::new(&c.address),
                    ]);
                }
                println!("{t}");
            }
            ClientCommand::Add {
                name,
                address,
                phone,
                email,
            } => {
                let client = app.add_client(name, address, phone, email).await?;
                println!("added {} ({})", client.name, short(&client.id));
            }
            ClientCommand::Remove { id } => {
                app.remove_client(&id).await?;
                println!("removed");
            }
        },
        Command::Expenses { command } => match command {
            ExpenseCommand::List => {
                let expenses = app.repo.load_expenses(&app.user_id).await?;
                let mut t = table(&app, &["Id", "Date", "Category", "Description", "Amount"]);
                for e in &expenses {
                    t.add_row(vec![
                        Cell::new(short(&e.id)),
                        Cell::new(e.date.format("%Y-%m-%d")),
                        Cell::new(&e.category),
                        Cell::new(&e.description),
                        Cell::new(format_money(e.amount)),
                    ]);
                }
                println!("{t}");
            }
            ExpenseCommand::Add {
                category,
                description,
                amount,
                quotation,
            } => {
                let expense = app
                    .add_expense(category, description, amount, quotation)
                    .await?;
                println!("recorded {} ({})", expense.description, short(&expense.id));
            }
            ExpenseCommand::Remove { id } => {
                app.remove_expense(&id).await?;
                println!("removed");
            }
        },
        Command::Dashboard { export } => {
            let metrics = app.dashboard().await?;
            let mut t = table(&app, &["Metric", "Value"]);
            let rows = [
                ("Quotations", metrics.total_quotations.to_string()),
                (
                    "Acceptance Rate",
                    format!("{}%", metrics.acceptance_rate.round_dp(1)),
                ),
                ("Quoted Value", format_money(metrics.total_quoted_value)),
                ("Revenue", format_money(metrics.total_revenue)),
                ("Paid This Month", format_money(metrics.paid_this_month)),
                ("Outstanding", format_money(metrics.outstanding)),
                ("Expenses", format_money(metrics.total_expenses)),
            ];
            for (label, value) in rows {
                t.add_row(vec![Cell::new(label), Cell::new(value)]);
            }
            println!("{t}");

            if let Some(path) = export {
                quote_export::export_metrics_csv(&metrics, &path)?;
                println!("wrote {}", path.display());
            }
        }
        Command::Settings { command } => match command {
            SettingsCommand::Show => {
                println!("company: {}", app.settings.company.name);
                println!("tax: {}%", app.settings.billing.tax_percentage);
                println!(
                    "deposit default: {}%",
                    app.settings.billing.default_deposit_percentage
                );
                println!("invoice prefix: {}", app.settings.billing.invoice_prefix);
                println!(
                    "workmanship rate: {}",
                    app.settings.pricing.workmanship_rate
                );
                println!("theme: {:?}", app_config.theme);
            }
            SettingsCommand::SetTax { percentage } => {
                app.update_settings(|s| s.billing.tax_percentage = percentage)
                    .await?;
                println!("tax set to {percentage}%");
            }
            SettingsCommand::SetTheme { theme } => {
                let theme = Theme::parse(&theme)
                    .with_context(|| format!("unknown theme '{theme}' (light/dark/system)"))?;
                let mut updated = app_config.clone();
                updated.theme = theme;
                updated.save(dirs.config_dir())?;
                println!("theme set to {theme:?}");
            }
        },
        Command::Sync { command } => match command {
            SyncCommand::Pull => {
                let merged = app.pull_remote().await?;
                println!("merged {merged} records");
            }
        },
    }

    Ok(())
}

// ─── entry point ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    run(Cli::parse()).await
}
