use anyhow::{Context, Result};
use chrono::{Duration, Local};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use crate::application::{AuthConfig, Credentials, LedgerService, NewExpense};
use crate::domain::{SessionToken, Summary};
use crate::io::write_summary_csv;

/// Spendbook - Personal Expense Ledger
#[derive(Parser)]
#[command(name = "spendbook")]
#[command(about = "Record expenses per account and summarize spending by category")]
#[command(version)]
pub struct Cli {
    /// Database file path
    #[arg(short, long, env = "SPENDBOOK_DB", default_value = "spendbook.db")]
    pub database: String,

    /// Session token from `spendbook login`
    #[arg(long, env = "SPENDBOOK_TOKEN", global = true, hide_env_values = true)]
    pub token: Option<String>,

    /// Lifetime of sessions opened by `login`, in minutes
    #[arg(
        long,
        default_value_t = crate::application::DEFAULT_SESSION_TTL_MINUTES,
        value_parser = clap::value_parser!(i64).range(1..),
        global = true
    )]
    pub session_ttl_minutes: i64,

    /// Minimum password length accepted by `register`
    #[arg(long, default_value_t = crate::application::DEFAULT_MIN_PASSWORD_LENGTH, global = true)]
    pub min_password_length: usize,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database
    Init,

    /// Create an account
    Register {
        /// Username (case-sensitive, must be unique)
        username: String,

        /// Password
        #[arg(long, env = "SPENDBOOK_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// Open a session and print its token
    Login {
        /// Username
        username: String,

        /// Password
        #[arg(long, env = "SPENDBOOK_PASSWORD", hide_env_values = true)]
        password: String,
    },

    /// End the current session
    Logout,

    /// Record an expense
    Add {
        /// Amount spent (e.g., "12.50" or "12")
        amount: String,

        /// Category (e.g., "food", "transport")
        #[arg(short, long)]
        category: String,

        /// Description of the expense
        #[arg(short, long)]
        description: Option<String>,

        /// Date of the expense (YYYY-MM-DD, defaults to today)
        #[arg(long)]
        date: Option<String>,
    },

    /// List expenses, newest first
    List {
        /// Maximum number of expenses to show
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Delete an expense
    Delete {
        /// Expense ID
        id: String,
    },

    /// Show spending per category
    Summary {
        /// Output format: table, json, csv
        #[arg(long, default_value = "table")]
        format: String,
    },

    /// Export data to CSV or JSON
    Export {
        /// What to export: expenses, summary, full
        export_type: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },

    /// Delete expired sessions from the database
    PurgeSessions,
}

/// Install the global tracing subscriber. `RUST_LOG` wins over `--verbose`.
pub fn init_tracing(verbose: bool) {
    let default_level = if verbose { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

impl Cli {
    fn auth_config(&self) -> AuthConfig {
        AuthConfig::default()
            .with_session_ttl(Duration::minutes(self.session_ttl_minutes))
            .with_min_password_length(self.min_password_length)
    }

    fn session_token(&self) -> Result<SessionToken> {
        self.token
            .as_deref()
            .map(SessionToken::from)
            .context("No session token. Run `spendbook login` and pass --token or set SPENDBOOK_TOKEN")
    }

    pub async fn run(self) -> Result<()> {
        let config = self.auth_config();
        let token = self.session_token();

        match self.command {
            Commands::Init => {
                LedgerService::init(&self.database, config).await?;
                println!("Database initialized: {}", self.database);
            }

            Commands::Register { username, password } => {
                let service = LedgerService::connect(&self.database, config).await?;
                let account_id = service
                    .register(&Credentials::new(username.as_str(), password))
                    .await?;
                println!("Registered {} ({})", username, account_id);
            }

            Commands::Login { username, password } => {
                let service = LedgerService::connect(&self.database, config).await?;
                let session = service
                    .login(&Credentials::new(username, password))
                    .await?;
                println!("{}", session.token.as_str());
                eprintln!(
                    "Session valid until {}. Export it with: export SPENDBOOK_TOKEN=<token>",
                    session.expires_at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
                );
            }

            Commands::Logout => {
                let service = LedgerService::connect(&self.database, config).await?;
                service.logout(&token?).await?;
                println!("Logged out");
            }

            Commands::Add {
                amount,
                category,
                description,
                date,
            } => {
                let service = LedgerService::connect(&self.database, config).await?;
                let date = date
                    .unwrap_or_else(|| Local::now().date_naive().format("%Y-%m-%d").to_string());
                let mut expense = NewExpense::new(amount, category, date);
                if let Some(desc) = description {
                    expense = expense.with_description(desc);
                }

                let id = service.add_expense(&token?, expense).await?;
                println!("Recorded expense {}", id);
            }

            Commands::List { limit } => {
                let service = LedgerService::connect(&self.database, config).await?;
                run_list_command(&service, &token?, limit).await?;
            }

            Commands::Delete { id } => {
                let service = LedgerService::connect(&self.database, config).await?;
                let expense_id = Uuid::parse_str(&id).context("Invalid expense ID format")?;
                service.delete_expense(&token?, expense_id).await?;
                println!("Deleted expense {}", expense_id);
            }

            Commands::Summary { format } => {
                let service = LedgerService::connect(&self.database, config).await?;
                let summary = service.summary(&token?).await?;
                print_summary(&summary, &format)?;
            }

            Commands::Export {
                export_type,
                output,
            } => {
                let service = LedgerService::connect(&self.database, config).await?;
                run_export_command(&service, &token?, &export_type, output.as_deref()).await?;
            }

            Commands::PurgeSessions => {
                let service = LedgerService::connect(&self.database, config).await?;
                let removed = service.purge_expired_sessions().await?;
                println!("Removed {} expired session(s)", removed);
            }
        }

        Ok(())
    }
}

async fn run_list_command(
    service: &LedgerService,
    token: &SessionToken,
    limit: Option<usize>,
) -> Result<()> {
    let expenses = service.list_expenses(token).await?;

    if expenses.is_empty() {
        println!("No expenses found.");
        return Ok(());
    }

    println!(
        "{:<12} {:>10} {:<16} {:<30} ID",
        "DATE", "AMOUNT", "CATEGORY", "DESCRIPTION"
    );
    println!("{}", "-".repeat(108));

    for expense in expenses.iter().take(limit.unwrap_or(usize::MAX)) {
        println!(
            "{:<12} {:>10} {:<16} {:<30} {}",
            expense.date.format("%Y-%m-%d"),
            expense.amount,
            truncate(&expense.category, 16),
            truncate(expense.description.as_deref().unwrap_or(""), 30),
            expense.id
        );
    }
    Ok(())
}

fn print_summary(summary: &Summary, format: &str) -> Result<()> {
    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(summary)?);
        }
        "csv" => {
            write_summary_csv(summary, std::io::stdout())?;
        }
        "table" => {
            if summary.is_empty() {
                println!("No expenses recorded.");
                return Ok(());
            }
            println!("{:<20} {:>6} {:>12}", "CATEGORY", "COUNT", "TOTAL");
            println!("{}", "-".repeat(40));
            for entry in &summary.breakdown {
                println!(
                    "{:<20} {:>6} {:>12}",
                    truncate(&entry.category, 20),
                    entry.count,
                    entry.total
                );
            }
            println!("{}", "-".repeat(40));
            println!("{:<20} {:>6} {:>12}", "TOTAL", "", summary.overall_total);
        }
        other => anyhow::bail!("Invalid format '{}'. Valid formats: table, json, csv", other),
    }
    Ok(())
}

async fn run_export_command(
    service: &LedgerService,
    token: &SessionToken,
    export_type: &str,
    output: Option<&str>,
) -> Result<()> {
    use crate::io::Exporter;
    use std::fs::File;
    use std::io::{Write, stdout};

    let exporter = Exporter::new(service);

    let writer: Box<dyn Write> = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdout()),
    };

    let count = match export_type {
        "expenses" => exporter.export_expenses_csv(token, writer).await?,
        "summary" => exporter.export_summary_csv(token, writer).await?,
        "full" => exporter.export_json(token, writer).await?,
        _ => {
            anyhow::bail!(
                "Invalid export type '{}'. Valid types: expenses, summary, full",
                export_type
            );
        }
    };

    if output.is_some() {
        eprintln!("Exported {} {} record(s)", count, export_type);
    }
    Ok(())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
