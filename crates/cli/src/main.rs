//! TicketDesk command line.
//!
//! Runs calendar imports by hand or on a schedule and manages the customer
//! registry stored in SQLite.

#![cfg_attr(not(test), forbid(unsafe_code))]

mod context;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context as _, Result};
use clap::{Args, Parser, Subcommand};
use ticketdesk_core::{CustomerRepository, SyncRequest};
use ticketdesk_domain::{CustomerCode, NewCustomer};
use ticketdesk_infra::scheduling::{CalendarScheduler, CalendarSchedulerConfig};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use crate::context::{load_config, AppContext};

/// TicketDesk customer registry and calendar import.
#[derive(Parser)]
#[command(name = "ticketdesk")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (TOML or JSON).
    #[arg(short, long, global = true, env = "TICKETDESK_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database and apply the schema.
    InitDb,

    /// Import customers from the calendar once.
    Sync(SyncArgs),

    /// Import customers periodically until interrupted.
    Watch(SyncArgs),

    /// Show the code the next customer would receive.
    NextCode,

    /// Register a customer manually.
    AddCustomer {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        address: Option<String>,
    },

    /// List customers ordered by code.
    List {
        /// Print as JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Delete a customer by code.
    Delete {
        /// Four letter customer code, e.g. `aaab`.
        code: String,
    },
}

/// Overrides applied on top of the `[calendar]` configuration.
#[derive(Args, Debug, Default)]
struct SyncArgs {
    /// Calendar to read; defaults to the configured calendar.
    #[arg(long)]
    calendar_id: Option<String>,

    /// Days before today included in the window.
    #[arg(long)]
    past_days: Option<i64>,

    /// Days after today included in the window.
    #[arg(long)]
    future_days: Option<i64>,

    /// Upper bound on fetched events.
    #[arg(long)]
    max_results: Option<i64>,
}

impl SyncArgs {
    fn apply(&self, mut request: SyncRequest) -> SyncRequest {
        if let Some(calendar_id) = &self.calendar_id {
            request.calendar_id = Some(calendar_id.clone());
        }
        if let Some(past_days) = self.past_days {
            request.past_days = past_days;
        }
        if let Some(future_days) = self.future_days {
            request.future_days = future_days;
        }
        if let Some(max_results) = self.max_results {
            request.max_results = max_results;
        }
        request
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env file is fine.
    let _ = dotenvy::dotenv();

    let cli = Cli::parse();
    init_tracing(cli.verbose, cli.json_logs);

    run(cli).await
}

fn init_tracing(verbose: bool, json: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config = load_config(cli.config)?;
    let ctx = AppContext::new(config)?;

    match cli.command {
        Commands::InitDb => {
            ctx.db.health_check().context("database health check failed")?;
            println!("Database ready at {}", ctx.db.path().display());
        }

        Commands::Sync(args) => {
            let credentials = ctx.credentials()?;
            let service = ctx.calendar_sync(credentials)?;
            let request = args.apply(SyncRequest::from(&ctx.config.calendar));

            let (stats, details) = service.sync(request).await?;
            println!("{}", details.summary(&stats));
        }

        Commands::Watch(args) => watch(&ctx, &args).await?,

        Commands::NextCode => {
            let code = ctx.customers.next_code().await?;
            println!("{code}");
        }

        Commands::AddCustomer { name, email, phone, address } => {
            let customer = NewCustomer::normalized(
                &name,
                email.as_deref(),
                phone.as_deref(),
                address.as_deref(),
            );
            let created = ctx.customers.create_customer(customer).await?;
            println!("Created customer {} ({})", created.code, created.name);
        }

        Commands::List { json } => {
            let customers = ctx.customers.list().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&customers)?);
            } else if customers.is_empty() {
                println!("No customers");
            } else {
                for customer in &customers {
                    println!(
                        "{}  {:<30} {:<30} {:<16} {}",
                        customer.code,
                        customer.name,
                        customer.email.as_deref().unwrap_or("-"),
                        customer.phone.as_deref().unwrap_or("-"),
                        customer.address.as_deref().unwrap_or("-"),
                    );
                }
            }
        }

        Commands::Delete { code } => {
            let code = CustomerCode::parse(&code)?;
            if ctx.customers.delete(&code).await? {
                println!("Deleted customer {code}");
            } else {
                bail!("customer {code} not found");
            }
        }
    }

    Ok(())
}

async fn watch(ctx: &AppContext, args: &SyncArgs) -> Result<()> {
    let calendar = &ctx.config.calendar;
    if !calendar.auto_sync {
        bail!("automatic calendar sync is disabled (calendar.auto_sync = false)");
    }

    let credentials = ctx.credentials()?;
    if !credentials.is_configured() {
        warn!(
            credentials_file = %calendar.credentials_file,
            "Calendar credentials not found; ticks will be skipped until they exist"
        );
    }

    let service = ctx.calendar_sync(Arc::clone(&credentials))?;
    let mut config = CalendarSchedulerConfig::from_calendar(calendar);
    config.request = args.apply(config.request);

    let mut scheduler = CalendarScheduler::new(service, credentials, config);
    scheduler.start();
    info!(interval_secs = calendar.sync_interval().as_secs(), "Calendar scheduler running");

    tokio::signal::ctrl_c().await.context("failed to listen for shutdown signal")?;
    info!("Shutdown requested");

    scheduler.stop().await?;
    Ok(())
}
