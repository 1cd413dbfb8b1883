use std::io::IsTerminal;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use expense::api;
use expense::cli::Shell;
use expense::config::{paths::ExpensePaths, settings::Settings};
use expense::ExpenseTracker;

/// Console sessions only surface warnings so log lines don't mix into menus
const QUIET_FILTER: &str = "expense=warn,tower_http=warn";
const SERVER_FILTER: &str = "expense=info,tower_http=info";

#[derive(Parser)]
#[command(
    name = "expense",
    version,
    about = "Multi-user expense tracker with a console and an HTTP API",
    long_about = "expense keeps per-user expense records behind a login. \
                  Use the interactive console, the JSON HTTP API, or both at \
                  once over the same data."
)]
struct Cli {
    /// Base directory for settings and data files
    #[arg(long, global = true, value_name = "DIR", env = "EXPENSE_CLI_DATA_DIR")]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Launch the interactive console
    #[command(alias = "ui")]
    Shell,

    /// Serve the HTTP API until interrupted
    Serve {
        /// Address to bind (overrides settings)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (overrides settings)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Serve the HTTP API in the background and run the console
    Run {
        /// Address to bind (overrides settings)
        #[arg(long)]
        host: Option<String>,
        /// Port to listen on (overrides settings)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Create the data directory and a default settings file
    Init,

    /// Show current configuration and paths
    Config,
}

fn init_tracing(default_filter: &str) {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let paths = match cli.data_dir {
        Some(dir) => ExpensePaths::with_base_dir(dir),
        None => ExpensePaths::new()?,
    };
    let mut settings = Settings::load_or_create(&paths)?;

    match cli.command {
        Some(Commands::Shell) => {
            init_tracing(QUIET_FILTER);
            let tracker = ExpenseTracker::open(paths, &settings)?;
            run_shell(&tracker, &settings)?;
        }
        Some(Commands::Serve { host, port }) => {
            init_tracing(SERVER_FILTER);
            apply_overrides(&mut settings, host, port);
            let tracker = Arc::new(ExpenseTracker::open(paths, &settings)?);

            let runtime = build_runtime()?;
            runtime.block_on(async {
                let listener = api::bind(&settings.server_addr()).await?;
                api::serve(listener, tracker, api::shutdown_signal()).await
            })?;
        }
        Some(Commands::Run { host, port }) => {
            init_tracing(QUIET_FILTER);
            apply_overrides(&mut settings, host, port);
            let tracker = Arc::new(ExpenseTracker::open(paths, &settings)?);

            let runtime = build_runtime()?;
            let addr = settings.server_addr();
            let listener = runtime.block_on(api::bind(&addr))?;
            println!("API listening on http://{}", addr);

            let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
            let server = runtime.spawn(api::serve(listener, Arc::clone(&tracker), async {
                let _ = stop_rx.await;
            }));

            let shell_result = run_shell(&tracker, &settings);

            let _ = stop_tx.send(());
            runtime
                .block_on(server)
                .context("API server task failed")??;
            shell_result?;
        }
        Some(Commands::Init) => {
            println!("Initializing expense tracker at: {}", paths.base_dir().display());
            paths.ensure_directories()?;
            settings.save(&paths)?;
            println!("Initialization complete!");
            println!();
            println!("Settings written to {}", paths.settings_file().display());
            println!("Run 'expense shell' to start the console.");
        }
        Some(Commands::Config) => {
            println!("Expense Tracker Configuration");
            println!("=============================");
            println!("Base directory:   {}", paths.base_dir().display());
            println!("Settings file:    {}", paths.settings_file().display());
            println!("Credential file:  {}", paths.users_file().display());
            println!("Expense file:     {}", paths.expenses_file().display());
            println!();
            println!("Settings:");
            println!("  API address:     {}", settings.server_addr());
            println!("  Currency symbol: {}", settings.currency_symbol);
            println!(
                "  Password hash:   m={} t={} p={}",
                settings.password_hash.memory_cost,
                settings.password_hash.time_cost,
                settings.password_hash.parallelism
            );
        }
        None => {
            println!("expense - multi-user expense tracker");
            println!();
            println!("Run 'expense --help' for usage information.");
            println!("Run 'expense shell' to launch the interactive console.");
            println!("Run 'expense serve' to start the HTTP API.");
        }
    }

    Ok(())
}

fn apply_overrides(settings: &mut Settings, host: Option<String>, port: Option<u16>) {
    if let Some(host) = host {
        settings.server_host = host;
    }
    if let Some(port) = port {
        settings.server_port = port;
    }
}

fn build_runtime() -> Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")
}

fn run_shell(tracker: &ExpenseTracker, settings: &Settings) -> Result<()> {
    let stdin = std::io::stdin();
    let hidden = stdin.is_terminal();
    let stdout = std::io::stdout();

    Shell::new(tracker, settings, stdin.lock(), stdout.lock())
        .hidden_passwords(hidden)
        .run()?;
    Ok(())
}
