//! CLI command definitions, routing, and tracing setup.

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, WrapErr, eyre};
use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use billtrack_core::{BillService, PipelineReport, ProgressReporter};
use billtrack_server::AppState;
use billtrack_shared::{AppConfig, init_config, load_config, load_config_from};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// billtrack: scrape a bill catalog and serve it as a dataset.
#[derive(Parser)]
#[command(
    name = "billtrack",
    version,
    about = "Scrape bill listings and their documents, and serve them as JSON.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file to use instead of ~/.billtrack/billtrack.toml.
    #[arg(long, env = "BILLTRACK_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Override the detail-phase worker count.
    #[arg(long, global = true)]
    pub concurrency: Option<u32>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Serve `GET /api/bills` over HTTP.
    Serve {
        /// Address to bind (defaults to [server].bind).
        #[arg(long)]
        bind: Option<String>,
    },

    /// Run one scrape, save the snapshot, and print the records as JSON.
    Scrape {
        /// Write the JSON to this file instead of stdout.
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Print the last saved snapshot.
    Snapshot,

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "billtrack=info,tower_http=info",
        1 => "billtrack=debug,tower_http=debug",
        _ => "billtrack=trace,tower_http=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    // Logs go to stderr so `scrape` output on stdout stays clean JSON.
    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    // `config init` must work even when the existing file does not parse.
    if let Command::Config {
        action: ConfigAction::Init,
    } = cli.command
    {
        return cmd_config_init();
    }

    let config = resolve_config(&cli)?;

    match cli.command {
        Command::Serve { bind } => cmd_serve(&config, bind.as_deref()).await,
        Command::Scrape { out } => cmd_scrape(&config, out).await,
        Command::Snapshot => cmd_snapshot(&config).await,
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init(),
            ConfigAction::Show => cmd_config_show(&config),
        },
    }
}

/// Load the config file (explicit path or default location) and apply flag overrides.
fn resolve_config(cli: &Cli) -> Result<AppConfig> {
    let mut config = match &cli.config {
        Some(path) => load_config_from(path)?,
        None => load_config()?,
    };

    if let Some(concurrency) = cli.concurrency {
        config.crawl.concurrency = concurrency;
    }

    Ok(config)
}

// ---------------------------------------------------------------------------
// Command handlers
// ---------------------------------------------------------------------------

async fn cmd_serve(config: &AppConfig, bind: Option<&str>) -> Result<()> {
    let bind = bind.unwrap_or(config.server.bind.as_str());
    let addr: SocketAddr = bind
        .parse()
        .map_err(|e| eyre!("invalid bind address '{bind}': {e}"))?;

    let service = BillService::from_config(config)?;
    info!(
        %addr,
        source = %config.source.base_url,
        concurrency = config.crawl.concurrency,
        "starting server"
    );

    billtrack_server::serve(addr, AppState::new(service)).await?;
    Ok(())
}

async fn cmd_scrape(config: &AppConfig, out: Option<PathBuf>) -> Result<()> {
    let service = BillService::from_config(config)?;
    let reporter = CliProgress::new();

    let report = service.scrape(&reporter).await?;
    let json = serde_json::to_string_pretty(&report.records)?;

    match out {
        Some(path) => {
            std::fs::write(&path, &json)
                .wrap_err_with(|| format!("failed to write {}", path.display()))?;
            info!(path = %path.display(), "records written");
        }
        None => println!("{json}"),
    }

    eprintln!(
        "{} records ({} with document, {} failed, {} rows skipped) in {:.1}s",
        report.records.len(),
        report.with_document(),
        report.failed(),
        report.dropped_rows,
        report.elapsed.as_secs_f64()
    );

    Ok(())
}

async fn cmd_snapshot(config: &AppConfig) -> Result<()> {
    let service = BillService::from_config(config)?;

    match service.store().load().await? {
        Some(records) => println!("{}", serde_json::to_string_pretty(&records)?),
        None => {
            return Err(eyre!(
                "no snapshot at {}; run `billtrack scrape` first",
                service.store().describe()
            ));
        }
    }

    Ok(())
}

fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config written to {}", path.display());
    Ok(())
}

fn cmd_config_show(config: &AppConfig) -> Result<()> {
    let rendered = toml::to_string_pretty(config)?;
    println!("{rendered}");
    Ok(())
}

// ---------------------------------------------------------------------------
// CLI progress reporter
// ---------------------------------------------------------------------------

/// CLI progress reporter using an indicatif spinner.
struct CliProgress {
    spinner: ProgressBar,
}

impl CliProgress {
    fn new() -> Self {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
            spinner.set_style(
                style.tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"]),
            );
        }
        spinner.enable_steady_tick(std::time::Duration::from_millis(80));
        Self { spinner }
    }
}

impl ProgressReporter for CliProgress {
    fn phase(&self, name: &str) {
        self.spinner.set_message(name.to_string());
    }

    fn detail_settled(&self, url: &str, current: usize, total: usize) {
        self.spinner
            .set_message(format!("Resolving [{current}/{total}] {url}"));
    }

    fn done(&self, _report: &PipelineReport) {
        self.spinner.finish_and_clear();
    }
}
