//! Soaring notifier CLI
//!
//! Runs one notification cycle per invocation; schedule it externally
//! (cron, systemd timer) to poll.

use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use notifier::{
    error::Result,
    models::{Config, LoggingConfig},
    pipeline,
    services::TelegramCredentials,
    storage::{EXPIRY_HORIZON, SentCache, now_secs},
    utils::log_file::RotatingFile,
};

/// Soaring Notifier - announces newly soaring tokens on Telegram
#[derive(Parser, Debug)]
#[command(
    name = "soaring-notifier",
    version,
    about = "Announces newly soaring Solana tokens on Telegram"
)]

struct Cli {
    /// Path to the TOML configuration file
    #[arg(short, long, default_value = "notifier.toml")]
    config: PathBuf,

    /// Override the sent-token cache path
    #[arg(long, global = true)]
    cache: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch the ranking once and announce unseen tokens (default)
    Run,

    /// Validate configuration and secrets
    Validate,

    /// Show sent-token cache info
    Info,
}

/// Writes every log line to stderr and a rotating log file.
struct Tee {
    file: RotatingFile,
}

impl Write for Tee {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().write_all(buf)?;
        self.file.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        self.file.flush()
    }
}

/// Initialize logging based on verbosity flag and config.
fn init_logging(verbose: bool, logging: &LoggingConfig) {
    let level = if verbose { "debug" } else { logging.level.as_str() };
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level));
    builder.format_timestamp_secs();

    let mut file_error = None;
    if let Some(path) = &logging.file {
        match RotatingFile::open(path, logging.max_bytes, logging.max_backups) {
            Ok(file) => {
                builder.target(env_logger::Target::Pipe(Box::new(Tee { file })));
            }
            Err(e) => file_error = Some((path.clone(), e)),
        }
    }

    builder.init();

    if let Some((path, e)) = file_error {
        log::warn!(
            "Cannot open log file {}: {}. Logging to stderr only.",
            path.display(),
            e
        );
    }
}

/// Main entry point for the CLI application.
#[tokio::main]
async fn main() -> ExitCode {
    // Secrets may live in a .env file next to the working directory.
    let dotenv_loaded = dotenv::dotenv().is_ok();

    let cli = Cli::parse();

    let config_found = cli.config.exists();
    let mut config = Config::load_or_default(&cli.config);
    if let Some(path) = cli.cache.clone() {
        config.cache.path = path;
    }

    init_logging(cli.verbose, &config.logging);

    if config_found {
        log::info!("Loaded configuration from {}", cli.config.display());
    } else {
        log::info!("No configuration at {}, using defaults", cli.config.display());
    }
    if dotenv_loaded {
        log::debug!("Loaded environment from .env");
    }

    let credentials = TelegramCredentials::from_env();

    let result = match cli.command.unwrap_or(Command::Run) {
        Command::Run => run(&config, credentials).await,
        Command::Validate => validate(&config, &credentials),
        Command::Info => info(&config).await,
    };

    match result {
        Ok(()) => {
            log::info!("Done!");
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(config: &Config, credentials: TelegramCredentials) -> Result<()> {
    config.validate()?;

    if let Err(e) = credentials.require() {
        log::warn!("{}. Deliveries will fail this cycle.", e);
    }

    log::info!("Soaring notifier starting...");
    let report = pipeline::run_cycle(config, credentials).await?;

    log::info!("Cycle summary:");
    for (label, value) in report.summary() {
        log::info!("    {}: {}", label, value);
    }
    if !report.all_delivered() {
        log::warn!(
            "{} token(s) will be retried next cycle: {}",
            report.failed.len(),
            report.failed.join(", ")
        );
    }
    Ok(())
}

fn validate(config: &Config, credentials: &TelegramCredentials) -> Result<()> {
    log::info!("Validating configuration...");

    if let Err(e) = config.validate() {
        log::error!("Config validation failed: {}", e);
        return Err(e);
    }
    log::info!("✓ Config OK");

    credentials.require()?;
    log::info!("✓ Telegram credentials present");

    log::info!("All validations passed!");
    Ok(())
}

async fn info(config: &Config) -> Result<()> {
    let path = &config.cache.path;
    log::info!("Cache file: {}", path.display());
    if !path.exists() {
        log::info!("No cache found yet.");
        return Ok(());
    }

    let cache = SentCache::load(path).await;
    let now = now_secs();
    log::info!(
        "Recent entries: {} (window {}h)",
        cache.len(),
        EXPIRY_HORIZON.as_secs() / 3600
    );

    if let Some((key, sent_at)) = cache.oldest() {
        let expires_in = EXPIRY_HORIZON.as_secs_f64() - (now - sent_at);
        log::info!(
            "Oldest: {} (eligible again in {:.1}h)",
            key,
            expires_in.max(0.0) / 3600.0
        );
    }

    for (key, sent_at) in cache.entries() {
        let when = chrono::DateTime::from_timestamp(sent_at as i64, 0)
            .map(|t| t.to_rfc3339())
            .unwrap_or_else(|| sent_at.to_string());
        log::debug!("    {} sent at {}", key, when);
    }

    Ok(())
}
