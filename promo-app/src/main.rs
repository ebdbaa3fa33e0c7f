use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, error::ErrorKind};
use promo_common::observability::{LogConfig, LogHandle, init_logging};
use promo_common::{DISPLAY_NAME, PromoError, VERSION};
use promo_config::{DEFAULT_CONFIG_FILE, PromoConfig, PromoConfigLoader, TwitterCredentials};
use promo_content::{ContentCatalog, ContentSources};
use promo_runtime::{PromoRuntime, Schedule, run_schedule, spawn_ctrl_c};
use promo_social::twitter::{OAuthCredentials, TwitterApi};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use bot::PromoBot;
mod bot;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(1);

#[derive(Debug, Parser)]
#[command(
    name = promo_common::APP_NAME,
    version,
    about = "Bluesky Twitter Bot: tweets Bluesky starter packs, feeds and reasons every few hours",
    after_help = "Content files (paths set in the configuration file):\n  \
                  starter_packs.csv    name,description,link\n  \
                  feeds.csv            name,description,link\n  \
                  bluesky_reasons.txt  one reason per line"
)]
struct Cli {
    /// Post a single tweet and exit (status 0 on success, 1 on failure).
    #[arg(long)]
    once: bool,

    /// Configuration file (JSON, YAML or TOML).
    #[arg(long, env = "PROMO_CONFIG", default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,
}

fn main() -> ExitCode {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) => return on_bad_arguments(e),
    };

    let cfg = match PromoConfigLoader::new().with_file(&cli.config).load() {
        Ok(cfg) => cfg,
        Err(e) => {
            let _log = init_logging(LogConfig::default()).ok();
            tracing::error!("{e}");
            if !cli.config.exists() {
                tracing::error!(
                    "Please create {} from config.json.example",
                    cli.config.display()
                );
            }
            return ExitCode::FAILURE;
        }
    };

    let log = match init_logging(log_config(&cfg)) {
        Ok(handle) => handle,
        Err(e) => {
            eprintln!("{DISPLAY_NAME}: {e}");
            return ExitCode::FAILURE;
        }
    };
    announce(&log, &cli);

    let code = match run(cli, cfg) {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::FAILURE
        }
    };
    log.close();
    code
}

/// `--help` and `--version` print and succeed. Anything else unrecognised
/// is logged, followed by the help text, and still exits cleanly.
fn on_bad_arguments(e: clap::Error) -> ExitCode {
    if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
        let _ = e.print();
        return ExitCode::SUCCESS;
    }

    let _log = init_logging(LogConfig::default()).ok();
    tracing::error!("Invalid arguments: {}", e.render().to_string().trim());
    let _ = Cli::command().print_help();
    println!();
    ExitCode::SUCCESS
}

fn log_config(cfg: &PromoConfig) -> LogConfig {
    LogConfig {
        log_dir: cfg.log.dir.clone(),
        emit_console: cfg.log.console,
        format: cfg.log.format,
        ..LogConfig::default()
    }
}

fn announce(log: &LogHandle, cli: &Cli) {
    tracing::info!("Logging initialized - Log file: {}", log.path().display());
    tracing::info!(
        "Platform: {} {}",
        std::env::consts::OS,
        std::env::consts::ARCH
    );
    tracing::info!("Initializing {DISPLAY_NAME} v{VERSION}");
    tracing::info!(
        "Configuration loaded successfully from {}",
        cli.config.display()
    );
}

fn oauth_credentials(creds: &TwitterCredentials) -> OAuthCredentials {
    OAuthCredentials {
        consumer_key: creds.consumer_key.clone(),
        consumer_secret: creds.consumer_secret.clone(),
        access_token: creds.access_token.clone(),
        access_token_secret: creds.access_token_secret.clone(),
    }
}

fn run(cli: Cli, cfg: PromoConfig) -> Result<ExitCode> {
    let twitter = TwitterApi::new(oauth_credentials(&cfg.twitter))
        .map_err(|e| PromoError::Config(format!("Failed to initialize Twitter client: {e}")))?;
    tracing::info!("Twitter API client initialized successfully");

    let catalog = ContentCatalog::load(&ContentSources {
        starter_packs: cfg.starter_packs_csv.clone(),
        feeds: cfg.feeds_csv.clone(),
        reasons: cfg.bluesky_reasons_file.clone(),
    });
    let bot = PromoBot::new(catalog, twitter);
    if bot.catalog().is_empty() {
        tracing::warn!("No content loaded; every cycle will be skipped until the files are fixed");
    }

    let runtime = PromoRuntime::build("promo-bot").context("failed to start the async runtime")?;

    if cli.once {
        let outcome = runtime.block_on(bot.run_once());
        runtime.shutdown(SHUTDOWN_GRACE);
        return Ok(match outcome {
            Ok(true) => ExitCode::SUCCESS,
            Ok(false) => ExitCode::FAILURE,
            Err(e) => {
                tracing::error!("Unexpected error: {e:#}");
                ExitCode::FAILURE
            }
        });
    }

    let schedule = Schedule {
        interval: cfg.schedule.interval(),
        retry_delay: cfg.schedule.retry_delay(),
    };
    let cancel = runtime.cancellation();
    let stats = runtime.block_on(async {
        spawn_ctrl_c(cancel.clone());
        tracing::info!("Starting continuous bot execution...");
        run_schedule(|| bot.run_once(), schedule, cancel).await
    });
    tracing::info!(
        "Stopped after {} posted, {} failed, {} unexpected",
        stats.succeeded,
        stats.failed,
        stats.unexpected
    );
    runtime.shutdown(SHUTDOWN_GRACE);
    Ok(ExitCode::SUCCESS)
}
