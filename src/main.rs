use clap::Parser;
use std::path::Path;
use std::time::Duration;
use tracing::{error, info, warn};

use playlist_sweep::cli::Cli;
use playlist_sweep::core::config::{self, SweepConfig};
use playlist_sweep::scraping::activation::{is_collection_view, wait_for_container};
use playlist_sweep::scraping::browser_manager::{wait_until_stable, BrowserSession};
use playlist_sweep::tools::export::{deliver, Delivery};
use playlist_sweep::{
    run_sweep, CancelToken, OfflineSnapshot, PlaylistPage, RunResult, SweepError, SweepRequest,
};

const CONTAINER_TIMEOUT: Duration = Duration::from_secs(20);
const CONTAINER_POLL: Duration = Duration::from_millis(250);
const SETTLE_QUIET: Duration = Duration::from_millis(800);
const SETTLE_TIMEOUT: Duration = Duration::from_secs(15);

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "debug,chromiumoxide=info"
    } else {
        "info,chromiumoxide=warn"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .init();
}

/// First Ctrl-C asks the run to stop cleanly; it still writes its report.
fn bridge_ctrl_c(cancel: CancelToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received; stopping after the current step");
            cancel.request();
        }
    });
}

async fn run_offline(
    path: &Path,
    request: &SweepRequest,
    config: &SweepConfig,
    cancel: &CancelToken,
) -> anyhow::Result<RunResult> {
    let host = OfflineSnapshot::from_file(path)?;
    run_sweep(&host, request, config, cancel).await
}

async fn run_live(
    cli: &Cli,
    url: &str,
    request: &SweepRequest,
    config: &SweepConfig,
    cancel: &CancelToken,
) -> anyhow::Result<RunResult> {
    let host = config.page.resolve_host();
    if !is_collection_view(url, &host) {
        return Err(SweepError::NotACollectionView(url.to_string()).into());
    }

    let session = match cli.connect.as_deref() {
        Some(endpoint) => BrowserSession::connect(endpoint).await?,
        None => {
            let profile = cli
                .profile
                .clone()
                .or_else(config::default_profile_dir)
                .ok_or_else(|| {
                    SweepError::BrowserLaunch("no profile directory (set --profile)".to_string())
                })?;
            BrowserSession::launch(&profile).await?
        }
    };

    let outcome = drive_page(&session, url, &host, request, config, cancel).await;
    session.close().await;
    outcome
}

async fn drive_page(
    session: &BrowserSession,
    url: &str,
    host: &str,
    request: &SweepRequest,
    config: &SweepConfig,
    cancel: &CancelToken,
) -> anyhow::Result<RunResult> {
    let page = PlaylistPage::new(session.open_page(url).await?);
    wait_until_stable(page.page(), SETTLE_QUIET, SETTLE_TIMEOUT).await?;
    wait_for_container(|| page.container_present(), CONTAINER_TIMEOUT, CONTAINER_POLL).await?;

    // A sign-in wall or consent page redirects away from the playlist.
    if let Some(current) = page.current_url().await? {
        if !is_collection_view(&current, host) {
            return Err(SweepError::NotACollectionView(current).into());
        }
    }

    let stop_button = page.bridge_cancel_button(cancel.clone());
    let outcome = run_sweep(&page, request, config, cancel).await;
    stop_button.abort();
    outcome
}

fn present(result: &RunResult, cli: &Cli) -> anyhow::Result<()> {
    match deliver(result, cli.report.as_deref())? {
        Delivery::Written(path) => {
            println!(
                "{} {} item(s), {} failed. Report: {}",
                if result.dry_run { "Would remove" } else { "Removed" },
                result.succeeded.len(),
                result.failed.len(),
                path.display()
            );
        }
        Delivery::Inline(message) => println!("{}", message),
    }
    if cli.json {
        println!("{}", serde_json::to_string_pretty(result)?);
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    if cli.setup {
        let opts = playlist_sweep::setup::SetupOptions {
            connect: cli.connect.clone(),
            profile_dir: cli.profile.clone().or_else(config::default_profile_dir),
            ..Default::default()
        };
        let report = playlist_sweep::setup::check_all(opts).await;
        info!("{}", report.summarize_for_logs());
        println!("{}", report);
        report.print_action_required_blocks();
        if report.has_failures() {
            std::process::exit(2);
        }
        return;
    }

    let request = match cli.to_request() {
        Ok(r) => r,
        Err(e) => {
            eprintln!("error: {}", e);
            std::process::exit(2);
        }
    };

    let (config, _) = config::load_sweep_config();
    let cancel = CancelToken::new();
    bridge_ctrl_c(cancel.clone());

    info!(
        "starting {} with {} active filter(s), logic {}",
        if request.dry_run { "dry run" } else { "cleanup" },
        request.filter.active_count(),
        request.logic.as_str()
    );

    let outcome = match (&cli.from_html, cli.url.as_deref()) {
        (Some(path), _) => run_offline(path, &request, &config, &cancel).await,
        (None, Some(url)) => run_live(&cli, url, &request, &config, &cancel).await,
        (None, None) => Err(SweepError::NotACollectionView("no --url given".to_string()).into()),
    };

    let result = match outcome {
        Ok(result) => result,
        Err(e) => {
            error!("run failed: {:#}", e);
            match e.downcast_ref::<SweepError>() {
                Some(known) => eprintln!("Playlist cleanup failed: {}", known),
                None => eprintln!("Playlist cleanup failed unexpectedly. Run with --verbose for details."),
            }
            std::process::exit(1);
        }
    };

    if let Err(e) = present(&result, &cli) {
        error!("could not deliver report: {:#}", e);
        eprintln!("{}", result.summary_text);
        std::process::exit(1);
    }
}
