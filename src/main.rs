use clap::Parser;
use device_twin::{acquire, analyzer, cli, config, session, view};
use analyzer::{cache_key, Analyzer, CacheFile, GeminiClient, RetryState};
use cli::{Cli, Commands};
use config::Config;
use device_twin::error::{DeviceTwinError, Result};
use device_twin_common::DeviceAnalysis;
use indicatif::{ProgressBar, ProgressStyle};
use session::{AppStatus, ScanSession, GENERIC_FAILURE_MESSAGE};
use std::path::Path;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!(error = %e, "command failed");
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "device_twin=debug,device_twin_common=debug"
    } else {
        "error"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = Config::load()?;

    match cli.command {
        Commands::Analyze { image, mime, output, json, show_advanced, use_cache } => {
            let mut session = ScanSession::new();
            let mime = mime.as_deref();
            if !scan_into_session(&config, &mut session, &image, mime, use_cache).await? {
                return Ok(ExitCode::FAILURE);
            }
            let Some(analysis) = session.analysis() else {
                return Ok(ExitCode::FAILURE);
            };

            if let Some(output) = output {
                std::fs::write(&output, serde_json::to_string_pretty(analysis)?)?;
                println!("✔ Saved analysis: {}", output.display());
            }

            if json {
                println!("{}", serde_json::to_string_pretty(analysis)?);
            } else {
                print!("{}", view::render_control_list(analysis, show_advanced));
            }
        }

        Commands::Scan { image, mime, use_cache } => {
            let mut session = ScanSession::new();
            let mime = mime.as_deref();
            if !scan_into_session(&config, &mut session, &image, mime, use_cache).await? {
                return Ok(ExitCode::FAILURE);
            }
            view::run_interactive_browse(&mut session)?;
        }

        Commands::Show { input } => {
            if !input.is_file() {
                return Err(DeviceTwinError::FileNotFound(input.display().to_string()));
            }
            let content = std::fs::read_to_string(&input)?;
            let analysis: DeviceAnalysis = serde_json::from_str(&content)?;
            let analysis = device_twin_common::validate_analysis(analysis)?;

            let mut session = ScanSession::with_analysis(analysis);
            view::run_interactive_browse(&mut session)?;
        }

        Commands::Config { set_api_key, set_model, show } => {
            let mut config = config;

            if let Some(key) = set_api_key {
                config.set_api_key(key)?;
                println!("✔ API key saved");
            }

            if let Some(model) = set_model {
                config.set_model(model)?;
                println!("✔ Model set to {}", config.model);
            }

            if show {
                println!("Settings ({}):", Config::config_path()?.display());
                println!("  Model: {}", config.model);
                println!("  Max image size: {}px", config.max_image_size);
                println!("  Timeout: {}s", config.timeout_seconds);
                println!("  Temperature: {}", config.temperature);
                println!(
                    "  Attempts: {} (base delay {}ms)",
                    config.max_attempts, config.base_delay_ms
                );
                println!("  Retry invalid responses: {}", config.retry_invalid_responses);
                let key_state = if config.get_api_key().is_ok() { "set" } else { "not set" };
                println!("  API key: {}", key_state);
            }
        }

        Commands::Cache { clear, info } => {
            let dir = CacheFile::default_dir()?;
            let cache_path = CacheFile::cache_path(&dir);

            if info || !clear {
                if cache_path.exists() {
                    let cache = CacheFile::load(&dir);
                    println!("Cache:");
                    println!("  Path: {}", cache_path.display());
                    println!("  Entries: {}", cache.len());
                    if let Ok(meta) = std::fs::metadata(&cache_path) {
                        println!("  Size: {} bytes", meta.len());
                    }
                } else {
                    println!("No cache file: {}", cache_path.display());
                }
            }

            if clear {
                if CacheFile::clear(&dir)? {
                    println!("✔ Cache cleared: {}", cache_path.display());
                } else {
                    println!("No cache file to clear");
                }
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

/// 画像を読み込んで解析し、結果をセッションに反映
///
/// 解析に失敗した場合は一般的なメッセージを表示して false
async fn scan_into_session(
    config: &Config,
    session: &mut ScanSession,
    path: &Path,
    mime_override: Option<&str>,
    use_cache: bool,
) -> Result<bool> {
    let image = acquire::load_image(path, config.max_image_size, mime_override)?;
    if let Some(mime) = mime_override.filter(|_| image.reencoded) {
        warn!(requested = mime, "image was re-encoded, ignoring --mime");
    }
    let mime_type = image.mime_type.as_str();
    info!(
        file = %image.file_name,
        mime_type,
        dimensions = ?image.dimensions,
        reencoded = image.reencoded,
        "image loaded"
    );

    let key = cache_key(&image.sha256, mime_type, config.max_image_size, &config.model);
    let cache_dir = if use_cache { Some(CacheFile::default_dir()?) } else { None };

    if let Some(dir) = &cache_dir {
        if let Some(cached) = CacheFile::load(dir).get(&key) {
            println!("✔ Using cached analysis");
            let ticket = session.begin_scan();
            session.finish(ticket, Ok(cached));
            return Ok(true);
        }
    }

    let client = GeminiClient::new(config.get_api_key()?, config.model.clone(), config.timeout())?;
    let analyzer = Analyzer::new(client)
        .with_policy(config.retry_policy())
        .with_temperature(config.temperature);

    let ticket = session.begin_scan();
    let spinner = analysis_spinner();
    let result = analyzer
        .analyze_with_progress(&image.data, mime_type, |state| update_spinner(&spinner, state))
        .await;
    spinner.finish_and_clear();

    if let Err(e) = &result {
        error!(error = %e, kind = ?e.kind(), "device analysis failed");
    }
    session.finish(ticket, result);

    if session.status() != AppStatus::Success {
        eprintln!("{}", GENERIC_FAILURE_MESSAGE);
        return Ok(false);
    }

    if let (Some(dir), Some(analysis)) = (&cache_dir, session.analysis()) {
        let mut cache = CacheFile::load(dir);
        cache.insert(key, image.file_name.clone(), config.model.clone(), analysis.clone());
        if let Err(e) = cache.save(dir) {
            warn!(error = %e, "failed to save analysis cache");
        }
    }

    Ok(true)
}

fn analysis_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        spinner.set_style(style);
    }
    spinner.set_message("Analyzing image...");
    spinner.enable_steady_tick(Duration::from_millis(120));
    spinner
}

fn update_spinner(spinner: &ProgressBar, state: RetryState) {
    match state {
        RetryState::Attempting { attempt: 1, .. } => spinner.set_message("Analyzing image..."),
        RetryState::Attempting { attempt, max_attempts } => {
            spinner.set_message(format!(
                "Analyzing image (attempt {}/{})...",
                attempt, max_attempts
            ))
        }
        RetryState::Backoff { delay, .. } => {
            spinner.set_message(format!("Analysis failed, retrying in {}s...", delay.as_secs()))
        }
        RetryState::Succeeded { .. } | RetryState::Failed { .. } => {}
    }
}
