use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use beatportdl_core::{
    AppConfig, BatchControl, HttpClient, Orchestrator, PasswordLogin, ShutdownController, Store,
    StoreClient, Stores, WorkerPools, bootstrap, expand_inputs, find_cache_file,
    find_config_file, find_error_log_file, listen_for_shutdown, load_config,
    write_config_template,
};
use clap::Parser;
use tracing::{debug, info, warn};

use crate::ProcessExit;
use crate::app::terminal;
use crate::cli::Args;

pub(crate) async fn run_beatportdl() -> Result<ProcessExit> {
    let args = Args::parse();

    // A signal before the batch starts, including during login, exits 0.
    let control = BatchControl::new();
    listen_for_shutdown(ShutdownController::new(control.clone()))
        .context("cannot install signal handlers")?;

    let config = load_or_create_config()?;

    let (error_log, error_log_failure) = if config.write_error_log {
        match open_configured_error_log() {
            Ok(file) => (Some(file), None),
            Err(error) => (None, Some(error)),
        }
    } else {
        (None, None)
    };
    terminal::init_tracing(
        args.default_log_level(),
        args.forces_log_level(),
        terminal::is_no_color_requested(&args),
        error_log,
    );
    if let Some(error) = error_log_failure {
        warn!("Error log disabled: {error:#}");
    }
    debug!(?args, "CLI arguments parsed");

    let urls = expand_inputs(&args.inputs)?;

    let cache_path = find_cache_file()?.path;
    let beatport_api = api_base(&config, Store::Beatport);
    let beatsource_api = api_base(&config, Store::Beatsource);
    let login = PasswordLogin::new(
        &beatport_api,
        config.username.clone(),
        config.password.clone(),
        config.client_id.clone(),
        config.proxy.as_deref(),
    )?;
    let credentials = bootstrap(&cache_path, &login).await?;

    if urls.is_empty() {
        info!("No links given. Pass track, release, chart or playlist links, or a .txt list.");
        return Ok(ProcessExit::Success);
    }

    let output_dir = args
        .output_dir
        .clone()
        .unwrap_or_else(|| config.downloads_directory.clone());
    prepare_output_dir(&output_dir)?;

    let http = HttpClient::new(config.proxy.as_deref()).context("cannot build HTTP client")?;
    let stores = Arc::new(Stores::new(
        StoreClient::new(
            Store::Beatport,
            &beatport_api,
            http.clone(),
            Arc::clone(&credentials),
        ),
        StoreClient::new(Store::Beatsource, &beatsource_api, http, credentials),
    ));

    let orchestrator = Orchestrator::with_control(
        WorkerPools::new(config.max_global_workers, config.max_download_workers),
        stores.clone(),
        stores,
        output_dir,
        control,
    );

    orchestrator.run_batch(urls).await;

    let stats = orchestrator.stats();
    info!(
        downloaded = stats.files_completed(),
        failed = stats.files_failed() + stats.urls_failed(),
        skipped = stats.duplicates_skipped(),
        "Done"
    );
    Ok(ProcessExit::Success)
}

fn load_or_create_config() -> Result<AppConfig> {
    let config_file = find_config_file()?;
    if !config_file.exists {
        write_config_template(&config_file.path)?;
        bail!(
            "no config file found; a template was written to {}. Fill in username and password, then run again",
            config_file.path.display()
        );
    }
    Ok(load_config(&config_file.path)?)
}

fn open_configured_error_log() -> Result<std::fs::File> {
    let path = find_error_log_file()?.path;
    terminal::open_error_log(&path)
        .with_context(|| format!("cannot open error log {}", path.display()))
}

fn api_base(config: &AppConfig, store: Store) -> String {
    let configured = match store {
        Store::Beatport => config.beatport_api_url.as_deref(),
        Store::Beatsource => config.beatsource_api_url.as_deref(),
    };
    configured
        .unwrap_or_else(|| store.default_api_url())
        .to_string()
}

fn prepare_output_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("cannot create output directory {}", dir.display()))?;
        info!(dir = %dir.display(), "Created output directory");
    }
    Ok(())
}
