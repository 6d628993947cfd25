use std::{env, fs, path::Path, sync::Arc};

use anyhow::{Context, Result};
use csvclip::{fetch, output, process, settings::Settings};
use reqwest::Client;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    // ─── 1) load settings ────────────────────────────────────────────
    let settings_path = env::args().nth(1).unwrap_or_else(|| "settings.yml".into());
    let settings = Settings::load(Path::new(&settings_path))
        .with_context(|| format!("loading settings from {settings_path}"))?;

    // ─── 2) prepare folders ──────────────────────────────────────────
    let folders = [
        Some(&settings.cache_folder),
        Some(&settings.output_destination),
        settings.logs_folder.as_ref(),
    ];
    for dir in folders.into_iter().flatten() {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }

    // ─── 3) init logging ─────────────────────────────────────────────
    let env = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match &settings.logs_folder {
        Some(dir) => {
            let log_path = dir.join("log.txt");
            let log_file = fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_path)
                .with_context(|| format!("opening {}", log_path.display()))?;
            fmt::Subscriber::builder()
                .with_env_filter(env)
                .with_ansi(false)
                .with_writer(Arc::new(log_file))
                .init();
        }
        None => fmt::Subscriber::builder().with_env_filter(env).init(),
    }
    info!("startup");

    // ─── 4) fetch the source file ────────────────────────────────────
    let client = Client::new();
    let cached = fetch::ensure_local(
        &client,
        &settings.url,
        &settings.cache_folder,
        settings.cache,
    )
    .await
    .context("fetch stage failed")?;

    // ─── 5) extract the leading columns and rows ─────────────────────
    let table = process::extract(&cached, settings.cols, settings.rows)
        .context("transform stage failed")?;

    // ─── 6) save the truncated table ─────────────────────────────────
    let dest = output::modified_stem(&cached, &settings.output_destination);
    let written =
        output::save(&table, &dest, &settings.output_format).context("save stage failed")?;

    info!(file = %written.display(), "all done");
    Ok(())
}
