mod app;
mod block_font;

use std::fs::{self, OpenOptions};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use tracing_subscriber::{prelude::*, EnvFilter};

use qeid_core::{
    backend::BackendClient,
    config::{self, AppConfig},
    engine::{MatchEngine, MatchObserver},
    rating::{RatingTracker, SharedRatingTracker},
    rules::Ruleset,
    store::MatchStore,
};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    config::ensure_default_config()?;
    let config = AppConfig::load()?;

    let rules = Ruleset::preset_or_default(&config.rules_preset);
    let store = MatchStore::new(&config.data_root);
    let rating = SharedRatingTracker::new(RatingTracker::new(&config.data_root));

    let observers: Vec<Box<dyn MatchObserver>> = vec![Box::new(rating.clone())];
    let engine = MatchEngine::new(rules, store, observers);

    let backend = if config.backend_enabled {
        Some(Arc::new(BackendClient::new(
            config.backend_url.clone(),
            &config.data_root,
        )))
    } else {
        None
    };

    // Launch sync runs concurrently with the UI; the session id comes
    // back when (and if) the backend answers.
    let session = backend.as_ref().map(|client| {
        let client = Arc::clone(client);
        tokio::spawn(async move { client.launch_sync().await })
    });

    let mut app = app::QeidApp::new(engine, rating, backend.clone());
    app.run().await?;

    if let (Some(client), Some(session)) = (backend, session) {
        if let Ok(Ok(session_id)) =
            tokio::time::timeout(Duration::from_secs(3), session).await
        {
            let _ = tokio::time::timeout(
                Duration::from_secs(3),
                client.session_end(&session_id),
            )
            .await;
        }
    }
    Ok(())
}

fn init_logging() -> Result<()> {
    let log_dir = std::env::current_dir()?.join("logs");
    fs::create_dir_all(&log_dir)?;
    let log_path = log_dir.join("qeidtui.log");

    let env_filter = EnvFilter::from_default_env();

    // No console layer: stdout belongs to the terminal UI.
    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .compact()
        .with_writer(move || {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_path)
                .expect("failed to open log file")
        });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    Ok(())
}
