use std::path::Path;

mod app;
mod auth;
mod config;
mod db;
mod listings;
mod state;
mod storage;
mod uploads;
mod views;

use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "tradepost=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let state = AppState::init().await?;

    // The upload directory must exist before the first posting lands.
    let upload_dir = Path::new(&state.config.uploads.static_dir).join(storage::UPLOAD_SUBDIR);
    if let Err(e) = std::fs::create_dir_all(&upload_dir) {
        tracing::warn!(error = %e, dir = %upload_dir.display(), "could not create upload directory; continuing");
    }

    if let Err(e) = sqlx::migrate!("./migrations").run(&state.db).await {
        tracing::warn!(error = %e, "migration failed; continuing");
    }

    let app = app::build_app(state);
    app::serve(app).await
}
