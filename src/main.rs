mod app;
mod auth;
mod config;
mod error;
mod state;
mod users;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "gymdesk=debug,axum=info,tower_http=info".to_string());
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

    let app_state = state::AppState::init().await?;

    if !app_state.config.admin_emails.is_empty() {
        let emails = app_state.config.admin_emails.clone();
        let promoted = users::services::promote_admins(&app_state, &emails)
            .await
            .map_err(|e| anyhow::anyhow!("admin bootstrap failed: {e:?}"))?;
        tracing::info!(promoted, "admin bootstrap done");
    }

    app::serve(app::build_app(app_state)).await
}
