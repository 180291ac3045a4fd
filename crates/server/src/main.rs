mod api;
mod router;
mod service;
mod startup;
mod state;
mod sweep;

use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    couvoir_core::config::load_dotenv();
    let config = couvoir_core::Config::from_env();
    config.log_summary();

    let state = startup::build_state(&config).await?;

    // Overdue check runs once at startup, then on the configured interval.
    tokio::spawn(sweep::run_sweep_loop(
        state.clone(),
        config.sweep.interval_secs,
    ));

    let app = router::build_router(state);
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server listening on http://{addr}");
    axum::serve(listener, app).await?;

    Ok(())
}
