use anyhow::Result;
use std::{io::ErrorKind, net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

mod config;
mod db;
mod errors;
mod forms;
mod handlers;
mod middleware;
mod models;
mod routes;
mod services;
mod templates;
mod views;

use config::Mode;

#[tokio::main]
async fn main() -> Result<()> {
    // --- Logging setup ---
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    // --- Parse config + run mode ---
    let (cfg, mode) = config::AppConfig::from_env_and_args()?;

    tracing::info!("Starting soyboard-admin ({:?}) with config: {:?}", mode, cfg);

    // --- Initialize SQLite connection ---
    let pool = Arc::new(db::connect(&cfg.database_url).await?);

    match mode {
        Mode::Migrate => {
            let mut conn = pool.acquire().await?;
            db::create_all(&mut conn).await?;
            tracing::info!("Database migration complete.");
            return Ok(());
        }
        Mode::Seed => {
            services::seed::build_sample_db(&pool, &cfg.site).await?;
            tracing::info!("Sample database created.");
            return Ok(());
        }
        Mode::Serve => {}
    }

    // --- Initialize services ---
    let services =
        services::AdminServices::new(pool, cfg.upload_dir.clone(), cfg.session_timeout_secs);

    // --- Build router ---
    let app = routes::routes::routes(services);

    // --- Start server ---
    let addr = cfg.addr();
    let listener = match TcpListener::bind(&addr).await {
        Ok(listener) => listener,
        Err(err)
            if err.kind() == ErrorKind::PermissionDenied
                && matches!(cfg.host.as_str(), "0.0.0.0" | "::") =>
        {
            let fallback_addr = format!("127.0.0.1:{}", cfg.port);
            tracing::warn!(
                "Permission denied binding to {} ({}). Falling back to {}",
                addr,
                err,
                fallback_addr
            );
            TcpListener::bind(&fallback_addr).await?
        }
        Err(err) => return Err(err.into()),
    };

    tracing::info!("Server listening on http://{}/admin/", listener.local_addr()?);
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
