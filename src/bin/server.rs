use repo_archaeologist::{
    analysis::Analyzer,
    api::{router, AppState},
    Config,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // log records from the library are bridged into tracing by the subscriber
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("repo_archaeologist=info,tower_http=info")),
        )
        .with_target(false)
        .compact()
        .init();

    let config = Config::load()?;
    let analyzer = Analyzer::from_config(&config)?;
    let app = router(AppState::new(analyzer));

    info!("Repository Archaeologist API starting...");
    info!("Sampling up to {} files within {} ms per repository",
        config.traversal.max_files, config.traversal.walk_timeout_ms);

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    info!("Server listening on http://{}", config.bind_address);

    axum::serve(listener, app).await?;

    Ok(())
}
