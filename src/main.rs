mod api;
mod clients;
mod config;
mod error;
mod models;
mod paths;
mod repository;
mod services;
#[cfg(test)]
mod testing;

use crate::clients::{
    FormatConverter, HttpClusterApi, HttpFormatConverter, HttpSourceRepository,
    build_http_client,
};
use crate::config::Config;
use crate::repository::{SolutionRepository, TemplateRepository, establish_connection};
use crate::services::{
    EnvironmentCompositor, Materializer, SolutionService, TemplateResolver, TemplateService,
};
use api::create_router;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "solutions=debug,tower_http=debug,axum=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::from_env()?;
    tracing::info!("Starting solutions with config: {:?}", config);

    if let Some(path) = config.database_url.strip_prefix("sqlite:") {
        let path = std::path::Path::new(path);
        if path != std::path::Path::new(":memory:") {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }
        }
    }

    // Establish database connection
    let db_pool = establish_connection(&config.database_url, config.db_max_connections).await?;
    tracing::info!("Database connected: {}", config.database_url);

    // Outbound collaborators share one client with the per-call timeout
    let http = build_http_client(config.http_timeout())?;
    let source = Arc::new(HttpSourceRepository::new(http.clone(), &config.source_url));
    let cluster = Arc::new(HttpClusterApi::new(http.clone(), &config.cluster_api_url));
    let converter = config.converter_url.as_ref().map(|url| {
        tracing::info!("Converting resources through {}", url);
        Arc::new(HttpFormatConverter::new(http.clone(), url)) as Arc<dyn FormatConverter>
    });

    // Initialize repositories
    let template_repo = TemplateRepository::new(db_pool.clone());
    let ledger = SolutionRepository::new(db_pool);

    // Initialize services
    let resolver = TemplateResolver::new(
        template_repo.clone(),
        source,
        config.default_branch.clone(),
    );
    let template_service = TemplateService::new(template_repo, resolver.clone());
    let solution_service = SolutionService::new(
        resolver,
        EnvironmentCompositor::new(),
        Materializer::new(cluster.clone(), converter, ledger.clone()),
        cluster,
        ledger,
    );

    // Create router
    let app = create_router(template_service, solution_service, config.cors);
    let app = app.layer(TraceLayer::new_for_http());

    // Start server
    let addr = format!("{}:{}", config.host, config.port);
    let addr = addr.parse::<SocketAddr>()?;
    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
