use std::{net::SocketAddr, sync::Arc};

use metrics_exporter_prometheus::PrometheusBuilder;
use orgdesk_api::{build_router, metrics_routes, state::AppState};
use orgdesk_config::Settings;
use orgdesk_db::{connect, indexes::ensure_indexes};
use orgdesk_services::BroadcastEventBus;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

const EVENT_BUS_CAPACITY: usize = 256;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file (silently ignore if missing)
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            "orgdesk_api=debug,orgdesk_services=debug,orgdesk_db=debug,tower_http=debug".into()
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let settings = Settings::load()?;
    info!("Starting orgdesk API on {}:{}", settings.app.host, settings.app.port);
    info!(
        root_url = %settings.app.root_url,
        search_url = %settings.search.url,
        smtp_enabled = settings.smtp.enabled,
        "Service config"
    );

    let metrics = PrometheusBuilder::new().install_recorder()?;
    info!("Prometheus recorder installed, serving /metrics");

    let db = connect(&settings.database).await?;
    ensure_indexes(&db).await?;

    let events = Arc::new(BroadcastEventBus::new(EVENT_BUS_CAPACITY));
    let mut rx = events.subscribe();
    tokio::spawn(async move {
        loop {
            match rx.recv().await {
                Ok(event) => info!(?event, "Event published"),
                Err(tokio::sync::broadcast::error::RecvError::Lagged(n)) => {
                    warn!(skipped = n, "Event listener lagged");
                }
                Err(tokio::sync::broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let app_state = AppState::new(db, settings.clone(), events);
    let app = build_router(app_state).merge(metrics_routes(metrics));

    let addr = format!("{}:{}", settings.app.host, settings.app.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Listening on {}", addr);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
