use crate::cli::ServeArgs;
use crate::infra::{seed_catalog, AppState};
use crate::routes::with_portal_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use mockable::DefaultClock;
use placement_hub::clock::{self, SequentialIds};
use placement_hub::config::AppConfig;
use placement_hub::error::AppError;
use placement_hub::telemetry;
use placement_hub::workflows::placement::PlacementPortal;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let policy = config.matching.policy();
    let seeded_on = clock::today(&DefaultClock);
    let portal = Arc::new(PlacementPortal::new(
        seed_catalog(seeded_on)?,
        Arc::new(DefaultClock),
        Arc::new(SequentialIds::default()),
        policy,
    ));

    let app = with_portal_routes(portal)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        min_match_percent = policy.min_match_percent,
        order = ?policy.order,
        %seeded_on,
        "placement portal ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
