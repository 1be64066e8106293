use crate::cli::ServeArgs;
use crate::infra::{build_services, AppState};
use crate::routes::with_service_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;
use valve_estimate::attachments::DiskAttachmentStore;
use valve_estimate::config::AppConfig;
use valve_estimate::error::AppError;
use valve_estimate::telemetry;

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

    std::fs::create_dir_all(&config.storage.attachment_dir)?;
    let store = Arc::new(DiskAttachmentStore::new(
        config.storage.attachment_dir.clone(),
    ));
    let services = build_services(
        store,
        config.storage.max_attachment_bytes,
        config.seed_master_data,
    )?;

    let app = with_service_routes(Arc::new(services))
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        attachment_dir = %config.storage.attachment_dir.display(),
        "valve estimate service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
