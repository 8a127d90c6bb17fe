use {
    crate::{
        api::live,
        config::RunOptions,
        server::{
            EXIT_CHECK_INTERVAL,
            SHOULD_EXIT,
        },
    },
    anyhow::Result,
    axum::{
        routing::get,
        Router,
    },
    axum_prometheus::metrics_exporter_prometheus::PrometheusHandle,
    std::sync::atomic::Ordering,
};

pub async fn start_metrics_server(
    run_options: RunOptions,
    metric_handle: PrometheusHandle,
) -> Result<()> {
    let app: Router<()> = Router::new()
        .route("/metrics", get(move || std::future::ready(metric_handle.render())))
        .route("/live", get(live));

    let listener = tokio::net::TcpListener::bind(&run_options.server.metrics_addr).await?;
    tracing::info!("Metrics server listening on {}", run_options.server.metrics_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            while !SHOULD_EXIT.load(Ordering::Acquire) {
                tokio::time::sleep(EXIT_CHECK_INTERVAL).await;
            }
            tracing::info!("Shutting down metrics server...");
        })
        .await?;
    Ok(())
}
