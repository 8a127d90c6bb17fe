use {
    crate::{
        api,
        api::ws::WsState,
        audit,
        bid,
        config::{
            Config,
            RunOptions,
        },
        metrics,
        session,
        session::service::UniformWindowSampler,
        state::{
            Store,
            StoreNew,
        },
    },
    anyhow::anyhow,
    axum_prometheus::PrometheusMetricLayer,
    futures::future::join_all,
    sqlx::postgres::PgPoolOptions,
    std::{
        sync::{
            atomic::{
                AtomicBool,
                Ordering,
            },
            Arc,
        },
        time::Duration,
    },
    tokio_util::task::TaskTracker,
};

const NOTIFICATIONS_CHAN_LEN: usize = 1000;
const DATABASE_MAX_CONNECTIONS: u32 = 10;

pub async fn start_server(run_options: RunOptions) -> anyhow::Result<()> {
    tokio::spawn(async move {
        tracing::info!("Registered shutdown signal handler...");
        tokio::signal::ctrl_c().await.unwrap();
        tracing::info!("Shut down signal received, waiting for tasks...");
        SHOULD_EXIT.store(true, Ordering::Release);
    });

    let config = Config::load(&run_options.config.config).map_err(|err| {
        anyhow!(
            "Failed to load config from file({path}): {:?}",
            err,
            path = run_options.config.config
        )
    })?;

    let pool = PgPoolOptions::new()
        .max_connections(DATABASE_MAX_CONNECTIONS)
        .connect(&run_options.server.database_url)
        .await
        .map_err(|err| anyhow!("Failed to connect to the database: {:?}", err))?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let store = Arc::new(Store {
        db:             pool.clone(),
        ws:             WsState::new("X-Forwarded-For".to_string(), NOTIFICATIONS_CHAN_LEN),
        operator_token: run_options.operator_token.clone(),
    });
    let event_sender = store.ws.broadcast_sender.clone();

    let audit_service = audit::Service::new(
        Arc::new(audit::repository::Repository::new(Arc::new(pool.clone()))),
        event_sender.clone(),
    );
    let bid_repo = Arc::new(bid::repository::Repository::new(Arc::new(pool.clone())));
    let session_service = session::Service::new(
        store.clone(),
        Arc::new(session::repository::Repository::new(Arc::new(pool.clone()))),
        bid_repo.clone(),
        audit_service.clone(),
        session::service::Config {
            inactivity_timeout: config.dispute.inactivity_timeout,
            random_window_min:  config.dispute.random_window_min,
            random_window_max:  config.dispute.random_window_max,
            tick_interval:      config.dispute.tick_interval,
        },
        Arc::new(UniformWindowSampler),
        event_sender,
    );
    let bid_service = bid::Service::new(
        bid_repo,
        session_service.clone(),
        audit_service.clone(),
    );

    let store_new = Arc::new(StoreNew {
        store,
        session_service: session_service.clone(),
        bid_service,
        audit_service,
        task_tracker: TaskTracker::new(),
    });

    let (metric_layer, metric_handle) = PrometheusMetricLayer::pair();
    let tick_loop = tokio::spawn(async move { session_service.run_tick_loop().await });
    let server_loop = tokio::spawn(api::start_api(
        run_options.clone(),
        store_new.clone(),
        metric_layer,
    ));
    let metrics_loop = tokio::spawn(metrics::start_metrics_server(run_options, metric_handle));
    join_all(vec![tick_loop, server_loop, metrics_loop]).await;

    store_new.task_tracker.close();
    store_new.task_tracker.wait().await;
    Ok(())
}

// A static exit flag to indicate to running threads that we're shutting down.
// This is used to gracefully shutdown the application.
pub(crate) static SHOULD_EXIT: AtomicBool = AtomicBool::new(false);
pub const EXIT_CHECK_INTERVAL: Duration = Duration::from_secs(1);
