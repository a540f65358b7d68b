use std::net::SocketAddr;

use axum::{routing::get, Router};
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::{
    api::health_checks::ok,
    app::App,
    config::{Config, DeliveryConfig},
    database::setup_database,
    environment::Environment,
    job_queue::JobQueue,
    jobs::{
        job_registry::JobRegistry, job_supervisor::job_supervisor, scheduled_job::ScheduledJob,
    },
    poster::Poster,
    router::router,
};

pub async fn handle_serve_command(
    environment: Environment,
    config: Config,
    app_router: fn(App) -> Router,
    job_registry: JobRegistry,
    job_schedule: Vec<ScheduledJob>,
) {
    let port = config.server.port;

    // Answer liveness probes while migrations run, so orchestrators do
    // not kill the process during a slow schema change
    let liveness_task = tokio::spawn(serve_liveness_only(port));

    let (db, migrations_done) = setup_database(&config.database).await;

    match migrations_done.await {
        Ok(Ok(())) => info!("✅ Database is ready"),
        Ok(Err(e)) => {
            error!("❌ Database setup failed: {e}");
            liveness_task.abort();
            return;
        }
        Err(_) => {
            error!("❌ Database setup task dropped its result channel");
            liveness_task.abort();
            return;
        }
    }

    let app = App {
        poster: build_poster(&config.delivery),
        job_queue: JobQueue::database(),
        config: config.clone(),
        environment,
        db,
    };

    tokio::spawn(job_supervisor(
        config.jobs,
        app.clone(),
        job_registry,
        job_schedule,
    ));

    // Hand the port over to the full router
    liveness_task.abort();
    let _ = liveness_task.await;

    serve(router(app, app_router), port).await;
}

fn build_poster(delivery: &DeliveryConfig) -> Poster {
    match delivery {
        DeliveryConfig::Mock => Poster::mock(),
        DeliveryConfig::Http {
            endpoints,
            credentials,
        } => Poster::http(endpoints.clone(), credentials.clone()),
    }
}

async fn serve_liveness_only(port: u16) {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await.expect("Failed to bind port");

    let liveness_router = Router::new().route("/liveness", get(ok));
    axum::serve(listener, liveness_router)
        .await
        .expect("Liveness server failed");
}

async fn serve(router: Router, port: u16) {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await.expect("Failed to bind port");

    info!("🌐 Serving on http://{}", addr);
    axum::serve(
        listener,
        router.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Server failed");
}
