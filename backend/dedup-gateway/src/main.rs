//! Distributed Event Ingestion & Deduplication Gateway — entry point.
//!
//! Bootstrap order: logging, config, Postgres pool + migrations, Redis
//! connection manager, instance identity, then the HTTP/WS server. Any
//! failure before the server binds is fatal — this gateway starts clean
//! or not at all (see DESIGN.md's Degraded Startup note).

mod app_state;
mod config;
mod event;
mod metrics;
mod session;

use std::io;
use std::sync::Arc;

use actix_web::{middleware as actix_middleware, web, App, HttpResponse, HttpServer};
use dedup_coordinator::RedisCoordinator;
use dedup_processor::DedupProcessor;
use dedup_store::PgStore;
use error_handling::GatewayError;
use instance_identity::InstanceId;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use app_state::AppState;
use config::{GatewayConfig, LogFormat};

async fn ws_upgrade(
    req: actix_web::HttpRequest,
    stream: web::Payload,
    state: web::Data<AppState>,
) -> Result<HttpResponse, actix_web::Error> {
    let peer = req
        .peer_addr()
        .map(|a| a.to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let session = session::GatewaySession::new(state.get_ref().clone(), peer);
    actix_web_actors::ws::start(session, &req, stream)
}

async fn health(
    pool: web::Data<sqlx::PgPool>,
    redis: web::Data<redis_utils::SharedConnectionManager>,
) -> Result<HttpResponse, GatewayError> {
    sqlx::query("SELECT 1")
        .execute(pool.get_ref())
        .await
        .map_err(|err| {
            tracing::warn!(error = %err, "health check: database unreachable");
            GatewayError::from(err)
        })?;

    let ping: Result<String, redis::RedisError> = redis_utils::with_timeout(async {
        let mut conn = redis.lock().await;
        redis::cmd("PING").query_async(&mut *conn).await
    })
    .await;

    ping.map_err(|err| {
        tracing::warn!(error = %err, "health check: redis unreachable");
        GatewayError::ServiceUnavailable("redis unreachable".to_string())
    })?;

    Ok(HttpResponse::Ok().body("OK"))
}

#[actix_web::main]
async fn main() -> io::Result<()> {
    let config = GatewayConfig::from_env().expect("invalid configuration");

    match config.log_format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "info,actix_web=info,dedup_gateway=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer().json())
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "info,actix_web=info,dedup_gateway=debug".into()),
            )
            .with(tracing_subscriber::fmt::layer())
            .init(),
    }

    tracing::info!("starting dedup-gateway v{}", env!("CARGO_PKG_VERSION"));

    let db_pool = db_pool::create_pool(db_pool::DbConfig::for_gateway())
        .await
        .expect("failed to create database pool");
    db_pool::migrate(&db_pool, "./migrations")
        .await
        .expect("failed to run database migrations");

    let redis_pool = redis_utils::RedisPool::connect(&config.redis_url, config.redis_sentinel.clone())
        .await
        .expect("failed to connect to redis");

    let instance_id = InstanceId::generate();
    tracing::info!(instance_id = %instance_id, "instance identity generated");

    let coordinator = Arc::new(RedisCoordinator::new(
        redis_pool.manager(),
        config.coordinator_timeout,
    ));
    let store = Arc::new(PgStore::new(db_pool.clone(), config.store_timeout));
    let processor = Arc::new(DedupProcessor::new(
        coordinator,
        store,
        instance_id.clone(),
        config.dedup_ttl,
    ));

    let redis_manager_data = web::Data::new(redis_pool.manager());
    let app_state = web::Data::new(AppState {
        processor,
        instance_id,
    });
    let db_pool_data = web::Data::new(db_pool);
    let bind_addr = config.bind_addr.clone();

    tracing::info!(bind_addr = %bind_addr, "listening");

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .app_data(db_pool_data.clone())
            .app_data(redis_manager_data.clone())
            .wrap(actix_middleware::Logger::default())
            .wrap(tracing_actix_web::TracingLogger::default())
            .route("/events", web::get().to(ws_upgrade))
            .route("/health", web::get().to(health))
            .route("/metrics", web::get().to(metrics::serve_metrics))
    })
    .bind(&bind_addr)?
    .run()
    .await
}
