use std::sync::Arc;

use catalog_server::config::AppConfig;
use catalog_server::consumers::consume_fanout_jobs;
use catalog_server::otp::LogOtpSender;
use catalog_server::state::AppState;
use catalog_server::{build_router, database, seed};
use common::mq::{MqConfig, init_mq};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::load()?;

    let db = database::init_db(&config.database.url).await?;
    seed::seed_role_permissions(&db).await?;
    seed::ensure_indexes(&db).await?;

    let mq = if config.mq.enabled {
        match init_mq(MqConfig {
            url: config.mq.url.clone(),
            pool_size: config.mq.pool_size,
        })
        .await
        {
            Ok(mq) => {
                let mq = Arc::new(mq);
                tokio::spawn(consume_fanout_jobs(
                    db.clone(),
                    mq.clone(),
                    config.mq.fanout_queue_name.clone(),
                    config.fanout.clone(),
                    config.mq.consumer_concurrency,
                ));
                Some(mq)
            }
            Err(e) => {
                warn!(error = %e, "MQ unavailable, notification fan-out will run inline");
                None
            }
        }
    } else {
        None
    };

    let addr = format!("{}:{}", config.server.host, config.server.port);

    let state = AppState {
        db,
        config,
        mq,
        otp_sender: Arc::new(LogOtpSender),
    };

    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!("Server running at http://{}", addr);
    info!("Swagger UI at http://{}/swagger-ui", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
