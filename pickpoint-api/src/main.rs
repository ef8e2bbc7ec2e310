use std::net::SocketAddr;
use std::sync::Arc;

use pickpoint_api::{app, metrics::Metrics, AppState};
use pickpoint_orders::OrderManager;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pickpoint_api=debug,tower_http=debug,axum::rejection=trace".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = pickpoint_store::Config::load().expect("Failed to load config");
    tracing::info!("Starting pickpoint API on port {}", config.server.port);

    // Postgres connection + schema
    let db = pickpoint_store::DbClient::new(&config.database.url, config.database.max_connections)
        .await
        .expect("Failed to connect to Postgres");
    db.migrate().await.expect("Failed to run migrations");

    // Redis Connection
    let redis = pickpoint_store::RedisCache::new(&config.redis.url, config.redis.ttl_seconds)
        .await
        .expect("Failed to connect to Redis");

    // Kafka Connection (optional)
    let events = if config.kafka.enabled {
        let producer =
            pickpoint_store::EventProducer::new(&config.kafka.brokers, &config.kafka.topic)
                .expect("Failed to create Kafka producer");
        Some(Arc::new(producer))
    } else {
        tracing::info!("Kafka publishing disabled");
        None
    };

    let store = Arc::new(pickpoint_store::PgOrderStore::new(db.pool.clone()));
    let manager = Arc::new(OrderManager::new(store));
    let metrics = Arc::new(Metrics::new().expect("Failed to build metrics"));

    let app_state = AppState {
        orders: manager,
        cache: Arc::new(redis),
        events,
        metrics,
    };

    let app = app(app_state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await.unwrap();
    axum::serve(listener, app).await.unwrap();
}
