use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;

use backoffice::{
    AppState,
    cache::RedisCache,
    config::Config,
    database::{PgRbacRepository, PgUserRepository},
    router::build_router,
};
use sqlx::Executor;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // 加载配置
    let config = Config::from_env().unwrap_or_else(|e| {
        tracing::error!("Failed to load configuration: {}", e);
        tracing::error!("Copy .env.example to .env and fill in the required values");
        std::process::exit(1);
    });

    tracing::info!("Starting API server...");
    tracing::info!("Session TTL: {}s", config.session_ttl_secs);

    // 设置数据库连接池
    let pool = PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(config.backend_timeout())
        .after_connect(|conn, _meta| {
            Box::pin(async move {
                conn.execute("SET application_name = 'backoffice';").await?;
                Ok(())
            })
        })
        .connect(&config.database_url)
        .await
        .expect("Failed to connect to Postgres");

    sqlx::migrate!()
        .run(&pool)
        .await
        .expect("Failed to run database migrations");

    // Redis 连接在首次使用时建立
    let cache = Arc::new(RedisCache::open(&config.redis_url).expect("Invalid REDIS_URL"));

    let state = AppState::new(
        config.clone(),
        cache,
        Arc::new(PgUserRepository::new(pool.clone())),
        Arc::new(PgRbacRepository::new(pool.clone())),
    );
    let app = build_router(state.clone());

    // 启动服务器
    let addr = SocketAddr::new(
        config.server_host.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid server_host, falling back to dual-stack default");
            IpAddr::V6(std::net::Ipv6Addr::UNSPECIFIED)
        }),
        config.server_port,
    );
    tracing::info!("Server listening on {}", addr);
    axum::serve(
        tokio::net::TcpListener::bind(&addr)
            .await
            .expect("Failed to bind"),
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("Failed to start server");

    tracing::info!("Shutting down...");
    state.sessions.close().await;
    pool.close().await;
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
