//! Company 服务主入口

use company_service::{
    auth::{JwtService, PasswordHasher},
    config::AppConfig,
    db,
    events::{EventDispatcher, EventPublisher, EventSink, LogEventSink, RabbitMqEventSink},
    handlers::health,
    middleware::AppState,
    repository::{CompanyRepository, UserRepository},
    routes,
    services::{AuthService, CompanyService},
    telemetry,
};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::signal;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // ===== CLI 参数处理 =====
    let args: Vec<String> = std::env::args().collect();

    if args.len() > 1 {
        match args[1].as_str() {
            "--version" => {
                println!("company-service {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" => {
                print_help();
                return Ok(());
            }
            "hash-password" => {
                let Some(password) = args.get(2) else {
                    eprintln!("用法: company-service hash-password <password>");
                    std::process::exit(1);
                };
                load_env_files();
                let config = AppConfig::load()?;
                let hasher = PasswordHasher::from_config(&config.security)?;
                println!("{}", hasher.hash(password)?);
                return Ok(());
            }
            _ => {
                eprintln!("未知参数: {}", args[1]);
                print_help();
                std::process::exit(1);
            }
        }
    }

    load_env_files();

    health::set_start_time();

    // 1. 加载配置
    let config = AppConfig::load().map_err(|e| {
        eprintln!("Configuration error: {}", e);
        anyhow::anyhow!("Failed to load configuration: {}", e)
    })?;

    // 2. 初始化日志
    telemetry::init_telemetry(&config.logging);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Company service starting...");

    // 3. 数据库连接池 + 迁移
    let db_pool = db::create_pool(&config.database).await?;
    db::run_migrations(&db_pool).await?;

    tracing::info!("Database initialized");

    // 4. 事件投递
    let sink: Arc<dyn EventSink> = if config.events.enabled {
        let sink = RabbitMqEventSink::new(config.events.clone());
        // 启动时连不上不致命，首次发送时重连
        if let Err(e) = sink.connect().await {
            tracing::warn!(error = %e, "RabbitMQ unavailable at startup, will retry on first event");
        }
        Arc::new(sink)
    } else {
        tracing::info!("Event broker disabled, mutation events are only logged");
        Arc::new(LogEventSink)
    };
    let (dispatcher, dispatcher_handle) =
        EventDispatcher::start(sink, config.events.queue_capacity);

    // 5. 构建应用状态
    let jwt_service = Arc::new(JwtService::from_config(&config.security)?);
    let hasher = Arc::new(PasswordHasher::from_config(&config.security)?);

    let auth_service = Arc::new(AuthService::new(
        Arc::new(UserRepository::new(db_pool.clone())),
        jwt_service.clone(),
        hasher,
    ));
    let events: Arc<dyn EventPublisher> = Arc::new(dispatcher);
    let company_service = Arc::new(CompanyService::new(
        Arc::new(CompanyRepository::new(db_pool.clone())),
        events,
    ));

    let app_state = Arc::new(AppState {
        config: config.clone(),
        db: Some(db_pool.clone()),
        auth_service,
        company_service,
        jwt_service,
    });

    // 6. 构建路由
    let app = routes::create_router(app_state.clone());

    // 7. 启动服务器
    let addr = &config.server.addr;
    let listener = TcpListener::bind(addr).await?;

    tracing::info!(addr = %addr, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // 8. 释放最后一个事件发布句柄，等待队列排空
    drop(app_state);
    let timeout = Duration::from_secs(config.server.graceful_shutdown_timeout_secs);
    if tokio::time::timeout(timeout, dispatcher_handle).await.is_err() {
        tracing::warn!("Event queue not drained before shutdown timeout");
    }

    db_pool.close().await;

    tracing::info!("Server shutdown complete");
    Ok(())
}

/// 加载 .env 文件（开发环境）
/// 按优先级加载：.env.local > .env
fn load_env_files() {
    dotenv::from_filename(".env.local").ok();
    dotenv::dotenv().ok();
}

/// 优雅关闭信号处理
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::info!("Ctrl+C received, starting graceful shutdown");
        },
        _ = terminate => {
            tracing::info!("Terminate signal received, starting graceful shutdown");
        },
    }
}

/// 打印帮助信息
fn print_help() {
    println!("company-service {}", env!("CARGO_PKG_VERSION"));
    println!();
    println!("用法: company-service [选项 | 命令]");
    println!();
    println!("选项:");
    println!("  --version                   打印版本信息并退出");
    println!("  --help                      打印此帮助信息并退出");
    println!();
    println!("命令:");
    println!("  hash-password <password>    输出 Argon2id 哈希，用于初始化 users 表");
    println!();
    println!("配置:");
    println!("  configs/config.yaml（CONFIG_PATH 可覆盖），");
    println!("  环境变量前缀 COMPANY_，层级分隔符 __");
}
