// src/main.rs

use clap::Parser;
use tokio::signal;
use tokio::time::{sleep, Duration};
use tracing::info;
use tracing_appender::rolling;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

use rust_adportal::api::client::ApiClient;
use rust_adportal::logging::action_logger::ActionLogger;
use rust_adportal::mock_api;
use rust_adportal::portal::dashboard::{Dashboard, OpenOutcome};
use rust_adportal::portal::flow::Flow;
use rust_adportal::portal::login::LoginPage;
use rust_adportal::storage::session::Session;
use rust_adportal::storage::store::FileStore;

#[derive(Parser, Debug)]
#[command(author = "whiteCcinn", version = "1.0", about = "An ad-management admin portal")]
struct CliArgs {
    /// Mock 后端监听端口
    #[arg(short, long, default_value_t = 8080)]
    port: u16,
    /// 改用外部后端时指定它的 base url，此时不再启动 mock 后端
    #[arg(long)]
    base_url: Option<String>,
    #[arg(long, default_value = "logs")]
    log_dir: String,
    /// token 与 last_client_id 的持久化文件
    #[arg(long, default_value = "portal_store.json")]
    store_file: String,
    #[arg(long, default_value = "admin")]
    username: String,
    #[arg(long, default_value = "admin")]
    password: String,
}

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();

    // 初始化全局 tracing 日志
    let log_file = rolling::hourly(&args.log_dir, "portal_log.json");
    let (non_blocking, _guard) = tracing_appender::non_blocking(log_file);
    let subscriber = Registry::default()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer().json().with_writer(non_blocking));
    tracing::subscriber::set_global_default(subscriber)
        .expect("Unable to set global tracing subscriber");
    info!("Portal starting");

    // 初始化操作日志记录器（记录登录、增删改、开关等动作）
    let action_logger = ActionLogger::new(&args.log_dir, "portal", 1000, 100, 1000);
    action_logger.log("INFO", "Portal is starting...").await;

    // 未指定外部后端时，启动内置的 mock 广告管理后端
    let base_url = match &args.base_url {
        Some(url) => url.clone(),
        None => {
            let state = mock_api::seed_state();
            let port = args.port;
            tokio::spawn(async move {
                mock_api::start_mock_api_server(port, state).await;
            });
            // 等 listener 就绪
            sleep(Duration::from_millis(200)).await;
            format!("http://127.0.0.1:{}", args.port)
        }
    };

    let session = Session::new(Box::new(FileStore::new(&args.store_file)));
    let api = ApiClient::new(&base_url, None).expect("Invalid base url");

    // 登录页流程：失败则停留并展示服务端文案
    let mut login = LoginPage::new();
    match login.submit(&api, &session, &args.username, &args.password).await {
        Flow::ToDashboard => {
            action_logger
                .log("INFO", &format!("login ok for {}", args.username))
                .await;
        }
        _ => {
            eprintln!("Login failed: {}", login.error);
            action_logger
                .log("ERROR", &format!("login failed: {}", login.error))
                .await;
            action_logger.shutdown().await;
            return;
        }
    }

    match Dashboard::open(api, session, action_logger.clone()).await {
        OpenOutcome::Ready(dashboard) => {
            println!("{}", dashboard.state.health_line);
            println!("{}", dashboard.render());
        }
        OpenOutcome::Redirect(_) => {
            eprintln!("Not logged in, please sign in first.");
        }
    }

    // mock 后端保持运行，便于用其它客户端继续调试
    tokio::select! {
        _ = signal::ctrl_c() => {
            action_logger.log("INFO", "Shutting down gracefully...").await;
        }
    }

    action_logger.shutdown().await;
    info!("Portal shut down");
}
