use mws_mock_server::MockConfig;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let addr = format!("127.0.0.1:{port}");
    let config = MockConfig::from_env();
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, username = %config.username, "mock MWS listening");
    mws_mock_server::run(listener, config).await
}
