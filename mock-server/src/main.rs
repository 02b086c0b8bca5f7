use mock_server::{Promo, Store};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let demo_key = std::env::var("DEMO_KEY").unwrap_or_else(|_| "secret".to_string());

    let store = Store::default()
        .with_promo("demo", None, Promo::generated(20, 10))
        .with_promo("demo", Some("sale"), Promo::generated(5, 60))
        .with_promo("demo", Some("vip"), Promo::generated(3, 300).private(demo_key));

    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    info!(%addr, "listening");
    mock_server::run_with(listener, store).await
}
