use std::sync::Arc;

use authbridge::identity::HttpProvider;
use authbridge::{app, config, AppState};

#[tokio::main]
async fn main() {
    // Load .env if present so cargo run picks up STORE_URL, STORE_ANON_KEY,
    // PROVIDER_SECRET_KEY, etc.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    // Loads the config singleton; missing required values are fatal here.
    let config = config::config();
    tracing::info!("Starting authbridge in {:?} mode", config.environment);

    let provider = HttpProvider::from_config(&config.provider, &config.http)
        .unwrap_or_else(|e| panic!("failed to build provider client: {}", e));

    let state = AppState {
        config: Arc::new(config.clone()),
        provider: Arc::new(provider),
    };
    let app = app(state);

    // Allow tests or deployments to override port via env
    let port = std::env::var("AUTHBRIDGE_PORT")
        .ok()
        .or_else(|| std::env::var("PORT").ok())
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(3000);

    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .unwrap_or_else(|e| panic!("failed to bind {}: {}", bind_addr, e));

    println!("authbridge listening on http://{}", bind_addr);

    axum::serve(listener, app).await.expect("server");
}
