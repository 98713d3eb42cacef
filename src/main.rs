use std::error::Error;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use chat_relay::config::Config;
use chat_relay::llm::ProviderRegistry;
use chat_relay::routes::configure_routes;
use chat_relay::state::AppState;
use chat_relay::store;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = Config::from_env()?;
    init_tracing(&config);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        port = config.port,
        mode = ?config.mode,
        "chat relay starting"
    );

    if config.openai_api_key.is_empty() {
        warn!("OPENAI_API_KEY is not set; upstream requests will fail authentication");
    }
    if config.server_api_key.is_none() {
        warn!("SERVER_API_KEY is not set; requests are not authenticated");
    }

    let store = store::connect(&config).await?;
    let providers = ProviderRegistry::from_config(&config)?;
    let state = AppState::new(&config, store, providers);
    let routes = configure_routes(state);

    info!("Listening on http://0.0.0.0:{}", config.port);
    warp::serve(routes).run(([0, 0, 0, 0], config.port)).await;

    Ok(())
}

/// `RUST_LOG` wins; otherwise the filter follows the run mode
fn init_tracing(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.mode.default_log_filter()));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true);

    if config.log_json {
        subscriber.json().init();
    } else {
        subscriber.init();
    }
}
