use dotenvy::dotenv;
use sentinel::{
    ai::{build_model, http_client},
    api::{self, AppState},
    config::{
        Secrets,
        database::{create_connection, create_tables, get_database_url},
        settings::load_settings,
    },
    core::token::TokenIssuer,
    errors::Result,
    receipt::{image::FETCH_TIMEOUT, ocr::Tesseract},
    telegram::{BotApi, client::TelegramClient},
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // 1. Initialize tracing (as early as possible)
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // 2. Load .env file; env vars can also be set externally
    dotenv().ok();

    // 3. Settings and secrets
    let settings = load_settings().inspect_err(|e| error!("Failed to load settings: {e}"))?;
    let secrets = Secrets::from_env().inspect_err(|e| error!("Missing secrets: {e}"))?;
    info!("Starting Sentinel in {} mode", settings.environment.as_str());

    // 4. Database
    let db = create_connection(&get_database_url())
        .await
        .inspect(|_| info!("Database connected"))
        .inspect_err(|e| error!("Failed to connect to database: {e}"))?;
    create_tables(&db)
        .await
        .inspect_err(|e| error!("Failed to create tables: {e}"))?;

    // 5. Providers
    let model = build_model(&settings.ai, &secrets)?;
    let ocr = Arc::new(Tesseract::new(&settings.ocr));
    let http = http_client(FETCH_TIMEOUT.as_secs())?;
    let bot = match &secrets.telegram_bot_token {
        Some(token) => {
            info!("Telegram bot configured");
            Some(Arc::new(TelegramClient::new(
                http_client(settings.ai.timeout_secs)?,
                &settings.telegram.api_base_url,
                token.clone(),
            )) as Arc<dyn BotApi>)
        }
        None => {
            warn!("TELEGRAM_BOT_TOKEN not set; Telegram features disabled");
            None
        }
    };
    let tokens = Arc::new(TokenIssuer::new(
        secrets.jwt_secret.clone(),
        settings.auth.token_ttl_hours,
    ));

    // 6. Serve
    let addr = format!("{}:{}", settings.bind_host(), settings.server.port);
    let state = AppState {
        db,
        settings: Arc::new(settings),
        tokens,
        model,
        ocr,
        http,
        bot,
    };

    let listener = TcpListener::bind(&addr)
        .await
        .inspect_err(|e| error!("Failed to bind {addr}: {e}"))?;
    info!("Listening on http://{addr}");

    axum::serve(listener, api::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {e}");
    }
    info!("Shutdown signal received");
}
