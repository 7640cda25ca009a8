use std::sync::Arc;

use secrecy::{ExposeSecret, Secret};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use assistant_hub::adapters::ai::{OpenAIConfig, OpenAIProvider, ScriptedAssistantProvider};
use assistant_hub::app::{build_handlers, build_router, ChatPorts, ChatSettings};
use assistant_hub::application::TaskSupervisor;
use assistant_hub::config::{AiBackend, AiConfig, AppConfig};
use assistant_hub::ports::AssistantProvider;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = AppConfig::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;

    init_logging(&config);
    info!(
        environment = ?config.server.environment,
        backend = ?config.ai.backend,
        "starting assistant hub"
    );

    let catalog = config.chat.load_catalog()?;
    let pricing = config.chat.load_pricing()?;
    info!(
        assistants = catalog.len(),
        pricing_version = %pricing.version,
        "catalog and pricing loaded"
    );

    let provider = build_provider(&config.ai)?;

    let ports = match &config.database {
        Some(database) => {
            let pool = database.pool_options().connect(&database.url).await?;
            if database.run_migrations {
                sqlx::migrate!("./migrations").run(&pool).await?;
                info!("migrations applied");
            }
            ChatPorts::postgres(pool, provider)
        }
        None => {
            warn!("no database configured, using in-memory stores");
            ChatPorts::in_memory(provider).0
        }
    };

    let supervisor = TaskSupervisor::new();
    let handlers = build_handlers(
        &ports,
        ChatSettings {
            catalog,
            pricing,
            classifier_model: config.ai.classifier_model.clone(),
            naming_model: config.ai.naming_model.clone(),
            stream_buffer: config.chat.stream_buffer,
        },
        supervisor.clone(),
    );
    let app = build_router(handlers, &config.server);

    let addr = config.server.bind_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(%addr, "listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    let grace = config.server.shutdown_grace();
    info!(in_flight = supervisor.in_flight(), "draining settlements");
    if !supervisor.drain(grace).await {
        warn!(
            in_flight = supervisor.in_flight(),
            "settlements still running after grace period"
        );
    }
    Ok(())
}

fn build_provider(ai: &AiConfig) -> anyhow::Result<Arc<dyn AssistantProvider>> {
    match ai.backend {
        AiBackend::Mock => Ok(Arc::new(ScriptedAssistantProvider::new())),
        AiBackend::OpenAI => {
            let key = ai
                .api_key
                .as_ref()
                .map(|k| Secret::new(k.expose_secret().clone()))
                .ok_or_else(|| anyhow::anyhow!("AI API key is not configured"))?;
            let openai = OpenAIConfig::from_secret(key)
                .with_base_url(ai.base_url.as_str())
                .with_default_model(ai.naming_model.as_str())
                .with_timeout(ai.timeout())
                .with_max_retries(ai.max_retries);
            Ok(Arc::new(OpenAIProvider::new(openai)?))
        }
    }
}

fn init_logging(config: &AppConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.server.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(env_filter);
    if config.is_production() {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer().pretty()).init();
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}
