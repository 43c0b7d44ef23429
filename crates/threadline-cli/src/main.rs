use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use threadline_cli::config::{Config, StoreBackend};
use threadline_cli::repl;
use threadline_engine::{Principal, SyncEngine};
use threadline_llm::{ClientFactory, CompletionOracle};
use threadline_persist::StoreClient;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();
    
    // Load configuration
    let config = Config::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;
    
    // Initialize logging
    init_logging(&config);
    
    tracing::info!("Starting threadline");
    
    // Initialize completion client
    tracing::info!(model = %config.llm.model, "Initializing Gemini client");
    let client = ClientFactory::create_client(config.llm.provider(&config.gemini_api_key))?;
    let oracle = CompletionOracle::new(client).with_options(config.llm.options());
    
    // Initialize stores
    let store = build_store(&config).await?;
    tracing::info!(backend = store.backend(), "Store ready");
    
    let engine = SyncEngine::builder()
        .store(store)
        .oracle(oracle)
        .config(config.engine.clone())
        .build()?;
    
    engine.set_principal(Some(Principal::from(&config.session))).await?;
    
    let result = repl::run(&engine).await;
    engine.shutdown().await;
    result
}

async fn build_store(config: &Config) -> anyhow::Result<StoreClient> {
    let builder = StoreClient::builder().database(&config.store.database);
    let builder = match config.store.backend {
        StoreBackend::Memory => builder.in_memory(),
        StoreBackend::Mongodb => {
            tracing::info!("Connecting to MongoDB");
            builder.mongodb_uri(config.mongodb_uri.as_deref().unwrap_or_default())
        }
    };
    Ok(builder.build().await?)
}

fn init_logging(config: &Config) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.logging.level))
        .unwrap_or_else(|_| EnvFilter::new("info"));
    
    let registry = tracing_subscriber::registry().with(env_filter);
    
    // Logs go to stderr so they do not interleave with REPL output
    match config.logging.format.as_str() {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
                .init();
        }
    }
}
