use cookbook_ai::{Coordinator, HttpInferenceClient, InferenceClient};
use cookbook_conversation::{NoRetrieval, Retriever, ToolGateway};
use cookbook_integration::{HttpRetriever, McpToolGateway, UnconfiguredGateway};
use cookbook_server::{AppState, ServerConfig, router};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration from environment
    let config = ServerConfig::from_env().expect("failed to load configuration");
    tracing::info!(model = %config.inference.model_id, "Loaded configuration");

    let inference: Arc<dyn InferenceClient> = Arc::new(
        HttpInferenceClient::new(&config.inference).expect("failed to create inference client"),
    );

    let retriever: Arc<dyn Retriever> = match &config.retrieval {
        Some(retrieval) => Arc::new(
            HttpRetriever::new(retrieval).expect("failed to create knowledge base client"),
        ),
        None => {
            tracing::warn!("No knowledge base configured, answering without retrieved context");
            Arc::new(NoRetrieval)
        }
    };

    let tools: Arc<dyn ToolGateway> = match &config.tools {
        Some(tools) => {
            Arc::new(McpToolGateway::new(tools).expect("failed to create tool gateway"))
        }
        None => {
            tracing::warn!("No tool server configured, sessions will have no tools");
            Arc::new(UnconfiguredGateway)
        }
    };

    let coordinator =
        Coordinator::new(inference, retriever, tools).with_config(config.conversation.clone());
    let app_state = Arc::new(AppState::new(coordinator, config.session.clone()));

    // Spawn periodic idle session eviction
    let cleanup_state = Arc::clone(&app_state);
    let cleanup_interval_secs = config.session.cleanup_interval_seconds.max(1);
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(cleanup_interval_secs));
        loop {
            interval.tick().await;
            let count = cleanup_state.evict_idle_sessions().await;
            if count > 0 {
                tracing::debug!(evicted_sessions = count, "Periodic session cleanup");
            }
        }
    });

    let app = router(app_state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address)
        .await
        .expect("failed to bind to address");

    tracing::info!("listening on http://{}", config.bind_address);

    axum::serve(listener, app.into_make_service())
        .await
        .expect("server error");
}
