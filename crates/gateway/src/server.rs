//! Router assembly and server startup.

use std::{net::SocketAddr, sync::Arc};

use {
    axum::{
        Router,
        routing::{get, post},
    },
    tower_http::cors::{Any, CorsLayer},
    tracing::info,
};

use {
    upwire_config::ForwardingConfig,
    upwire_conversations::{ConversationTracker, MemoryStore, SystemClock},
    upwire_forward::{EventForwarder, EventSink, NoopSink},
};

use crate::{routes, state::CallbackState, sweep};

/// Build the callback router (shared between production startup and tests).
pub fn build_callback_app(state: Arc<CallbackState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(routes::health))
        .route(
            "/api/rbm/callback",
            post(routes::handle_callback).get(routes::handle_validation),
        )
        .route("/api/rbm/status", get(routes::handle_status))
        .route("/api/rbm/conversations", get(routes::list_conversations))
        .route("/api/rbm/conversations/{id}", get(routes::conversation_detail))
        .layer(cors)
        .with_state(state)
}

/// Pick the sink for the configured forwarding section. A disabled section
/// gets the noop sink; an enabled one gets the HTTP forwarder even with no
/// endpoints yet, so the status surface reflects the configuration.
#[must_use]
pub fn sink_from_config(forwarding: &ForwardingConfig) -> Arc<dyn EventSink> {
    if forwarding.enabled {
        Arc::new(EventForwarder::new(true, forwarding.endpoints.clone()))
    } else {
        Arc::new(NoopSink)
    }
}

/// Start the RBM callback server. Flag overrides win over the discovered
/// config; the config's defaults fill the rest.
pub async fn start_gateway(
    bind_override: Option<String>,
    port_override: Option<u16>,
    config_dir: Option<std::path::PathBuf>,
) -> anyhow::Result<()> {
    // Apply config directory override before loading config.
    if let Some(dir) = config_dir {
        upwire_config::set_config_dir(dir);
    }
    let config = upwire_config::discover_and_load();

    let bind = bind_override.unwrap_or_else(|| config.server.bind.clone());
    let port = port_override.unwrap_or(config.server.port);

    let tracker = ConversationTracker::with_parts(
        MemoryStore::default(),
        Box::new(SystemClock),
        chrono::Duration::hours(config.conversations.expire_after_hours),
    );
    let state = CallbackState::new(tracker, sink_from_config(&config.forwarding));

    sweep::spawn_purge_task(Arc::clone(&state), &config.conversations);

    let addr = format!("{bind}:{port}");
    info!(service = %crate::state::SERVICE_NAME, %addr, "gateway listening");
    info!("callback endpoint: http://{addr}/api/rbm/callback");
    info!("status endpoint:   http://{addr}/api/rbm/status");

    let app = build_callback_app(state);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}
