pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod services;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use verb_core::Lexicon;

use crate::config::Config;
use crate::services::ai::Collaborators;
use crate::services::evaluation::Evaluator;
use crate::services::openai::OpenAiClient;
use crate::services::sessions::SessionStore;

/// Upper bound for recorded audio uploads.
const MAX_AUDIO_BYTES: usize = 25 * 1024 * 1024;

/// How often idle sessions are swept.
const SESSION_SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    pub sessions: Arc<SessionStore>,
    pub lexicon: Arc<Lexicon>,
    pub ai: Collaborators,
    pub evaluator: Arc<Evaluator>,
    pub ai_timeout: Duration,
}

impl AppState {
    pub fn new(lexicon: Lexicon, ai: Collaborators, ai_timeout: Duration) -> Self {
        let evaluator = Evaluator::new(ai.grader.clone(), ai_timeout);
        Self {
            sessions: Arc::new(SessionStore::new()),
            lexicon: Arc::new(lexicon),
            ai,
            evaluator: Arc::new(evaluator),
            ai_timeout,
        }
    }

    /// Evict sessions idle for longer than `ttl`.
    pub fn with_session_ttl(mut self, ttl: Duration) -> Self {
        self.sessions = Arc::new(SessionStore::with_idle_ttl(ttl));
        self
    }
}

/// Build the full application router.
pub fn router(state: AppState) -> Router {
    let protected_routes = Router::new()
        // Session routes
        .route("/api/session/status", get(routes::session::status))
        // Round routes
        .route("/api/round/translation", post(routes::round::translation))
        .route("/api/round/sentence", post(routes::round::sentence))
        .route(
            "/api/round/pronunciation",
            post(routes::round::pronunciation)
                .delete(routes::round::clear_pronunciation)
                .layer(DefaultBodyLimit::max(MAX_AUDIO_BYTES)),
        )
        .route("/api/round/next", post(routes::round::next))
        // Settings routes
        .route(
            "/api/settings",
            get(routes::settings::get).put(routes::settings::update),
        )
        // Speech routes
        .route("/api/speech", post(routes::speech::synthesize))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            routes::auth::auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/api/session/register", post(routes::session::register))
        .merge(protected_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

pub async fn run() -> anyhow::Result<()> {
    let config = Config::from_env()?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let ai = match config.ai.clone() {
        Some(ai_config) => {
            tracing::info!("AI services enabled (chat model: {})", ai_config.chat_model);
            let client = OpenAiClient::new(ai_config, config.ai_timeout)?;
            Collaborators::from_client(Arc::new(client))
        }
        None => {
            tracing::warn!("OPENAI_API_KEY not set, grading falls back to the basic matcher");
            Collaborators::none()
        }
    };

    let state = AppState::new(Lexicon::builtin(), ai, config.ai_timeout)
        .with_session_ttl(config.session_ttl);
    spawn_session_sweeper(state.sessions.clone());
    let app = router(state);

    let addr = config.bind_addr();
    tracing::info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Periodically evict idle sessions.
fn spawn_session_sweeper(sessions: Arc<SessionStore>) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(SESSION_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            let evicted = sessions.evict_idle().await;
            if evicted > 0 {
                tracing::info!("Evicted {} idle sessions", evicted);
            }
        }
    });
}

async fn health_check() -> &'static str {
    "OK"
}
