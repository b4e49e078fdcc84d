//! # SlotBook API
//!
//! HTTP surface of the booking service: rule administration for staff, slot
//! browsing and reservation for patients, and manual slot generation.
//!
//! ## Architecture
//!
//! - **Routes**: Define API endpoints and URL structure
//! - **Handlers**: Translate requests into calls on the core services
//! - **Middleware**: Error-to-response mapping
//! - **Config**: Environment configuration
//!
//! Handlers never touch the database directly. They call the services in
//! `slotbook-core`, which reach storage through the repository traits.

/// Configuration module for API settings
pub mod config;
/// Request handlers
pub mod handlers;
/// Error handling
pub mod middleware;
/// Webhook delivery of booking notifications
pub mod notifier;
/// Route definitions and API endpoint structure
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::http::{HeaderValue, Method, header};
use eyre::Result;
use slotbook_core::config::BookingConfig;
use slotbook_core::notification::{LogNotifier, Notifier};
use slotbook_core::repository::{
    ReservationRepository, RuleRepository, SlotRepository, UserDirectory,
};
use slotbook_core::{
    LocalClock, ReservationCoordinator, RuleService, SlotGenerator, SlotQueryService,
};
use slotbook_db::{DbPool, PgStore};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};
use tracing_subscriber::FmtSubscriber;

use crate::notifier::WebhookNotifier;

/// Services shared by all request handlers
pub struct ApiState {
    pub rules: RuleService,
    pub generator: SlotGenerator,
    pub query: SlotQueryService,
    pub coordinator: ReservationCoordinator,
    pub clock: LocalClock,
    /// Horizon used when a generation request does not name one
    pub generation_days: u32,
}

impl ApiState {
    /// Wires every service to one store.
    ///
    /// ```
    /// use std::sync::Arc;
    /// use slotbook_api::ApiState;
    /// use slotbook_core::config::BookingConfig;
    /// use slotbook_core::memory::MemoryStore;
    /// use slotbook_core::notification::LogNotifier;
    ///
    /// let state = ApiState::new(
    ///     Arc::new(MemoryStore::new()),
    ///     Arc::new(LogNotifier),
    ///     &BookingConfig::default(),
    /// );
    /// let app = slotbook_api::build_router(Arc::new(state));
    /// # let _ = app;
    /// ```
    pub fn new<S>(store: Arc<S>, notifier: Arc<dyn Notifier>, booking: &BookingConfig) -> Self
    where
        S: RuleRepository + SlotRepository + ReservationRepository + UserDirectory + 'static,
    {
        let clock = booking.clock();

        Self {
            rules: RuleService::new(store.clone()),
            generator: SlotGenerator::new(store.clone(), store.clone(), clock),
            query: SlotQueryService::new(store.clone(), store.clone(), clock),
            coordinator: ReservationCoordinator::new(
                store.clone(),
                store.clone(),
                notifier,
                booking.formatter(),
            )
            .with_directory(store),
            clock,
            generation_days: booking.generation_days,
        }
    }
}

/// All routes with state attached, without server-level layers.
pub fn build_router(state: Arc<ApiState>) -> Router {
    Router::new()
        // Health check endpoints
        .merge(routes::health::routes())
        // Rule administration and weekday lookups
        .merge(routes::rules::routes())
        // Slot browsing
        .merge(routes::slots::routes())
        // Booking
        .merge(routes::reservations::routes())
        // Manual generation
        .merge(routes::generation::routes())
        .with_state(state)
}

/// Webhook notifier when a URL is configured, log-only otherwise.
pub fn build_notifier(config: &config::ApiConfig) -> Result<Arc<dyn Notifier>> {
    Ok(match &config.notification_webhook_url {
        Some(url) => {
            info!("Booking notifications go to {}", url);
            Arc::new(WebhookNotifier::new(
                url,
                Duration::from_secs(config.notification_timeout),
            )?)
        }
        None => {
            info!("No notification webhook configured, booking notifications are logged only");
            Arc::new(LogNotifier)
        }
    })
}

/// Regenerates the configured horizon every `interval`, starting now.
pub fn spawn_generation_job(
    generator: SlotGenerator,
    days: u32,
    interval: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            ticker.tick().await;
            let summary = generator.generate_days(days).await;
            if !summary.failed_days.is_empty() {
                warn!(
                    "Scheduled generation failed for {} day(s): {:?}",
                    summary.failed_days.len(),
                    summary.failed_days
                );
            }
        }
    })
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let origins: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .allow_origin(origins)
}

/// Starts the API server with the provided configuration and database connection
///
/// Sets up logging, wires the services to PostgreSQL, starts the background
/// generation job if one is configured, and serves until the listener fails.
pub async fn start_server(config: config::ApiConfig, db_pool: DbPool) -> Result<()> {
    // Initialize tracing for logging
    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let store = Arc::new(PgStore::new(db_pool));
    let notifier = build_notifier(&config)?;
    let state = Arc::new(ApiState::new(store, notifier, &config.booking));

    if let Some(hours) = config.booking.generation_interval_hours {
        info!(
            "Scheduling slot generation every {}h for the next {} days",
            hours, config.booking.generation_days
        );
        spawn_generation_job(
            state.generator.clone(),
            config.booking.generation_days,
            Duration::from_secs(hours * 3600),
        );
    }

    let app = build_router(state).layer(TraceLayer::new_for_http());

    // Apply CORS configuration if origins are specified
    let app = match &config.cors_origins {
        Some(origins) => app.layer(cors_layer(origins)),
        None => app,
    };

    // Add request timeout middleware
    let app = app.layer(
        tower::ServiceBuilder::new()
            .layer(axum::error_handling::HandleErrorLayer::new(
                |_: tower::BoxError| async { axum::http::StatusCode::REQUEST_TIMEOUT },
            ))
            .timeout(Duration::from_secs(config.request_timeout)),
    );

    // Start the HTTP server
    let addr = config.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
