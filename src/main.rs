use std::sync::{Arc, Mutex};

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use turfbook::config::AppConfig;
use turfbook::db;
use turfbook::handlers;
use turfbook::services::notify::LogNotifier;
use turfbook::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();

    let conn = db::init_db(&config.database_url)?;

    let state = Arc::new(AppState {
        db: Arc::new(Mutex::new(conn)),
        config: config.clone(),
        notifier: Box::new(LogNotifier),
    });

    let app = Router::new()
        .route("/health", get(handlers::health::health))
        .route(
            "/api/customer/bookings",
            post(handlers::customer::book_turf).get(handlers::customer::booking_history),
        )
        .route(
            "/api/customer/bookings/:id",
            put(handlers::customer::update_booking),
        )
        .route(
            "/api/customer/bookings/:id/extend",
            post(handlers::customer::extend_booking),
        )
        .route(
            "/api/customer/bookings/:id/cancel",
            post(handlers::customer::cancel_booking),
        )
        .route(
            "/api/customer/bookings/:id/feedback",
            post(handlers::customer::add_feedback),
        )
        .route(
            "/api/customer/turfs/available",
            get(handlers::customer::available_turfs),
        )
        .route(
            "/api/manager/bookings",
            get(handlers::manager::get_bookings),
        )
        .route(
            "/api/manager/bookings/:id/payment",
            post(handlers::manager::take_payment),
        )
        .route(
            "/api/manager/bookings/:id/cancel",
            post(handlers::manager::cancel_booking),
        )
        .route("/api/owner/turfs", post(handlers::owner::create_turf))
        .route(
            "/api/owner/turfs/:id/discounts",
            post(handlers::owner::add_discount),
        )
        .route(
            "/api/owner/turfs/:id/manager",
            post(handlers::owner::assign_manager),
        )
        .route(
            "/api/owner/turfs/:id/feedbacks",
            get(handlers::owner::turf_feedbacks),
        )
        .route(
            "/api/owner/discounts/:id/activate",
            post(handlers::owner::activate_discount),
        )
        .route(
            "/api/owner/discounts/:id/deactivate",
            post(handlers::owner::deactivate_discount),
        )
        .route(
            "/api/admin/turfs/:id/activation",
            post(handlers::admin::set_turf_activation),
        )
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state);

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
