//src/main.rs

use axum::{
    Router,
    routing::{get, post},
};
use tokio::net::TcpListener;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod chatbot;
mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::AppState;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_target(false).compact().init();

    // .expect() aqui está ok: sem configuração a aplicação não deve subir.
    let app_state = AppState::new()
        .await
        .expect("Failed to initialize application state.");

    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .expect("Failed to run database migrations.");

    tracing::info!("✅ Database migrations applied");

    let api_routes = Router::new()
        .route(
            "/visitors",
            post(handlers::visitors::create_or_fetch)
                .get(handlers::visitors::get_visitor)
                .patch(handlers::visitors::update_utm),
        )
        .route(
            "/leads",
            post(handlers::leads::upsert_lead).get(handlers::leads::get_leads),
        )
        .route(
            "/bookings",
            post(handlers::bookings::create_booking).get(handlers::bookings::get_bookings),
        )
        .route("/chat", post(handlers::chat::chat_turn))
        .route("/export", get(handlers::export::export_leads))
        .route("/auth/logout", post(handlers::auth::logout));

    let app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api", api_routes)
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", docs::ApiDoc::openapi()))
        .with_state(app_state.clone());

    let listener = TcpListener::bind(&app_state.bind_addr)
        .await
        .expect("Failed to bind TCP listener");
    tracing::info!("🚀 Server listening on {}", listener.local_addr().unwrap());
    axum::serve(listener, app).await.expect("Axum server error");
}
