// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::{
    db::{BookingRepository, LeadRepository, VisitorRepository},
    services::{AiResponder, BookingService, GeminiClient, LeadService, VisitorService},
};

const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub visitor_service: VisitorService,
    pub lead_service: LeadService,
    pub booking_service: BookingService,
    pub ai: Arc<dyn AiResponder>,
    pub bind_addr: String,
    // Controla a flag Secure do cookie de visitante.
    pub production: bool,
}

impl AppState {
    pub async fn new() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let database_url = env::var("DATABASE_URL").context("DATABASE_URL must be set")?;
        let gemini_api_key = env::var("GEMINI_API_KEY")
            .or_else(|_| env::var("GOOGLE_GENERATIVE_AI_API_KEY"))
            .unwrap_or_default();
        if gemini_api_key.is_empty() {
            tracing::warn!("GEMINI_API_KEY not set; chat fallback will degrade to the apology line");
        }
        let gemini_model =
            env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.to_string());
        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
        let production = env::var("APP_ENV").map(|v| v == "production").unwrap_or(false);

        let db_pool = PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&database_url)
            .await?;

        tracing::info!("✅ Database connection established");

        // --- Grafo de dependências ---
        let visitor_repo = VisitorRepository::new(db_pool.clone());
        let lead_repo = LeadRepository::new(db_pool.clone());
        let booking_repo = BookingRepository::new(db_pool.clone());

        let visitor_service = VisitorService::new(visitor_repo, lead_repo.clone());
        let lead_service = LeadService::new(lead_repo.clone());
        let booking_service = BookingService::new(booking_repo, lead_repo);
        let ai: Arc<dyn AiResponder> = Arc::new(GeminiClient::new(gemini_api_key, gemini_model));

        Ok(Self {
            db_pool,
            visitor_service,
            lead_service,
            booking_service,
            ai,
            bind_addr,
            production,
        })
    }
}
