// src/docs.rs

use utoipa::OpenApi;

use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Visitors ---
        handlers::visitors::create_or_fetch,
        handlers::visitors::get_visitor,
        handlers::visitors::update_utm,

        // --- Leads ---
        handlers::leads::upsert_lead,
        handlers::leads::get_leads,

        // --- Bookings ---
        handlers::bookings::create_booking,
        handlers::bookings::get_bookings,

        // --- Chat ---
        handlers::chat::chat_turn,

        // --- Admin / Auth ---
        handlers::export::export_leads,
        handlers::auth::logout,
    ),
    components(
        schemas(
            models::visitor::Visitor,
            models::lead::Lead,
            models::lead::UtmParams,
            models::booking::Booking,
            models::booking::BookingWithLead,
            models::chat::ChatRole,
            models::chat::ChatTurn,
            models::chat::ChatAction,
            models::chat::ChatOption,
            models::chat::MessageKind,
            models::chat::BotMessage,
            models::chat::ChatRequest,
            models::chat::ChatResponse,

            // --- Payloads ---
            handlers::visitors::UpdateUtmPayload,
            handlers::leads::UpsertLeadPayload,
            handlers::bookings::CreateBookingPayload,
        )
    ),
    tags(
        (name = "Visitors", description = "Cookie-backed anonymous session identity"),
        (name = "Leads", description = "Registrants: name, phone, consent, attribution"),
        (name = "Bookings", description = "Consultation requests tied to a lead"),
        (name = "Chat", description = "Scripted scenario plus generative fallback"),
        (name = "Admin", description = "Listings and exports"),
        (name = "Auth", description = "Visitor cookie lifecycle")
    )
)]
pub struct ApiDoc;
