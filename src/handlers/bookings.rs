// src/handlers/bookings.rs

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::visitor::MaybeVisitor,
    models::booking::DEFAULT_SERVICE,
};

pub const BOOKING_CONFIRMED_MESSAGE: &str = "상담 예약이 완료되었습니다. 곧 연락드리겠습니다.";

fn default_service() -> String {
    DEFAULT_SERVICE.to_string()
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateBookingPayload {
    #[serde(default = "default_service")]
    #[schema(example = "implant")]
    pub service: String,
    // Id explícito ganha do cookie, para clientes que gerenciam o token
    // por conta própria.
    pub visitor_id: Option<Uuid>,
}

// POST /api/bookings
#[utoipa::path(
    post,
    path = "/api/bookings",
    tag = "Bookings",
    request_body = CreateBookingPayload,
    responses(
        (status = 200, description = "Booking created"),
        (status = 400, description = "No visitor id, or registration required first")
    )
)]
pub async fn create_booking(
    State(app_state): State<AppState>,
    MaybeVisitor(cookie_visitor): MaybeVisitor,
    Json(payload): Json<CreateBookingPayload>,
) -> Result<impl IntoResponse, AppError> {
    let visitor_id =
        payload.visitor_id.or(cookie_visitor).ok_or(AppError::VisitorIdRequired)?;

    let (booking, lead) =
        app_state.booking_service.create(visitor_id, &payload.service).await?;

    Ok(Json(json!({
        "success": true,
        "id": booking.id,
        "message": BOOKING_CONFIRMED_MESSAGE,
        "booking": booking,
        "lead": lead,
    })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingQuery {
    pub visitor_id: Option<Uuid>,
}

// GET /api/bookings?visitorId=   → agendamentos de um visitante
// GET /api/bookings              → listagem admin com os nomes dos leads
#[utoipa::path(
    get,
    path = "/api/bookings",
    tag = "Bookings",
    params(("visitorId" = Option<Uuid>, Query, description = "Limit to one visitor")),
    responses((status = 200, description = "Bookings for the visitor, or the joined admin view"))
)]
pub async fn get_bookings(
    State(app_state): State<AppState>,
    Query(query): Query<BookingQuery>,
) -> Result<impl IntoResponse, AppError> {
    if let Some(visitor_id) = query.visitor_id {
        let bookings = app_state.booking_service.list_by_visitor(visitor_id).await?;
        return Ok(Json(json!({ "success": true, "bookings": bookings })));
    }

    let bookings = app_state.booking_service.list_with_leads().await?;
    Ok(Json(json!(bookings)))
}
