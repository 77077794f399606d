// src/handlers/visitors.rs

use axum::{
    Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::CookieJar;
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::visitor::{MaybeVisitor, visitor_cookie},
    models::lead::UtmParams,
};

// POST /api/visitors
#[utoipa::path(
    post,
    path = "/api/visitors",
    tag = "Visitors",
    responses(
        (status = 200, description = "Visitor created or fetched; sets the visitor cookie")
    )
)]
pub async fn create_or_fetch(
    State(app_state): State<AppState>,
    MaybeVisitor(existing): MaybeVisitor,
    jar: CookieJar,
) -> Result<impl IntoResponse, AppError> {
    let visitor = app_state.visitor_service.get_or_create(existing).await?;

    // Reemitir o cookie renova a janela de 30 dias.
    let jar = jar.add(visitor_cookie(visitor.id, app_state.production));

    Ok((jar, Json(json!({ "success": true, "visitorId": visitor.id }))))
}

#[derive(Debug, Deserialize)]
pub struct VisitorQuery {
    pub id: Option<Uuid>,
}

// GET /api/visitors?id=
#[utoipa::path(
    get,
    path = "/api/visitors",
    tag = "Visitors",
    params(("id" = Uuid, Query, description = "Visitor token")),
    responses(
        (status = 200, description = "Visitor plus registration status"),
        (status = 404, description = "Unknown visitor")
    )
)]
pub async fn get_visitor(
    State(app_state): State<AppState>,
    Query(query): Query<VisitorQuery>,
) -> Result<impl IntoResponse, AppError> {
    let id = query.id.ok_or(AppError::VisitorIdRequired)?;
    let (visitor, lead) = app_state.visitor_service.get_with_registration(id).await?;

    Ok(Json(json!({
        "success": true,
        "visitor": visitor,
        "isRegistered": lead.is_some(),
        "lead": lead,
    })))
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUtmPayload {
    pub visitor_id: Uuid,
    #[serde(flatten)]
    pub utm: UtmParams,
}

// PATCH /api/visitors — atualização de atribuição vinda do script de
// tracking da landing page. Toca apenas leads existentes; um visitante
// que nunca se registrou fica como está (sem linhas de lead em branco).
#[utoipa::path(
    patch,
    path = "/api/visitors",
    tag = "Visitors",
    request_body = UpdateUtmPayload,
    responses((status = 200, description = "UTM fields merged into the visitor's lead, if any"))
)]
pub async fn update_utm(
    State(app_state): State<AppState>,
    Json(payload): Json<UpdateUtmPayload>,
) -> Result<impl IntoResponse, AppError> {
    let updated = app_state.lead_service.update_utm(payload.visitor_id, &payload.utm).await?;

    Ok((StatusCode::OK, Json(json!({ "success": true, "updated": updated }))))
}
