// src/handlers/auth.rs

use axum::{Json, response::IntoResponse};
use axum_extra::extract::CookieJar;
use serde_json::json;

use crate::{common::error::AppError, middleware::visitor::clear_visitor_cookie};

// POST /api/auth/logout — remove o cookie de visitante para o navegador
// recomeçar como uma sessão anônima nova.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "Auth",
    responses((status = 200, description = "Visitor cookie cleared"))
)]
pub async fn logout(jar: CookieJar) -> Result<impl IntoResponse, AppError> {
    let jar = jar.remove(clear_visitor_cookie());
    Ok((jar, Json(json!({ "success": true }))))
}
