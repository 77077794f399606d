// src/handlers/leads.rs

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::{
    common::error::AppError,
    config::AppState,
    models::lead::UtmParams,
    services::lead_service::DEFAULT_PRIVACY_VERSION,
};

fn default_privacy_version() -> String {
    DEFAULT_PRIVACY_VERSION.to_string()
}

// Consentimento não é opcional: lead sem concordância explícita é
// rejeitado, não armazenado com a flag falsa.
fn validate_consent(agreed: &bool) -> Result<(), ValidationError> {
    if *agreed {
        Ok(())
    } else {
        Err(ValidationError::new("privacy_agreed").with_message("consent is required".into()))
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpsertLeadPayload {
    pub visitor_id: Uuid,

    #[validate(length(min = 1, message = "name is required"))]
    #[schema(example = "김하루")]
    pub name: String,

    #[validate(length(min = 1, message = "phone is required"))]
    #[schema(example = "010-1111-2222")]
    pub phone: String,

    #[validate(custom(function = validate_consent))]
    pub privacy_agreed: bool,

    #[serde(default = "default_privacy_version")]
    pub privacy_version: String,

    #[serde(flatten)]
    pub utm: UtmParams,
}

// POST /api/leads
#[utoipa::path(
    post,
    path = "/api/leads",
    tag = "Leads",
    request_body = UpsertLeadPayload,
    responses(
        (status = 200, description = "Lead inserted or patched", body = Object),
        (status = 400, description = "Missing name, phone or consent")
    )
)]
pub async fn upsert_lead(
    State(app_state): State<AppState>,
    Json(payload): Json<UpsertLeadPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let lead = app_state
        .lead_service
        .upsert(
            payload.visitor_id,
            &payload.name,
            &payload.phone,
            payload.privacy_agreed,
            &payload.privacy_version,
            &payload.utm,
        )
        .await?;

    tracing::info!(visitor_id = %payload.visitor_id, "lead upserted");

    Ok(Json(json!({ "success": true, "id": lead.id })))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadQuery {
    pub visitor_id: Option<Uuid>,
}

// GET /api/leads?visitorId=   → status de registro de um visitante
// GET /api/leads              → listagem admin, mais recentes primeiro
#[utoipa::path(
    get,
    path = "/api/leads",
    tag = "Leads",
    params(("visitorId" = Option<Uuid>, Query, description = "Limit to one visitor")),
    responses((status = 200, description = "Registration status or full listing"))
)]
pub async fn get_leads(
    State(app_state): State<AppState>,
    Query(query): Query<LeadQuery>,
) -> Result<impl IntoResponse, AppError> {
    if let Some(visitor_id) = query.visitor_id {
        let lead = app_state.lead_service.get_by_visitor(visitor_id).await?;
        return Ok(Json(json!({
            "success": true,
            "isRegistered": lead.is_some(),
            "lead": lead,
        })));
    }

    let leads = app_state.lead_service.list().await?;
    Ok(Json(json!(leads)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn payload(name: &str, phone: &str, agreed: bool) -> UpsertLeadPayload {
        UpsertLeadPayload {
            visitor_id: Uuid::new_v4(),
            name: name.to_string(),
            phone: phone.to_string(),
            privacy_agreed: agreed,
            privacy_version: default_privacy_version(),
            utm: UtmParams::default(),
        }
    }

    #[test]
    fn rejects_missing_fields_and_consent() {
        assert!(payload("", "010-1111-2222", true).validate().is_err());
        assert!(payload("김하루", "", true).validate().is_err());
        assert!(payload("김하루", "010-1111-2222", false).validate().is_err());
        assert!(payload("김하루", "010-1111-2222", true).validate().is_ok());
    }

    #[test]
    fn utm_fields_flatten_from_the_top_level() {
        let parsed: UpsertLeadPayload = serde_json::from_value(serde_json::json!({
            "visitorId": Uuid::new_v4(),
            "name": "김하루",
            "phone": "010-1111-2222",
            "privacyAgreed": true,
            "utm_source": "naver",
        }))
        .unwrap();

        assert_eq!(parsed.utm.utm_source.as_deref(), Some("naver"));
        assert_eq!(parsed.privacy_version, DEFAULT_PRIVACY_VERSION);
        assert!(parsed.utm.utm_medium.is_none());
    }
}
