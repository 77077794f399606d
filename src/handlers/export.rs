// src/handlers/export.rs

use anyhow::Context;
use axum::{
    extract::State,
    http::{StatusCode, header},
    response::IntoResponse,
};
use chrono::Utc;

use crate::{common::error::AppError, config::AppState, models::lead::Lead};

// GET /api/export — download de planilha admin com todos os leads.
#[utoipa::path(
    get,
    path = "/api/export",
    tag = "Admin",
    responses((status = 200, description = "CSV attachment with every lead", content_type = "text/csv"))
)]
pub async fn export_leads(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let leads = app_state.lead_service.list().await?;
    let body = leads_to_csv(&leads)?;

    let filename = format!("haru_leads_{}.csv", Utc::now().format("%Y-%m-%d"));

    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        body,
    ))
}

fn leads_to_csv(leads: &[Lead]) -> Result<Vec<u8>, AppError> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer
        .write_record([
            "id",
            "visitorId",
            "name",
            "phone",
            "privacyAgreed",
            "privacyVersion",
            "utmSource",
            "utmMedium",
            "utmCampaign",
            "utmContent",
            "utmTerm",
            "createdAt",
        ])
        .context("csv header")?;

    for lead in leads {
        writer
            .write_record([
                lead.id.to_string(),
                lead.visitor_id.to_string(),
                lead.name.clone(),
                lead.phone.clone(),
                lead.privacy_agreed.to_string(),
                lead.privacy_version.clone(),
                lead.utm_source.clone().unwrap_or_default(),
                lead.utm_medium.clone().unwrap_or_default(),
                lead.utm_campaign.clone().unwrap_or_default(),
                lead.utm_content.clone().unwrap_or_default(),
                lead.utm_term.clone().unwrap_or_default(),
                lead.created_at.to_rfc3339(),
            ])
            .context("csv row")?;
    }

    writer
        .into_inner()
        .map_err(|e| AppError::InternalServerError(anyhow::anyhow!("csv flush: {e}")))
}
