use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

// Um visitante que deixou nome/telefone/consentimento. No máximo um lead
// por visitante (índice único em `visitor_id`); envios posteriores
// atualizam a mesma linha.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    pub id: Uuid,
    pub visitor_id: Uuid,
    pub name: String,
    pub phone: String,
    pub privacy_agreed: bool,
    pub privacy_version: String,
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    pub utm_content: Option<String>,
    pub utm_term: Option<String>,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

// Parâmetros de atribuição de campanha capturados da URL de origem.
// `None` aqui significa "não veio desta vez": no upsert cada campo é
// mesclado de forma independente e só sobrescrito por valor não nulo.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct UtmParams {
    pub utm_source: Option<String>,
    pub utm_medium: Option<String>,
    pub utm_campaign: Option<String>,
    pub utm_content: Option<String>,
    pub utm_term: Option<String>,
}

impl UtmParams {
    pub fn is_empty(&self) -> bool {
        self.utm_source.is_none()
            && self.utm_medium.is_none()
            && self.utm_campaign.is_none()
            && self.utm_content.is_none()
            && self.utm_term.is_none()
    }
}
