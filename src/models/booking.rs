use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

pub const STATUS_REQUESTED: &str = "requested";
pub const DEFAULT_SERVICE: &str = "implant";

// Uma consulta solicitada, ligada a um lead. Append-only, vários por
// visitante são permitidos.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: Uuid,
    pub visitor_id: Uuid,
    pub service: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

// Visão admin: agendamento junto dos contatos do lead. O lado do lead é
// anulável, um agendamento órfão ainda aparece na listagem.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookingWithLead {
    pub id: Uuid,
    pub visitor_id: Uuid,
    pub service: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub lead_name: Option<String>,
    pub lead_phone: Option<String>,
}
