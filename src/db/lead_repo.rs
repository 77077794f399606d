use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::lead::{Lead, UtmParams},
};

// Todo o acesso à tabela 'leads'.
#[derive(Clone)]
pub struct LeadRepository {
    pool: PgPool,
}

impl LeadRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_visitor(&self, visitor_id: Uuid) -> Result<Option<Lead>, AppError> {
        let lead = sqlx::query_as::<_, Lead>("SELECT * FROM leads WHERE visitor_id = $1")
            .bind(visitor_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(lead)
    }

    // Upsert com chave em visitor_id. Nome, telefone e consentimento são
    // sempre sobrescritos e a expiração renovada; cada campo UTM é
    // mesclado de forma independente: um NULL na nova chamada mantém o
    // valor armazenado. A versão do consentimento é fixada no insert.
    pub async fn upsert(
        &self,
        visitor_id: Uuid,
        name: &str,
        phone: &str,
        privacy_agreed: bool,
        privacy_version: &str,
        utm: &UtmParams,
    ) -> Result<Lead, AppError> {
        let lead = sqlx::query_as::<_, Lead>(
            r#"
            INSERT INTO leads (
                visitor_id, name, phone, privacy_agreed, privacy_version,
                utm_source, utm_medium, utm_campaign, utm_content, utm_term,
                expires_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, NOW() + INTERVAL '30 days')
            ON CONFLICT (visitor_id) DO UPDATE SET
                name = EXCLUDED.name,
                phone = EXCLUDED.phone,
                privacy_agreed = EXCLUDED.privacy_agreed,
                utm_source = COALESCE(EXCLUDED.utm_source, leads.utm_source),
                utm_medium = COALESCE(EXCLUDED.utm_medium, leads.utm_medium),
                utm_campaign = COALESCE(EXCLUDED.utm_campaign, leads.utm_campaign),
                utm_content = COALESCE(EXCLUDED.utm_content, leads.utm_content),
                utm_term = COALESCE(EXCLUDED.utm_term, leads.utm_term),
                expires_at = EXCLUDED.expires_at
            RETURNING *
            "#,
        )
        .bind(visitor_id)
        .bind(name)
        .bind(phone)
        .bind(privacy_agreed)
        .bind(privacy_version)
        .bind(utm.utm_source.as_deref())
        .bind(utm.utm_medium.as_deref())
        .bind(utm.utm_campaign.as_deref())
        .bind(utm.utm_content.as_deref())
        .bind(utm.utm_term.as_deref())
        .fetch_one(&self.pool)
        .await?;

        Ok(lead)
    }

    // Atualiza atribuição apenas num lead existente. Deliberadamente NÃO
    // cria lead quando ainda não existe (nada de leads com nome em
    // branco por este caminho). Retorna se alguma linha foi tocada.
    pub async fn update_utm(&self, visitor_id: Uuid, utm: &UtmParams) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE leads SET
                utm_source = COALESCE($2, utm_source),
                utm_medium = COALESCE($3, utm_medium),
                utm_campaign = COALESCE($4, utm_campaign),
                utm_content = COALESCE($5, utm_content),
                utm_term = COALESCE($6, utm_term)
            WHERE visitor_id = $1
            "#,
        )
        .bind(visitor_id)
        .bind(utm.utm_source.as_deref())
        .bind(utm.utm_medium.as_deref())
        .bind(utm.utm_campaign.as_deref())
        .bind(utm.utm_content.as_deref())
        .bind(utm.utm_term.as_deref())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    // Listagem admin, mais recentes primeiro.
    pub async fn list_all(&self) -> Result<Vec<Lead>, AppError> {
        let leads = sqlx::query_as::<_, Lead>("SELECT * FROM leads ORDER BY created_at DESC")
            .fetch_all(&self.pool)
            .await?;

        Ok(leads)
    }
}
