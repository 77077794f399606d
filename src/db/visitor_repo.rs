use sqlx::PgPool;
use uuid::Uuid;

use crate::{common::error::AppError, models::visitor::Visitor};

// Todo o acesso à tabela 'visitors'.
#[derive(Clone)]
pub struct VisitorRepository {
    pool: PgPool,
}

impl VisitorRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Option<Visitor>, AppError> {
        let visitor = sqlx::query_as::<_, Visitor>("SELECT * FROM visitors WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(visitor)
    }

    // Idempotente para um id conhecido: uma segunda chamada com o mesmo
    // token retorna a mesma linha. Token desconhecido ou ausente cria um
    // visitante novo com expiração de 30 dias.
    pub async fn get_or_create(&self, existing: Option<Uuid>) -> Result<Visitor, AppError> {
        if let Some(id) = existing {
            if let Some(visitor) = self.find_by_id(id).await? {
                return Ok(visitor);
            }
        }

        let visitor = sqlx::query_as::<_, Visitor>(
            "INSERT INTO visitors (expires_at) VALUES (NOW() + INTERVAL '30 days') RETURNING *",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(visitor)
    }
}
