use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::booking::{Booking, BookingWithLead},
};

// Todo o acesso à tabela 'bookings'.
#[derive(Clone)]
pub struct BookingRepository {
    pool: PgPool,
}

impl BookingRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // Append-only: sem unicidade por visitante. A checagem de existência
    // do lead vive no service, não aqui.
    pub async fn create(
        &self,
        visitor_id: Uuid,
        service: &str,
        status: &str,
    ) -> Result<Booking, AppError> {
        let booking = sqlx::query_as::<_, Booking>(
            r#"
            INSERT INTO bookings (visitor_id, service, status, expires_at)
            VALUES ($1, $2, $3, NOW() + INTERVAL '30 days')
            RETURNING *
            "#,
        )
        .bind(visitor_id)
        .bind(service)
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        Ok(booking)
    }

    pub async fn list_by_visitor(&self, visitor_id: Uuid) -> Result<Vec<Booking>, AppError> {
        let bookings = sqlx::query_as::<_, Booking>(
            "SELECT * FROM bookings WHERE visitor_id = $1 ORDER BY created_at DESC",
        )
        .bind(visitor_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(bookings)
    }

    // Visão admin: LEFT JOIN para um agendamento cujo lead sumiu ainda
    // aparecer, com contato nulo.
    pub async fn list_with_leads(&self) -> Result<Vec<BookingWithLead>, AppError> {
        let bookings = sqlx::query_as::<_, BookingWithLead>(
            r#"
            SELECT
                b.id, b.visitor_id, b.service, b.status, b.created_at,
                l.name AS lead_name, l.phone AS lead_phone
            FROM bookings b
            LEFT JOIN leads l ON l.visitor_id = b.visitor_id
            ORDER BY b.created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(bookings)
    }
}
