use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{BookingRepository, LeadRepository},
    models::booking::{Booking, BookingWithLead, STATUS_REQUESTED},
};

#[derive(Clone)]
pub struct BookingService {
    booking_repo: BookingRepository,
    lead_repo: LeadRepository,
}

impl BookingService {
    pub fn new(booking_repo: BookingRepository, lead_repo: LeadRepository) -> Self {
        Self { booking_repo, lead_repo }
    }

    // Registrar-antes-de-agendar é invariante de negócio, não restrição
    // de armazenamento: a checagem vive aqui e em nenhum outro lugar. As
    // duas escritas (lead antes, agendamento agora) são round trips
    // separados; um lead sem agendamento após um crash no meio é tolerado.
    pub async fn create(
        &self,
        visitor_id: Uuid,
        service: &str,
    ) -> Result<(Booking, crate::models::lead::Lead), AppError> {
        let lead = self
            .lead_repo
            .find_by_visitor(visitor_id)
            .await?
            .ok_or(AppError::RegistrationRequired)?;

        let booking = self.booking_repo.create(visitor_id, service, STATUS_REQUESTED).await?;
        tracing::info!(%visitor_id, service, "booking created");

        Ok((booking, lead))
    }

    pub async fn list_by_visitor(&self, visitor_id: Uuid) -> Result<Vec<Booking>, AppError> {
        self.booking_repo.list_by_visitor(visitor_id).await
    }

    pub async fn list_with_leads(&self) -> Result<Vec<BookingWithLead>, AppError> {
        self.booking_repo.list_with_leads().await
    }
}
