use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{LeadRepository, VisitorRepository},
    models::{lead::Lead, visitor::Visitor},
};

#[derive(Clone)]
pub struct VisitorService {
    visitor_repo: VisitorRepository,
    lead_repo: LeadRepository,
}

impl VisitorService {
    pub fn new(visitor_repo: VisitorRepository, lead_repo: LeadRepository) -> Self {
        Self { visitor_repo, lead_repo }
    }

    // Um valor de cookie malformado é tratado como ausência de cookie: o
    // chamador simplesmente recebe um visitante novo.
    pub async fn get_or_create(&self, existing: Option<Uuid>) -> Result<Visitor, AppError> {
        self.visitor_repo.get_or_create(existing).await
    }

    // Visitante mais status de registro numa chamada só, para a carga
    // inicial do widget.
    pub async fn get_with_registration(
        &self,
        id: Uuid,
    ) -> Result<(Visitor, Option<Lead>), AppError> {
        let visitor =
            self.visitor_repo.find_by_id(id).await?.ok_or(AppError::VisitorNotFound)?;
        let lead = self.lead_repo.find_by_visitor(id).await?;
        Ok((visitor, lead))
    }
}
