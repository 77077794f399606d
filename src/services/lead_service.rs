use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::LeadRepository,
    models::lead::{Lead, UtmParams},
};

// Versão de consentimento carimbada nos leads capturados pelo roteiro do
// chat, onde não há versão de formulário disponível.
pub const DEFAULT_PRIVACY_VERSION: &str = "v1";

#[derive(Clone)]
pub struct LeadService {
    repo: LeadRepository,
}

impl LeadService {
    pub fn new(repo: LeadRepository) -> Self {
        Self { repo }
    }

    pub async fn upsert(
        &self,
        visitor_id: Uuid,
        name: &str,
        phone: &str,
        privacy_agreed: bool,
        privacy_version: &str,
        utm: &UtmParams,
    ) -> Result<Lead, AppError> {
        self.repo.upsert(visitor_id, name, phone, privacy_agreed, privacy_version, utm).await
    }

    pub async fn get_by_visitor(&self, visitor_id: Uuid) -> Result<Option<Lead>, AppError> {
        self.repo.find_by_visitor(visitor_id).await
    }

    pub async fn is_registered(&self, visitor_id: Uuid) -> Result<bool, AppError> {
        Ok(self.repo.find_by_visitor(visitor_id).await?.is_some())
    }

    // Atualização de atribuição vinda do script de tracking. Visitante
    // sem lead é um no-op, reportado pela flag retornada.
    pub async fn update_utm(&self, visitor_id: Uuid, utm: &UtmParams) -> Result<bool, AppError> {
        if utm.is_empty() {
            return Ok(false);
        }
        self.repo.update_utm(visitor_id, utm).await
    }

    pub async fn list(&self) -> Result<Vec<Lead>, AppError> {
        self.repo.list_all().await
    }
}
