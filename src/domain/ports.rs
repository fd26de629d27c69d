use crate::domain::model::{
    AccessRecord, Batch, BatchId, BatchStatus, Lead, LeadId, NewLead, SearchCriteria, UserId,
};
use crate::domain::places::{Coordinates, PlaceDetails, PlaceSummary, TextSearch};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn api_key(&self) -> &str;
    fn search_endpoint(&self) -> &str;
    fn details_endpoint(&self) -> &str;
    fn geocode_endpoint(&self) -> &str;
    fn language_code(&self) -> &str;
    fn request_timeout(&self) -> Duration;
    fn max_results(&self) -> usize;
    fn page_size(&self) -> usize;
    fn page_delay(&self) -> Duration;
    fn detail_delay(&self) -> Duration;
    fn max_concurrent_batches(&self) -> usize;
}

/// Serviço externo de busca de locais (texto, detalhes e geocodificação).
#[async_trait]
pub trait PlacesProvider: Send + Sync {
    /// `Ok(None)` quando o serviço não encontrou o endereço.
    async fn geocode(&self, address: &str) -> Result<Option<Coordinates>>;

    /// Busca paginada; devolve no máximo o teto configurado de resultados.
    async fn search_text(&self, search: &TextSearch) -> Result<Vec<PlaceSummary>>;

    /// `Ok(None)` quando o serviço não devolveu detalhes para o local.
    async fn place_details(&self, place_id: &str) -> Result<Option<PlaceDetails>>;
}

/// Persistência de coletas, leads e acessos.
///
/// `insert_lead` é a única operação que consome cota: a inserção e o
/// incremento do contador mensal acontecem juntos ou não acontecem.
#[async_trait]
pub trait LeadRepository: Send + Sync {
    async fn create_batch(&self, user_id: UserId, criteria: SearchCriteria) -> Result<Batch>;
    async fn get_batch(&self, batch_id: BatchId) -> Result<Option<Batch>>;
    async fn list_batches(&self, user_id: UserId) -> Result<Vec<Batch>>;
    async fn finish_batch(
        &self,
        batch_id: BatchId,
        status: BatchStatus,
        message: Option<String>,
    ) -> Result<Batch>;

    async fn lead_exists(&self, batch_id: BatchId, place_id: &str) -> Result<bool>;
    async fn insert_lead(&self, lead: NewLead, month: &str) -> Result<Lead>;
    async fn leads_since(&self, batch_id: BatchId, since_id: LeadId) -> Result<Vec<Lead>>;
    async fn count_leads(&self, batch_id: BatchId) -> Result<usize>;
    async fn leads_for_user(&self, user_id: UserId, limit: Option<usize>) -> Result<Vec<Lead>>;

    async fn get_access(&self, user_id: UserId) -> Result<Option<AccessRecord>>;
    async fn upsert_access(&self, record: AccessRecord) -> Result<()>;
    /// Aplica a virada de mês e devolve o acesso atualizado.
    async fn refresh_monthly_usage(
        &self,
        user_id: UserId,
        month: &str,
    ) -> Result<Option<AccessRecord>>;
}
