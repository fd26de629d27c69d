use crate::core::collector::{BatchCollector, CollectionReport};
use crate::core::{ConfigProvider, LeadRepository, PlacesProvider};
use crate::domain::model::{current_month, Batch, BatchId, SearchCriteria, UserId};
use crate::utils::error::{LeadError, Result};
use crate::utils::validation::Validate;
use std::sync::Arc;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;

pub const MSG_PLAN_WITHOUT_LEADS: &str = "Seu plano não inclui coleta de leads.";
pub const MSG_MONTHLY_LIMIT: &str = "Você atingiu o limite de leads deste mês.";
pub const MSG_NEEDS_PLAN: &str = "Você precisa de um plano ativo para coletar leads.";

/// Recebe pedidos de coleta e executa cada lote em uma task própria.
/// O número de lotes rodando ao mesmo tempo é limitado por um semáforo.
pub struct CollectionEngine<P: PlacesProvider, R: LeadRepository> {
    collector: Arc<BatchCollector<P, R>>,
    permits: Arc<Semaphore>,
}

impl<P, R> CollectionEngine<P, R>
where
    P: PlacesProvider + 'static,
    R: LeadRepository + 'static,
{
    pub fn new(collector: BatchCollector<P, R>, max_concurrent_batches: usize) -> Self {
        Self {
            collector: Arc::new(collector),
            permits: Arc::new(Semaphore::new(max_concurrent_batches.max(1))),
        }
    }

    pub fn from_config<C: ConfigProvider>(places: Arc<P>, repository: Arc<R>, config: &C) -> Self {
        let collector = BatchCollector::new(places, repository, config.detail_delay());
        Self::new(collector, config.max_concurrent_batches())
    }

    pub fn repository(&self) -> &Arc<R> {
        self.collector.repository()
    }

    /// Valida os critérios e o acesso do usuário, cria o lote e dispara a coleta.
    pub async fn submit(&self, user_id: UserId, criteria: SearchCriteria) -> Result<Batch> {
        let batch = self.prepare(user_id, criteria).await?;
        self.launch(batch.id);
        Ok(batch)
    }

    /// Cria o lote sem disparar a coleta.
    pub async fn prepare(&self, user_id: UserId, criteria: SearchCriteria) -> Result<Batch> {
        let criteria = criteria.normalized();
        criteria.validate()?;

        let repository = self.repository();
        let access = repository
            .get_access(user_id)
            .await?
            .ok_or_else(|| LeadError::AccessDenied {
                reason: MSG_NEEDS_PLAN.to_string(),
            })?;

        if !access.is_active() {
            return Err(LeadError::AccessDenied {
                reason: format!(
                    "Seu acesso está {}. Entre em contato com o suporte.",
                    access.status
                ),
            });
        }
        if access.monthly_limit == 0 {
            return Err(LeadError::AccessDenied {
                reason: MSG_PLAN_WITHOUT_LEADS.to_string(),
            });
        }
        if !access.has_leads_available(&current_month()) {
            return Err(LeadError::QuotaExhausted { user_id });
        }

        let batch = repository.create_batch(user_id, criteria).await?;
        tracing::info!("📥 {} created for user {}", batch, user_id);
        Ok(batch)
    }

    /// Dispara a coleta em background. O handle pode ser descartado.
    pub fn launch(&self, batch_id: BatchId) -> JoinHandle<Option<CollectionReport>> {
        if self.available_slots() == 0 {
            tracing::info!("⏳ Batch {} queued: all collection slots are busy", batch_id);
        }
        let collector = Arc::clone(&self.collector);
        let permits = Arc::clone(&self.permits);

        tokio::spawn(async move {
            let _permit = match permits.acquire_owned().await {
                Ok(permit) => permit,
                Err(_) => {
                    tracing::error!("❌ Engine closed before batch {} could start", batch_id);
                    return None;
                }
            };

            match collector.run(batch_id).await {
                Ok(report) => Some(report),
                Err(e) => {
                    tracing::error!(
                        "❌ Batch {} failed: {} (Category: {:?}, Severity: {:?})",
                        batch_id,
                        e,
                        e.category(),
                        e.severity()
                    );
                    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());
                    None
                }
            }
        })
    }

    /// Executa a coleta na task atual (CLI).
    pub async fn run_now(&self, batch_id: BatchId) -> Result<CollectionReport> {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| LeadError::ProcessingError {
                message: format!("engine closed: {}", e),
            })?;
        self.collector.run(batch_id).await
    }

    pub fn available_slots(&self) -> usize {
        self.permits.available_permits()
    }
}
