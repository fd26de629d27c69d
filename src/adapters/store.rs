use crate::core::LeadRepository;
use crate::domain::model::{
    truncate_chars, AccessRecord, Batch, BatchId, BatchStatus, Lead, LeadId, NewLead,
    SearchCriteria, UserId, ERROR_MESSAGE_MAX_CHARS,
};
use crate::utils::error::{LeadError, Result};
use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap, HashSet};
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct StoreState {
    next_batch_id: BatchId,
    next_lead_id: LeadId,
    batches: BTreeMap<BatchId, Batch>,
    leads: BTreeMap<LeadId, Lead>,
    place_index: HashSet<(BatchId, String)>,
    access: HashMap<UserId, AccessRecord>,
}

/// Repositório em memória. Cada operação segura o lock inteiro, então
/// inserção de lead + consumo de cota são atômicos entre coletas concorrentes.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn with_access(records: Vec<AccessRecord>) -> Self {
        let store = Self::new();
        for record in records {
            // upsert em memória não falha
            let _ = store.upsert_access(record).await;
        }
        store
    }
}

#[async_trait]
impl LeadRepository for InMemoryStore {
    async fn create_batch(&self, user_id: UserId, criteria: SearchCriteria) -> Result<Batch> {
        let mut state = self.state.lock().await;
        state.next_batch_id += 1;
        let now = Utc::now();
        let batch = Batch {
            id: state.next_batch_id,
            user_id,
            criteria,
            status: BatchStatus::Running,
            error_message: String::new(),
            created_at: now,
            updated_at: now,
        };
        state.batches.insert(batch.id, batch.clone());
        Ok(batch)
    }

    async fn get_batch(&self, batch_id: BatchId) -> Result<Option<Batch>> {
        let state = self.state.lock().await;
        Ok(state.batches.get(&batch_id).cloned())
    }

    async fn list_batches(&self, user_id: UserId) -> Result<Vec<Batch>> {
        let state = self.state.lock().await;
        Ok(state
            .batches
            .values()
            .rev()
            .filter(|batch| batch.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn finish_batch(
        &self,
        batch_id: BatchId,
        status: BatchStatus,
        message: Option<String>,
    ) -> Result<Batch> {
        let mut state = self.state.lock().await;
        let batch = state
            .batches
            .get_mut(&batch_id)
            .ok_or(LeadError::NotFound {
                entity: "Coleta",
                id: batch_id,
            })?;
        batch.status = status;
        if let Some(message) = message {
            batch.error_message = truncate_chars(&message, ERROR_MESSAGE_MAX_CHARS);
        }
        batch.updated_at = Utc::now();
        Ok(batch.clone())
    }

    async fn lead_exists(&self, batch_id: BatchId, place_id: &str) -> Result<bool> {
        let state = self.state.lock().await;
        Ok(state.place_index.contains(&(batch_id, place_id.to_string())))
    }

    async fn insert_lead(&self, lead: NewLead, month: &str) -> Result<Lead> {
        let mut guard = self.state.lock().await;
        let state = &mut *guard;

        let key = (lead.batch_id, lead.place_id.clone());
        if state.place_index.contains(&key) {
            return Err(LeadError::DuplicateLead {
                batch_id: lead.batch_id,
                place_id: lead.place_id,
            });
        }

        let access = state
            .access
            .get_mut(&lead.user_id)
            .ok_or_else(|| LeadError::AccessDenied {
                reason: "Usuário sem acesso configurado.".to_string(),
            })?;
        access.refresh_month(month);
        if access.consumed_this_month >= access.monthly_limit {
            return Err(LeadError::QuotaExhausted {
                user_id: lead.user_id,
            });
        }
        access.consumed_this_month += 1;

        state.next_lead_id += 1;
        let stored = Lead::from_new(state.next_lead_id, lead, Utc::now());
        state.place_index.insert(key);
        state.leads.insert(stored.id, stored.clone());
        Ok(stored)
    }

    async fn leads_since(&self, batch_id: BatchId, since_id: LeadId) -> Result<Vec<Lead>> {
        let state = self.state.lock().await;
        Ok(state
            .leads
            .range(since_id.saturating_add(1)..)
            .map(|(_, lead)| lead)
            .filter(|lead| lead.batch_id == batch_id)
            .cloned()
            .collect())
    }

    async fn count_leads(&self, batch_id: BatchId) -> Result<usize> {
        let state = self.state.lock().await;
        Ok(state
            .leads
            .values()
            .filter(|lead| lead.batch_id == batch_id)
            .count())
    }

    async fn leads_for_user(&self, user_id: UserId, limit: Option<usize>) -> Result<Vec<Lead>> {
        let state = self.state.lock().await;
        let newest_first = state
            .leads
            .values()
            .rev()
            .filter(|lead| lead.user_id == user_id)
            .cloned();
        Ok(match limit {
            Some(limit) => newest_first.take(limit).collect(),
            None => newest_first.collect(),
        })
    }

    async fn get_access(&self, user_id: UserId) -> Result<Option<AccessRecord>> {
        let state = self.state.lock().await;
        Ok(state.access.get(&user_id).cloned())
    }

    async fn upsert_access(&self, record: AccessRecord) -> Result<()> {
        let mut state = self.state.lock().await;
        state.access.insert(record.user_id, record);
        Ok(())
    }

    async fn refresh_monthly_usage(
        &self,
        user_id: UserId,
        month: &str,
    ) -> Result<Option<AccessRecord>> {
        let mut state = self.state.lock().await;
        Ok(state.access.get_mut(&user_id).map(|access| {
            if access.refresh_month(month) {
                tracing::debug!("Monthly usage reset for user {} ({})", user_id, month);
            }
            access.clone()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MONTH: &str = "2026-10";

    fn new_lead(user_id: UserId, batch_id: BatchId, place_id: &str) -> NewLead {
        NewLead {
            user_id,
            batch_id,
            place_id: place_id.to_string(),
            category: "padaria".to_string(),
            city: "Curitiba".to_string(),
            neighborhood: String::new(),
            name: format!("Padaria {}", place_id),
            phone: String::new(),
            address: String::new(),
            website: String::new(),
            rating: None,
            review_count: 0,
        }
    }

    async fn store_with_limit(limit: u32) -> InMemoryStore {
        InMemoryStore::with_access(vec![AccessRecord::new(1, "basico", limit)]).await
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_place_in_same_batch() {
        let store = store_with_limit(10).await;
        let batch = store
            .create_batch(1, SearchCriteria::new("padaria", "Curitiba", ""))
            .await
            .unwrap();

        store.insert_lead(new_lead(1, batch.id, "p1"), MONTH).await.unwrap();
        let err = store
            .insert_lead(new_lead(1, batch.id, "p1"), MONTH)
            .await
            .unwrap_err();

        assert!(matches!(err, LeadError::DuplicateLead { .. }));
        assert!(store.lead_exists(batch.id, "p1").await.unwrap());
        assert_eq!(store.count_leads(batch.id).await.unwrap(), 1);

        // duplicata não consome cota
        let access = store.get_access(1).await.unwrap().unwrap();
        assert_eq!(access.consumed_this_month, 1);
    }

    #[tokio::test]
    async fn test_same_place_allowed_in_another_batch() {
        let store = store_with_limit(10).await;
        let first = store
            .create_batch(1, SearchCriteria::new("padaria", "Curitiba", ""))
            .await
            .unwrap();
        let second = store
            .create_batch(1, SearchCriteria::new("padaria", "Curitiba", ""))
            .await
            .unwrap();

        store.insert_lead(new_lead(1, first.id, "p1"), MONTH).await.unwrap();
        store.insert_lead(new_lead(1, second.id, "p1"), MONTH).await.unwrap();
        assert_eq!(store.leads_for_user(1, None).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_insert_stops_at_monthly_limit() {
        let store = store_with_limit(2).await;
        let batch = store
            .create_batch(1, SearchCriteria::new("padaria", "Curitiba", ""))
            .await
            .unwrap();

        store.insert_lead(new_lead(1, batch.id, "p1"), MONTH).await.unwrap();
        store.insert_lead(new_lead(1, batch.id, "p2"), MONTH).await.unwrap();
        let err = store
            .insert_lead(new_lead(1, batch.id, "p3"), MONTH)
            .await
            .unwrap_err();

        assert!(matches!(err, LeadError::QuotaExhausted { user_id: 1 }));
        assert!(!store.lead_exists(batch.id, "p3").await.unwrap());
    }

    #[tokio::test]
    async fn test_insert_without_access_is_denied() {
        let store = InMemoryStore::new();
        let err = store.insert_lead(new_lead(9, 1, "p1"), MONTH).await.unwrap_err();
        assert!(matches!(err, LeadError::AccessDenied { .. }));
    }

    #[tokio::test]
    async fn test_leads_since_returns_newer_ids_in_order() {
        let store = store_with_limit(10).await;
        let batch = store
            .create_batch(1, SearchCriteria::new("padaria", "Curitiba", ""))
            .await
            .unwrap();
        let other = store
            .create_batch(1, SearchCriteria::new("bar", "Curitiba", ""))
            .await
            .unwrap();

        let a = store.insert_lead(new_lead(1, batch.id, "a"), MONTH).await.unwrap();
        store.insert_lead(new_lead(1, other.id, "x"), MONTH).await.unwrap();
        let b = store.insert_lead(new_lead(1, batch.id, "b"), MONTH).await.unwrap();
        let c = store.insert_lead(new_lead(1, batch.id, "c"), MONTH).await.unwrap();

        let all = store.leads_since(batch.id, 0).await.unwrap();
        assert_eq!(
            all.iter().map(|l| l.id).collect::<Vec<_>>(),
            vec![a.id, b.id, c.id]
        );

        let newer = store.leads_since(batch.id, a.id).await.unwrap();
        assert_eq!(newer.iter().map(|l| l.id).collect::<Vec<_>>(), vec![b.id, c.id]);
        assert!(store.leads_since(batch.id, c.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_leads_for_user_newest_first_with_limit() {
        let store = store_with_limit(10).await;
        let batch = store
            .create_batch(1, SearchCriteria::new("padaria", "Curitiba", ""))
            .await
            .unwrap();
        for place in ["a", "b", "c"] {
            store.insert_lead(new_lead(1, batch.id, place), MONTH).await.unwrap();
        }

        let leads = store.leads_for_user(1, Some(2)).await.unwrap();
        assert_eq!(leads.len(), 2);
        assert_eq!(leads[0].place_id, "c");
        assert_eq!(leads[1].place_id, "b");
        assert!(store.leads_for_user(2, None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_refresh_monthly_usage_resets_on_new_month() {
        let mut record = AccessRecord::new(1, "basico", 5);
        record.reference_month = "2026-09".to_string();
        record.consumed_this_month = 5;
        let store = InMemoryStore::with_access(vec![record]).await;

        let refreshed = store.refresh_monthly_usage(1, MONTH).await.unwrap().unwrap();
        assert_eq!(refreshed.consumed_this_month, 0);
        assert_eq!(refreshed.reference_month, MONTH);
        assert!(store.refresh_monthly_usage(2, MONTH).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_finish_batch_truncates_message() {
        let store = InMemoryStore::new();
        let batch = store
            .create_batch(1, SearchCriteria::new("padaria", "Curitiba", ""))
            .await
            .unwrap();

        let finished = store
            .finish_batch(batch.id, BatchStatus::Failed, Some("e".repeat(3000)))
            .await
            .unwrap();
        assert_eq!(finished.status, BatchStatus::Failed);
        assert_eq!(finished.error_message.chars().count(), ERROR_MESSAGE_MAX_CHARS);

        let err = store
            .finish_batch(999, BatchStatus::Completed, None)
            .await
            .unwrap_err();
        assert!(matches!(err, LeadError::NotFound { id: 999, .. }));
    }

    #[tokio::test]
    async fn test_list_batches_is_per_user_newest_first() {
        let store = InMemoryStore::new();
        let first = store
            .create_batch(1, SearchCriteria::new("padaria", "Curitiba", ""))
            .await
            .unwrap();
        store
            .create_batch(2, SearchCriteria::new("bar", "Natal", ""))
            .await
            .unwrap();
        let third = store
            .create_batch(1, SearchCriteria::new("clínica", "Recife", ""))
            .await
            .unwrap();

        let batches = store.list_batches(1).await.unwrap();
        assert_eq!(
            batches.iter().map(|b| b.id).collect::<Vec<_>>(),
            vec![third.id, first.id]
        );
    }
}
