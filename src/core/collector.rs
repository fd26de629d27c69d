use crate::core::{LeadRepository, PlacesProvider};
use crate::domain::model::{
    current_month, truncate_chars, Batch, BatchId, BatchStatus, NewLead, LEAD_NAME_MAX_CHARS,
};
use crate::domain::places::{Circle, PlaceDetails, TextSearch};
use crate::utils::error::{LeadError, Result};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

pub const MSG_NO_ACCESS: &str = "Usuário sem acesso configurado.";
pub const MSG_NO_LIMIT: &str = "Plano sem limite de leads disponível.";
pub const MSG_LIMIT_REACHED: &str = "Limite mensal de leads já atingido.";

/// Resumo de uma coleta executada.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionReport {
    pub batch_id: BatchId,
    pub status: BatchStatus,
    pub collected: usize,
    pub skipped_duplicates: usize,
    pub missing_details: usize,
    pub message: String,
}

impl CollectionReport {
    fn finished(batch_id: BatchId, status: BatchStatus, message: &str) -> Self {
        Self {
            batch_id,
            status,
            collected: 0,
            skipped_duplicates: 0,
            missing_details: 0,
            message: message.to_string(),
        }
    }
}

#[derive(Debug, Default)]
struct Tally {
    collected: usize,
    skipped_duplicates: usize,
    missing_details: usize,
}

/// Executa uma coleta: geocodifica (se houver raio), busca, detalha,
/// deduplica, persiste e consome a cota mensal do usuário.
pub struct BatchCollector<P: PlacesProvider, R: LeadRepository> {
    places: Arc<P>,
    repository: Arc<R>,
    detail_delay: Duration,
}

impl<P: PlacesProvider, R: LeadRepository> BatchCollector<P, R> {
    pub fn new(places: Arc<P>, repository: Arc<R>, detail_delay: Duration) -> Self {
        Self {
            places,
            repository,
            detail_delay,
        }
    }

    pub fn repository(&self) -> &Arc<R> {
        &self.repository
    }

    /// Roda a coleta do lote e grava o status final. Só devolve erro quando
    /// o lote não existe ou o status final não pôde ser gravado.
    pub async fn run(&self, batch_id: BatchId) -> Result<CollectionReport> {
        self.run_for_month(batch_id, &current_month()).await
    }

    pub async fn run_for_month(&self, batch_id: BatchId, month: &str) -> Result<CollectionReport> {
        let batch = match self.repository.get_batch(batch_id).await? {
            Some(batch) => batch,
            None => {
                tracing::error!("❌ Batch {} not found", batch_id);
                return Err(LeadError::NotFound {
                    entity: "Coleta",
                    id: batch_id,
                });
            }
        };

        tracing::info!("🚀 Starting {}", batch);

        let access = match self
            .repository
            .refresh_monthly_usage(batch.user_id, month)
            .await?
        {
            Some(access) => access,
            None => return self.finish(batch_id, BatchStatus::Failed, MSG_NO_ACCESS).await,
        };

        if access.monthly_limit == 0 {
            return self.finish(batch_id, BatchStatus::Failed, MSG_NO_LIMIT).await;
        }
        if access.consumed_this_month >= access.monthly_limit {
            return self
                .finish(batch_id, BatchStatus::Completed, MSG_LIMIT_REACHED)
                .await;
        }

        let remaining = access.remaining(month) as usize;
        let mut tally = Tally::default();

        match self.collect(&batch, month, remaining, &mut tally).await {
            Ok(()) => {
                self.repository
                    .finish_batch(batch_id, BatchStatus::Completed, None)
                    .await?;
                tracing::info!(
                    "✅ Batch {} completed: {} leads, {} duplicates, {} without details",
                    batch_id,
                    tally.collected,
                    tally.skipped_duplicates,
                    tally.missing_details
                );
                Ok(CollectionReport {
                    batch_id,
                    status: BatchStatus::Completed,
                    collected: tally.collected,
                    skipped_duplicates: tally.skipped_duplicates,
                    missing_details: tally.missing_details,
                    message: String::new(),
                })
            }
            Err(e) => {
                tracing::error!(
                    "❌ Batch {} error: {} (Category: {:?}, Severity: {:?})",
                    batch_id,
                    e,
                    e.category(),
                    e.severity()
                );
                let message = match &e {
                    LeadError::GeocodingError { .. } => e.user_friendly_message(),
                    other => other.to_string(),
                };
                let mut report = self.finish(batch_id, BatchStatus::Failed, &message).await?;
                report.collected = tally.collected;
                report.skipped_duplicates = tally.skipped_duplicates;
                report.missing_details = tally.missing_details;
                Ok(report)
            }
        }
    }

    async fn finish(
        &self,
        batch_id: BatchId,
        status: BatchStatus,
        message: &str,
    ) -> Result<CollectionReport> {
        let batch = self
            .repository
            .finish_batch(batch_id, status, Some(message.to_string()))
            .await?;
        tracing::info!("🏁 {}: {}", batch, message);
        Ok(CollectionReport::finished(batch_id, status, &batch.error_message))
    }

    async fn resolve_search(&self, batch: &Batch) -> Result<TextSearch> {
        let criteria = &batch.criteria;
        match criteria.effective_radius_km() {
            Some(radius_km) => {
                let address = criteria.location();
                let coordinates = match self.places.geocode(&address).await {
                    Ok(Some(coordinates)) => coordinates,
                    Ok(None) => return Err(LeadError::GeocodingError { address }),
                    Err(e) => {
                        tracing::warn!("⚠️ Failed to geocode '{}': {}", address, e);
                        return Err(LeadError::GeocodingError { address });
                    }
                };
                tracing::debug!(
                    "Geocoded '{}' to ({}, {}), radius {} km",
                    address,
                    coordinates.lat,
                    coordinates.lng,
                    radius_km
                );
                Ok(TextSearch {
                    text_query: criteria.keyword.clone(),
                    restriction: Some(Circle::from_km(coordinates, radius_km)),
                })
            }
            None => Ok(TextSearch {
                text_query: criteria.text_query(),
                restriction: None,
            }),
        }
    }

    async fn collect(
        &self,
        batch: &Batch,
        month: &str,
        mut remaining: usize,
        tally: &mut Tally,
    ) -> Result<()> {
        let search = self.resolve_search(batch).await?;
        let places = self.places.search_text(&search).await?;
        tracing::info!(
            "📋 Batch {}: {} places found, {} leads of quota left",
            batch.id,
            places.len(),
            remaining
        );

        for place in places {
            if remaining == 0 {
                tracing::info!("🛑 Batch {}: monthly limit reached", batch.id);
                break;
            }
            if place.id.is_empty() {
                continue;
            }

            // Evita duplicata na mesma coleta antes de gastar uma chamada de detalhes
            if self.repository.lead_exists(batch.id, &place.id).await? {
                tally.skipped_duplicates += 1;
                continue;
            }

            let details = match self.places.place_details(&place.id).await {
                Ok(Some(details)) => details,
                Ok(None) => {
                    tally.missing_details += 1;
                    self.pause().await;
                    continue;
                }
                Err(e) => {
                    tracing::warn!("⚠️ Failed to fetch details for place {}: {}", place.id, e);
                    tally.missing_details += 1;
                    self.pause().await;
                    continue;
                }
            };

            let new_lead = build_lead(batch, &place.id, &details);
            match self.repository.insert_lead(new_lead, month).await {
                Ok(lead) => {
                    tracing::debug!("Lead collected #{} {} ({})", lead.id, lead.name, lead.place_id);
                    tally.collected += 1;
                    remaining -= 1;
                }
                Err(LeadError::DuplicateLead { .. }) => {
                    tally.skipped_duplicates += 1;
                }
                Err(LeadError::QuotaExhausted { .. }) => {
                    tracing::info!(
                        "🛑 Batch {}: quota consumed by another batch of the same user",
                        batch.id
                    );
                    break;
                }
                Err(e) => {
                    tracing::warn!("⚠️ Failed to save lead {}: {}", place.id, e);
                }
            }

            self.pause().await;
        }

        Ok(())
    }

    async fn pause(&self) {
        if !self.detail_delay.is_zero() {
            tokio::time::sleep(self.detail_delay).await;
        }
    }
}

/// Monta o lead a partir do lote e dos detalhes do local.
pub fn build_lead(batch: &Batch, place_id: &str, details: &PlaceDetails) -> NewLead {
    NewLead {
        user_id: batch.user_id,
        batch_id: batch.id,
        place_id: place_id.to_string(),
        category: batch.criteria.keyword.clone(),
        city: batch.criteria.city.clone(),
        neighborhood: batch.criteria.neighborhood.clone(),
        name: truncate_chars(details.name(), LEAD_NAME_MAX_CHARS),
        phone: details.national_phone_number.clone().unwrap_or_default(),
        address: details.formatted_address.clone().unwrap_or_default(),
        website: details.website_uri.clone().unwrap_or_default(),
        rating: details.rating.filter(|r| r.is_finite()),
        review_count: details.user_rating_count.unwrap_or(0),
    }
}
