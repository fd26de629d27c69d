use crate::utils::error::{LeadError, Result};
use crate::utils::validation::{
    validate_max_chars, validate_non_empty_string, validate_range, Validate,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub type UserId = u64;
pub type BatchId = u64;
pub type LeadId = u64;

pub const KEYWORD_MAX_CHARS: usize = 200;
pub const LOCATION_MAX_CHARS: usize = 150;
pub const LEAD_NAME_MAX_CHARS: usize = 300;
pub const ERROR_MESSAGE_MAX_CHARS: usize = 2000;
pub const RADIUS_MIN_KM: f64 = 1.0;
pub const RADIUS_MAX_KM: f64 = 50.0;

/// Mês de referência no formato `YYYY-MM` (UTC).
pub fn current_month() -> String {
    Utc::now().format("%Y-%m").to_string()
}

/// Critérios de busca informados pelo usuário ao iniciar uma coleta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchCriteria {
    pub keyword: String,
    #[serde(rename = "cidade")]
    pub city: String,
    #[serde(rename = "bairro", default)]
    pub neighborhood: String,
    #[serde(rename = "usar_raio", default)]
    pub use_radius: bool,
    #[serde(rename = "raio_km", default)]
    pub radius_km: Option<f64>,
}

impl SearchCriteria {
    pub fn new(keyword: &str, city: &str, neighborhood: &str) -> Self {
        Self {
            keyword: keyword.trim().to_string(),
            city: city.trim().to_string(),
            neighborhood: neighborhood.trim().to_string(),
            use_radius: false,
            radius_km: None,
        }
    }

    pub fn with_radius(mut self, radius_km: f64) -> Self {
        self.use_radius = true;
        self.radius_km = Some(radius_km);
        self
    }

    /// Endereço usado na geocodificação: "bairro, cidade" ou só a cidade.
    pub fn location(&self) -> String {
        if self.neighborhood.is_empty() {
            self.city.clone()
        } else {
            format!("{}, {}", self.neighborhood, self.city)
        }
    }

    /// Consulta textual para busca sem raio.
    pub fn text_query(&self) -> String {
        format!("{} em {}", self.keyword, self.location())
    }

    /// Raio efetivo: só existe quando a busca por raio foi pedida.
    pub fn effective_radius_km(&self) -> Option<f64> {
        if self.use_radius {
            self.radius_km
        } else {
            None
        }
    }

    /// Remove espaços e descarta o raio quando a busca por raio não foi pedida.
    pub fn normalized(mut self) -> Self {
        self.keyword = self.keyword.trim().to_string();
        self.city = self.city.trim().to_string();
        self.neighborhood = self.neighborhood.trim().to_string();
        if !self.use_radius {
            self.radius_km = None;
        }
        self
    }
}

impl Validate for SearchCriteria {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("keyword", &self.keyword)?;
        validate_max_chars("keyword", &self.keyword, KEYWORD_MAX_CHARS)?;
        validate_non_empty_string("cidade", &self.city)?;
        validate_max_chars("cidade", &self.city, LOCATION_MAX_CHARS)?;
        validate_max_chars("bairro", &self.neighborhood, LOCATION_MAX_CHARS)?;

        if self.use_radius {
            let radius = self
                .radius_km
                .ok_or_else(|| LeadError::InvalidConfigValueError {
                    field: "raio_km".to_string(),
                    value: String::new(),
                    reason: "Informe o raio em km quando usar busca por raio.".to_string(),
                })?;
            validate_range("raio_km", radius, RADIUS_MIN_KM, RADIUS_MAX_KM)?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BatchStatus {
    #[serde(rename = "em_andamento")]
    Running,
    #[serde(rename = "concluida")]
    Completed,
    #[serde(rename = "erro")]
    Failed,
}

impl BatchStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BatchStatus::Running => "em_andamento",
            BatchStatus::Completed => "concluida",
            BatchStatus::Failed => "erro",
        }
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lote de coleta ("Coleta"): critérios, status e mensagem de erro.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Batch {
    pub id: BatchId,
    pub user_id: UserId,
    pub criteria: SearchCriteria,
    pub status: BatchStatus,
    pub error_message: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl fmt::Display for Batch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Coleta #{} - {} em {} ({})",
            self.id, self.criteria.keyword, self.criteria.city, self.status
        )
    }
}

/// Corta a mensagem de erro no limite de caracteres armazenado no lote.
pub fn truncate_chars(value: &str, max_chars: usize) -> String {
    value.chars().take(max_chars).collect()
}

/// Lead ainda não persistido, montado a partir dos detalhes do local.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLead {
    pub user_id: UserId,
    pub batch_id: BatchId,
    pub place_id: String,
    pub category: String,
    pub city: String,
    pub neighborhood: String,
    pub name: String,
    pub phone: String,
    pub address: String,
    pub website: String,
    pub rating: Option<f64>,
    pub review_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Lead {
    pub id: LeadId,
    pub user_id: UserId,
    pub batch_id: BatchId,
    pub place_id: String,
    pub category: String,
    pub city: String,
    pub neighborhood: String,
    pub name: String,
    pub phone: String,
    pub address: String,
    pub website: String,
    pub rating: Option<f64>,
    pub review_count: u32,
    pub created_at: DateTime<Utc>,
}

impl Lead {
    pub fn from_new(id: LeadId, new: NewLead, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id: new.user_id,
            batch_id: new.batch_id,
            place_id: new.place_id,
            category: new.category,
            city: new.city,
            neighborhood: new.neighborhood,
            name: new.name,
            phone: new.phone,
            address: new.address,
            website: new.website,
            rating: new.rating,
            review_count: new.review_count,
            created_at,
        }
    }

    /// Nota com duas casas decimais, ou vazio quando o local não tem avaliação.
    pub fn rating_display(&self) -> String {
        self.rating.map(|r| format!("{:.2}", r)).unwrap_or_default()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AccessStatus {
    #[serde(rename = "ativo")]
    Active,
    #[serde(rename = "suspenso")]
    Suspended,
    #[serde(rename = "revogado")]
    Revoked,
}

impl AccessStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessStatus::Active => "ativo",
            AccessStatus::Suspended => "suspenso",
            AccessStatus::Revoked => "revogado",
        }
    }
}

impl fmt::Display for AccessStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Nível numérico de um plano para comparação.
/// basico=1, profissional=2, enterprise=3, ouro (legado)=2, desconhecido=0.
pub fn tier_level(slug: &str) -> u8 {
    let base = slug
        .strip_suffix("_mensal")
        .or_else(|| slug.strip_suffix("_anual"))
        .unwrap_or(slug);
    match base {
        "basico" => 1,
        "profissional" | "ouro" => 2,
        "enterprise" => 3,
        _ => 0,
    }
}

/// Nome do plano para mensagens ao usuário.
pub fn tier_display_name(slug: &str) -> &'static str {
    match tier_level(slug) {
        1 => "Básico",
        2 => "Profissional",
        3 => "Enterprise",
        _ => "Sem plano",
    }
}

/// Acesso do usuário ao plano ("Acesso"), com a cota mensal de leads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessRecord {
    pub user_id: UserId,
    pub tier: String,
    pub status: AccessStatus,
    pub monthly_limit: u32,
    pub consumed_this_month: u32,
    pub reference_month: String,
}

impl AccessRecord {
    pub fn new(user_id: UserId, tier: &str, monthly_limit: u32) -> Self {
        Self {
            user_id,
            tier: tier.to_string(),
            status: AccessStatus::Active,
            monthly_limit,
            consumed_this_month: 0,
            reference_month: String::new(),
        }
    }

    /// Zera o consumo quando o mês mudou. Retorna `true` se houve reset.
    pub fn refresh_month(&mut self, month: &str) -> bool {
        if self.reference_month == month {
            return false;
        }
        self.consumed_this_month = 0;
        self.reference_month = month.to_string();
        true
    }

    pub fn has_leads_available(&self, month: &str) -> bool {
        if self.reference_month != month {
            return true;
        }
        self.consumed_this_month < self.monthly_limit
    }

    pub fn remaining(&self, month: &str) -> u32 {
        if self.reference_month != month {
            return self.monthly_limit;
        }
        self.monthly_limit.saturating_sub(self.consumed_this_month)
    }

    pub fn is_active(&self) -> bool {
        self.status == AccessStatus::Active
    }

    pub fn has_minimum_level(&self, required: &str) -> bool {
        if !self.is_active() {
            return false;
        }
        tier_level(&self.tier) >= tier_level(required)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_level_strips_periodicity() {
        assert_eq!(tier_level("basico"), 1);
        assert_eq!(tier_level("basico_anual"), 1);
        assert_eq!(tier_level("profissional_mensal"), 2);
        assert_eq!(tier_level("enterprise_anual"), 3);
        assert_eq!(tier_level("ouro"), 2);
        assert_eq!(tier_level("invalido"), 0);
        assert_eq!(tier_display_name("profissional_anual"), "Profissional");
        assert_eq!(tier_display_name("ouro"), "Profissional");
        assert_eq!(tier_display_name(""), "Sem plano");
    }

    #[test]
    fn test_minimum_level_hierarchy() {
        let access = AccessRecord::new(1, "profissional_mensal", 100);
        assert!(access.has_minimum_level("basico"));
        assert!(access.has_minimum_level("profissional"));
        assert!(access.has_minimum_level("ouro"));
        assert!(!access.has_minimum_level("enterprise"));
    }

    #[test]
    fn test_suspended_access_blocks_every_level() {
        let mut access = AccessRecord::new(1, "enterprise_mensal", 100);
        access.status = AccessStatus::Suspended;
        assert!(!access.has_minimum_level("basico"));
        assert!(!access.is_active());
    }

    #[test]
    fn test_refresh_month_resets_consumption() {
        let mut access = AccessRecord::new(1, "basico", 10);
        access.reference_month = "2026-09".to_string();
        access.consumed_this_month = 10;

        assert!(!access.has_leads_available("2026-09"));
        assert!(access.has_leads_available("2026-10"));
        assert_eq!(access.remaining("2026-10"), 10);

        assert!(access.refresh_month("2026-10"));
        assert_eq!(access.consumed_this_month, 0);
        assert_eq!(access.reference_month, "2026-10");
        assert!(!access.refresh_month("2026-10"));
    }

    #[test]
    fn test_remaining_never_underflows() {
        let mut access = AccessRecord::new(1, "basico", 5);
        access.reference_month = "2026-10".to_string();
        access.consumed_this_month = 8;
        assert_eq!(access.remaining("2026-10"), 0);
    }

    #[test]
    fn test_criteria_location_and_query() {
        let criteria = SearchCriteria::new("imobiliária", "Florianópolis", "Jurerê");
        assert_eq!(criteria.location(), "Jurerê, Florianópolis");
        assert_eq!(criteria.text_query(), "imobiliária em Jurerê, Florianópolis");

        let criteria = SearchCriteria::new("clínica", "Curitiba", "");
        assert_eq!(criteria.location(), "Curitiba");
        assert_eq!(criteria.text_query(), "clínica em Curitiba");
    }

    #[test]
    fn test_criteria_validation() {
        assert!(SearchCriteria::new("restaurante", "Recife", "").validate().is_ok());
        assert!(SearchCriteria::new("  ", "Recife", "").validate().is_err());
        assert!(SearchCriteria::new("restaurante", "", "").validate().is_err());
        assert!(SearchCriteria::new(&"x".repeat(201), "Recife", "").validate().is_err());

        let mut missing_radius = SearchCriteria::new("restaurante", "Recife", "");
        missing_radius.use_radius = true;
        assert!(missing_radius.validate().is_err());

        let radius_ok = SearchCriteria::new("restaurante", "Recife", "").with_radius(5.0);
        assert!(radius_ok.validate().is_ok());

        let radius_too_big = SearchCriteria::new("restaurante", "Recife", "").with_radius(51.0);
        assert!(radius_too_big.validate().is_err());
    }

    #[test]
    fn test_normalized_drops_unused_radius() {
        let mut criteria = SearchCriteria::new("bar", "Natal", "");
        criteria.radius_km = Some(10.0);
        let criteria = criteria.normalized();
        assert_eq!(criteria.radius_km, None);
        assert_eq!(criteria.effective_radius_km(), None);
    }

    #[test]
    fn test_batch_status_serializes_portuguese() {
        let json = serde_json::to_string(&BatchStatus::Running).unwrap();
        assert_eq!(json, "\"em_andamento\"");
        let status: BatchStatus = serde_json::from_str("\"concluida\"").unwrap();
        assert_eq!(status, BatchStatus::Completed);
    }

    #[test]
    fn test_truncate_chars_respects_multibyte() {
        assert_eq!(truncate_chars("ação", 2), "aç");
        assert_eq!(truncate_chars("curto", 100), "curto");
    }

    #[test]
    fn test_rating_display() {
        let created_at = Utc::now();
        let new = NewLead {
            user_id: 1,
            batch_id: 1,
            place_id: "abc".to_string(),
            category: "bar".to_string(),
            city: "Natal".to_string(),
            neighborhood: String::new(),
            name: "Bar do Zé".to_string(),
            phone: String::new(),
            address: String::new(),
            website: String::new(),
            rating: Some(4.5),
            review_count: 12,
        };
        let mut lead = Lead::from_new(1, new, created_at);
        assert_eq!(lead.rating_display(), "4.50");
        lead.rating = None;
        assert_eq!(lead.rating_display(), "");
    }
}
