use crate::core::ConfigProvider;
use crate::domain::model::{tier_level, AccessRecord, AccessStatus, UserId};
use crate::utils::error::{LeadError, Result};
use crate::utils::validation::{
    validate_non_empty_string, validate_positive_number, validate_range, validate_socket_addr,
    validate_url, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::OnceLock;
use std::time::Duration;

pub const API_KEY_ENV: &str = "GOOGLE_PLACES_API_KEY";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub places: PlacesConfig,
    #[serde(default)]
    pub collection: CollectionConfig,
    #[serde(default)]
    pub accounts: Vec<AccountSeed>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Máximo de leads devolvidos na listagem do usuário.
    #[serde(default = "default_list_limit")]
    pub list_limit: usize,
    /// Plano mínimo para acessar as rotas `/crm`.
    #[serde(default = "default_minimum_tier")]
    pub minimum_tier: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            list_limit: default_list_limit(),
            minimum_tier: default_minimum_tier(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PlacesConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_search_url")]
    pub search_url: String,
    #[serde(default = "default_details_url")]
    pub details_url: String,
    #[serde(default = "default_geocode_url")]
    pub geocode_url: String,
    #[serde(default = "default_language_code")]
    pub language_code: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for PlacesConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            search_url: default_search_url(),
            details_url: default_details_url(),
            geocode_url: default_geocode_url(),
            language_code: default_language_code(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CollectionConfig {
    #[serde(default = "default_max_results")]
    pub max_results: usize,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_page_delay_ms")]
    pub page_delay_ms: u64,
    #[serde(default = "default_detail_delay_ms")]
    pub detail_delay_ms: u64,
    #[serde(default = "default_max_concurrent_batches")]
    pub max_concurrent_batches: usize,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            max_results: default_max_results(),
            page_size: default_page_size(),
            page_delay_ms: default_page_delay_ms(),
            detail_delay_ms: default_detail_delay_ms(),
            max_concurrent_batches: default_max_concurrent_batches(),
        }
    }
}

/// Acesso pré-cadastrado no arquivo de configuração.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountSeed {
    pub user_id: UserId,
    pub tier: String,
    #[serde(default = "default_account_status")]
    pub status: AccessStatus,
    pub monthly_limit: u32,
}

impl AccountSeed {
    pub fn to_access_record(&self) -> AccessRecord {
        let mut record = AccessRecord::new(self.user_id, &self.tier, self.monthly_limit);
        record.status = self.status;
        record
    }
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}
fn default_list_limit() -> usize {
    500
}
fn default_minimum_tier() -> String {
    "basico".to_string()
}
fn default_search_url() -> String {
    "https://places.googleapis.com/v1/places:searchText".to_string()
}
fn default_details_url() -> String {
    "https://places.googleapis.com/v1/places".to_string()
}
fn default_geocode_url() -> String {
    "https://maps.googleapis.com/maps/api/geocode/json".to_string()
}
fn default_language_code() -> String {
    "pt-BR".to_string()
}
fn default_timeout_seconds() -> u64 {
    15
}
fn default_max_results() -> usize {
    60
}
fn default_page_size() -> usize {
    20
}
fn default_page_delay_ms() -> u64 {
    2000
}
fn default_detail_delay_ms() -> u64 {
    200
}
fn default_max_concurrent_batches() -> usize {
    4
}
fn default_account_status() -> AccessStatus {
    AccessStatus::Active
}

fn env_placeholder() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid placeholder regex"))
}

impl AppConfig {
    /// Carrega a configuração de um arquivo TOML
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(LeadError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// Interpreta a configuração a partir de uma string TOML
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content);

        let mut config: AppConfig =
            toml::from_str(&processed_content).map_err(|e| LeadError::ConfigValidationError {
                field: "toml_parsing".to_string(),
                message: format!("TOML parsing error: {}", e),
            })?;
        config.apply_env_fallbacks();
        Ok(config)
    }

    /// Configuração padrão, com a chave da API vinda do ambiente.
    pub fn from_env() -> Self {
        let mut config = AppConfig::default();
        config.apply_env_fallbacks();
        config
    }

    /// Substitui variáveis de ambiente (ex.: ${GOOGLE_PLACES_API_KEY}).
    /// Variáveis ausentes ficam como estão.
    fn substitute_env_vars(content: &str) -> String {
        env_placeholder()
            .replace_all(content, |caps: &regex::Captures| {
                let var_name = &caps[1];
                std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
            })
            .to_string()
    }

    fn apply_env_fallbacks(&mut self) {
        let unresolved = env_placeholder().is_match(&self.places.api_key);
        if self.places.api_key.is_empty() || unresolved {
            self.places.api_key = std::env::var(API_KEY_ENV).unwrap_or_default();
        }
    }

    pub fn access_records(&self) -> Vec<AccessRecord> {
        self.accounts.iter().map(AccountSeed::to_access_record).collect()
    }
}

impl Validate for AppConfig {
    fn validate(&self) -> Result<()> {
        validate_socket_addr("server.bind", &self.server.bind)?;
        validate_positive_number("server.list_limit", self.server.list_limit, 1)?;
        if tier_level(&self.server.minimum_tier) == 0 {
            return Err(LeadError::InvalidConfigValueError {
                field: "server.minimum_tier".to_string(),
                value: self.server.minimum_tier.clone(),
                reason: "use basico, profissional ou enterprise".to_string(),
            });
        }

        validate_url("places.search_url", &self.places.search_url)?;
        validate_url("places.details_url", &self.places.details_url)?;
        validate_url("places.geocode_url", &self.places.geocode_url)?;
        validate_non_empty_string("places.language_code", &self.places.language_code)?;
        validate_range("places.timeout_seconds", self.places.timeout_seconds, 1, 120)?;

        validate_positive_number("collection.max_results", self.collection.max_results, 1)?;
        validate_range("collection.page_size", self.collection.page_size, 1, 20)?;
        validate_positive_number(
            "collection.max_concurrent_batches",
            self.collection.max_concurrent_batches,
            1,
        )?;

        for account in &self.accounts {
            validate_non_empty_string("accounts.tier", &account.tier)?;
        }
        Ok(())
    }
}

impl ConfigProvider for AppConfig {
    fn api_key(&self) -> &str {
        &self.places.api_key
    }

    fn search_endpoint(&self) -> &str {
        &self.places.search_url
    }

    fn details_endpoint(&self) -> &str {
        &self.places.details_url
    }

    fn geocode_endpoint(&self) -> &str {
        &self.places.geocode_url
    }

    fn language_code(&self) -> &str {
        &self.places.language_code
    }

    fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.places.timeout_seconds)
    }

    fn max_results(&self) -> usize {
        self.collection.max_results
    }

    fn page_size(&self) -> usize {
        self.collection.page_size
    }

    fn page_delay(&self) -> Duration {
        Duration::from_millis(self.collection.page_delay_ms)
    }

    fn detail_delay(&self) -> Duration {
        Duration::from_millis(self.collection.detail_delay_ms)
    }

    fn max_concurrent_batches(&self) -> usize {
        self.collection.max_concurrent_batches
    }
}
