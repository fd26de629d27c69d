use thiserror::Error;

#[derive(Error, Debug)]
pub enum LeadError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration validation failed for '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value for '{field}' ({value}): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Places provider returned HTTP {status}: {message}")]
    ProviderError { status: u16, message: String },

    #[error("Geocoding failed for address: {address}")]
    GeocodingError { address: String },

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: u64 },

    #[error("Access denied: {reason}")]
    AccessDenied { reason: String },

    #[error("Monthly lead quota exhausted for user {user_id}")]
    QuotaExhausted { user_id: u64 },

    #[error("Lead {place_id} already collected in batch {batch_id}")]
    DuplicateLead { batch_id: u64, place_id: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Configuration,
    Network,
    Provider,
    Data,
    Access,
    Quota,
    NotFound,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl LeadError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            LeadError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            LeadError::InvalidConfigValueError { .. }
            | LeadError::CsvError(_)
            | LeadError::DuplicateLead { .. }
            | LeadError::ProcessingError { .. } => ErrorCategory::Data,
            LeadError::ApiError(_) => ErrorCategory::Network,
            LeadError::ProviderError { .. } | LeadError::GeocodingError { .. } => {
                ErrorCategory::Provider
            }
            LeadError::NotFound { .. } => ErrorCategory::NotFound,
            LeadError::AccessDenied { .. } => ErrorCategory::Access,
            LeadError::QuotaExhausted { .. } => ErrorCategory::Quota,
            LeadError::ZipError(_) | LeadError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            LeadError::DuplicateLead { .. } | LeadError::QuotaExhausted { .. } => {
                ErrorSeverity::Low
            }
            LeadError::ApiError(_)
            | LeadError::ProviderError { .. }
            | LeadError::GeocodingError { .. }
            | LeadError::NotFound { .. }
            | LeadError::AccessDenied { .. } => ErrorSeverity::Medium,
            LeadError::ConfigValidationError { .. }
            | LeadError::InvalidConfigValueError { .. }
            | LeadError::CsvError(_)
            | LeadError::ProcessingError { .. } => ErrorSeverity::High,
            LeadError::ZipError(_) | LeadError::IoError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Configuration => {
                "Revise o arquivo de configuração e as variáveis de ambiente (ex.: GOOGLE_PLACES_API_KEY)."
            }
            ErrorCategory::Network => "Verifique a conexão com a internet e tente novamente.",
            ErrorCategory::Provider => {
                "Confira a chave da API do Google e os critérios de busca (cidade, bairro)."
            }
            ErrorCategory::Data => "Corrija os dados informados e tente novamente.",
            ErrorCategory::Access => "Adquira ou regularize um plano para continuar.",
            ErrorCategory::Quota => "Aguarde a virada do mês ou faça upgrade do plano.",
            ErrorCategory::NotFound => "Confira o identificador informado.",
            ErrorCategory::System => "Verifique permissões e espaço em disco.",
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            LeadError::InvalidConfigValueError { field, reason, .. } => {
                format!("Valor inválido em '{}': {}", field, reason)
            }
            LeadError::GeocodingError { address } => {
                format!("Não foi possível geocodificar: {}", address)
            }
            LeadError::NotFound { entity, id } => format!("{} #{} não encontrado(a).", entity, id),
            LeadError::AccessDenied { reason } => reason.clone(),
            LeadError::QuotaExhausted { .. } => {
                "Você atingiu o limite de leads deste mês.".to_string()
            }
            LeadError::DuplicateLead { place_id, .. } => {
                format!("Lead {} já coletado nesta coleta.", place_id)
            }
            LeadError::ApiError(_) | LeadError::ProviderError { .. } => {
                "Falha ao consultar o serviço de busca de locais.".to_string()
            }
            other => format!("Erro interno: {}", other),
        }
    }
}

pub type Result<T> = std::result::Result<T, LeadError>;
