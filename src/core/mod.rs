pub mod collector;
pub mod engine;
pub mod export;

pub use crate::domain::model::{AccessRecord, Batch, BatchStatus, Lead, NewLead, SearchCriteria};
pub use crate::domain::ports::{ConfigProvider, LeadRepository, PlacesProvider, Storage};
pub use crate::utils::error::Result;
