// Adaptadores: implementações concretas dos sistemas externos (Places API, repositório).

pub mod places;
pub mod store;

pub use places::GooglePlacesClient;
pub use store::InMemoryStore;
