use crate::core::{ConfigProvider, PlacesProvider};
use crate::domain::places::{Circle, Coordinates, PlaceDetails, PlaceSummary, TextSearch};
use crate::utils::error::{LeadError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

const SEARCH_FIELD_MASK: &str = "places.id,places.displayName,nextPageToken";
const DETAILS_FIELD_MASK: &str =
    "displayName,formattedAddress,nationalPhoneNumber,websiteUri,rating,userRatingCount";
const GEOCODE_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SearchTextRequest<'a> {
    text_query: &'a str,
    language_code: &'a str,
    max_result_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    location_restriction: Option<LocationRestriction>,
    #[serde(skip_serializing_if = "Option::is_none")]
    page_token: Option<&'a str>,
}

#[derive(Debug, Serialize)]
struct LocationRestriction {
    circle: CircleBody,
}

#[derive(Debug, Serialize)]
struct CircleBody {
    center: LatLng,
    radius: f64,
}

#[derive(Debug, Serialize)]
struct LatLng {
    latitude: f64,
    longitude: f64,
}

impl From<&Circle> for LocationRestriction {
    fn from(circle: &Circle) -> Self {
        Self {
            circle: CircleBody {
                center: LatLng {
                    latitude: circle.center.lat,
                    longitude: circle.center.lng,
                },
                radius: circle.radius_meters,
            },
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchTextResponse {
    #[serde(default)]
    places: Vec<PlaceSummary>,
    #[serde(default)]
    next_page_token: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    #[serde(default)]
    status: String,
    #[serde(default)]
    results: Vec<GeocodeResult>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: GeocodeGeometry,
}

#[derive(Debug, Deserialize)]
struct GeocodeGeometry {
    location: Coordinates,
}

/// Cliente da Google Places API (New) e da Geocoding API.
pub struct GooglePlacesClient {
    client: Client,
    api_key: String,
    search_url: String,
    details_url: String,
    geocode_url: String,
    language_code: String,
    max_results: usize,
    page_size: usize,
    page_delay: Duration,
}

impl GooglePlacesClient {
    pub fn new<C: ConfigProvider>(config: &C) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            client,
            api_key: config.api_key().to_string(),
            search_url: config.search_endpoint().to_string(),
            details_url: config.details_endpoint().trim_end_matches('/').to_string(),
            geocode_url: config.geocode_endpoint().to_string(),
            language_code: config.language_code().to_string(),
            max_results: config.max_results(),
            page_size: config.page_size(),
            page_delay: config.page_delay(),
        })
    }

    fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// O id pode vir como "places/ChIJ..."; o endpoint de detalhes só aceita "ChIJ...".
    pub fn clean_place_id(place_id: &str) -> &str {
        place_id.strip_prefix("places/").unwrap_or(place_id)
    }

    async fn fetch_page(
        &self,
        search: &TextSearch,
        page_token: Option<&str>,
    ) -> Result<SearchTextResponse> {
        let payload = SearchTextRequest {
            text_query: &search.text_query,
            language_code: &self.language_code,
            max_result_count: self.page_size,
            location_restriction: search.restriction.as_ref().map(LocationRestriction::from),
            page_token,
        };

        let response = self
            .client
            .post(&self.search_url)
            .header("X-Goog-Api-Key", &self.api_key)
            .header("X-Goog-FieldMask", SEARCH_FIELD_MASK)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(LeadError::ProviderError {
                status: status.as_u16(),
                message: body,
            });
        }

        Ok(response.json::<SearchTextResponse>().await?)
    }
}

#[async_trait]
impl PlacesProvider for GooglePlacesClient {
    async fn geocode(&self, address: &str) -> Result<Option<Coordinates>> {
        if !self.has_api_key() {
            tracing::error!("❌ GOOGLE_PLACES_API_KEY is not configured");
            return Ok(None);
        }

        tracing::debug!("Geocoding address: {}", address);
        let response = self
            .client
            .get(&self.geocode_url)
            .query(&[("address", address), ("key", self.api_key.as_str())])
            .timeout(GEOCODE_TIMEOUT)
            .send()
            .await?;

        let data: GeocodeResponse = response.json().await?;
        if data.status == "OK" {
            if let Some(first) = data.results.first() {
                return Ok(Some(first.geometry.location));
            }
        }

        tracing::warn!("⚠️ Geocoding API status: {}", data.status);
        Ok(None)
    }

    async fn search_text(&self, search: &TextSearch) -> Result<Vec<PlaceSummary>> {
        if !self.has_api_key() {
            tracing::error!("❌ GOOGLE_PLACES_API_KEY is not configured");
            return Ok(Vec::new());
        }

        let mut all_places: Vec<PlaceSummary> = Vec::new();
        let mut next_token: Option<String> = None;
        let mut page = 0usize;
        let max_pages = self.max_results.div_ceil(self.page_size.max(1));

        while all_places.len() < self.max_results && page < max_pages {
            page += 1;
            tracing::debug!(
                "📡 Places searchText page {} for '{}' ({} so far)",
                page,
                search.text_query,
                all_places.len()
            );

            // Falha de página interrompe a paginação; o que já veio é mantido
            let data = match self.fetch_page(search, next_token.as_deref()).await {
                Ok(data) => data,
                Err(e) => {
                    tracing::warn!("⚠️ Places API error on page {}: {}", page, e);
                    break;
                }
            };

            let added = data.places.len();
            all_places.extend(data.places);
            next_token = data.next_page_token.filter(|token| !token.is_empty());

            // Página vazia encerra a busca mesmo com token
            if next_token.is_none() || added == 0 {
                break;
            }
            if all_places.len() < self.max_results && !self.page_delay.is_zero() {
                tokio::time::sleep(self.page_delay).await;
            }
        }

        all_places.truncate(self.max_results);
        tracing::info!(
            "🔎 Places search '{}' returned {} results in {} page(s)",
            search.text_query,
            all_places.len(),
            page
        );
        Ok(all_places)
    }

    async fn place_details(&self, place_id: &str) -> Result<Option<PlaceDetails>> {
        if !self.has_api_key() {
            return Ok(None);
        }

        let url = format!("{}/{}", self.details_url, Self::clean_place_id(place_id));
        let response = self
            .client
            .get(&url)
            .header("X-Goog-Api-Key", &self.api_key)
            .header("X-Goog-FieldMask", DETAILS_FIELD_MASK)
            .query(&[("languageCode", self.language_code.as_str())])
            .send()
            .await?;

        if !response.status().is_success() {
            tracing::debug!(
                "Place details for {} returned HTTP {}",
                place_id,
                response.status()
            );
            return Ok(None);
        }

        Ok(Some(response.json::<PlaceDetails>().await?))
    }
}
