use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Restrição circular da busca, raio em metros.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Circle {
    pub center: Coordinates,
    pub radius_meters: f64,
}

impl Circle {
    pub fn from_km(center: Coordinates, radius_km: f64) -> Self {
        Self {
            center,
            radius_meters: radius_km * 1000.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextSearch {
    pub text_query: String,
    pub restriction: Option<Circle>,
}

/// Nome do local: objeto localizado (`{"text": ...}`) ou texto simples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DisplayName {
    Localized {
        text: String,
        #[serde(rename = "languageCode", default)]
        language_code: Option<String>,
    },
    Plain(String),
}

impl DisplayName {
    pub fn text(&self) -> &str {
        match self {
            DisplayName::Localized { text, .. } => text,
            DisplayName::Plain(text) => text,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceSummary {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub display_name: Option<DisplayName>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceDetails {
    #[serde(default)]
    pub display_name: Option<DisplayName>,
    #[serde(default)]
    pub formatted_address: Option<String>,
    #[serde(default)]
    pub national_phone_number: Option<String>,
    #[serde(default)]
    pub website_uri: Option<String>,
    #[serde(default)]
    pub rating: Option<f64>,
    #[serde(default)]
    pub user_rating_count: Option<u32>,
}

impl PlaceDetails {
    pub fn name(&self) -> &str {
        self.display_name.as_ref().map(DisplayName::text).unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_name_accepts_object_and_string() {
        let details: PlaceDetails = serde_json::from_value(serde_json::json!({
            "displayName": {"text": "Padaria Central", "languageCode": "pt"},
            "rating": 4.7,
            "userRatingCount": 88
        }))
        .unwrap();
        assert_eq!(details.name(), "Padaria Central");
        assert_eq!(details.user_rating_count, Some(88));

        let details: PlaceDetails = serde_json::from_value(serde_json::json!({
            "displayName": "Padaria Central"
        }))
        .unwrap();
        assert_eq!(details.name(), "Padaria Central");
        assert_eq!(details.rating, None);
    }

    #[test]
    fn test_circle_from_km() {
        let circle = Circle::from_km(Coordinates { lat: -27.4, lng: -48.5 }, 2.5);
        assert_eq!(circle.radius_meters, 2500.0);
    }
}
