use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::extractor::zones::ZoneHeader;

/// Geocoding is not performed; both values are always emitted as `null`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PharmacyRecord {
    pub id: String,
    pub name: String,
    pub address: String,
    pub phone: String,
    pub phone_formatted: String,
    pub insurances: Vec<String>,
    pub coordinates: Coordinates,
    pub is_24h: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    #[serde(flatten)]
    pub header: ZoneHeader,
    pub pharmacies: Vec<PharmacyRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct City {
    pub name: String,
    pub zones: Vec<String>,
    pub pharmacy_count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    pub week_start: NaiveDate,
    pub week_end: NaiveDate,
    pub source_url: String,
    pub last_updated: DateTime<Utc>,
}

/// The document written to `pharmacies.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScrapeResult {
    pub metadata: Metadata,
    pub zones: Vec<Zone>,
    pub cities: Vec<City>,
}

impl ScrapeResult {
    pub fn pharmacy_count(&self) -> usize {
        self.zones.iter().map(|zone| zone.pharmacies.len()).sum()
    }
}
