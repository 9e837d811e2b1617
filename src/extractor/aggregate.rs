use std::collections::{HashMap, HashSet};

use tracing::{info, warn};

use crate::extractor::builder::RawPharmacy;
use crate::extractor::errors::{ExtractError, RecordError};
use crate::extractor::fields::{
    ADDRESS_UNAVAILABLE, is_open_24h, slugify, summarize_phones, title_case,
};
use crate::extractor::model::{City, Coordinates, Metadata, PharmacyRecord, ScrapeResult, Zone};
use crate::extractor::zones::ZoneHeader;

/// `pharm_<slug(name)>_<lower(zone_id)>`, stable for a (name, zone) pair.
pub fn pharmacy_id(name: &str, zone_id: &str) -> String {
    format!("pharm_{}_{}", slugify(name), zone_id.to_lowercase())
}

pub fn build_record(raw: &RawPharmacy, zone: &ZoneHeader) -> Result<PharmacyRecord, RecordError> {
    if slugify(&raw.name).is_empty() {
        return Err(RecordError::EmptySlug {
            name: raw.name.clone(),
        });
    }

    let (phone, phone_formatted) = summarize_phones(&raw.phones);
    let address = raw.address.trim();

    let mut insurances = raw.insurances.clone();
    insurances.sort();
    insurances.dedup();

    Ok(PharmacyRecord {
        id: pharmacy_id(&raw.name, &zone.zone_id),
        name: title_case(&raw.name),
        address: if address.is_empty() {
            ADDRESS_UNAVAILABLE.to_string()
        } else {
            address.to_string()
        },
        phone,
        phone_formatted,
        insurances,
        coordinates: Coordinates::default(),
        is_24h: is_open_24h(&raw.name),
    })
}

/// Groups records by zone in first-seen order, keeping the first record
/// for each id. Records that cannot be built are logged and skipped.
pub fn group_zones(raw_pharmacies: Vec<RawPharmacy>) -> Vec<Zone> {
    let mut zones: Vec<Zone> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut seen_ids: HashSet<String> = HashSet::new();

    for raw in raw_pharmacies {
        let record = raw
            .zone
            .as_ref()
            .ok_or_else(|| RecordError::MissingZone {
                name: raw.name.clone(),
            })
            .and_then(|zone| build_record(&raw, zone));

        let record = match record {
            Ok(record) => record,
            Err(err) => {
                warn!(error = %err, "pharmacy skipped");
                continue;
            }
        };

        // zone is present once the record built
        let Some(header) = raw.zone else { continue };

        let zone_key = header.zone_id.clone();
        if !seen_ids.insert(format!("{zone_key}\u{0}{}", record.id)) {
            continue;
        }

        let slot = *index.entry(zone_key).or_insert_with(|| {
            zones.push(Zone {
                header,
                pharmacies: Vec::new(),
            });
            zones.len() - 1
        });
        zones[slot].pharmacies.push(record);
    }

    zones.retain(|zone| !zone.pharmacies.is_empty());
    zones
}

/// Folds zones into per-city zone lists and pharmacy counts, in first-seen order.
pub fn fold_cities(zones: &[Zone]) -> Vec<City> {
    let mut cities: Vec<City> = Vec::new();

    for zone in zones {
        let position = cities
            .iter()
            .position(|city| city.name == zone.header.city);
        let city = match position {
            Some(position) => &mut cities[position],
            None => {
                cities.push(City {
                    name: zone.header.city.clone(),
                    zones: Vec::new(),
                    pharmacy_count: 0,
                });
                let last = cities.len() - 1;
                &mut cities[last]
            }
        };

        if !city.zones.contains(&zone.header.zone_id) {
            city.zones.push(zone.header.zone_id.clone());
        }
        city.pharmacy_count += zone.pharmacies.len();
    }

    cities
}

/// Builds the final document; an empty extraction is an error, never an
/// empty document.
pub fn assemble(
    metadata: Metadata,
    raw_pharmacies: Vec<RawPharmacy>,
) -> Result<ScrapeResult, ExtractError> {
    let zones = group_zones(raw_pharmacies);
    let cities = fold_cities(&zones);
    let result = ScrapeResult {
        metadata,
        zones,
        cities,
    };

    let total = result.pharmacy_count();
    if total == 0 {
        warn!("no pharmacy extracted, the source layout may have changed");
        return Err(ExtractError::NoPharmacies);
    }

    info!(
        zones = result.zones.len(),
        cities = result.cities.len(),
        pharmacies = total,
        "document assembled"
    );
    Ok(result)
}
