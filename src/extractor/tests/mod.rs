use chrono::{NaiveDate, TimeZone, Utc};
use std::fs;

use crate::extractor::errors::ExtractError;
use crate::extractor::fields::ADDRESS_UNAVAILABLE;
use crate::extractor::model::{PharmacyRecord, ScrapeResult};
use crate::extractor::{ExtractOptions, Strategy, extract};

const SOURCE_URL: &str = "https://www.pharmaciens.tg/on-call";

fn options(strategy: Strategy) -> ExtractOptions {
    ExtractOptions {
        strategy,
        source_url: SOURCE_URL.to_string(),
        today: NaiveDate::from_ymd_opt(2025, 6, 18).unwrap(),
        fetched_at: Utc.with_ymd_and_hms(2025, 6, 18, 7, 30, 0).unwrap(),
    }
}

fn fixture(name: &str) -> String {
    fs::read_to_string(format!("src/extractor/tests/fixtures/{name}"))
        .expect("Failed to read test fixture")
}

fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn find<'a>(result: &'a ScrapeResult, id: &str) -> &'a PharmacyRecord {
    result
        .zones
        .iter()
        .flat_map(|zone| zone.pharmacies.iter())
        .find(|pharmacy| pharmacy.id == id)
        .unwrap_or_else(|| panic!("pharmacy {id} not extracted"))
}

#[test]
fn test_minimal_listing() {
    let html = "<html><body><main>\
        <p>SEMAINE DU 3 MARS AU 9 MARS 2025</p>\
        <p>ZONE A: CENTRE VILLE</p>\
        <p>Pharmacie Centrale: Rue du Commerce, Tél: 90 12 34 56</p>\
        </main></body></html>";

    let result = extract(html, &options(Strategy::Auto)).unwrap();

    assert_eq!(result.metadata.week_start, ymd(2025, 3, 3));
    assert_eq!(result.metadata.week_end, ymd(2025, 3, 9));
    assert_eq!(result.metadata.source_url, SOURCE_URL);
    assert_eq!(result.zones.len(), 1);

    let zone = &result.zones[0];
    assert_eq!(zone.header.zone_id, "A");
    assert_eq!(zone.header.zone_code, "ZONE A");
    assert_eq!(zone.header.zone_name, "CENTRE VILLE");
    assert_eq!(zone.header.city, "Lomé");

    let pharmacy = &zone.pharmacies[0];
    assert_eq!(pharmacy.id, "pharm_pharmacie_centrale_a");
    assert_eq!(pharmacy.name, "Pharmacie Centrale");
    assert_eq!(pharmacy.address, "Rue du Commerce");
    assert_eq!(pharmacy.phone, "+22890123456");
    assert_eq!(pharmacy.phone_formatted, "+228 90 12 34 56");
    assert!(pharmacy.insurances.is_empty());
    assert!(!pharmacy.is_24h);
}

#[test]
fn test_extract_line_fixture() {
    let result = extract(&fixture("lines.html"), &options(Strategy::Lines)).unwrap();

    let zone_ids: Vec<&str> = result
        .zones
        .iter()
        .map(|zone| zone.header.zone_id.as_str())
        .collect();
    assert_eq!(zone_ids, vec!["A", "B", "KARA", "SOKODE"]);
    assert_eq!(result.pharmacy_count(), 5);

    // the second "PHARMACIE CENTRALE" in zone A is a duplicate
    assert_eq!(result.zones[0].pharmacies.len(), 2);
    assert_eq!(
        find(&result, "pharm_pharmacie_centrale_a").address,
        "Rue du Commerce"
    );

    let market = find(&result, "pharm_pharmacie_du_grand_marche_a");
    assert_eq!(market.address, "Face au grand marché");
    assert_eq!(market.phone, "+22822214567");
    assert_eq!(market.phone_formatted, "+228 22 21 45 67 / +228 90 00 11 22");
    assert_eq!(market.insurances, vec!["Amu", "Cnss", "Inam"]);

    let night = find(&result, "pharm_pharmacie_de_la_paix_24h_b");
    assert_eq!(night.name, "Pharmacie De La Paix 24H");
    assert!(night.is_24h);
    assert_eq!(night.phone, "+22891234567");

    let sokode = find(&result, "pharm_pharmacie_tchaoudjo_sokode");
    assert_eq!(sokode.address, ADDRESS_UNAVAILABLE);
    assert_eq!(sokode.insurances, vec!["Gta-C2A", "Sanlam"]);
    assert_eq!(sokode.phone, "");
}

#[test]
fn test_line_fixture_cities() {
    let result = extract(&fixture("lines.html"), &options(Strategy::Auto)).unwrap();

    let cities: Vec<(&str, usize)> = result
        .cities
        .iter()
        .map(|city| (city.name.as_str(), city.pharmacy_count))
        .collect();
    assert_eq!(cities, vec![("Lomé", 3), ("Kara", 1), ("Sokodé", 1)]);
    assert_eq!(result.cities[0].zones, vec!["A", "B"]);
}

#[test]
fn test_extract_tag_fixture() {
    let result = extract(&fixture("tags.html"), &options(Strategy::Tags)).unwrap();

    assert_eq!(result.metadata.week_start, ymd(2025, 3, 10));
    assert_eq!(result.metadata.week_end, ymd(2025, 3, 16));
    assert_eq!(result.zones.len(), 2);
    assert_eq!(result.zones[0].header.zone_id, "1");
    assert_eq!(result.zones[0].header.zone_name, "TOKOIN");
    assert_eq!(result.zones[1].header.city, "Kpalimé");

    let espoir = find(&result, "pharm_pharmacie_espoir_1");
    assert_eq!(espoir.address, "Tokoin Hôpital");
    assert_eq!(espoir.phone, "+22822210000");

    let famille = find(&result, "pharm_pharmacie_sainte_famille_1");
    assert_eq!(famille.address, "Tokoin Wuiti");
    assert_eq!(famille.phone_formatted, "+228 90 90 90 90");
    assert_eq!(famille.insurances, vec!["Nsia", "Sunu"]);

    let agou = find(&result, "pharm_pharmacie_du_mont_agou_kpalime");
    assert_eq!(agou.address, "Route de Kloto");
}

#[test]
fn test_auto_falls_back_to_tags() {
    let html = fixture("tags.html");
    let auto = extract(&html, &options(Strategy::Auto)).unwrap();
    let tags = extract(&html, &options(Strategy::Tags)).unwrap();
    assert_eq!(auto, tags);

    // line detection alone never sees a zone on this layout
    assert!(matches!(
        extract(&html, &options(Strategy::Lines)),
        Err(ExtractError::NoPharmacies)
    ));
}

#[test]
fn test_garbled_page_fails() {
    let result = extract(&fixture("garbled.html"), &options(Strategy::Auto));
    assert!(matches!(result, Err(ExtractError::NoPharmacies)));
}

#[test]
fn test_empty_input_fails() {
    assert!(extract("", &options(Strategy::Auto)).is_err());
    assert!(extract("<html><body></body></html>", &options(Strategy::Lines)).is_err());
}

#[test]
fn test_missing_week_uses_calendar_week() {
    let html = "<body><p>KARA</p><p>Pharmacie du Nord</p></body>";
    let result = extract(html, &options(Strategy::Lines)).unwrap();

    // 2025-06-18 is a Wednesday
    assert_eq!(result.metadata.week_start, ymd(2025, 6, 16));
    assert_eq!(result.metadata.week_end, ymd(2025, 6, 22));
}

#[test]
fn test_week_in_script_is_ignored() {
    let html = "<html><head><script>var old = 'SEMAINE DU 1 JANVIER AU 7 JANVIER 2020';</script></head>\
        <body><header><p>SEMAINE DU 3 MARS AU 9 MARS 2025</p></header><main>\
        <p>ZONE A: CENTRE VILLE</p>\
        <p>Pharmacie Centrale: Rue du Commerce</p>\
        </main></body></html>";

    let result = extract(html, &options(Strategy::Lines)).unwrap();
    assert_eq!(result.metadata.week_start, ymd(2025, 3, 3));
    assert_eq!(result.metadata.week_end, ymd(2025, 3, 9));
}

#[test]
fn test_name_line_with_phone_label() {
    let html = "<html><body><main>\
        <p>ZONE A: CENTRE VILLE</p>\
        <p>Pharmacie du Lac Tél: 90 12 34 56</p>\
        </main></body></html>";

    let result = extract(html, &options(Strategy::Lines)).unwrap();
    let pharmacy = find(&result, "pharm_pharmacie_du_lac_a");
    assert_eq!(pharmacy.name, "Pharmacie du Lac");
    assert_eq!(pharmacy.phone, "+22890123456");
    assert_eq!(pharmacy.address, ADDRESS_UNAVAILABLE);
}

#[test]
fn test_week_crossing_new_year() {
    let html = "<body><p>SEMAINE DU 29 DÉCEMBRE AU 4 JANVIER 2025</p>\
        <p>KARA</p><p>Pharmacie du Nord</p></body>";
    let result = extract(html, &options(Strategy::Lines)).unwrap();

    assert_eq!(result.metadata.week_start, ymd(2025, 12, 29));
    assert_eq!(result.metadata.week_end, ymd(2026, 1, 4));
}

#[test]
fn test_document_serializes_with_flat_zone_fields() {
    let result = extract(&fixture("lines.html"), &options(Strategy::Lines)).unwrap();
    let json = serde_json::to_value(&result).unwrap();

    assert_eq!(json["metadata"]["week_start"], "2025-03-03");
    assert_eq!(json["metadata"]["source_url"], SOURCE_URL);
    assert_eq!(json["zones"][0]["zone_id"], "A");
    assert_eq!(json["zones"][0]["city"], "Lomé");
    assert!(json["zones"][0]["pharmacies"][0]["coordinates"]["latitude"].is_null());
    assert_eq!(json["cities"][1]["name"], "Kara");
}

#[test]
fn test_strategy_parsing() {
    assert_eq!("auto".parse::<Strategy>().unwrap(), Strategy::Auto);
    assert_eq!(" Tags ".parse::<Strategy>().unwrap(), Strategy::Tags);
    assert_eq!("lines".parse::<Strategy>().unwrap(), Strategy::Lines);
    assert!("regex".parse::<Strategy>().is_err());
    assert_eq!(Strategy::default().to_string(), "auto");
}

#[cfg(feature = "fuzz")]
mod properties {
    use proptest::prelude::*;

    use super::options;
    use crate::extractor::fields::normalize_phone;
    use crate::extractor::{Strategy, extract};

    proptest! {
        #[test]
        fn extract_never_panics(html in ".{0,400}") {
            let _ = extract(&html, &options(Strategy::Auto));
        }

        #[test]
        fn extract_never_panics_on_listing_shapes(
            lines in prop::collection::vec(
                prop_oneof![
                    Just("ZONE A: CENTRE".to_string()),
                    Just("KARA".to_string()),
                    Just("INTERIEUR DU PAYS".to_string()),
                    "Pharmacie [a-zé ]{1,20}(: [a-z ,0-9]{0,30})?",
                    "Tél: [0-9 ]{8,14}",
                    "Assurances: (AMU|INAM|CNSS|SUNU)(, (AMU|INAM|CNSS|SUNU)){0,3}",
                    "[A-Za-z ]{0,30}",
                ],
                0..30,
            )
        ) {
            let html = lines
                .iter()
                .map(|line| format!("<p>{line}</p>"))
                .collect::<String>();
            if let Ok(result) = extract(&format!("<body>{html}</body>"), &options(Strategy::Auto)) {
                prop_assert!(result.pharmacy_count() > 0);
                prop_assert!(result.zones.iter().all(|zone| !zone.pharmacies.is_empty()));
            }
        }

        #[test]
        fn phone_normalization_is_idempotent(digits in "[0-9]{8}") {
            let once = normalize_phone(&digits);
            let twice = normalize_phone(&once.compact);
            prop_assert_eq!(once, twice);
        }
    }
}
