use chrono::{DateTime, Datelike, Utc};
use sha2::{Digest, Sha256};

use crate::config::Settings;
use crate::signature::stable_id;
use crate::types::ListingSnapshot;

const PROPERTY_TYPES: [&str; 4] = ["Condo", "Townhouse", "Detached", "1/2 Duplex"];

/// Deterministic pseudo-random value in [0, bound) derived from a digest,
/// so the same day always produces the same demo batch.
fn derived(seed: u64, index: usize, salt: &str, bound: u64) -> u64 {
    let digest = Sha256::digest(format!("{seed}|{index}|{salt}").as_bytes());
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_be_bytes(bytes) % bound.max(1)
}

fn base_price_for(city: &str) -> i64 {
    match city {
        "Vancouver" => 1_100_000,
        "Burnaby" => 950_000,
        "Richmond" => 980_000,
        "Surrey" => 780_000,
        "Coquitlam" => 820_000,
        "North Vancouver" => 1_050_000,
        _ => 900_000,
    }
}

/// Generates a reproducible demo batch for the given day, spread across the
/// configured target cities and property types. A slice of listings carries
/// motivated-seller phrases so the keyword signal has something to find.
pub fn generate_demo_listings(settings: &Settings, n: usize, now: DateTime<Utc>) -> Vec<ListingSnapshot> {
    let cities = if settings.target_cities.is_empty() {
        Settings::default().target_cities
    } else {
        settings.target_cities.clone()
    };
    let seed = now.date_naive().num_days_from_ce() as u64;

    let mut out = Vec::with_capacity(n);
    for i in 0..n {
        let city = &cities[i % cities.len()];
        let ptype = PROPERTY_TYPES[i % PROPERTY_TYPES.len()];
        let beds = 1.0 + derived(seed, i, "beds", 5) as f64;
        let baths = 1.0 + derived(seed, i, "baths", 5) as f64 * 0.5;
        let sqft = 450 + derived(seed, i, "sqft", 2751) as i64;

        let mut base_price = base_price_for(city);
        base_price = match ptype {
            "Condo" => (base_price as f64 * 0.72) as i64,
            "Townhouse" => (base_price as f64 * 0.86) as i64,
            _ => base_price,
        };

        // drift in [0.78, 1.22), assessed in [0.90, 1.15) of price
        let drift = 0.78 + derived(seed, i, "drift", 4400) as f64 / 10_000.0;
        let price = (base_price as f64 * drift) as i64;
        let assessed = (price as f64 * (0.90 + derived(seed, i, "assessed", 2500) as f64 / 10_000.0)) as i64;

        let mut desc_parts = vec![
            "Bright layout, great location.",
            "Walkable to transit and shopping.",
            "Move-in ready.",
        ];
        if derived(seed, i, "kw_en", 100) < 18 {
            desc_parts.push("Priced to sell. Motivated seller!");
        }
        if derived(seed, i, "kw_offer", 100) < 12 {
            desc_parts.push("Bring your offer, must sell.");
        }
        if derived(seed, i, "kw_zh", 100) < 10 {
            desc_parts.push("急售，诚意卖。");
        }

        out.push(ListingSnapshot {
            listing_id: stable_id(&["demo", &i.to_string()]),
            source: "demo".to_string(),
            url: format!("https://example.com/listing/{i}"),
            title: format!("{beds:.0} bd • {ptype} in {city}"),
            address: format!("{} Example St", 100 + i),
            city: city.clone(),
            price,
            beds: Some(beds),
            baths: Some(baths),
            sqft: Some(sqft),
            description: desc_parts.join(" "),
            assessed_value: Some(assessed),
        });
    }
    out
}
