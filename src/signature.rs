use sha2::{Digest, Sha256};

use crate::types::ListingSnapshot;

fn normalize(text: &str) -> String {
    text.to_lowercase().split_whitespace().collect::<Vec<_>>().join(" ")
}

fn hex_digest(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

/// Stable fingerprint of the physical property behind a listing, used to
/// correlate relists across different listing ids. Deterministic over
/// normalized address + city + beds + baths + sqft.
pub fn signature_for(snapshot: &ListingSnapshot) -> String {
    let parts = [
        normalize(&snapshot.address),
        normalize(&snapshot.city),
        snapshot.beds.map(|b| b.to_string()).unwrap_or_default(),
        snapshot.baths.map(|b| b.to_string()).unwrap_or_default(),
        snapshot.sqft.map(|s| s.to_string()).unwrap_or_default(),
    ];
    hex_digest(&parts.join("||"))
}

pub fn description_hash(description: &str) -> String {
    hex_digest(description)
}

/// Short stable id derived from arbitrary parts, for sources without one.
pub fn stable_id(parts: &[&str]) -> String {
    let mut full = hex_digest(&parts.join("||"));
    full.truncate(16);
    full
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot(address: &str, city: &str, beds: Option<f64>) -> ListingSnapshot {
        ListingSnapshot {
            listing_id: "x".to_string(),
            source: "test".to_string(),
            url: String::new(),
            title: String::new(),
            address: address.to_string(),
            city: city.to_string(),
            price: 0,
            beds,
            baths: Some(2.0),
            sqft: Some(900),
            description: String::new(),
            assessed_value: None,
        }
    }

    #[test]
    fn signature_ignores_case_and_whitespace() {
        let a = snapshot("123  Example   St", "Vancouver", Some(2.0));
        let b = snapshot("123 example st", "  VANCOUVER ", Some(2.0));
        assert_eq!(signature_for(&a), signature_for(&b));
    }

    #[test]
    fn signature_differs_when_physical_attributes_differ() {
        let a = snapshot("123 Example St", "Vancouver", Some(2.0));
        let b = snapshot("123 Example St", "Vancouver", Some(3.0));
        assert_ne!(signature_for(&a), signature_for(&b));
    }

    #[test]
    fn stable_id_is_16_hex_chars() {
        let id = stable_id(&["demo", "42"]);
        assert_eq!(id.len(), 16);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(id, stable_id(&["demo", "42"]));
    }
}
