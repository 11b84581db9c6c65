use crate::config::ALERT_COUNT;
use crate::types::{AlertRecord, DealRecord, EnrichedListing};

/// Ranks enriched listings by score descending and projects the two output
/// slices: top-K full deal records and the fixed top-10 condensed alerts.
///
/// The sort is stable, so listings with equal scores keep their original
/// batch order.
pub fn rank_outputs(enriched: &[EnrichedListing], top_k: usize) -> (Vec<DealRecord>, Vec<AlertRecord>) {
    let mut ranked: Vec<&EnrichedListing> = enriched.iter().collect();
    ranked.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));

    let deals = ranked.iter().take(top_k).map(|e| DealRecord::from(*e)).collect();
    let alerts = ranked.iter().take(ALERT_COUNT).map(|e| AlertRecord::from(*e)).collect();
    (deals, alerts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ListingSnapshot, SignalFlags};

    fn enriched(id: &str, score: f64) -> EnrichedListing {
        EnrichedListing {
            snapshot: ListingSnapshot {
                listing_id: id.to_string(),
                source: "test".to_string(),
                url: String::new(),
                title: String::new(),
                address: String::new(),
                city: String::new(),
                price: 0,
                beds: None,
                baths: None,
                sqft: None,
                description: String::new(),
                assessed_value: None,
            },
            signature: String::new(),
            dom_days: 0,
            price_drop_30d_ratio: 0.0,
            is_relist: false,
            score,
            reasons: Vec::new(),
            flags: SignalFlags::default(),
        }
    }

    #[test]
    fn sorts_by_score_descending() {
        let input = vec![enriched("low", 1.0), enriched("high", 50.0), enriched("mid", 10.0)];
        let (deals, alerts) = rank_outputs(&input, 50);
        let ids: Vec<&str> = deals.iter().map(|d| d.listing_id.as_str()).collect();
        assert_eq!(ids, vec!["high", "mid", "low"]);
        assert_eq!(alerts[0].listing_id, "high");
    }

    #[test]
    fn ties_keep_batch_order() {
        let input = vec![
            enriched("first", 5.0),
            enriched("second", 5.0),
            enriched("third", 5.0),
        ];
        let (deals, _) = rank_outputs(&input, 50);
        let ids: Vec<&str> = deals.iter().map(|d| d.listing_id.as_str()).collect();
        assert_eq!(ids, vec!["first", "second", "third"]);
    }

    #[test]
    fn top_k_limits_deals_but_alerts_stay_at_ten() {
        let input: Vec<EnrichedListing> =
            (0..30).map(|i| enriched(&format!("l{i}"), i as f64)).collect();
        let (deals, alerts) = rank_outputs(&input, 5);
        assert_eq!(deals.len(), 5);
        assert_eq!(alerts.len(), 10);

        let (deals, alerts) = rank_outputs(&input, 50);
        assert_eq!(deals.len(), 30);
        assert_eq!(alerts.len(), 10);
    }
}
