use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::Result;

/// Trailing window for the price-drop signal (days).
pub const PRICE_DROP_WINDOW_DAYS: i64 = 30;

/// A `missing` event older than this counts as relist evidence (days).
pub const RELIST_MISSING_MIN_DAYS: i64 = 7;

/// Number of condensed alert records, independent of the configurable top-K.
pub const ALERT_COUNT: usize = 10;

/// Scoring weights. Tunable constants, kept named rather than inlined.
pub mod weights {
    /// Multiplier on the gap below assessed value (gap is a 0..1 ratio).
    pub const BELOW_ASSESSED: f64 = 220.0;
    /// Multiplier on the 30-day price-drop ratio.
    pub const PRICE_DROP: f64 = 140.0;
    /// Multiplier on the capped days-on-market ratio.
    pub const LONG_DOM: f64 = 60.0;
    /// Cap on dom/threshold before the LONG_DOM multiplier applies.
    pub const LONG_DOM_CAP: f64 = 2.0;
    /// Base points when any motivated-seller keyword matches.
    pub const KEYWORD_BASE: f64 = 20.0;
    /// Points per keyword hit, up to KEYWORD_HIT_CAP hits.
    pub const KEYWORD_PER_HIT: f64 = 6.0;
    pub const KEYWORD_HIT_CAP: usize = 3;
    /// Flat bonus when relist is detected.
    pub const RELIST: f64 = 10.0;
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalSettings {
    pub below_assessed_ratio: f64,
    pub price_drop_ratio_30d: f64,
    pub dom_days: i64,
    /// Case-insensitive substring matches.
    pub motivated_keywords_en: Vec<String>,
    /// Exact substring matches (non-Latin script, case-sensitive).
    pub motivated_keywords_zh: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LimitSettings {
    pub max_search_pages: usize,
    pub max_detail_pages: usize,
    pub min_delay_seconds: f64,
    pub max_delay_seconds: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub target_cities: Vec<String>,
    pub run_frequency: String,
    pub limits: LimitSettings,
    pub signals: SignalSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            target_cities: vec![
                "Vancouver".to_string(),
                "Burnaby".to_string(),
                "Richmond".to_string(),
            ],
            run_frequency: "daily".to_string(),
            limits: LimitSettings {
                max_search_pages: 2,
                max_detail_pages: 40,
                min_delay_seconds: 2.5,
                max_delay_seconds: 5.0,
            },
            signals: SignalSettings {
                below_assessed_ratio: 0.95,
                price_drop_ratio_30d: 0.05,
                dom_days: 45,
                motivated_keywords_en: vec![
                    "priced to sell".to_string(),
                    "motivated".to_string(),
                    "must sell".to_string(),
                    "bring your offer".to_string(),
                ],
                motivated_keywords_zh: vec![
                    "急售".to_string(),
                    "诚意卖".to_string(),
                    "降价".to_string(),
                    "低于评估".to_string(),
                ],
            },
        }
    }
}

impl Settings {
    /// Compiled defaults, optionally deep-merged under a JSON settings file.
    /// A missing file is not an error; a malformed one is.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let base = serde_json::to_value(Settings::default())?;
        let merged = match path {
            Some(p) if p.exists() => {
                let raw = std::fs::read_to_string(p)?;
                let overrides: Value = serde_json::from_str(&raw)?;
                deep_merge(&base, &overrides)
            }
            _ => base,
        };
        Ok(serde_json::from_value(merged)?)
    }
}

/// Pure recursive merge of `override_` over `base`: objects combine key by
/// key, everything else in `override_` replaces the base value. Neither
/// input is mutated.
pub fn deep_merge(base: &Value, override_: &Value) -> Value {
    match (base, override_) {
        (Value::Object(b), Value::Object(o)) => {
            let mut out = b.clone();
            for (k, v) in o {
                let merged = match b.get(k) {
                    Some(existing) => deep_merge(existing, v),
                    None => v.clone(),
                };
                out.insert(k.clone(), merged);
            }
            Value::Object(out)
        }
        _ => override_.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deep_merge_combines_nested_objects() {
        let base = json!({"a": {"x": 1, "y": 2}, "b": 3});
        let over = json!({"a": {"y": 20, "z": 30}});
        let merged = deep_merge(&base, &over);
        assert_eq!(merged, json!({"a": {"x": 1, "y": 20, "z": 30}, "b": 3}));
    }

    #[test]
    fn deep_merge_overwrites_scalars_and_arrays() {
        let base = json!({"cities": ["Vancouver"], "k": 1});
        let over = json!({"cities": ["Surrey", "Burnaby"], "k": 2});
        let merged = deep_merge(&base, &over);
        assert_eq!(merged["cities"], json!(["Surrey", "Burnaby"]));
        assert_eq!(merged["k"], json!(2));
    }

    #[test]
    fn deep_merge_does_not_mutate_inputs() {
        let base = json!({"a": {"x": 1}});
        let over = json!({"a": {"x": 2}});
        let base_before = base.clone();
        let over_before = over.clone();
        let _ = deep_merge(&base, &over);
        assert_eq!(base, base_before);
        assert_eq!(over, over_before);
    }

    #[test]
    fn settings_overrides_apply_over_defaults() {
        let base = serde_json::to_value(Settings::default()).unwrap();
        let over = json!({"signals": {"dom_days": 60}, "run_frequency": "weekly"});
        let merged: Settings = serde_json::from_value(deep_merge(&base, &over)).unwrap();
        assert_eq!(merged.signals.dom_days, 60);
        assert_eq!(merged.run_frequency, "weekly");
        // untouched defaults survive
        assert!((merged.signals.below_assessed_ratio - 0.95).abs() < 1e-9);
        assert_eq!(merged.target_cities.len(), 3);
    }
}
