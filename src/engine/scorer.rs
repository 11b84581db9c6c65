use crate::config::{weights, SignalSettings};
use crate::types::SignalFlags;

/// Inputs to one scoring pass: current listing fields plus the signals the
/// calculator derived from history.
#[derive(Debug, Clone, Default)]
pub struct ScoreInput {
    pub price: i64,
    pub assessed_value: Option<i64>,
    pub dom_days: Option<i64>,
    pub price_drop_ratio: f64,
    pub is_relist: bool,
    pub keyword_hits: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct ScoreBreakdown {
    /// Additive score, rounded to 2 decimals.
    pub score: f64,
    /// Human-readable reasons in fixed trigger order.
    pub reasons: Vec<String>,
    pub flags: SignalFlags,
}

/// Motivated-seller keyword matches against a description: the English list
/// matches case-insensitively, the Chinese list by exact substring.
pub fn keyword_hits(text: &str, signals: &SignalSettings) -> Vec<String> {
    let lowered = text.to_lowercase();
    let mut hits = Vec::new();
    for keyword in &signals.motivated_keywords_en {
        if lowered.contains(&keyword.to_lowercase()) {
            hits.push(keyword.clone());
        }
    }
    for keyword in &signals.motivated_keywords_zh {
        if text.contains(keyword.as_str()) {
            hits.push(keyword.clone());
        }
    }
    hits
}

/// Additive deal score. Each term contributes points and a reason string
/// when it triggers; the term order is fixed.
pub fn score_listing(input: &ScoreInput, signals: &SignalSettings) -> ScoreBreakdown {
    let mut score = 0.0;
    let mut reasons = Vec::new();
    let mut flags = SignalFlags::default();

    if let Some(assessed) = input.assessed_value.filter(|&a| a > 0) {
        let ratio = input.price as f64 / assessed as f64;
        let gap = (1.0 - ratio).max(0.0);
        if ratio <= signals.below_assessed_ratio {
            flags.is_below_assessed = true;
            score += gap * weights::BELOW_ASSESSED;
            reasons.push(format!("{:.0}% below assessed value", gap * 100.0));
        }
    }

    if input.price_drop_ratio >= signals.price_drop_ratio_30d {
        flags.is_price_drop = true;
        score += input.price_drop_ratio * weights::PRICE_DROP;
        reasons.push(format!(
            "price down {:.0}% in 30 days",
            input.price_drop_ratio * 100.0
        ));
    }

    if let Some(dom) = input.dom_days.filter(|&d| d >= signals.dom_days) {
        flags.is_long_dom = true;
        let dom_ratio = dom as f64 / signals.dom_days.max(1) as f64;
        score += dom_ratio.min(weights::LONG_DOM_CAP) * weights::LONG_DOM;
        reasons.push(format!("on market {dom} days"));
    }

    if !input.keyword_hits.is_empty() {
        flags.has_motivated_keywords = true;
        let capped = input.keyword_hits.len().min(weights::KEYWORD_HIT_CAP);
        score += weights::KEYWORD_BASE + capped as f64 * weights::KEYWORD_PER_HIT;
        let shown: Vec<&str> = input
            .keyword_hits
            .iter()
            .take(3)
            .map(String::as_str)
            .collect();
        reasons.push(format!("keywords: {}", shown.join(", ")));
    }

    if input.is_relist {
        score += weights::RELIST;
        reasons.push("possible relisting".to_string());
    }

    ScoreBreakdown {
        score: (score * 100.0).round() / 100.0,
        reasons,
        flags,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;

    fn signals() -> SignalSettings {
        Settings::default().signals
    }

    #[test]
    fn below_assessed_at_threshold_contributes_eleven_points() {
        let input = ScoreInput {
            price: 950_000,
            assessed_value: Some(1_000_000),
            ..Default::default()
        };
        let result = score_listing(&input, &signals());
        assert!(result.flags.is_below_assessed);
        assert!((result.score - 11.0).abs() < 1e-9);
        assert!(result.reasons[0].contains("5%"), "reason: {}", result.reasons[0]);
    }

    #[test]
    fn missing_assessed_value_disables_below_assessed() {
        let input = ScoreInput { price: 500_000, ..Default::default() };
        let result = score_listing(&input, &signals());
        assert!(!result.flags.is_below_assessed);
        assert_eq!(result.score, 0.0);
        assert!(result.reasons.is_empty());
    }

    #[test]
    fn dom_term_caps_at_twice_the_threshold() {
        let base = ScoreInput { dom_days: Some(90), ..Default::default() };
        let capped = ScoreInput { dom_days: Some(900), ..Default::default() };
        let r1 = score_listing(&base, &signals());
        let r2 = score_listing(&capped, &signals());
        // 90/45 = 2.0 is already at the cap
        assert!((r1.score - 120.0).abs() < 1e-9);
        assert_eq!(r1.score, r2.score);
        assert!(r1.flags.is_long_dom);
    }

    #[test]
    fn dom_below_threshold_does_not_trigger() {
        let input = ScoreInput { dom_days: Some(44), ..Default::default() };
        let result = score_listing(&input, &signals());
        assert!(!result.flags.is_long_dom);
        assert_eq!(result.score, 0.0);
    }

    #[test]
    fn keyword_points_cap_at_three_hits() {
        let three = ScoreInput {
            keyword_hits: vec!["a".into(), "b".into(), "c".into()],
            ..Default::default()
        };
        let five = ScoreInput {
            keyword_hits: vec!["a".into(), "b".into(), "c".into(), "d".into(), "e".into()],
            ..Default::default()
        };
        let r3 = score_listing(&three, &signals());
        let r5 = score_listing(&five, &signals());
        assert!((r3.score - 38.0).abs() < 1e-9);
        assert_eq!(r3.score, r5.score);
    }

    #[test]
    fn relist_adds_flat_ten() {
        let input = ScoreInput { is_relist: true, ..Default::default() };
        let result = score_listing(&input, &signals());
        assert!((result.score - 10.0).abs() < 1e-9);
        assert_eq!(result.reasons, vec!["possible relisting".to_string()]);
    }

    #[test]
    fn score_is_monotone_in_each_term() {
        let cfg = signals();
        // larger gap below assessed
        let small_gap = score_listing(
            &ScoreInput { price: 940_000, assessed_value: Some(1_000_000), ..Default::default() },
            &cfg,
        );
        let big_gap = score_listing(
            &ScoreInput { price: 800_000, assessed_value: Some(1_000_000), ..Default::default() },
            &cfg,
        );
        assert!(big_gap.score > small_gap.score);

        // larger drop ratio
        let small_drop = score_listing(
            &ScoreInput { price_drop_ratio: 0.05, ..Default::default() },
            &cfg,
        );
        let big_drop = score_listing(
            &ScoreInput { price_drop_ratio: 0.20, ..Default::default() },
            &cfg,
        );
        assert!(big_drop.score > small_drop.score);

        // longer time on market, below the cap
        let short_dom = score_listing(&ScoreInput { dom_days: Some(45), ..Default::default() }, &cfg);
        let long_dom = score_listing(&ScoreInput { dom_days: Some(60), ..Default::default() }, &cfg);
        assert!(long_dom.score > short_dom.score);

        // more keyword hits, below the cap
        let one_hit = score_listing(
            &ScoreInput { keyword_hits: vec!["a".into()], ..Default::default() },
            &cfg,
        );
        let two_hits = score_listing(
            &ScoreInput { keyword_hits: vec!["a".into(), "b".into()], ..Default::default() },
            &cfg,
        );
        assert!(two_hits.score > one_hit.score);
    }

    #[test]
    fn reasons_follow_fixed_trigger_order() {
        let input = ScoreInput {
            price: 900_000,
            assessed_value: Some(1_000_000),
            dom_days: Some(50),
            price_drop_ratio: 0.1,
            is_relist: true,
            keyword_hits: vec!["motivated".into()],
        };
        let result = score_listing(&input, &signals());
        assert_eq!(result.reasons.len(), 5);
        assert!(result.reasons[0].contains("below assessed"));
        assert!(result.reasons[1].contains("30 days"));
        assert!(result.reasons[2].contains("on market"));
        assert!(result.reasons[3].contains("keywords"));
        assert!(result.reasons[4].contains("relisting"));
    }

    #[test]
    fn keyword_matching_is_case_insensitive_for_english_only() {
        let cfg = signals();
        let hits = keyword_hits("PRICED TO SELL! Motivated seller.", &cfg);
        assert!(hits.contains(&"priced to sell".to_string()));
        assert!(hits.contains(&"motivated".to_string()));

        let zh_hits = keyword_hits("业主急售，看房方便。", &cfg);
        assert_eq!(zh_hits, vec!["急售".to_string()]);
    }
}
