//! Frequency ranking of (campaign, creative) pairs.
//!
//! Raw click counts only: no recency or proximity weighting inside the window.

use attribution_core::config::RankingConfig;
use attribution_core::types::{
    AttributionEvent, CampaignCandidate, Confidence, MAX_CANDIDATES, UNKNOWN_LABEL,
};
use std::collections::HashMap;

pub struct AttributionRanker {
    top_n: usize,
    high_threshold: usize,
    medium_threshold: usize,
}

impl AttributionRanker {
    /// `top_n` is capped at [`MAX_CANDIDATES`].
    pub fn new(config: &RankingConfig) -> Self {
        Self {
            top_n: config.top_n.min(MAX_CANDIDATES),
            high_threshold: config.high_threshold,
            medium_threshold: config.medium_threshold,
        }
    }

    /// Group by (campaign, creative), order by count descending, keep the top
    /// groups. Equal counts keep first-seen order; source/medium come from the
    /// first event of each group.
    pub fn rank(&self, events: &[AttributionEvent]) -> Vec<CampaignCandidate> {
        let mut groups: Vec<CampaignCandidate> = Vec::new();
        let mut index: HashMap<(String, String), usize> = HashMap::new();

        for event in events {
            let key = (label_or_unknown(&event.campaign), label_or_unknown(&event.creative));
            match index.get(&key) {
                Some(&slot) => groups[slot].count += 1,
                None => {
                    index.insert(key.clone(), groups.len());
                    groups.push(CampaignCandidate {
                        campaign: key.0,
                        creative: key.1,
                        source: label_or_unknown(&event.source),
                        medium: label_or_unknown(&event.medium),
                        count: 1,
                        confidence: Confidence::Low,
                    });
                }
            }
        }

        // sort_by is stable, so ties stay in first-encounter order.
        groups.sort_by(|a, b| b.count.cmp(&a.count));
        groups.truncate(self.top_n);
        for candidate in &mut groups {
            candidate.confidence =
                Confidence::from_count(candidate.count, self.high_threshold, self.medium_threshold);
        }
        groups
    }
}

impl Default for AttributionRanker {
    fn default() -> Self {
        Self::new(&RankingConfig::default())
    }
}

fn label_or_unknown(label: &str) -> String {
    let trimmed = label.trim();
    if trimmed.is_empty() {
        UNKNOWN_LABEL.to_string()
    } else {
        trimmed.to_string()
    }
}
