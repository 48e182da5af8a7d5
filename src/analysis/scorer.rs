use super::category::property_key;
use crate::config::DEFAULT_FALLBACK_PARAMETER_COUNT;
use crate::model::{Compliance, PropertyEntry};
use std::collections::HashSet;

/// Computes how many required parameters an element has populated.
///
/// Pure and deterministic. Required and present names are matched on their
/// normalized key, so "Fire_Rating" satisfies "fire rating".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ComplianceScorer {
    fallback_total: usize,
}

impl ComplianceScorer {
    /// `fallback_total` is the denominator used when no parameters are
    /// required. It is clamped to at least 1.
    #[must_use]
    pub fn new(fallback_total: usize) -> Self {
        Self {
            fallback_total: fallback_total.max(1),
        }
    }

    #[must_use]
    pub fn score<S: AsRef<str>>(&self, properties: &[PropertyEntry], required: &[S]) -> Compliance {
        let required: HashSet<String> = required
            .iter()
            .map(|name| property_key(name.as_ref()))
            .collect();
        if required.is_empty() {
            return Compliance {
                filled: 0,
                total: self.fallback_total,
                pct: 0,
            };
        }

        let present: HashSet<String> = properties
            .iter()
            .filter(|p| p.is_filled())
            .map(|p| property_key(&p.name))
            .collect();
        let filled = required.intersection(&present).count();
        let total = required.len();

        Compliance {
            filled,
            total,
            pct: percent(filled, total),
        }
    }
}

impl Default for ComplianceScorer {
    fn default() -> Self {
        Self::new(DEFAULT_FALLBACK_PARAMETER_COUNT)
    }
}

fn percent(filled: usize, total: usize) -> u8 {
    (100.0 * filled as f64 / total as f64).round().clamp(0.0, 100.0) as u8
}
