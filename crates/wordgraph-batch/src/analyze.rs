use serde::Serialize;
use std::collections::HashMap;
use wordgraph_core::{Taxonomy, WordEntry};

/// How often each allowed value of one dimension appears across the
/// tagged corpus. Values keep the taxonomy's declared order.
#[derive(Debug, Clone, Serialize)]
pub struct DimensionBreakdown {
    pub dimension: String,
    pub counts: Vec<(String, usize)>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DiversityReport {
    pub total_words: usize,
    pub dimensions: Vec<DimensionBreakdown>,
}

impl DiversityReport {
    pub fn percentage(&self, count: usize) -> f64 {
        if self.total_words == 0 {
            0.0
        } else {
            count as f64 * 100.0 / self.total_words as f64
        }
    }
}

/// Tallies the tag distribution of `entries` against the taxonomy. Values
/// outside the taxonomy are ignored, matching its role as the source of
/// truth for the game's design.
pub fn analyze(entries: &[WordEntry], taxonomy: &Taxonomy) -> DiversityReport {
    let mut dimensions = Vec::with_capacity(taxonomy.dimensions.len());

    for (dimension, allowed) in &taxonomy.dimensions {
        let mut counts: HashMap<&str, usize> = HashMap::new();
        for entry in entries {
            let Some(tags) = entry.tags.as_ref() else {
                continue;
            };
            if let Some(value) = tags.get(dimension) {
                if allowed.iter().any(|v| v == value) {
                    *counts.entry(value.as_str()).or_default() += 1;
                }
            }
        }
        dimensions.push(DimensionBreakdown {
            dimension: dimension.clone(),
            counts: allowed
                .iter()
                .map(|value| (value.clone(), counts.get(value.as_str()).copied().unwrap_or(0)))
                .collect(),
        });
    }

    DiversityReport {
        total_words: entries.len(),
        dimensions,
    }
}

/// Strips tag data to produce the plain word list consumed by the game.
pub fn simple_word_list(entries: &[WordEntry]) -> Vec<String> {
    entries
        .iter()
        .filter(|entry| !entry.word.is_empty())
        .map(|entry| entry.word.clone())
        .collect()
}
