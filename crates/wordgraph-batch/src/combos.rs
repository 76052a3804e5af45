use crate::files::{self, write_batch};
use rand::prelude::*;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};
use tracing::info;
use wordgraph_core::{combo_key, Result, TagCombinationSet, TagSet, Taxonomy, WordEntry, WordGraphError};

/// Produces unique tag combinations by rejection sampling against an
/// exclusion set.
///
/// Liveness caveat: sampling only terminates quickly while the requested
/// count stays far below [`Taxonomy::combination_space`]. The retry
/// ceiling turns a (near-)exhausted space into an error instead of an
/// unbounded loop.
pub struct CombinationGenerator<'a> {
    taxonomy: &'a Taxonomy,
    sizes: RangeInclusive<usize>,
    retry_ceiling: u64,
}

impl<'a> CombinationGenerator<'a> {
    pub fn new(taxonomy: &'a Taxonomy, sizes: RangeInclusive<usize>, retry_ceiling: u64) -> Self {
        assert!(!sizes.is_empty(), "dimension-count range must be non-empty");
        Self {
            taxonomy,
            sizes,
            retry_ceiling,
        }
    }

    /// Generates `count` tag sets distinct from each other and from
    /// everything in `used`. Accepted keys are added to `used` so repeated
    /// calls stay globally unique.
    pub fn generate(&self, count: usize, used: &mut TagCombinationSet) -> Result<Vec<TagSet>> {
        let mut rng = rand::rng();
        self.generate_with(&mut rng, count, used)
    }

    fn generate_with<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        count: usize,
        used: &mut TagCombinationSet,
    ) -> Result<Vec<TagSet>> {
        let dimension_names: Vec<&String> = self.taxonomy.dimensions.keys().collect();
        let mut out = Vec::with_capacity(count);
        let mut rejections = 0u64;

        while out.len() < count {
            let size = rng.random_range(self.sizes.clone());
            let mut combo = TagSet::new();
            for dimension in dimension_names.choose_multiple(rng, size) {
                let values = &self.taxonomy.dimensions[*dimension];
                if let Some(value) = values.choose(rng) {
                    combo.insert((*dimension).clone(), value.clone());
                }
            }

            if used.insert(combo_key(&combo)) {
                rejections = 0;
                out.push(combo);
            } else {
                rejections += 1;
                if rejections >= self.retry_ceiling {
                    return Err(WordGraphError::CombinationSpaceExhausted {
                        attempts: rejections,
                    });
                }
            }
        }

        Ok(out)
    }
}

/// Every tag combination already assigned to a record in the batch
/// directory. Uniqueness of new prompts is checked against the whole
/// corpus, not a single batch.
pub fn existing_combinations(dir: &Path) -> Result<TagCombinationSet> {
    let mut used = TagCombinationSet::new();
    if !dir.exists() {
        return Ok(used);
    }
    for batch in files::load_batches(dir)?.batches {
        for record in &batch.records {
            if let Some(tags) = record.tag_set() {
                if !tags.is_empty() {
                    used.insert(combo_key(&tags));
                }
            }
        }
    }
    Ok(used)
}

/// Writes a fresh batch of `count` unfilled prompt records (empty word,
/// unique tag combination) as the next batch file. Returns the new batch
/// index and path.
pub fn create_prompt_batch(
    dir: &Path,
    count: usize,
    generator: &CombinationGenerator<'_>,
) -> Result<(usize, PathBuf)> {
    let mut used = existing_combinations(dir)?;
    info!("found {} existing tag combinations", used.len());

    let combos = generator.generate(count, &mut used)?;
    let records: Vec<WordEntry> = combos
        .into_iter()
        .map(|tags| WordEntry::with_tags("", tags))
        .collect();

    let index = files::next_batch_index(dir)?;
    let path = write_batch(dir, index, &records)?;
    info!("wrote {} new prompts to {}", records.len(), path.display());
    Ok((index, path))
}
