use crate::files::LoadedBatches;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::debug;
use wordgraph_core::{Result, WordEntry, WordGraphError};

/// Canonicalization rules applied to candidate words before merging.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizeRules {
    /// Words discarded entirely.
    #[serde(default)]
    pub removals: BTreeSet<String>,
    /// Exact rewrites, usually a hyphenated compound to its shortened
    /// canonical form.
    #[serde(default)]
    pub replacements: BTreeMap<String, String>,
    /// Spaced forms: a hyphenated word whose spaced rendering appears here
    /// has its hyphens rewritten to spaces.
    #[serde(default)]
    pub spaced: BTreeSet<String>,
    /// Established compounds that keep their hyphens no matter what.
    #[serde(default)]
    pub keep_hyphens: BTreeSet<String>,
}

impl NormalizeRules {
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            WordGraphError::Configuration(format!(
                "cannot read rules file {}: {}",
                path.display(),
                e
            ))
        })?;
        serde_json::from_str(&raw).map_err(|e| {
            WordGraphError::Configuration(format!(
                "cannot parse rules file {}: {}",
                path.display(),
                e
            ))
        })
    }
}

impl Default for NormalizeRules {
    fn default() -> Self {
        let replacements: BTreeMap<String, String> = [
            ("acting-my-age", "maturity"),
            ("affective-labor", "empathy"),
            ("art-collective", "collective"),
            ("art-history", "aesthetics"),
            ("artist-in-residence", "residency"),
            ("comfort-character", "comfort"),
            ("comfort-food", "comfort"),
            ("company-store", "company"),
            ("company-town", "company"),
            ("corporate-meme", "meme"),
            ("cosmic-horror", "cosmic"),
            ("emotional-labor", "empathy"),
            ("faith-healing", "healing"),
            ("flea-market", "market"),
            ("flow-state", "flow"),
            ("food-desert", "desert"),
            ("food-porn", "food"),
            ("foreign-exchange", "exchange"),
            ("gender-affirming-care", "affirmation"),
            ("generation-ship", "generation"),
            ("generative-art", "generative"),
            ("guerilla-art", "guerilla"),
            ("health-goth", "goth"),
            ("heirloom-recipe", "heirloom"),
            ("industrial-music", "industrial"),
            ("installation-art", "installation"),
            ("lo-fi-hip-hop", "lo-fi"),
            ("mad-scientist", "scientist"),
            ("manifest-destiny", "manifest"),
            ("school-uniform", "uniform"),
            ("seed-bomb", "seed"),
            ("self-care", "care"),
            ("self-dx", "diagnosis"),
            ("self-medicate", "medicate"),
            ("space-communism", "space"),
            ("space-cowboy", "cowboy"),
            ("space-elevator", "elevator"),
            ("space-oddity", "oddity"),
            ("space-tourism", "tourism"),
            ("special-education", "education"),
            ("speculative-fiction", "speculative"),
            ("stan-culture", "stan"),
            ("afro-beats", "afrobeats"),
            ("afro-futurism", "afrofuturism"),
            ("afro-psychology", "psychology"),
            ("head-canon", "headcanon"),
            ("mana-regen", "mana"),
        ]
        .into_iter()
        .map(|(from, to)| (from.to_string(), to.to_string()))
        .collect();

        let removals: BTreeSet<String> = ["lynching", "gulag", "intifada"]
            .into_iter()
            .map(str::to_string)
            .collect();

        let keep_hyphens: BTreeSet<String> = [
            "art-brut",
            "bio-art",
            "bio-hacker",
            "bio-horror",
            "bio-luminary",
            "bio-luminescence",
            "bio-punk",
            "clown-core",
            "co-op",
            "crip-lit",
            "crip-time",
            "cyber-goth",
            "cyber-grief",
            "cyber-idol",
            "cyber-punk",
            "cyber-rebellion",
            "cyber-war",
            "dark-matter",
            "dark-web",
            "diy-biology",
            "e-boy",
            "e-girl",
            "folk-music",
            "garage-band",
            "glitch-art",
            "glow-up",
            "goth-rock",
            "jam-session",
            "juke-joint",
            "karma-yoga",
            "land-art",
            "lo-fi",
            "math-rock",
            "mech-pilot",
            "meta-modernism",
            "mind-palace",
            "mono-no-aware",
            "mosh-pit",
            "mud-bath",
            "neuro-harmony",
            "neuro-punk",
            "oral-history",
            "oral-tradition",
            "ponzi-scheme",
            "protest-art",
            "punk-rock",
            "rage-quit",
            "retro-gaming",
            "ruin-porn",
            "sarmatian-punk",
            "side-hustle",
            "side-quest",
            "sound-healing",
            "star-map",
            "stim-toy",
            "tie-dye",
            "tiki-bar",
            "tiki-culture",
            "torch-song",
            "vestal-virgin",
            "wabi-sabi",
            "zen-garden",
        ]
        .into_iter()
        .map(str::to_string)
        .collect();

        let spaced: BTreeSet<String> = [
            "after hours",
            "agent orange",
            "agri tech",
            "astral projection",
            "film noir",
            "flame war",
            "flash mob",
            "freudian slip",
            "gallows humor",
            "game show",
            "gamified learning",
            "gen z humor",
            "gender fluid",
            "gender reveal",
            "gig economy",
            "glam rock",
            "guerilla gardening",
            "kawaii metal",
            "kick on",
            "kin keeping",
            "land back",
            "last supper",
            "late night tv",
            "lawrence of arabia",
            "liminal space",
            "manic pixie dream girl",
            "meme lord",
            "meme stock",
            "mor style",
            "pyramid scheme",
            "quantified self",
            "queer coding",
            "queer rage",
            "queer theory",
            "rage room",
            "reality tv",
            "red scare",
            "reggae sunsplash",
            "restorative justice",
            "space opera",
            "space suit",
            "star trek",
            "stardew valley",
            "swap meet",
            "sweat lodge",
            "talk show",
            "talk story",
            "tang ping",
            "teach for america",
            "teddy boy",
            "teen angst",
            "teen movie",
            "terra nullius",
            "the blues",
            "the medium is the message",
            "third culture kid",
            "third eye",
            "third place",
            "trad goth",
            "trauma informed",
            "trench art",
            "troll farm",
            "tumblr era",
            "tv dinner",
            "two spirit",
            "ubiquitous computing",
            "zen garden meditation",
            "zen painting",
            "zoot suit",
        ]
        .into_iter()
        .map(str::to_string)
        .collect();

        Self {
            removals,
            replacements,
            spaced,
            keep_hyphens,
        }
    }
}

/// Observability counters for one normalization pass.
#[derive(Debug, Clone, Default, Serialize)]
pub struct NormalizeReport {
    pub source_batches: usize,
    pub source_records: usize,
    /// Words repeated verbatim across source records, before any rewrite.
    pub duplicate_words: usize,
    /// Canonical words that absorbed records from two or more distinct
    /// original spellings.
    pub canonical_collisions: usize,
    pub removed: usize,
    pub replaced: usize,
    pub space_converted: usize,
    pub empty_dropped: usize,
    pub skipped_files: usize,
    pub words: usize,
    pub batches: usize,
}

/// Canonicalizes, merges and re-shards the loaded batches.
///
/// Records are visited in batch-index order, then in-file order, so the
/// "first encountered" tie-break is deterministic for a given set of file
/// contents regardless of how the files were enumerated. Output batches
/// hold the canonical words in lexicographic (byte) order, sliced into
/// contiguous 1-indexed shards of `batch_size`.
pub fn normalize(
    loaded: &LoadedBatches,
    rules: &NormalizeRules,
    batch_size: usize,
) -> (Vec<Vec<WordEntry>>, NormalizeReport) {
    assert!(batch_size > 0, "batch size must be positive");

    let mut report = NormalizeReport {
        source_batches: loaded.batches.len(),
        duplicate_words: loaded.duplicate_words.len(),
        skipped_files: loaded.skipped_files.len(),
        ..NormalizeReport::default()
    };

    // canonical word -> (kept entry, original spellings merged into it)
    let mut merged: BTreeMap<String, (WordEntry, BTreeSet<String>)> = BTreeMap::new();

    for batch in &loaded.batches {
        for record in &batch.records {
            report.source_records += 1;
            let original = record.word.as_str();

            if original.is_empty() {
                report.empty_dropped += 1;
                continue;
            }
            if rules.removals.contains(original) {
                debug!("removing '{}'", original);
                report.removed += 1;
                continue;
            }

            let mut word = original.to_string();
            if let Some(replacement) = rules.replacements.get(&word) {
                word = replacement.clone();
                report.replaced += 1;
            }
            if word.contains('-') && !rules.keep_hyphens.contains(&word) {
                let spaced = word.replace('-', " ");
                if rules.spaced.contains(&spaced) {
                    word = spaced;
                    report.space_converted += 1;
                }
            }

            let entry = WordEntry {
                word: word.clone(),
                tags: record.tag_set(),
                connections: None,
                description: None,
            };

            match merged.get_mut(&word) {
                None => {
                    let sources = BTreeSet::from([original.to_string()]);
                    merged.insert(word, (entry, sources));
                }
                Some((kept, sources)) => {
                    sources.insert(original.to_string());
                    // strictly more tags wins; ties keep the first record
                    if entry.tag_count() > kept.tag_count() {
                        *kept = entry;
                    }
                }
            }
        }
    }

    report.canonical_collisions = merged
        .values()
        .filter(|(_, sources)| sources.len() > 1)
        .count();

    // BTreeMap iteration is already the lexicographic order the sharding
    // contract requires.
    let canonical: Vec<WordEntry> = merged.into_values().map(|(entry, _)| entry).collect();
    report.words = canonical.len();

    let batches: Vec<Vec<WordEntry>> = canonical
        .chunks(batch_size)
        .map(|chunk| chunk.to_vec())
        .collect();
    report.batches = batches.len();

    (batches, report)
}
