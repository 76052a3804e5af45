use crate::error::{Result, WordGraphError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::ops::RangeInclusive;
use std::path::Path;

/// The tag system for the game: dimensions and the allowed values per
/// dimension. Read-only input to generation and analysis.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Taxonomy {
    pub dimensions: BTreeMap<String, Vec<String>>,
}

impl Default for Taxonomy {
    fn default() -> Self {
        let table: &[(&str, &[&str])] = &[
            (
                "Domain",
                &[
                    "tech",
                    "nature",
                    "emotion",
                    "fiction",
                    "philosophy",
                    "history",
                    "spirituality",
                    "science",
                    "pop culture",
                    "education & learning",
                    "economics & work",
                    "health & wellness",
                ],
            ),
            (
                "Culture",
                &[
                    "Western",
                    "South Asian",
                    "East Asian",
                    "African",
                    "Latinx",
                    "Middle Eastern",
                    "Central Asian",
                    "Caribbean",
                    "Pacific Islander",
                    "Global Indigenous",
                    "Diasporic",
                    "Hybrid / global culture",
                ],
            ),
            (
                "Generation",
                &[
                    "Boomer",
                    "Gen X",
                    "Millennial",
                    "Gen Z",
                    "Gen Alpha",
                    "Ancient / Classical",
                    "Futuristic",
                    "Timeless",
                ],
            ),
            (
                "PersonalityLens",
                &[
                    "thinker", "feeler", "doer", "dreamer", "organizer", "rebel", "healer",
                    "mystic", "explorer", "analyst",
                ],
            ),
            (
                "IdentityExperience",
                &[
                    "LGBTQ+",
                    "neurodivergent",
                    "disabled / chronically ill",
                    "mental health experience",
                    "gender-expansive / trans",
                    "racialized / minority",
                    "immigrant / refugee",
                    "working-class / underpaid",
                    "spiritual seeker",
                    "diaspora",
                ],
            ),
            (
                "Subculture",
                &[
                    "gaming",
                    "music",
                    "memes",
                    "art",
                    "anime",
                    "fashion",
                    "food culture",
                    "sports & fitness",
                    "nightlife",
                    "digital/online culture",
                    "fandoms",
                ],
            ),
            (
                "Setting",
                &[
                    "home",
                    "school",
                    "street",
                    "market",
                    "internet",
                    "jungle",
                    "war zone",
                    "temple",
                    "factory",
                    "city",
                    "village",
                    "dorm room",
                    "underground",
                    "outer space",
                ],
            ),
            (
                "AffectiveTone",
                &[
                    "joyful",
                    "melancholic",
                    "typically humorous",
                    "chaotic",
                    "nostalgic",
                    "mysterious",
                    "peaceful",
                    "rebellious",
                    "absurd",
                ],
            ),
        ];

        let dimensions = table
            .iter()
            .map(|(dimension, values)| {
                (
                    dimension.to_string(),
                    values.iter().map(|v| v.to_string()).collect(),
                )
            })
            .collect();

        Self { dimensions }
    }
}

impl Taxonomy {
    /// Loads a taxonomy from a JSON document mapping dimension names to
    /// their allowed values.
    pub fn from_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            WordGraphError::Configuration(format!("cannot read taxonomy {}: {}", path.display(), e))
        })?;
        serde_json::from_str(&raw).map_err(|e| {
            WordGraphError::Configuration(format!(
                "cannot parse taxonomy {}: {}",
                path.display(),
                e
            ))
        })
    }

    pub fn contains(&self, dimension: &str, value: &str) -> bool {
        self.dimensions
            .get(dimension)
            .is_some_and(|values| values.iter().any(|v| v == value))
    }

    pub fn dimension_count(&self) -> usize {
        self.dimensions.len()
    }

    /// Number of distinct tag combinations whose dimension count falls in
    /// `sizes`. Computed via the elementary symmetric polynomials over the
    /// per-dimension value counts, so it stays exact for the small
    /// taxonomies this system works with.
    pub fn combination_space(&self, sizes: RangeInclusive<usize>) -> u128 {
        let counts: Vec<u128> = self
            .dimensions
            .values()
            .map(|values| values.len() as u128)
            .collect();

        // e[k] = sum over all k-subsets of dimensions of the product of
        // their value counts
        let mut e = vec![0u128; counts.len() + 1];
        e[0] = 1;
        for count in counts {
            for k in (1..e.len()).rev() {
                e[k] += e[k - 1] * count;
            }
        }

        sizes.filter(|k| *k < e.len()).map(|k| e[k]).sum()
    }
}
