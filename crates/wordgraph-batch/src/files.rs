use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::warn;
use wordgraph_core::{Result, TagSet, WordEntry};

const BATCH_PREFIX: &str = "batch_";
const BATCH_SUFFIX: &str = ".json";

pub fn batch_file_name(index: usize) -> String {
    format!("{BATCH_PREFIX}{index}{BATCH_SUFFIX}")
}

fn batch_index(file_name: &str) -> Option<usize> {
    file_name
        .strip_prefix(BATCH_PREFIX)?
        .strip_suffix(BATCH_SUFFIX)?
        .parse()
        .ok()
}

/// A record as it appears in a candidate batch file. Input documents are
/// untrusted: the word may be empty (an unfilled prompt) and a tag value
/// may be a list instead of a single string.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawRecord {
    #[serde(default)]
    pub word: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<BTreeMap<String, TagValue>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagValue {
    One(String),
    Many(Vec<String>),
}

impl RawRecord {
    pub fn tag_count(&self) -> usize {
        self.tags.as_ref().map_or(0, |tags| tags.len())
    }

    /// Collapses the untrusted tag mapping to one value per dimension;
    /// list-valued tags keep their first element.
    pub fn tag_set(&self) -> Option<TagSet> {
        let tags = self.tags.as_ref()?;
        let mut out = TagSet::new();
        for (dimension, value) in tags {
            let value = match value {
                TagValue::One(v) => v.clone(),
                TagValue::Many(vs) => match vs.first() {
                    Some(first) => first.clone(),
                    None => continue,
                },
            };
            out.insert(dimension.clone(), value);
        }
        Some(out)
    }

    pub fn into_entry(self) -> WordEntry {
        let tags = self.tag_set();
        WordEntry {
            word: self.word,
            tags,
            connections: None,
            description: None,
        }
    }
}

/// A sharded, pre-normalization slice of candidate records. The index is a
/// sharding artifact; membership carries no meaning after normalization.
#[derive(Debug, Clone)]
pub struct CandidateBatch {
    pub index: usize,
    pub records: Vec<RawRecord>,
}

#[derive(Debug, Default)]
pub struct LoadedBatches {
    pub batches: Vec<CandidateBatch>,
    /// Words that appeared in more than one source record before any
    /// canonicalization.
    pub duplicate_words: BTreeSet<String>,
    /// Files that failed to parse and were skipped.
    pub skipped_files: Vec<PathBuf>,
}

/// Batch files under `dir`, sorted by their numeric index. Sorting here
/// keeps every downstream comparison independent of directory enumeration
/// order.
pub fn list_batch_files(dir: &Path) -> Result<Vec<(usize, PathBuf)>> {
    let mut files = Vec::new();
    for dir_entry in fs::read_dir(dir)? {
        let dir_entry = dir_entry?;
        let name = dir_entry.file_name();
        let Some(name) = name.to_str() else { continue };
        if let Some(index) = batch_index(name) {
            files.push((index, dir_entry.path()));
        }
    }
    files.sort_by_key(|(index, _)| *index);
    Ok(files)
}

/// Loads every batch file in index order. A file that cannot be read or
/// parsed is skipped with a warning; the remaining files are still
/// processed.
pub fn load_batches(dir: &Path) -> Result<LoadedBatches> {
    let mut loaded = LoadedBatches::default();
    let mut seen: HashSet<String> = HashSet::new();

    for (index, path) in list_batch_files(dir)? {
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("skipping unreadable batch {}: {}", path.display(), e);
                loaded.skipped_files.push(path);
                continue;
            }
        };
        let records: Vec<RawRecord> = match serde_json::from_str(&raw) {
            Ok(records) => records,
            Err(e) => {
                warn!("skipping corrupt batch {}: {}", path.display(), e);
                loaded.skipped_files.push(path);
                continue;
            }
        };

        for record in &records {
            if record.word.is_empty() {
                continue;
            }
            if !seen.insert(record.word.clone()) {
                loaded.duplicate_words.insert(record.word.clone());
            }
        }

        loaded.batches.push(CandidateBatch { index, records });
    }

    Ok(loaded)
}

/// Writes `batches` as `batch_1.json .. batch_k.json`, then removes any
/// higher-numbered leftovers so the numbering stays contiguous.
pub fn write_batches(dir: &Path, batches: &[Vec<WordEntry>]) -> Result<()> {
    fs::create_dir_all(dir)?;
    for (i, entries) in batches.iter().enumerate() {
        let path = dir.join(batch_file_name(i + 1));
        fs::write(&path, serde_json::to_string_pretty(entries)?)?;
    }
    for (index, path) in list_batch_files(dir)? {
        if index > batches.len() {
            warn!("removing stale batch file {}", path.display());
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}

/// Writes a single batch file at the given index.
pub fn write_batch(dir: &Path, index: usize, entries: &[WordEntry]) -> Result<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(batch_file_name(index));
    fs::write(&path, serde_json::to_string_pretty(entries)?)?;
    Ok(path)
}

/// The index the next new batch file should use.
pub fn next_batch_index(dir: &Path) -> Result<usize> {
    if !dir.exists() {
        return Ok(1);
    }
    Ok(list_batch_files(dir)?
        .last()
        .map(|(index, _)| index + 1)
        .unwrap_or(1))
}

/// Flattens the batch files in index order into the candidate word list.
/// Unfilled prompts (empty words) are skipped; a word seen twice keeps its
/// first position but the later record's content wins.
pub fn load_word_entries(dir: &Path) -> Result<Vec<WordEntry>> {
    let loaded = load_batches(dir)?;
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut entries: Vec<WordEntry> = Vec::new();

    for batch in loaded.batches {
        for record in batch.records {
            if record.word.is_empty() {
                warn!("skipping unfilled prompt record in batch {}", batch.index);
                continue;
            }
            let entry = record.into_entry();
            match positions.get(&entry.word) {
                Some(&i) => entries[i] = entry,
                None => {
                    positions.insert(entry.word.clone(), entries.len());
                    entries.push(entry);
                }
            }
        }
    }

    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write(dir: &Path, name: &str, content: &str) {
        fs::write(dir.join(name), content).unwrap();
    }

    #[test]
    fn batch_files_sort_numerically_not_lexically() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "batch_10.json", "[]");
        write(dir.path(), "batch_2.json", "[]");
        write(dir.path(), "batch_1.json", "[]");
        write(dir.path(), "notes.txt", "ignored");

        let files = list_batch_files(dir.path()).unwrap();
        let indices: Vec<usize> = files.iter().map(|(i, _)| *i).collect();
        assert_eq!(indices, vec![1, 2, 10]);
    }

    #[test]
    fn corrupt_file_is_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "batch_1.json", r#"[{"word": "ember"}]"#);
        write(dir.path(), "batch_2.json", "{not json");

        let loaded = load_batches(dir.path()).unwrap();
        assert_eq!(loaded.batches.len(), 1);
        assert_eq!(loaded.skipped_files.len(), 1);
    }

    #[test]
    fn duplicates_are_tracked_across_files() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "batch_1.json", r#"[{"word": "ember"}, {"word": "lantern"}]"#);
        write(dir.path(), "batch_2.json", r#"[{"word": "ember"}]"#);

        let loaded = load_batches(dir.path()).unwrap();
        assert_eq!(
            loaded.duplicate_words.iter().collect::<Vec<_>>(),
            vec!["ember"]
        );
    }

    #[test]
    fn list_valued_tags_collapse_to_first() {
        let record: RawRecord = serde_json::from_str(
            r#"{"word": "ember", "tags": {"Domain": ["nature", "tech"], "Setting": "home"}}"#,
        )
        .unwrap();
        let tags = record.tag_set().unwrap();
        assert_eq!(tags.get("Domain").unwrap(), "nature");
        assert_eq!(tags.get("Setting").unwrap(), "home");
    }

    #[test]
    fn word_entries_keep_batch_order_and_skip_prompts() {
        let dir = tempfile::tempdir().unwrap();
        write(
            dir.path(),
            "batch_1.json",
            r#"[{"word": "lantern"}, {"word": "", "tags": {"Domain": "tech"}}]"#,
        );
        write(dir.path(), "batch_2.json", r#"[{"word": "ember"}]"#);

        let entries = load_word_entries(dir.path()).unwrap();
        let words: Vec<&str> = entries.iter().map(|e| e.word.as_str()).collect();
        assert_eq!(words, vec!["lantern", "ember"]);
    }

    #[test]
    fn stale_batches_are_removed_on_rewrite() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "batch_1.json", "[]");
        write(dir.path(), "batch_2.json", "[]");
        write(dir.path(), "batch_3.json", "[]");

        let batches = vec![vec![WordEntry::new("ember")]];
        write_batches(dir.path(), &batches).unwrap();

        let files = list_batch_files(dir.path()).unwrap();
        let indices: Vec<usize> = files.iter().map(|(i, _)| *i).collect();
        assert_eq!(indices, vec![1]);
    }
}
