use std::collections::BTreeMap;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};
use wordgraph_core::{Result, WordEntry, WordGraphError};

/// The word graph under construction, bound to its persisted document.
///
/// Entries only move forward: connections are set once, descriptions are
/// set once and only on top of non-empty connections. The persisted shape
/// is a JSON array of `{word, connections?, description?}` records; tags
/// stay in the batch files and are never written here.
pub struct GraphStore {
    path: PathBuf,
    entries: BTreeMap<String, WordEntry>,
    order: Vec<String>,
}

impl GraphStore {
    /// Seeds the graph from the candidate list and, when the persisted
    /// document already exists, folds its recorded progress back in so a
    /// restarted run resumes where the previous one stopped.
    ///
    /// Iteration order is the candidate list's natural order; words found
    /// only in the persisted document keep their recorded state and are
    /// appended after the candidates.
    pub fn load_or_seed(path: &Path, candidates: &[WordEntry]) -> Result<Self> {
        let mut store = Self {
            path: path.to_path_buf(),
            entries: BTreeMap::new(),
            order: Vec::new(),
        };

        for candidate in candidates {
            if candidate.word.is_empty() {
                continue;
            }
            if store
                .entries
                .insert(candidate.word.clone(), WordEntry::new(candidate.word.clone()))
                .is_none()
            {
                store.order.push(candidate.word.clone());
            }
        }

        if path.exists() {
            let raw = std::fs::read_to_string(path)?;
            let persisted: Vec<WordEntry> = serde_json::from_str(&raw).map_err(|e| {
                WordGraphError::CorruptInput(format!(
                    "persisted graph {}: {}",
                    path.display(),
                    e
                ))
            })?;
            info!(
                "resuming from {} ({} recorded words)",
                path.display(),
                persisted.len()
            );
            for entry in persisted {
                if entry.word.is_empty() {
                    continue;
                }
                match store.entries.get_mut(&entry.word) {
                    Some(existing) => {
                        existing.connections = entry.connections;
                        existing.description = entry.description;
                    }
                    None => {
                        store.order.push(entry.word.clone());
                        store.entries.insert(entry.word.clone(), entry);
                    }
                }
            }
        }

        Ok(store)
    }

    /// Words in iteration order.
    pub fn words(&self) -> &[String] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn contains(&self, word: &str) -> bool {
        self.entries.contains_key(word)
    }

    pub fn get(&self, word: &str) -> Option<&WordEntry> {
        self.entries.get(word)
    }

    /// Connections recorded for this word, possibly empty.
    pub fn connections_ready(&self, word: &str) -> bool {
        self.get(word).is_some_and(WordEntry::has_connections)
    }

    pub fn description_ready(&self, word: &str) -> bool {
        self.get(word).is_some_and(WordEntry::has_description)
    }

    /// Records connections for a word. A word that already has recorded
    /// connections keeps them; the lifecycle never moves backwards.
    pub fn set_connections(&mut self, word: &str, connections: Vec<String>) {
        if let Some(entry) = self.entries.get_mut(word) {
            if entry.connections.is_none() {
                entry.connections = Some(connections);
            }
        }
    }

    /// Records a description. Ignored unless the word has non-empty
    /// connections and no description yet.
    pub fn set_description(&mut self, word: &str, description: String) {
        if let Some(entry) = self.entries.get_mut(word) {
            let has_connections = entry
                .connections
                .as_ref()
                .is_some_and(|connections| !connections.is_empty());
            if has_connections && entry.description.is_none() {
                entry.description = Some(description);
            }
        }
    }

    /// Durably writes the full graph. The document is written to a
    /// temporary file in the target directory, synced, then renamed over
    /// the destination, so a crash mid-write never leaves a truncated
    /// graph behind.
    pub fn checkpoint(&self) -> Result<()> {
        let records: Vec<WordEntry> = self
            .order
            .iter()
            .filter_map(|word| self.entries.get(word))
            .map(|entry| WordEntry {
                word: entry.word.clone(),
                tags: None,
                connections: entry.connections.clone(),
                description: entry.description.clone(),
            })
            .collect();
        let raw = serde_json::to_string_pretty(&records)?;

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(raw.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path)
            .map_err(|e| WordGraphError::Io(e.error))?;

        debug!(
            "checkpointed {} words to {}",
            records.len(),
            self.path.display()
        );
        Ok(())
    }
}
