use crate::store::GraphStore;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};
use wordgraph_ai::InferenceGateway;
use wordgraph_core::Result;

/// Outcome counters for one phase of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PhaseReport {
    /// Gateway calls that completed and were recorded.
    pub generated: usize,
    /// Words already past this phase; no call was made.
    pub skipped: usize,
    /// Calls that failed; the word is left for a future run.
    pub failed: usize,
    /// Phase 1: words whose filtered connection list came back empty.
    /// Phase 2: words skipped because they have no connections to describe.
    pub empty: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PipelineReport {
    pub connections: PhaseReport,
    pub descriptions: PhaseReport,
}

/// Drives graph construction over a fixed word set: connections first,
/// then descriptions, strictly sequentially, checkpointing after every
/// word-phase and pausing a fixed delay between gateway calls.
///
/// The orchestrator owns the persisted document for the duration of a run;
/// running two of these against the same file concurrently would break the
/// at-most-once-call guarantee.
pub struct Pipeline {
    store: GraphStore,
    gateway: Arc<dyn InferenceGateway>,
    max_connections: usize,
    delay: Duration,
}

impl Pipeline {
    pub fn new(
        store: GraphStore,
        gateway: Arc<dyn InferenceGateway>,
        max_connections: usize,
        delay: Duration,
    ) -> Self {
        Self {
            store,
            gateway,
            max_connections,
            delay,
        }
    }

    pub fn store(&self) -> &GraphStore {
        &self.store
    }

    pub fn into_store(self) -> GraphStore {
        self.store
    }

    /// Runs both phases to completion. Word-level failures are contained;
    /// only checkpoint IO errors abort the run.
    pub async fn run(&mut self) -> Result<PipelineReport> {
        let connections = self.run_connections().await?;
        let descriptions = self.run_descriptions().await?;
        Ok(PipelineReport {
            connections,
            descriptions,
        })
    }

    /// Phase 1: connection discovery.
    pub async fn run_connections(&mut self) -> Result<PhaseReport> {
        let words = self.store.words().to_vec();
        let total = words.len();
        let mut report = PhaseReport::default();
        info!("phase 1: finding connections for {} words", total);

        for (i, word) in words.iter().enumerate() {
            if self.store.connections_ready(word) {
                debug!("({}/{}) '{}' already has connections", i + 1, total, word);
                report.skipped += 1;
                continue;
            }

            info!("({}/{}) finding connections for '{}'", i + 1, total, word);
            let pool: Vec<String> = words.iter().filter(|w| *w != word).cloned().collect();

            match self
                .gateway
                .find_connections(word, &pool, self.max_connections)
                .await
            {
                Ok(raw) => {
                    let connections = self.filter_connections(word, raw);
                    if connections.is_empty() {
                        info!("'{}' received no usable connections", word);
                        report.empty += 1;
                    }
                    // recorded even when empty, so a future run does not
                    // re-ask the gateway for this word
                    self.store.set_connections(word, connections);
                    self.store.checkpoint()?;
                    report.generated += 1;
                }
                Err(e) => {
                    warn!("connections for '{}' failed: {}", word, e);
                    report.failed += 1;
                }
            }

            sleep(self.delay).await;
        }

        Ok(report)
    }

    /// Phase 2: description generation for every word with at least one
    /// connection.
    pub async fn run_descriptions(&mut self) -> Result<PhaseReport> {
        let words = self.store.words().to_vec();
        let total = words.len();
        let mut report = PhaseReport::default();
        info!("phase 2: generating descriptions for {} words", total);

        for (i, word) in words.iter().enumerate() {
            if self.store.description_ready(word) {
                debug!("({}/{}) '{}' already has a description", i + 1, total, word);
                report.skipped += 1;
                continue;
            }

            let connections = match self.store.get(word).and_then(|e| e.connections.clone()) {
                Some(connections) if !connections.is_empty() => connections,
                Some(_) => {
                    info!(
                        "({}/{}) '{}' has no connections, skipping description",
                        i + 1,
                        total,
                        word
                    );
                    report.empty += 1;
                    continue;
                }
                None => {
                    debug!("({}/{}) '{}' never got connections", i + 1, total, word);
                    report.skipped += 1;
                    continue;
                }
            };

            info!("({}/{}) generating description for '{}'", i + 1, total, word);
            match self.gateway.generate_description(word, &connections).await {
                Ok(description) => {
                    self.store.set_description(word, description);
                    self.store.checkpoint()?;
                    report.generated += 1;
                }
                Err(e) => {
                    warn!("description for '{}' failed: {}", word, e);
                    report.failed += 1;
                }
            }

            sleep(self.delay).await;
        }

        Ok(report)
    }

    /// Drops self-references, words outside the known set and repeats,
    /// then truncates to the configured maximum. Gateway output is
    /// untrusted; a hallucinated word must never enter the graph.
    fn filter_connections(&self, word: &str, raw: Vec<String>) -> Vec<String> {
        let mut seen: HashSet<String> = HashSet::new();
        raw.into_iter()
            .filter(|candidate| {
                candidate != word
                    && self.store.contains(candidate)
                    && seen.insert(candidate.clone())
            })
            .take(self.max_connections)
            .collect()
    }
}
