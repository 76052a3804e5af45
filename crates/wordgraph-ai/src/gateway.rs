use async_trait::async_trait;
use wordgraph_core::Result;

/// The external capability that turns a word into connections or a
/// description.
///
/// Implementations own transport, prompting and shape validation; callers
/// treat the returned content as untrusted and apply their own semantic
/// validation (self-references, unknown words).
#[async_trait]
pub trait InferenceGateway: Send + Sync {
    /// Asks for up to `max` words from `candidates` related to `word`.
    async fn find_connections(
        &self,
        word: &str,
        candidates: &[String],
        max: usize,
    ) -> Result<Vec<String>>;

    /// Asks for a wiki-style description of `word` that weaves in
    /// `connections`.
    async fn generate_description(&self, word: &str, connections: &[String]) -> Result<String>;
}
