use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use wordgraph_ai::InferenceGateway;
use wordgraph_core::{Result, WordEntry, WordGraphError};
use wordgraph_pipeline::{GraphStore, Pipeline};

/// Deterministic gateway double: canned connection lists, synthesized
/// descriptions, optional per-word failures, and a full call log.
#[derive(Default)]
struct StubGateway {
    connections: HashMap<String, Vec<String>>,
    failing_connections: HashSet<String>,
    failing_descriptions: HashSet<String>,
    calls: Mutex<CallLog>,
}

#[derive(Default)]
struct CallLog {
    connections: Vec<String>,
    descriptions: Vec<String>,
}

impl StubGateway {
    fn with_connections(pairs: &[(&str, &[&str])]) -> Self {
        let connections = pairs
            .iter()
            .map(|(word, related)| {
                (
                    word.to_string(),
                    related.iter().map(|r| r.to_string()).collect(),
                )
            })
            .collect();
        Self {
            connections,
            ..Self::default()
        }
    }

    fn connection_calls(&self) -> usize {
        self.calls.lock().unwrap().connections.len()
    }

    fn description_calls(&self) -> usize {
        self.calls.lock().unwrap().descriptions.len()
    }
}

#[async_trait]
impl InferenceGateway for StubGateway {
    async fn find_connections(
        &self,
        word: &str,
        _candidates: &[String],
        _max: usize,
    ) -> Result<Vec<String>> {
        self.calls.lock().unwrap().connections.push(word.to_string());
        if self.failing_connections.contains(word) {
            return Err(WordGraphError::Gateway(format!("stub refused '{word}'")));
        }
        Ok(self.connections.get(word).cloned().unwrap_or_default())
    }

    async fn generate_description(&self, word: &str, connections: &[String]) -> Result<String> {
        self.calls.lock().unwrap().descriptions.push(word.to_string());
        if self.failing_descriptions.contains(word) {
            return Err(WordGraphError::Gateway(format!("stub refused '{word}'")));
        }
        Ok(format!("{} relates to {}.", word, connections.join(", ")))
    }
}

fn candidates(words: &[&str]) -> Vec<WordEntry> {
    words.iter().map(|w| WordEntry::new(*w)).collect()
}

fn pipeline(path: &Path, words: &[&str], gateway: Arc<StubGateway>) -> Pipeline {
    let store = GraphStore::load_or_seed(path, &candidates(words)).unwrap();
    Pipeline::new(store, gateway, 5, Duration::ZERO)
}

fn read_graph(path: &Path) -> Vec<WordEntry> {
    serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap()
}

#[tokio::test]
async fn full_run_produces_a_closed_graph() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("graph.json");
    let gateway = Arc::new(StubGateway::with_connections(&[
        ("ember", &["lantern", "torch"]),
        ("lantern", &["ember"]),
        ("torch", &["ember", "lantern"]),
    ]));

    let mut pipeline = pipeline(&path, &["ember", "lantern", "torch"], gateway.clone());
    let report = pipeline.run().await.unwrap();

    assert_eq!(report.connections.generated, 3);
    assert_eq!(report.descriptions.generated, 3);

    let graph = read_graph(&path);
    let known: HashSet<&str> = graph.iter().map(|e| e.word.as_str()).collect();
    for entry in &graph {
        let connections = entry.connections.as_ref().unwrap();
        // no self-loops, referential closure
        assert!(!connections.iter().any(|c| c == &entry.word));
        assert!(connections.iter().all(|c| known.contains(c.as_str())));
        // description gating
        if entry.description.is_some() {
            assert!(!connections.is_empty());
        }
    }
}

#[tokio::test]
async fn second_run_makes_zero_gateway_calls() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("graph.json");
    let gateway = Arc::new(StubGateway::with_connections(&[
        ("ember", &["lantern"]),
        ("lantern", &["ember"]),
    ]));

    let mut first = pipeline(&path, &["ember", "lantern"], gateway.clone());
    first.run().await.unwrap();
    let after_first = read_graph(&path);
    assert_eq!(gateway.connection_calls(), 2);
    assert_eq!(gateway.description_calls(), 2);

    let mut second = pipeline(&path, &["ember", "lantern"], gateway.clone());
    let report = second.run().await.unwrap();

    assert_eq!(gateway.connection_calls(), 2);
    assert_eq!(gateway.description_calls(), 2);
    assert_eq!(report.connections.skipped, 2);
    assert_eq!(report.descriptions.skipped, 2);
    assert_eq!(read_graph(&path), after_first);
}

#[tokio::test]
async fn hallucinated_and_self_connections_are_filtered() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("graph.json");
    let gateway = Arc::new(StubGateway::with_connections(&[
        ("ember", &["lantern", "zeppelin", "ember", "lantern"]),
        ("lantern", &[]),
    ]));

    let mut pipeline = pipeline(&path, &["ember", "lantern"], gateway);
    pipeline.run().await.unwrap();

    let graph = read_graph(&path);
    let ember = graph.iter().find(|e| e.word == "ember").unwrap();
    assert_eq!(
        ember.connections.as_deref(),
        Some(&["lantern".to_string()][..])
    );
}

#[tokio::test]
async fn words_without_connections_get_no_description() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("graph.json");
    let gateway = Arc::new(StubGateway::with_connections(&[
        ("ember", &["lantern"]),
        ("lantern", &[]),
    ]));

    let mut pipeline = pipeline(&path, &["ember", "lantern"], gateway.clone());
    let report = pipeline.run().await.unwrap();

    // lantern's empty result is still recorded (phase 1), but phase 2
    // skips it without calling the gateway
    assert_eq!(report.connections.generated, 2);
    assert_eq!(report.connections.empty, 1);
    assert_eq!(report.descriptions.generated, 1);
    assert_eq!(report.descriptions.empty, 1);
    assert_eq!(gateway.description_calls(), 1);

    let graph = read_graph(&path);
    let lantern = graph.iter().find(|e| e.word == "lantern").unwrap();
    assert_eq!(lantern.connections.as_deref(), Some(&[][..]));
    assert!(lantern.description.is_none());
}

#[tokio::test]
async fn failure_is_contained_and_earlier_progress_is_durable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("graph.json");
    let mut stub = StubGateway::with_connections(&[
        ("ember", &["lantern"]),
        ("lantern", &["ember"]),
        ("torch", &["ember"]),
    ]);
    stub.failing_connections.insert("lantern".to_string());
    let gateway = Arc::new(stub);

    let mut first = pipeline(&path, &["ember", "lantern", "torch"], gateway.clone());
    let report = first.run().await.unwrap();

    assert_eq!(report.connections.generated, 2);
    assert_eq!(report.connections.failed, 1);

    // the failed word is absent from the checkpoint's completed set but
    // the words around it are durably recorded
    let graph = read_graph(&path);
    let lantern = graph.iter().find(|e| e.word == "lantern").unwrap();
    assert!(lantern.connections.is_none());
    assert!(graph.iter().find(|e| e.word == "ember").unwrap().connections.is_some());
    assert!(graph.iter().find(|e| e.word == "torch").unwrap().connections.is_some());

    // a later run retries only the failed word
    let calls_before = gateway.connection_calls();
    let mut second = pipeline(&path, &["ember", "lantern", "torch"], gateway.clone());
    second.run().await.unwrap();
    let retried: Vec<String> = gateway.calls.lock().unwrap().connections[calls_before..].to_vec();
    assert_eq!(retried, vec!["lantern".to_string()]);
}

#[tokio::test]
async fn preseeded_graph_resumes_without_repeat_calls() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("graph.json");
    std::fs::write(
        &path,
        r#"[
            {"word": "ember", "connections": ["lantern"], "description": "A dying coal."},
            {"word": "lantern", "connections": ["ember"]}
        ]"#,
    )
    .unwrap();

    let gateway = Arc::new(StubGateway::with_connections(&[
        ("ember", &["lantern"]),
        ("lantern", &["ember"]),
    ]));

    let mut pipeline = pipeline(&path, &["ember", "lantern"], gateway.clone());
    pipeline.run().await.unwrap();

    // ember was fully complete; lantern only needed its description
    assert_eq!(gateway.connection_calls(), 0);
    assert_eq!(gateway.description_calls(), 1);
    assert_eq!(
        gateway.calls.lock().unwrap().descriptions,
        vec!["lantern".to_string()]
    );

    let graph = read_graph(&path);
    let ember = graph.iter().find(|e| e.word == "ember").unwrap();
    assert_eq!(ember.description.as_deref(), Some("A dying coal."));
}

#[tokio::test]
async fn checkpoint_happens_before_the_next_call() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("graph.json");

    // a gateway that panics the whole test if called for the second word,
    // simulating a crash mid-run
    struct CrashingGateway {
        inner: StubGateway,
    }

    #[async_trait]
    impl InferenceGateway for CrashingGateway {
        async fn find_connections(
            &self,
            word: &str,
            candidates: &[String],
            max: usize,
        ) -> Result<Vec<String>> {
            if word == "lantern" {
                return Err(WordGraphError::Gateway("connection reset".to_string()));
            }
            self.inner.find_connections(word, candidates, max).await
        }

        async fn generate_description(&self, word: &str, connections: &[String]) -> Result<String> {
            self.inner.generate_description(word, connections).await
        }
    }

    let gateway = Arc::new(CrashingGateway {
        inner: StubGateway::with_connections(&[("ember", &["lantern"])]),
    });

    let store = GraphStore::load_or_seed(&path, &candidates(&["ember", "lantern"])).unwrap();
    let mut pipeline = Pipeline::new(store, gateway, 5, Duration::ZERO);
    pipeline.run_connections().await.unwrap();

    // ember's result hit disk before lantern's call was attempted
    let graph = read_graph(&path);
    let ember = graph.iter().find(|e| e.word == "ember").unwrap();
    assert_eq!(
        ember.connections.as_deref(),
        Some(&["lantern".to_string()][..])
    );
}
