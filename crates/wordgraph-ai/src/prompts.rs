use std::path::Path;
use wordgraph_core::{Result, WordGraphError};

/// The two prompt templates the gateway sends as system prompts.
///
/// Both files are read up front so a missing template aborts the run
/// before any gateway call is made.
#[derive(Debug, Clone)]
pub struct PromptLibrary {
    links_template: String,
    description_template: String,
}

impl PromptLibrary {
    pub fn load(links_path: &Path, description_path: &Path) -> Result<Self> {
        Ok(Self {
            links_template: read_template(links_path)?,
            description_template: read_template(description_path)?,
        })
    }

    /// Links template with the `{num_connections}` placeholder filled in.
    pub fn links_prompt(&self, num_connections: usize) -> String {
        self.links_template
            .replace("{num_connections}", &num_connections.to_string())
    }

    pub fn description_prompt(&self) -> &str {
        &self.description_template
    }
}

fn read_template(path: &Path) -> Result<String> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        WordGraphError::Configuration(format!(
            "cannot read prompt template {}: {}",
            path.display(),
            e
        ))
    })?;
    Ok(raw.trim().to_string())
}
