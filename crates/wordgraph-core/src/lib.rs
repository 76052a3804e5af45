pub mod config;
pub mod error;
pub mod taxonomy;
pub mod types;

pub use config::{
    BatchConfig, GatewayConfig, PathConfig, PipelineConfig, WordGraphConfig,
};
pub use error::{Result, WordGraphError};
pub use taxonomy::Taxonomy;
pub use types::{combo_key, TagCombinationSet, TagSet, WordEntry};
