pub mod gateway;
pub mod openai_provider;
pub mod prompts;

pub use gateway::InferenceGateway;
pub use openai_provider::{parse_connections, parse_description, OpenAiGateway};
pub use prompts::PromptLibrary;
