use thiserror::Error;

#[derive(Error, Debug)]
pub enum WordGraphError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("gateway error: {0}")]
    Gateway(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("validation error: {0}")]
    Validation(String),

    #[error("corrupt input: {0}")]
    CorruptInput(String),

    #[error("combination space exhausted after {attempts} consecutive rejections")]
    CombinationSpaceExhausted { attempts: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, WordGraphError>;
