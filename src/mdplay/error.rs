use thiserror::Error;

#[derive(Error, Debug)]
pub enum PlaygroundError {
    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Render error: {0}")]
    Render(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    #[error("Config error: {0}")]
    Config(String),

    #[error("Api Error: {0}")]
    Api(String),
}

impl PlaygroundError {
    /// True for the durability-layer failures a store consumer is expected to
    /// log and survive.
    pub fn is_store_failure(&self) -> bool {
        matches!(
            self,
            PlaygroundError::Store(_) | PlaygroundError::Io(_) | PlaygroundError::Serialization(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, PlaygroundError>;
