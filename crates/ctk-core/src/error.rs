use thiserror::Error;

#[derive(Error, Debug)]
pub enum CtkError {
    #[error("Duplicate category name: {name}")]
    DuplicateCategory { name: String },
    #[error("Category {name} has no match pattern")]
    EmptyCategory { name: String },
    #[error("Invalid pattern {pattern:?} in category {category}: {source}")]
    InvalidPattern {
        category: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },
    #[error("Config error: {0}")]
    Config(#[from] serde_json::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub type Result<T> = std::result::Result<T, CtkError>;
