use crate::roadmap::RoadmapError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ErkError {
    #[error("not initialized: run 'erk init'")]
    NotInitialized,

    #[error("issue not found: #{0}")]
    IssueNotFound(u64),

    #[error("invalid issue reference '{0}': expected a number, '#N', or an issue URL")]
    InvalidIssueRef(String),

    #[error(transparent)]
    Roadmap(#[from] RoadmapError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),
}

pub type Result<T> = std::result::Result<T, ErkError>;
