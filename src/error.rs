use thiserror::Error;

#[derive(Error, Debug)]
pub enum SolverError {
    #[error("Invalid rational value: {0}")]
    InvalidRational(String),

    #[error("Malformed game: {0}")]
    MalformedGame(String),

    #[error("Chance probabilities at node {node} sum to {sum}, expected 1")]
    BadChanceProbs { node: usize, sum: String },

    #[error("Information set \"{label}\" (player {player}) has no active actions")]
    EmptySupport { player: u8, label: String },

    #[error("Support does not match game: {0}")]
    SupportMismatch(String),

    #[error("Unknown built-in game: {0}")]
    UnknownGame(String),

    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

pub type SolverResult<T> = Result<T, SolverError>;
