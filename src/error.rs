//! Typed errors for the recommendation pipeline.

/// Errors from the dish index.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error("failed to connect to index at {endpoint}: {message}")]
    Connect { endpoint: String, message: String },

    #[error("index query failed: {0}")]
    Query(String),
}

/// Errors from the LLM re-ranking stage.
#[derive(Debug, thiserror::Error)]
pub enum RerankError {
    #[error("generative service call failed: {0:#}")]
    Service(#[from] anyhow::Error),

    #[error("malformed ranking response: {reason}")]
    MalformedRankingResponse { reason: String },

    #[error("ranking response contains unknown dish '{dish}'")]
    UnknownDish { dish: String },
}

/// Top-level error returned by `Recommender`.
#[derive(Debug, thiserror::Error)]
pub enum RecommendError {
    #[error("query is empty")]
    EmptyQuery,

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Rerank(#[from] RerankError),
}
