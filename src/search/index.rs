use std::ops::Deref;
use std::sync::Arc;

use async_trait::async_trait;

use crate::config::SearchMode;
use crate::error::IndexError;
use crate::models::{DishRecord, RetrievalResult};

/// Notice shown to the user when the index query fails.
pub const QUERY_FAILED_NOTICE: &str =
    "Dish search is unavailable right now, so no recommendations could be retrieved.";

/// Fields the hybrid keyword side searches over.
pub const SEARCH_FIELDS: [&str; 4] = ["dish", "description", "cuisine", "category"];

/// One search against the dish index.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub query: String,
    pub limit: usize,
    pub mode: SearchMode,
    /// Hybrid weighting: 0 = pure keyword, 1 = pure vector
    pub alpha: f32,
}

/// A document index holding dish records.
#[async_trait]
pub trait DishIndex: Send + Sync {
    /// Open a connection for a single pipeline run.
    async fn connect(&self) -> Result<Box<dyn IndexConnection>, IndexError>;
}

/// An open connection to a [`DishIndex`].
#[async_trait]
pub trait IndexConnection: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<DishRecord>, IndexError>;

    /// Release the connection. Called exactly once, by [`ScopedConnection`].
    fn close(&mut self);
}

/// Closes the wrapped connection when dropped, on every exit path.
pub struct ScopedConnection {
    inner: Box<dyn IndexConnection>,
}

impl ScopedConnection {
    pub async fn open(index: &dyn DishIndex) -> Result<Self, IndexError> {
        let inner = index.connect().await?;
        Ok(Self { inner })
    }
}

impl Deref for ScopedConnection {
    type Target = dyn IndexConnection;

    fn deref(&self) -> &Self::Target {
        self.inner.as_ref()
    }
}

impl Drop for ScopedConnection {
    fn drop(&mut self) {
        self.inner.close();
        tracing::debug!("Index connection released");
    }
}

/// Dishes retrieved for a query, plus a notice when the query failed.
#[derive(Debug, Clone, Default)]
pub struct Retrieval {
    pub dishes: RetrievalResult,
    pub notice: Option<String>,
}

/// First pipeline stage: similarity search against the dish index.
#[derive(Clone)]
pub struct Retriever {
    index: Arc<dyn DishIndex>,
    mode: SearchMode,
    alpha: f32,
}

impl Retriever {
    pub fn new(index: Arc<dyn DishIndex>, mode: SearchMode, alpha: f32) -> Self {
        let alpha = if alpha.is_finite() {
            alpha.clamp(0.0, 1.0)
        } else {
            0.5
        };
        Self { index, mode, alpha }
    }

    /// Search for at most `limit` dishes matching `query`.
    ///
    /// A failed query is absorbed: the result is empty and `notice` is set.
    /// Failing to open the connection is returned as an error.
    pub async fn retrieve(&self, query: &str, limit: usize) -> Result<Retrieval, IndexError> {
        let connection = ScopedConnection::open(self.index.as_ref()).await?;

        let request = SearchRequest {
            query: query.to_string(),
            limit,
            mode: self.mode,
            alpha: self.alpha,
        };

        match connection.search(&request).await {
            Ok(records) => {
                let dishes = extract_features(records);
                tracing::info!(
                    "Retrieved {} dishes ({} search, limit {limit})",
                    dishes.len(),
                    self.mode
                );
                Ok(Retrieval {
                    dishes,
                    notice: None,
                })
            }
            Err(e) => {
                tracing::warn!("Index query failed: {e}");
                Ok(Retrieval {
                    dishes: RetrievalResult::new(),
                    notice: Some(QUERY_FAILED_NOTICE.to_string()),
                })
            }
        }
    }
}

/// Key the index objects by dish name. Later duplicates overwrite earlier ones.
fn extract_features(records: Vec<DishRecord>) -> RetrievalResult {
    records
        .into_iter()
        .filter(|r| !r.dish.trim().is_empty())
        .collect()
}
