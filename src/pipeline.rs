//! The recommendation pipeline: normalize → retrieve → rerank → filter.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::Config;
use crate::error::{RecommendError, RerankError};
use crate::filter::{filter_recommendations, FilterCriteria};
use crate::llm::client::{LlmClient, TextGenerator};
use crate::llm::rerank::Reranker;
use crate::models::{DishRecord, RankedResult, RetrievalResult};
use crate::search::index::{DishIndex, Retriever};
use crate::search::weaviate::WeaviateIndex;

/// Notice attached when the ranking reply was unusable and retrieval order is returned.
pub const UNRANKED_NOTICE: &str =
    "Recommendations could not be ranked, so they are shown in search order.";

/// Notice attached when the filters removed every recommendation.
pub const NO_FILTER_MATCH_NOTICE: &str =
    "No dishes match your filters, so unfiltered recommendations are shown.";

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Maximum dishes retrieved per query
    pub limit: usize,
    /// Debug snapshot of each retrieval result
    pub snapshot_path: Option<PathBuf>,
    /// Return the unranked set instead of failing on an unusable ranking reply
    pub rerank_fallback: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            limit: 4,
            snapshot_path: None,
            rerank_fallback: false,
        }
    }
}

/// Result of one pipeline run.
#[derive(Debug, Clone, Default)]
pub struct Recommendation {
    pub ranked: RankedResult,
    pub top_pick: Option<DishRecord>,
    /// User-facing message about a degraded result
    pub notice: Option<String>,
}

pub struct Recommender {
    retriever: Retriever,
    reranker: Reranker,
    options: PipelineOptions,
}

impl Recommender {
    pub fn new(retriever: Retriever, reranker: Reranker, options: PipelineOptions) -> Self {
        Self {
            retriever,
            reranker,
            options,
        }
    }

    /// Wire the pipeline to the configured index and LLM provider.
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let index: Arc<dyn DishIndex> = Arc::new(WeaviateIndex::new(config.index.clone())?);
        let generator: Arc<dyn TextGenerator> = Arc::new(LlmClient::new(config.llm.clone())?);
        Ok(Self::new(
            Retriever::new(index, config.index.search_mode, config.index.alpha),
            Reranker::new(generator),
            PipelineOptions {
                limit: config.index.limit,
                snapshot_path: config.snapshot_path.clone(),
                rerank_fallback: config.rerank_fallback,
            },
        ))
    }

    /// Retrieve and rank dishes for a preference query or dish name.
    pub async fn recommend(&self, query: &str) -> Result<Recommendation, RecommendError> {
        let query = normalize_query(query)?;

        let retrieval = self.retriever.retrieve(query, self.options.limit).await?;
        if let Some(path) = &self.options.snapshot_path {
            write_snapshot(path, &retrieval.dishes);
        }

        let reranked = self.reranker.rerank(&retrieval.dishes, query).await;
        match reranked {
            Ok((ranked, top_pick)) => Ok(Recommendation {
                ranked,
                top_pick,
                notice: retrieval.notice,
            }),
            Err(e) if self.options.rerank_fallback && is_bad_reply(&e) => {
                tracing::warn!("Re-ranking failed, returning retrieval order: {e}");
                let top_pick = retrieval.dishes.first();
                Ok(Recommendation {
                    ranked: retrieval.dishes,
                    top_pick,
                    notice: Some(UNRANKED_NOTICE.to_string()),
                })
            }
            Err(e) => {
                tracing::error!("Re-ranking failed: {e}");
                Err(e.into())
            }
        }
    }

    /// Like [`recommend`](Self::recommend), then apply `criteria`.
    ///
    /// If the filters remove every dish from a non-empty ranking, the
    /// unfiltered ranking is returned with a notice instead.
    pub async fn recommend_filtered(
        &self,
        query: &str,
        criteria: &FilterCriteria,
    ) -> Result<Recommendation, RecommendError> {
        let recommendation = self.recommend(query).await?;
        if criteria.is_unconstrained() || recommendation.ranked.is_empty() {
            return Ok(recommendation);
        }

        let filtered = filter_recommendations(&recommendation.ranked, criteria);
        if filtered.is_empty() {
            tracing::info!(
                "Filters removed all {} recommendations; returning unfiltered set",
                recommendation.ranked.len()
            );
            return Ok(Recommendation {
                notice: recommendation
                    .notice
                    .or_else(|| Some(NO_FILTER_MATCH_NOTICE.to_string())),
                ..recommendation
            });
        }

        let top_pick = filtered.first();
        Ok(Recommendation {
            ranked: filtered,
            top_pick,
            notice: recommendation.notice,
        })
    }
}

/// The query is used verbatim; only a blank query is rejected.
pub fn normalize_query(query: &str) -> Result<&str, RecommendError> {
    if query.trim().is_empty() {
        Err(RecommendError::EmptyQuery)
    } else {
        Ok(query)
    }
}

fn is_bad_reply(e: &RerankError) -> bool {
    matches!(
        e,
        RerankError::MalformedRankingResponse { .. } | RerankError::UnknownDish { .. }
    )
}

/// Atomic write via temp file + rename. Failures are logged, never returned.
fn write_snapshot(path: &Path, dishes: &RetrievalResult) {
    let data = match serde_json::to_string_pretty(dishes) {
        Ok(data) => data,
        Err(e) => {
            tracing::warn!("Failed to encode retrieval snapshot: {e}");
            return;
        }
    };
    let tmp_path = path.with_extension("json.tmp");
    let written = std::fs::write(&tmp_path, &data).and_then(|_| std::fs::rename(&tmp_path, path));
    if let Err(e) = written {
        tracing::warn!("Failed to write retrieval snapshot to {}: {e}", path.display());
    }
}
