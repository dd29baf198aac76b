//! Weaviate-compatible dish index reached over REST + GraphQL.
//!
//! A connection is opened by probing `/v1/.well-known/ready`; searches go to
//! `/v1/graphql` as `nearText` or `hybrid` queries against one collection.

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::config::{IndexConfig, SearchMode};
use crate::error::IndexError;
use crate::models::{DishDetails, DishRecord};
use crate::search::index::{DishIndex, IndexConnection, SearchRequest, SEARCH_FIELDS};

/// Properties requested for every dish object.
const RETURN_PROPERTIES: &str = "dish cuisine category description allergy";

pub struct WeaviateIndex {
    client: reqwest::Client,
    config: IndexConfig,
}

impl WeaviateIndex {
    pub fn new(config: IndexConfig) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .context("Failed to build index HTTP client")?;
        Ok(Self { client, config })
    }

    fn endpoint(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }
}

#[async_trait]
impl DishIndex for WeaviateIndex {
    async fn connect(&self) -> Result<Box<dyn IndexConnection>, IndexError> {
        let endpoint = self.endpoint().to_string();
        let url = format!("{endpoint}/v1/.well-known/ready");
        let connect_error = |message: String| IndexError::Connect {
            endpoint: endpoint.clone(),
            message,
        };

        let resp = authorize(self.client.get(&url), &self.config)
            .send()
            .await
            .map_err(|e| connect_error(e.to_string()))?;

        if !resp.status().is_success() {
            return Err(connect_error(format!("readiness probe returned {}", resp.status())));
        }

        tracing::debug!("Connected to index at {endpoint}");
        Ok(Box::new(WeaviateConnection {
            client: self.client.clone(),
            config: self.config.clone(),
            open: true,
        }))
    }
}

struct WeaviateConnection {
    client: reqwest::Client,
    config: IndexConfig,
    open: bool,
}

#[async_trait]
impl IndexConnection for WeaviateConnection {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<DishRecord>, IndexError> {
        if !self.open {
            return Err(IndexError::Query("connection already closed".to_string()));
        }

        let url = format!("{}/v1/graphql", self.config.base_url.trim_end_matches('/'));
        let body = serde_json::json!({
            "query": build_graphql_query(&self.config.collection, request),
        });

        let resp = authorize(self.client.post(&url), &self.config)
            .json(&body)
            .send()
            .await
            .map_err(|e| IndexError::Query(e.to_string()))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(IndexError::Query(format!("GraphQL endpoint returned {status}: {text}")));
        }

        let payload: serde_json::Value = resp
            .json()
            .await
            .map_err(|e| IndexError::Query(format!("undecodable response: {e}")))?;

        parse_graphql_response(&self.config.collection, payload)
    }

    fn close(&mut self) {
        self.open = false;
    }
}

fn authorize(builder: reqwest::RequestBuilder, config: &IndexConfig) -> reqwest::RequestBuilder {
    let mut builder = builder;
    if let Some(key) = config.api_key.as_deref() {
        builder = builder.bearer_auth(key);
    }
    if let Some(key) = config.embedding_api_key.as_deref() {
        builder = builder.header("X-HuggingFace-Api-Key", key);
    }
    builder
}

/// Build the GraphQL `Get` query for one search.
pub fn build_graphql_query(collection: &str, request: &SearchRequest) -> String {
    // A JSON string literal is a valid GraphQL string literal.
    let query = serde_json::Value::String(request.query.clone()).to_string();

    let operator = match request.mode {
        SearchMode::NearText => format!("nearText: {{concepts: [{query}]}}"),
        SearchMode::Hybrid => {
            let fields = SEARCH_FIELDS
                .iter()
                .map(|f| format!("\"{f}\""))
                .collect::<Vec<_>>()
                .join(", ");
            format!(
                "hybrid: {{query: {query}, alpha: {}, properties: [{fields}]}}",
                request.alpha
            )
        }
    };

    format!(
        "{{ Get {{ {collection}({operator}, limit: {}) {{ {RETURN_PROPERTIES} }} }} }}",
        request.limit
    )
}

#[derive(Deserialize)]
struct GraphqlError {
    message: String,
}

#[derive(Deserialize)]
struct RawDish {
    #[serde(default)]
    dish: Option<String>,
    #[serde(default)]
    cuisine: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    allergy: Option<String>,
}

/// Turn a GraphQL reply into dish records, in the order the index returned them.
///
/// A non-empty `errors` array is a query failure even when `data` is present.
pub fn parse_graphql_response(
    collection: &str,
    payload: serde_json::Value,
) -> Result<Vec<DishRecord>, IndexError> {
    if let Some(errors) = payload.get("errors").filter(|e| !e.is_null()) {
        let errors: Vec<GraphqlError> = serde_json::from_value(errors.clone())
            .map_err(|e| IndexError::Query(format!("unreadable errors field: {e}")))?;
        if !errors.is_empty() {
            let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
            return Err(IndexError::Query(messages.join("; ")));
        }
    }

    let objects = payload
        .get("data")
        .and_then(|d| d.get("Get"))
        .and_then(|g| g.get(collection))
        .ok_or_else(|| IndexError::Query(format!("no results for collection {collection}")))?;

    if objects.is_null() {
        return Ok(Vec::new());
    }

    let raw: Vec<RawDish> = serde_json::from_value(objects.clone())
        .map_err(|e| IndexError::Query(format!("unexpected object shape: {e}")))?;

    Ok(raw
        .into_iter()
        .filter_map(|r| {
            let dish = r.dish.filter(|d| !d.trim().is_empty())?;
            Some(DishRecord::new(
                dish,
                DishDetails {
                    cuisine: r.cuisine.unwrap_or_default(),
                    category: r.category.unwrap_or_default(),
                    description: r.description.unwrap_or_default(),
                    allergy: r.allergy.unwrap_or_default(),
                },
            ))
        })
        .collect())
}
