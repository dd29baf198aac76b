use std::sync::Arc;

use anyhow::Context;
use serde_json::{Map, Value};

use crate::error::RerankError;
use crate::llm::client::TextGenerator;
use crate::models::{DishRecord, RankedResult, RetrievalResult};

/// Second pipeline stage: the LLM reorders and prunes the retrieved dishes.
#[derive(Clone)]
pub struct Reranker {
    generator: Arc<dyn TextGenerator>,
}

impl Reranker {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self { generator }
    }

    /// Rank `data` by relevance to `query`.
    ///
    /// Returns the ranked dishes and the first of them as the top pick. An
    /// empty `data` is returned as-is without calling the model.
    pub async fn rerank(
        &self,
        data: &RetrievalResult,
        query: &str,
    ) -> Result<(RankedResult, Option<DishRecord>), RerankError> {
        if data.is_empty() {
            return Ok((RankedResult::new(), None));
        }

        let prompt = build_rerank_prompt(data, query)?;
        let response = self.generator.generate_json(&prompt).await?;
        let ranked = parse_ranking(&response, data)?;

        tracing::info!("Re-ranking kept {} of {} dishes", ranked.len(), data.len());

        let top_pick = ranked.first();
        Ok((ranked, top_pick))
    }
}

fn build_rerank_prompt(data: &RetrievalResult, query: &str) -> Result<String, RerankError> {
    let candidates =
        serde_json::to_string_pretty(data).context("Failed to encode candidate dishes")?;
    Ok(format!(
        "You are ranking restaurant dishes for a diner.\n\
         Diner's request: {query}\n\n\
         Candidate dishes, as a JSON object keyed by dish name:\n{candidates}\n\n\
         Reorder the dishes by how well they match the request, most relevant first. \
         Remove only the most irrelevant dishes and keep most of them. \
         Never add or rename dishes. \
         Respond with ONLY a JSON object using exactly the same keys and attribute objects, \
         adding an integer \"rank\" field to every dish (1 = most relevant)."
    ))
}

/// Decode the model's reply into a ranking over `data`.
///
/// The reply must contain a JSON object whose values are objects; every key
/// must name a dish from `data`. When every entry carries a numeric `rank`
/// the entries are ordered by it, otherwise the reply's own order is kept.
/// Dish attributes always come from `data`.
pub fn parse_ranking(content: &str, data: &RetrievalResult) -> Result<RankedResult, RerankError> {
    let object = extract_json_object(content)?;

    let mut entries: Vec<(String, Option<f64>)> = Vec::with_capacity(object.len());
    for (dish, value) in object {
        let Value::Object(fields) = value else {
            return Err(RerankError::MalformedRankingResponse {
                reason: format!("entry '{dish}' is not an object"),
            });
        };
        if !data.contains(&dish) {
            return Err(RerankError::UnknownDish { dish });
        }
        let rank = fields.get("rank").and_then(Value::as_f64);
        entries.push((dish, rank));
    }

    if !entries.is_empty() && entries.iter().all(|(_, rank)| rank.is_some()) {
        // Stable: equal ranks keep reply order.
        entries.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
    }

    Ok(entries
        .into_iter()
        .filter_map(|(dish, _)| {
            let details = data.get(&dish)?.clone();
            Some((dish, details))
        })
        .collect())
}

fn extract_json_object(content: &str) -> Result<Map<String, Value>, RerankError> {
    let malformed = |reason: String| RerankError::MalformedRankingResponse { reason };

    let value = match serde_json::from_str::<Value>(content.trim()) {
        Ok(v) => v,
        Err(first_err) => {
            // Tolerate prose or a Markdown fence around the object
            let (Some(start), Some(end)) = (content.find('{'), content.rfind('}')) else {
                return Err(malformed(format!("not JSON: {first_err}")));
            };
            if end < start {
                return Err(malformed(format!("not JSON: {first_err}")));
            }
            serde_json::from_str::<Value>(&content[start..=end])
                .map_err(|e| malformed(format!("not JSON: {e}")))?
        }
    };

    match value {
        Value::Object(map) => Ok(map),
        other => Err(malformed(format!(
            "expected an object keyed by dish name, got {}",
            json_kind(&other)
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
