//! Integration tests for the recommendation pipeline.
//!
//! The index and the LLM are replaced by in-process fakes so the full
//! retrieve → rerank → filter flow runs without network access.

mod common;

use common::{dish, recommender, sample_menu, FakeGenerator, FakeIndex, IndexBehavior};

use menu_recommender::config::SearchMode;
use menu_recommender::error::{IndexError, RecommendError, RerankError};
use menu_recommender::filter::FilterCriteria;
use menu_recommender::llm::rerank::Reranker;
use menu_recommender::models::RetrievalResult;
use menu_recommender::pipeline::{PipelineOptions, NO_FILTER_MATCH_NOTICE, UNRANKED_NOTICE};
use menu_recommender::search::index::QUERY_FAILED_NOTICE;

fn options(limit: usize) -> PipelineOptions {
    PipelineOptions {
        limit,
        ..PipelineOptions::default()
    }
}

const RANKED_REPLY: &str = r#"{
    "Vegetable Tempura": {"cuisine": "Japanese", "category": "Veg", "rank": 3},
    "Dal Makhani": {"cuisine": "Indian", "category": "Veg", "rank": 1},
    "Paneer Tikka": {"cuisine": "Indian", "category": "Veg", "rank": 2}
}"#;

#[tokio::test]
async fn test_end_to_end_ranked_recommendation() {
    let generator = FakeGenerator::replying(RANKED_REPLY);
    let index = FakeIndex::new(sample_menu(), IndexBehavior::Ok);
    let (recommender, counters) = recommender(index, generator.clone(), options(10));

    let rec = recommender.recommend("Veg dishes please").await.unwrap();

    let keys: Vec<&str> = rec.ranked.keys().collect();
    assert_eq!(keys, vec!["Dal Makhani", "Paneer Tikka", "Vegetable Tempura"]);
    assert_eq!(rec.top_pick.unwrap().dish, "Dal Makhani");
    assert!(rec.notice.is_none());

    // One search with the verbatim query and configured mode
    let request = counters.last_request().unwrap();
    assert_eq!(request.query, "Veg dishes please");
    assert_eq!(request.limit, 10);
    assert_eq!(request.mode, SearchMode::Hybrid);
    assert_eq!(request.alpha, 0.5);

    // One LLM call carrying the query and the retrieved dishes
    assert_eq!(generator.calls(), 1);
    let prompt = generator.prompts.lock().unwrap()[0].clone();
    assert!(prompt.contains("Veg dishes please"));
    assert!(prompt.contains("Chicken Katsu"));

    assert_eq!(counters.opened(), 1);
    assert_eq!(counters.closed(), 1);
}

#[tokio::test]
async fn test_ranked_keys_are_subset_of_retrieved() {
    let generator = FakeGenerator::replying(r#"{"Ramen": {}, "Paneer Tikka": {}}"#);
    let index = FakeIndex::new(sample_menu(), IndexBehavior::Ok);
    let (recommender, _) = recommender(index, generator, options(4));

    let rec = recommender.recommend("noodles").await.unwrap();
    let retrieved: Vec<String> = sample_menu().into_iter().take(4).map(|d| d.dish).collect();
    for key in rec.ranked.keys() {
        assert!(retrieved.iter().any(|d| d == key), "{key} was never retrieved");
    }
}

#[tokio::test]
async fn test_dish_outside_retrieval_limit_is_rejected() {
    // "Vegetable Tempura" exists in the menu but is beyond the limit of 2
    let generator = FakeGenerator::replying(RANKED_REPLY);
    let index = FakeIndex::new(sample_menu(), IndexBehavior::Ok);
    let (recommender, counters) = recommender(index, generator, options(2));

    let err = recommender.recommend("veg").await.unwrap_err();
    assert!(matches!(
        err,
        RecommendError::Rerank(RerankError::UnknownDish { ref dish }) if dish == "Vegetable Tempura"
    ));
    // Released even though the pipeline failed
    assert_eq!(counters.closed(), 1);
}

#[tokio::test]
async fn test_empty_retrieval_skips_llm() {
    let generator = FakeGenerator::replying(RANKED_REPLY);
    let index = FakeIndex::new(vec![], IndexBehavior::Ok);
    let (recommender, counters) = recommender(index, generator.clone(), options(4));

    let rec = recommender.recommend("anything").await.unwrap();
    assert!(rec.ranked.is_empty());
    assert!(rec.top_pick.is_none());
    assert_eq!(generator.calls(), 0);
    assert_eq!(counters.closed(), 1);
}

#[tokio::test]
async fn test_reranker_on_empty_input() {
    let generator = FakeGenerator::failing("must not be called");
    let reranker = Reranker::new(generator.clone());

    let (ranked, top_pick) = reranker.rerank(&RetrievalResult::new(), "spicy").await.unwrap();
    assert!(ranked.is_empty());
    assert!(top_pick.is_none());
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn test_index_query_failure_returns_empty_with_notice() {
    let generator = FakeGenerator::replying(RANKED_REPLY);
    let index = FakeIndex::new(sample_menu(), IndexBehavior::FailQuery);
    let (recommender, counters) = recommender(index, generator.clone(), options(4));

    let rec = recommender.recommend("ramen").await.unwrap();
    assert!(rec.ranked.is_empty());
    assert!(rec.top_pick.is_none());
    assert_eq!(rec.notice.as_deref(), Some(QUERY_FAILED_NOTICE));
    assert_eq!(generator.calls(), 0);
    assert_eq!(counters.opened(), 1);
    assert_eq!(counters.closed(), 1);
}

#[tokio::test]
async fn test_index_connect_failure_propagates() {
    let generator = FakeGenerator::replying(RANKED_REPLY);
    let index = FakeIndex::new(sample_menu(), IndexBehavior::FailConnect);
    let (recommender, counters) = recommender(index, generator.clone(), options(4));

    let err = recommender.recommend("ramen").await.unwrap_err();
    assert!(matches!(err, RecommendError::Index(IndexError::Connect { .. })));
    assert_eq!(counters.closed(), 0);
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn test_blank_query_makes_no_external_calls() {
    let generator = FakeGenerator::replying(RANKED_REPLY);
    let index = FakeIndex::new(sample_menu(), IndexBehavior::Ok);
    let (recommender, counters) = recommender(index, generator.clone(), options(4));

    let err = recommender.recommend("   ").await.unwrap_err();
    assert!(matches!(err, RecommendError::EmptyQuery));
    assert_eq!(counters.opened(), 0);
    assert_eq!(generator.calls(), 0);
}

#[tokio::test]
async fn test_malformed_reply_propagates_by_default() {
    let generator = FakeGenerator::replying("Sorry, I can't rank food.");
    let index = FakeIndex::new(sample_menu(), IndexBehavior::Ok);
    let (recommender, counters) = recommender(index, generator, options(4));

    let err = recommender.recommend("veg").await.unwrap_err();
    assert!(matches!(
        err,
        RecommendError::Rerank(RerankError::MalformedRankingResponse { .. })
    ));
    assert_eq!(counters.closed(), 1);
}

#[tokio::test]
async fn test_malformed_reply_falls_back_when_enabled() {
    let generator = FakeGenerator::replying("[\"Ramen\"]");
    let index = FakeIndex::new(sample_menu(), IndexBehavior::Ok);
    let opts = PipelineOptions {
        rerank_fallback: true,
        ..options(3)
    };
    let (recommender, _) = recommender(index, generator, opts);

    let rec = recommender.recommend("veg").await.unwrap();
    let keys: Vec<&str> = rec.ranked.keys().collect();
    assert_eq!(keys, vec!["Paneer Tikka", "Ramen", "Dal Makhani"]);
    assert_eq!(rec.top_pick.unwrap().dish, "Paneer Tikka");
    assert_eq!(rec.notice.as_deref(), Some(UNRANKED_NOTICE));
}

#[tokio::test]
async fn test_service_failure_is_not_masked_by_fallback() {
    let generator = FakeGenerator::failing("quota exceeded");
    let index = FakeIndex::new(sample_menu(), IndexBehavior::Ok);
    let opts = PipelineOptions {
        rerank_fallback: true,
        ..options(3)
    };
    let (recommender, _) = recommender(index, generator, opts);

    let err = recommender.recommend("veg").await.unwrap_err();
    assert!(matches!(err, RecommendError::Rerank(RerankError::Service(_))));
    assert!(err.to_string().contains("quota exceeded"));
}

#[tokio::test]
async fn test_filtered_recommendation_by_cuisine() {
    let generator =
        FakeGenerator::replying(r#"{"Paneer Tikka": {"rank": 1}, "Ramen": {"rank": 2}}"#);
    let index = FakeIndex::new(sample_menu(), IndexBehavior::Ok);
    let (recommender, _) = recommender(index, generator, options(2));

    let criteria = FilterCriteria::new("Indian", "Both", Vec::<String>::new());
    let rec = recommender.recommend_filtered("dinner", &criteria).await.unwrap();
    let keys: Vec<&str> = rec.ranked.keys().collect();
    assert_eq!(keys, vec!["Paneer Tikka"]);
    assert_eq!(rec.top_pick.unwrap().dish, "Paneer Tikka");
}

#[tokio::test]
async fn test_filtered_recommendation_by_allergy() {
    let generator =
        FakeGenerator::replying(r#"{"Ramen": {"rank": 1}, "Paneer Tikka": {"rank": 2}}"#);
    let index = FakeIndex::new(sample_menu(), IndexBehavior::Ok);
    let (recommender, _) = recommender(index, generator, options(2));

    let criteria = FilterCriteria::new("Both", "Both", ["gluten"]);
    let rec = recommender.recommend_filtered("dinner", &criteria).await.unwrap();
    let keys: Vec<&str> = rec.ranked.keys().collect();
    assert_eq!(keys, vec!["Paneer Tikka"]);
    assert_eq!(rec.top_pick.unwrap().dish, "Paneer Tikka");
}

#[tokio::test]
async fn test_filters_removing_everything_return_unfiltered_with_notice() {
    let generator =
        FakeGenerator::replying(r#"{"Ramen": {"rank": 1}, "Paneer Tikka": {"rank": 2}}"#);
    let index = FakeIndex::new(sample_menu(), IndexBehavior::Ok);
    let (recommender, _) = recommender(index, generator, options(2));

    let criteria = FilterCriteria::new("Italian", "Both", Vec::<String>::new());
    let rec = recommender.recommend_filtered("dinner", &criteria).await.unwrap();
    assert_eq!(rec.ranked.len(), 2);
    assert_eq!(rec.top_pick.unwrap().dish, "Ramen");
    assert_eq!(rec.notice.as_deref(), Some(NO_FILTER_MATCH_NOTICE));
}

#[tokio::test]
async fn test_retrieval_snapshot_is_written() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = dir.path().join("resp.json");
    let generator = FakeGenerator::replying(r#"{"Ramen": {}}"#);
    let index = FakeIndex::new(
        vec![dish("Ramen", "Japanese", "Non-Veg", "Contains gluten")],
        IndexBehavior::Ok,
    );
    let opts = PipelineOptions {
        snapshot_path: Some(snapshot.clone()),
        ..options(4)
    };
    let (recommender, _) = recommender(index, generator, opts);

    recommender.recommend("noodles").await.unwrap();

    let written: RetrievalResult =
        serde_json::from_str(&std::fs::read_to_string(&snapshot).unwrap()).unwrap();
    assert_eq!(written.get("Ramen").unwrap().allergy, "Contains gluten");
}
