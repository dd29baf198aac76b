//! In-process fakes for the dish index and the LLM.

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use menu_recommender::config::SearchMode;
use menu_recommender::error::IndexError;
use menu_recommender::llm::client::TextGenerator;
use menu_recommender::llm::rerank::Reranker;
use menu_recommender::models::{DishDetails, DishRecord};
use menu_recommender::pipeline::{PipelineOptions, Recommender};
use menu_recommender::search::index::{DishIndex, IndexConnection, Retriever, SearchRequest};

#[derive(Default)]
pub struct IndexCounters {
    pub opened: AtomicUsize,
    pub closed: AtomicUsize,
    pub requests: Mutex<Vec<SearchRequest>>,
}

impl IndexCounters {
    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn last_request(&self) -> Option<SearchRequest> {
        self.requests.lock().unwrap().last().cloned()
    }
}

#[derive(Clone, Copy, PartialEq)]
pub enum IndexBehavior {
    Ok,
    FailQuery,
    FailConnect,
}

pub struct FakeIndex {
    pub records: Vec<DishRecord>,
    pub behavior: IndexBehavior,
    pub counters: Arc<IndexCounters>,
}

impl FakeIndex {
    pub fn new(records: Vec<DishRecord>, behavior: IndexBehavior) -> Self {
        Self {
            records,
            behavior,
            counters: Arc::new(IndexCounters::default()),
        }
    }
}

struct FakeConnection {
    records: Vec<DishRecord>,
    behavior: IndexBehavior,
    counters: Arc<IndexCounters>,
}

#[async_trait]
impl DishIndex for FakeIndex {
    async fn connect(&self) -> Result<Box<dyn IndexConnection>, IndexError> {
        if self.behavior == IndexBehavior::FailConnect {
            return Err(IndexError::Connect {
                endpoint: "fake://index".to_string(),
                message: "refused".to_string(),
            });
        }
        self.counters.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(FakeConnection {
            records: self.records.clone(),
            behavior: self.behavior,
            counters: self.counters.clone(),
        }))
    }
}

#[async_trait]
impl IndexConnection for FakeConnection {
    async fn search(&self, request: &SearchRequest) -> Result<Vec<DishRecord>, IndexError> {
        self.counters.requests.lock().unwrap().push(request.clone());
        if self.behavior == IndexBehavior::FailQuery {
            let message = "Query call with protocol GRPC search failed";
            return Err(IndexError::Query(message.to_string()));
        }
        Ok(self.records.iter().take(request.limit).cloned().collect())
    }

    fn close(&mut self) {
        self.counters.closed.fetch_add(1, Ordering::SeqCst);
    }
}

pub struct FakeGenerator {
    reply: Result<String, String>,
    pub prompts: Mutex<Vec<String>>,
}

impl FakeGenerator {
    pub fn replying(reply: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Ok(reply.to_string()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn failing(message: &str) -> Arc<Self> {
        Arc::new(Self {
            reply: Err(message.to_string()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn calls(&self) -> usize {
        self.prompts.lock().unwrap().len()
    }
}

#[async_trait]
impl TextGenerator for FakeGenerator {
    async fn generate_json(&self, prompt: &str) -> anyhow::Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply.clone().map_err(|e| anyhow::anyhow!(e))
    }
}

pub fn dish(name: &str, cuisine: &str, category: &str, allergy: &str) -> DishRecord {
    DishRecord::new(
        name,
        DishDetails {
            cuisine: cuisine.to_string(),
            category: category.to_string(),
            description: format!("{name}, a house favourite"),
            allergy: allergy.to_string(),
        },
    )
}

/// A small mixed Indian / Japanese menu.
pub fn sample_menu() -> Vec<DishRecord> {
    vec![
        dish("Paneer Tikka", "Indian", "Veg", "Contains dairy"),
        dish("Ramen", "Japanese", "Non-Veg", "Contains gluten"),
        dish("Dal Makhani", "Indian", "Veg", "Contains dairy"),
        dish("Chicken Katsu", "Japanese", "Non-Veg", "Contains gluten, egg"),
        dish("Vegetable Tempura", "Japanese", "Veg", "Contains gluten"),
    ]
}

pub fn recommender(
    index: FakeIndex,
    generator: Arc<FakeGenerator>,
    options: PipelineOptions,
) -> (Recommender, Arc<IndexCounters>) {
    let counters = index.counters.clone();
    let recommender = Recommender::new(
        Retriever::new(Arc::new(index), SearchMode::Hybrid, 0.5),
        Reranker::new(generator),
        options,
    );
    (recommender, counters)
}
