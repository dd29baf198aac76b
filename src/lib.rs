//! # menu-recommender
//!
//! A restaurant menu recommendation service. A free-text preference (or a
//! dish name) is matched against a vector index of dishes, the candidates
//! are re-ranked by an LLM, and the user's dietary filters are applied.
//!
//! ## Architecture
//!
//! Each request runs one sequential pipeline:
//!
//! ```text
//!            ┌──────────────────────────┐
//!            │  Preference / dish name  │
//!            └────────────┬─────────────┘
//!                         │ verbatim (blank → 400)
//!                         ▼
//!            ┌──────────────────────────┐
//!            │        Retriever         │
//!            │  nearText or hybrid      │
//!            │  (alpha 0.5), limit N    │
//!            │  query error → {} +      │
//!            │  notice                  │
//!            └────────────┬─────────────┘
//!                         │ dish → details
//!                         ▼
//!            ┌──────────────────────────┐
//!            │        Reranker          │
//!            │  one JSON prompt, reply  │
//!            │  validated: objects only │
//!            │  known dishes only,      │
//!            │  ordered by "rank"       │
//!            └────────────┬─────────────┘
//!                         │ ranked + top pick
//!                         ▼
//!            ┌──────────────────────────┐
//!            │          Filter          │
//!            │  cuisine / category      │
//!            │  exact, allergens by     │
//!            │  substring               │
//!            └──────────────────────────┘
//! ```
//!
//! ## Module Overview
//!
//! - [`config`] - Environment-based configuration for server, index, and LLM settings
//! - [`models`] - Dish records, the ordered `DishMap`, request/response types
//! - [`menu`] - The static menu loaded at startup
//! - [`search::index`] - `DishIndex` seam, scoped connections, and the `Retriever` stage
//! - [`search::weaviate`] - Weaviate REST/GraphQL implementation of `DishIndex`
//! - [`llm::client`] - `TextGenerator` seam and Gemini / OpenAI / Ollama providers
//! - [`llm::rerank`] - LLM re-ranking with a validating reply decoder
//! - [`filter`] - Cuisine, category, and allergen filtering
//! - [`pipeline`] - `Recommender`, chaining the stages
//! - [`api`] - Axum HTTP handlers
//! - [`state`] - Shared application state

pub mod api;
pub mod config;
pub mod error;
pub mod filter;
pub mod llm;
pub mod menu;
pub mod models;
pub mod pipeline;
pub mod search;
pub mod state;
