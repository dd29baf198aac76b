pub mod client;
pub mod rerank;
