pub mod index;
pub mod weaviate;
