//! Query understanding, embedding and ranking

pub mod embedding_manager;
pub mod embeddings;
pub mod extractor;
pub mod index;
pub mod ranker;
