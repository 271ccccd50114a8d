//! Retrieval layer: splitting, indexing and context assembly for the
//! knowledge base.

pub mod context_builder;
pub mod engine;
pub mod grounding;
pub mod ingest;
pub mod sqlite;
pub mod store;

pub use engine::{RAGEngine, SplitterConfig, TextChunk};
pub use ingest::{ingest_file, IngestReport};
pub use sqlite::SqliteRagStore;
pub use store::{ChunkSearchResult, RagStore, StoredChunk};
