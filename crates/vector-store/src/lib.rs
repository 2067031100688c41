//! # KB Vector Store
//!
//! In-memory, snapshot-persisted vector store for a minimal knowledge-base
//! indexer: chunk free text, index the chunks with dense remote embeddings
//! or a sparse lexical fallback, and answer similarity-ranked search, QA
//! and completeness queries.
//!
//! ## Architecture
//!
//! ```text
//! Raw Text
//!     │
//!     ├──> Chunker (kb-text-chunker)
//!     │      └─> Bounded-size chunk texts
//!     │
//!     ├──> Embedding Backend (selected once at construction)
//!     │      ├─> DenseProvider   → remote /embeddings call
//!     │      └─> LexicalProvider → TF-IDF over the chunk corpus
//!     │
//!     ├──> Index (full rebuild on every ingest)
//!     │      └─> Cosine ranking, row i = chunk i
//!     │
//!     └──> Snapshot (docs.json / chunks.json / embeddings.bin)
//! ```
//!
//! A dense failure during a rebuild downgrades the store to the lexical
//! backend permanently; the dense path is never retried within a store's
//! lifetime.
//!
//! ## Example
//!
//! ```no_run
//! use kb_vector_store::KnowledgeStore;
//!
//! #[tokio::main]
//! async fn main() -> kb_vector_store::Result<()> {
//!     let mut store = KnowledgeStore::open("data").await?;
//!
//!     let report = store
//!         .ingest(Some("notes".to_string()), "Rust ships a borrow checker.")
//!         .await?;
//!     println!("added {} chunks to {}", report.chunks_added, report.doc_id);
//!
//!     for hit in store.search("borrow checker", 5).await? {
//!         println!("{}: {:.3}", hit.chunk_id, hit.score);
//!     }
//!
//!     Ok(())
//! }
//! ```

mod embeddings;
mod error;
mod index;
mod lexical;
mod snapshot;
mod store;
mod types;

pub use embeddings::{cosine_similarity, DenseProvider, EmbeddingBackend};
pub use error::{Result, StoreError};
pub use lexical::{sparse_dot, LexicalProvider, SparseVector};
pub use snapshot::{LoadedSnapshot, Snapshot, SNAPSHOT_SCHEMA_VERSION};
pub use store::KnowledgeStore;
pub use types::{
    CompletenessReport, Document, IngestReport, QaReport, SearchResult, StoredChunk,
};

// Re-export chunker types for convenience
pub use kb_text_chunker::{Chunker, ChunkerConfig};
