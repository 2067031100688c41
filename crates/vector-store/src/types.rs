use serde::{Deserialize, Serialize};

/// A stored document: raw text plus the ids of the chunks cut from it.
///
/// Raw text is append-only: re-ingesting an existing id concatenates the new
/// text with a blank-line separator.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub raw: String,
    pub chunk_ids: Vec<String>,
}

/// A chunk as held in the store and on disk.
///
/// The id is `<doc_id>__<seq>` where seq is the chunk's global insertion
/// position; chunk collection order always equals insertion order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredChunk {
    pub id: String,
    pub doc_id: String,
    pub text: String,
}

/// One ranked hit returned by search
#[derive(Debug, Clone)]
pub struct SearchResult {
    pub chunk_id: String,
    pub doc_id: String,
    pub text: String,
    pub score: f32,
}

/// Outcome of a single ingest call
#[derive(Debug, Clone)]
pub struct IngestReport {
    /// The resolved (or generated) document id
    pub doc_id: String,
    /// Chunks added by this call, not the document's total
    pub chunks_added: usize,
}

/// Outcome of a QA call: the answer is a verbatim concatenation of the
/// top-ranked chunk texts, never synthesis.
#[derive(Debug, Clone)]
pub struct QaReport {
    pub answer: String,
    pub sources: Vec<SearchResult>,
}

/// Outcome of a completeness probe
#[derive(Debug, Clone)]
pub struct CompletenessReport {
    pub complete: bool,
    pub avg_score: f32,
}
