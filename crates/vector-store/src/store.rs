use crate::embeddings::EmbeddingBackend;
use crate::error::{Result, StoreError};
use crate::index::{rank_dense, rank_sparse, Index};
use crate::lexical::LexicalProvider;
use crate::snapshot::Snapshot;
use crate::types::{
    CompletenessReport, Document, IngestReport, QaReport, SearchResult, StoredChunk,
};
use kb_text_chunker::{Chunker, ChunkerConfig};
use std::collections::BTreeMap;
use std::path::Path;

/// QA answers are cut off at this many characters
const QA_ANSWER_LIMIT: usize = 2000;

/// The knowledge-base store: owns the chunker, the active embedding
/// backend, the similarity index, and the snapshot directory.
///
/// One instance per data directory; construct it at process start and
/// inject it into whatever layer serves requests. Mutating operations take
/// `&mut self`, so sharing across tasks needs an external lock (e.g.
/// `tokio::sync::Mutex`); the store adds none of its own.
pub struct KnowledgeStore {
    docs: BTreeMap<String, Document>,
    chunks: Vec<StoredChunk>,
    next_doc_seq: u64,
    backend: EmbeddingBackend,
    index: Index,
    chunker: Chunker,
    snapshot: Snapshot,
}

impl KnowledgeStore {
    /// Open a store at `data_dir`, selecting the embedding backend from the
    /// environment (dense when `OPENAI_API_KEY` is set, lexical otherwise).
    pub async fn open(data_dir: impl AsRef<Path>) -> Result<Self> {
        Self::open_with_backend(data_dir, EmbeddingBackend::from_env()).await
    }

    /// Open a store with an explicitly injected backend.
    ///
    /// Loads whatever snapshot files exist. A dense matrix on disk is only
    /// trusted when the dense backend is active and its row count matches
    /// the chunk list; otherwise the index is rebuilt from the chunk texts.
    pub async fn open_with_backend(
        data_dir: impl AsRef<Path>,
        backend: EmbeddingBackend,
    ) -> Result<Self> {
        let snapshot = Snapshot::new(&data_dir);
        let loaded = snapshot.load().await;
        log::info!(
            "Opening store at {:?} ({} docs, {} chunks, {} backend)",
            data_dir.as_ref(),
            loaded.docs.len(),
            loaded.chunks.len(),
            backend.kind()
        );

        let chunker = Chunker::new(ChunkerConfig::default())
            .map_err(|err| StoreError::Other(err.to_string()))?;

        let mut store = Self {
            docs: loaded.docs,
            chunks: loaded.chunks,
            next_doc_seq: loaded.next_doc_seq,
            backend,
            index: Index::Empty,
            chunker,
            snapshot,
        };

        if store.chunks.is_empty() {
            return Ok(store);
        }

        let dense_active = matches!(store.backend, EmbeddingBackend::Dense(_));
        match loaded.dense {
            Some(matrix) if dense_active && matrix.nrows() == store.chunks.len() => {
                store.index = Index::Dense(matrix);
            }
            _ => store.rebuild_index().await,
        }

        Ok(store)
    }

    /// Ingest a document: resolve or generate the id, append the text,
    /// chunk it, rebuild the index over the whole chunk collection, and
    /// persist.
    ///
    /// Returns the number of chunks added by this call. A persistence
    /// failure surfaces as [`StoreError::PersistFailed`] after the
    /// in-memory state has already been updated.
    pub async fn ingest(&mut self, doc_id: Option<String>, text: &str) -> Result<IngestReport> {
        let doc_id = match doc_id {
            Some(id) => id,
            None => self.generate_doc_id(),
        };

        let new_chunk_texts = self.chunker.chunk_text(text);
        let chunks_added = new_chunk_texts.len();

        let mut new_chunk_ids = Vec::with_capacity(chunks_added);
        for chunk_text in new_chunk_texts {
            let chunk_id = format!("{doc_id}__{}", self.chunks.len());
            new_chunk_ids.push(chunk_id.clone());
            self.chunks.push(StoredChunk {
                id: chunk_id,
                doc_id: doc_id.clone(),
                text: chunk_text,
            });
        }

        match self.docs.get_mut(&doc_id) {
            Some(doc) => {
                doc.raw.push_str("\n\n");
                doc.raw.push_str(text);
                doc.chunk_ids.extend(new_chunk_ids);
            }
            None => {
                self.docs.insert(
                    doc_id.clone(),
                    Document {
                        raw: text.to_string(),
                        chunk_ids: new_chunk_ids,
                    },
                );
            }
        }

        self.rebuild_index().await;
        self.save().await?;

        log::info!("Ingested {chunks_added} chunks into '{doc_id}' (total {})", self.chunks.len());
        Ok(IngestReport {
            doc_id,
            chunks_added,
        })
    }

    /// Rank all chunks against `query` and return at most `top_k` hits,
    /// best first. Empty when nothing is indexed.
    pub async fn search(&self, query: &str, top_k: usize) -> Result<Vec<SearchResult>> {
        let ranked = match (&self.backend, &self.index) {
            (_, Index::Empty) => Vec::new(),
            (EmbeddingBackend::Dense(provider), Index::Dense(matrix)) => {
                // A query-time embedding failure is a hard error for this
                // request; falling back mid-query would rank against a
                // representation the index was not built with.
                let query_vector = provider.embed(query).await?;
                rank_dense(matrix, &query_vector, top_k)?
            }
            (EmbeddingBackend::Lexical(provider), Index::Lexical(rows)) => {
                let query_vector = provider.transform(query);
                rank_sparse(rows, &query_vector, top_k)
            }
            _ => {
                return Err(StoreError::Other(
                    "index representation does not match active backend".to_string(),
                ))
            }
        };

        Ok(ranked
            .into_iter()
            .filter_map(|(row_index, score)| {
                self.chunks.get(row_index).map(|chunk| SearchResult {
                    chunk_id: chunk.id.clone(),
                    doc_id: chunk.doc_id.clone(),
                    text: chunk.text.clone(),
                    score,
                })
            })
            .collect())
    }

    /// Answer a question by verbatim concatenation of the top-ranked chunk
    /// texts, joined by blank lines and cut off at 2000 characters.
    ///
    /// Fails with [`StoreError::NotFound`] when nothing is indexed.
    pub async fn qa(&self, question: &str, top_k: usize) -> Result<QaReport> {
        let sources = self.search(question, top_k).await?;
        if sources.is_empty() {
            return Err(StoreError::not_found("no documents indexed"));
        }

        let combined = sources
            .iter()
            .map(|source| source.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        let answer = if combined.chars().count() > QA_ANSWER_LIMIT {
            let truncated: String = combined.chars().take(QA_ANSWER_LIMIT).collect();
            format!("{truncated}...")
        } else {
            combined
        };

        Ok(QaReport { answer, sources })
    }

    /// Probe whether the indexed content looks sufficient to answer
    /// `question`: the mean score of the top hits compared against
    /// `threshold`. Zero hits report incomplete with a zero score.
    pub async fn completeness(
        &self,
        question: &str,
        top_k: usize,
        threshold: f32,
    ) -> Result<CompletenessReport> {
        let results = self.search(question, top_k).await?;
        if results.is_empty() {
            return Ok(CompletenessReport {
                complete: false,
                avg_score: 0.0,
            });
        }

        let avg_score =
            results.iter().map(|result| result.score).sum::<f32>() / results.len() as f32;
        Ok(CompletenessReport {
            complete: avg_score >= threshold,
            avg_score,
        })
    }

    /// Drop all documents, chunks and the index, and persist the empty
    /// state. The generated-id counter survives, so ids never collide
    /// across a clear.
    pub async fn clear(&mut self) -> Result<()> {
        self.docs.clear();
        self.chunks.clear();
        self.index = Index::Empty;
        self.save().await?;
        log::info!("Store cleared");
        Ok(())
    }

    /// Look up a stored document by id
    #[must_use]
    pub fn document(&self, doc_id: &str) -> Option<&Document> {
        self.docs.get(doc_id)
    }

    /// Number of stored documents
    #[must_use]
    pub fn doc_count(&self) -> usize {
        self.docs.len()
    }

    /// Number of stored chunks
    #[must_use]
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }

    /// Whether the store holds no chunks
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Identifier of the active backend, for logs and diagnostics
    #[must_use]
    pub fn backend_kind(&self) -> &'static str {
        self.backend.kind()
    }

    fn generate_doc_id(&mut self) -> String {
        self.next_doc_seq += 1;
        format!("doc_{}", self.next_doc_seq)
    }

    /// Recompute the index from the complete chunk collection.
    ///
    /// A dense failure here permanently downgrades the store to the lexical
    /// backend; the dense path is never retried for this store's lifetime.
    async fn rebuild_index(&mut self) {
        if self.chunks.is_empty() {
            self.index = Index::Empty;
            return;
        }

        let texts: Vec<String> = self.chunks.iter().map(|chunk| chunk.text.clone()).collect();

        let dense_result = match &self.backend {
            EmbeddingBackend::Dense(provider) => Some(
                provider
                    .embed_batch(&texts)
                    .await
                    .and_then(Index::from_dense_rows),
            ),
            EmbeddingBackend::Lexical(_) => None,
        };

        match dense_result {
            Some(Ok(index)) => {
                self.index = index;
                return;
            }
            Some(Err(err)) => {
                log::warn!("Dense embedding failed, falling back to lexical: {err}");
                self.backend = EmbeddingBackend::Lexical(LexicalProvider::new());
            }
            None => {}
        }

        if let EmbeddingBackend::Lexical(provider) = &mut self.backend {
            let rows = provider.fit_transform(&texts);
            self.index = Index::Lexical(rows);
        }
    }

    async fn save(&self) -> Result<()> {
        let dense = match &self.index {
            Index::Dense(matrix) => Some(matrix),
            _ => None,
        };
        self.snapshot
            .save(&self.docs, self.next_doc_seq, &self.chunks, dense)
            .await
    }
}
