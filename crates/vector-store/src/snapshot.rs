//! On-disk persistence for the store.
//!
//! Three sibling artifacts in the data directory:
//! - `docs.json`: document map plus the generated-id counter
//! - `chunks.json`: chunk list in global insertion order
//! - `embeddings.bin`: dense matrix, present only while dense is active
//!
//! Each file is written to a temp path and renamed into place, so a single
//! file is never half-written; there is no atomicity across the three
//! files. Load is best-effort: a parse error is logged and yields an empty
//! snapshot rather than a crash.

use crate::error::Result;
use crate::types::{Document, StoredChunk};
use ndarray::Array2;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

const DOCS_FILE: &str = "docs.json";
const CHUNKS_FILE: &str = "chunks.json";
const EMBEDDINGS_FILE: &str = "embeddings.bin";

const MATRIX_MAGIC: &[u8; 4] = b"KBE1";

#[derive(Serialize, Deserialize)]
struct PersistedDocs {
    schema_version: u32,
    next_doc_seq: u64,
    docs: BTreeMap<String, Document>,
}

#[derive(Serialize, Deserialize)]
struct PersistedChunks {
    schema_version: u32,
    chunks: Vec<StoredChunk>,
}

/// Everything a snapshot load produced. Defaults to an empty state.
#[derive(Default)]
pub struct LoadedSnapshot {
    pub docs: BTreeMap<String, Document>,
    pub next_doc_seq: u64,
    pub chunks: Vec<StoredChunk>,
    pub dense: Option<Array2<f32>>,
}

/// Handle on the data directory holding the three snapshot files.
#[derive(Clone, Debug)]
pub struct Snapshot {
    data_dir: PathBuf,
}

impl Snapshot {
    pub fn new(data_dir: impl AsRef<Path>) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
        }
    }

    /// Write all three artifacts.
    ///
    /// A stale dense matrix is removed when `dense` is `None`, so a later
    /// load never trusts rows that no longer match the chunk list.
    pub async fn save(
        &self,
        docs: &BTreeMap<String, Document>,
        next_doc_seq: u64,
        chunks: &[StoredChunk],
        dense: Option<&Array2<f32>>,
    ) -> Result<()> {
        tokio::fs::create_dir_all(&self.data_dir).await?;

        let persisted_docs = PersistedDocs {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            next_doc_seq,
            docs: docs.clone(),
        };
        write_atomic(
            &self.data_dir.join(DOCS_FILE),
            &serde_json::to_vec_pretty(&persisted_docs)?,
        )
        .await?;

        let persisted_chunks = PersistedChunks {
            schema_version: SNAPSHOT_SCHEMA_VERSION,
            chunks: chunks.to_vec(),
        };
        write_atomic(
            &self.data_dir.join(CHUNKS_FILE),
            &serde_json::to_vec_pretty(&persisted_chunks)?,
        )
        .await?;

        let embeddings_path = self.data_dir.join(EMBEDDINGS_FILE);
        match dense {
            Some(matrix) => write_atomic(&embeddings_path, &encode_matrix(matrix)).await?,
            None => {
                if tokio::fs::try_exists(&embeddings_path).await.unwrap_or(false) {
                    tokio::fs::remove_file(&embeddings_path).await?;
                }
            }
        }

        log::debug!(
            "Persisted snapshot to {:?} ({} docs, {} chunks)",
            self.data_dir,
            docs.len(),
            chunks.len()
        );
        Ok(())
    }

    /// Read whichever snapshot files exist.
    ///
    /// Missing files are treated as empty. Any read or parse error on the
    /// JSON artifacts discards the whole load; an undecodable matrix is
    /// dropped alone, leaving the caller to rebuild.
    pub async fn load(&self) -> LoadedSnapshot {
        match self.try_load_json().await {
            Ok(mut loaded) => {
                loaded.dense = self.load_matrix().await;
                loaded
            }
            Err(err) => {
                log::warn!(
                    "Failed to load snapshot from {:?}, starting empty: {err}",
                    self.data_dir
                );
                LoadedSnapshot::default()
            }
        }
    }

    async fn try_load_json(&self) -> Result<LoadedSnapshot> {
        let mut loaded = LoadedSnapshot::default();

        let docs_path = self.data_dir.join(DOCS_FILE);
        if tokio::fs::try_exists(&docs_path).await.unwrap_or(false) {
            let bytes = tokio::fs::read(&docs_path).await?;
            let persisted: PersistedDocs = serde_json::from_slice(&bytes)?;
            loaded.docs = persisted.docs;
            loaded.next_doc_seq = persisted.next_doc_seq;
        }

        let chunks_path = self.data_dir.join(CHUNKS_FILE);
        if tokio::fs::try_exists(&chunks_path).await.unwrap_or(false) {
            let bytes = tokio::fs::read(&chunks_path).await?;
            let persisted: PersistedChunks = serde_json::from_slice(&bytes)?;
            loaded.chunks = persisted.chunks;
        }

        Ok(loaded)
    }

    async fn load_matrix(&self) -> Option<Array2<f32>> {
        let path = self.data_dir.join(EMBEDDINGS_FILE);
        let bytes = tokio::fs::read(&path).await.ok()?;
        let matrix = decode_matrix(&bytes);
        if matrix.is_none() {
            log::warn!("Undecodable dense matrix at {path:?}, ignoring");
        }
        matrix
    }
}

async fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = path.with_extension("tmp");
    tokio::fs::write(&tmp, bytes).await?;
    tokio::fs::rename(&tmp, path).await?;
    Ok(())
}

fn encode_matrix(matrix: &Array2<f32>) -> Vec<u8> {
    let rows = matrix.nrows();
    let cols = matrix.ncols();
    let mut out = Vec::with_capacity(12 + rows * cols * 4);
    out.extend_from_slice(MATRIX_MAGIC);
    #[allow(clippy::cast_possible_truncation)]
    out.extend_from_slice(&(rows as u32).to_le_bytes());
    #[allow(clippy::cast_possible_truncation)]
    out.extend_from_slice(&(cols as u32).to_le_bytes());
    for value in matrix.iter() {
        out.extend_from_slice(&value.to_le_bytes());
    }
    out
}

fn decode_matrix(bytes: &[u8]) -> Option<Array2<f32>> {
    if bytes.len() < 12 || &bytes[0..4] != MATRIX_MAGIC {
        return None;
    }
    let rows = u32::from_le_bytes(bytes[4..8].try_into().ok()?) as usize;
    let cols = u32::from_le_bytes(bytes[8..12].try_into().ok()?) as usize;
    let expected_len = 12usize
        .checked_add(rows.checked_mul(cols)?.checked_mul(4)?)?;
    if bytes.len() != expected_len {
        return None;
    }
    let mut values = Vec::with_capacity(rows * cols);
    for i in 0..rows * cols {
        let start = 12 + i * 4;
        let value = f32::from_le_bytes(bytes[start..start + 4].try_into().ok()?);
        values.push(value);
    }
    Array2::from_shape_vec((rows, cols), values).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;
    use tempfile::TempDir;

    fn sample_state() -> (BTreeMap<String, Document>, Vec<StoredChunk>) {
        let mut docs = BTreeMap::new();
        docs.insert(
            "doc_1".to_string(),
            Document {
                raw: "alpha\n\nbeta".to_string(),
                chunk_ids: vec!["doc_1__0".to_string(), "doc_1__1".to_string()],
            },
        );
        let chunks = vec![
            StoredChunk {
                id: "doc_1__0".to_string(),
                doc_id: "doc_1".to_string(),
                text: "alpha".to_string(),
            },
            StoredChunk {
                id: "doc_1__1".to_string(),
                doc_id: "doc_1".to_string(),
                text: "beta".to_string(),
            },
        ];
        (docs, chunks)
    }

    #[tokio::test]
    async fn test_snapshot_roundtrip_with_matrix() {
        let tmp = TempDir::new().unwrap();
        let snapshot = Snapshot::new(tmp.path());
        let (docs, chunks) = sample_state();
        let matrix = array![[1.0_f32, 0.0], [0.0, 1.0]];

        snapshot.save(&docs, 3, &chunks, Some(&matrix)).await.unwrap();

        let loaded = snapshot.load().await;
        assert_eq!(loaded.docs.len(), 1);
        assert_eq!(loaded.next_doc_seq, 3);
        assert_eq!(loaded.chunks.len(), 2);
        assert_eq!(loaded.chunks[1].text, "beta");
        assert_eq!(loaded.dense.unwrap(), matrix);
    }

    #[tokio::test]
    async fn test_saving_without_matrix_removes_stale_file() {
        let tmp = TempDir::new().unwrap();
        let snapshot = Snapshot::new(tmp.path());
        let (docs, chunks) = sample_state();
        let matrix = array![[1.0_f32, 0.0], [0.0, 1.0]];

        snapshot.save(&docs, 1, &chunks, Some(&matrix)).await.unwrap();
        snapshot.save(&docs, 1, &chunks, None).await.unwrap();

        let loaded = snapshot.load().await;
        assert!(loaded.dense.is_none());
        assert_eq!(loaded.chunks.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_directory_loads_empty() {
        let tmp = TempDir::new().unwrap();
        let snapshot = Snapshot::new(tmp.path().join("nowhere"));
        let loaded = snapshot.load().await;
        assert!(loaded.docs.is_empty());
        assert!(loaded.chunks.is_empty());
        assert!(loaded.dense.is_none());
    }

    #[tokio::test]
    async fn test_corrupt_json_loads_empty() {
        let tmp = TempDir::new().unwrap();
        let snapshot = Snapshot::new(tmp.path());
        tokio::fs::write(tmp.path().join("docs.json"), b"not json")
            .await
            .unwrap();
        let loaded = snapshot.load().await;
        assert!(loaded.docs.is_empty());
        assert_eq!(loaded.next_doc_seq, 0);
    }

    #[tokio::test]
    async fn test_corrupt_matrix_is_dropped_alone() {
        let tmp = TempDir::new().unwrap();
        let snapshot = Snapshot::new(tmp.path());
        let (docs, chunks) = sample_state();

        snapshot.save(&docs, 1, &chunks, None).await.unwrap();
        tokio::fs::write(tmp.path().join("embeddings.bin"), b"garbage")
            .await
            .unwrap();

        let loaded = snapshot.load().await;
        assert_eq!(loaded.chunks.len(), 2);
        assert!(loaded.dense.is_none());
    }
}
