//! # KB Text Chunker
//!
//! Paragraph-oriented text chunking for knowledge-base indexing.
//!
//! ## Philosophy
//!
//! The chunker produces bounded-size text fragments that:
//! - Respect paragraph boundaries wherever possible
//! - Fall back to fixed-width character windows for oversized paragraphs
//! - Stay deterministic and side-effect free
//!
//! ## Architecture
//!
//! ```text
//! Raw Text
//!     │
//!     ├──> Paragraph Split (blank-line boundaries)
//!     │      └─> Drop whitespace-only paragraphs
//!     │
//!     ├──> Size Check (per paragraph)
//!     │      ├─> Within limit → emit as-is
//!     │      └─> Oversized   → fixed-width char windows
//!     │
//!     └──> Whole-text windowing when no paragraph survives
//! ```
//!
//! ## Example
//!
//! ```rust
//! use kb_text_chunker::{Chunker, ChunkerConfig};
//!
//! let chunker = Chunker::new(ChunkerConfig::default()).unwrap();
//! let chunks = chunker.chunk_text("First paragraph.\n\nSecond paragraph.");
//! assert_eq!(chunks.len(), 2);
//! ```

mod chunker;
mod config;
mod error;

pub use chunker::Chunker;
pub use config::ChunkerConfig;
pub use error::{ChunkerError, Result};
