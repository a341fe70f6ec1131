//! # Context Chunk Engine
//!
//! Code-aware chunking of source files for embedding and retrieval.
//!
//! ## Philosophy
//!
//! Every chunk is a contiguous, exact slice of its source:
//! `content == source[start_offset..end_offset]`. Declarations are kept whole
//! when they fit the size budget and split at natural line boundaries when
//! they do not. Inputs that cannot be parsed degrade to whole-file chunks
//! instead of failing.
//!
//! ## Architecture
//!
//! ```text
//! Source Code
//!     │
//!     ├──> Language Classifier (extension → language + family)
//!     │
//!     ├──> Structural Parser
//!     │    ├─> brace-delimited: tree-sitter declarations
//!     │    ├─> indentation-delimited: header regex + indentation
//!     │    └─> unknown: fixed-size windows
//!     │
//!     ├──> Oversize Splitter (declarations over max_chunk_size)
//!     │
//!     └──> Metadata Enricher
//!          └─> loc, complexity, importance, preview
//! ```
//!
//! ## Example
//!
//! ```rust
//! use context_chunk_engine::{Chunker, ChunkerConfig, ChunkKind};
//!
//! let chunker = Chunker::new(ChunkerConfig::default()).unwrap();
//!
//! let code = r#"
//! def process_data(text):
//!     """Normalise input."""
//!     return text.strip().upper()
//! "#;
//!
//! let chunks = chunker.chunk_str(code, "example.py");
//! assert_eq!(chunks.len(), 1);
//! assert_eq!(chunks[0].chunk.kind, ChunkKind::Function);
//! assert_eq!(chunks[0].chunk.name, "process_data");
//! ```

mod chunker;
mod config;
mod enrich;
mod error;
mod language;
pub mod parser;
mod source;
mod splitter;
mod types;
mod window;

pub use chunker::{Chunker, ChunkingStats};
pub use config::ChunkerConfig;
pub use enrich::MetadataEnricher;
pub use error::{ChunkerError, Result};
pub use language::{Language, LanguageFamily};
pub use source::{LineIndex, SourceUnit};
pub use splitter::OversizeSplitter;
pub use types::{Chunk, ChunkKind, ChunkRecord, EnrichedChunk, RecordMetadata};
pub use window::Windower;
