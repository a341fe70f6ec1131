//! Structural parsers that decompose a file into declaration-level chunks.
//!
//! Two strategies exist, one per language family:
//! - [`brace::BraceParser`] walks a tree-sitter syntax tree
//! - [`indent::IndentParser`] matches declaration headers and follows
//!   indentation
//!
//! Neither one returns errors. A file that cannot be parsed, or that holds
//! no declarations, is reported through [`ParseOutcome`] so the caller can
//! fall back to a whole-file chunk.

pub mod brace;
pub mod indent;

use crate::config::ChunkerConfig;
use crate::language::LanguageFamily;
use crate::source::SourceUnit;
use crate::types::{Chunk, ChunkKind};

/// Result of running a structural parser over one file
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseOutcome {
    /// Declaration chunks sorted by start offset
    Declarations(Vec<Chunk>),
    /// Parsed fine but nothing extractable was found
    Empty,
    /// The source could not be parsed
    Failed { diagnostic: String },
}

impl ParseOutcome {
    /// Resolve to chunks, degrading to one whole-file chunk
    pub fn into_chunks(self, unit: &SourceUnit<'_>) -> Vec<Chunk> {
        match self {
            Self::Declarations(chunks) if !chunks.is_empty() => chunks,
            Self::Declarations(_) | Self::Empty => vec![Chunk::whole_file(unit, ChunkKind::Module)],
            Self::Failed { diagnostic } => {
                let mut chunk = Chunk::whole_file(unit, ChunkKind::Unparseable);
                chunk.parse_error = Some(diagnostic);
                vec![chunk]
            }
        }
    }

    /// True when the outcome resolves to a single whole-file chunk
    pub fn is_fallback(&self) -> bool {
        match self {
            Self::Declarations(chunks) => chunks.is_empty(),
            Self::Empty | Self::Failed { .. } => true,
        }
    }
}

/// A strategy that finds declaration chunks in one source unit
pub trait DeclarationParser {
    fn parse(&self, unit: &SourceUnit<'_>) -> ParseOutcome;
}

/// Pick the parser for a language family; `None` means window the content
pub fn parser_for(
    family: LanguageFamily,
    config: &ChunkerConfig,
) -> Option<Box<dyn DeclarationParser + Send + Sync>> {
    match family {
        LanguageFamily::BraceDelimited => {
            Some(Box::new(brace::BraceParser::new(config.collect_module_residue)))
        }
        LanguageFamily::IndentationDelimited => Some(Box::new(indent::IndentParser::new())),
        LanguageFamily::Unknown => None,
    }
}
