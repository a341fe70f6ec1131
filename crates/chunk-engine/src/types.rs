use crate::source::SourceUnit;
use serde::{Deserialize, Serialize};

/// Semantic kind of a chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ChunkKind {
    /// Function, method-valued binding, or arrow function
    Function,
    /// Class or class-like type declaration
    Class,
    /// Whole file, inline module, or module-level residue
    Module,
    /// Window over unstructured content
    Text,
    /// Anything else
    Other,
    /// Whole file that failed to parse
    Unparseable,
}

impl ChunkKind {
    /// Get human-readable name
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Function => "function",
            Self::Class => "class",
            Self::Module => "module",
            Self::Text => "text",
            Self::Other => "other",
            Self::Unparseable => "unparseable",
        }
    }

    /// Check if this is a named declaration (vs a file-level fallback)
    #[must_use]
    pub const fn is_declaration(self) -> bool {
        matches!(self, Self::Function | Self::Class)
    }
}

/// A contiguous span of a source text.
///
/// `content` is always exactly `source[start_offset..end_offset]`; anything
/// added for readability lives in `context_header`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    pub kind: ChunkKind,

    /// Identifier, or a generated placeholder when anonymous
    pub name: String,

    /// Start line (1-indexed)
    pub start_line: usize,

    /// End line (1-indexed, inclusive)
    pub end_line: usize,

    /// Start byte offset (inclusive)
    pub start_offset: usize,

    /// End byte offset (exclusive)
    pub end_offset: usize,

    pub content: String,

    /// Declaration header, e.g. `function add(a, b)`
    pub signature: Option<String>,

    pub doc_comment: Option<String>,

    /// Decorator / attribute lines that are part of the span
    #[serde(default)]
    pub decorators: Vec<String>,

    pub is_async: bool,
    pub is_generator: bool,
    pub is_exported: bool,

    /// Set on every sub-chunk of a split
    pub is_partial: bool,
    /// 0-based position among the split siblings
    pub part_number: usize,
    /// Number of split siblings (1 when not split)
    pub total_parts: usize,
    /// Name of the declaration the sub-chunk was split from
    pub parent_name: Option<String>,

    /// Signature header prepended for embedding on continuation parts
    pub context_header: Option<String>,

    /// Parse diagnostic, only on `Unparseable` chunks
    pub parse_error: Option<String>,
}

impl Chunk {
    /// Create a chunk over `[start, end)` of the source; content and lines
    /// are derived from the source so they cannot drift from the offsets
    #[must_use]
    pub fn from_span(
        unit: &SourceUnit<'_>,
        kind: ChunkKind,
        name: impl Into<String>,
        start: usize,
        end: usize,
    ) -> Self {
        let (start_line, end_line) = unit.lines().line_span(start, end);
        Self {
            kind,
            name: name.into(),
            start_line,
            end_line,
            start_offset: start,
            end_offset: end,
            content: unit.slice(start, end).to_string(),
            signature: None,
            doc_comment: None,
            decorators: Vec::new(),
            is_async: false,
            is_generator: false,
            is_exported: false,
            is_partial: false,
            part_number: 0,
            total_parts: 1,
            parent_name: None,
            context_header: None,
            parse_error: None,
        }
    }

    /// Chunk covering the whole source
    #[must_use]
    pub fn whole_file(unit: &SourceUnit<'_>, kind: ChunkKind) -> Self {
        Self::from_span(unit, kind, unit.name(), 0, unit.len())
    }

    /// Builder: set signature
    #[must_use]
    pub fn signature(mut self, signature: impl Into<String>) -> Self {
        self.signature = Some(signature.into());
        self
    }

    /// Builder: set doc comment
    #[must_use]
    pub fn doc_comment(mut self, doc: Option<String>) -> Self {
        self.doc_comment = doc;
        self
    }

    /// Get the number of lines in this chunk
    #[must_use]
    pub const fn line_count(&self) -> usize {
        self.end_line.saturating_sub(self.start_line) + 1
    }

    /// Size in bytes
    #[must_use]
    pub fn len(&self) -> usize {
        self.content.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.content.is_empty()
    }

    /// Check if chunk contains a specific line
    #[must_use]
    pub const fn contains_line(&self, line: usize) -> bool {
        line >= self.start_line && line <= self.end_line
    }
}

/// A final chunk with scoring metadata
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EnrichedChunk {
    pub chunk: Chunk,
    /// Language name, e.g. `python`
    pub language: String,
    pub loc_count: usize,
    /// 1..=100
    pub complexity_estimate: u32,
    /// 0..=10
    pub importance_score: u32,
    /// At most 200 chars, newlines flattened
    pub preview_text: String,
    pub is_public: bool,
}

impl EnrichedChunk {
    /// Text to embed: the context header, if any, followed by the content
    #[must_use]
    pub fn embedding_text(&self) -> String {
        match &self.chunk.context_header {
            Some(header) => format!("{header}{}", self.chunk.content),
            None => self.chunk.content.clone(),
        }
    }

    /// Flatten into the record consumed by ingestion
    #[must_use]
    pub fn to_record(&self) -> ChunkRecord {
        let chunk = &self.chunk;
        ChunkRecord {
            content: chunk.content.clone(),
            metadata: RecordMetadata {
                chunk_type: chunk.kind,
                name: chunk.name.clone(),
                language: self.language.clone(),
                start_line: chunk.start_line,
                end_line: chunk.end_line,
                start_char: chunk.start_offset,
                end_char: chunk.end_offset,
                line_count: chunk.line_count(),
                char_count: chunk.content.chars().count(),
                is_partial: chunk.is_partial,
                part_number: chunk.part_number,
                total_parts: chunk.total_parts,
                parent_chunk: chunk.parent_name.clone(),
                signature: chunk.signature.clone(),
                has_docstring: chunk.doc_comment.is_some(),
                docstring: chunk.doc_comment.clone(),
                decorators: chunk.decorators.clone(),
                complexity_estimate: self.complexity_estimate,
                loc: self.loc_count,
                chunk_score: self.importance_score,
                is_public: self.is_public,
                is_exported: chunk.is_exported,
                is_async: chunk.is_async,
                is_generator: chunk.is_generator,
                preview: self.preview_text.clone(),
                context_header: chunk.context_header.clone(),
                parse_error: chunk.parse_error.clone(),
            },
        }
    }
}

/// Flat serializable form of an [`EnrichedChunk`]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkRecord {
    pub content: String,
    pub metadata: RecordMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RecordMetadata {
    pub chunk_type: ChunkKind,
    pub name: String,
    pub language: String,
    pub start_line: usize,
    pub end_line: usize,
    pub start_char: usize,
    pub end_char: usize,
    pub line_count: usize,
    pub char_count: usize,
    pub is_partial: bool,
    pub part_number: usize,
    pub total_parts: usize,
    pub parent_chunk: Option<String>,
    pub signature: Option<String>,
    pub has_docstring: bool,
    pub docstring: Option<String>,
    pub decorators: Vec<String>,
    pub complexity_estimate: u32,
    pub loc: usize,
    pub chunk_score: u32,
    pub is_public: bool,
    pub is_exported: bool,
    pub is_async: bool,
    pub is_generator: bool,
    pub preview: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context_header: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parse_error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn enriched(chunk: Chunk) -> EnrichedChunk {
        EnrichedChunk {
            chunk,
            language: "javascript".to_string(),
            loc_count: 1,
            complexity_estimate: 1,
            importance_score: 7,
            preview_text: "function f() {}".to_string(),
            is_public: true,
        }
    }

    #[test]
    fn from_span_slices_source() {
        let unit = SourceUnit::new("let a;\nfunction f() {}\n", "a.js");
        let chunk = Chunk::from_span(&unit, ChunkKind::Function, "f", 7, 22);
        assert_eq!(chunk.content, "function f() {}");
        assert_eq!((chunk.start_line, chunk.end_line), (2, 2));
        assert_eq!(chunk.line_count(), 1);
        assert!(chunk.contains_line(2));
        assert!(!chunk.contains_line(1));
        assert!(!chunk.is_partial);
        assert_eq!(chunk.total_parts, 1);
    }

    #[test]
    fn whole_file_uses_file_name() {
        let unit = SourceUnit::new("a\nb", "dir/notes.txt");
        let chunk = Chunk::whole_file(&unit, ChunkKind::Text);
        assert_eq!(chunk.name, "notes.txt");
        assert_eq!((chunk.start_offset, chunk.end_offset), (0, 3));
        assert_eq!((chunk.start_line, chunk.end_line), (1, 2));
    }

    #[test]
    fn embedding_text_prepends_header() {
        let unit = SourceUnit::new("  return 1;\n}", "a.js");
        let mut chunk = Chunk::whole_file(&unit, ChunkKind::Function);
        assert_eq!(enriched(chunk.clone()).embedding_text(), "  return 1;\n}");

        chunk.context_header = Some("function f() {\n".to_string());
        assert_eq!(
            enriched(chunk).embedding_text(),
            "function f() {\n  return 1;\n}"
        );
    }

    #[test]
    fn record_serializes_flat_metadata() {
        let unit = SourceUnit::new("function f() {}", "a.js");
        let chunk = Chunk::whole_file(&unit, ChunkKind::Function).signature("function f()");
        let record = enriched(chunk).to_record();
        let value = serde_json::to_value(&record).unwrap();

        assert_eq!(value["content"], "function f() {}");
        assert_eq!(value["metadata"]["chunk_type"], "function");
        assert_eq!(value["metadata"]["start_char"], 0);
        assert_eq!(value["metadata"]["end_char"], 15);
        assert_eq!(value["metadata"]["char_count"], 15);
        assert_eq!(value["metadata"]["has_docstring"], false);
        assert_eq!(value["metadata"]["chunk_score"], 7);
        assert!(value["metadata"].get("parse_error").is_none());
    }

    #[test]
    fn kind_names() {
        assert_eq!(ChunkKind::Unparseable.as_str(), "unparseable");
        assert!(ChunkKind::Function.is_declaration());
        assert!(!ChunkKind::Module.is_declaration());
    }
}
