use crate::language::Language;
use crate::types::{Chunk, ChunkKind, EnrichedChunk};
use once_cell::sync::Lazy;
use regex::Regex;

/// Upper bound of `complexity_estimate`
pub const MAX_COMPLEXITY: u32 = 100;

/// Upper bound of `importance_score`
pub const MAX_IMPORTANCE: u32 = 10;

/// Length of `preview_text` in chars
pub const PREVIEW_CHARS: usize = 200;

/// Leading character of names treated as private
const PRIVATE_PREFIX: char = '_';

/// Branching and logical tokens, each occurrence adds one to complexity
static COMPLEXITY_TOKENS: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\bif\b",
        r"\belse\s+if\b",
        r"\belse\b",
        r"\bfor\b",
        r"\bwhile\b",
        r"\bcase\b",
        r"\bcatch\b",
        r"\btry\b",
        r"\band\b",
        r"\bor\b",
        r"&&",
        r"\|\|",
        r"\?",
    ]
    .into_iter()
    .map(|pattern| Regex::new(pattern).expect("complexity token regex must compile"))
    .collect()
});

/// Computes size, complexity, importance and preview fields of final chunks
#[derive(Debug, Clone, Copy)]
pub struct MetadataEnricher {
    calculate_complexity: bool,
}

impl MetadataEnricher {
    pub fn new(calculate_complexity: bool) -> Self {
        Self {
            calculate_complexity,
        }
    }

    pub fn enrich(&self, chunk: Chunk, language: Language) -> EnrichedChunk {
        let complexity_estimate = if self.calculate_complexity {
            complexity(&chunk.content)
        } else {
            1
        };

        EnrichedChunk {
            language: language.as_str().to_string(),
            loc_count: loc_count(&chunk.content, language),
            complexity_estimate,
            importance_score: importance(&chunk),
            preview_text: preview(&chunk.content),
            is_public: !chunk.name.starts_with(PRIVATE_PREFIX),
            chunk,
        }
    }
}

/// Lines that are neither blank nor a single-line comment
pub fn loc_count(content: &str, language: Language) -> usize {
    let marker = language.line_comment();
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| !marker.is_some_and(|m| line.starts_with(m)))
        .count()
}

pub fn complexity(content: &str) -> u32 {
    let hits: usize = COMPLEXITY_TOKENS
        .iter()
        .map(|re| re.find_iter(content).count())
        .sum();
    let hits = u32::try_from(hits).unwrap_or(u32::MAX);
    hits.saturating_add(1).min(MAX_COMPLEXITY)
}

pub fn importance(chunk: &Chunk) -> u32 {
    let mut score = 5.0_f64;
    if chunk.is_exported {
        score += 2.0;
    }
    if !chunk.name.starts_with(PRIVATE_PREFIX) {
        score += 1.0;
    }
    match chunk.kind {
        ChunkKind::Function | ChunkKind::Class => score += 1.0,
        _ => {}
    }
    if chunk.doc_comment.is_some() {
        score += 1.0;
    }
    if chunk.is_async {
        score += 0.5;
    }
    if chunk.is_generator {
        score += 0.5;
    }

    (score.round() as u32).min(MAX_IMPORTANCE)
}

/// First 200 chars, line breaks (`\n`, `\r`) flattened to spaces
pub fn preview(content: &str) -> String {
    let flat: String = content
        .chars()
        .take(PREVIEW_CHARS)
        .map(|c| if matches!(c, '\n' | '\r') { ' ' } else { c })
        .collect();
    flat.trim().to_string()
}
