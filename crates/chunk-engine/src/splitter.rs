//! Oversize splitter: breaks a declaration that exceeds the size budget into
//! overlapping sub-chunks at natural line boundaries.
//!
//! ## Algorithm
//!
//! 1. Derive a target line count per sub-chunk from `max_chunk_size` and the
//!    average line length, and an overlap line count the same way.
//! 2. From the current line, take the naive end line (shrunk until the span
//!    fits the budget) and search ±10 lines around it for the best-scoring
//!    split point. The naive end is the baseline; a candidate replaces it only
//!    with a strictly higher score, scanning forward.
//! 3. Emit `[current, split)`, step back by the overlap and repeat until the
//!    rest of the chunk fits.
//!
//! Sub-chunk offsets come from the line starts of the parent content, so
//! every sub-chunk is still an exact slice of the source.

use crate::config::ChunkerConfig;
use crate::language::{Language, LanguageFamily};
use crate::parser::brace::BODY_PLACEHOLDER;
use crate::source::SourceUnit;
use crate::types::Chunk;
use crate::window::Windower;

/// Lines searched on each side of the naive split point
const SPLIT_SEARCH_WINDOW: usize = 10;

/// Boundary weights, higher is a better place to split after
const SCORE_BLANK: u8 = 10;
const SCORE_COMMENT: u8 = 8;
const SCORE_CLOSING: u8 = 7;
const SCORE_RETURN: u8 = 6;
const SCORE_LOOP_EXIT: u8 = 5;
const SCORE_OTHER: u8 = 1;

pub struct OversizeSplitter {
    max_size: usize,
    overlap: usize,
    preserve_signatures: bool,
}

impl OversizeSplitter {
    pub fn new(config: &ChunkerConfig) -> Self {
        Self {
            max_size: config.max_chunk_size.max(1),
            overlap: config.overlap,
            preserve_signatures: config.preserve_signatures,
        }
    }

    /// Split `chunk` if it exceeds the budget, otherwise return it unchanged
    pub fn split(&self, unit: &SourceUnit<'_>, chunk: Chunk) -> Vec<Chunk> {
        if chunk.len() <= self.max_size {
            return vec![chunk];
        }

        let spans: Vec<(usize, usize)> = self
            .plan(&chunk.content, unit.language())
            .into_iter()
            .map(|(start, end)| (chunk.start_offset + start, chunk.start_offset + end))
            .collect();

        log::debug!(
            "{}: splitting `{}` ({} bytes) into {} parts",
            unit.name(),
            chunk.name,
            chunk.len(),
            spans.len()
        );

        let mut parts = build_parts(unit, &chunk, &spans);
        if self.preserve_signatures {
            if let Some(header) = chunk
                .signature
                .as_deref()
                .and_then(|sig| context_header(sig, unit.family()))
            {
                for part in parts.iter_mut().skip(1) {
                    part.context_header = Some(header.clone());
                }
            }
        }
        parts
    }

    /// Spans relative to `content`, in order
    fn plan(&self, content: &str, language: Language) -> Vec<(usize, usize)> {
        let lines = LineTable::new(content);
        let n = lines.count();

        let avg_line_len = (content.len() / n).max(1);
        let lines_per_chunk = (self.max_size / avg_line_len).max(1);
        let overlap_lines = self.overlap / avg_line_len;

        let mut spans = Vec::new();
        let mut current = 0;

        while current < n {
            // Parts never start on an empty line, so every span has content
            while current < n && lines.len_of(current, current + 1) == 0 {
                current += 1;
            }
            if current == n {
                break;
            }

            if lines.len_of(current, n) <= self.max_size {
                spans.push(lines.span(current, n));
                break;
            }

            // A single line over budget is cut into raw windows
            if lines.len_of(current, current + 1) > self.max_size {
                let (start, end) = lines.span(current, current + 1);
                let windower = Windower::with_sizes(self.max_size, self.overlap);
                spans.extend(windower.spans(content, start, end));
                current += 1;
                continue;
            }

            let mut naive = (current + lines_per_chunk).min(n);
            while naive > current + 1 && lines.len_of(current, naive) > self.max_size {
                naive -= 1;
            }

            let split = self.best_split(&lines, current, naive, language);
            spans.push(lines.span(current, split));

            // Step back by the overlap, but always move forward
            let taken = split - current;
            current = split - overlap_lines.min(taken / 2);
        }

        spans
    }

    /// Best end line (exclusive) for a sub-chunk starting at `current`.
    ///
    /// `naive` is the baseline: a candidate in the window replaces it only
    /// with a strictly higher score, so equal scores keep the naive end.
    fn best_split(
        &self,
        lines: &LineTable<'_>,
        current: usize,
        naive: usize,
        language: Language,
    ) -> usize {
        let lo = naive.saturating_sub(SPLIT_SEARCH_WINDOW).max(current + 1);
        let hi = (naive + SPLIT_SEARCH_WINDOW).min(lines.count());

        let mut best = naive;
        let mut best_score = score_line(lines.line(naive - 1), language);

        for candidate in lo..=hi {
            let len = lines.len_of(current, candidate);
            if len == 0 || len > self.max_size {
                continue;
            }
            let score = score_line(lines.line(candidate - 1), language);
            if score > best_score {
                best = candidate;
                best_score = score;
            }
        }

        best
    }
}

/// Build the sibling sub-chunks of `parent` over absolute `spans`
pub(crate) fn build_parts(
    unit: &SourceUnit<'_>,
    parent: &Chunk,
    spans: &[(usize, usize)],
) -> Vec<Chunk> {
    let total = spans.len();
    spans
        .iter()
        .enumerate()
        .map(|(idx, &(start, end))| {
            let mut part = Chunk::from_span(
                unit,
                parent.kind,
                format!("{}_part{idx}", parent.name),
                start,
                end,
            );
            part.signature = parent.signature.clone();
            part.doc_comment = if idx == 0 {
                parent.doc_comment.clone()
            } else {
                None
            };
            part.decorators = parent.decorators.clone();
            part.is_async = parent.is_async;
            part.is_generator = parent.is_generator;
            part.is_exported = parent.is_exported;
            part.is_partial = true;
            part.part_number = idx;
            part.total_parts = total;
            part.parent_name = Some(parent.name.clone());
            part.parse_error = parent.parse_error.clone();
            part
        })
        .collect()
}

/// Header line that reopens the parent declaration, e.g. `function f(a) {`
fn context_header(signature: &str, family: LanguageFamily) -> Option<String> {
    let flat = signature.split_whitespace().collect::<Vec<_>>().join(" ");
    let flat = flat
        .strip_suffix(BODY_PLACEHOLDER.trim_start())
        .unwrap_or(&flat)
        .trim_end();
    if flat.is_empty() {
        return None;
    }

    let header = match family {
        LanguageFamily::BraceDelimited if flat.ends_with('{') => flat.to_string(),
        LanguageFamily::BraceDelimited => format!("{flat} {{"),
        LanguageFamily::IndentationDelimited if flat.ends_with(':') => flat.to_string(),
        LanguageFamily::IndentationDelimited => format!("{flat}:"),
        LanguageFamily::Unknown => flat.to_string(),
    };
    Some(format!("{header}\n"))
}

/// Split-point score of a line
fn score_line(line: &str, language: Language) -> u8 {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        SCORE_BLANK
    } else if is_comment_only(trimmed, language) {
        SCORE_COMMENT
    } else if is_closing_only(trimmed) {
        SCORE_CLOSING
    } else if starts_with_word(trimmed, "return") {
        SCORE_RETURN
    } else if starts_with_word(trimmed, "break") || starts_with_word(trimmed, "continue") {
        SCORE_LOOP_EXIT
    } else {
        SCORE_OTHER
    }
}

fn is_comment_only(trimmed: &str, language: Language) -> bool {
    if language
        .line_comment()
        .is_some_and(|marker| trimmed.starts_with(marker))
    {
        return true;
    }
    language.family() == LanguageFamily::BraceDelimited
        && (trimmed.starts_with("/*") || trimmed.starts_with('*'))
}

/// `}`, `});`, `],` and similar
fn is_closing_only(trimmed: &str) -> bool {
    trimmed.starts_with(['}', ')', ']'])
        && trimmed
            .chars()
            .all(|c| matches!(c, '}' | ')' | ']' | ';' | ','))
}

fn starts_with_word(trimmed: &str, word: &str) -> bool {
    trimmed.strip_prefix(word).is_some_and(|rest| {
        rest.chars()
            .next()
            .map_or(true, |c| !(c.is_alphanumeric() || c == '_'))
    })
}

/// Line starts of one chunk's content, split on `\n`
struct LineTable<'a> {
    content: &'a str,
    starts: Vec<usize>,
}

impl<'a> LineTable<'a> {
    fn new(content: &'a str) -> Self {
        let starts = std::iter::once(0)
            .chain(content.match_indices('\n').map(|(idx, _)| idx + 1))
            .collect();
        Self { content, starts }
    }

    fn count(&self) -> usize {
        self.starts.len()
    }

    /// Span of lines `[from, to)` joined by their `\n`, without the final one
    fn span(&self, from: usize, to: usize) -> (usize, usize) {
        let start = self.starts[from];
        let end = if to < self.starts.len() {
            self.starts[to] - 1
        } else {
            self.content.len()
        };
        (start, end.max(start))
    }

    fn len_of(&self, from: usize, to: usize) -> usize {
        let (start, end) = self.span(from, to);
        end - start
    }

    fn line(&self, idx: usize) -> &'a str {
        let (start, end) = self.span(idx, idx + 1);
        &self.content[start..end]
    }
}
