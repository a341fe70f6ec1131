use crate::language::{Language, LanguageFamily};
use std::path::Path;
use unicode_segmentation::GraphemeCursor;

/// Immutable input of one chunking call
#[derive(Debug, Clone)]
pub struct SourceUnit<'a> {
    text: &'a str,
    language: Language,
    name: String,
    lines: LineIndex,
}

impl<'a> SourceUnit<'a> {
    pub fn new(text: &'a str, path: &str) -> Self {
        Self::with_language(text, path, Language::from_path(path))
    }

    pub fn with_language(text: &'a str, path: &str, language: Language) -> Self {
        let name = Path::new(path)
            .file_name()
            .and_then(|name| name.to_str())
            .filter(|name| !name.is_empty())
            .unwrap_or("file")
            .to_string();

        Self {
            text,
            language,
            name,
            lines: LineIndex::new(text),
        }
    }

    pub fn text(&self) -> &'a str {
        self.text
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn family(&self) -> LanguageFamily {
        self.language.family()
    }

    /// File name used for chunks that have no declaration name
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lines(&self) -> &LineIndex {
        &self.lines
    }

    pub fn slice(&self, start: usize, end: usize) -> &'a str {
        &self.text[start..end]
    }
}

/// Byte offset to line lookup over one source text
#[derive(Debug, Clone)]
pub struct LineIndex {
    /// Byte offset at which each line starts; always begins with 0
    starts: Vec<usize>,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut starts = vec![0];
        starts.extend(
            text.bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(idx, _)| idx + 1),
        );
        Self { starts }
    }

    /// 1-based line containing `offset`
    pub fn line_of(&self, offset: usize) -> usize {
        self.starts.partition_point(|start| *start <= offset)
    }

    /// 1-based inclusive line range of the half-open span `[start, end)`
    pub fn line_span(&self, start: usize, end: usize) -> (usize, usize) {
        let first = self.line_of(start);
        let last = if end > start {
            self.line_of(end - 1)
        } else {
            first
        };
        (first, last)
    }

    /// Byte offset where the 1-based `line` starts
    pub fn line_start(&self, line: usize) -> Option<usize> {
        line.checked_sub(1).and_then(|idx| self.starts.get(idx).copied())
    }

    pub fn line_count(&self) -> usize {
        self.starts.len()
    }
}

/// Largest char boundary that is `<= index`
pub(crate) fn floor_char_boundary(text: &str, index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    let mut idx = index;
    while !text.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

/// Smallest char boundary that is `>= index`
pub(crate) fn ceil_char_boundary(text: &str, index: usize) -> usize {
    if index >= text.len() {
        return text.len();
    }
    let mut idx = index;
    while !text.is_char_boundary(idx) {
        idx += 1;
    }
    idx
}

/// Largest grapheme boundary that is `<= index`, so cuts never separate a
/// base character from its combining marks
pub(crate) fn floor_grapheme_boundary(text: &str, index: usize) -> usize {
    let idx = floor_char_boundary(text, index);
    if idx == 0 || idx == text.len() {
        return idx;
    }

    let mut cursor = GraphemeCursor::new(idx, text.len(), true);
    match cursor.is_boundary(text, 0) {
        Ok(true) => idx,
        Ok(false) => match cursor.prev_boundary(text, 0) {
            Ok(Some(boundary)) => boundary,
            _ => idx,
        },
        Err(_) => idx,
    }
}
