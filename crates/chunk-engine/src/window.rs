use crate::config::ChunkerConfig;
use crate::source::{ceil_char_boundary, floor_char_boundary, floor_grapheme_boundary, SourceUnit};
use crate::splitter::build_parts;
use crate::types::Chunk;

/// Fixed-size sliding windows over raw text
///
/// Used for content without a structural strategy and for whole-file
/// fallback chunks that exceed the size budget. Windows keep the kind of the
/// chunk they cut: `text` for unknown languages, `module` or `unparseable`
/// for whole-file fallbacks of parsed languages.
#[derive(Debug, Clone, Copy)]
pub struct Windower {
    max_size: usize,
    overlap: usize,
}

impl Windower {
    pub fn new(config: &ChunkerConfig) -> Self {
        Self::with_sizes(config.max_chunk_size, config.overlap)
    }

    pub fn with_sizes(max_size: usize, overlap: usize) -> Self {
        let max_size = max_size.max(1);
        Self {
            max_size,
            overlap: overlap.min(max_size - 1),
        }
    }

    /// Window `chunk`; a chunk within budget is returned as is
    pub fn window(&self, unit: &SourceUnit<'_>, chunk: &Chunk) -> Vec<Chunk> {
        let spans = self.spans(unit.text(), chunk.start_offset, chunk.end_offset);
        if spans.len() <= 1 {
            return vec![chunk.clone()];
        }
        build_parts(unit, chunk, &spans)
    }

    /// Byte spans of the windows covering `text[start..end]`.
    ///
    /// Windows are at most `max_size` bytes and never cut through a grapheme
    /// cluster unless a single cluster is larger than the window. Each window
    /// starts `overlap` bytes before the end of the previous one and the last
    /// window always ends at `end`.
    pub fn spans(&self, text: &str, start: usize, end: usize) -> Vec<(usize, usize)> {
        let mut spans = Vec::new();
        if start >= end {
            spans.push((start, end));
            return spans;
        }

        let mut pos = start;
        while pos < end {
            let mut stop = (pos + self.max_size).min(end);
            if stop < end {
                let limit = stop;
                stop = floor_grapheme_boundary(text, limit);
                if stop <= pos {
                    // A single cluster wider than the window is cut at a char
                    stop = floor_char_boundary(text, limit);
                }
                if stop <= pos {
                    stop = ceil_char_boundary(text, pos + 1).min(end);
                }
            }
            spans.push((pos, stop));

            if stop >= end {
                break;
            }

            let next = floor_grapheme_boundary(text, stop.saturating_sub(self.overlap).max(pos));
            pos = if next > pos { next } else { stop };
        }

        spans
    }
}
