use crate::config::ChunkerConfig;
use crate::enrich::MetadataEnricher;
use crate::error::Result;
use crate::language::{Language, LanguageFamily};
use crate::parser::{parser_for, ParseOutcome};
use crate::source::SourceUnit;
use crate::splitter::OversizeSplitter;
use crate::types::{Chunk, ChunkKind, ChunkRecord, EnrichedChunk};
use crate::window::Windower;
use std::path::Path;

/// Main chunker interface: classify, parse, split, enrich
pub struct Chunker {
    config: ChunkerConfig,
    splitter: OversizeSplitter,
    windower: Windower,
    enricher: MetadataEnricher,
}

impl Chunker {
    /// Create a new chunker, rejecting inconsistent size settings
    pub fn new(config: ChunkerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            splitter: OversizeSplitter::new(&config),
            windower: Windower::new(&config),
            enricher: MetadataEnricher::new(config.calculate_complexity),
            config,
        })
    }

    pub fn config(&self) -> &ChunkerConfig {
        &self.config
    }

    /// Chunk source text; the language is detected from `path`.
    ///
    /// Never fails: unparseable input degrades to a whole-file chunk.
    pub fn chunk_str(&self, source: &str, path: &str) -> Vec<EnrichedChunk> {
        self.chunk_unit(&SourceUnit::new(source, path))
    }

    /// Chunk source text with an explicit language
    pub fn chunk_with_language(
        &self,
        source: &str,
        path: &str,
        language: Language,
    ) -> Vec<EnrichedChunk> {
        self.chunk_unit(&SourceUnit::with_language(source, path, language))
    }

    /// Chunk a file from disk; invalid UTF-8 is replaced, not rejected
    pub fn chunk_file(&self, path: impl AsRef<Path>) -> Result<Vec<EnrichedChunk>> {
        let path = path.as_ref();
        let bytes = std::fs::read(path)?;
        let source = String::from_utf8_lossy(&bytes);
        Ok(self.chunk_str(&source, &path.to_string_lossy()))
    }

    /// Chunk and flatten into ingestion records
    pub fn chunk_records(&self, source: &str, path: &str) -> Vec<ChunkRecord> {
        self.chunk_str(source, path)
            .iter()
            .map(EnrichedChunk::to_record)
            .collect()
    }

    fn chunk_unit(&self, unit: &SourceUnit<'_>) -> Vec<EnrichedChunk> {
        let mut chunks = self.structural_chunks(unit);
        chunks.sort_by_key(|chunk| chunk.start_offset);

        let min = self.config.min_chunk_size;
        for chunk in chunks.iter().filter(|c| c.len() < min) {
            log::debug!(
                "{}: chunk `{}` is {} bytes, below min_chunk_size {min}",
                unit.name(),
                chunk.name,
                chunk.len()
            );
        }

        chunks
            .into_iter()
            .map(|chunk| self.enricher.enrich(chunk, unit.language()))
            .collect()
    }

    fn structural_chunks(&self, unit: &SourceUnit<'_>) -> Vec<Chunk> {
        let family = unit.family();

        if unit.is_empty() {
            let kind = match family {
                LanguageFamily::Unknown => ChunkKind::Text,
                _ => ChunkKind::Module,
            };
            return vec![Chunk::whole_file(unit, kind)];
        }

        let Some(parser) = parser_for(family, &self.config) else {
            log::debug!(
                "{}: no structural strategy for {}, windowing",
                unit.name(),
                unit.language().as_str()
            );
            return self
                .windower
                .window(unit, &Chunk::whole_file(unit, ChunkKind::Text));
        };

        let outcome = parser.parse(unit);
        if let ParseOutcome::Failed { diagnostic } = &outcome {
            log::warn!(
                "{}: {diagnostic}, falling back to a whole-file chunk",
                unit.name()
            );
        }

        if outcome.is_fallback() {
            log::debug!(
                "{}: no declarations found by the {} strategy",
                unit.name(),
                family.as_str()
            );
            return outcome
                .into_chunks(unit)
                .iter()
                .flat_map(|chunk| self.windower.window(unit, chunk))
                .collect();
        }

        outcome
            .into_chunks(unit)
            .into_iter()
            .flat_map(|chunk| self.splitter.split(unit, chunk))
            .collect()
    }

    /// Get chunking statistics
    #[must_use]
    pub fn stats(chunks: &[EnrichedChunk]) -> ChunkingStats {
        let sizes = || chunks.iter().map(|c| c.chunk.len());
        let total_bytes: usize = sizes().sum();

        ChunkingStats {
            total_chunks: chunks.len(),
            total_lines: chunks.iter().map(|c| c.chunk.line_count()).sum(),
            total_bytes,
            avg_bytes_per_chunk: if chunks.is_empty() {
                0
            } else {
                total_bytes / chunks.len()
            },
            min_bytes: sizes().min().unwrap_or(0),
            max_bytes: sizes().max().unwrap_or(0),
            partial_chunks: chunks.iter().filter(|c| c.chunk.is_partial).count(),
        }
    }
}

impl Default for Chunker {
    fn default() -> Self {
        let config = ChunkerConfig::default();
        Self {
            splitter: OversizeSplitter::new(&config),
            windower: Windower::new(&config),
            enricher: MetadataEnricher::new(config.calculate_complexity),
            config,
        }
    }
}

/// Statistics about chunking results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChunkingStats {
    pub total_chunks: usize,
    pub total_lines: usize,
    pub total_bytes: usize,
    pub avg_bytes_per_chunk: usize,
    pub min_bytes: usize,
    pub max_bytes: usize,
    pub partial_chunks: usize,
}

impl std::fmt::Display for ChunkingStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Chunks: {} | Lines: {} | Bytes: {} | Avg: {} | Range: {}-{} | Partial: {}",
            self.total_chunks,
            self.total_lines,
            self.total_bytes,
            self.avg_bytes_per_chunk,
            self.min_bytes,
            self.max_bytes,
            self.partial_chunks
        )
    }
}
