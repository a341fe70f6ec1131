use crate::error::{ChunkerError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for code chunking behavior
///
/// Sizes are measured in bytes of UTF-8 source text. With the usual
/// ~4 bytes per token of code, the defaults correspond to ~1000-token chunks
/// with ~50 tokens of overlap.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkerConfig {
    /// Maximum chunk size (hard limit for `content`)
    pub max_chunk_size: usize,

    /// Overlap carried between consecutive sub-chunks of a split
    pub overlap: usize,

    /// Minimum chunk size (advisory only, never merged or dropped)
    pub min_chunk_size: usize,

    /// Give continuation sub-chunks a header with the parent's signature
    pub preserve_signatures: bool,

    /// Compute `complexity_estimate`; when disabled it is fixed at 1
    pub calculate_complexity: bool,

    /// Emit top-level statements between declarations as `module` chunks
    pub collect_module_residue: bool,
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self {
            max_chunk_size: 4000,
            overlap: 200,
            min_chunk_size: 100,
            preserve_signatures: true,
            calculate_complexity: true,
            collect_module_residue: false,
        }
    }
}

impl ChunkerConfig {
    /// Create config optimized for embeddings (smaller, focused chunks)
    pub fn for_embeddings() -> Self {
        Self {
            max_chunk_size: 2000,
            overlap: 100,
            min_chunk_size: 50,
            ..Default::default()
        }
    }

    /// Create config optimized for LLM context (larger, comprehensive chunks)
    pub fn for_llm_context() -> Self {
        Self {
            max_chunk_size: 8000,
            overlap: 400,
            min_chunk_size: 200,
            collect_module_residue: true,
            ..Default::default()
        }
    }

    /// Load a config from TOML text; missing keys take their defaults
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config from a TOML file
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.max_chunk_size == 0 {
            return Err(ChunkerError::invalid_config("max_chunk_size must be > 0"));
        }

        if self.overlap >= self.max_chunk_size {
            return Err(ChunkerError::invalid_config(format!(
                "overlap ({}) must be smaller than max_chunk_size ({})",
                self.overlap, self.max_chunk_size
            )));
        }

        if self.min_chunk_size > self.max_chunk_size {
            return Err(ChunkerError::invalid_config(format!(
                "min_chunk_size ({}) cannot exceed max_chunk_size ({})",
                self.min_chunk_size, self.max_chunk_size
            )));
        }

        Ok(())
    }
}
