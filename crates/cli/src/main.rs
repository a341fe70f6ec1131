use anyhow::{Context as AnyhowContext, Result};
use clap::{Parser, ValueEnum};
use context_chunk_engine::{Chunker, ChunkerConfig, EnrichedChunk};
use std::path::PathBuf;
use std::sync::Arc;

mod output;

use output::FileRecord;

#[derive(Parser)]
#[command(name = "context-chunk")]
#[command(about = "Split source files into code-aware chunks for embedding", long_about = None)]
#[command(version)]
struct Cli {
    /// Files to chunk, emitted in the given order
    #[arg(required = true)]
    paths: Vec<PathBuf>,

    /// TOML file with chunker settings; flags below override it
    #[arg(long)]
    config: Option<PathBuf>,

    /// Maximum chunk size in bytes
    #[arg(long)]
    max_chunk_size: Option<usize>,

    /// Overlap between split parts in bytes
    #[arg(long)]
    overlap: Option<usize>,

    /// Advisory minimum chunk size in bytes
    #[arg(long)]
    min_chunk_size: Option<usize>,

    /// Do not prepend the parent signature to continuation parts
    #[arg(long)]
    no_signatures: bool,

    /// Skip complexity estimation (reported as 1)
    #[arg(long)]
    no_complexity: bool,

    /// Emit top-level statements between declarations as module chunks
    #[arg(long)]
    module_residue: bool,

    /// Output format
    #[arg(long, value_enum, default_value_t = OutputFormat::Jsonl)]
    format: OutputFormat,

    /// Print per-file chunking statistics to stderr
    #[arg(long)]
    stats: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Quiet mode: log only warnings/errors (stdout is reserved for JSON)
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// One JSON array of all records
    Json,
    /// One JSON object per line
    Jsonl,
}

impl Cli {
    fn chunker_config(&self) -> Result<ChunkerConfig> {
        let mut config = match &self.config {
            Some(path) => ChunkerConfig::from_toml_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?,
            None => ChunkerConfig::default(),
        };

        if let Some(max) = self.max_chunk_size {
            config.max_chunk_size = max;
        }
        if let Some(overlap) = self.overlap {
            config.overlap = overlap;
        }
        if let Some(min) = self.min_chunk_size {
            config.min_chunk_size = min;
        }
        if self.no_signatures {
            config.preserve_signatures = false;
        }
        if self.no_complexity {
            config.calculate_complexity = false;
        }
        if self.module_residue {
            config.collect_module_residue = true;
        }
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if cli.quiet {
        builder.filter_level(log::LevelFilter::Warn);
    } else if cli.verbose {
        builder.filter_level(log::LevelFilter::Debug);
    }
    builder.target(env_logger::Target::Stderr).init();

    let config = cli.chunker_config()?;
    let chunker = Arc::new(Chunker::new(config).context("Invalid chunker configuration")?);

    let per_file = chunk_paths(&chunker, &cli.paths).await?;

    if cli.stats {
        for (path, chunks) in &per_file {
            eprintln!("{path}: {}", Chunker::stats(chunks));
        }
    }

    let records: Vec<FileRecord> = per_file
        .iter()
        .flat_map(|(path, chunks)| {
            chunks
                .iter()
                .map(move |chunk| FileRecord::new(path, chunk.to_record()))
        })
        .collect();

    let mut stdout = std::io::stdout().lock();
    match cli.format {
        OutputFormat::Json => output::write_json(&mut stdout, &records)?,
        OutputFormat::Jsonl => output::write_jsonl(&mut stdout, &records)?,
    }
    Ok(())
}

/// Read and chunk every path concurrently, keeping argument order
async fn chunk_paths(
    chunker: &Arc<Chunker>,
    paths: &[PathBuf],
) -> Result<Vec<(String, Vec<EnrichedChunk>)>> {
    let mut tasks = Vec::with_capacity(paths.len());
    for path in paths {
        let chunker = Arc::clone(chunker);
        let path = path.clone();
        tasks.push(tokio::spawn(async move {
            let bytes = tokio::fs::read(&path)
                .await
                .with_context(|| format!("Failed to read {}", path.display()))?;
            let display = path.to_string_lossy().into_owned();

            let name = display.clone();
            let chunks = tokio::task::spawn_blocking(move || {
                let source = String::from_utf8_lossy(&bytes);
                chunker.chunk_str(&source, &name)
            })
            .await
            .context("Chunking task panicked")?;

            log::debug!("{display}: {} chunks", chunks.len());
            Ok::<_, anyhow::Error>((display, chunks))
        }));
    }

    let mut results = Vec::with_capacity(tasks.len());
    for task in tasks {
        results.push(task.await.context("Chunking task panicked")??);
    }
    Ok(results)
}
