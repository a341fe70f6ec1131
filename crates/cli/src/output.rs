use anyhow::Result;
use context_chunk_engine::ChunkRecord;
use serde::Serialize;
use std::io::Write;

/// One output object: the source file plus the flat chunk record
#[derive(Debug, Serialize)]
pub struct FileRecord {
    pub file: String,
    #[serde(flatten)]
    pub record: ChunkRecord,
}

impl FileRecord {
    pub fn new(file: &str, record: ChunkRecord) -> Self {
        Self {
            file: file.to_string(),
            record,
        }
    }
}

pub fn write_jsonl(out: &mut impl Write, records: &[FileRecord]) -> Result<()> {
    for record in records {
        serde_json::to_writer(&mut *out, record)?;
        out.write_all(b"\n")?;
    }
    out.flush()?;
    Ok(())
}

pub fn write_json(out: &mut impl Write, records: &[FileRecord]) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, records)?;
    out.write_all(b"\n")?;
    out.flush()?;
    Ok(())
}
