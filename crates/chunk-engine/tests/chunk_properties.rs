//! Properties that hold for every output of the engine, checked over a
//! fixture set covering each language family.

use context_chunk_engine::{Chunk, ChunkKind, Chunker, ChunkerConfig, EnrichedChunk};
use std::collections::BTreeMap;

const JS: &str = r#"import { api } from "./api";

/**
 * Fetch a user.
 */
export async function getUser(id) {
  const res = await api.get(`/users/${id}`);
  if (!res.ok || res.status === 404) {
    return null;
  }
  return res.body;
}

export default class UserCache {
  constructor() {
    this.map = new Map();
  }
}

const isAdmin = (user) => user && user.role === "admin" ? true : false;
"#;

const TS: &str = r#"interface Options { verbose: boolean }

@Injectable()
export class Service {
  constructor(private readonly opts: Options) {}

  run(): void {
    for (const x of [1, 2, 3]) {
      console.log(x);
    }
  }
}

export function* counter(limit: number): Generator<number> {
  let i = 0;
  while (i < limit) {
    yield i++;
  }
}
"#;

const RUST: &str = r#"use std::collections::HashMap;

/// Registry of handlers.
#[derive(Default)]
pub struct Registry {
    handlers: HashMap<String, usize>,
}

impl Registry {
    pub fn register(&mut self, name: &str) -> usize {
        let next = self.handlers.len();
        *self.handlers.entry(name.to_string()).or_insert(next)
    }
}

pub mod util {
    pub fn clamp(x: i32) -> i32 {
        if x < 0 { 0 } else { x }
    }
}

async fn background() {}
"#;

const PYTHON: &str = r#"import os


@dataclass
class Config:
    """Runtime configuration."""

    path: str

    def load(self):
        if os.path.exists(self.path) and self.path:
            return open(self.path).read()
        return None

    def _reset(self):
        self.path = ""


async def main(argv):
    for arg in argv:
        yield arg
"#;

const UNKNOWN: &str = "# Notes\n\nSome prose that is not code at all.\nAnother line.\n";

fn fixtures() -> Vec<(&'static str, String)> {
    let big_js = format!(
        "/** Big. */\nfunction big() {{\n{}}}\n",
        "  step(); // keep going\n".repeat(300)
    );
    let big_py = format!("def big():\n{}", "    total = total + 1\n".repeat(300));
    let mut spaced_js = String::from("function spaced() {\n");
    for idx in 0..30 {
        spaced_js.push_str("  tick();\n\n");
        spaced_js.push_str(&format!("  const v{idx} = \"{}\";\n\n", "z".repeat(100 + idx * 13)));
    }
    spaced_js.push_str("}\n");
    let zalgo = format!("ab e{}\nend\n", "\u{301}".repeat(150));

    vec![
        ("src/user.js", JS.to_string()),
        ("src/service.ts", TS.to_string()),
        ("src/registry.rs", RUST.to_string()),
        ("app/config.py", PYTHON.to_string()),
        ("NOTES.unknownext", UNKNOWN.to_string()),
        ("src/big.js", big_js),
        ("app/big.py", big_py),
        ("src/spaced.js", spaced_js),
        ("zalgo.txt", zalgo),
        ("broken.ts", "export class { oops(\n".to_string()),
        ("blank.rs", String::new()),
        ("binary.dat", "\u{0}\u{1}\u{fffd}PNG\r\n\u{1a}\n".repeat(40)),
    ]
}

fn configs() -> Vec<ChunkerConfig> {
    vec![
        ChunkerConfig::default(),
        ChunkerConfig::for_embeddings(),
        ChunkerConfig {
            max_chunk_size: 300,
            overlap: 40,
            min_chunk_size: 10,
            ..Default::default()
        },
        ChunkerConfig {
            max_chunk_size: 120,
            overlap: 119,
            min_chunk_size: 0,
            collect_module_residue: true,
            ..Default::default()
        },
    ]
}

fn run_all() -> Vec<(String, ChunkerConfig, String, Vec<EnrichedChunk>)> {
    let mut out = Vec::new();
    for config in configs() {
        let chunker = Chunker::new(config.clone()).expect("valid config");
        for (path, source) in fixtures() {
            let chunks = chunker.chunk_str(&source, path);
            out.push((path.to_string(), config.clone(), source, chunks));
        }
    }
    out
}

#[test]
fn content_is_an_exact_slice_of_source() {
    for (path, _, source, chunks) in run_all() {
        assert!(!chunks.is_empty(), "{path}: no chunks");
        for c in &chunks {
            assert_eq!(
                c.chunk.content,
                &source[c.chunk.start_offset..c.chunk.end_offset],
                "{path}: chunk `{}`",
                c.chunk.name
            );
        }
    }
}

#[test]
fn non_empty_input_never_yields_empty_chunks() {
    for (path, config, source, chunks) in run_all() {
        if source.is_empty() {
            assert_eq!(chunks.len(), 1, "{path}");
            continue;
        }
        for c in &chunks {
            assert!(
                c.chunk.start_offset < c.chunk.end_offset,
                "{path} (max {}, overlap {}): `{}` is empty",
                config.max_chunk_size,
                config.overlap,
                c.chunk.name
            );
        }
    }
}

#[test]
fn chunks_cover_the_end_of_every_input() {
    for (path, _, source, chunks) in run_all() {
        let end = chunks.iter().map(|c| c.chunk.end_offset).max().unwrap_or(0);
        assert!(
            end >= source.trim_end().len(),
            "{path}: output stops at {end} of {}",
            source.len()
        );
    }
}

#[test]
fn chunks_are_sorted_by_start_offset() {
    for (path, _, _, chunks) in run_all() {
        for pair in chunks.windows(2) {
            assert!(
                pair[0].chunk.start_offset <= pair[1].chunk.start_offset,
                "{path}: `{}` after `{}`",
                pair[1].chunk.name,
                pair[0].chunk.name
            );
        }
    }
}

#[test]
fn scores_stay_in_range() {
    for (path, _, _, chunks) in run_all() {
        for c in &chunks {
            assert!(
                (1..=100).contains(&c.complexity_estimate),
                "{path}: complexity {}",
                c.complexity_estimate
            );
            assert!(c.importance_score <= 10, "{path}: importance {}", c.importance_score);
            assert!(c.preview_text.chars().count() <= 200);
            assert!(!c.preview_text.contains(['\n', '\r']));
        }
    }
}

#[test]
fn chunks_respect_max_size() {
    for (path, config, _, chunks) in run_all() {
        for c in &chunks {
            assert!(
                c.chunk.len() <= config.max_chunk_size,
                "{path}: `{}` is {} bytes over {}",
                c.chunk.name,
                c.chunk.len(),
                config.max_chunk_size
            );
        }
    }
}

#[test]
fn split_siblings_are_consistent() {
    for (path, _, _, chunks) in run_all() {
        // Nested declarations may interleave with their parent's parts
        let mut groups: BTreeMap<String, Vec<&Chunk>> = BTreeMap::new();
        for c in &chunks {
            if c.chunk.is_partial {
                let parent = c.chunk.parent_name.clone().expect("partial has a parent");
                groups.entry(parent).or_default().push(&c.chunk);
            } else {
                assert_eq!(c.chunk.total_parts, 1, "{path}");
                assert_eq!(c.chunk.part_number, 0, "{path}");
            }
        }

        for (parent, parts) in groups {
            let total = parts[0].total_parts;
            assert!(total >= 2, "{path}: lone partial of `{parent}`");
            assert_eq!(parts.len(), total, "{path}: `{parent}`");
            for (part_number, part) in parts.iter().enumerate() {
                assert_eq!(part.total_parts, total, "{path}");
                assert_eq!(part.part_number, part_number, "{path}");
                assert_eq!(part.name, format!("{parent}_part{part_number}"));
                if part_number > 0 {
                    assert!(part.doc_comment.is_none(), "{path}: doc on part {part_number}");
                }
            }
        }
    }
}

#[test]
fn output_is_deterministic() {
    let first: Vec<_> = run_all().into_iter().map(|(_, _, _, chunks)| chunks).collect();
    let second: Vec<_> = run_all().into_iter().map(|(_, _, _, chunks)| chunks).collect();
    assert_eq!(first, second);

    let chunker = Chunker::default();
    let a = serde_json::to_string(&chunker.chunk_records(PYTHON, "config.py")).unwrap();
    let b = serde_json::to_string(&chunker.chunk_records(PYTHON, "config.py")).unwrap();
    assert_eq!(a, b);
}

#[test]
fn every_input_yields_a_chunk_with_its_language() {
    let chunker = Chunker::default();
    let expected = [
        ("src/user.js", "javascript"),
        ("src/service.ts", "typescript"),
        ("src/registry.rs", "rust"),
        ("app/config.py", "python"),
        ("NOTES.unknownext", "unknown"),
        ("binary.dat", "unknown"),
    ];
    for (path, language) in expected {
        let source = fixtures()
            .into_iter()
            .find(|(p, _)| *p == path)
            .map(|(_, s)| s)
            .unwrap();
        let chunks = chunker.chunk_str(&source, path);
        assert!(!chunks.is_empty());
        assert!(chunks.iter().all(|c| c.language == language), "{path}");
    }

    let broken = chunker.chunk_str("export class { oops(\n", "broken.ts");
    assert_eq!(broken.len(), 1);
    assert_eq!(broken[0].chunk.kind, ChunkKind::Unparseable);
}
