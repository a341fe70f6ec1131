use super::{DeclarationParser, ParseOutcome};
use crate::source::SourceUnit;
use crate::types::{Chunk, ChunkKind};
use once_cell::sync::Lazy;
use regex::{Captures, Regex};

// Decorator lines, optional async marker, then `def` / `class` and the name
static HEADER_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^[ \t]*(?P<decorators>(?:@[^\n]*\n[ \t]*)*)(?P<async>async[ \t]+)?(?P<kind>def|class)[ \t]+(?P<name>[A-Za-z_][A-Za-z0-9_]*)",
    )
    .expect("Invalid declaration header pattern")
});

static YIELD_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\byield\b").expect("Invalid yield pattern"));

/// Lines after the header searched for a docstring
const DOCSTRING_LOOKAHEAD_LINES: usize = 5;

const TAB_WIDTH: usize = 8;

const TRIPLE_QUOTES: [&str; 2] = ["\"\"\"", "'''"];

/// Pattern strategy for indentation-delimited languages.
///
/// Headers are found anywhere in the file, so nested declarations get their
/// own chunk inside the range of the enclosing one.
#[derive(Debug, Default)]
pub struct IndentParser;

impl IndentParser {
    pub fn new() -> Self {
        Self
    }
}

impl DeclarationParser for IndentParser {
    fn parse(&self, unit: &SourceUnit<'_>) -> ParseOutcome {
        let text = unit.text();
        let mut chunks: Vec<Chunk> = HEADER_PATTERN
            .captures_iter(text)
            .filter_map(|caps| declaration(unit, &caps))
            .collect();

        if chunks.is_empty() {
            return ParseOutcome::Empty;
        }

        chunks.sort_by_key(|chunk| chunk.start_offset);
        ParseOutcome::Declarations(chunks)
    }
}

fn declaration(unit: &SourceUnit<'_>, caps: &Captures<'_>) -> Option<Chunk> {
    let text = unit.text();
    let whole = caps.get(0)?;
    let kind_match = caps.name("kind")?.as_str();
    let name = caps.name("name")?.as_str();
    let header_start = caps
        .name("async")
        .or_else(|| caps.name("kind"))
        .map_or(whole.start(), |m| m.start());

    let header_line_start = line_start_of(text, header_start);
    let base_indent = indent_width(&text[header_line_start..header_start]);

    let colon = header_colon(text, header_start);
    let header_end = colon.unwrap_or_else(|| line_end_of(text, header_start));
    let header_line_end = line_end_of(text, header_end);
    let body_start = next_line_start(text, header_line_end);

    let end = block_end(text, body_start, base_indent).unwrap_or(header_line_end);

    let kind = if kind_match == "class" {
        ChunkKind::Class
    } else {
        ChunkKind::Function
    };

    let mut chunk = Chunk::from_span(unit, kind, name, whole.start(), end);
    chunk.signature = Some(
        text[header_start..header_end]
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" "),
    );
    chunk.doc_comment = docstring_after(text, body_start);
    chunk.decorators = caps
        .name("decorators")
        .map(|m| {
            m.as_str()
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default();
    chunk.is_async = caps.name("async").is_some();
    chunk.is_generator = kind == ChunkKind::Function && YIELD_PATTERN.is_match(&chunk.content);
    Some(chunk)
}

/// Offset of the `:` that closes a declaration header, skipping brackets and
/// string literals so multi-line parameter lists are handled
fn header_colon(text: &str, from: usize) -> Option<usize> {
    let bytes = text.as_bytes();
    let mut depth: usize = 0;
    let mut quote: Option<u8> = None;
    let mut idx = from;

    while idx < bytes.len() {
        let b = bytes[idx];
        match quote {
            Some(q) => {
                if b == b'\\' {
                    idx += 1;
                } else if b == q || b == b'\n' {
                    quote = None;
                }
            }
            None => match b {
                b'\'' | b'"' => quote = Some(b),
                b'(' | b'[' | b'{' => depth += 1,
                b')' | b']' | b'}' => depth = depth.saturating_sub(1),
                b':' if depth == 0 => return Some(idx),
                b'\n' if depth == 0 => return None,
                _ => {}
            },
        }
        idx += 1;
    }
    None
}

/// End offset (exclusive, without line terminator) of the last content line
/// of the block that starts at `body_start`.
///
/// Blank and comment-only lines never end the block and are not counted as
/// content; lines inside an open triple-quoted string belong to the block.
fn block_end(text: &str, body_start: usize, base_indent: usize) -> Option<usize> {
    let mut last_content_end = None;
    let mut open_quote: Option<&'static str> = None;
    let mut pos = body_start;

    while pos < text.len() {
        let end = line_end_of(text, pos);
        let line = &text[pos..end];
        let trimmed = line.trim();

        if open_quote.is_some() {
            open_quote = track_triple_quotes(open_quote, line);
            last_content_end = Some(end);
        } else if trimmed.is_empty() || trimmed.starts_with('#') {
            // skipped
        } else if indent_width(line) <= base_indent {
            break;
        } else {
            open_quote = track_triple_quotes(None, line);
            last_content_end = Some(end);
        }

        pos = next_line_start(text, end);
    }

    last_content_end
}

/// Triple-quote state after scanning `line` starting from `open`
fn track_triple_quotes(mut open: Option<&'static str>, line: &str) -> Option<&'static str> {
    let mut rest = line;
    loop {
        match open {
            Some(marker) => match rest.find(marker) {
                Some(pos) => {
                    rest = &rest[pos + marker.len()..];
                    open = None;
                }
                None => return open,
            },
            None => {
                let next = TRIPLE_QUOTES
                    .iter()
                    .filter_map(|marker| rest.find(*marker).map(|pos| (pos, *marker)))
                    .min_by_key(|(pos, _)| *pos);
                match next {
                    Some((pos, marker)) => {
                        rest = &rest[pos + marker.len()..];
                        open = Some(marker);
                    }
                    None => return None,
                }
            }
        }
    }
}

/// Triple-quoted string opening within a few lines of `body_start`
fn docstring_after(text: &str, body_start: usize) -> Option<String> {
    let mut pos = body_start;

    for _ in 0..DOCSTRING_LOOKAHEAD_LINES {
        if pos >= text.len() {
            return None;
        }
        let end = line_end_of(text, pos);
        let trimmed = text[pos..end].trim();
        let next = next_line_start(text, end);

        if trimmed.is_empty() || trimmed.starts_with('#') {
            pos = next;
            continue;
        }

        let literal = trimmed
            .strip_prefix(['r', 'u', 'R', 'U'])
            .filter(|rest| TRIPLE_QUOTES.iter().any(|marker| rest.starts_with(*marker)))
            .unwrap_or(trimmed);
        let marker = TRIPLE_QUOTES
            .into_iter()
            .find(|marker| literal.starts_with(*marker))?;

        let body = &literal[marker.len()..];
        if let Some(close) = body.find(marker) {
            return Some(body[..close].trim().to_string());
        }
        return multiline_docstring(text, body, next, marker);
    }

    None
}

fn multiline_docstring(text: &str, first: &str, mut pos: usize, marker: &str) -> Option<String> {
    let mut lines = vec![first.trim()];
    while pos < text.len() {
        let end = line_end_of(text, pos);
        let line = &text[pos..end];
        if let Some(close) = line.find(marker) {
            lines.push(line[..close].trim());
            return Some(lines.join("\n").trim().to_string());
        }
        lines.push(line.trim());
        pos = next_line_start(text, end);
    }
    None
}

/// Column width of the leading whitespace of `line`
fn indent_width(line: &str) -> usize {
    let mut width = 0;
    for ch in line.chars() {
        match ch {
            ' ' => width += 1,
            '\t' => width = (width / TAB_WIDTH + 1) * TAB_WIDTH,
            _ => break,
        }
    }
    width
}

fn line_start_of(text: &str, offset: usize) -> usize {
    text[..offset].rfind('\n').map_or(0, |idx| idx + 1)
}

/// End of the line holding `offset`, excluding `\n` and a preceding `\r`
fn line_end_of(text: &str, offset: usize) -> usize {
    let end = text[offset..]
        .find('\n')
        .map_or(text.len(), |idx| offset + idx);
    if end > offset && text.as_bytes()[end - 1] == b'\r' {
        end - 1
    } else {
        end
    }
}

/// Start of the line after the one ending at `line_end`
fn next_line_start(text: &str, line_end: usize) -> usize {
    text[line_end..]
        .find('\n')
        .map_or(text.len(), |idx| line_end + idx + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn declarations(code: &str) -> Vec<Chunk> {
        let unit = SourceUnit::new(code, "module.py");
        match IndentParser::new().parse(&unit) {
            ParseOutcome::Declarations(chunks) => chunks,
            other => panic!("expected declarations, got {other:?}"),
        }
    }

    #[test]
    fn sibling_functions_do_not_overlap() {
        let code = "def first(a):\n    return a + 1\n\n\ndef second(b):\n    return b * 2\n";
        let chunks = declarations(code);
        assert_eq!(chunks.len(), 2);

        assert_eq!(chunks[0].name, "first");
        assert_eq!(chunks[0].content, "def first(a):\n    return a + 1");
        assert_eq!(chunks[1].name, "second");
        assert_eq!(chunks[1].content, "def second(b):\n    return b * 2");
        assert!(chunks[0].end_offset <= chunks[1].start_offset);
        assert_eq!((chunks[1].start_line, chunks[1].end_line), (5, 6));
    }

    #[test]
    fn nested_declarations_are_contained_in_parent() {
        let code = "class Repo:\n    \"\"\"Stores things.\"\"\"\n\n    def get(self, key):\n        # look it up\n        return self.items[key]\n\n    async def put(self, key, value):\n        self.items[key] = value\n\nx = Repo()\n";
        let chunks = declarations(code);
        let names: Vec<_> = chunks.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Repo", "get", "put"]);

        let class = &chunks[0];
        assert_eq!(class.kind, ChunkKind::Class);
        assert_eq!(class.doc_comment.as_deref(), Some("Stores things."));
        assert!(class.content.ends_with("self.items[key] = value"));

        for child in &chunks[1..] {
            assert!(child.start_offset > class.start_offset);
            assert!(child.end_offset <= class.end_offset);
        }
        assert!(chunks[2].is_async);
        assert_eq!(
            chunks[2].signature.as_deref(),
            Some("async def put(self, key, value)")
        );
    }

    #[test]
    fn comments_at_lower_indent_do_not_end_block() {
        let code = "def run():\n    step_one()\n# a stray comment\n    step_two()\nafter = 1\n";
        let chunks = declarations(code);
        assert_eq!(
            chunks[0].content,
            "def run():\n    step_one()\n# a stray comment\n    step_two()"
        );
    }

    #[test]
    fn decorators_and_multiline_headers() {
        let code = "@app.route(\"/\")\n@login_required\ndef index(\n    request,\n    page=1,\n):\n    '''\n    Render the index.\n\n    Paginated.\n    '''\n    return render(request)\n";
        let chunks = declarations(code);
        assert_eq!(chunks.len(), 1);

        let index = &chunks[0];
        assert_eq!(index.start_offset, 0);
        assert_eq!(
            index.decorators,
            vec!["@app.route(\"/\")".to_string(), "@login_required".to_string()]
        );
        assert_eq!(
            index.signature.as_deref(),
            Some("def index( request, page=1, )")
        );
        assert_eq!(
            index.doc_comment.as_deref(),
            Some("Render the index.\n\nPaginated.")
        );
        assert!(index.content.ends_with("return render(request)"));
    }

    #[test]
    fn docstring_search_stops_at_code() {
        let code = "def f():\n    x = 1\n    \"\"\"not a docstring\"\"\"\n    return x\n";
        let chunks = declarations(code);
        assert!(chunks[0].doc_comment.is_none());
    }

    #[test]
    fn triple_quoted_text_at_column_zero_stays_in_block() {
        let code = "def usage():\n    return \"\"\"\nUsage: tool [options]\n\"\"\"\n\ndef other():\n    pass\n";
        let chunks = declarations(code);
        assert_eq!(chunks.len(), 2);
        assert_eq!(
            chunks[0].content,
            "def usage():\n    return \"\"\"\nUsage: tool [options]\n\"\"\""
        );
    }

    #[test]
    fn generators_and_one_liners() {
        let code = "def numbers():\n    yield 1\n\ndef noop(): pass\n";
        let chunks = declarations(code);
        assert!(chunks[0].is_generator);
        assert!(!chunks[1].is_generator);
        assert_eq!(chunks[1].content, "def noop(): pass");
    }

    #[test]
    fn crlf_lines_keep_exact_offsets() {
        let code = "def a():\r\n    return 1\r\n\r\ndef b():\r\n    return 2\r\n";
        let chunks = declarations(code);
        assert_eq!(chunks.len(), 2);
        for chunk in &chunks {
            assert_eq!(chunk.content, &code[chunk.start_offset..chunk.end_offset]);
            assert!(!chunk.content.ends_with('\r'));
        }
    }

    #[test]
    fn no_headers_is_empty() {
        let unit = SourceUnit::new("import os\nprint(os.name)\n", "script.py");
        assert_eq!(IndentParser::new().parse(&unit), ParseOutcome::Empty);
    }

    #[test]
    fn indent_width_expands_tabs() {
        assert_eq!(indent_width("    x"), 4);
        assert_eq!(indent_width("\tx"), 8);
        assert_eq!(indent_width("  \tx"), 8);
        assert_eq!(indent_width("x"), 0);
    }
}
