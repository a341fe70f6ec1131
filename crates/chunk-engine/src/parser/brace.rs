use super::{DeclarationParser, ParseOutcome};
use crate::error::{ChunkerError, Result};
use crate::language::Language;
use crate::source::SourceUnit;
use crate::types::{Chunk, ChunkKind};
use tree_sitter::{Node, Parser, Tree};

/// How many lines above a declaration are searched for its doc comment
const DOC_LOOKBACK_LINES: usize = 10;

/// Appended to signatures of function-valued bindings
pub const BODY_PLACEHOLDER: &str = " { ... }";

/// Name given to coalesced top-level statements
const RESIDUE_NAME: &str = "module";

/// Node kinds whose value makes a binding a function
const FUNCTION_VALUE_KINDS: &[&str] = &[
    "arrow_function",
    "function_expression",
    "function",
    "generator_function",
];

/// Syntax-tree strategy for brace-delimited languages
pub struct BraceParser {
    collect_residue: bool,
}

impl BraceParser {
    pub fn new(collect_residue: bool) -> Self {
        Self { collect_residue }
    }

    fn parse_tree(unit: &SourceUnit<'_>) -> Result<Tree> {
        let ts_language = unit.language().tree_sitter_language()?;
        let mut parser = Parser::new();
        parser
            .set_language(&ts_language)
            .map_err(|e| ChunkerError::tree_sitter(format!("Failed to set language: {e}")))?;

        parser
            .parse(unit.text(), None)
            .ok_or_else(|| ChunkerError::parse("Failed to parse source code"))
    }
}

impl DeclarationParser for BraceParser {
    fn parse(&self, unit: &SourceUnit<'_>) -> ParseOutcome {
        let tree = match Self::parse_tree(unit) {
            Ok(tree) => tree,
            Err(e) => {
                return ParseOutcome::Failed {
                    diagnostic: e.to_string(),
                }
            }
        };

        let root = tree.root_node();
        if root.has_error() {
            return ParseOutcome::Failed {
                diagnostic: describe_syntax_error(root),
            };
        }

        let extractor = Extractor::new(unit);
        let mut chunks = extractor.top_level(root, self.collect_residue);
        if chunks.is_empty() {
            return ParseOutcome::Empty;
        }

        chunks.sort_by_key(|chunk| chunk.start_offset);
        ParseOutcome::Declarations(chunks)
    }
}

/// A top-level script statement, after classification
enum ScriptDecl<'t> {
    /// `export ...` wrapping another statement
    Export(Node<'t>),
    Function(Node<'t>),
    Class(Node<'t>),
    /// `const` / `let` / `var` declarations
    Bindings(Node<'t>),
    Other,
}

impl<'t> ScriptDecl<'t> {
    fn classify(node: Node<'t>) -> Self {
        match node.kind() {
            "export_statement" => node
                .child_by_field_name("declaration")
                .or_else(|| node.child_by_field_name("value"))
                .map_or(Self::Other, Self::Export),
            "function_declaration"
            | "generator_function_declaration"
            | "function_expression"
            | "function"
            | "generator_function"
            | "arrow_function" => Self::Function(node),
            "class_declaration" | "abstract_class_declaration" | "class" => Self::Class(node),
            "lexical_declaration" | "variable_declaration" => Self::Bindings(node),
            _ => Self::Other,
        }
    }
}

/// Walks top-level nodes of one tree and builds declaration chunks
struct Extractor<'u, 'a> {
    unit: &'u SourceUnit<'a>,
    lines: Vec<&'a str>,
}

impl<'u, 'a> Extractor<'u, 'a> {
    fn new(unit: &'u SourceUnit<'a>) -> Self {
        Self {
            unit,
            lines: unit.text().lines().collect(),
        }
    }

    fn text(&self, node: Node<'_>) -> &'a str {
        self.unit.slice(node.start_byte(), node.end_byte())
    }

    fn top_level(&self, root: Node<'_>, collect_residue: bool) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        let mut residue: Option<(usize, usize)> = None;
        let mut attributes: Vec<Node<'_>> = Vec::new();

        let mut cursor = root.walk();
        let children: Vec<_> = root.named_children(&mut cursor).collect();

        for child in children {
            let kind = child.kind();
            if is_comment_kind(kind) {
                continue;
            }
            if kind == "attribute_item" {
                attributes.push(child);
                continue;
            }

            let extracted = match self.unit.language() {
                Language::Rust => self.rust_item(child, &attributes).into_iter().collect(),
                _ => self.script_item(child),
            };

            if extracted.is_empty() {
                let start = attributes
                    .first()
                    .map_or(child.start_byte(), |attr| attr.start_byte());
                residue = Some(match residue {
                    Some((first, _)) => (first, child.end_byte()),
                    None => (start, child.end_byte()),
                });
            } else {
                if let Some((start, end)) = residue.take() {
                    if collect_residue {
                        chunks.push(self.residue_chunk(start, end));
                    }
                }
                chunks.extend(extracted);
            }
            attributes.clear();
        }

        if let Some((start, end)) = residue {
            if collect_residue && !chunks.is_empty() {
                chunks.push(self.residue_chunk(start, end));
            }
        }

        chunks
    }

    fn residue_chunk(&self, start: usize, end: usize) -> Chunk {
        Chunk::from_span(self.unit, ChunkKind::Module, RESIDUE_NAME, start, end)
    }

    /// Classify a JavaScript / TypeScript statement, unwrapping exports
    fn script_item(&self, outer: Node<'_>) -> Vec<Chunk> {
        let mut exported = false;
        let mut decorators = Vec::new();
        let mut current = outer;

        let decl = loop {
            match ScriptDecl::classify(current) {
                ScriptDecl::Export(inner) => {
                    exported = true;
                    decorators.extend(self.decorators_of(current));
                    current = inner;
                }
                decl => break decl,
            }
        };

        let mut chunks = match decl {
            ScriptDecl::Function(node) => vec![self.script_function(outer, node)],
            ScriptDecl::Class(node) => {
                decorators.extend(self.decorators_of(node));
                vec![self.script_class(outer, node)]
            }
            ScriptDecl::Bindings(node) => self.script_bindings(outer, node),
            ScriptDecl::Export(_) | ScriptDecl::Other => Vec::new(),
        };

        for chunk in &mut chunks {
            chunk.is_exported = exported;
            chunk.decorators.extend(decorators.iter().cloned());
        }
        chunks
    }

    fn script_function(&self, outer: Node<'_>, node: Node<'_>) -> Chunk {
        let name = node
            .child_by_field_name("name")
            .map_or_else(|| anonymous_name(outer), |n| self.text(n).to_string());

        let mut chunk = self.declaration_chunk(outer, ChunkKind::Function, name);
        if let Some(body) = node.child_by_field_name("body") {
            let header = self.unit.slice(outer.start_byte(), body.start_byte());
            chunk.signature = Some(header.trim_end().to_string());
        }
        chunk.is_async = has_child_kind(node, "async");
        chunk.is_generator = is_generator(node);
        chunk
    }

    fn script_class(&self, outer: Node<'_>, node: Node<'_>) -> Chunk {
        let name = node
            .child_by_field_name("name")
            .map_or_else(|| anonymous_name(outer), |n| self.text(n).to_string());
        let signature = format!("class {name}");
        self.declaration_chunk(outer, ChunkKind::Class, name)
            .signature(signature)
    }

    /// Function-valued bindings inside a `const` / `let` / `var` statement
    fn script_bindings(&self, outer: Node<'_>, node: Node<'_>) -> Vec<Chunk> {
        let mut cursor = node.walk();
        let declarators: Vec<_> = node
            .named_children(&mut cursor)
            .filter(|child| child.kind() == "variable_declarator")
            .collect();
        let single = declarators.len() == 1;

        let mut chunks = Vec::new();
        for declarator in declarators {
            let Some(value) = declarator.child_by_field_name("value") else {
                continue;
            };
            if !FUNCTION_VALUE_KINDS.contains(&value.kind()) {
                continue;
            }

            let span = if single { outer } else { declarator };
            let name = declarator
                .child_by_field_name("name")
                .map_or_else(|| anonymous_name(declarator), |n| self.text(n).to_string());

            let mut chunk = self.declaration_chunk(span, ChunkKind::Function, name);
            if let Some(body) = value.child_by_field_name("body") {
                let header = self.unit.slice(span.start_byte(), body.start_byte());
                let header = header.trim_end().trim_end_matches("=>").trim_end();
                let header = if value.kind() == "arrow_function" {
                    format!("{header} =>")
                } else {
                    header.to_string()
                };
                chunk.signature = Some(format!("{header}{BODY_PLACEHOLDER}"));
            }
            chunk.is_async = has_child_kind(value, "async");
            chunk.is_generator = is_generator(value);
            chunks.push(chunk);
        }
        chunks
    }

    fn decorators_of(&self, node: Node<'_>) -> Vec<String> {
        let mut cursor = node.walk();
        node.named_children(&mut cursor)
            .filter(|child| child.kind() == "decorator")
            .map(|child| self.text(child).trim().to_string())
            .collect()
    }

    /// Classify a Rust item; `attributes` are the `#[...]` lines right above it
    fn rust_item(&self, node: Node<'_>, attributes: &[Node<'_>]) -> Option<Chunk> {
        let kind = match node.kind() {
            "function_item" => ChunkKind::Function,
            "struct_item" | "enum_item" | "union_item" | "trait_item" | "impl_item" => {
                ChunkKind::Class
            }
            "mod_item" if node.child_by_field_name("body").is_some() => ChunkKind::Module,
            _ => return None,
        };

        let name = match node.kind() {
            "impl_item" => self.impl_target(node),
            _ => node
                .child_by_field_name("name")
                .map(|n| self.text(n).to_string()),
        };
        let name = name.unwrap_or_else(|| anonymous_name(node));

        let start = attributes
            .first()
            .map_or(node.start_byte(), |attr| attr.start_byte());
        let mut chunk = Chunk::from_span(self.unit, kind, name, start, node.end_byte());
        chunk.doc_comment = self.doc_comment_before(chunk.start_line - 1);

        let header_end = node
            .child_by_field_name("body")
            .map_or(node.end_byte(), |body| body.start_byte());
        let header = self.unit.slice(node.start_byte(), header_end);
        chunk.signature = Some(header.trim_end().trim_end_matches(';').trim_end().to_string());

        chunk.decorators = attributes
            .iter()
            .map(|attr| self.text(*attr).trim().to_string())
            .collect();
        chunk.is_exported = has_child_kind(node, "visibility_modifier");
        chunk.is_async = first_child_of_kind(node, "function_modifiers")
            .is_some_and(|modifiers| has_child_kind(modifiers, "async"));
        Some(chunk)
    }

    /// Type an `impl` block is attached to: `impl<T> Display for Point<T>` → `Point`
    fn impl_target(&self, impl_node: Node<'_>) -> Option<String> {
        let mut ty = impl_node.child_by_field_name("type")?;
        loop {
            match ty.kind() {
                // Generic type: impl<T> MyStruct<T>
                "generic_type" => ty = ty.child_by_field_name("type")?,
                // Qualified path: impl module::MyStruct
                "scoped_type_identifier" => ty = ty.child_by_field_name("name")?,
                _ => return Some(self.text(ty).to_string()),
            }
        }
    }

    fn declaration_chunk(&self, span: Node<'_>, kind: ChunkKind, name: String) -> Chunk {
        let chunk = Chunk::from_span(self.unit, kind, name, span.start_byte(), span.end_byte());
        let doc = self.doc_comment_before(span.start_position().row);
        chunk.doc_comment(doc)
    }

    /// Nearest doc-comment block above the 0-based `line`.
    ///
    /// Blank lines may separate the block from the declaration, code may not.
    /// Text-based because tree-sitter keeps comments as loose siblings.
    fn doc_comment_before(&self, line: usize) -> Option<String> {
        let markers = self.unit.language().doc_comment_markers();
        if markers.is_empty() || line == 0 || line > self.lines.len() {
            return None;
        }

        let floor = line.saturating_sub(DOC_LOOKBACK_LINES);
        let mut idx = line;
        while idx > floor && self.lines[idx - 1].trim().is_empty() {
            idx -= 1;
        }
        let block_end = idx;
        while idx > floor && is_comment_line(self.lines[idx - 1].trim()) {
            idx -= 1;
        }

        let block = &self.lines[idx..block_end];
        let doc_start = block.iter().position(|line| {
            let line = line.trim_start();
            markers.iter().any(|marker| line.starts_with(marker))
        })?;

        let doc = block[doc_start..]
            .iter()
            .map(|line| line.trim())
            .collect::<Vec<_>>()
            .join("\n");
        Some(doc)
    }
}

fn is_comment_kind(kind: &str) -> bool {
    matches!(
        kind,
        "comment" | "line_comment" | "block_comment" | "hash_bang_line"
    )
}

fn is_comment_line(trimmed: &str) -> bool {
    trimmed.starts_with("//") || trimmed.starts_with("/*") || trimmed.starts_with('*')
}

fn has_child_kind(node: Node<'_>, kind: &str) -> bool {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).any(|child| child.kind() == kind);
    found
}

fn first_child_of_kind<'t>(node: Node<'t>, kind: &str) -> Option<Node<'t>> {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).find(|child| child.kind() == kind);
    found
}

fn is_generator(node: Node<'_>) -> bool {
    node.kind().contains("generator") || has_child_kind(node, "*")
}

fn anonymous_name(node: Node<'_>) -> String {
    format!("anonymous_{}", node.start_position().row + 1)
}

/// Human-readable location of the first syntax error in the tree
fn describe_syntax_error(root: Node<'_>) -> String {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if node.is_missing() {
            let pos = node.start_position();
            return format!(
                "missing `{}` at line {}, column {}",
                node.kind(),
                pos.row + 1,
                pos.column + 1
            );
        }
        if node.is_error() {
            let pos = node.start_position();
            return format!("syntax error at line {}, column {}", pos.row + 1, pos.column + 1);
        }
        if !node.has_error() {
            continue;
        }

        let mut cursor = node.walk();
        let children: Vec<_> = node.children(&mut cursor).collect();
        stack.extend(children.into_iter().rev());
    }
    "syntax error".to_string()
}
