use crate::error::{ChunkerError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Source language detected from a file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Rust,
    Python,
    JavaScript,
    TypeScript,
    Tsx,
    Go,
    Java,
    C,
    Cpp,
    CSharp,
    Ruby,
    Swift,
    Kotlin,
    Unknown,
}

/// How block structure is delimited, which decides the parsing strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LanguageFamily {
    /// Explicit block tokens, parsed through a syntax tree
    BraceDelimited,
    /// Whitespace depth, parsed through header patterns plus indentation
    IndentationDelimited,
    /// No structural strategy; content is windowed
    Unknown,
}

impl LanguageFamily {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::BraceDelimited => "brace-delimited",
            Self::IndentationDelimited => "indentation-delimited",
            Self::Unknown => "unknown",
        }
    }
}

impl Language {
    /// Detect language from file extension
    pub fn from_extension(ext: &str) -> Self {
        match ext.to_lowercase().as_str() {
            "rs" => Language::Rust,
            "py" | "pyw" | "pyi" => Language::Python,
            "js" | "mjs" | "cjs" | "jsx" => Language::JavaScript,
            "ts" | "mts" | "cts" => Language::TypeScript,
            "tsx" => Language::Tsx,
            "go" => Language::Go,
            "java" => Language::Java,
            "c" | "h" => Language::C,
            "cpp" | "cc" | "cxx" | "hpp" | "hh" | "hxx" => Language::Cpp,
            "cs" => Language::CSharp,
            "rb" => Language::Ruby,
            "swift" => Language::Swift,
            "kt" | "kts" => Language::Kotlin,
            _ => Language::Unknown,
        }
    }

    /// Detect language from file path
    pub fn from_path(path: impl AsRef<Path>) -> Self {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .map(Self::from_extension)
            .unwrap_or(Language::Unknown)
    }

    /// Get language name as string
    pub fn as_str(self) -> &'static str {
        match self {
            Language::Rust => "rust",
            Language::Python => "python",
            Language::JavaScript => "javascript",
            Language::TypeScript => "typescript",
            Language::Tsx => "tsx",
            Language::Go => "go",
            Language::Java => "java",
            Language::C => "c",
            Language::Cpp => "cpp",
            Language::CSharp => "csharp",
            Language::Ruby => "ruby",
            Language::Swift => "swift",
            Language::Kotlin => "kotlin",
            Language::Unknown => "unknown",
        }
    }

    /// Family used to pick the structural strategy.
    ///
    /// Only languages with a bundled grammar are brace-delimited; other
    /// brace languages are windowed like unknown content.
    pub fn family(self) -> LanguageFamily {
        match self {
            Language::Rust | Language::JavaScript | Language::TypeScript | Language::Tsx => {
                LanguageFamily::BraceDelimited
            }
            Language::Python => LanguageFamily::IndentationDelimited,
            _ => LanguageFamily::Unknown,
        }
    }

    /// Get Tree-sitter language instance
    pub fn tree_sitter_language(self) -> Result<tree_sitter::Language> {
        match self {
            Language::Rust => Ok(tree_sitter_rust::LANGUAGE.into()),
            Language::JavaScript => Ok(tree_sitter_javascript::LANGUAGE.into()),
            Language::TypeScript => Ok(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()),
            Language::Tsx => Ok(tree_sitter_typescript::LANGUAGE_TSX.into()),
            _ => Err(ChunkerError::tree_sitter(format!(
                "no grammar bundled for {}",
                self.as_str()
            ))),
        }
    }

    /// Single-line comment marker, if the language has one
    pub fn line_comment(self) -> Option<&'static str> {
        match self {
            Language::Rust
            | Language::JavaScript
            | Language::TypeScript
            | Language::Tsx
            | Language::Go
            | Language::Java
            | Language::C
            | Language::Cpp
            | Language::CSharp
            | Language::Swift
            | Language::Kotlin => Some("//"),
            Language::Python | Language::Ruby => Some("#"),
            Language::Unknown => None,
        }
    }

    /// Prefixes that open a documentation comment
    pub fn doc_comment_markers(self) -> &'static [&'static str] {
        match self {
            Language::Rust => &["///", "/**"],
            Language::JavaScript | Language::TypeScript | Language::Tsx => &["/**"],
            _ => &[],
        }
    }
}
