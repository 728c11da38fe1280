//! Kotlin formatting engine.
//!
//! The pipeline has four stages:
//!
//! 1. Parse source to a lossless CST (via `kfmt-parser`).
//! 2. Scan the tree into a stream of formatting tokens -- atoms, break
//!    candidates, block delimiters ([`scanner`], driven by [`matcher`]).
//! 3. Preprocess the stream: fill in flat lengths, resolve synchronized
//!    and marker breaks ([`preprocess`]).
//! 4. Print with a column limit ([`printer`], with [`kdoc`] handling
//!    documentation comments).
//!
//! [`Formatter`] wires the stages together. It holds only configuration;
//! every call starts from a clean slate, so formatting one file can never
//! leak state into the next.

pub mod kdoc;
pub mod matcher;
pub mod preprocess;
pub mod printer;
pub mod scanner;
pub mod tokens;

use std::fmt;
use std::io;
use std::path::Path;

use kfmt_common::span::LineIndex;

pub use printer::PrintConfig;

/// Failure while scanning a syntax tree into tokens.
#[derive(Debug)]
pub enum ScanError {
    /// No pattern alternative accepted a node's children. This means a
    /// scanner's pattern is out of sync with the grammar; it is never
    /// swallowed.
    NoMatch(matcher::PatternNoMatch),
}

impl fmt::Display for ScanError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanError::NoMatch(inner) => write!(f, "{inner}"),
        }
    }
}

impl std::error::Error for ScanError {}

/// Why a source file could not be formatted.
#[derive(Debug, Clone, PartialEq)]
pub enum FormatError {
    /// The parser rejected the input.
    Parse {
        line: u32,
        offset: u32,
        message: String,
    },
    /// A scanner pattern failed on a well-parsed tree (internal error).
    PatternNoMatch {
        line: u32,
        offset: u32,
        message: String,
    },
}

impl FormatError {
    /// 1-based line in the original source.
    pub fn line(&self) -> u32 {
        match self {
            FormatError::Parse { line, .. } | FormatError::PatternNoMatch { line, .. } => *line,
        }
    }

    /// Byte offset of the error in the original source.
    pub fn offset(&self) -> u32 {
        match self {
            FormatError::Parse { offset, .. } | FormatError::PatternNoMatch { offset, .. } => {
                *offset
            }
        }
    }

    /// Stable error-kind label for diagnostics.
    pub fn kind(&self) -> &'static str {
        match self {
            FormatError::Parse { .. } => "parse error",
            FormatError::PatternNoMatch { .. } => "internal error",
        }
    }

    pub fn message(&self) -> &str {
        match self {
            FormatError::Parse { message, .. } | FormatError::PatternNoMatch { message, .. } => {
                message
            }
        }
    }
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind(), self.message())
    }
}

impl std::error::Error for FormatError {}

/// The formatter: configuration plus the format pipeline.
///
/// Constructable per invocation; there is no shared or cached state, so
/// formatting file A then file B gives the same B as formatting B alone.
#[derive(Debug, Clone)]
pub struct Formatter {
    /// Maximum display width of an output line.
    pub max_line_length: usize,
    /// Indent step for block contents.
    pub standard_indent: usize,
    /// Indent for continuation lines of wrapped statements.
    pub continuation_indent: usize,
}

impl Default for Formatter {
    fn default() -> Self {
        Self {
            max_line_length: 100,
            standard_indent: 4,
            continuation_indent: 8,
        }
    }
}

impl Formatter {
    /// A formatter with the given line limit and default indents.
    pub fn new(max_line_length: usize) -> Self {
        Self {
            max_line_length,
            ..Self::default()
        }
    }

    /// Format a complete source file.
    pub fn format(&self, source: &str) -> Result<String, FormatError> {
        let parse = kfmt_parser::parse(source);
        if let Some(first) = parse.errors().first() {
            let index = LineIndex::new(source);
            return Err(FormatError::Parse {
                line: index.line(first.span.start),
                offset: first.span.start,
                message: first.message.clone(),
            });
        }

        let tree_scanner = scanner::TreeScanner::new();
        let tokens = tree_scanner.scan(&parse.syntax()).map_err(|err| {
            let ScanError::NoMatch(inner) = &err;
            let index = LineIndex::new(source);
            FormatError::PatternNoMatch {
                line: index.line(inner.offset),
                offset: inner.offset,
                message: err.to_string(),
            }
        })?;

        let processed = preprocess::preprocess(tokens, self.max_line_length);
        let config = PrintConfig {
            max_line_length: self.max_line_length,
            standard_indent: self.standard_indent,
            continuation_indent: self.continuation_indent,
        };
        Ok(printer::print(&processed, &config))
    }

    /// Format a file in place.
    ///
    /// Reads UTF-8, formats, and atomically replaces the file when its
    /// content changed. On a format failure the file is left untouched and
    /// a diagnostic of the shape `<path> (line <N>): <message>` goes to
    /// standard error; processing of other files can continue.
    pub fn format_file(&self, path: &Path) -> io::Result<()> {
        let source = std::fs::read_to_string(path)?;
        match self.format(&source) {
            Ok(formatted) => {
                if formatted != source {
                    write_atomic(path, &formatted)?;
                }
                Ok(())
            }
            Err(err) => {
                eprintln!("{} (line {}): {}", path.display(), err.line(), err.message());
                Ok(())
            }
        }
    }
}

/// Write via a sibling temp file and rename, so a crash mid-write never
/// leaves a truncated source file behind.
fn write_atomic(path: &Path, content: &str) -> io::Result<()> {
    let mut tmp = path.as_os_str().to_os_string();
    tmp.push(".kfmt-tmp");
    let tmp_path = std::path::PathBuf::from(tmp);
    std::fs::write(&tmp_path, content)?;
    match std::fs::rename(&tmp_path, path) {
        Ok(()) => Ok(()),
        Err(err) => {
            let _ = std::fs::remove_file(&tmp_path);
            Err(err)
        }
    }
}
