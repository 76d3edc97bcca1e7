//! # Error Module
//!
//! One error type for every stage of the Kyou pipeline. Lexer and parser
//! errors always carry a source position; runtime errors carry the position
//! of the instruction that failed whenever the program kept its spans.

use std::fmt;

// -----------------------------------------------------------------------------
// SPAN
// -----------------------------------------------------------------------------

/// A position in Kyou source text.
///
/// Columns count glyphs, not bytes: `火` and `a` both advance the column
/// by one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// 1-based line number.
    pub line: u32,
    /// 1-based column number, in characters.
    pub col: u32,
    /// Length of the spanned region in characters.
    pub len: u32,
}

impl Span {
    #[inline]
    pub fn new(line: u32, col: u32, len: u32) -> Self {
        Self { line, col, len }
    }
}

// -----------------------------------------------------------------------------
// ERROR KIND
// -----------------------------------------------------------------------------

/// Classifies what went wrong and in which stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Unknown glyph, malformed numeral or unterminated string.
    Lexer,
    /// No statement rule matched, or a rule failed after its first token.
    Parser,
    /// The same label was declared twice in one program.
    DuplicateLabel,
    /// A label reference has no declaration.
    UnresolvedLabel,
    /// Well-formed but not executable, e.g. the bitwise operators.
    UnsupportedOperand,
    /// A source power exceeds (or is incompatible with) the destination power.
    PowerMismatch,
    /// Division or modulo by zero.
    Arithmetic,
    /// Pop or return with nothing on the stack.
    StackUnderflow,
    /// Memory access outside the machine's address space.
    MemoryAccess,
    /// Negative jump target or address.
    InvalidAddress,
    /// The configured step limit was reached.
    StepLimit,
    /// Writing program output failed.
    Io,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Lexer => "LexError",
            ErrorKind::Parser => "ParseError",
            ErrorKind::DuplicateLabel => "DuplicateLabel",
            ErrorKind::UnresolvedLabel => "UnresolvedLabel",
            ErrorKind::UnsupportedOperand => "UnsupportedOperand",
            ErrorKind::PowerMismatch => "PowerMismatch",
            ErrorKind::Arithmetic => "ArithmeticError",
            ErrorKind::StackUnderflow => "StackUnderflow",
            ErrorKind::MemoryAccess => "MemoryAccessError",
            ErrorKind::InvalidAddress => "InvalidAddress",
            ErrorKind::StepLimit => "StepLimit",
            ErrorKind::Io => "IoError",
        };
        f.write_str(name)
    }
}

// -----------------------------------------------------------------------------
// KYOU ERROR
// -----------------------------------------------------------------------------

/// The error type shared by the lexer, parser and machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KyouError {
    /// What went wrong.
    pub kind: ErrorKind,
    /// Human-readable description.
    pub message: String,
    /// Source location, if one is known.
    pub span: Option<Span>,
}

impl KyouError {
    pub fn new(kind: ErrorKind, message: impl Into<String>, span: Span) -> Self {
        Self {
            kind,
            message: message.into(),
            span: Some(span),
        }
    }

    pub fn no_span(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            span: None,
        }
    }

    #[inline]
    pub fn lexer(message: impl Into<String>, span: Span) -> Self {
        Self::new(ErrorKind::Lexer, message, span)
    }

    #[inline]
    pub fn parser(message: impl Into<String>, span: Span) -> Self {
        Self::new(ErrorKind::Parser, message, span)
    }

    /// Attaches `span` unless the error already has one.
    pub fn at(mut self, span: Option<Span>) -> Self {
        if self.span.is_none() {
            self.span = span;
        }
        self
    }
}

impl fmt::Display for KyouError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.span {
            Some(span) => write!(
                f,
                "{} [line {}:{}]: {}",
                self.kind, span.line, span.col, self.message
            ),
            None => write!(f, "{}: {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for KyouError {}

pub type KyouResult<T> = std::result::Result<T, KyouError>;

// -----------------------------------------------------------------------------
// DIAGNOSTIC RENDERING
// -----------------------------------------------------------------------------

/// Renders an error with the offending source line and a caret under the
/// failing column:
///
/// ```text
/// ParseError: expected a destination after '動'
///   --> prog.kyou:3:4
///    |
///  3 | 五動冬
///    |    ^
/// ```
pub fn format_error(err: &KyouError, source: &str, path: &str) -> String {
    let span = match err.span {
        Some(span) => span,
        None => return format!("{}: {}\n  --> {}", err.kind, err.message, path),
    };

    let mut out = format!(
        "{}: {}\n  --> {}:{}:{}\n",
        err.kind, err.message, path, span.line, span.col
    );

    let line_text = source
        .trim_start_matches('\u{feff}')
        .lines()
        .nth(span.line.saturating_sub(1) as usize);

    if let Some(text) = line_text {
        let gutter = span.line.to_string().len();
        let pad = " ".repeat(gutter);
        // CJK glyphs render two cells wide in most terminals.
        let caret_offset: usize = text
            .chars()
            .take(span.col.saturating_sub(1) as usize)
            .map(display_width)
            .sum();
        out.push_str(&format!("{} |\n", pad));
        out.push_str(&format!("{} | {}\n", span.line, text));
        out.push_str(&format!(
            "{} | {}{}",
            pad,
            " ".repeat(caret_offset),
            "^".repeat(span.len.max(1) as usize)
        ));
    }

    out
}

fn display_width(c: char) -> usize {
    if c.is_ascii() {
        1
    } else {
        2
    }
}
