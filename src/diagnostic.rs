//! Structured diagnostics. The core only produces [`Diagnostic`] values;
//! rendering them to a terminal or an LSP client is the toplevel driver's
//! job (out of scope, per spec §1).

use std::fmt;
use crate::Symbol;

/// A source location, as emitted by the scanner and carried on every token,
/// expression, statement and declaration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Location {
  pub filename: Symbol,
  pub start_line: u32,
  pub end_line: u32,
  pub start_column: u32,
  pub end_column: u32,
  pub start_position: u32,
  pub end_position: u32,
}

impl Location {
  #[must_use]
  pub fn new(filename: Symbol, line: u32, column: u32, position: u32) -> Self {
    Self {
      filename,
      start_line: line, end_line: line,
      start_column: column, end_column: column,
      start_position: position, end_position: position,
    }
  }

  /// Extend this location so it also covers `other`, keeping the start and
  /// taking `other`'s end.
  #[must_use]
  pub fn extended_to(&self, other: &Location) -> Self {
    Self {
      filename: self.filename,
      start_line: self.start_line, end_line: other.end_line,
      start_column: self.start_column, end_column: other.end_column,
      start_position: self.start_position, end_position: other.end_position,
    }
  }
}

/// The taxonomy of error kinds the core can produce, bit-exact with spec §7.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ErrorKind {
  // --- Lex errors ---
  #[error("unexpected character `{0}`")]
  UnexpectedCharacter(char),
  #[error("unclosed char literal")]
  UnclosedCharLiteral,
  #[error("unclosed string literal")]
  UnclosedStringLiteral,
  #[error("unclosed comment block")]
  UnclosedCommentBlock,
  #[error("invalid escape `\\{0}`")]
  InvalidEscape(char),
  #[error("invalid float literal")]
  InvalidFloatLiteral,
  #[error("invalid hexadecimal literal")]
  InvalidHexadecimalLiteral,
  #[error("invalid octal literal")]
  InvalidOctalLiteral,
  #[error("invalid binary literal")]
  InvalidBinLiteral,
  #[error("invalid literal suffix `{0}`")]
  InvalidLiteralSuffix(String),
  #[error("mismatched closing delimiter, expected `{expected}`, found `{found}`")]
  MismatchedClosingDelimiter { expected: char, found: char },
  #[error("expected one or many `{0}` characters")]
  ExpectedOneOrManyCharacters(char),
  #[error("restricted character on identifier string")]
  RestrictedCharacterOnIdentifierString,
  #[error("int8 literal out of range")]
  Int8OutOfRange,
  #[error("int16 literal out of range")]
  Int16OutOfRange,
  #[error("int32 literal out of range")]
  Int32OutOfRange,
  #[error("int64 literal out of range")]
  Int64OutOfRange,
  #[error("uint8 literal out of range")]
  UInt8OutOfRange,
  #[error("uint16 literal out of range")]
  UInt16OutOfRange,
  #[error("uint32 literal out of range")]
  UInt32OutOfRange,
  #[error("uint64 literal out of range")]
  UInt64OutOfRange,
  #[error("isize literal out of range")]
  IsizeOutOfRange,
  #[error("usize literal out of range")]
  UsizeOutOfRange,

  // --- Resolver errors ---
  #[error("expression is not resolvable at preprocessor-time")]
  NotResolvableAtPreprocessorTime,
  #[error("this operation is unsure at compile-time")]
  OperationUnsureAtCompileTime,
  #[error("{0} type is incomplete")]
  TypeIsIncomplete(&'static str),
  #[error("cannot resolve size of {0}")]
  CannotResolveSizeOf(&'static str),
  #[error("expression is not resolvable")]
  NotResolvable,

  // --- MIR builder invariant violations (fatal) ---
  #[error("MIR builder invariant violated: {0}")]
  MirInvariantViolated(&'static str),
}

/// A fully structured diagnostic: an error kind, its location, and optional
/// help/note/quote strings the external renderer can choose to show.
#[derive(Clone, Debug)]
pub struct Diagnostic {
  pub kind: ErrorKind,
  pub location: Location,
  pub help: Option<String>,
  pub note: Option<String>,
  pub quote: Option<String>,
}

impl Diagnostic {
  #[must_use]
  pub fn new(kind: ErrorKind, location: Location) -> Self {
    Self { kind, location, help: None, note: None, quote: None }
  }

  #[must_use]
  pub fn with_help(mut self, help: impl Into<String>) -> Self {
    self.help = Some(help.into());
    self
  }

  #[must_use]
  pub fn with_note(mut self, note: impl Into<String>) -> Self {
    self.note = Some(note.into());
    self
  }
}

impl fmt::Display for Diagnostic {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}:{}: error: {}", self.location.filename, self.location.start_line,
      self.location.start_column, self.kind)
  }
}

/// Accumulates diagnostics across a phase and tracks the single shared error
/// counter spec §7 describes: lex errors accumulate and the phase keeps
/// going, but the toplevel driver exits non-zero once the phase ends if the
/// counter is nonzero.
#[derive(Default, Debug)]
pub struct DiagnosticSink {
  diagnostics: Vec<Diagnostic>,
}

impl DiagnosticSink {
  #[must_use] pub fn new() -> Self { Self::default() }

  pub fn push(&mut self, diagnostic: Diagnostic) {
    log::warn!("{diagnostic}");
    self.diagnostics.push(diagnostic);
  }

  #[must_use] pub fn error_count(&self) -> usize { self.diagnostics.len() }
  #[must_use] pub fn has_errors(&self) -> bool { !self.diagnostics.is_empty() }
  #[must_use] pub fn diagnostics(&self) -> &[Diagnostic] { &self.diagnostics }
}

/// A fatal error raised immediately, used for resolver and MIR builder
/// invariant violations (spec §7: "immediately fatal").
#[derive(Debug, thiserror::Error)]
#[error("{diagnostic}")]
pub struct LilyError {
  pub diagnostic: Diagnostic,
}

impl LilyError {
  #[must_use] pub fn new(kind: ErrorKind, location: Location) -> Self {
    Self { diagnostic: Diagnostic::new(kind, location) }
  }
}

pub type LilyResult<T> = Result<T, LilyError>;
