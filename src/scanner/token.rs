//! Token kinds, literal suffixes, and the keyword table (spec §4.1).

use crate::{Location, Symbol};

/// A numeric literal suffix. Determines both the re-parse base check and the
/// documented overflow range (spec §4.1).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LiteralSuffix {
  I8, I16, I32, I64, Isize,
  U8, U16, U32, U64, Usize,
  F32, F64,
}

impl LiteralSuffix {
  /// Parse a suffix spelling (`"I8"`, `"U64"`, `"Iz"`, `"Uz"`, `"F32"`, ...).
  #[must_use]
  pub fn from_str(s: &str) -> Option<Self> {
    Some(match s {
      "I8" => Self::I8, "I16" => Self::I16, "I32" => Self::I32, "I64" => Self::I64,
      "Iz" => Self::Isize,
      "U8" => Self::U8, "U16" => Self::U16, "U32" => Self::U32, "U64" => Self::U64,
      "Uz" => Self::Usize,
      "F32" => Self::F32, "F64" => Self::F64,
      _ => return None,
    })
  }

  #[must_use] pub fn is_float(self) -> bool { matches!(self, Self::F32 | Self::F64) }
}

/// The distinct keywords of the language, recognized through the sorted
/// keyword table (spec §4.1: "sorted table with binary search").
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum Keyword {
  And, As, Asm, Async, Await, Begin, Break, Case, Class, Const,
  Defer, Do, Else, End, Enum, Error, False, For, Fun, Global,
  If, Impl, Import, In, Include, Is, Lib, Macro, Match, Module,
  Mut, Next, Nil, Not, Object, Or, Package, Pub, Raise, Req,
  Return, Self_, SelfUpper, Test, Trait, True, Try, Type, Undef,
  Unsafe, Val, Variant, When, While, Xor,
}

/// The static, alphabetically sorted keyword table. Must remain sorted: the
/// scanner looks keywords up with `binary_search_by_key`.
pub const KEYWORDS: &[(&str, Keyword)] = &[
  ("And", Keyword::And),
  ("and", Keyword::And),
  ("as", Keyword::As),
  ("asm", Keyword::Asm),
  ("async", Keyword::Async),
  ("await", Keyword::Await),
  ("begin", Keyword::Begin),
  ("break", Keyword::Break),
  ("case", Keyword::Case),
  ("class", Keyword::Class),
  ("const", Keyword::Const),
  ("defer", Keyword::Defer),
  ("do", Keyword::Do),
  ("else", Keyword::Else),
  ("end", Keyword::End),
  ("enum", Keyword::Enum),
  ("error", Keyword::Error),
  ("false", Keyword::False),
  ("for", Keyword::For),
  ("fun", Keyword::Fun),
  ("global", Keyword::Global),
  ("if", Keyword::If),
  ("impl", Keyword::Impl),
  ("import", Keyword::Import),
  ("in", Keyword::In),
  ("include", Keyword::Include),
  ("is", Keyword::Is),
  ("lib", Keyword::Lib),
  ("macro", Keyword::Macro),
  ("match", Keyword::Match),
  ("module", Keyword::Module),
  ("mut", Keyword::Mut),
  ("next", Keyword::Next),
  ("nil", Keyword::Nil),
  ("not", Keyword::Not),
  ("object", Keyword::Object),
  ("or", Keyword::Or),
  ("package", Keyword::Package),
  ("pub", Keyword::Pub),
  ("raise", Keyword::Raise),
  ("req", Keyword::Req),
  ("return", Keyword::Return),
  ("self", Keyword::Self_),
  ("test", Keyword::Test),
  ("trait", Keyword::Trait),
  ("true", Keyword::True),
  ("try", Keyword::Try),
  ("type", Keyword::Type),
  ("undef", Keyword::Undef),
  ("unsafe", Keyword::Unsafe),
  ("val", Keyword::Val),
  ("variant", Keyword::Variant),
  ("when", Keyword::When),
  ("while", Keyword::While),
  ("xor", Keyword::Xor),
];

/// `@`-prefixed keywords, a closed set distinct from the ordinary keyword
/// table (spec §4.1).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AtKeyword {
  Builtin, Cc, Cpp, Hide, Hideout, Len, Sys,
}

pub const AT_KEYWORDS: &[(&str, AtKeyword)] = &[
  ("builtin", AtKeyword::Builtin),
  ("cc", AtKeyword::Cc),
  ("cpp", AtKeyword::Cpp),
  ("hide", AtKeyword::Hide),
  ("hideout", AtKeyword::Hideout),
  ("len", AtKeyword::Len),
  ("sys", AtKeyword::Sys),
];

/// Look up an ordinary keyword by exact spelling.
#[must_use]
pub fn lookup_keyword(s: &str) -> Option<Keyword> {
  KEYWORDS.binary_search_by_key(&s, |&(name, _)| name).ok().map(|i| KEYWORDS[i].1)
}

/// Look up an `@`-prefixed keyword (the text after the `@`).
#[must_use]
pub fn lookup_at_keyword(s: &str) -> Option<AtKeyword> {
  AT_KEYWORDS.binary_search_by_key(&s, |&(name, _)| name).ok().map(|i| AT_KEYWORDS[i].1)
}

/// The distinct flavors an identifier token can take (spec §4.1).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IdentifierKind {
  /// `foo`
  Normal,
  /// `$foo`
  Dollar,
  /// `{|foo|}`
  Macro,
  /// `@"foo"`
  String,
  /// `` `foo` ``
  Operator,
}

/// The flavor of a scanned numeric literal, before any suffix is applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntBase { Base2, Base8, Base10, Base16 }

/// The flavor of a scanned comment.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CommentKind { Line, Block, Doc, Debug }

/// Literal payloads, tagged by the kind of literal scanned.
#[derive(Clone, Debug, PartialEq)]
pub enum LiteralValue {
  Char(char),
  Byte(u8),
  Bytes(Vec<u8>),
  CStr(Vec<u8>),
  Str(String),
  Int { base: IntBase, value: u64, suffix: Option<LiteralSuffix> },
  Float { value: f64, suffix: Option<LiteralSuffix> },
}

/// Multi-char and single-char punctuation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[allow(missing_docs)]
pub enum Punctuation {
  LParen, RParen, LBracket, RBracket, LBrace, RBrace,
  Comma, Semicolon, Colon, ColonColon, Dot, DotDot, DotDotDot, Arrow, FatArrow,
  Plus, Minus, Star, Slash, Percent, StarStar,
  Amp, Pipe, Caret, Tilde, Bang,
  AmpAmp, PipePipe,
  Eq, EqEq, BangEq, Lt, Gt, Le, Ge,
  Shl, Shr,
  PlusEq, MinusEq, StarEq, SlashEq, PercentEq, StarStarEq,
  AmpEq, PipeEq, CaretEq, ShlEq, ShrEq,
  PlusPlus, MinusMinus, PlusPlusEq, MinusMinusEq,
  At, Dollar, Backtick, Question,
}

/// A single punctuation/operator token, used for the closing-delimiter
/// match check.
impl Punctuation {
  #[must_use] pub fn matching_closer(self) -> Option<Punctuation> {
    Some(match self {
      Self::LParen => Self::RParen,
      Self::LBracket => Self::RBracket,
      Self::LBrace => Self::RBrace,
      _ => return None,
    })
  }

  #[must_use] pub fn is_opener(self) -> bool {
    matches!(self, Self::LParen | Self::LBracket | Self::LBrace)
  }

  #[must_use] pub fn is_closer(self) -> bool {
    matches!(self, Self::RParen | Self::RBracket | Self::RBrace)
  }

  #[must_use] pub fn as_char(self) -> char {
    match self {
      Self::LParen => '(', Self::RParen => ')',
      Self::LBracket => '[', Self::RBracket => ']',
      Self::LBrace => '{', Self::RBrace => '}',
      _ => '?',
    }
  }
}

/// A single token produced by the scanner.
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
  pub kind: TokenKind,
  pub location: Location,
}

/// The kind-specific payload of a [`Token`].
#[derive(Clone, Debug, PartialEq)]
pub enum TokenKind {
  Punctuation(Punctuation),
  Keyword(Keyword),
  AtKeyword(AtKeyword),
  Identifier { kind: IdentifierKind, name: Symbol },
  Literal(LiteralValue),
  Comment(CommentKind),
  /// A macro literal form `{|ident|}`.
  MacroIdentifier(Symbol),
  /// Emitted for malformed tokens after the error has been recorded — lets
  /// the parser keep the token stream balanced for delimiter recovery.
  Error,
  Eof,
}

impl Token {
  #[must_use] pub fn new(kind: TokenKind, location: Location) -> Self { Self { kind, location } }

  #[must_use] pub fn is_eof(&self) -> bool { matches!(self.kind, TokenKind::Eof) }

  #[must_use] pub fn is_comment(&self) -> bool { matches!(self.kind, TokenKind::Comment(_)) }

  #[must_use] pub fn as_punctuation(&self) -> Option<Punctuation> {
    if let TokenKind::Punctuation(p) = self.kind { Some(p) } else { None }
  }
}
