//! # Token Module
//!
//! Terminal categories of the Kyou language and the glyph catalog the lexer
//! matches against. Every token carries a [`Span`].

use crate::error::Span;

// -----------------------------------------------------------------------------
// TOKEN KIND
// -----------------------------------------------------------------------------

/// Every terminal category of Kyou.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    // -- Three lights --
    /// `日` output stream.
    Sun,
    /// `月` input stream.
    Moon,
    /// `星` memory indirection.
    Stars,

    // -- Stack registers --
    /// `品` stack pointer.
    Storage,
    /// `品台` stack base pointer.
    StorageBase,

    // -- Five elements (general registers) --
    /// `火`
    Fire,
    /// `水`
    Water,
    /// `木`
    Tree,
    /// `金`
    Metal,
    /// `土`
    Earth,

    // -- Powers --
    /// `春`
    Spring,
    /// `夏`
    Summer,
    /// `秋`
    Autumn,
    /// `冬`
    Winter,
    /// `文`
    StringType,
    /// `字`
    Char,

    // -- Instructions --
    /// `動`
    Move,
    /// `押`
    Push,
    /// `弾`
    Pop,
    /// `呼`
    Call,
    /// `帰`
    Return,

    // -- Operators --
    /// `足`
    Add,
    /// `引`
    Sub,
    /// `掛`
    Mul,
    /// `割`
    Div,
    /// `余`
    Mod,
    /// `或`
    Or,
    /// `共`
    And,
    /// `排`
    Xor,

    // -- Literals --
    /// ASCII alphanumeric run.
    Ident(String),
    /// Positional numeral.
    Number(i64),
    /// `「...」`
    Str(String),

    // -- Control flow --
    /// `札`
    Label,
    /// `別`
    Branch,
    /// `常`
    Always,
    /// `等`
    Equals,
    /// `大`
    Greater,
    /// `小`
    Less,

    /// End of input. Always the last token.
    Eof,
}

impl TokenKind {
    /// Short human-readable description used in diagnostics.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Ident(name) => format!("identifier '{}'", name),
            TokenKind::Number(n) => format!("number {}", n),
            TokenKind::Str(_) => "string literal".to_string(),
            TokenKind::Eof => "end of input".to_string(),
            other => match glyph_of(other) {
                Some(glyph) => format!("'{}'", glyph),
                None => format!("{:?}", other),
            },
        }
    }
}

// -----------------------------------------------------------------------------
// TOKEN
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}

impl Token {
    #[inline]
    pub fn new(kind: TokenKind, span: Span) -> Self {
        Self { kind, span }
    }
}

// -----------------------------------------------------------------------------
// GLYPH CATALOG
// -----------------------------------------------------------------------------

/// Fixed glyphs in match priority order. `品台` must precede `品` or the
/// base pointer would lex as the stack pointer followed by a stray `台`.
pub const GLYPHS: &[(&str, TokenKind)] = &[
    ("日", TokenKind::Sun),
    ("月", TokenKind::Moon),
    ("星", TokenKind::Stars),
    ("品台", TokenKind::StorageBase),
    ("品", TokenKind::Storage),
    ("火", TokenKind::Fire),
    ("水", TokenKind::Water),
    ("木", TokenKind::Tree),
    ("金", TokenKind::Metal),
    ("土", TokenKind::Earth),
    ("春", TokenKind::Spring),
    ("夏", TokenKind::Summer),
    ("秋", TokenKind::Autumn),
    ("冬", TokenKind::Winter),
    ("文", TokenKind::StringType),
    ("字", TokenKind::Char),
    ("動", TokenKind::Move),
    ("押", TokenKind::Push),
    ("弾", TokenKind::Pop),
    ("呼", TokenKind::Call),
    ("帰", TokenKind::Return),
    ("足", TokenKind::Add),
    ("引", TokenKind::Sub),
    ("掛", TokenKind::Mul),
    ("割", TokenKind::Div),
    ("余", TokenKind::Mod),
    ("或", TokenKind::Or),
    ("共", TokenKind::And),
    ("排", TokenKind::Xor),
    ("札", TokenKind::Label),
    ("別", TokenKind::Branch),
    ("常", TokenKind::Always),
    ("等", TokenKind::Equals),
    ("大", TokenKind::Greater),
    ("小", TokenKind::Less),
];

pub const OPEN_QUOTE: char = '「';
pub const CLOSE_QUOTE: char = '」';
pub const COMMENT: char = '#';
pub const BYTE_ORDER_MARK: char = '\u{feff}';

/// Returns the glyph spelling of a fixed token kind.
pub fn glyph_of(kind: &TokenKind) -> Option<&'static str> {
    GLYPHS
        .iter()
        .find(|(_, k)| k == kind)
        .map(|(glyph, _)| *glyph)
}

// -----------------------------------------------------------------------------
// NUMERALS
// -----------------------------------------------------------------------------

/// Place level of a numeral glyph: digits are level 1, multipliers 2..=5.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Numeral {
    Digit(i64),
    Multiplier { level: u8, value: i64 },
}

impl Numeral {
    #[inline]
    pub fn level(self) -> u8 {
        match self {
            Numeral::Digit(_) => 1,
            Numeral::Multiplier { level, .. } => level,
        }
    }
}

/// Maps a numeral glyph to its digit value or place multiplier.
pub fn lookup_numeral(c: char) -> Option<Numeral> {
    let numeral = match c {
        '霊' => Numeral::Digit(0),
        '一' => Numeral::Digit(1),
        '二' => Numeral::Digit(2),
        '三' => Numeral::Digit(3),
        '四' => Numeral::Digit(4),
        '五' => Numeral::Digit(5),
        '六' => Numeral::Digit(6),
        '七' => Numeral::Digit(7),
        '八' => Numeral::Digit(8),
        '九' => Numeral::Digit(9),
        '十' => Numeral::Multiplier { level: 2, value: 10 },
        '百' => Numeral::Multiplier { level: 3, value: 100 },
        '千' => Numeral::Multiplier { level: 4, value: 1_000 },
        '万' => Numeral::Multiplier { level: 5, value: 10_000 },
        _ => return None,
    };
    Some(numeral)
}
