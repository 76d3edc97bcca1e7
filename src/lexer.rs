//! # Lexer Module
//!
//! Turns Kyou glyph text into a token stream. Fixed glyphs are matched
//! against the catalog in [`GLYPHS`] order; identifiers, string literals and
//! positional numerals each get their own scanner.

use crate::error::{KyouError, KyouResult, Span};
use crate::token::{
    lookup_numeral, Numeral, Token, TokenKind, BYTE_ORDER_MARK, CLOSE_QUOTE, COMMENT, GLYPHS,
    OPEN_QUOTE,
};

pub struct Lexer<'src> {
    source: &'src str,
    pos: usize,
    line: u32,
    col: u32,
}

impl<'src> Lexer<'src> {
    pub fn new(source: &'src str) -> Self {
        let pos = if source.starts_with(BYTE_ORDER_MARK) {
            BYTE_ORDER_MARK.len_utf8()
        } else {
            0
        };
        Self {
            source,
            pos,
            line: 1,
            col: 1,
        }
    }

    /// Scans the whole source. The returned stream always ends with `Eof`.
    pub fn tokenize(&mut self) -> KyouResult<Vec<Token>> {
        let mut tokens = Vec::with_capacity(self.source.len() / 3);

        loop {
            self.skip_whitespace_and_comments();

            if self.is_at_end() {
                tokens.push(Token::new(TokenKind::Eof, Span::new(self.line, self.col, 0)));
                break;
            }

            tokens.push(self.scan_token()?);
        }

        Ok(tokens)
    }

    fn scan_token(&mut self) -> KyouResult<Token> {
        let start_line = self.line;
        let start_col = self.col;
        let c = self.peek();

        if c == OPEN_QUOTE {
            return self.scan_string(start_line, start_col);
        }

        if lookup_numeral(c).is_some() {
            let value = self.scan_number(start_line, start_col)?;
            return Ok(Token::new(
                TokenKind::Number(value),
                Span::new(start_line, start_col, self.col - start_col),
            ));
        }

        if c.is_ascii_alphanumeric() {
            return Ok(self.scan_identifier(start_line, start_col));
        }

        let rest = &self.source[self.pos..];
        for (glyph, kind) in GLYPHS {
            if rest.starts_with(glyph) {
                for _ in glyph.chars() {
                    self.advance();
                }
                return Ok(Token::new(
                    kind.clone(),
                    Span::new(start_line, start_col, self.col - start_col),
                ));
            }
        }

        Err(KyouError::lexer(
            format!("unknown glyph '{}'", c),
            Span::new(start_line, start_col, 1),
        ))
    }

    /// Scans `「...」`. Everything up to the closing quote is taken verbatim.
    fn scan_string(&mut self, start_line: u32, start_col: u32) -> KyouResult<Token> {
        self.advance(); // consume '「'
        let body_start = self.pos;

        loop {
            if self.is_at_end() {
                return Err(KyouError::lexer(
                    "unterminated string literal",
                    Span::new(start_line, start_col, 1),
                ));
            }

            let c = self.advance();
            if c == CLOSE_QUOTE {
                break;
            }
            if c == '\n' {
                self.line += 1;
                self.col = 1;
            }
        }

        let body_end = self.pos - CLOSE_QUOTE.len_utf8();
        let text = self.source[body_start..body_end].to_string();
        let len = if self.line == start_line {
            self.col - start_col
        } else {
            1
        };
        Ok(Token::new(TokenKind::Str(text), Span::new(start_line, start_col, len)))
    }

    /// Scans a positional numeral such as `三百四十五` (345).
    ///
    /// Digits accumulate into the pending group, multipliers scale it (a
    /// bare multiplier counts as one of itself). Stepping down to a lower
    /// level flushes the group into the result. Two glyphs of the same
    /// level in a row, or a multiplier that is not lower than every earlier
    /// multiplier, make the numeral malformed.
    fn scan_number(&mut self, start_line: u32, start_col: u32) -> KyouResult<i64> {
        let mut result: i64 = 0;
        let mut group: i64 = 0;
        let mut last_level: u8 = 0;
        let mut lowest_multiplier: u8 = u8::MAX;

        while let Some(numeral) = self.peek_numeral() {
            let level = numeral.level();
            let malformed = level == last_level
                || matches!(numeral, Numeral::Multiplier { .. } if level >= lowest_multiplier);
            if malformed {
                return Err(KyouError::lexer(
                    "malformed number",
                    Span::new(start_line, start_col, self.col - start_col + 1),
                ));
            }

            if level < last_level {
                result += group;
                group = 0;
            }

            match numeral {
                Numeral::Digit(d) => group += d,
                Numeral::Multiplier { level, value } => {
                    group = value * if group != 0 { group } else { 1 };
                    lowest_multiplier = level;
                }
            }

            last_level = level;
            self.advance();
        }

        Ok(result + group)
    }

    fn scan_identifier(&mut self, start_line: u32, start_col: u32) -> Token {
        let start = self.pos;
        while !self.is_at_end() && self.peek().is_ascii_alphanumeric() {
            self.advance();
        }
        let name = self.source[start..self.pos].to_string();
        Token::new(
            TokenKind::Ident(name),
            Span::new(start_line, start_col, self.col - start_col),
        )
    }

    fn skip_whitespace_and_comments(&mut self) {
        while !self.is_at_end() {
            let c = self.peek();
            if c == '\n' {
                self.advance();
                self.line += 1;
                self.col = 1;
            } else if c.is_whitespace() {
                self.advance();
            } else if c == COMMENT {
                let remaining = &self.source.as_bytes()[self.pos..];
                match memchr::memchr(b'\n', remaining) {
                    Some(offset) => self.pos += offset,
                    None => self.pos = self.source.len(),
                }
            } else {
                break;
            }
        }
    }

    #[inline]
    fn peek_numeral(&self) -> Option<Numeral> {
        if self.is_at_end() {
            None
        } else {
            lookup_numeral(self.peek())
        }
    }

    #[inline]
    fn peek(&self) -> char {
        self.source[self.pos..].chars().next().unwrap_or('\0')
    }

    #[inline]
    fn advance(&mut self) -> char {
        let c = self.peek();
        self.pos += c.len_utf8();
        self.col += 1;
        c
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        self.pos >= self.source.len()
    }
}

/// Tokenizes `source` in one call.
pub fn tokenize(source: &str) -> KyouResult<Vec<Token>> {
    Lexer::new(source).tokenize()
}
