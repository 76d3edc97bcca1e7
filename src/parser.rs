//! # Parser Module
//!
//! Backtracking statement parser. At each statement start the parser tries
//! a fixed, ordered list of rules. A rule either passes (its leading tokens
//! did not match, the cursor is rewound and the next rule is tried), accepts
//! (one instruction is produced) or fails hard once its leading token has
//! matched but a required part is missing. There is no error recovery.

use crate::ast::*;
use crate::error::{KyouError, KyouResult, Span};
use crate::token::{Token, TokenKind};

/// Outcome of one statement rule that did not fail.
#[derive(Debug)]
enum Rule {
    Accept(Instruction),
    Pass,
}

type RuleFn = fn(&mut Parser) -> KyouResult<Rule>;

/// Statement rules in priority order.
const RULES: [RuleFn; 9] = [
    Parser::arith_rule,
    Parser::move_rule,
    Parser::label_rule,
    Parser::branch_rule,
    Parser::push_rule,
    Parser::pop_rule,
    Parser::call_rule,
    Parser::return_rule,
    Parser::print_literal_rule,
];

pub struct Parser {
    tokens: Vec<Token>,
    /// Start of the statement currently being attempted.
    committed: usize,
    /// Speculative position inside the current attempt.
    current: usize,
}

impl Parser {
    pub fn new(mut tokens: Vec<Token>) -> Self {
        if !matches!(tokens.last(), Some(t) if t.kind == TokenKind::Eof) {
            let span = tokens.last().map(|t| t.span).unwrap_or(Span::new(1, 1, 0));
            tokens.push(Token::new(TokenKind::Eof, span));
        }
        Self {
            tokens,
            committed: 0,
            current: 0,
        }
    }

    /// Parses the whole token stream into a flat program.
    ///
    /// # Errors
    /// The first syntax error aborts the parse.
    pub fn parse(&mut self) -> KyouResult<Program> {
        let mut program = Program::new();

        while self.tokens[self.committed].kind != TokenKind::Eof {
            let span = self.tokens[self.committed].span;
            let instruction = self.statement()?;
            program.push(instruction, span);
        }

        Ok(program)
    }

    fn statement(&mut self) -> KyouResult<Instruction> {
        for rule in RULES {
            self.current = self.committed;
            match rule(self)? {
                Rule::Accept(instruction) => {
                    self.committed = self.current;
                    return Ok(instruction);
                }
                Rule::Pass => {}
            }
        }

        self.current = self.committed;
        let token = self.peek();
        Err(KyouError::parser(
            format!("syntax error: no statement starts with {}", token.kind.describe()),
            token.span,
        ))
    }

    // -------------------------------------------------------------------------
    // STATEMENT RULES
    // -------------------------------------------------------------------------

    /// `register [power] op source`
    fn arith_rule(&mut self) -> KyouResult<Rule> {
        let Some(reg) = self.register() else {
            return Ok(Rule::Pass);
        };
        let power = self.power().unwrap_or_default();

        let op = match self.peek_kind() {
            TokenKind::Add => ArithOp::Add,
            TokenKind::Sub => ArithOp::Sub,
            TokenKind::Mul => ArithOp::Mul,
            TokenKind::Div => ArithOp::Div,
            TokenKind::Mod => ArithOp::Mod,
            TokenKind::Or => ArithOp::Or,
            TokenKind::And => ArithOp::And,
            TokenKind::Xor => ArithOp::Xor,
            _ => return Ok(Rule::Pass),
        };
        self.advance();

        let src = self.expect_source("expected a source operand after the operator")?;
        Ok(Rule::Accept(Instruction::Arith {
            reg,
            power,
            op,
            src,
        }))
    }

    /// `source 動 destination`
    fn move_rule(&mut self) -> KyouResult<Rule> {
        let Some(src) = self.source() else {
            return Ok(Rule::Pass);
        };
        if !self.match_kind(&TokenKind::Move) {
            return Ok(Rule::Pass);
        }

        let dest = self.expect_destination("expected a destination after '動'")?;
        Ok(Rule::Accept(Instruction::Move { src, dest }))
    }

    /// `札 identifier`
    fn label_rule(&mut self) -> KyouResult<Rule> {
        if !self.match_kind(&TokenKind::Label) {
            return Ok(Rule::Pass);
        }
        let name = self.expect_ident("expected a label name after '札'")?;
        Ok(Rule::Accept(Instruction::Label { name }))
    }

    /// `別 address 常` or `別 address source relation source`
    fn branch_rule(&mut self) -> KyouResult<Rule> {
        if !self.match_kind(&TokenKind::Branch) {
            return Ok(Rule::Pass);
        }
        let target = self.expect_address("expected a branch target after '別'")?;

        if self.match_kind(&TokenKind::Always) {
            return Ok(Rule::Accept(Instruction::Branch {
                target,
                kind: BranchKind::Always,
                operands: None,
            }));
        }

        let a = self.expect_source("expected '常' or a comparison operand")?;
        let kind = match self.relation() {
            Some(kind) => kind,
            None => {
                return Err(KyouError::parser(
                    format!(
                        "expected a relation ('等', '大' or '小'), found {}",
                        self.peek_kind().describe()
                    ),
                    self.peek().span,
                ))
            }
        };
        let b = self.expect_source("expected a comparison operand after the relation")?;

        Ok(Rule::Accept(Instruction::Branch {
            target,
            kind,
            operands: Some((a, b)),
        }))
    }

    /// `押 source`
    fn push_rule(&mut self) -> KyouResult<Rule> {
        if !self.match_kind(&TokenKind::Push) {
            return Ok(Rule::Pass);
        }
        let src = self.expect_source("expected a source operand after '押'")?;
        Ok(Rule::Accept(Instruction::Push { src }))
    }

    /// `弾 destination`
    fn pop_rule(&mut self) -> KyouResult<Rule> {
        if !self.match_kind(&TokenKind::Pop) {
            return Ok(Rule::Pass);
        }
        let dest = self.expect_destination("expected a destination after '弾'")?;
        Ok(Rule::Accept(Instruction::Pop { dest }))
    }

    /// `呼 address`
    fn call_rule(&mut self) -> KyouResult<Rule> {
        if !self.match_kind(&TokenKind::Call) {
            return Ok(Rule::Pass);
        }
        let target = self.expect_address("expected a call target after '呼'")?;
        Ok(Rule::Accept(Instruction::Call { target }))
    }

    /// `帰`
    fn return_rule(&mut self) -> KyouResult<Rule> {
        if !self.match_kind(&TokenKind::Return) {
            return Ok(Rule::Pass);
        }
        Ok(Rule::Accept(Instruction::Return))
    }

    /// `「text」 動 日`
    fn print_literal_rule(&mut self) -> KyouResult<Rule> {
        let text = match self.peek_kind() {
            TokenKind::Str(text) => text.clone(),
            _ => return Ok(Rule::Pass),
        };
        self.advance();

        self.expect_kind(&TokenKind::Move, "expected '動' after string literal")?;
        self.expect_kind(&TokenKind::Sun, "a string literal can only be moved to '日'")?;
        Ok(Rule::Accept(Instruction::PrintLiteral { text }))
    }

    // -------------------------------------------------------------------------
    // OPERAND SUB-PARSERS
    //
    // Each returns `None` with the cursor untouched when it does not match.
    // -------------------------------------------------------------------------

    fn register(&mut self) -> Option<Register> {
        let reg = match self.peek_kind() {
            TokenKind::Fire => Register::Fire,
            TokenKind::Water => Register::Water,
            TokenKind::Tree => Register::Tree,
            TokenKind::Metal => Register::Metal,
            TokenKind::Earth => Register::Earth,
            TokenKind::Storage => Register::Storage,
            TokenKind::StorageBase => Register::StorageBase,
            _ => return None,
        };
        self.advance();
        Some(reg)
    }

    fn immediate(&mut self) -> Option<i64> {
        match *self.peek_kind() {
            TokenKind::Number(n) => {
                self.advance();
                Some(n)
            }
            _ => None,
        }
    }

    /// `札 identifier` used as a reference.
    fn label_ref(&mut self) -> Option<String> {
        let save = self.current;
        if !self.match_kind(&TokenKind::Label) {
            return None;
        }
        match self.peek_kind() {
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.advance();
                Some(name)
            }
            _ => {
                self.current = save;
                None
            }
        }
    }

    fn address(&mut self) -> Option<Address> {
        if let Some(reg) = self.register() {
            Some(Address::Register(reg))
        } else if let Some(name) = self.label_ref() {
            Some(Address::Label(name))
        } else {
            self.immediate().map(Address::Immediate)
        }
    }

    /// `星 address`
    fn memory(&mut self) -> Option<Address> {
        let save = self.current;
        if !self.match_kind(&TokenKind::Stars) {
            return None;
        }
        let addr = self.address();
        if addr.is_none() {
            self.current = save;
        }
        addr
    }

    fn power(&mut self) -> Option<Power> {
        let power = match self.peek_kind() {
            TokenKind::Spring => Power::Spring,
            TokenKind::Summer => Power::Summer,
            TokenKind::Autumn => Power::Autumn,
            TokenKind::Winter => Power::Winter,
            TokenKind::StringType => Power::String,
            TokenKind::Char => Power::Char,
            _ => return None,
        };
        self.advance();
        Some(power)
    }

    fn source(&mut self) -> Option<Source> {
        let kind = if let Some(reg) = self.register() {
            SourceKind::Register(reg)
        } else if let Some(n) = self.immediate() {
            SourceKind::Immediate(n)
        } else if let Some(addr) = self.memory() {
            SourceKind::Memory(addr)
        } else if let Some(name) = self.label_ref() {
            SourceKind::Label(name)
        } else {
            return None;
        };
        let power = self.power().unwrap_or_default();
        Some(Source::new(kind, power))
    }

    /// Parses a destination. `日` may not carry a power; that is a hard
    /// error rather than a non-match.
    fn destination(&mut self) -> KyouResult<Option<Destination>> {
        let kind = if let Some(reg) = self.register() {
            DestinationKind::Register(reg)
        } else if self.match_kind(&TokenKind::Sun) {
            DestinationKind::Output
        } else if let Some(addr) = self.memory() {
            DestinationKind::Memory(addr)
        } else {
            return Ok(None);
        };

        let power_span = self.peek().span;
        let power = self.power();
        if kind == DestinationKind::Output {
            if let Some(power) = power {
                return Err(KyouError::parser(
                    format!("'日' cannot carry a power, found '{}'", power.glyph()),
                    power_span,
                ));
            }
        }

        Ok(Some(Destination::new(kind, power.unwrap_or_default())))
    }

    fn relation(&mut self) -> Option<BranchKind> {
        let kind = match self.peek_kind() {
            TokenKind::Equals => BranchKind::Equals,
            TokenKind::Greater => BranchKind::Greater,
            TokenKind::Less => BranchKind::Less,
            _ => return None,
        };
        self.advance();

        if kind != BranchKind::Equals && self.match_kind(&TokenKind::Equals) {
            return Some(match kind {
                BranchKind::Greater => BranchKind::GreaterOrEqual,
                _ => BranchKind::LessOrEqual,
            });
        }
        Some(kind)
    }

    // -------------------------------------------------------------------------
    // REQUIRED-PART HELPERS
    // -------------------------------------------------------------------------

    fn expect_source(&mut self, msg: &str) -> KyouResult<Source> {
        match self.source() {
            Some(src) => Ok(src),
            None => Err(self.error_here(msg)),
        }
    }

    fn expect_destination(&mut self, msg: &str) -> KyouResult<Destination> {
        match self.destination()? {
            Some(dest) => Ok(dest),
            None => Err(self.error_here(msg)),
        }
    }

    fn expect_address(&mut self, msg: &str) -> KyouResult<Address> {
        match self.address() {
            Some(addr) => Ok(addr),
            None => Err(self.error_here(msg)),
        }
    }

    fn expect_ident(&mut self, msg: &str) -> KyouResult<String> {
        match self.peek_kind() {
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.advance();
                Ok(name)
            }
            _ => Err(self.error_here(msg)),
        }
    }

    fn expect_kind(&mut self, kind: &TokenKind, msg: &str) -> KyouResult<()> {
        if self.match_kind(kind) {
            Ok(())
        } else {
            Err(self.error_here(msg))
        }
    }

    fn error_here(&self, msg: &str) -> KyouError {
        let token = self.peek();
        KyouError::parser(
            format!("{}, found {}", msg, token.kind.describe()),
            token.span,
        )
    }

    // -------------------------------------------------------------------------
    // TOKEN HELPERS
    // -------------------------------------------------------------------------

    #[inline]
    fn peek(&self) -> &Token {
        &self.tokens[self.current]
    }

    #[inline]
    fn peek_kind(&self) -> &TokenKind {
        &self.tokens[self.current].kind
    }

    /// Moves past the current token. Never moves past `Eof`.
    #[inline]
    fn advance(&mut self) {
        if self.tokens[self.current].kind != TokenKind::Eof {
            self.current += 1;
        }
    }

    fn match_kind(&mut self, kind: &TokenKind) -> bool {
        if self.peek_kind() == kind {
            self.advance();
            true
        } else {
            false
        }
    }
}

/// Parses a token stream in one call.
pub fn parse(tokens: Vec<Token>) -> KyouResult<Program> {
    Parser::new(tokens).parse()
}
