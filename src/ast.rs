//! # AST Module
//!
//! The flat instruction list produced by the parser. Control flow is by
//! index: a [`Instruction::Label`] marks the position after itself, and
//! branches, calls and returns reassign the program counter.

use std::fmt;

use crate::error::Span;

// -----------------------------------------------------------------------------
// POWER
// -----------------------------------------------------------------------------

/// Width tag of an operand. The four seasons are ordered by width;
/// `String` and `Char` only change how output is formatted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Power {
    #[default]
    Spring,
    Summer,
    Autumn,
    Winter,
    String,
    Char,
}

impl Power {
    /// Position on the ordered scale, `None` for the formatting tags.
    pub fn rank(self) -> Option<u8> {
        match self {
            Power::Spring => Some(0),
            Power::Summer => Some(1),
            Power::Autumn => Some(2),
            Power::Winter => Some(3),
            Power::String | Power::Char => None,
        }
    }

    /// Bytes read or written when this power addresses memory.
    pub fn width(self) -> usize {
        match self {
            Power::Spring | Power::Char => 1,
            Power::Summer => 2,
            Power::Autumn => 4,
            Power::Winter | Power::String => 8,
        }
    }

    /// Whether a value tagged `self` may be stored into a slot tagged `dest`.
    ///
    /// Ordered powers may only widen. A formatting-tagged value needs a
    /// destination with the same tag; an ordered value may go anywhere a
    /// formatting tag is declared.
    pub fn fits_into(self, dest: Power) -> bool {
        match (self.rank(), dest.rank()) {
            (Some(src), Some(dst)) => src <= dst,
            (None, _) => self == dest,
            (Some(_), None) => true,
        }
    }

    pub fn glyph(self) -> &'static str {
        match self {
            Power::Spring => "春",
            Power::Summer => "夏",
            Power::Autumn => "秋",
            Power::Winter => "冬",
            Power::String => "文",
            Power::Char => "字",
        }
    }
}

// -----------------------------------------------------------------------------
// REGISTERS
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Register {
    Fire,
    Water,
    Tree,
    Metal,
    Earth,
    /// Stack pointer.
    Storage,
    /// Stack base pointer.
    StorageBase,
}

impl Register {
    pub const COUNT: usize = 7;

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn glyph(self) -> &'static str {
        match self {
            Register::Fire => "火",
            Register::Water => "水",
            Register::Tree => "木",
            Register::Metal => "金",
            Register::Earth => "土",
            Register::Storage => "品",
            Register::StorageBase => "品台",
        }
    }
}

// -----------------------------------------------------------------------------
// OPERANDS
// -----------------------------------------------------------------------------

/// Memory-indirect targets and branch/call targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Address {
    Register(Register),
    Immediate(i64),
    Label(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    Register(Register),
    Immediate(i64),
    Memory(Address),
    Label(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Source {
    pub kind: SourceKind,
    pub power: Power,
}

impl Source {
    pub fn new(kind: SourceKind, power: Power) -> Self {
        Self { kind, power }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DestinationKind {
    Register(Register),
    Output,
    Memory(Address),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Destination {
    pub kind: DestinationKind,
    pub power: Power,
}

impl Destination {
    pub fn new(kind: DestinationKind, power: Power) -> Self {
        Self { kind, power }
    }
}

// -----------------------------------------------------------------------------
// INSTRUCTIONS
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Or,
    And,
    Xor,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchKind {
    Always,
    Equals,
    Greater,
    Less,
    GreaterOrEqual,
    LessOrEqual,
}

impl BranchKind {
    /// Evaluates the relation for a conditional branch.
    pub fn holds(self, a: i64, b: i64) -> bool {
        match self {
            BranchKind::Always => true,
            BranchKind::Equals => a == b,
            BranchKind::Greater => a > b,
            BranchKind::Less => a < b,
            BranchKind::GreaterOrEqual => a >= b,
            BranchKind::LessOrEqual => a <= b,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Instruction {
    /// `source 動 destination`
    Move { src: Source, dest: Destination },
    /// `register [power] op source`
    Arith {
        reg: Register,
        power: Power,
        op: ArithOp,
        src: Source,
    },
    /// `札 name`
    Label { name: String },
    /// `別 address 常` or `別 address a rel b`. `operands` is `None` exactly
    /// when `kind` is `Always`.
    Branch {
        target: Address,
        kind: BranchKind,
        operands: Option<(Source, Source)>,
    },
    Push { src: Source },
    Pop { dest: Destination },
    Call { target: Address },
    Return,
    /// `「text」 動 日`
    PrintLiteral { text: String },
}

// -----------------------------------------------------------------------------
// PROGRAM
// -----------------------------------------------------------------------------

/// A parsed program: the instruction list plus the source span of each
/// instruction's first token. Immutable once built.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Program {
    pub instructions: Vec<Instruction>,
    pub spans: Vec<Span>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push(&mut self, instruction: Instruction, span: Span) {
        self.instructions.push(instruction);
        self.spans.push(span);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn span_of(&self, index: usize) -> Option<Span> {
        self.spans.get(index).copied()
    }
}

// -----------------------------------------------------------------------------
// LISTING
// -----------------------------------------------------------------------------

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Address::Register(reg) => f.write_str(reg.glyph()),
            Address::Immediate(n) => write!(f, "{}", n),
            Address::Label(name) => write!(f, "札{}", name),
        }
    }
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            SourceKind::Register(reg) => f.write_str(reg.glyph())?,
            SourceKind::Immediate(n) => write!(f, "{}", n)?,
            SourceKind::Memory(addr) => write!(f, "星{}", addr)?,
            SourceKind::Label(name) => write!(f, "札{}", name)?,
        }
        f.write_str(self.power.glyph())
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            DestinationKind::Register(reg) => write!(f, "{}{}", reg.glyph(), self.power.glyph()),
            DestinationKind::Output => f.write_str("日"),
            DestinationKind::Memory(addr) => write!(f, "星{}{}", addr, self.power.glyph()),
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Move { src, dest } => write!(f, "MOVE   {} -> {}", src, dest),
            Instruction::Arith { reg, power, op, src } => write!(
                f,
                "{:<6} {}{} {}",
                format!("{:?}", op).to_uppercase(),
                reg.glyph(),
                power.glyph(),
                src
            ),
            Instruction::Label { name } => write!(f, "LABEL  {}", name),
            Instruction::Branch {
                target,
                kind,
                operands,
            } => match operands {
                Some((a, b)) => write!(f, "BRANCH {} if {} {:?} {}", target, a, kind, b),
                None => write!(f, "BRANCH {} always", target),
            },
            Instruction::Push { src } => write!(f, "PUSH   {}", src),
            Instruction::Pop { dest } => write!(f, "POP    {}", dest),
            Instruction::Call { target } => write!(f, "CALL   {}", target),
            Instruction::Return => f.write_str("RETURN"),
            Instruction::PrintLiteral { text } => write!(f, "PRINT  「{}」", text),
        }
    }
}
