//! # Kyou: an ideogram instruction language
//!
//! Kyou programs are flat sequences of register, stack and branch
//! instructions spelled with a fixed set of kanji:
//!
//! ```text
//! 札 loop
//! 火 足 一
//! 火 動 日
//! 別 札 loop 火 小 十
//! ```
//!
//! ## Architecture
//! Source → Lexer → Parser → Program (flat instruction list) → Machine
//!
//! - [`lexer`] matches glyphs, identifiers, `「strings」` and positional
//!   numerals (`三百四十五` is 345).
//! - [`parser`] tries an ordered list of backtracking statement rules.
//! - [`vm`] resolves labels in one pre-pass, then executes against seven
//!   registers and a byte-addressed memory holding the stack.

pub mod ast;
pub mod error;
pub mod lexer;
pub mod log;
pub mod parser;
pub mod symbols;
pub mod token;
pub mod vm;

#[cfg(test)]
mod tests;

use std::io::Write;

use crate::ast::Program;
use crate::error::KyouResult;
use crate::vm::{Machine, MachineConfig};

/// Lexes and parses `source` into a program.
pub fn compile(source: &str) -> KyouResult<Program> {
    let tokens = lexer::tokenize(source)?;
    parser::parse(tokens)
}

/// Compiles `source` and runs it on a fresh machine writing to `out`.
pub fn run_source<W: Write>(source: &str, config: MachineConfig, out: W) -> KyouResult<W> {
    let program = compile(source)?;
    let mut machine = Machine::new(config, out);
    machine.run(&program)?;
    Ok(machine.into_output())
}
