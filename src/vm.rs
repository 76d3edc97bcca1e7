//! # Machine Module
//!
//! Register machine that executes a parsed [`Program`]. State is seven
//! 64-bit registers, a program counter and a byte-addressed virtual memory
//! that also holds the stack. Labels are resolved once, before the first
//! instruction runs.

use std::io::Write;

use rustc_hash::FxHashMap;

use crate::ast::*;
use crate::error::{ErrorKind, KyouError, KyouResult};
use crate::symbols::SymbolTable;

/// Bytes per stack slot. Pushes, pops, calls and returns move the stack
/// pointer by this much.
pub const SLOT_WIDTH: i64 = 8;

// -----------------------------------------------------------------------------
// CONFIG
// -----------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MachineConfig {
    /// Size of the virtual address space in bytes.
    pub memory_size: usize,
    /// Initial value of both stack registers. The stack grows upward and
    /// pops stop at whatever `品台` holds.
    pub stack_base: usize,
    /// Stop with [`ErrorKind::StepLimit`] after this many instructions.
    /// `None` runs until the program counter leaves the program.
    pub max_steps: Option<u64>,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            memory_size: 1 << 20,
            stack_base: 1 << 16,
            max_steps: None,
        }
    }
}

// -----------------------------------------------------------------------------
// LABEL PRE-PASS
// -----------------------------------------------------------------------------

/// Maps every label to the index of the instruction that follows it.
///
/// # Errors
/// [`ErrorKind::DuplicateLabel`] if a name is declared twice.
pub fn resolve_labels(program: &Program) -> KyouResult<SymbolTable<String, usize>> {
    let mut labels = SymbolTable::new();

    for (index, instruction) in program.instructions.iter().enumerate() {
        if let Instruction::Label { name } = instruction {
            if labels.contains_key(name.as_str()) {
                return Err(KyouError::no_span(
                    ErrorKind::DuplicateLabel,
                    format!("label '{}' declared twice", name),
                )
                .at(program.span_of(index)));
            }
            labels.insert(name.clone(), index + 1);
        }
    }

    Ok(labels)
}

// -----------------------------------------------------------------------------
// MACHINE
// -----------------------------------------------------------------------------

pub struct Machine<W: Write> {
    registers: [i64; Register::COUNT],
    pc: usize,
    memory: Vec<u8>,
    /// Power each occupied stack slot was pushed with, keyed by slot address.
    slot_powers: FxHashMap<i64, Power>,
    labels: SymbolTable<String, usize>,
    steps: u64,
    config: MachineConfig,
    out: W,
}

impl<W: Write> Machine<W> {
    pub fn new(config: MachineConfig, out: W) -> Self {
        let mut machine = Self {
            registers: [0; Register::COUNT],
            pc: 0,
            memory: Vec::new(),
            slot_powers: FxHashMap::default(),
            labels: SymbolTable::new(),
            steps: 0,
            config,
            out,
        };
        machine.reset();
        machine
    }

    /// Clears registers, memory and counters back to their initial state.
    pub fn reset(&mut self) {
        self.registers = [0; Register::COUNT];
        let base = self.config.stack_base as i64;
        self.registers[Register::Storage.index()] = base;
        self.registers[Register::StorageBase.index()] = base;
        self.pc = 0;
        self.memory.clear();
        self.slot_powers.clear();
        self.labels = SymbolTable::new();
        self.steps = 0;
    }

    #[inline]
    pub fn register(&self, reg: Register) -> i64 {
        self.registers[reg.index()]
    }

    #[inline]
    pub fn set_register(&mut self, reg: Register, value: i64) {
        self.registers[reg.index()] = value;
    }

    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn config(&self) -> &MachineConfig {
        &self.config
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Runs `program` from its first instruction. Registers and memory keep
    /// whatever state earlier runs left behind.
    ///
    /// # Errors
    /// The first failing instruction aborts the run; output already written
    /// stays written.
    pub fn run(&mut self, program: &Program) -> KyouResult<()> {
        self.labels = resolve_labels(program)?;
        crate::info!(
            "resolved {} label(s) in {} instruction(s)",
            self.labels.len(),
            program.len()
        );

        self.pc = 0;
        while self.pc < program.len() {
            if let Some(limit) = self.config.max_steps {
                if self.steps >= limit {
                    return Err(KyouError::no_span(
                        ErrorKind::StepLimit,
                        format!("step limit of {} reached", limit),
                    )
                    .at(program.span_of(self.pc)));
                }
            }

            let index = self.pc;
            let instruction = &program.instructions[index];
            crate::trace!("{:>5}  {}", index, instruction);

            self.pc += 1;
            self.steps += 1;
            self.step(index, instruction)
                .map_err(|e| e.at(program.span_of(index)))?;
        }

        self.out.flush().map_err(io_error)?;
        Ok(())
    }

    fn step(&mut self, index: usize, instruction: &Instruction) -> KyouResult<()> {
        match instruction {
            Instruction::Move { src, dest } => {
                let value = self.eval_source(src)?;
                self.store(dest, value, src.power)
            }
            Instruction::Arith { reg, power, op, src } => {
                check_power(src.power, *power)?;
                let value = self.eval_source(src)?;
                let current = self.register(*reg);
                let result = apply_op(*op, current, value)?;
                self.set_register(*reg, result);
                Ok(())
            }
            Instruction::Label { .. } => Ok(()),
            Instruction::Branch {
                target,
                kind,
                operands,
            } => {
                let target = self.eval_address(target)?;
                let taken = match operands {
                    None => true,
                    Some((a, b)) => {
                        let a = self.eval_source(a)?;
                        let b = self.eval_source(b)?;
                        kind.holds(a, b)
                    }
                };
                if taken {
                    self.jump(target)?;
                }
                Ok(())
            }
            Instruction::Push { src } => {
                let value = self.eval_source(src)?;
                self.push(value, Some(src.power))
            }
            Instruction::Pop { dest } => {
                let (value, power) = self.pop()?;
                self.store(dest, value, power)
            }
            Instruction::Call { target } => {
                let target = self.eval_address(target)?;
                self.push(index as i64, None)?;
                self.jump(target)
            }
            Instruction::Return => {
                let (address, _) = self.pop()?;
                let resume = address.checked_add(1).ok_or_else(|| {
                    KyouError::no_span(
                        ErrorKind::InvalidAddress,
                        format!("cannot return past address {}", address),
                    )
                })?;
                self.jump(resume)
            }
            Instruction::PrintLiteral { text } => {
                writeln!(self.out, "{}", text).map_err(io_error)
            }
        }
    }

    // -------------------------------------------------------------------------
    // OPERANDS
    // -------------------------------------------------------------------------

    fn eval_source(&self, src: &Source) -> KyouResult<i64> {
        match &src.kind {
            SourceKind::Register(reg) => Ok(self.register(*reg)),
            SourceKind::Immediate(n) => Ok(*n),
            SourceKind::Label(name) => self.label_address(name),
            // A text operand is the address of its first byte.
            SourceKind::Memory(addr) if src.power == Power::String => self.eval_address(addr),
            SourceKind::Memory(addr) => {
                let address = self.eval_address(addr)?;
                self.read(address, src.power)
            }
        }
    }

    fn eval_address(&self, addr: &Address) -> KyouResult<i64> {
        match addr {
            Address::Register(reg) => Ok(self.register(*reg)),
            Address::Immediate(n) => Ok(*n),
            Address::Label(name) => self.label_address(name),
        }
    }

    fn label_address(&self, name: &str) -> KyouResult<i64> {
        match self.labels.get(name) {
            Some(&index) => Ok(index as i64),
            None => Err(KyouError::no_span(
                ErrorKind::UnresolvedLabel,
                format!("no such label '{}'", name),
            )),
        }
    }

    /// Writes `value`, produced by an operand tagged `power`, to `dest`.
    fn store(&mut self, dest: &Destination, value: i64, power: Power) -> KyouResult<()> {
        match &dest.kind {
            DestinationKind::Output => self.emit(value, power),
            DestinationKind::Register(reg) => {
                check_power(power, dest.power)?;
                self.set_register(*reg, value);
                Ok(())
            }
            DestinationKind::Memory(addr) => {
                check_power(power, dest.power)?;
                let address = self.eval_address(addr)?;
                self.write(address, value, dest.power)
            }
        }
    }

    /// Formats `value` on the output stream according to its power.
    fn emit(&mut self, value: i64, power: Power) -> KyouResult<()> {
        match power {
            Power::String => {
                let bytes = self.read_text(value)?;
                self.out.write_all(&bytes).map_err(io_error)?;
                self.out.write_all(b"\n").map_err(io_error)
            }
            Power::Char => {
                let c = u32::try_from(value)
                    .ok()
                    .and_then(char::from_u32)
                    .ok_or_else(|| {
                        KyouError::no_span(
                            ErrorKind::UnsupportedOperand,
                            format!("{} is not a character code", value),
                        )
                    })?;
                writeln!(self.out, "{}", c).map_err(io_error)
            }
            _ => writeln!(self.out, "{}", value).map_err(io_error),
        }
    }

    fn jump(&mut self, target: i64) -> KyouResult<()> {
        self.pc = usize::try_from(target).map_err(|_| {
            KyouError::no_span(
                ErrorKind::InvalidAddress,
                format!("cannot jump to negative address {}", target),
            )
        })?;
        Ok(())
    }

    // -------------------------------------------------------------------------
    // STACK
    // -------------------------------------------------------------------------

    fn push(&mut self, value: i64, power: Option<Power>) -> KyouResult<()> {
        let sp = self.register(Register::Storage);
        let next = sp.checked_add(SLOT_WIDTH).ok_or_else(|| {
            KyouError::no_span(ErrorKind::MemoryAccess, "stack pointer overflow")
        })?;
        self.write(sp, value, Power::Winter)?;
        match power {
            Some(power) => self.slot_powers.insert(sp, power),
            None => self.slot_powers.remove(&sp),
        };
        self.set_register(Register::Storage, next);
        Ok(())
    }

    /// Pops the top slot. The stack is empty once `品` is at or below `品台`.
    fn pop(&mut self) -> KyouResult<(i64, Power)> {
        let base = self.register(Register::StorageBase);
        let sp = match self.register(Register::Storage).checked_sub(SLOT_WIDTH) {
            Some(sp) if sp >= base => sp,
            _ => {
                return Err(KyouError::no_span(
                    ErrorKind::StackUnderflow,
                    "pop from an empty stack",
                ))
            }
        };
        let value = self.read(sp, Power::Winter)?;
        let power = self.slot_powers.remove(&sp).unwrap_or_default();
        self.set_register(Register::Storage, sp);
        Ok((value, power))
    }

    // -------------------------------------------------------------------------
    // MEMORY
    // -------------------------------------------------------------------------

    fn checked_range(&self, address: i64, width: usize) -> KyouResult<std::ops::Range<usize>> {
        let start = usize::try_from(address).ok();
        match start.and_then(|s| s.checked_add(width).map(|end| s..end)) {
            Some(range) if range.end <= self.config.memory_size => Ok(range),
            _ => Err(KyouError::no_span(
                ErrorKind::MemoryAccess,
                format!(
                    "access of {} byte(s) at {} is outside memory of {} bytes",
                    width, address, self.config.memory_size
                ),
            )),
        }
    }

    /// Reads a little-endian value; ordered powers are sign-extended.
    fn read(&self, address: i64, power: Power) -> KyouResult<i64> {
        let width = power.width();
        let range = self.checked_range(address, width)?;
        let mut buf = [0u8; 8];
        for (dst, i) in buf.iter_mut().zip(range) {
            *dst = self.memory.get(i).copied().unwrap_or(0);
        }
        let raw = i64::from_le_bytes(buf);
        Ok(match power {
            Power::Char => raw,
            _ => {
                let shift = 64 - 8 * width as u32;
                (raw << shift) >> shift
            }
        })
    }

    /// Writes the low `power.width()` bytes of `value`, little-endian.
    fn write(&mut self, address: i64, value: i64, power: Power) -> KyouResult<()> {
        let range = self.checked_range(address, power.width())?;
        if self.memory.len() < range.end {
            self.memory.resize(range.end, 0);
        }
        let bytes = value.to_le_bytes();
        self.memory[range.clone()].copy_from_slice(&bytes[..range.len()]);
        Ok(())
    }

    /// Reads NUL-terminated text starting at `address`.
    fn read_text(&self, address: i64) -> KyouResult<Vec<u8>> {
        let start = self.checked_range(address, 0)?.start;
        let end = self.memory.len().max(start);
        let tail = &self.memory[start.min(end)..end];
        let len = memchr::memchr(0, tail).unwrap_or(tail.len());
        Ok(tail[..len].to_vec())
    }

    /// Copies `bytes` into memory at `address`.
    pub fn load_bytes(&mut self, address: usize, bytes: &[u8]) -> KyouResult<()> {
        let range = self.checked_range(address as i64, bytes.len())?;
        if self.memory.len() < range.end {
            self.memory.resize(range.end, 0);
        }
        self.memory[range].copy_from_slice(bytes);
        Ok(())
    }

    /// Reads one memory cell of the given power.
    pub fn peek_memory(&self, address: i64, power: Power) -> KyouResult<i64> {
        self.read(address, power)
    }
}

// -----------------------------------------------------------------------------
// HELPERS
// -----------------------------------------------------------------------------

fn check_power(src: Power, dest: Power) -> KyouResult<()> {
    if src.fits_into(dest) {
        Ok(())
    } else {
        Err(KyouError::no_span(
            ErrorKind::PowerMismatch,
            format!(
                "cannot store a {:?} ({}) value into a {:?} ({}) destination",
                src,
                src.glyph(),
                dest,
                dest.glyph()
            ),
        ))
    }
}

fn apply_op(op: ArithOp, lhs: i64, rhs: i64) -> KyouResult<i64> {
    match op {
        ArithOp::Add => Ok(lhs.wrapping_add(rhs)),
        ArithOp::Sub => Ok(lhs.wrapping_sub(rhs)),
        ArithOp::Mul => Ok(lhs.wrapping_mul(rhs)),
        ArithOp::Div | ArithOp::Mod if rhs == 0 => Err(KyouError::no_span(
            ErrorKind::Arithmetic,
            if op == ArithOp::Div {
                "division by zero"
            } else {
                "modulo by zero"
            },
        )),
        ArithOp::Div => Ok(lhs.wrapping_div(rhs)),
        ArithOp::Mod => Ok(lhs.wrapping_rem(rhs)),
        ArithOp::Or | ArithOp::And | ArithOp::Xor => Err(KyouError::no_span(
            ErrorKind::UnsupportedOperand,
            format!("operator {:?} is not executable", op),
        )),
    }
}

fn io_error(e: std::io::Error) -> KyouError {
    KyouError::no_span(ErrorKind::Io, format!("failed to write output: {}", e))
}

