use crate::labels::LabelTable;
use crate::lexer::lex_line;
use crate::operand::{parse_operand, Operand};
use std::collections::HashMap;
use toy::constants::{
    IO_INPUT_INT, IO_INPUT_RAND, IO_INPUT_STRING, IO_OUTPUT_BIN, IO_OUTPUT_CHAR, IO_OUTPUT_DEC,
    IO_OUTPUT_DUMP, IO_OUTPUT_HEX, IO_OUTPUT_NEWLINE, IO_OUTPUT_OCT, IO_OUTPUT_PATTERN,
    IO_OUTPUT_STATE, SCRATCH_E, SCRATCH_F,
};
use toy::{Instruction, OpCode, ToyAssemblyError, Word};

/// The outcome of a successful assembly pass.
pub struct AssembledProgram {
    pub words: Vec<Word>,
    pub pc_start: usize,
    pub labels: HashMap<String, u16>,
}

/// Per-call state threading through one `assemble` invocation. Discarded once
/// assembly finishes; nothing here survives across calls.
struct Assembler {
    code: Vec<Word>,
    labels: LabelTable,
    pc_start: Option<usize>,
}

impl Assembler {
    fn new() -> Assembler {
        Assembler {
            code: Vec::new(),
            labels: LabelTable::new(),
            pc_start: None,
        }
    }

    fn push_instruction(&mut self, instr: Instruction) -> usize {
        let index = self.code.len();
        self.code.push(instr.encode());
        index
    }

    fn push_raw(&mut self, word: Word) -> usize {
        let index = self.code.len();
        self.code.push(word);
        index
    }

    /// Emits an `imm`-shaped instruction whose address operand is a resolved
    /// value now, or a label that is back-patched once every line is seen.
    fn push_imm_operand(&mut self, op: OpCode, d: u8, operand: &Operand) -> Result<(), ToyAssemblyError> {
        match operand {
            Operand::Value(v) => {
                self.push_instruction(Instruction::imm(op, d, *v as u8));
            }
            Operand::AtAddress(a) => {
                self.push_instruction(Instruction::imm(op, d, *a));
            }
            Operand::Label(name) | Operand::AtLabel(name) => {
                let index = self.push_instruction(Instruction::imm(op, d, 0));
                self.labels.reference(name, index);
            }
            _ => return Err(ToyAssemblyError::UnparseableLine(format!("{:?}", operand))),
        }
        Ok(())
    }

    /// Materializes an arbitrary 16-bit value into register `d`, using `R[0xF]`
    /// as scratch: load the high byte, shift left by 8, then add in the low byte.
    fn emit_store_word_to(&mut self, d: u8, value: u16) {
        self.push_instruction(Instruction::imm(OpCode::LoadImm, d, (value >> 8) as u8));
        self.push_instruction(Instruction::imm(OpCode::LoadImm, SCRATCH_F, 8));
        self.push_instruction(Instruction::reg(OpCode::Lsh, d, d, SCRATCH_F));
        self.push_instruction(Instruction::imm(OpCode::LoadImm, SCRATCH_F, (value & 0xFF) as u8));
        self.push_instruction(Instruction::reg(OpCode::Add, d, d, SCRATCH_F));
    }

    /// Materializes a value operand into register `d`: a single `LoadImm` if it
    /// fits in a byte, otherwise the 5-word widened form.
    fn emit_materialize_value(&mut self, d: u8, value: u32) {
        if value <= 0xFF {
            self.push_instruction(Instruction::imm(OpCode::LoadImm, d, value as u8));
        } else {
            self.emit_store_word_to(d, value as u16);
        }
    }

    fn emit_or_synthesis(&mut self, d: u8, s: u8, t: u8) {
        self.push_instruction(Instruction::reg(OpCode::Xor, SCRATCH_F, s, t));
        self.push_instruction(Instruction::reg(OpCode::And, SCRATCH_E, s, t));
        self.push_instruction(Instruction::reg(OpCode::Xor, d, SCRATCH_E, SCRATCH_F));
    }

    fn emit_arithmetic(&mut self, op: OpCode, d: u8, s: u8, rhs: &Operand) -> Result<(), ToyAssemblyError> {
        match rhs {
            Operand::Register(t) => {
                self.push_instruction(Instruction::reg(op, d, s, *t));
            }
            Operand::Value(v) => {
                self.emit_materialize_value(SCRATCH_E, *v);
                self.push_instruction(Instruction::reg(op, d, s, SCRATCH_E));
            }
            _ => {
                return Err(ToyAssemblyError::UnparseableLine(format!("{:?}", rhs)));
            }
        }
        Ok(())
    }

    fn emit_or(&mut self, d: u8, s: u8, rhs: &Operand) -> Result<(), ToyAssemblyError> {
        match rhs {
            Operand::Register(t) => self.emit_or_synthesis(d, s, *t),
            Operand::Value(v) => {
                self.emit_materialize_value(SCRATCH_E, *v);
                self.emit_or_synthesis(d, s, SCRATCH_E);
            }
            _ => return Err(ToyAssemblyError::UnparseableLine(format!("{:?}", rhs))),
        }
        Ok(())
    }

    fn emit_mov(&mut self, d: u8, rhs: &Operand) -> Result<(), ToyAssemblyError> {
        match rhs {
            Operand::Register(s) => {
                self.push_instruction(Instruction::imm(OpCode::LoadImm, d, 0));
                self.push_instruction(Instruction::reg(OpCode::Add, d, d, *s));
            }
            Operand::Value(v) => self.emit_materialize_value(d, *v),
            Operand::Label(name) => {
                let index = self.push_instruction(Instruction::imm(OpCode::LoadImm, d, 0));
                self.labels.reference(name, index);
            }
            Operand::AtAddress(a) => {
                self.push_instruction(Instruction::imm(OpCode::Load, d, *a));
            }
            Operand::AtLabel(name) => {
                let index = self.push_instruction(Instruction::imm(OpCode::Load, d, 0));
                self.labels.reference(name, index);
            }
            Operand::AtRegister(s) => {
                self.push_instruction(Instruction::reg(OpCode::LoadInd, d, 0, *s));
            }
        }
        Ok(())
    }

    fn emit_store_to(&mut self, dest: &Operand, s: u8) -> Result<(), ToyAssemblyError> {
        match dest {
            Operand::AtAddress(a) => {
                self.push_instruction(Instruction::imm(OpCode::Store, s, *a));
            }
            Operand::AtLabel(name) => {
                let index = self.push_instruction(Instruction::imm(OpCode::Store, s, 0));
                self.labels.reference(name, index);
            }
            Operand::AtRegister(p) => {
                self.push_instruction(Instruction::reg(OpCode::StoreInd, s, 0, *p));
            }
            _ => return Err(ToyAssemblyError::UnparseableLine(format!("{:?}", dest))),
        }
        Ok(())
    }

    fn emit_jump(&mut self, target: &Operand) -> Result<(), ToyAssemblyError> {
        match target {
            Operand::Value(v) => {
                self.push_instruction(Instruction::imm(OpCode::LoadImm, SCRATCH_F, *v as u8));
            }
            Operand::Label(name) => {
                let index = self.push_instruction(Instruction::imm(OpCode::LoadImm, SCRATCH_F, 0));
                self.labels.reference(name, index);
            }
            _ => return Err(ToyAssemblyError::UnparseableLine(format!("{:?}", target))),
        }
        self.push_instruction(Instruction::reg(OpCode::JumpReg, SCRATCH_F, 0, 0));
        Ok(())
    }

    fn register(op: &Operand) -> Result<u8, ToyAssemblyError> {
        match op {
            Operand::Register(id) => Ok(*id),
            other => Err(ToyAssemblyError::UnparseableLine(format!("{:?}", other))),
        }
    }

    /// Bounds-checked operand access: a mnemonic given too few operands is a
    /// malformed line, not a crash.
    fn arg<'a>(operands: &'a [Operand], index: usize, mnemonic: &str) -> Result<&'a Operand, ToyAssemblyError> {
        operands
            .get(index)
            .ok_or_else(|| ToyAssemblyError::UnparseableLine(format!("'{}' is missing an operand", mnemonic)))
    }

    fn io_shortcut(&mut self, op: OpCode, operand_addr: u8, register_operand: &Operand) -> Result<(), ToyAssemblyError> {
        let r = Assembler::register(register_operand)?;
        self.push_instruction(Instruction::imm(op, r, operand_addr));
        Ok(())
    }

    fn ascii_bytes(literal: &str) -> Result<Vec<u8>, ToyAssemblyError> {
        let inner = literal
            .strip_prefix('"')
            .and_then(|s| s.strip_suffix('"'))
            .ok_or_else(|| ToyAssemblyError::UnparseableLine(literal.to_string()))?;

        let mut bytes = Vec::new();
        let mut chars = inner.chars();
        while let Some(c) = chars.next() {
            if c == '\\' {
                match chars.next() {
                    Some('0') => bytes.push(0),
                    Some('n') => bytes.push(b'\n'),
                    Some('t') => bytes.push(b'\t'),
                    Some(other) => bytes.push(other as u8),
                    None => return Err(ToyAssemblyError::UnparseableLine(literal.to_string())),
                }
            } else {
                bytes.push(c as u8);
            }
        }
        bytes.push(0);
        Ok(bytes)
    }

    fn translate_line(&mut self, mnemonic: &str, operands: &[Operand], raw_operands: &[String]) -> Result<(), ToyAssemblyError> {
        match mnemonic {
            "halt" => {
                self.push_raw(0);
            }

            "mov" | "mv" => {
                let dest = Assembler::arg(operands, 0, mnemonic)?;
                let rhs = Assembler::arg(operands, 1, mnemonic)?;
                // `mv` only supports the register-to-register form; `mov` also allows
                // a bracketed destination, which stores a register's value to memory.
                if let Operand::Register(d) = *dest {
                    self.emit_mov(d, rhs)?;
                } else if mnemonic == "mv" {
                    return Err(ToyAssemblyError::UnparseableLine(format!("{:?}", dest)));
                } else {
                    let s = Assembler::register(rhs)?;
                    self.emit_store_to(dest, s)?;
                }
            }

            "ld" => {
                let d = Assembler::register(Assembler::arg(operands, 0, mnemonic)?)?;
                self.emit_mov(d, Assembler::arg(operands, 1, mnemonic)?)?;
            }

            "st" => {
                let dest = Assembler::arg(operands, 0, mnemonic)?;
                let s = Assembler::register(Assembler::arg(operands, 1, mnemonic)?)?;
                self.emit_store_to(dest, s)?;
            }

            "add" | "sub" | "and" | "xor" | "lsh" | "rsh" => {
                let op = match mnemonic {
                    "add" => OpCode::Add,
                    "sub" => OpCode::Sub,
                    "and" => OpCode::And,
                    "xor" => OpCode::Xor,
                    "lsh" => OpCode::Lsh,
                    "rsh" => OpCode::Rsh,
                    _ => unreachable!(),
                };
                let d = Assembler::register(Assembler::arg(operands, 0, mnemonic)?)?;
                match operands.len() {
                    // `op %d %s %t|v` — R[d] <- R[s] op (R[t]|v)
                    3 => {
                        let s = Assembler::register(Assembler::arg(operands, 1, mnemonic)?)?;
                        self.emit_arithmetic(op, d, s, Assembler::arg(operands, 2, mnemonic)?)?;
                    }
                    // `op %d %s|v` — R[d] <- R[d] op (R[s]|v)
                    2 => {
                        self.emit_arithmetic(op, d, d, Assembler::arg(operands, 1, mnemonic)?)?;
                    }
                    _ => {
                        return Err(ToyAssemblyError::UnparseableLine(format!(
                            "'{}' takes 2 or 3 operands",
                            mnemonic
                        )))
                    }
                }
            }

            "or" => {
                let d = Assembler::register(Assembler::arg(operands, 0, mnemonic)?)?;
                match operands.len() {
                    // `or %d %s %t|v` — R[d] <- R[s] | (R[t]|v)
                    3 => {
                        let s = Assembler::register(Assembler::arg(operands, 1, mnemonic)?)?;
                        self.emit_or(d, s, Assembler::arg(operands, 2, mnemonic)?)?;
                    }
                    // `or %d %s|v` — R[d] <- R[d] | (R[s]|v)
                    2 => {
                        self.emit_or(d, d, Assembler::arg(operands, 1, mnemonic)?)?;
                    }
                    _ => {
                        return Err(ToyAssemblyError::UnparseableLine(format!(
                            "'{}' takes 2 or 3 operands",
                            mnemonic
                        )))
                    }
                }
            }

            "not" => {
                let d = Assembler::register(Assembler::arg(operands, 0, mnemonic)?)?;
                let rhs = Assembler::arg(operands, 1, mnemonic)?;
                match rhs {
                    Operand::Register(s) => {
                        self.emit_store_word_to(SCRATCH_E, 0xFFFF);
                        self.push_instruction(Instruction::reg(OpCode::Xor, d, *s, SCRATCH_E));
                    }
                    Operand::Value(v) => {
                        self.emit_materialize_value(d, *v);
                        self.emit_store_word_to(SCRATCH_E, 0xFFFF);
                        self.push_instruction(Instruction::reg(OpCode::Xor, d, d, SCRATCH_E));
                    }
                    other => return Err(ToyAssemblyError::UnparseableLine(format!("{:?}", other))),
                }
            }

            "jump" | "jmp" => {
                self.emit_jump(Assembler::arg(operands, 0, mnemonic)?)?;
            }

            "jz" => {
                let d = Assembler::register(Assembler::arg(operands, 0, mnemonic)?)?;
                self.push_imm_operand(OpCode::BranchZero, d, Assembler::arg(operands, 1, mnemonic)?)?;
            }

            "jp" => {
                let d = Assembler::register(Assembler::arg(operands, 0, mnemonic)?)?;
                self.push_imm_operand(OpCode::BranchPositive, d, Assembler::arg(operands, 1, mnemonic)?)?;
            }

            "proc" | "call" => {
                let d = Assembler::register(Assembler::arg(operands, 0, mnemonic)?)?;
                self.push_imm_operand(OpCode::Call, d, Assembler::arg(operands, 1, mnemonic)?)?;
            }

            "ret" => {
                let d = Assembler::register(Assembler::arg(operands, 0, mnemonic)?)?;
                self.push_instruction(Instruction::reg(OpCode::JumpReg, d, 0, 0));
            }

            ".word" => {
                self.push_raw(0);
            }

            ".data" => {
                for operand in operands {
                    match operand {
                        Operand::Value(v) => {
                            self.push_raw((*v & 0xFFFF) as Word);
                        }
                        other => {
                            return Err(ToyAssemblyError::UnparseableLine(format!("{:?}", other)))
                        }
                    }
                }
            }

            ".ascii" => {
                let literal = raw_operands
                    .get(0)
                    .ok_or_else(|| ToyAssemblyError::UnparseableLine(".ascii".to_string()))?;
                for byte in Assembler::ascii_bytes(literal)? {
                    self.push_raw(byte as Word);
                }
            }

            ".bin" => self.io_shortcut(OpCode::Store, IO_OUTPUT_BIN, Assembler::arg(operands, 0, mnemonic)?)?,
            ".oct" => self.io_shortcut(OpCode::Store, IO_OUTPUT_OCT, Assembler::arg(operands, 0, mnemonic)?)?,
            ".hex" => self.io_shortcut(OpCode::Store, IO_OUTPUT_HEX, Assembler::arg(operands, 0, mnemonic)?)?,
            ".den" => self.io_shortcut(OpCode::Store, IO_OUTPUT_DEC, Assembler::arg(operands, 0, mnemonic)?)?,
            ".char" => self.io_shortcut(OpCode::Store, IO_OUTPUT_CHAR, Assembler::arg(operands, 0, mnemonic)?)?,
            ".pattern" => self.io_shortcut(OpCode::Store, IO_OUTPUT_PATTERN, Assembler::arg(operands, 0, mnemonic)?)?,

            ".input" => self.io_shortcut(OpCode::Load, IO_INPUT_INT, Assembler::arg(operands, 0, mnemonic)?)?,
            ".rand" => self.io_shortcut(OpCode::Load, IO_INPUT_RAND, Assembler::arg(operands, 0, mnemonic)?)?,
            ".string" => self.io_shortcut(OpCode::Load, IO_INPUT_STRING, Assembler::arg(operands, 0, mnemonic)?)?,

            ".line" => {
                self.push_instruction(Instruction::imm(OpCode::Store, 0, IO_OUTPUT_NEWLINE));
            }
            ".dump" => {
                self.push_instruction(Instruction::imm(OpCode::Store, 0, IO_OUTPUT_DUMP));
            }
            ".state" => {
                self.push_instruction(Instruction::imm(OpCode::Store, 0, IO_OUTPUT_STATE));
            }

            other => return Err(ToyAssemblyError::UnknownOperator(other.to_string())),
        }
        Ok(())
    }
}

/// Assembles one source program into the word sequence the engine executes,
/// the declared entry point, and the resolved label table.
pub fn assemble(source: &str) -> Result<AssembledProgram, ToyAssemblyError> {
    let mut asm = Assembler::new();

    for raw_line in source.lines() {
        let line = match lex_line(raw_line) {
            Some(line) => line,
            None => continue,
        };

        if let Some(label) = &line.label {
            asm.labels.define(label, asm.code.len() as u16)?;
        }

        let mnemonic = match &line.mnemonic {
            Some(m) => m,
            None => continue,
        };

        if mnemonic == ".main" {
            asm.pc_start = Some(asm.code.len());
            continue;
        }

        if mnemonic == ".ascii" {
            asm.translate_line(mnemonic, &[], &line.operands)?;
            continue;
        }

        let operands: Vec<Operand> = line
            .operands
            .iter()
            .map(|token| {
                parse_operand(token)
                    .ok_or_else(|| ToyAssemblyError::UnparseableLine(token.to_string()))
            })
            .collect::<Result<_, _>>()?;

        asm.translate_line(mnemonic, &operands, &line.operands)?;
    }

    asm.labels.fixup(&mut asm.code)?;

    let words = asm.code.len();
    if words > toy::constants::MEMORY_WORDS {
        return Err(ToyAssemblyError::ProgramTooLarge(words));
    }

    Ok(AssembledProgram {
        words: asm.code,
        pc_start: asm.pc_start.unwrap_or(0),
        labels: asm.labels.into_map(),
    })
}
