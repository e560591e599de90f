use crate::constants::{self, MEMORY_WORDS};
use crate::io::HostIo;
use crate::loader::state_to_machine_language;
use crate::register::RegisterBank;
use crate::render::{render_instruction, render_word};
use crate::word::{Instruction, OpCode, Word};

/// The full state of a Toy computer: 16 registers, 256 words of memory, and a
/// program counter. Out-of-range PC is not bounds-checked here: it is left to
/// fault on the next fetch rather than silently wrap, so a runaway jump cannot
/// corrupt other state.
pub struct Machine {
    pub registers: RegisterBank,
    pub memory: [Word; MEMORY_WORDS],
    pub pc: u16,
}

impl Machine {
    pub fn new() -> Machine {
        Machine {
            registers: RegisterBank::new(),
            memory: [0; MEMORY_WORDS],
            pc: 0,
        }
    }

    /// Loads a program (the word sequence produced by an assembler) starting at
    /// address 0, with the entry point `pc_start`.
    pub fn load_program(&mut self, words: &[Word], pc_start: usize) {
        for (i, &w) in words.iter().enumerate() {
            self.memory[i] = w;
        }
        self.pc = pc_start as u16;
    }

    pub fn clear(&mut self) {
        self.registers.clear();
        self.memory = [0; MEMORY_WORDS];
        self.pc = 0;
    }

    /// Executes one fetch-decode-execute cycle and returns whether the next word
    /// to be fetched is a non-halt instruction.
    pub fn step(&mut self, io: &mut dyn HostIo) -> bool {
        let ir = self.memory[self.pc as usize];
        let instr = Instruction::decode(ir).expect("every 4-bit opcode is assigned");

        self.pc = self.pc.wrapping_add(1);

        match instr.op {
            OpCode::Halt => {
                self.pc = self.pc.wrapping_sub(1);
            }

            OpCode::Add => {
                let v = self.registers.get(instr.s).wrapping_add(self.registers.get(instr.t));
                self.registers.set(instr.d, v);
            }

            OpCode::Sub => {
                let v = self.registers.get(instr.s).wrapping_sub(self.registers.get(instr.t));
                self.registers.set(instr.d, v);
            }

            OpCode::And => {
                let v = self.registers.get(instr.s) & self.registers.get(instr.t);
                self.registers.set(instr.d, v);
            }

            OpCode::Xor => {
                let v = (self.registers.get(instr.s) & 0xFFFF) ^ (self.registers.get(instr.t) & 0xFFFF);
                self.registers.set(instr.d, v);
            }

            OpCode::Lsh => {
                let shift = self.registers.get(instr.t) % 32;
                let v = self.registers.get(instr.s).wrapping_shl(shift);
                self.registers.set(instr.d, v);
            }

            OpCode::Rsh => {
                let shift = self.registers.get(instr.t) % 32;
                let v = self.registers.get(instr.s).wrapping_shr(shift);
                self.registers.set(instr.d, v);
            }

            OpCode::LoadImm => {
                self.registers.set(instr.d, instr.addr as u32);
            }

            OpCode::Load => {
                self.handle_load(instr.d, instr.addr, io);
            }

            OpCode::Store => {
                self.handle_store(instr.d, instr.addr, io);
            }

            OpCode::LoadInd => {
                let addr = (self.registers.get(instr.t) & 0xFF) as u8;
                self.handle_load(instr.d, addr, io);
            }

            OpCode::StoreInd => {
                let addr = (self.registers.get(instr.t) & 0xFF) as u8;
                self.handle_store(instr.d, addr, io);
            }

            OpCode::BranchZero => {
                if self.registers.get(instr.d) == 0 {
                    self.pc = instr.addr as u16;
                }
            }

            OpCode::BranchPositive => {
                if (self.registers.get(instr.d) as i32) > 0 {
                    self.pc = instr.addr as u16;
                }
            }

            OpCode::JumpReg => {
                self.pc = (self.registers.get(instr.d) & 0xFF) as u16;
            }

            OpCode::Call => {
                self.registers.set(instr.d, self.pc as u32);
                self.pc = instr.addr as u16;
            }
        }

        (self.memory[self.pc as usize] & constants::OPCODE_MASK) != 0
    }

    /// Runs to completion, calling `step` until it returns false.
    pub fn run(&mut self, io: &mut dyn HostIo) {
        while self.step(io) {}
    }

    fn handle_load(&mut self, d: u8, addr: u8, io: &mut dyn HostIo) {
        match addr {
            constants::IO_INPUT_INT => {
                let value = self.read_int(io);
                self.registers.set(d, value);
            }
            constants::IO_INPUT_RAND => {
                let value = io.random_word();
                self.registers.set(d, value as u32);
            }
            constants::IO_INPUT_STRING => {
                self.read_string_into_memory(d, io);
            }
            _ => {
                self.registers.set(d, self.memory[addr as usize] as u32);
            }
        }
    }

    fn handle_store(&mut self, r: u8, addr: u8, io: &mut dyn HostIo) {
        let value = self.registers.get(r);

        match addr {
            constants::IO_OUTPUT_BIN => io.write_str(&format!("{:b}", value)),
            constants::IO_OUTPUT_OCT => io.write_str(&format!("{:o}", value)),
            constants::IO_OUTPUT_HEX => io.write_str(&format!("{:x}", value)),
            constants::IO_OUTPUT_DEC => io.write_str(&format!("{}", value)),
            constants::IO_OUTPUT_CHAR => {
                if let Some(c) = char::from_u32(value & 0xFF) {
                    io.write_str(&c.to_string());
                }
            }
            constants::IO_OUTPUT_NEWLINE => io.write_str("\n"),
            constants::IO_OUTPUT_PATTERN => {
                let bits = value as u16;
                let pattern: String = (0..16)
                    .rev()
                    .map(|i| if bits & (1 << i) != 0 { '█' } else { ' ' })
                    .collect();
                io.write_str(&pattern);
            }
            constants::IO_OUTPUT_DUMP => io.write_str(&format!("\n{}", self.dump())),
            constants::IO_OUTPUT_STATE => io.write_str(&format!("\n{}", state_to_machine_language(self))),
            _ => {
                self.memory[addr as usize] = value as Word;
            }
        }
    }

    fn read_int(&self, io: &mut dyn HostIo) -> u32 {
        loop {
            let line = match io.read_line() {
                Ok(line) => line,
                Err(_) => return 0,
            };
            let trimmed = line.trim();

            // Only strings longer than a bare prefix get radix-sniffed, matching
            // the source this was ported from; "0x"/"0o"/"0b" alone fall through
            // to a plain decimal parse (and fail, prompting again).
            let parsed: Option<i64> = if trimmed.len() > 2 {
                match &trimmed[..2] {
                    "0x" | "0X" => i64::from_str_radix(&trimmed[2..], 16).ok(),
                    "0o" | "0O" => i64::from_str_radix(&trimmed[2..], 8).ok(),
                    "0b" | "0B" => i64::from_str_radix(&trimmed[2..], 2).ok(),
                    _ => trimmed.parse::<i64>().ok(),
                }
            } else {
                trimmed.parse::<i64>().ok()
            };

            if let Some(value) = parsed {
                let masked = (value.unsigned_abs() & 0xFFFF) as u32;
                if value != masked as i64 {
                    io.write_str(&format!("* Taking input to be {:#06x}\n", masked));
                }
                return masked;
            }
            // not a valid integer literal: re-prompt by reading another line
        }
    }

    fn read_string_into_memory(&mut self, pointer_reg: u8, io: &mut dyn HostIo) {
        let line = io.read_line().unwrap_or_default();
        let base = (self.registers.get(pointer_reg) & 0xFF) as usize;

        let mut addr = base;
        for byte in line.bytes().filter(|&b| (0x20..=0x7F).contains(&b)) {
            if addr >= MEMORY_WORDS {
                break;
            }
            self.memory[addr] = byte as Word;
            addr += 1;
        }
    }

    /// Renders `pc`, all 16 registers, and every non-zero memory cell alongside
    /// its decoded pseudocode. Backs the `0xF8` I/O special.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("pc: {:02X}\n", self.pc));

        for id in 0..16u8 {
            out.push_str(&format!("r{:X}: {:04X}\n", id, self.registers.get(id)));
        }

        for (addr, &word) in self.memory.iter().enumerate() {
            if word != 0 {
                let rendered = Instruction::decode(word)
                    .map(|instr| render_instruction(&instr))
                    .unwrap_or_default();
                out.push_str(&format!("{:02X}: {:04X}  {}\n", addr, word, rendered));
            }
        }

        out
    }
}

impl Default for Machine {
    fn default() -> Machine {
        Machine::new()
    }
}

/// Disassembles a whole program, one line per word, ignoring trailing zero words.
pub fn disassemble(words: &[Word]) -> String {
    words
        .iter()
        .map(|&w| render_word(w))
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::io::RecordedIo;
    use crate::word::Instruction;

    fn run_program(words: &[Word]) -> (Machine, RecordedIo) {
        run_program_with_io(words, RecordedIo::new(Vec::<String>::new(), Vec::<u16>::new()))
    }

    fn run_program_with_io(words: &[Word], mut io: RecordedIo) -> (Machine, RecordedIo) {
        let mut machine = Machine::new();
        machine.load_program(words, 0);
        machine.run(&mut io);
        (machine, io)
    }

    #[test]
    fn halt_leaves_pc_parked_and_stops_run() {
        let words = vec![Instruction::imm(OpCode::Halt, 0, 0).encode()];
        let (machine, _) = run_program(&words);
        assert_eq!(machine.pc, 0);
    }

    #[test]
    fn add_computes_sum() {
        let words = vec![
            Instruction::imm(OpCode::LoadImm, 0x1, 42).encode(),
            Instruction::imm(OpCode::LoadImm, 0x2, 8).encode(),
            Instruction::reg(OpCode::Add, 0x3, 0x1, 0x2).encode(),
            Instruction::imm(OpCode::Halt, 0, 0).encode(),
        ];
        let (machine, _) = run_program(&words);
        assert_eq!(machine.registers.get(0x3), 50);
    }

    #[test]
    fn xor_masks_both_operands_to_16_bits() {
        let mut machine = Machine::new();
        machine.registers.set(0x1, 0x1_FFFF);
        machine.registers.set(0x2, 0);
        let words = vec![
            Instruction::reg(OpCode::Xor, 0x3, 0x1, 0x2).encode(),
            Instruction::imm(OpCode::Halt, 0, 0).encode(),
        ];
        machine.load_program(&words, 0);
        machine.run(&mut RecordedIo::new(Vec::<String>::new(), Vec::<u16>::new()));
        assert_eq!(machine.registers.get(0x3), 0xFFFF);
    }

    #[test]
    fn store_to_hex_output_writes_formatted_value() {
        let words = vec![
            Instruction::imm(OpCode::LoadImm, 0x1, 0xAB).encode(),
            Instruction::imm(OpCode::Store, 0x1, constants::IO_OUTPUT_HEX).encode(),
            Instruction::imm(OpCode::Halt, 0, 0).encode(),
        ];
        let (_, io) = run_program(&words);
        assert_eq!(io.output, "ab");
    }

    #[test]
    fn load_from_int_input_parses_prefixed_literal() {
        let words = vec![
            Instruction::imm(OpCode::Load, 0x1, constants::IO_INPUT_INT).encode(),
            Instruction::imm(OpCode::Store, 0x1, constants::IO_OUTPUT_DEC).encode(),
            Instruction::imm(OpCode::Halt, 0, 0).encode(),
        ];
        let io = RecordedIo::new(vec!["0x10".to_string()], Vec::<u16>::new());
        let (_, io) = run_program_with_io(&words, io);
        assert_eq!(io.output, "16");
    }

    #[test]
    fn branch_zero_jumps_when_register_is_zero() {
        let words = vec![
            Instruction::imm(OpCode::LoadImm, 0x1, 0).encode(),
            Instruction::imm(OpCode::BranchZero, 0x1, 3).encode(),
            Instruction::imm(OpCode::LoadImm, 0x2, 0xFF).encode(),
            Instruction::imm(OpCode::Halt, 0, 0).encode(),
        ];
        let (machine, _) = run_program(&words);
        assert_eq!(machine.registers.get(0x2), 0);
    }

    #[test]
    fn call_stores_return_address_and_jumps() {
        let words = vec![
            Instruction::imm(OpCode::Call, 0xA, 3).encode(),
            Instruction::imm(OpCode::Halt, 0, 0).encode(),
            Instruction::imm(OpCode::Halt, 0, 0).encode(),
            Instruction::reg(OpCode::JumpReg, 0, 0, 0).encode(), // placeholder overwritten below
        ];
        let mut machine = Machine::new();
        machine.load_program(&words, 0);

        // subroutine at address 3: jump back to R[A]
        machine.memory[3] = Instruction::reg(OpCode::JumpReg, 0xA, 0, 0).encode();

        machine.run(&mut RecordedIo::new(Vec::<String>::new(), Vec::<u16>::new()));

        assert_eq!(machine.registers.get(0xA), 1);
        assert_eq!(machine.pc, 1);
    }

    #[test]
    fn sub_computes_difference_and_wraps_on_underflow() {
        let words = vec![
            Instruction::imm(OpCode::LoadImm, 0x1, 5).encode(),
            Instruction::imm(OpCode::LoadImm, 0x2, 10).encode(),
            Instruction::reg(OpCode::Sub, 0x3, 0x1, 0x2).encode(),
            Instruction::imm(OpCode::Halt, 0, 0).encode(),
        ];
        let (machine, _) = run_program(&words);
        assert_eq!(machine.registers.get(0x3), 0xFFFF_FFFB);
    }

    #[test]
    fn and_masks_bits() {
        let words = vec![
            Instruction::imm(OpCode::LoadImm, 0x1, 0xFC).encode(),
            Instruction::imm(OpCode::LoadImm, 0x2, 0x0F).encode(),
            Instruction::reg(OpCode::And, 0x3, 0x1, 0x2).encode(),
            Instruction::imm(OpCode::Halt, 0, 0).encode(),
        ];
        let (machine, _) = run_program(&words);
        assert_eq!(machine.registers.get(0x3), 0x0C);
    }

    #[test]
    fn lsh_and_rsh_shift_by_the_other_register() {
        let words = vec![
            Instruction::imm(OpCode::LoadImm, 0x1, 1).encode(),
            Instruction::imm(OpCode::LoadImm, 0x2, 4).encode(),
            Instruction::reg(OpCode::Lsh, 0x3, 0x1, 0x2).encode(),
            Instruction::reg(OpCode::Rsh, 0x4, 0x3, 0x2).encode(),
            Instruction::imm(OpCode::Halt, 0, 0).encode(),
        ];
        let (machine, _) = run_program(&words);
        assert_eq!(machine.registers.get(0x3), 16);
        assert_eq!(machine.registers.get(0x4), 1);
    }

    #[test]
    fn load_ind_and_store_ind_address_through_a_register() {
        let words = vec![
            Instruction::imm(OpCode::LoadImm, 0x1, 0x20).encode(), // pointer
            Instruction::imm(OpCode::LoadImm, 0x2, 0x55).encode(), // value
            Instruction::reg(OpCode::StoreInd, 0x2, 0, 0x1).encode(),
            Instruction::reg(OpCode::LoadInd, 0x3, 0, 0x1).encode(),
            Instruction::imm(OpCode::Halt, 0, 0).encode(),
        ];
        let (machine, _) = run_program(&words);
        assert_eq!(machine.memory[0x20], 0x55);
        assert_eq!(machine.registers.get(0x3), 0x55);
    }

    #[test]
    fn branch_positive_does_not_jump_on_zero() {
        let words = vec![
            Instruction::imm(OpCode::LoadImm, 0x1, 0).encode(),
            Instruction::imm(OpCode::BranchPositive, 0x1, 4).encode(),
            Instruction::imm(OpCode::LoadImm, 0x2, 0xAA).encode(),
            Instruction::imm(OpCode::Halt, 0, 0).encode(),
            Instruction::imm(OpCode::Halt, 0, 0).encode(),
        ];
        let (machine, _) = run_program(&words);
        assert_eq!(machine.registers.get(0x2), 0xAA);
    }

    #[test]
    fn branch_positive_jumps_on_a_positive_register() {
        let words = vec![
            Instruction::imm(OpCode::LoadImm, 0x1, 1).encode(),
            Instruction::imm(OpCode::BranchPositive, 0x1, 4).encode(),
            Instruction::imm(OpCode::LoadImm, 0x2, 0xAA).encode(),
            Instruction::imm(OpCode::Halt, 0, 0).encode(),
            Instruction::imm(OpCode::Halt, 0, 0).encode(),
        ];
        let (machine, _) = run_program(&words);
        assert_eq!(machine.registers.get(0x2), 0);
    }

    #[test]
    fn jump_reg_truncates_target_to_low_byte() {
        let mut machine = Machine::new();
        machine.registers.set(0x1, 0x1_2303);
        let words = vec![Instruction::reg(OpCode::JumpReg, 0x1, 0, 0).encode()];
        machine.load_program(&words, 0);
        machine.memory[0x03] = Instruction::imm(OpCode::Halt, 0, 0).encode();
        machine.run(&mut RecordedIo::new(Vec::<String>::new(), Vec::<u16>::new()));
        assert_eq!(machine.pc, 0x03);
    }

    #[test]
    fn pattern_output_renders_bits_as_blocks_and_spaces() {
        let words = vec![
            Instruction::imm(OpCode::LoadImm, 0x1, 0x01).encode(),
            Instruction::imm(OpCode::Store, 0x1, constants::IO_OUTPUT_PATTERN).encode(),
            Instruction::imm(OpCode::Halt, 0, 0).encode(),
        ];
        let (_, io) = run_program(&words);
        assert_eq!(io.output, format!("{}1", " ".repeat(15)).replace('1', "\u{2588}"));
    }

    #[test]
    fn string_input_stops_at_non_printable_and_does_not_append_terminator() {
        let words = vec![
            Instruction::imm(OpCode::LoadImm, 0x1, 0x30).encode(),
            Instruction::imm(OpCode::Load, 0x1, constants::IO_INPUT_STRING).encode(),
            Instruction::imm(OpCode::Halt, 0, 0).encode(),
        ];
        let io = RecordedIo::new(vec!["hi".to_string()], Vec::<u16>::new());
        let (machine, _) = run_program_with_io(&words, io);
        assert_eq!(machine.memory[0x30], b'h' as Word);
        assert_eq!(machine.memory[0x31], b'i' as Word);
        assert_eq!(machine.memory[0x32], 0);
    }

    #[test]
    fn clear_resets_everything() {
        let mut machine = Machine::new();
        machine.registers.set(0x1, 5);
        machine.memory[3] = 0xFFFF;
        machine.pc = 10;

        machine.clear();

        assert_eq!(machine.registers.get(0x1), 0);
        assert_eq!(machine.memory[3], 0);
        assert_eq!(machine.pc, 0);
    }
}
