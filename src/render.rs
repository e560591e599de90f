use crate::word::{Instruction, OpCode};

/// Renders the abstract effect of one instruction with register indices as single
/// hex nibbles and addresses as two-hex-digit bytes. Used by disassembly views and
/// by the `0xF8` diagnostic dump.
pub fn render_instruction(instr: &Instruction) -> String {
    let d = format!("%{:X}", instr.d);
    let s = format!("%{:X}", instr.s);
    let t = format!("%{:X}", instr.t);
    let addr = format!("{:02X}", instr.addr);

    match instr.op {
        OpCode::Halt => String::new(),
        OpCode::Add => format!("{} <- {} + {}", d, s, t),
        OpCode::Sub => format!("{} <- {} - {}", d, s, t),
        OpCode::And => format!("{} <- {} & {}", d, s, t),
        OpCode::Xor => format!("{} <- {} ^ {}", d, s, t),
        OpCode::Lsh => format!("{} <- {} << {}", d, s, t),
        OpCode::Rsh => format!("{} <- {} >> {}", d, s, t),
        OpCode::LoadImm => format!("{} <- {}", d, addr),
        OpCode::Load => format!("{} <- M[{}]", d, addr),
        OpCode::Store => format!("M[{}] <- {}", addr, d),
        OpCode::LoadInd => format!("{} <- M[{}]", d, t),
        OpCode::StoreInd => format!("M[{}] <- {}", t, d),
        OpCode::BranchZero => format!("if {} == 0 goto {}", d, addr),
        OpCode::BranchPositive => format!("if {} > 0 goto {}", d, addr),
        OpCode::JumpReg => format!("goto {}", d),
        OpCode::Call => format!("{} <- pc; goto {}", d, addr),
    }
}

/// Renders a raw word, decoding it first; an unrecognized opcode cannot occur since
/// all 16 opcode values are assigned, so this never falls back to a placeholder.
pub fn render_word(w: u16) -> String {
    match Instruction::decode(w) {
        Some(instr) => render_instruction(&instr),
        None => "-".to_string(),
    }
}
