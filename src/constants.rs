use std::mem;

pub const NIBBLE_WIDTH: u32 = 4;
pub const BYTE_WIDTH: u32 = 8;
pub const WORD_BYTES: u32 = mem::size_of::<u16>() as u32;
pub const WORD_WIDTH: u32 = WORD_BYTES * BYTE_WIDTH;

pub const OPCODE_MASK: u16 = 0xF000;
pub const RD_MASK: u16 = 0x0F00;
pub const RS_MASK: u16 = 0x00F0;
pub const RT_MASK: u16 = 0x000F;
pub const ADDR_MASK: u16 = 0x00FF;

pub const OPCODE_OFFSET: u32 = 12;
pub const RD_OFFSET: u32 = 8;
pub const RS_OFFSET: u32 = 4;
pub const RT_OFFSET: u32 = 0;
pub const ADDR_OFFSET: u32 = 0;

pub const REGISTER_COUNT: usize = 16;
pub const MEMORY_WORDS: usize = 256;

// Scratch registers clobbered by multi-word assembler expansions (store_word_to, or-synthesis).
pub const SCRATCH_E: u8 = 0xE;
pub const SCRATCH_F: u8 = 0xF;

// Memory-mapped I/O window. Loads/stores in this range trigger host I/O instead of
// touching the underlying cell.
pub const IO_INPUT_INT: u8 = 0xF0;
pub const IO_OUTPUT_BIN: u8 = 0xF1;
pub const IO_OUTPUT_OCT: u8 = 0xF2;
pub const IO_OUTPUT_HEX: u8 = 0xF3;
pub const IO_OUTPUT_DEC: u8 = 0xF4;
pub const IO_OUTPUT_CHAR: u8 = 0xF5;
pub const IO_OUTPUT_NEWLINE: u8 = 0xF6;
pub const IO_OUTPUT_PATTERN: u8 = 0xF7;
pub const IO_OUTPUT_DUMP: u8 = 0xF8;
pub const IO_OUTPUT_STATE: u8 = 0xF9;
pub const IO_INPUT_RAND: u8 = 0xFA;
pub const IO_INPUT_STRING: u8 = 0xFB;
