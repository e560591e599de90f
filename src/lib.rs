pub mod constants;
pub mod error;
pub mod io;
pub mod loader;
pub mod processor;
pub mod register;
pub mod render;
pub mod word;

pub use error::ToyAssemblyError;
pub use io::{HostIo, RecordedIo, StdIo};
pub use loader::{load_machine_language, state_to_machine_language};
pub use processor::{disassemble, Machine};
pub use register::RegisterBank;
pub use word::{Instruction, OpCode, Word};
