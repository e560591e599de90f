use std::fmt;

/// The single error kind raised by both text formats this crate parses: assembly
/// source (see `toy-asm`) and machine-language snapshots (see [`crate::loader`]).
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ToyAssemblyError {
    DuplicateLabel(String),
    UnresolvedLabel(String),
    UnparseableLine(String),
    UnknownOperator(String),
    BadMachineLanguageLine(String),
    ProgramTooLarge(usize),
    BadEntryPoint(String),
}

impl fmt::Display for ToyAssemblyError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ToyAssemblyError::DuplicateLabel(name) => {
                write!(f, "label '{}' is defined more than once", name)
            }
            ToyAssemblyError::UnresolvedLabel(name) => {
                write!(f, "label '{}' is never defined", name)
            }
            ToyAssemblyError::UnparseableLine(line) => {
                write!(f, "could not parse line: {}", line)
            }
            ToyAssemblyError::UnknownOperator(op) => write!(f, "unknown operator '{}'", op),
            ToyAssemblyError::BadMachineLanguageLine(line) => {
                write!(f, "bad machine-language line: {}", line)
            }
            ToyAssemblyError::ProgramTooLarge(words) => write!(
                f,
                "program has {} words, which does not fit in {} words of memory",
                words,
                crate::constants::MEMORY_WORDS
            ),
            ToyAssemblyError::BadEntryPoint(reason) => {
                write!(f, "bad entry point: {}", reason)
            }
        }
    }
}

impl std::error::Error for ToyAssemblyError {}
