use crate::constants::MEMORY_WORDS;
use crate::error::ToyAssemblyError;
use crate::processor::Machine;

/// Parses the line-oriented `key: hex-value` machine-language text form into a
/// fresh machine state. Recognized keys: `pc`, `rX` for `X` in `0..=F`, or a
/// two-hex-digit memory address. `;` starts a comment; blank lines are skipped.
pub fn load_machine_language(text: &str) -> Result<Machine, ToyAssemblyError> {
    let mut machine = Machine::new();

    for raw_line in text.lines() {
        let line = strip_comment(raw_line).trim();
        if line.is_empty() {
            continue;
        }

        let mut parts = line.splitn(2, ':');
        let key = parts
            .next()
            .ok_or_else(|| ToyAssemblyError::BadMachineLanguageLine(line.to_string()))?
            .trim();
        let value = parts
            .next()
            .ok_or_else(|| ToyAssemblyError::BadMachineLanguageLine(line.to_string()))?
            .trim();

        let value = u32::from_str_radix(value.trim_start_matches("0x"), 16)
            .map_err(|_| ToyAssemblyError::BadMachineLanguageLine(line.to_string()))?;

        if key.eq_ignore_ascii_case("pc") {
            if value as usize >= MEMORY_WORDS {
                return Err(ToyAssemblyError::BadEntryPoint(format!(
                    "pc {:#04X} is out of range",
                    value
                )));
            }
            machine.pc = value as u16;
        } else if let Some(reg) = key.strip_prefix('r').or_else(|| key.strip_prefix('R')) {
            let id = u8::from_str_radix(reg, 16)
                .map_err(|_| ToyAssemblyError::BadMachineLanguageLine(line.to_string()))?;
            machine.registers.set(id, value);
        } else {
            let addr = u8::from_str_radix(key.trim_start_matches("0x"), 16)
                .map_err(|_| ToyAssemblyError::BadMachineLanguageLine(line.to_string()))?;
            machine.memory[addr as usize] = value as u16;
        }
    }

    Ok(machine)
}

fn strip_comment(line: &str) -> &str {
    match line.find(';') {
        Some(idx) => &line[..idx],
        None => line,
    }
}

/// Renders a machine state back into the same text form `load_machine_language`
/// parses, so that the `0xF9` I/O special and any external snapshotting have a
/// stable, parseable format.
pub fn state_to_machine_language(machine: &Machine) -> String {
    let mut out = String::new();

    out.push_str(&format!("pc: {:02X}\n", machine.pc));

    for id in 0..16u8 {
        let value = machine.registers.get(id);
        if value != 0 {
            out.push_str(&format!("r{:X}: {:X}\n", id, value));
        }
    }

    for (addr, &word) in machine.memory.iter().enumerate() {
        if word != 0 {
            out.push_str(&format!("{:02X}: {:04X}\n", addr, word));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_pc_registers_and_memory() {
        let text = "pc: 02 ; entry point\nr1: 2A\n00: 7100\n";
        let machine = load_machine_language(text).unwrap();

        assert_eq!(machine.pc, 0x02);
        assert_eq!(machine.registers.get(1), 0x2A);
        assert_eq!(machine.memory[0], 0x7100);
    }

    #[test]
    fn rejects_garbage_lines() {
        assert!(load_machine_language("not a valid line").is_err());
    }

    #[test]
    fn round_trips_nonzero_state() {
        let mut machine = Machine::new();
        machine.pc = 0x10;
        machine.registers.set(0x3, 0xBEEF);
        machine.memory[0x20] = 0x1234;

        let text = state_to_machine_language(&machine);
        let parsed = load_machine_language(&text).unwrap();

        assert_eq!(parsed.pc, machine.pc);
        assert_eq!(parsed.registers.get(0x3), machine.registers.get(0x3));
        assert_eq!(parsed.memory[0x20], machine.memory[0x20]);
    }
}
