/// One source line reduced to its label definition (if any) and its instruction
/// body (if any): a line may be just a label, just an instruction, or both.
pub struct Line {
    pub label: Option<String>,
    pub mnemonic: Option<String>,
    pub operands: Vec<String>,
}

/// Strips an end-of-line `;` comment, honoring double-quoted strings so a `;`
/// inside an `.ascii` literal is not mistaken for one.
pub fn strip_comment(line: &str) -> &str {
    let mut in_string = false;
    for (i, c) in line.char_indices() {
        match c {
            '"' => in_string = !in_string,
            ';' if !in_string => return &line[..i],
            _ => {}
        }
    }
    line
}

pub fn lex_line(raw: &str) -> Option<Line> {
    let stripped = strip_comment(raw).trim();
    if stripped.is_empty() {
        return None;
    }

    let (label, rest) = split_label(stripped);

    let rest = rest.trim();
    if rest.is_empty() {
        return Some(Line {
            label,
            mnemonic: None,
            operands: Vec::new(),
        });
    }

    let (mnemonic, operand_str) = match rest.find(char::is_whitespace) {
        Some(idx) => (&rest[..idx], rest[idx..].trim()),
        None => (rest, ""),
    };

    let operands = if operand_str.is_empty() {
        Vec::new()
    } else if mnemonic == ".ascii" {
        vec![operand_str.to_string()]
    } else if mnemonic == ".data" {
        operand_str
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    } else {
        operand_str.split_whitespace().map(|s| s.to_string()).collect()
    };

    Some(Line {
        label,
        mnemonic: Some(mnemonic.to_string()),
        operands,
    })
}

/// Splits a `label: rest` prefix out of a line, honoring quoted strings so a `:`
/// inside a literal is not mistaken for a label separator.
fn split_label(line: &str) -> (Option<String>, &str) {
    let mut in_string = false;
    for (i, c) in line.char_indices() {
        match c {
            '"' => in_string = !in_string,
            ':' if !in_string => {
                let label = line[..i].trim().to_string();
                return (Some(label), &line[i + 1..]);
            }
            _ => {}
        }
    }
    (None, line)
}
