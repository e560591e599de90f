use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref REGISTER: Regex = Regex::new(r"^%([0-9A-Fa-f])$").unwrap();
    static ref AT_REGISTER: Regex = Regex::new(r"^\[%([0-9A-Fa-f])\]$").unwrap();
    static ref AT_LABEL: Regex = Regex::new(r"^\[([A-Za-z_][A-Za-z0-9_]*)\]$").unwrap();
    static ref AT_ADDRESS: Regex = Regex::new(r"^\[(0[xXoObB][0-9A-Fa-f]+|[0-9]+)\]$").unwrap();
    static ref VALUE: Regex = Regex::new(r"^(0[xX][0-9A-Fa-f]+|0[oO][0-7]+|0[bB][01]+|[0-9]+)$").unwrap();
    static ref LABEL: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap();
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operand {
    Register(u8),
    AtRegister(u8),
    AtLabel(String),
    AtAddress(u8),
    Value(u32),
    Label(String),
}

pub fn parse_number(text: &str) -> Option<u32> {
    if let Some(rest) = text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        u32::from_str_radix(rest, 16).ok()
    } else if let Some(rest) = text.strip_prefix("0o").or_else(|| text.strip_prefix("0O")) {
        u32::from_str_radix(rest, 8).ok()
    } else if let Some(rest) = text.strip_prefix("0b").or_else(|| text.strip_prefix("0B")) {
        u32::from_str_radix(rest, 2).ok()
    } else {
        text.parse::<u32>().ok()
    }
}

/// Classifies one operand token into its lexical category. Returns `None` for
/// tokens that match none of the recognized shapes.
pub fn parse_operand(token: &str) -> Option<Operand> {
    if let Some(caps) = REGISTER.captures(token) {
        let id = u8::from_str_radix(&caps[1], 16).ok()?;
        return Some(Operand::Register(id));
    }

    if let Some(caps) = AT_REGISTER.captures(token) {
        let id = u8::from_str_radix(&caps[1], 16).ok()?;
        return Some(Operand::AtRegister(id));
    }

    if let Some(caps) = AT_ADDRESS.captures(token) {
        let addr = parse_number(&caps[1])?;
        return Some(Operand::AtAddress(addr as u8));
    }

    if let Some(caps) = AT_LABEL.captures(token) {
        return Some(Operand::AtLabel(caps[1].to_string()));
    }

    if VALUE.is_match(token) {
        return Some(Operand::Value(parse_number(token)?));
    }

    if LABEL.is_match(token) {
        return Some(Operand::Label(token.to_string()));
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recognizes_register() {
        assert_eq!(parse_operand("%A"), Some(Operand::Register(0xA)));
    }

    #[test]
    fn recognizes_at_register() {
        assert_eq!(parse_operand("[%3]"), Some(Operand::AtRegister(0x3)));
    }

    #[test]
    fn recognizes_at_address() {
        assert_eq!(parse_operand("[0x1F]"), Some(Operand::AtAddress(0x1F)));
    }

    #[test]
    fn recognizes_at_label() {
        assert_eq!(parse_operand("[loop]"), Some(Operand::AtLabel("loop".to_string())));
    }

    #[test]
    fn recognizes_prefixed_values() {
        assert_eq!(parse_operand("0x1234"), Some(Operand::Value(0x1234)));
        assert_eq!(parse_operand("0o17"), Some(Operand::Value(15)));
        assert_eq!(parse_operand("0b101"), Some(Operand::Value(5)));
        assert_eq!(parse_operand("42"), Some(Operand::Value(42)));
    }

    #[test]
    fn recognizes_bare_label() {
        assert_eq!(parse_operand("done"), Some(Operand::Label("done".to_string())));
    }
}
