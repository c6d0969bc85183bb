//! Operand kind detection: registers, hex literals and label references

use lazy_static::lazy_static;
use regex::Regex;

use crate::parser::NumberParser;

lazy_static! {
    static ref REGISTER: Regex = Regex::new(r"^R[0-7]$").unwrap();
    static ref HEX_LITERAL: Regex = Regex::new(r"^\$[0-9A-F]{1,4}$").unwrap();
    static ref WORD: Regex = Regex::new(r"^[A-Za-z0-9_]+$").unwrap();
}

/// `R0` through `R7`
pub fn is_register(operand: &str) -> bool {
    REGISTER.is_match(operand)
}

/// Three-bit register index of `R0`..`R7`
pub fn register_index(operand: &str) -> Option<u16> {
    if !is_register(operand) {
        return None;
    }
    operand[1..].parse().ok()
}

/// `$` plus one to four upper-case hex digits
pub fn is_hex_literal(operand: &str) -> bool {
    HEX_LITERAL.is_match(operand)
}

/// Labels are one or more alphanumeric or underbar characters
pub fn is_label(text: &str) -> bool {
    WORD.is_match(text)
}

/// A number slot takes a hex literal or a label reference.
/// Register names match the label pattern, so callers reject them separately.
pub fn is_number(operand: &str) -> bool {
    is_hex_literal(operand) || is_label(operand)
}

/// What a number operand stands for before symbol resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value<'a> {
    Literal(u16),
    Label(&'a str),
}

pub fn number_value(operand: &str) -> Value<'_> {
    if is_hex_literal(operand) {
        if let Ok(v) = NumberParser::parse(operand) {
            return Value::Literal(v);
        }
    }
    Value::Label(operand)
}
