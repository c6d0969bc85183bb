//! Splits a source line into label, opcode and operand fields
//!
//! A line is tried against a fixed, ordered list of shapes and the first
//! match wins. Text in column 0 is always a label; an opcode-first line must
//! start with whitespace. Two-operand shapes come before the one-operand
//! shapes so that `R1,R2` is never read as a single operand token.

use lazy_static::lazy_static;
use regex::{Captures, Regex};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    Blank,
    Label,
    LabelOpcode,
    LabelOpcode2,
    Opcode2,
    Opcode,
    LabelOpcode1,
    Opcode1,
}

lazy_static! {
    static ref SHAPES: Vec<(Shape, Regex)> = vec![
        (Shape::Blank, Regex::new(r"^\s*$").unwrap()),
        (Shape::Label, Regex::new(r"^(\S+)\s*$").unwrap()),
        (Shape::LabelOpcode, Regex::new(r"^(\S+)\s+(\S+)\s*$").unwrap()),
        (Shape::LabelOpcode2, Regex::new(r"^(\S+)\s+(\S+)\s+(\S+)\s*,\s*(\S+)\s*$").unwrap()),
        (Shape::Opcode2, Regex::new(r"^\s+(\S+)\s+(\S+)\s*,\s*(\S+)\s*$").unwrap()),
        (Shape::Opcode, Regex::new(r"^\s+(\S+)\s*$").unwrap()),
        (Shape::LabelOpcode1, Regex::new(r"^(\S+)\s+(\S+)\s+(\S+)\s*$").unwrap()),
        (Shape::Opcode1, Regex::new(r"^\s+(\S+)\s+(\S+)\s*$").unwrap()),
    ];
}

/// Upper-cased fields of one line. All `None` for a blank line.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fields {
    pub label: Option<String>,
    pub opcode: Option<String>,
    pub operand1: Option<String>,
    pub operand2: Option<String>,
}

impl Fields {
    /// Number of operands actually written on the line
    pub fn operand_count(&self) -> usize {
        match (&self.operand1, &self.operand2) {
            (Some(_), Some(_)) => 2,
            (Some(_), None) => 1,
            _ => 0,
        }
    }
}

/// Drop a trailing `;` comment. A `;` in column 0 is left alone.
pub fn strip_comment(line: &str) -> &str {
    match line.find(';') {
        Some(idx) if idx > 0 => &line[..idx],
        _ => line,
    }
}

/// Match the comment-free text against the shapes in order.
/// `None` means the line cannot be decomposed into fields.
pub fn split_fields(text: &str) -> Option<(Shape, Fields)> {
    SHAPES.iter().find_map(|(shape, re)| {
        re.captures(text).map(|caps| (*shape, fields_for(*shape, &caps)))
    })
}

fn fields_for(shape: Shape, caps: &Captures<'_>) -> Fields {
    let group = |i: usize| caps.get(i).map(|m| m.as_str().to_uppercase());
    match shape {
        Shape::Blank => Fields::default(),
        Shape::Label => Fields { label: group(1), ..Fields::default() },
        Shape::LabelOpcode => Fields { label: group(1), opcode: group(2), ..Fields::default() },
        Shape::LabelOpcode2 => Fields {
            label: group(1),
            opcode: group(2),
            operand1: group(3),
            operand2: group(4),
        },
        Shape::Opcode2 => Fields {
            label: None,
            opcode: group(1),
            operand1: group(2),
            operand2: group(3),
        },
        Shape::Opcode => Fields { opcode: group(1), ..Fields::default() },
        Shape::LabelOpcode1 => Fields {
            label: group(1),
            opcode: group(2),
            operand1: group(3),
            operand2: None,
        },
        Shape::Opcode1 => Fields { opcode: group(1), operand1: group(2), ..Fields::default() },
    }
}
