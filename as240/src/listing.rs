//! Listing, memory image and symbol file text
//!
//! The renderers are always available. Writing them to files or stdout is
//! behind the `listing` feature, as the command-line front end needs it.

#[cfg(feature = "listing")]
use std::fs::File;
#[cfg(feature = "listing")]
use std::io::{self, Write};
#[cfg(feature = "listing")]
use std::path::Path;

use crate::line::{Op, SourceLine};
use crate::opcodes::Format;

#[cfg(feature = "listing")]
use crate::assembler::Assembly;

pub const LISTING_HEADER: [&str; 2] = [
    "addr data  label   opcode  operands",
    "---- ----  -----   ------  --------",
];

fn listing_row(addr: u16, word: u16, label: &str, opcode: &str, operands: &str) -> String {
    format!("{:04X} {:04X}  {:<5}   {:<6} {:<8}", addr, word, label, opcode, operands)
}

/// Listing rows for one line: none, one, or two for a long instruction.
pub fn listing_lines(line: &SourceLine) -> Vec<String> {
    let (Some(addr), Some(word1)) = (line.address(), line.word1()) else {
        return Vec::new();
    };

    let long = matches!(line.op(), Some(Op::Instruction(info)) if info.format == Format::Long);
    let operands = match (line.operand1(), line.operand2()) {
        (Some(a), _) if long => a.to_string(),
        (Some(a), Some(b)) => format!("{} {}", a, b),
        (Some(a), None) => a.to_string(),
        _ => String::new(),
    };

    let mut rows = vec![listing_row(
        addr,
        word1,
        line.label().unwrap_or(" "),
        line.opcode().unwrap_or(" "),
        &operands,
    )];
    if let Some(word2) = line.word2() {
        rows.push(listing_row(
            addr.wrapping_add(1),
            word2,
            " ",
            " ",
            line.long_word_operand().unwrap_or(""),
        ));
    }
    rows
}

/// `AAAA DDDD` rows for one line
pub fn memory_lines(line: &SourceLine) -> Vec<String> {
    line.words()
        .into_iter()
        .map(|(addr, word)| format!("{:04X} {:04X}", addr, word))
        .collect()
}

pub fn render_listing(lines: &[SourceLine]) -> String {
    let mut out = String::new();
    for row in LISTING_HEADER
        .iter()
        .map(|s| s.to_string())
        .chain(lines.iter().flat_map(listing_lines))
    {
        out.push_str(&row);
        out.push('\n');
    }
    out
}

pub fn render_memory_image(lines: &[SourceLine]) -> String {
    let mut out = String::new();
    for row in lines.iter().flat_map(memory_lines) {
        out.push_str(&row);
        out.push('\n');
    }
    out
}

// ===== File output (feature-gated) =====

#[cfg(feature = "listing")]
impl Assembly {
    pub fn print_assembly_listing(&self) {
        print!("{}", self.listing());
    }

    pub fn write_listing<W: Write>(&self, mut w: W) -> io::Result<()> {
        w.write_all(self.listing().as_bytes())
    }

    pub fn save_listing<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        self.write_listing(File::create(path)?)
    }

    pub fn save_memory_image<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let mut f = File::create(path)?;
        f.write_all(self.memory_image().as_bytes())
    }

    pub fn save_symbols<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let mut f = File::create(path)?;
        writeln!(f, "{}", self.symbol_table())
    }
}
