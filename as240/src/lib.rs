//! Two-pass assembler for the 240 teaching ISA: 16-bit words, eight
//! registers, one- and two-word instruction formats. Optional file output
//! for listings (feature: "listing").
//!
//! ## Source format
//! - One statement per line: `[LABEL] OPCODE [OPERAND1[, OPERAND2]]`.
//! - Text in column 0 is a label; an opcode-first line starts with whitespace.
//! - `;` starts a comment (except in column 0).
//! - Registers are `R0`..`R7`; numbers are hex only (`$` plus 1-4 digits).
//! - Everything is case-insensitive and stored upper-case.
//!
//! ## Pseudo-operations
//!   - `.ORG $xxxx` – set the address cursor (no label allowed).
//!   - `LABEL .EQU $xxxx` – declare a label at the current address, takes no memory.
//!   - `[LABEL] .DW [$xxxx]` – one data word (zero when omitted).
//!
//! ## Outputs
//! A clean run yields a listing, a memory image (`AAAA DDDD` per word) and a
//! symbol table. Any error means no output; after more than five errors the
//! run stops early.
//!
//! ## Basic Usage
//! ```rust
//! use as240::Assembler240;
//!
//! fn main() -> Result<(), as240::AsmError> {
//!     let mut assembler = Assembler240::new();
//!     let src = "    .ORG $1200\nLOOP ADD R1, R2\n     BRA LOOP\n";
//!
//!     let out = assembler.assemble(src)?;
//!     assert_eq!(out.words(), vec![(0x1200, 0x0E0A), (0x1201, 0x2800), (0x1202, 0x1200)]);
//!     Ok(())
//! }
//! ```
//!
//! ## License
//! This project is released under [The Unlicense](https://unlicense.org/).
//! You are free to use it for any purpose, without restriction.

mod error;
mod opcodes;
mod symbol;
mod parser;
mod operand;
mod line;
mod listing;
mod assembler;

// Public exports
pub use error::{AsmError, ErrorKind, LineError};
pub use opcodes::{Directive, Field, Format, InstructionSet, Mnemonic, OpcodeInfo, OperandKind, Slot};
pub use symbol::SymbolTable;
pub use parser::{split_fields, strip_comment, Fields, Shape};
pub use line::{Op, SourceLine};
pub use listing::{listing_lines, memory_lines, render_listing, render_memory_image, LISTING_HEADER};
pub use assembler::{Assembler240, Assembly, MAX_ERRORS};
