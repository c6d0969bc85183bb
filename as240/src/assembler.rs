//! Two-pass assembly driver

use std::collections::BTreeMap;

use spdlog::prelude::*;

use crate::error::{AsmError, LineError};
use crate::line::SourceLine;
use crate::listing::{render_listing, render_memory_image};
use crate::opcodes::InstructionSet;
use crate::symbol::SymbolTable;

/// Errors collected before assembly gives up.
pub const MAX_ERRORS: usize = 5;

/// Output of a clean run: every line in file order plus the final symbols.
#[derive(Debug, Clone)]
pub struct Assembly {
    lines: Vec<SourceLine>,
    symbols: SymbolTable,
}

impl Assembly {
    pub fn lines(&self) -> &[SourceLine] {
        &self.lines
    }

    pub fn symbols(&self) -> &SymbolTable {
        &self.symbols
    }

    /// `(address, word)` pairs in file order
    pub fn words(&self) -> Vec<(u16, u16)> {
        self.lines.iter().flat_map(SourceLine::words).collect()
    }

    pub fn listing(&self) -> String {
        render_listing(&self.lines)
    }

    pub fn memory_image(&self) -> String {
        render_memory_image(&self.lines)
    }

    pub fn symbol_table(&self) -> String {
        self.symbols.render()
    }
}

/// Collects line errors and reports when the cap is exceeded.
struct ErrorLog {
    errors: Vec<LineError>,
}

impl ErrorLog {
    fn new() -> Self {
        Self { errors: Vec::new() }
    }

    fn record(&mut self, err: LineError) -> Result<(), AsmError> {
        debug!("line {}: {:?}: {}", err.line, err.kind, err.reason);
        self.errors.push(err);
        if self.errors.len() > MAX_ERRORS {
            warn!("giving up after {} errors", self.errors.len());
            return Err(AsmError::Rejected { errors: std::mem::take(&mut self.errors), aborted: true });
        }
        Ok(())
    }

    fn finish(&mut self) -> Result<(), AsmError> {
        if self.errors.is_empty() {
            Ok(())
        } else {
            Err(AsmError::Rejected { errors: std::mem::take(&mut self.errors), aborted: false })
        }
    }
}

pub struct Assembler240 {
    isa: InstructionSet,
    symbols: SymbolTable,
}

impl Default for Assembler240 {
    fn default() -> Self {
        Self::new()
    }
}

impl Assembler240 {
    pub fn new() -> Self {
        Self {
            isa: InstructionSet::new(),
            symbols: SymbolTable::new(),
        }
    }

    // ===== Public API =====

    pub fn assemble(&mut self, src: &str) -> Result<Assembly, AsmError> {
        self.assemble_lines(src.lines())
    }

    /// Assemble raw lines; the first item is line 1.
    pub fn assemble_lines<'a, I>(&mut self, lines: I) -> Result<Assembly, AsmError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.symbols.clear();
        let mut errors = ErrorLog::new();

        let mut code = self.first_pass(lines, &mut errors)?;
        errors.finish()?;
        debug!("pass 1 done: {} lines, {} labels", code.len(), self.symbols.len());

        self.second_pass(&mut code, &mut errors)?;
        errors.finish()?;
        debug!("pass 2 done: {} words", code.iter().map(|l| l.words().len()).sum::<usize>());

        Ok(Assembly { lines: code, symbols: self.symbols.clone() })
    }

    pub fn symbols(&self) -> &BTreeMap<String, u16> {
        self.symbols.labels()
    }

    pub fn symbol_table(&self) -> &SymbolTable {
        &self.symbols
    }

    pub fn lookup(&self, name: &str) -> Option<u16> {
        self.symbols.get(name)
    }

    pub fn instruction_set(&self) -> &InstructionSet {
        &self.isa
    }

    pub fn reset(&mut self) {
        self.symbols.clear();
    }

    // ===== Assembly core =====

    /// Classify every line, declare labels and thread the address cursor.
    fn first_pass<'a, I>(&mut self, lines: I, errors: &mut ErrorLog) -> Result<Vec<SourceLine>, AsmError>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut code = Vec::new();
        let mut address: Option<u16> = None;
        for (idx, text) in lines.into_iter().enumerate() {
            let line_number = idx + 1;
            match SourceLine::new(text, line_number, address, &self.isa, &mut self.symbols) {
                Ok(line) => {
                    trace!(
                        "line {} @ {:?}: label={:?} opcode={:?}",
                        line_number,
                        address,
                        line.label(),
                        line.opcode()
                    );
                    address = line.next_address();
                    code.push(line);
                }
                Err(e) => errors.record(e)?,
            }
        }
        Ok(code)
    }

    /// Encode every line now that all labels are known.
    fn second_pass(&self, code: &mut [SourceLine], errors: &mut ErrorLog) -> Result<(), AsmError> {
        for line in code.iter_mut() {
            if let Err(e) = line.assemble(&self.symbols) {
                errors.record(e)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_forward_reference() {
        let src = concat!(
            " .ORG $0100\n",
            "TOP BRA AHEAD\n",
            "    STOP\n",
            "AHEAD BRA TOP\n",
        );
        let mut asm = Assembler240::new();
        let out = asm.assemble(src).unwrap();
        assert_eq!(
            out.words(),
            vec![(0x0100, 0x2800), (0x0101, 0x0103), (0x0102, 0x3000), (0x0103, 0x2800), (0x0104, 0x0100)]
        );
        assert_eq!(asm.lookup("AHEAD"), Some(0x0103));
    }

    #[test]
    fn test_errors_are_collected_per_line() {
        let src = concat!(
            "    ADD R1,R2\n",
            " .ORG $0010\n",
            "    FOO\n",
            "    ADD R1\n",
            "    STOP\n",
        );
        let err = Assembler240::new().assemble(src).unwrap_err();
        let lines: Vec<_> = err.line_errors().iter().map(|e| (e.line, e.kind)).collect();
        assert_eq!(
            lines,
            vec![
                (1, ErrorKind::AddressNotInitialized),
                (3, ErrorKind::InvalidOpcode),
                (4, ErrorKind::WrongOperandCount),
            ]
        );
        assert!(matches!(err, AsmError::Rejected { aborted: false, .. }));
        assert_eq!(err.exit_code(), 3);
    }

    #[test]
    fn test_sixth_error_aborts() {
        let src = " .ORG $0000\n".to_string() + &"    BOGUS\n".repeat(10);
        let err = Assembler240::new().assemble(&src).unwrap_err();
        match err {
            AsmError::Rejected { errors, aborted } => {
                assert!(aborted);
                assert_eq!(errors.len(), MAX_ERRORS + 1);
                assert_eq!(errors.last().map(|e| e.line), Some(7));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_undefined_label_in_second_pass() {
        let src = " .ORG $0000\n    JSR NOWHERE\n";
        let err = Assembler240::new().assemble(src).unwrap_err();
        assert_eq!(err.line_errors().len(), 1);
        assert_eq!(err.line_errors()[0].kind, ErrorKind::UndefinedLabel);
        assert_eq!(err.line_errors()[0].line, 2);
    }

    #[test]
    fn test_each_run_starts_with_empty_symbols() {
        let src = " .ORG $0200\nHERE STOP\n";
        let mut asm = Assembler240::new();
        asm.assemble(src).unwrap();
        let again = asm.assemble(src).unwrap();
        assert_eq!(again.symbols().get("HERE"), Some(0x0200));

        asm.reset();
        assert!(asm.symbols().is_empty());
        assert!(asm.assemble(src).is_ok());
    }

    #[test]
    fn test_instruction_set_is_shared_table() {
        let asm = Assembler240::new();
        let isa = asm.instruction_set();
        assert_eq!(isa.len(), 36);
        assert_eq!(isa.word_count("LDI"), Some(2));
        assert!(!isa.is_valid(".ORG"));
    }
}
