//! One source line: field classification, validation and encoding

use crate::error::{ErrorKind, LineError};
use crate::opcodes::{Directive, Field, InstructionSet, OpcodeInfo, OperandKind, Slot};
use crate::operand::{self, Value};
use crate::parser::{split_fields, strip_comment, Fields, NumberParser};
use crate::symbol::SymbolTable;

/// The opcode column of a line, once recognized.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Instruction(OpcodeInfo),
    Directive(Directive),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLine {
    line_number: usize,
    text: String,
    fields: Fields,
    op: Option<Op>,
    address: Option<u16>,
    next_address: Option<u16>,
    word1: Option<u16>,
    word2: Option<u16>,
}

impl SourceLine {
    /// Classify and validate `text` at `address` (pass 1).
    ///
    /// A well-formed label is declared at the current address before the
    /// opcode is checked, so a line rejected later still claims its label.
    /// Words are filled in later by [`SourceLine::assemble`].
    pub fn new(
        text: &str,
        line_number: usize,
        address: Option<u16>,
        isa: &InstructionSet,
        symbols: &mut SymbolTable,
    ) -> Result<Self, LineError> {
        let (_, fields) = split_fields(strip_comment(text)).ok_or_else(|| {
            LineError::parse(line_number, "Line can't be parsed into label, opcode, operand fields")
        })?;

        let mut line = Self {
            line_number,
            text: text.to_string(),
            fields,
            op: None,
            address,
            next_address: address,
            word1: None,
            word2: None,
        };

        if let Some(label) = &line.fields.label {
            line.check_label(label)?;
            if let Some(addr) = address {
                symbols.declare(label, addr, line_number)?;
            }
        }
        let op = match &line.fields.opcode {
            Some(opcode) => Some(line.check_opcode(opcode, isa)?),
            None => None,
        };
        line.op = op;
        line.check_address()?;
        line.next_address = line.compute_next_address();
        Ok(line)
    }

    fn syntax_error(&self, kind: ErrorKind, reason: impl Into<String>) -> LineError {
        LineError::syntax(self.line_number, kind, reason)
    }

    fn check_label(&self, label: &str) -> Result<(), LineError> {
        if !operand::is_label(label) {
            return Err(self.syntax_error(
                ErrorKind::InvalidLabel,
                format!(
                    "Invalid label ({}).  Labels may only consist of alphanumeric or underbar characters.",
                    label
                ),
            ));
        }
        Ok(())
    }

    fn check_opcode(&self, opcode: &str, isa: &InstructionSet) -> Result<Op, LineError> {
        if let Some(directive) = Directive::from_name(opcode) {
            self.check_directive(directive)?;
            return Ok(Op::Directive(directive));
        }
        let info = isa
            .get(opcode)
            .ok_or_else(|| self.syntax_error(ErrorKind::InvalidOpcode, format!("Invalid opcode ({})", opcode)))?;
        self.check_operand_count(info)?;
        for (idx, kind) in info.operands.iter().enumerate() {
            let slot = if idx == 0 { Slot::First } else { Slot::Second };
            if let Some(text) = self.operand(slot) {
                self.check_operand_kind(info, slot, *kind, text)?;
            }
        }
        Ok(Op::Instruction(*info))
    }

    fn provided(&self) -> String {
        match (&self.fields.operand1, &self.fields.operand2) {
            (Some(a), Some(b)) => format!("two ({} and {})", a, b),
            (Some(a), None) => format!("one ({})", a),
            _ => "none".to_string(),
        }
    }

    fn check_operand_count(&self, info: &OpcodeInfo) -> Result<(), LineError> {
        let required = info.operand_count();
        if self.fields.operand_count() == required {
            return Ok(());
        }
        let wanted = match required {
            0 => "no operands",
            1 => "one operand",
            _ => "two operands",
        };
        Err(self.syntax_error(
            ErrorKind::WrongOperandCount,
            format!(
                "The {} instruction requires {}, but you provided {}.",
                info.mnemonic,
                wanted,
                self.provided()
            ),
        ))
    }

    fn check_operand_kind(
        &self,
        info: &OpcodeInfo,
        slot: Slot,
        kind: OperandKind,
        text: &str,
    ) -> Result<(), LineError> {
        let reason = match kind {
            OperandKind::Register if !operand::is_register(text) => format!(
                "A {} instruction requires the {} operand be a register (R0-R7), but you provided {}",
                info.mnemonic,
                slot.ordinal(),
                text
            ),
            OperandKind::Number if !operand::is_number(text) => format!(
                "A {} instruction requires the {} operand be a label or hex value (like $01FF), but you provided {}",
                info.mnemonic,
                slot.ordinal(),
                text
            ),
            OperandKind::Number if operand::is_register(text) => format!(
                "A {} statement requires the {} operand not be a register, but you provided {}",
                info.mnemonic,
                slot.ordinal(),
                text
            ),
            _ => return Ok(()),
        };
        Err(self.syntax_error(ErrorKind::WrongOperandKind, reason))
    }

    fn check_directive(&self, directive: Directive) -> Result<(), LineError> {
        let name = directive.name();
        let shape_error = |reason: String| self.syntax_error(ErrorKind::InvalidPseudoOperandShape, reason);
        let require_hex = |text: &str| {
            if operand::is_hex_literal(text) {
                Ok(())
            } else {
                Err(shape_error(format!(
                    "A {} pseudo-operation requires the operand be a hex value (like $01FF), but you provided {}",
                    name, text
                )))
            }
        };

        match directive {
            Directive::Equ if self.fields.label.is_none() => {
                return Err(shape_error(format!(
                    "A {} pseudo-operation requires a label.  You provided none.",
                    name
                )));
            }
            Directive::Org => {
                if let Some(label) = &self.fields.label {
                    return Err(shape_error(format!(
                        "A {} pseudo-operation is not allowed to have a label.  You provided one ({}).",
                        name, label
                    )));
                }
            }
            _ => {}
        }

        if self.fields.operand2.is_some() {
            let wanted = match directive {
                Directive::Dw => "zero or one operands",
                _ => "a single operand",
            };
            return Err(shape_error(format!(
                "A {} pseudo-operation requires {}, but you provided {}",
                name,
                wanted,
                self.provided()
            )));
        }
        match (&self.fields.operand1, directive) {
            (Some(text), _) => require_hex(text),
            (None, Directive::Dw) => Ok(()),
            (None, _) => Err(shape_error(format!(
                "A {} pseudo-operation requires one operand, but you provided none.",
                name
            ))),
        }
    }

    fn check_address(&self) -> Result<(), LineError> {
        if self.fields.label.is_none() && self.fields.opcode.is_none() {
            return Ok(());
        }
        if matches!(self.op, Some(Op::Directive(Directive::Org | Directive::Equ))) {
            return Ok(());
        }
        if self.address.is_none() {
            return Err(self.syntax_error(
                ErrorKind::AddressNotInitialized,
                "You must use .ORG to initialize a memory section before any line with a label or opcode",
            ));
        }
        Ok(())
    }

    /// Value of the line's hex operand; only called after the operand was validated.
    fn literal_operand(&self) -> Result<Option<u16>, LineError> {
        self.fields
            .operand1
            .as_deref()
            .map(NumberParser::parse)
            .transpose()
            .map_err(|e| self.syntax_error(ErrorKind::InvalidPseudoOperandShape, e))
    }

    fn compute_next_address(&self) -> Option<u16> {
        if let Some(Op::Directive(Directive::Org)) = self.op {
            return self.literal_operand().ok().flatten();
        }
        let addr = self.address?;
        let size = match self.op {
            None | Some(Op::Directive(Directive::Equ | Directive::Org)) => 0,
            Some(Op::Directive(Directive::Dw)) => 1,
            Some(Op::Instruction(info)) => info.word_count(),
        };
        Some(addr.wrapping_add(size))
    }

    // ===== Pass 2 =====

    /// Produce the machine words for this line (pass 2).
    pub fn assemble(&mut self, symbols: &SymbolTable) -> Result<(), LineError> {
        match self.op {
            None | Some(Op::Directive(Directive::Org | Directive::Equ)) => {}
            Some(Op::Directive(Directive::Dw)) => {
                self.word1 = Some(self.literal_operand()?.unwrap_or(0));
            }
            Some(Op::Instruction(info)) => {
                let word = (info.encoding << 6)
                    | (self.field_bits(&info, info.field1)? << 3)
                    | self.field_bits(&info, info.field2)?;
                self.word1 = Some(word);
                if let Some(slot) = info.long_word {
                    self.word2 = Some(self.resolve_operand(slot, symbols)?);
                }
            }
        }
        Ok(())
    }

    fn field_bits(&self, info: &OpcodeInfo, field: Field) -> Result<u16, LineError> {
        let slot = match field {
            Field::Zero => return Ok(0),
            Field::Operand(slot) => slot,
        };
        self.operand(slot)
            .and_then(operand::register_index)
            .ok_or_else(|| {
                self.syntax_error(
                    ErrorKind::WrongOperandKind,
                    format!("A {} instruction requires the {} operand be a register (R0-R7)", info.mnemonic, slot.ordinal()),
                )
            })
    }

    fn resolve_operand(&self, slot: Slot, symbols: &SymbolTable) -> Result<u16, LineError> {
        let text = self.operand(slot).ok_or_else(|| {
            self.syntax_error(ErrorKind::WrongOperandCount, format!("Missing {} operand", slot.ordinal()))
        })?;
        match operand::number_value(text) {
            Value::Literal(v) => Ok(v),
            Value::Label(name) => symbols.resolve(name, self.line_number),
        }
    }

    // ===== Accessors =====

    pub fn line_number(&self) -> usize {
        self.line_number
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn label(&self) -> Option<&str> {
        self.fields.label.as_deref()
    }

    pub fn opcode(&self) -> Option<&str> {
        self.fields.opcode.as_deref()
    }

    pub fn operand1(&self) -> Option<&str> {
        self.fields.operand1.as_deref()
    }

    pub fn operand2(&self) -> Option<&str> {
        self.fields.operand2.as_deref()
    }

    pub fn operand(&self, slot: Slot) -> Option<&str> {
        match slot {
            Slot::First => self.operand1(),
            Slot::Second => self.operand2(),
        }
    }

    pub fn op(&self) -> Option<Op> {
        self.op
    }

    pub fn is_pseudo_operation(&self) -> bool {
        matches!(self.op, Some(Op::Directive(_)))
    }

    /// Operand that supplied the second word of a long instruction
    pub fn long_word_operand(&self) -> Option<&str> {
        match self.op {
            Some(Op::Instruction(info)) => info.long_word.and_then(|slot| self.operand(slot)),
            _ => None,
        }
    }

    pub fn address(&self) -> Option<u16> {
        self.address
    }

    pub fn next_address(&self) -> Option<u16> {
        self.next_address
    }

    pub fn word1(&self) -> Option<u16> {
        self.word1
    }

    pub fn word2(&self) -> Option<u16> {
        self.word2
    }

    /// `(address, word)` pairs this line occupies, in memory order.
    pub fn words(&self) -> Vec<(u16, u16)> {
        let Some(addr) = self.address else {
            return Vec::new();
        };
        let mut out = Vec::with_capacity(2);
        if let Some(w) = self.word1 {
            out.push((addr, w));
        }
        if let Some(w) = self.word2 {
            out.push((addr.wrapping_add(1), w));
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(text: &str, addr: Option<u16>) -> Result<(SourceLine, SymbolTable), LineError> {
        let isa = InstructionSet::new();
        let mut symbols = SymbolTable::new();
        let line = SourceLine::new(text, 1, addr, &isa, &mut symbols)?;
        Ok((line, symbols))
    }

    fn kind_of(text: &str, addr: Option<u16>) -> ErrorKind {
        classify(text, addr).unwrap_err().kind
    }

    #[test]
    fn test_org_without_address() {
        let (line, _) = classify(" .ORG $1200", None).unwrap();
        assert!(line.is_pseudo_operation());
        assert_eq!(line.address(), None);
        assert_eq!(line.next_address(), Some(0x1200));
    }

    #[test]
    fn test_blank_before_org_keeps_cursor_unset() {
        let (line, _) = classify("   ", None).unwrap();
        assert_eq!(line.next_address(), None);
        let (line, _) = classify("  ; comment", None).unwrap();
        assert_eq!(line.next_address(), None);
    }

    #[test]
    fn test_label_is_declared_at_current_address() {
        let (line, symbols) = classify("LOOP ADD R1, R2", Some(0x1200)).unwrap();
        assert_eq!(line.label(), Some("LOOP"));
        assert_eq!(symbols.get("LOOP"), Some(0x1200));
        assert_eq!(line.next_address(), Some(0x1201));
    }

    #[test]
    fn test_encode_add() {
        let (mut line, symbols) = classify("LOOP ADD R1, R2", Some(0x1200)).unwrap();
        line.assemble(&symbols).unwrap();
        assert_eq!(line.word1(), Some(0x0E0A));
        assert_eq!(line.word2(), None);
        assert_eq!(line.words(), vec![(0x1200, 0x0E0A)]);
    }

    #[test]
    fn test_encode_long_formats() {
        let (mut line, symbols) = classify("    LDI R4,$1200", Some(0x0100)).unwrap();
        line.assemble(&symbols).unwrap();
        assert_eq!(line.word1(), Some(0x0C24));
        assert_eq!(line.word2(), Some(0x1200));
        assert_eq!(line.next_address(), Some(0x0102));
        assert_eq!(line.long_word_operand(), Some("$1200"));

        let (mut line, symbols) = classify("    STA $1300,R3", Some(0x0100)).unwrap();
        line.assemble(&symbols).unwrap();
        assert_eq!(line.word1(), Some(0x061B));
        assert_eq!(line.word2(), Some(0x1300));

        let (mut line, symbols) = classify("    CMI R0\t,$1987", Some(0x0100)).unwrap();
        line.assemble(&symbols).unwrap();
        assert_eq!(line.word1(), Some(0x4400));
        assert_eq!(line.word2(), Some(0x1987));
    }

    #[test]
    fn test_encode_single_register_and_no_operand() {
        let (mut line, symbols) = classify("    incr r5", Some(0)).unwrap();
        line.assemble(&symbols).unwrap();
        assert_eq!(line.word1(), Some(0x142D));

        let (mut line, symbols) = classify("    STOP", Some(0)).unwrap();
        line.assemble(&symbols).unwrap();
        assert_eq!(line.word1(), Some(0x3000));
    }

    #[test]
    fn test_branch_resolves_label() {
        let isa = InstructionSet::new();
        let mut symbols = SymbolTable::new();
        let mut line = SourceLine::new("    BRA DONE", 4, Some(0x1203), &isa, &mut symbols).unwrap();
        let err = line.assemble(&symbols).unwrap_err();
        assert_eq!(err.kind, ErrorKind::UndefinedLabel);
        assert_eq!(err.line, 4);

        symbols.declare("DONE", 0x1207, 9).unwrap();
        line.assemble(&symbols).unwrap();
        assert_eq!(line.word1(), Some(0x2800));
        assert_eq!(line.word2(), Some(0x1207));
    }

    #[test]
    fn test_dw() {
        let (mut line, symbols) = classify("VALUE .DW $00FF", Some(0x2000)).unwrap();
        line.assemble(&symbols).unwrap();
        assert_eq!(line.word1(), Some(0x00FF));
        assert_eq!(line.next_address(), Some(0x2001));
        assert_eq!(symbols.get("VALUE"), Some(0x2000));

        let (mut line, symbols) = classify("       .DW", Some(0x2000)).unwrap();
        line.assemble(&symbols).unwrap();
        assert_eq!(line.word1(), Some(0));
    }

    #[test]
    fn test_equ_label_takes_current_address() {
        let (mut line, symbols) = classify("LIM .EQU $0040", Some(0x1000)).unwrap();
        assert_eq!(symbols.get("LIM"), Some(0x1000));
        assert_eq!(line.next_address(), Some(0x1000));
        line.assemble(&symbols).unwrap();
        assert_eq!(line.words(), Vec::new());

        let (line, symbols) = classify("LIM .EQU $0040", None).unwrap();
        assert!(symbols.is_empty());
        assert_eq!(line.next_address(), None);
    }

    #[test]
    fn test_address_not_initialized() {
        assert_eq!(kind_of("    ADD R1,R2", None), ErrorKind::AddressNotInitialized);
        assert_eq!(kind_of("START", None), ErrorKind::AddressNotInitialized);
        assert_eq!(kind_of("   .DW $0001", None), ErrorKind::AddressNotInitialized);
    }

    #[test]
    fn test_parse_error() {
        let err = classify("Label  PUSH Operand , Operand2 ExtraField", Some(0)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::Parse);
        assert!(err.to_string().starts_with("Parse Error on line 1:"));
    }

    #[test]
    fn test_bad_fields() {
        assert_eq!(kind_of("L:abel STOP", Some(0)), ErrorKind::InvalidLabel);
        assert_eq!(kind_of("Label  LDA3 Operand1 , Operand2", Some(0)), ErrorKind::InvalidOpcode);
        assert_eq!(kind_of("Label  ORG. Operand1 , Operand2", Some(0)), ErrorKind::InvalidOpcode);
        assert_eq!(kind_of("    .BYTE $01", Some(0)), ErrorKind::InvalidOpcode);
        assert_eq!(kind_of("Label  POP AF$00 , Operand2", Some(0)), ErrorKind::WrongOperandCount);
        assert_eq!(kind_of("Label  POP AF$00", Some(0)), ErrorKind::WrongOperandKind);
        assert_eq!(kind_of("Label  BRA $AG99", Some(0)), ErrorKind::WrongOperandKind);
    }

    #[test]
    fn test_operand_counts() {
        assert_eq!(kind_of("    RTN R1", Some(0)), ErrorKind::WrongOperandCount);
        assert_eq!(kind_of("    PUSH", Some(0)), ErrorKind::WrongOperandCount);
        assert_eq!(kind_of("    PUSH R1,R2", Some(0)), ErrorKind::WrongOperandCount);
        assert_eq!(kind_of("    ADD R1", Some(0)), ErrorKind::WrongOperandCount);
        assert_eq!(kind_of("    ADD", Some(0)), ErrorKind::WrongOperandCount);

        let err = classify("    ADD R1", Some(0)).unwrap_err();
        assert_eq!(
            err.reason,
            "The ADD instruction requires two operands, but you provided one (R1)."
        );
    }

    #[test]
    fn test_operand_kinds() {
        for bad in ["    ADD $0001,R2", "    ADD R1,$0002", "    ADD LOOP,R2", "    ADD R1,LOOP"] {
            assert_eq!(kind_of(bad, Some(0)), ErrorKind::WrongOperandKind, "{}", bad);
        }
        assert_eq!(kind_of("    BRA R1", Some(0)), ErrorKind::WrongOperandKind);
        assert_eq!(kind_of("    LDI R1,R2", Some(0)), ErrorKind::WrongOperandKind);
        assert_eq!(kind_of("    ASHR R8", Some(0)), ErrorKind::WrongOperandKind);
        assert!(classify("    BRA LOOP", Some(0)).is_ok());
        assert!(classify("    BRA $0", Some(0)).is_ok());
    }

    #[test]
    fn test_pseudo_operation_shapes() {
        assert_eq!(kind_of("    .EQU $0001", Some(0)), ErrorKind::InvalidPseudoOperandShape);
        assert_eq!(kind_of("X   .EQU", Some(0)), ErrorKind::InvalidPseudoOperandShape);
        assert_eq!(kind_of("X   .EQU $1,$2", Some(0)), ErrorKind::InvalidPseudoOperandShape);
        assert_eq!(kind_of("X   .EQU OTHER", Some(0)), ErrorKind::InvalidPseudoOperandShape);
        assert_eq!(kind_of("X   .DW $1,$2", Some(0)), ErrorKind::InvalidPseudoOperandShape);
        assert_eq!(kind_of("X   .DW LABEL", Some(0)), ErrorKind::InvalidPseudoOperandShape);
        assert_eq!(kind_of("X   .ORG $1000", Some(0)), ErrorKind::InvalidPseudoOperandShape);
        assert_eq!(kind_of("    .ORG", None), ErrorKind::InvalidPseudoOperandShape);
        assert_eq!(kind_of("    .ORG 1000", None), ErrorKind::InvalidPseudoOperandShape);
        assert_eq!(kind_of("    .ORG $1,$2", None), ErrorKind::InvalidPseudoOperandShape);
    }

    #[test]
    fn test_duplicate_label_on_second_line() {
        let isa = InstructionSet::new();
        let mut symbols = SymbolTable::new();
        SourceLine::new("HERE STOP", 1, Some(0x10), &isa, &mut symbols).unwrap();
        let err = SourceLine::new("HERE STOP", 2, Some(0x11), &isa, &mut symbols).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DuplicateLabel);
        assert_eq!(err.line, 2);
        assert_eq!(symbols.get("HERE"), Some(0x10));
    }

    #[test]
    fn test_rejected_line_still_claims_label() {
        let isa = InstructionSet::new();
        let mut symbols = SymbolTable::new();
        let err = SourceLine::new("X BADOP", 2, Some(0x1000), &isa, &mut symbols).unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidOpcode);
        assert_eq!(symbols.get("X"), Some(0x1000));

        let err = SourceLine::new("X STOP", 3, Some(0x1000), &isa, &mut symbols).unwrap_err();
        assert_eq!(err.kind, ErrorKind::DuplicateLabel);
    }

    #[test]
    fn test_line_keeps_source_text() {
        let (line, _) = classify("TOP  STOP   ; halt", Some(0)).unwrap();
        assert_eq!(line.line_number(), 1);
        assert_eq!(line.text(), "TOP  STOP   ; halt");
        assert_eq!(line.label(), Some("TOP"));
    }

    #[test]
    fn test_cursor_wraps() {
        let (line, _) = classify("    LDI R1,$0001", Some(0xFFFF)).unwrap();
        assert_eq!(line.next_address(), Some(0x0001));
    }
}
