//! Instruction set table: one typed record per mnemonic

use std::collections::HashMap;
use std::fmt;

/// Instruction length in 16-bit words.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Short,
    Long,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperandKind {
    Register,
    Number,
}

impl fmt::Display for OperandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperandKind::Register => write!(f, "register"),
            OperandKind::Number => write!(f, "number"),
        }
    }
}

/// Operand position on a source line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Slot {
    First,
    Second,
}

impl Slot {
    pub fn ordinal(self) -> &'static str {
        match self {
            Slot::First => "first",
            Slot::Second => "second",
        }
    }
}

/// Contents of a 3-bit register field in the first word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Zero,
    Operand(Slot),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpcodeInfo {
    pub mnemonic: Mnemonic,
    pub format: Format,
    pub field1: Field,
    pub field2: Field,
    /// Operand that fills the second word; `Some` exactly for long formats.
    pub long_word: Option<Slot>,
    pub operands: &'static [OperandKind],
    /// 10-bit opcode prefix of the first word.
    pub encoding: u16,
}

impl OpcodeInfo {
    pub fn word_count(&self) -> u16 {
        match self.format {
            Format::Short => 1,
            Format::Long => 2,
        }
    }

    pub fn operand_count(&self) -> usize {
        self.operands.len()
    }

    pub fn operand_kind(&self, slot: Slot) -> Option<OperandKind> {
        let idx = match slot {
            Slot::First => 0,
            Slot::Second => 1,
        };
        self.operands.get(idx).copied()
    }

    /// The opcode prefix as the 10-character binary string used in the ISA manual.
    pub fn encoding_bits(&self) -> String {
        format!("{:010b}", self.encoding)
    }
}

macro_rules! mnemonics {
    ($($variant:ident => $name:literal),* $(,)?) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Mnemonic {
            $($variant),*
        }

        impl Mnemonic {
            pub const ALL: &'static [Mnemonic] = &[$(Mnemonic::$variant),*];

            pub fn name(self) -> &'static str {
                match self {
                    $(Mnemonic::$variant => $name),*
                }
            }
        }
    };
}

mnemonics! {
    Add => "ADD", Addsp => "ADDSP", And => "AND", Ashr => "ASHR",
    Bra => "BRA", Brc => "BRC", Brn => "BRN", Brv => "BRV", Brz => "BRZ",
    Cmi => "CMI", Cmr => "CMR", Decr => "DECR", Incr => "INCR", Jsr => "JSR",
    Lda => "LDA", Ldi => "LDI", Ldr => "LDR", Ldsf => "LDSF", Ldsp => "LDSP",
    Lshl => "LSHL", Lshr => "LSHR", Mov => "MOV", Neg => "NEG", Not => "NOT",
    Or => "OR", Pop => "POP", Push => "PUSH", Rol => "ROL", Rtn => "RTN",
    Sta => "STA", Stop => "STOP", Str => "STR", Stsf => "STSF", Stsp => "STSP",
    Sub => "SUB", Xor => "XOR",
}

impl fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

const NONE: &[OperandKind] = &[];
const REG: &[OperandKind] = &[OperandKind::Register];
const NUM: &[OperandKind] = &[OperandKind::Number];
const REG_REG: &[OperandKind] = &[OperandKind::Register, OperandKind::Register];
const REG_NUM: &[OperandKind] = &[OperandKind::Register, OperandKind::Number];
const NUM_REG: &[OperandKind] = &[OperandKind::Number, OperandKind::Register];

const OP1: Field = Field::Operand(Slot::First);
const OP2: Field = Field::Operand(Slot::Second);

impl Mnemonic {
    /// The bit layout record; the match keeps the table exhaustive over `Mnemonic`.
    pub fn info(self) -> OpcodeInfo {
        use Mnemonic::*;
        let (format, field1, field2, long_word, operands, encoding) = match self {
            // Two registers in one word
            Add => (Format::Short, OP1, OP2, None, REG_REG, 0b0000111000),
            And => (Format::Short, OP1, OP2, None, REG_REG, 0b0001101000),
            Cmr => (Format::Short, OP1, OP2, None, REG_REG, 0b0100011000),
            Ldr => (Format::Short, OP1, OP2, None, REG_REG, 0b0000100000),
            Mov => (Format::Short, OP1, OP2, None, REG_REG, 0b0011101000),
            Or => (Format::Short, OP1, OP2, None, REG_REG, 0b0001110000),
            Str => (Format::Short, OP1, OP2, None, REG_REG, 0b0000101000),
            Sub => (Format::Short, OP1, OP2, None, REG_REG, 0b0001000000),
            Xor => (Format::Short, OP1, OP2, None, REG_REG, 0b0001111000),

            // One register, repeated in both fields
            Ashr => (Format::Short, OP1, OP1, None, REG, 0b0010011000),
            Decr => (Format::Short, OP1, OP1, None, REG, 0b0001011000),
            Incr => (Format::Short, OP1, OP1, None, REG, 0b0001010000),
            Ldsp => (Format::Short, OP1, OP1, None, REG, 0b0011110000),
            Lshl => (Format::Short, OP1, OP1, None, REG, 0b0010000000),
            Lshr => (Format::Short, OP1, OP1, None, REG, 0b0010010000),
            Neg => (Format::Short, OP1, OP1, None, REG, 0b0001001000),
            Not => (Format::Short, OP1, OP1, None, REG, 0b0001100000),
            Pop => (Format::Short, OP1, OP1, None, REG, 0b0011010000),
            Push => (Format::Short, OP1, OP1, None, REG, 0b0011001000),
            Rol => (Format::Short, OP1, OP1, None, REG, 0b0010001000),
            Stsp => (Format::Short, OP1, OP1, None, REG, 0b0011111000),

            Rtn => (Format::Short, Field::Zero, Field::Zero, None, NONE, 0b0011100000),
            Stop => (Format::Short, Field::Zero, Field::Zero, None, NONE, 0b0011000000),

            // Address or immediate in the second word
            Addsp => (Format::Long, Field::Zero, Field::Zero, Some(Slot::First), NUM, 0b0000111100),
            Bra => (Format::Long, Field::Zero, Field::Zero, Some(Slot::First), NUM, 0b0010100000),
            Brc => (Format::Long, Field::Zero, Field::Zero, Some(Slot::First), NUM, 0b0100100000),
            Brn => (Format::Long, Field::Zero, Field::Zero, Some(Slot::First), NUM, 0b0010110000),
            Brv => (Format::Long, Field::Zero, Field::Zero, Some(Slot::First), NUM, 0b0010111000),
            Brz => (Format::Long, Field::Zero, Field::Zero, Some(Slot::First), NUM, 0b0010101000),
            Jsr => (Format::Long, Field::Zero, Field::Zero, Some(Slot::First), NUM, 0b0011011000),
            Cmi => (Format::Long, Field::Zero, Field::Zero, Some(Slot::Second), REG_NUM, 0b0100010000),
            Lda => (Format::Long, OP1, OP1, Some(Slot::Second), REG_NUM, 0b0000010000),
            Ldi => (Format::Long, OP1, OP1, Some(Slot::Second), REG_NUM, 0b0000110000),
            Ldsf => (Format::Long, OP1, OP1, Some(Slot::Second), REG_NUM, 0b0100000000),
            Stsf => (Format::Long, OP1, OP1, Some(Slot::Second), REG_NUM, 0b0100001000),
            Sta => (Format::Long, OP2, OP2, Some(Slot::First), NUM_REG, 0b0000011000),
        };
        OpcodeInfo { mnemonic: self, format, field1, field2, long_word, operands, encoding }
    }
}

/// Pseudo-operations handled outside the bit-encoding table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    Org,
    Dw,
    Equ,
}

impl Directive {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            ".ORG" => Some(Directive::Org),
            ".DW" => Some(Directive::Dw),
            ".EQU" => Some(Directive::Equ),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Directive::Org => ".ORG",
            Directive::Dw => ".DW",
            Directive::Equ => ".EQU",
        }
    }
}

/// Lookup facade over the mnemonic records.
///
/// Every query returns `None` for an unknown mnemonic so callers can tell a
/// bad mnemonic apart from a bad operand.
pub struct InstructionSet {
    opcodes: HashMap<&'static str, OpcodeInfo>,
}

impl InstructionSet {
    pub fn new() -> Self {
        let opcodes = Mnemonic::ALL
            .iter()
            .map(|m| (m.name(), m.info()))
            .collect();
        Self { opcodes }
    }

    pub fn get(&self, mnemonic: &str) -> Option<&OpcodeInfo> {
        self.opcodes.get(mnemonic)
    }

    pub fn is_valid(&self, mnemonic: &str) -> bool {
        self.opcodes.contains_key(mnemonic)
    }

    pub fn operand_count(&self, mnemonic: &str) -> Option<usize> {
        self.get(mnemonic).map(OpcodeInfo::operand_count)
    }

    pub fn operand_kind(&self, mnemonic: &str, slot: Slot) -> Option<OperandKind> {
        self.get(mnemonic).and_then(|info| info.operand_kind(slot))
    }

    pub fn word_count(&self, mnemonic: &str) -> Option<u16> {
        self.get(mnemonic).map(OpcodeInfo::word_count)
    }

    pub fn field_layout(&self, mnemonic: &str) -> Option<(Field, Field)> {
        self.get(mnemonic).map(|info| (info.field1, info.field2))
    }

    pub fn long_word_source(&self, mnemonic: &str) -> Option<Slot> {
        self.get(mnemonic).and_then(|info| info.long_word)
    }

    pub fn opcode_bits(&self, mnemonic: &str) -> Option<u16> {
        self.get(mnemonic).map(|info| info.encoding)
    }

    pub fn len(&self) -> usize {
        self.opcodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.opcodes.is_empty()
    }
}

impl Default for InstructionSet {
    fn default() -> Self {
        Self::new()
    }
}
