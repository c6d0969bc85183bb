//! Error types for the assembler

use thiserror::Error;

/// What went wrong on a single source line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The line could not be split into label/opcode/operand fields.
    Parse,
    InvalidLabel,
    InvalidOpcode,
    WrongOperandCount,
    WrongOperandKind,
    InvalidPseudoOperandShape,
    AddressNotInitialized,
    DuplicateLabel,
    UndefinedLabel,
}

impl ErrorKind {
    /// The user-facing family this kind is reported under.
    pub fn category(self) -> &'static str {
        match self {
            ErrorKind::Parse => "Parse",
            _ => "Syntax",
        }
    }

    pub fn is_parse(self) -> bool {
        self == ErrorKind::Parse
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{} Error on line {}:  {}", .kind.category(), .line, .reason)]
pub struct LineError {
    pub line: usize,
    pub kind: ErrorKind,
    pub reason: String,
}

impl LineError {
    pub fn parse(line: usize, reason: impl Into<String>) -> Self {
        Self { line, kind: ErrorKind::Parse, reason: reason.into() }
    }

    pub fn syntax(line: usize, kind: ErrorKind, reason: impl Into<String>) -> Self {
        debug_assert!(!kind.is_parse());
        Self { line, kind, reason: reason.into() }
    }
}

#[derive(Debug, Error)]
pub enum AsmError {
    /// One or more lines failed; `aborted` is set when the error cap was exceeded.
    #[error("assembly failed with {} error(s)", .errors.len())]
    Rejected { errors: Vec<LineError>, aborted: bool },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl AsmError {
    pub fn line_errors(&self) -> &[LineError] {
        match self {
            AsmError::Rejected { errors, .. } => errors,
            AsmError::Io(_) => &[],
        }
    }

    /// Process exit status for this failure: the number of line errors.
    pub fn exit_code(&self) -> i32 {
        match self {
            AsmError::Rejected { errors, .. } => errors.len().max(1) as i32,
            AsmError::Io(_) => 1,
        }
    }
}
