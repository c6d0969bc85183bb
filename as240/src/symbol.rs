//! Symbol table for labels

use std::collections::BTreeMap;

use crate::error::{ErrorKind, LineError};

/// Labels wider than this are cut short when the table is rendered.
pub const MAX_SHOWN_LABEL: usize = 40;
const MIN_LABEL_COLUMN: usize = 7;

/// Global label scope for one assembly. Each name is written once.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SymbolTable {
    labels: BTreeMap<String, u16>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self { labels: BTreeMap::new() }
    }

    /// Forget every label.
    pub fn clear(&mut self) {
        self.labels.clear();
    }

    /// Fails with `DuplicateLabel` if `name` already has an address.
    pub fn declare(&mut self, name: &str, addr: u16, line: usize) -> Result<(), LineError> {
        if self.labels.contains_key(name) {
            return Err(LineError::syntax(
                line,
                ErrorKind::DuplicateLabel,
                format!(
                    "Duplicate label ({}).  Label has already been declared on a previous line.",
                    name
                ),
            ));
        }
        self.labels.insert(name.to_string(), addr);
        Ok(())
    }

    pub fn resolve(&self, name: &str, line: usize) -> Result<u16, LineError> {
        self.get(name).ok_or_else(|| {
            LineError::syntax(
                line,
                ErrorKind::UndefinedLabel,
                format!("The label {} has not been defined anywhere.", name),
            )
        })
    }

    pub fn get(&self, name: &str) -> Option<u16> {
        self.labels.get(name).copied()
    }

    pub fn labels(&self) -> &BTreeMap<String, u16> {
        &self.labels
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Text form of the table, labels in lexicographic order.
    pub fn render(&self) -> String {
        if self.labels.is_empty() {
            return "Symbol table is empty".to_string();
        }

        let longest = self.labels.keys().map(|k| k.chars().count()).max().unwrap_or(0);
        let truncated = longest > MAX_SHOWN_LABEL;
        let width = longest.clamp(MIN_LABEL_COLUMN, MAX_SHOWN_LABEL);

        let mut out = String::new();
        out.push_str(&format!("{:^width$}  Address\n", "Label"));
        out.push_str(&format!("{}  -------\n", "-".repeat(width)));
        for (label, addr) in &self.labels {
            let shown: String = label.chars().take(MAX_SHOWN_LABEL).collect();
            out.push_str(&format!("{:<width$}   ${:04X}\n", shown, addr));
        }
        if truncated {
            out.push_str("Only 40 characters of long labels are shown.\n");
            out.push_str("Remaining characters are still significant.\n");
        }
        out
    }
}
