//! Info table symbol resolution

use super::{IngestError, IngestResult};
use crate::graph::UNKNOWN_KIND;
use std::collections::HashMap;
use std::io::BufRead;

/// Normalize a hex address token so `nm` and `%p` spellings compare equal
///
/// Strips an optional `0x` prefix and leading zeros and lowercases the digits.
pub fn normalize_address(token: &str) -> String {
    let digits = token
        .strip_prefix("0x")
        .or_else(|| token.strip_prefix("0X"))
        .unwrap_or(token);
    let trimmed = digits.trim_start_matches('0');
    if trimmed.is_empty() {
        "0".to_string()
    } else {
        trimmed.to_ascii_lowercase()
    }
}

/// Mapping from info table address to symbol name
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    symbols: HashMap<String, String>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse `<address> <name>` lines
    pub fn parse<R: BufRead>(reader: R) -> IngestResult<Self> {
        let mut table = Self::new();

        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            let mut fields = line.split_whitespace();
            let Some(address) = fields.next() else {
                continue;
            };
            let name = fields
                .next()
                .ok_or(IngestError::MalformedSymbol { line: i + 1 })?;
            table.insert(address, name);
        }

        tracing::debug!("Parsed symbol table with {} entries", table.len());
        Ok(table)
    }

    pub fn insert(&mut self, address: &str, name: &str) {
        self.symbols
            .insert(normalize_address(address), name.to_string());
    }

    /// Resolve an address to its symbol
    pub fn lookup(&self, address: &str) -> Option<&str> {
        self.symbols
            .get(&normalize_address(address))
            .map(String::as_str)
    }

    /// Resolve an address to a closure kind, `"???"` when unknown
    pub fn kind_of(&self, address: &str) -> &str {
        self.lookup(address).unwrap_or(UNKNOWN_KIND)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
