use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// Pseudo-symbol standing for "my whole watch list". Rendered with the
/// domestic market index quote, never stored.
pub const SENTINEL_SYMBOL: &str = "#001";

/// Version of the persisted record layout.
pub const RECORD_VERSION: u32 = 1;

/// Ordered, duplicate-free list of symbols a user watches.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WatchList {
    symbols: Vec<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct Record {
    version: u32,
    symbols: Vec<String>,
}

impl WatchList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, symbol: &str) -> bool {
        self.symbols.iter().any(|s| s == symbol)
    }

    /// Append a symbol. Returns true if it was newly added.
    pub fn add(&mut self, symbol: &str) -> bool {
        if self.contains(symbol) {
            return false;
        }
        self.symbols.push(symbol.to_string());
        true
    }

    /// Remove a symbol. Returns true if it existed.
    pub fn remove(&mut self, symbol: &str) -> bool {
        let before = self.symbols.len();
        self.symbols.retain(|s| s != symbol);
        self.symbols.len() != before
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn encode(&self) -> String {
        let record = Record {
            version: RECORD_VERSION,
            symbols: self.symbols.clone(),
        };
        // Serializing a struct of plain strings cannot fail.
        serde_json::to_string(&record).unwrap_or_default()
    }

    /// Parse a stored record, rejecting anything that is not a valid list.
    pub fn decode(raw: &str) -> Result<Self, StoreError> {
        let record: Record = serde_json::from_str(raw)
            .map_err(|e| StoreError::MalformedRecord(e.to_string()))?;

        if record.version != RECORD_VERSION {
            return Err(StoreError::MalformedRecord(format!(
                "unsupported record version {}",
                record.version
            )));
        }

        let mut seen = HashSet::new();
        for symbol in &record.symbols {
            if symbol.is_empty() || symbol == SENTINEL_SYMBOL {
                return Err(StoreError::MalformedRecord(format!(
                    "invalid symbol {symbol:?}"
                )));
            }
            if !seen.insert(symbol.as_str()) {
                return Err(StoreError::MalformedRecord(format!(
                    "duplicate symbol {symbol}"
                )));
            }
        }

        Ok(Self {
            symbols: record.symbols,
        })
    }
}

impl FromIterator<String> for WatchList {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut list = WatchList::new();
        for symbol in iter {
            list.add(&symbol);
        }
        list
    }
}
