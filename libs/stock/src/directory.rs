use std::{fmt, path::Path};

use serde_json::{Map, Value};
use tracing::info;

use crate::{error::DirectoryError, watch_list::SENTINEL_SYMBOL};

/// Which upstream feed serves an instrument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarketClass {
    Domestic,
    IndexGlobal,
}

impl fmt::Display for MarketClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MarketClass::Domestic => f.write_str("domestic"),
            MarketClass::IndexGlobal => f.write_str("index_global"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instrument {
    pub name: String,
    pub symbol: String,
    pub market: MarketClass,
}

/// Read-only name/symbol lookup over the two market directories.
///
/// Lookups walk the domestic entries first, then the index/global entries,
/// each in definition-file order. The first entry whose display name or
/// symbol equals the token wins.
#[derive(Debug, Clone, Default)]
pub struct InstrumentDirectory {
    domestic: Vec<Instrument>,
    index_global: Vec<Instrument>,
}

impl InstrumentDirectory {
    /// Build from `(display name, symbol)` pairs, keeping the given order.
    pub fn new<D, G>(domestic: D, index_global: G) -> Self
    where
        D: IntoIterator<Item = (String, String)>,
        G: IntoIterator<Item = (String, String)>,
    {
        let build = |entries: Vec<(String, String)>, market: MarketClass| -> Vec<Instrument> {
            entries
                .into_iter()
                .map(|(name, symbol)| Instrument {
                    name,
                    symbol,
                    market,
                })
                .collect()
        };

        Self {
            domestic: build(domestic.into_iter().collect(), MarketClass::Domestic),
            index_global: build(index_global.into_iter().collect(), MarketClass::IndexGlobal),
        }
    }

    /// Parse two JSON objects of the form `{"display name": "symbol", ...}`.
    pub fn from_json_str(domestic: &str, index_global: &str) -> Result<Self, DirectoryError> {
        Ok(Self::new(
            parse_entries(domestic)?,
            parse_entries(index_global)?,
        ))
    }

    pub fn load(
        domestic_path: impl AsRef<Path>,
        index_global_path: impl AsRef<Path>,
    ) -> Result<Self, DirectoryError> {
        let domestic = read_file(domestic_path.as_ref())?;
        let index_global = read_file(index_global_path.as_ref())?;
        let directory = Self::from_json_str(&domestic, &index_global)?;

        info!(
            domestic = directory.domestic.len(),
            index_global = directory.index_global.len(),
            "loaded instrument directories"
        );

        Ok(directory)
    }

    pub fn resolve(&self, token: &str) -> Option<&Instrument> {
        self.instruments()
            .find(|instrument| instrument.name == token || instrument.symbol == token)
    }

    /// Market of a stored symbol, domestic symbols checked first.
    pub fn market_of(&self, symbol: &str) -> Option<MarketClass> {
        self.instruments()
            .find(|instrument| instrument.symbol == symbol)
            .map(|instrument| instrument.market)
    }

    pub fn instruments(&self) -> impl Iterator<Item = &Instrument> {
        self.domestic.iter().chain(self.index_global.iter())
    }

    pub fn len(&self) -> usize {
        self.domestic.len() + self.index_global.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn read_file(path: &Path) -> Result<String, DirectoryError> {
    std::fs::read_to_string(path).map_err(|source| DirectoryError::Io {
        path: path.display().to_string(),
        source,
    })
}

fn parse_entries(json: &str) -> Result<Vec<(String, String)>, DirectoryError> {
    let map: Map<String, Value> =
        serde_json::from_str(json).map_err(|e| DirectoryError::Invalid(e.to_string()))?;

    map.into_iter()
        .map(|(name, value)| match value {
            Value::String(symbol) if symbol == SENTINEL_SYMBOL => Err(DirectoryError::Invalid(
                format!("{name} uses the reserved symbol {SENTINEL_SYMBOL}"),
            )),
            Value::String(symbol) => Ok((name, symbol)),
            other => Err(DirectoryError::Invalid(format!(
                "symbol for {name} must be a string, got {other}"
            ))),
        })
        .collect()
}
