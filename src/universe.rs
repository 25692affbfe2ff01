use anyhow::{anyhow, Context, Result};
use std::collections::HashSet;
use std::fs;
use std::path::Path;

/// Ordered, duplicate-free list of instrument symbols to trade.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstrumentUniverse {
    symbols: Vec<String>,
}

impl InstrumentUniverse {
    pub fn from_symbols<I, S>(symbols: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut seen = HashSet::new();
        let symbols: Vec<String> = symbols
            .into_iter()
            .filter_map(|raw| normalize_ticker_symbol(raw.as_ref()))
            .filter(|symbol| seen.insert(symbol.clone()))
            .collect();

        if symbols.is_empty() {
            return Err(anyhow!("Instrument universe is empty"));
        }
        Ok(Self { symbols })
    }

    /// Parses symbols separated by commas or whitespace.
    pub fn parse_list(raw: &str) -> Result<Self> {
        Self::from_symbols(raw.split(|c: char| c == ',' || c.is_whitespace()))
    }

    /// Reads symbols from a text file. `#` starts a comment.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read instrument universe from {}", path.display()))?;
        let symbols: Vec<&str> = contents
            .lines()
            .map(|line| line.split('#').next().unwrap_or(""))
            .flat_map(|line| line.split(|c: char| c == ',' || c.is_whitespace()))
            .collect();
        Self::from_symbols(symbols)
            .with_context(|| format!("No symbols found in {}", path.display()))
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

    pub fn into_symbols(self) -> Vec<String> {
        self.symbols
    }
}

/// Normalizes a ticker string by trimming whitespace and uppercasing.
pub fn normalize_ticker_symbol(value: &str) -> Option<String> {
    let normalized = value.trim().to_uppercase();
    if normalized.is_empty() {
        None
    } else {
        Some(normalized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dedupes_and_keeps_first_occurrence_order() {
        let universe = InstrumentUniverse::parse_list(" twtr, GPRO aapl,TWTR ,, ").expect("universe");
        assert_eq!(universe.symbols(), &["TWTR", "GPRO", "AAPL"]);
    }

    #[test]
    fn empty_universe_is_rejected() {
        assert!(InstrumentUniverse::parse_list(" , ").is_err());
    }

    #[test]
    fn reads_file_with_comments() {
        let path = std::env::temp_dir().join(format!("daysim-universe-{}.txt", std::process::id()));
        fs::write(&path, "# index members\nMMM, AOS\nABT # healthcare\n\nmmm\n").expect("write");
        let universe = InstrumentUniverse::from_file(&path).expect("universe");
        let _ = fs::remove_file(&path);
        assert_eq!(universe.into_symbols(), vec!["MMM", "AOS", "ABT"]);
    }
}
