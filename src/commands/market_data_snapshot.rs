use anyhow::{anyhow, Result};
use std::path::Path;

pub fn ensure_market_data_file(path: &Path) -> Result<()> {
    if path.is_file() {
        return Ok(());
    }

    Err(anyhow!(
        "Market data snapshot not found at {}. Generate it with `export-market-data` before running this command.",
        path.display()
    ))
}
