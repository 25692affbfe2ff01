use crate::context::AppContext;
use crate::universe::InstrumentUniverse;
use anyhow::Result;
use log::info;
use std::path::Path;

pub fn run(app: &AppContext, universe: &InstrumentUniverse, output_path: &Path) -> Result<()> {
    info!(
        "Generating market data snapshot for {} instruments at {}",
        universe.len(),
        output_path.display()
    );

    let market_data = app.market_data(None, Some(universe))?;
    market_data.save_to_file(output_path)?;
    info!(
        "Market data snapshot successfully written to {}",
        output_path.display()
    );

    Ok(())
}
