use std::path::PathBuf;

use anyhow::Context;
use polars::prelude::DataFrame;

use crate::Result;
use crate::dataset::{self, PriceHistory};
use crate::features;
use crate::logging::log_event;

/// One company in the batch: where its history lives and where the enriched
/// table goes. The company name is caller-supplied metadata, not a column.
#[derive(Debug, Clone)]
pub struct EntitySpec {
    pub name: String,
    pub input: PathBuf,
    pub output: PathBuf,
}

impl EntitySpec {
    pub fn new(
        name: impl Into<String>,
        input: impl Into<PathBuf>,
        output: impl Into<PathBuf>,
    ) -> Self {
        Self {
            name: name.into(),
            input: input.into(),
            output: output.into(),
        }
    }
}

/// Load, enrich, and write one company's table. Returns the enriched frame
/// so callers can inspect it without re-reading the output file.
pub fn enrich_file(entity: &EntitySpec) -> Result<DataFrame> {
    let history = PriceHistory::from_csv(&entity.input)?;
    let frame = history.collect()?;
    let mut enriched = features::enrich(&frame)?;
    dataset::write_csv(&mut enriched, &entity.output)?;

    log_event(
        file!(),
        "Pipeline",
        "enrich_file",
        "pipeline.entity",
        line!(),
        &format!(
            "Enriched {} ({} rows) into {}",
            entity.input.display(),
            enriched.height(),
            entity.output.display()
        ),
        None,
        Some(&entity.name),
    );

    Ok(enriched)
}

/// Run the batch in order. Companies are independent of each other, but the
/// run stops at the first fatal error and leaves no partial output for the
/// failing company.
pub fn enrich_universe(entities: &[EntitySpec]) -> Result<()> {
    for entity in entities {
        enrich_file(entity).with_context(|| format!("processing entity {}", entity.name))?;
    }

    log_event(
        file!(),
        "Pipeline",
        "enrich_universe",
        "pipeline.batch",
        line!(),
        &format!("Feature enrichment complete for {} entities", entities.len()),
        None,
        None,
    );

    Ok(())
}
