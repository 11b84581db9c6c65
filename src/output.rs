use std::path::Path;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::Result;
use crate::types::{AlertRecord, DealRecord, RunSummary};

#[derive(Debug, Serialize)]
pub struct AlertsDocument {
    pub generated_at: DateTime<Utc>,
    pub alerts: Vec<AlertRecord>,
}

#[derive(Debug, Serialize)]
pub struct DealsDocument {
    pub generated_at: DateTime<Utc>,
    pub deals: Vec<DealRecord>,
}

/// Writes a JSON document atomically: serialize to a sibling `.tmp` file,
/// then rename over the destination so readers never see a partial file.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let tmp = path.with_extension("tmp");
    let body = serde_json::to_vec_pretty(value)?;
    std::fs::write(&tmp, body)?;
    std::fs::rename(&tmp, path)?;
    Ok(())
}

/// Writes the three output documents the engine produces per run.
pub fn write_outputs(
    out_dir: &Path,
    alerts: Vec<AlertRecord>,
    deals: Vec<DealRecord>,
    summary: &RunSummary,
) -> Result<()> {
    std::fs::create_dir_all(out_dir)?;
    let generated_at = summary.generated_at;
    write_json_atomic(&out_dir.join("alerts.json"), &AlertsDocument { generated_at, alerts })?;
    write_json_atomic(&out_dir.join("top_deals.json"), &DealsDocument { generated_at, deals })?;
    write_json_atomic(&out_dir.join("last_run.json"), summary)?;
    Ok(())
}
