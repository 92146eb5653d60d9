//! Writers for the run artifacts: the scatter image as a plain text grid,
//! a JSON summary of tally and metrics, and a TOML snapshot of the settings
//! the run actually used.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::Result;
use chrono::Utc;
use itertools::Itertools;
use ndarray::Array2;
use serde::Serialize;

use crate::result::Results;


/// Creates the output directory if it is missing.
pub fn prepare_directory(dir: &str) -> Result<()> {
    fs::create_dir_all(dir)
        .map_err(|e| anyhow::anyhow!("failed to create output directory {:?}: {}", dir, e))
}

/// Writes the deposited-energy grid as one line per detector row, values in
/// eV, space separated.
pub fn write_image(image: &Array2<f64>, dir: &str) -> Result<()> {
    let file = File::create(Path::new(dir).join("scatter_image"))?;
    let mut writer = BufWriter::new(file);
    for row in image.outer_iter() {
        writeln!(
            writer,
            "{}",
            row.iter().map(|value| format!("{:.6e}", value)).join(" ")
        )?;
    }
    Ok(())
}

/// Writes the tally and derived metrics with a creation timestamp.
pub fn write_summary(results: &Results, dir: &str) -> Result<()> {
    let file = File::create(Path::new(dir).join("summary.json"))?;
    let writer = BufWriter::new(file);
    let summary = serde_json::json!({
        "created": Utc::now().to_rfc3339(),
        "tally": results.tally,
        "params": results.params,
    });
    serde_json::to_writer_pretty(writer, &summary)?;
    Ok(())
}

/// Records the effective settings next to the artifacts they produced.
pub fn write_settings_snapshot<S: Serialize>(settings: &S, dir: &str) -> Result<()> {
    let text = toml::to_string_pretty(settings)?;
    fs::write(Path::new(dir).join("settings_used.toml"), text)?;
    Ok(())
}
