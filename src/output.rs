//! Serialization of the final correlation products.
//!
//! Two logical tables: "1D" (diagonal variance and radially-binned
//! correlation vectors) and "2D" (the dense bin-pair grids), plus a header
//! recording the bin grid definition. Output is single-shot batch JSON; the
//! in-memory layout mirrors the table layout exactly.

use crate::binning::{Correlation1d, Correlation2d};
use crate::error::Error;
use crate::grid::SpectralGrid;
use log::info;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// The bin grid definition recorded alongside the tables.
#[derive(Debug, Serialize)]
pub struct GridHeader {
    /// minimum log10 lambda [log Angstrom]
    #[serde(rename = "LLMIN")]
    pub log_lambda_min: f64,
    /// maximum log10 lambda [log Angstrom]
    #[serde(rename = "LLMAX")]
    pub log_lambda_max: f64,
    /// log-lambda bin size [log Angstrom]
    #[serde(rename = "DLL")]
    pub delta_log_lambda: f64,
}

/// The complete result of one run, ready to be written once and discarded.
#[derive(Debug, Serialize)]
pub struct CorrelationOutput {
    pub header: GridHeader,
    #[serde(rename = "1D")]
    pub table_1d: Correlation1d,
    #[serde(rename = "2D")]
    pub table_2d: Correlation2d,
}

impl CorrelationOutput {
    pub fn new(grid: &SpectralGrid, table_1d: Correlation1d, table_2d: Correlation2d) -> Self {
        Self {
            header: GridHeader {
                log_lambda_min: grid.log_lambda_min(),
                log_lambda_max: grid.log_lambda_max(),
                delta_log_lambda: grid.delta_log_lambda(),
            },
            table_1d,
            table_2d,
        }
    }

    /// Write both tables and the header to a JSON file.
    pub fn write_json<P: AsRef<Path>>(&self, path: P) -> Result<(), Error> {
        let file = File::create(path.as_ref())?;
        serde_json::to_writer(BufWriter::new(file), self)?;
        info!("wrote correlation output to {}", path.as_ref().display());
        Ok(())
    }
}
