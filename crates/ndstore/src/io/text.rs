//! Delimited-text export.
//!
//! Rank 0 writes one value and rank 1 one row. Rank 2 writes one row per
//! index of the first dimension. Higher ranks write one row per index of all
//! but the last dimension, prefixed by those indices except the row's own.
use std::io::Write;

use anyhow::{anyhow, Context, Result};

use crate::array::NdArray;
use crate::config::TextExportConfig;

pub fn write_delimited<W: Write>(array: &NdArray, writer: W, config: &TextExportConfig) -> Result<()> {
    let delimiter = u8::try_from(config.delimiter)
        .ok()
        .filter(u8::is_ascii)
        .ok_or_else(|| anyhow!("delimiter {:?} is not a single ASCII character", config.delimiter))?;

    let mut out = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .has_headers(false)
        .flexible(true)
        .from_writer(writer);

    let fmt_value = |value: f64| match config.precision {
        Some(digits) => format!("{:.*}", digits, value),
        None => value.to_string(),
    };

    let dims = array.dims();
    let rank = dims.len();
    let row_len = dims.last().copied().unwrap_or(1);
    // leading dims printed as index columns on every row
    let prefix_rank = rank.saturating_sub(2);

    if config.header {
        let mut header: Vec<String> = (0..prefix_rank).map(|k| format!("d{}", k)).collect();
        if rank == 0 {
            header.push("value".to_string());
        } else {
            header.extend((0..row_len).map(|j| j.to_string()));
        }
        out.write_record(&header).context("Failed to write header row")?;
    }

    if !array.is_empty() {
        let strides = array.strides();
        for (row, values) in array.as_slice().chunks(row_len).enumerate() {
            let mut record: Vec<String> = Vec::with_capacity(prefix_rank + values.len());
            let flat = row * row_len;
            for k in 0..prefix_rank {
                record.push(((flat / strides[k]) % dims[k]).to_string());
            }
            record.extend(values.iter().map(|&v| fmt_value(v)));
            out.write_record(&record)
                .with_context(|| format!("Failed to write row {}", row))?;
        }
    }

    out.flush().context("Failed to flush delimited output")?;
    Ok(())
}
