//! Subcommand implementations for the `ndstore` binary.
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};

use ndstore::config::StoreConfig;
use ndstore::io::{list_datasets, read_with, write_delimited};
use ndstore::{write, NdArray, ReadError};

/// Reads the array selected by `config`, transposing it if requested.
pub fn load_array(input: &Path, config: &StoreConfig) -> Result<NdArray, ReadError> {
    let mut array = read_with(input, &config.read_request())?;
    if config.transpose {
        array.transpose();
    }
    log::info!(
        "[ndstore] read {:?} from {}",
        array.dims(),
        input.display()
    );
    Ok(array)
}

/// Prints every dataset of the container with its shape and value range.
pub fn run_info<W: Write>(input: &Path, out: &mut W) -> Result<()> {
    let datasets = list_datasets(input)
        .with_context(|| format!("Failed to list datasets of {}", input.display()))?;
    for (name, info) in datasets {
        let config = StoreConfig {
            dataset: Some(name.clone()),
            ..StoreConfig::default()
        };
        let array = load_array(input, &config)
            .with_context(|| format!("Failed to read dataset '{}'", name))?;
        match array.try_range() {
            Some((min, max)) => writeln!(out, "{}\t{:?}\t{}\t{}", name, info.dims, min, max)?,
            None => writeln!(out, "{}\t{:?}\t-\t-", name, info.dims)?,
        }
    }
    Ok(())
}

/// Writes the selected array as delimited text to `output`, or stdout.
pub fn run_export(input: &Path, output: Option<&Path>, config: &StoreConfig) -> Result<()> {
    let array = load_array(input, config)?;
    match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path.display()))?;
            write_delimited(&array, BufWriter::new(file), &config.export)?;
        }
        None => {
            let stdout = io::stdout();
            write_delimited(&array, stdout.lock(), &config.export)?;
        }
    }
    Ok(())
}

/// Copies the selected array into dataset `name` of another container.
///
/// `name` defaults to the source dataset name, or `"data"` when the source
/// dataset was discovered automatically.
pub fn run_copy(input: &Path, output: &Path, name: Option<&str>, config: &StoreConfig) -> Result<()> {
    let array = load_array(input, config)?;
    let dataname = name
        .or(config.dataset.as_deref())
        .filter(|n| !n.is_empty())
        .unwrap_or("data");
    write(&array, output, dataname, config.append)?;
    Ok(())
}

/// Exit status for a failed command: the read error code when there is one.
pub fn exit_code(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<ReadError>())
        .map_or(1, |read_err| read_err.code())
}
