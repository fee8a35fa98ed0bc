//! Writing an `NdArray` as a named dataset.
//!
//! Failures here are not coded like read failures: an unopenable output
//! file or a rank-0 array is a caller error, reported as an `anyhow::Error`.
use std::path::Path;

use anyhow::{bail, Context, Result};

use crate::array::NdArray;
use crate::container::{Container, Hyperslab, MemorySpace, OpenMode, ZarrStore};

/// Writes `array` to dataset `dataname` of the container at `path`.
///
/// With `append` the container must already exist; otherwise it is created,
/// discarding any previous contents. An existing dataset of the same name is
/// replaced, so the stored shape always matches `array`.
pub fn write<P: AsRef<Path>>(array: &NdArray, path: P, dataname: &str, append: bool) -> Result<()> {
    let path = path.as_ref();
    let opened = if append {
        ZarrStore::open(path, OpenMode::ReadWrite)
    } else {
        ZarrStore::create(path)
    };
    let mut store =
        opened.with_context(|| format!("error opening output file {}", path.display()))?;

    write_into(&mut store, array, dataname)?;
    drop(store);
    log::info!(
        "wrote dataset '{}' {:?} to {}",
        dataname,
        array.dims(),
        path.display()
    );
    Ok(())
}

/// Same as [`write`] on an already open, writable container.
pub fn write_into<C: Container + ?Sized>(
    container: &mut C,
    array: &NdArray,
    dataname: &str,
) -> Result<()> {
    if container.dataset_exists(dataname) {
        log::debug!("replacing existing dataset '{}'", dataname);
        container.delete_dataset(dataname);
    }

    if array.rank() == 0 {
        bail!("non-positive rank: scalar arrays cannot be written as a dataset");
    }

    let dims = array.dims();
    container
        .create_dataset(dataname, dims)
        .with_context(|| format!("error creating dataset '{}'", dataname))?;
    container
        .write_selection(
            dataname,
            &Hyperslab::all(dims),
            &MemorySpace::new(dims),
            array.as_slice(),
        )
        .with_context(|| format!("error writing dataset '{}'", dataname))?;
    Ok(())
}
