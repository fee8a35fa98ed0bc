//! Dataset reads, whole or one index along a dimension.
//!
//! A read opens the container, resolves the dataset (explicit name or the
//! first dataset of the root group), checks its shape and then either copies
//! the full extent or a single-index hyperslab into a fresh `NdArray`. A
//! slice drops the sliced dimension, so a `[3, 4, 5]` dataset sliced along
//! dimension 1 yields a `[3, 5]` array. Every handle is released on every
//! exit path by ownership.
use std::path::Path;

use crate::array::NdArray;
use crate::container::{
    Container, DatasetInfo, EntryKind, Hyperslab, MemorySpace, OpenMode, ZarrStore,
};
use crate::error::ReadError;

/// Which dataset to read and whether to slice it.
///
/// `slice_dim < 0` requests the whole dataset. Otherwise `slice_index`
/// selects one index along `slice_dim`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadRequest {
    pub dataset: Option<String>,
    pub slice_dim: i64,
    pub slice_index: i64,
}

impl Default for ReadRequest {
    fn default() -> Self {
        Self {
            dataset: None,
            slice_dim: -1,
            slice_index: 0,
        }
    }
}

impl ReadRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dataset<S: Into<String>>(mut self, name: S) -> Self {
        self.dataset = Some(name.into());
        self
    }

    pub fn slice(mut self, dim: i64, index: i64) -> Self {
        self.slice_dim = dim;
        self.slice_index = index;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadPlan {
    Full,
    /// Read index `index` of dimension `dim`; `dims` is the shape left once
    /// that dimension is removed.
    Slice {
        dim: usize,
        index: usize,
        dims: Vec<usize>,
    },
}

/// Decides between a full read and a slice for a dataset of shape `dims`.
///
/// A full read happens when `slice_dim` is negative, or when it is past the
/// last dimension and `slice_index` is 0. A slice needs `slice_dim` within
/// the rank and `slice_index` within that dimension. Everything else,
/// including an out-of-range `slice_dim` with a non-zero index, is
/// `InvalidSlice`.
pub fn plan_read(dims: &[usize], slice_dim: i64, slice_index: i64) -> Result<ReadPlan, ReadError> {
    let rank = dims.len() as i64;
    if slice_dim < 0 || (slice_dim >= rank && slice_index == 0) {
        return Ok(ReadPlan::Full);
    }
    if slice_dim < rank && slice_index >= 0 && (slice_index as u64) < dims[slice_dim as usize] as u64 {
        let dim = slice_dim as usize;
        let mut reduced = dims.to_vec();
        reduced.remove(dim);
        return Ok(ReadPlan::Slice {
            dim,
            index: slice_index as usize,
            dims: reduced,
        });
    }
    Err(ReadError::InvalidSlice)
}

/// Reads `datapath` (or the first dataset when `None` or empty) from the
/// container at `path`.
pub fn read<P: AsRef<Path>>(
    path: P,
    datapath: Option<&str>,
    slice_dim: i64,
    slice_index: i64,
) -> Result<NdArray, ReadError> {
    let request = ReadRequest {
        dataset: datapath.map(str::to_string),
        slice_dim,
        slice_index,
    };
    read_with(path, &request)
}

pub fn read_with<P: AsRef<Path>>(path: P, request: &ReadRequest) -> Result<NdArray, ReadError> {
    let path = path.as_ref();
    let store = ZarrStore::open(path, OpenMode::ReadOnly).map_err(|err| {
        log::debug!("cannot open {}: {}", path.display(), err);
        ReadError::OpenFailed
    })?;
    read_from(&store, request)
}

/// Same as [`read_with`] on an already open container.
pub fn read_from<C: Container + ?Sized>(
    container: &C,
    request: &ReadRequest,
) -> Result<NdArray, ReadError> {
    let name = resolve_dataset(container, request.dataset.as_deref())?;
    let info = container.open_dataset(&name).map_err(|err| {
        log::debug!("cannot open dataset '{}': {}", name, err);
        ReadError::DatasetOpenFailed
    })?;
    if info.rank() == 0 {
        return Err(ReadError::InvalidRank);
    }

    let plan = plan_read(&info.dims, request.slice_dim, request.slice_index)?;
    log::debug!("reading '{}' {:?} with plan {:?}", name, info.dims, plan);

    match plan {
        ReadPlan::Full => {
            let mut dest = NdArray::new(&info.dims);
            let selection = Hyperslab::all(&info.dims);
            let memory = MemorySpace::new(&info.dims);
            container
                .read_selection(&name, &selection, &memory, dest.as_mut_slice())
                .map_err(|err| {
                    log::debug!("full read of '{}' failed: {}", name, err);
                    ReadError::ReadFailed
                })?;
            Ok(dest)
        }
        ReadPlan::Slice { dim, index, dims } => {
            let selection = Hyperslab::single_index(&info.dims, dim, index);
            let mut dest = NdArray::new(&dims);
            // a scalar result still transfers through a one-element space
            let memory = if dims.is_empty() {
                MemorySpace::new(&[1])
            } else {
                MemorySpace::new(&dims)
            };
            container
                .read_selection(&name, &selection, &memory, dest.as_mut_slice())
                .map_err(|err| {
                    log::debug!("slice {} of dim {} of '{}' failed: {}", index, dim, name, err);
                    ReadError::SliceReadFailed
                })?;
            Ok(dest)
        }
    }
}

fn resolve_dataset<C: Container + ?Sized>(
    container: &C,
    datapath: Option<&str>,
) -> Result<String, ReadError> {
    if let Some(path) = datapath.filter(|p| !p.is_empty()) {
        return Ok(path.to_string());
    }
    let entries = container
        .root_entries()
        .map_err(|_| ReadError::DatasetNotFound)?;
    let found = entries
        .into_iter()
        .find(|entry| entry.kind == EntryKind::Dataset)
        .map(|entry| entry.name)
        .ok_or(ReadError::DatasetNotFound)?;
    log::debug!("no dataset given, using '{}'", found);
    Ok(found)
}

/// Every dataset in the root group with its shape, in name order.
pub fn list_datasets<P: AsRef<Path>>(path: P) -> Result<Vec<(String, DatasetInfo)>, ReadError> {
    let store =
        ZarrStore::open(path.as_ref(), OpenMode::ReadOnly).map_err(|_| ReadError::OpenFailed)?;
    let entries = store.root_entries().map_err(|_| ReadError::OpenFailed)?;
    let mut datasets = Vec::new();
    for entry in entries.into_iter().filter(|e| e.kind == EntryKind::Dataset) {
        let info = store
            .open_dataset(&entry.name)
            .map_err(|_| ReadError::DatasetOpenFailed)?;
        datasets.push((entry.name, info));
    }
    Ok(datasets)
}
