//! Storage collaborator used by the reader and writer.
//!
//! The `Container` trait is the full set of capabilities the rest of the
//! crate needs from a hierarchical array file: enumerate the root group,
//! describe and delete datasets, and move `f64` values between a rectangular
//! selection of a dataset and a contiguous memory buffer. `ZarrStore`
//! implements it over a Zarr hierarchy on disk.
mod diagnostics;
mod selection;
mod zarr;

use std::error::Error;
use std::fmt;
use std::io;

pub use diagnostics::{diagnostics_enabled, set_diagnostics, silence_diagnostics, DiagnosticsGuard};
pub use selection::{Hyperslab, MemorySpace};
pub use zarr::{OpenMode, ZarrStore, ROOT_METADATA};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Dataset,
    Group,
}

/// An immediate child of the root group. Names are relative to the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub kind: EntryKind,
}

/// Shape of a stored dataset.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetInfo {
    pub dims: Vec<usize>,
    /// Upper bound of each extent. Datasets are never resized, so this equals
    /// `dims`; it is reported but not otherwise used.
    pub max_dims: Vec<usize>,
}

impl DatasetInfo {
    pub fn rank(&self) -> usize {
        self.dims.len()
    }
}

pub trait Container {
    /// Children of the root group in a stable order.
    fn root_entries(&self) -> Result<Vec<Entry>, ContainerError>;

    fn open_dataset(&self, name: &str) -> Result<DatasetInfo, ContainerError>;

    /// Probes for a dataset without reporting a diagnostic when it is absent.
    fn dataset_exists(&self, name: &str) -> bool {
        let _quiet = silence_diagnostics();
        self.open_dataset(name).is_ok()
    }

    /// Removes a dataset. Failures are ignored.
    fn delete_dataset(&mut self, name: &str);

    fn create_dataset(&mut self, name: &str, dims: &[usize]) -> Result<(), ContainerError>;

    fn create_group(&mut self, name: &str) -> Result<(), ContainerError>;

    /// Copies the values selected by `selection` into `buffer`, which is laid
    /// out according to `memory`.
    fn read_selection(
        &self,
        name: &str,
        selection: &Hyperslab,
        memory: &MemorySpace,
        buffer: &mut [f64],
    ) -> Result<(), ContainerError>;

    fn write_selection(
        &mut self,
        name: &str,
        selection: &Hyperslab,
        memory: &MemorySpace,
        buffer: &[f64],
    ) -> Result<(), ContainerError>;
}

#[derive(Debug)]
pub enum ContainerError {
    Io(io::Error),
    /// Failure reported by the storage library.
    Backend(String),
    CorruptMetadata(String),
    NotFound(String),
    NotADataset(String),
    NotAGroup(String),
    AlreadyExists(String),
    InvalidName(String),
    ReadOnly,
    SelectionOutOfBounds {
        dims: Vec<usize>,
        offset: Vec<usize>,
        count: Vec<usize>,
    },
    ShapeMismatch {
        expected: usize,
        actual: usize,
    },
}

impl fmt::Display for ContainerError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ContainerError::Io(err) => write!(f, "I/O error: {}", err),
            ContainerError::Backend(msg) => write!(f, "{}", msg),
            ContainerError::CorruptMetadata(msg) => write!(f, "corrupt metadata for {}", msg),
            ContainerError::NotFound(name) => write!(f, "no object named '{}'", name),
            ContainerError::NotADataset(name) => write!(f, "'{}' is not a dataset", name),
            ContainerError::NotAGroup(name) => write!(f, "'{}' is not a group", name),
            ContainerError::AlreadyExists(name) => write!(f, "object '{}' already exists", name),
            ContainerError::InvalidName(name) => write!(f, "invalid object name '{}'", name),
            ContainerError::ReadOnly => write!(f, "container is open read-only"),
            ContainerError::SelectionOutOfBounds {
                dims,
                offset,
                count,
            } => write!(
                f,
                "selection offset {:?} count {:?} exceeds dataset extent {:?}",
                offset, count, dims
            ),
            ContainerError::ShapeMismatch { expected, actual } => write!(
                f,
                "transfer of {} elements does not match buffer of {} elements",
                expected, actual
            ),
        }
    }
}

impl Error for ContainerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            ContainerError::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for ContainerError {
    fn from(value: io::Error) -> Self {
        ContainerError::Io(value)
    }
}
