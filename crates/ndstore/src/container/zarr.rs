//! Zarr hierarchy backend.
//!
//! A container is a Zarr V3 hierarchy on the local filesystem. Datasets are
//! `float64` arrays and may sit in nested groups (`"scans/raw"`). Data moves
//! through `zarrs` array subsets, so a slice only decodes the chunks it
//! touches.
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use zarrs::array::{Array, ArrayBuilder, ChunkGrid, DataType, FillValue};
use zarrs::array_subset::ArraySubset;
use zarrs::filesystem::FilesystemStore;
use zarrs::group::{Group, GroupBuilder};
use zarrs::node::{Node, NodeMetadata};
use zarrs::storage::{StorePrefix, WritableStorageTraits};

use super::diagnostics::report;
use super::{Container, ContainerError, DatasetInfo, Entry, EntryKind, Hyperslab, MemorySpace};

/// Metadata document of the root group.
pub const ROOT_METADATA: &str = "zarr.json";

/// Upper bound on the number of elements stored in one chunk.
const CHUNK_ELEMENTS: u64 = 1 << 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    ReadOnly,
    ReadWrite,
}

/// An open Zarr hierarchy. Every write goes straight to the store, so there
/// is nothing to flush when the handle is dropped.
pub struct ZarrStore {
    store: Arc<FilesystemStore>,
    path: PathBuf,
    mode: OpenMode,
}

type ZarrArray = Array<FilesystemStore>;

impl std::fmt::Debug for ZarrStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZarrStore")
            .field("path", &self.path)
            .field("mode", &self.mode)
            .finish()
    }
}

fn backend<E: std::fmt::Display>(context: String, err: E) -> ContainerError {
    report(ContainerError::Backend(format!("{}: {}", context, err)))
}

/// Absolute node path for a dataset or group name, or `None` when the name
/// has an empty, `.` or `..` component.
fn valid_node_path(name: &str) -> Option<String> {
    let trimmed = name.trim_matches('/');
    let valid = !trimmed.is_empty()
        && trimmed
            .split('/')
            .all(|part| !part.is_empty() && part != "." && part != "..");
    valid.then(|| format!("/{}", trimmed))
}

fn node_path(name: &str) -> Result<String, ContainerError> {
    valid_node_path(name).ok_or_else(|| report(ContainerError::InvalidName(name.to_string())))
}

/// Chunk shape for a new dataset: the full extent, with leading dimensions
/// cut down until a chunk holds at most `CHUNK_ELEMENTS` values.
pub(crate) fn chunk_shape(dims: &[usize]) -> Vec<u64> {
    let mut chunk: Vec<u64> = dims.iter().map(|&d| d.max(1) as u64).collect();
    for k in 0..chunk.len() {
        let inner = chunk[k + 1..]
            .iter()
            .fold(1u64, |acc, &c| acc.saturating_mul(c));
        if chunk[k].saturating_mul(inner) <= CHUNK_ELEMENTS {
            break;
        }
        chunk[k] = (CHUNK_ELEMENTS / inner).max(1);
    }
    chunk
}

/// Converts a stored shape to in-memory extents, rejecting shapes whose
/// `f64` buffer could not be allocated.
pub(crate) fn checked_dims(name: &str, shape: &[u64]) -> Result<Vec<usize>, ContainerError> {
    let corrupt = |msg: String| report(ContainerError::CorruptMetadata(format!("'{}': {}", name, msg)));
    let dims = shape
        .iter()
        .map(|&d| usize::try_from(d))
        .collect::<Result<Vec<usize>, _>>()
        .map_err(|_| corrupt(format!("extent in {:?} exceeds the address space", shape)))?;
    let bytes = dims
        .iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .and_then(|len| len.checked_mul(std::mem::size_of::<f64>()))
        .filter(|&bytes| bytes <= isize::MAX as usize);
    match bytes {
        Some(_) => Ok(dims),
        None => Err(corrupt(format!("shape {:?} is too large to load", shape))),
    }
}

fn to_u64(values: &[usize]) -> Vec<u64> {
    values.iter().map(|&v| v as u64).collect()
}

impl ZarrStore {
    pub fn open<P: AsRef<Path>>(path: P, mode: OpenMode) -> Result<Self, ContainerError> {
        let path = path.as_ref();
        if !path.is_dir() {
            return Err(report(ContainerError::NotFound(path.display().to_string())));
        }
        let store = FilesystemStore::new(path)
            .map_err(|e| backend(format!("cannot open store {}", path.display()), e))?;
        let store = Arc::new(store);
        Group::open(store.clone(), "/")
            .map_err(|e| backend(format!("no root group in {}", path.display()), e))?;
        log::debug!("opened container {} ({:?})", path.display(), mode);
        Ok(Self {
            store,
            path: path.to_path_buf(),
            mode,
        })
    }

    /// Creates an empty hierarchy at `path`, replacing an existing one.
    ///
    /// Anything at `path` that is not a hierarchy, other than an empty
    /// directory, is left alone and reported as `AlreadyExists`.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, ContainerError> {
        let path = path.as_ref();
        if path.join(ROOT_METADATA).is_file() {
            fs::remove_dir_all(path).map_err(|e| report(e.into()))?;
        } else if path.exists() {
            let empty_dir = path.is_dir()
                && fs::read_dir(path)
                    .map_err(|e| report(e.into()))?
                    .next()
                    .is_none();
            if !empty_dir {
                return Err(report(ContainerError::AlreadyExists(
                    path.display().to_string(),
                )));
            }
        }
        fs::create_dir_all(path).map_err(|e| report(e.into()))?;

        let store = FilesystemStore::new(path)
            .map_err(|e| backend(format!("cannot create store {}", path.display()), e))?;
        let store = Arc::new(store);
        GroupBuilder::new()
            .build(store.clone(), "/")
            .map_err(|e| backend("cannot build root group".to_string(), e))?
            .store_metadata()
            .map_err(|e| backend("cannot store root group".to_string(), e))?;
        log::debug!("created container {}", path.display());
        Ok(Self {
            store,
            path: path.to_path_buf(),
            mode: OpenMode::ReadWrite,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn mode(&self) -> OpenMode {
        self.mode
    }

    fn ensure_writable(&self) -> Result<(), ContainerError> {
        match self.mode {
            OpenMode::ReadWrite => Ok(()),
            OpenMode::ReadOnly => Err(report(ContainerError::ReadOnly)),
        }
    }

    fn is_group(&self, path: &str) -> bool {
        Group::open(self.store.clone(), path).is_ok()
    }

    fn is_array(&self, path: &str) -> bool {
        ZarrArray::open(self.store.clone(), path).is_ok()
    }

    fn array(&self, name: &str) -> Result<ZarrArray, ContainerError> {
        let path = node_path(name)?;
        match ZarrArray::open(self.store.clone(), &path) {
            Ok(array) => Ok(array),
            Err(_) if self.is_group(&path) => {
                Err(report(ContainerError::NotADataset(name.to_string())))
            }
            Err(err) => Err(backend(format!("cannot open dataset '{}'", name), err)),
        }
    }

    /// Creates the groups above `path` that do not exist yet.
    fn ensure_parent_groups(&self, path: &str) -> Result<(), ContainerError> {
        let parts: Vec<&str> = path.trim_start_matches('/').split('/').collect();
        let mut parent = String::new();
        for part in &parts[..parts.len() - 1] {
            parent.push('/');
            parent.push_str(part);
            if self.is_group(&parent) {
                continue;
            }
            if self.is_array(&parent) {
                return Err(report(ContainerError::NotAGroup(parent)));
            }
            GroupBuilder::new()
                .build(self.store.clone(), &parent)
                .map_err(|e| backend(format!("cannot build group '{}'", parent), e))?
                .store_metadata()
                .map_err(|e| backend(format!("cannot store group '{}'", parent), e))?;
        }
        Ok(())
    }

    fn prepare_node(&self, name: &str) -> Result<String, ContainerError> {
        self.ensure_writable()?;
        let path = node_path(name)?;
        if self.is_array(&path) || self.is_group(&path) {
            return Err(report(ContainerError::AlreadyExists(name.to_string())));
        }
        self.ensure_parent_groups(&path)?;
        Ok(path)
    }

    /// Opens `name` and checks that `selection`, `memory` and a buffer of
    /// `buffer_len` values describe the same transfer.
    fn plan_transfer(
        &self,
        name: &str,
        selection: &Hyperslab,
        memory: &MemorySpace,
        buffer_len: usize,
    ) -> Result<(ZarrArray, ArraySubset), ContainerError> {
        let array = self.array(name)?;
        let dims = checked_dims(name, array.shape())?;
        selection.check(&dims).map_err(report)?;
        let selected = selection.element_count();
        for actual in [memory.element_count(), buffer_len] {
            if actual != selected {
                return Err(report(ContainerError::ShapeMismatch {
                    expected: selected,
                    actual,
                }));
            }
        }
        let subset =
            ArraySubset::new_with_start_shape(to_u64(&selection.offset), to_u64(&selection.count))
                .map_err(|e| backend(format!("bad selection of '{}'", name), e))?;
        Ok((array, subset))
    }
}

impl Container for ZarrStore {
    fn root_entries(&self) -> Result<Vec<Entry>, ContainerError> {
        let root = Node::open(&self.store, "/")
            .map_err(|e| backend("cannot list root group".to_string(), e))?;
        let mut entries: Vec<Entry> = root
            .children()
            .iter()
            .map(|child| Entry {
                name: child.path().as_str().trim_start_matches('/').to_string(),
                kind: match child.metadata() {
                    NodeMetadata::Array(_) => EntryKind::Dataset,
                    NodeMetadata::Group(_) => EntryKind::Group,
                },
            })
            .collect();
        entries.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(entries)
    }

    fn open_dataset(&self, name: &str) -> Result<DatasetInfo, ContainerError> {
        let array = self.array(name)?;
        let dims = checked_dims(name, array.shape())?;
        Ok(DatasetInfo {
            max_dims: dims.clone(),
            dims,
        })
    }

    fn delete_dataset(&mut self, name: &str) {
        if self.mode == OpenMode::ReadOnly {
            return;
        }
        let Some(path) = valid_node_path(name) else {
            return;
        };
        if !self.is_array(&path) {
            return;
        }
        let erased = StorePrefix::new(format!("{}/", path.trim_start_matches('/')))
            .map_err(|e| e.to_string())
            .and_then(|prefix| self.store.erase_prefix(&prefix).map_err(|e| e.to_string()));
        match erased {
            Ok(()) => log::debug!("unlinked dataset '{}' from {}", name, self.path.display()),
            Err(err) => log::debug!("could not unlink dataset '{}': {}", name, err),
        }
    }

    fn create_dataset(&mut self, name: &str, dims: &[usize]) -> Result<(), ContainerError> {
        let path = self.prepare_node(name)?;
        let chunk_grid: ChunkGrid = chunk_shape(dims)
            .try_into()
            .map_err(|e| backend(format!("bad chunk grid for '{}'", name), e))?;
        let array = ArrayBuilder::new(
            to_u64(dims),
            DataType::Float64,
            chunk_grid,
            FillValue::from(0.0f64),
        )
        .build(self.store.clone(), &path)
        .map_err(|e| backend(format!("cannot build dataset '{}'", name), e))?;
        array
            .store_metadata()
            .map_err(|e| backend(format!("cannot store dataset '{}'", name), e))?;
        Ok(())
    }

    fn create_group(&mut self, name: &str) -> Result<(), ContainerError> {
        let path = self.prepare_node(name)?;
        GroupBuilder::new()
            .build(self.store.clone(), &path)
            .map_err(|e| backend(format!("cannot build group '{}'", name), e))?
            .store_metadata()
            .map_err(|e| backend(format!("cannot store group '{}'", name), e))?;
        Ok(())
    }

    fn read_selection(
        &self,
        name: &str,
        selection: &Hyperslab,
        memory: &MemorySpace,
        buffer: &mut [f64],
    ) -> Result<(), ContainerError> {
        let (array, subset) = self.plan_transfer(name, selection, memory, buffer.len())?;
        let values = array
            .retrieve_array_subset_elements::<f64>(&subset)
            .map_err(|e| backend(format!("cannot read '{}'", name), e))?;
        if values.len() != buffer.len() {
            return Err(report(ContainerError::ShapeMismatch {
                expected: buffer.len(),
                actual: values.len(),
            }));
        }
        buffer.copy_from_slice(&values);
        Ok(())
    }

    fn write_selection(
        &mut self,
        name: &str,
        selection: &Hyperslab,
        memory: &MemorySpace,
        buffer: &[f64],
    ) -> Result<(), ContainerError> {
        self.ensure_writable()?;
        let (array, subset) = self.plan_transfer(name, selection, memory, buffer.len())?;
        array
            .store_array_subset_elements::<f64>(&subset, buffer)
            .map_err(|e| backend(format!("cannot write '{}'", name), e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scratch() -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("scratch.zarr");
        (dir, path)
    }

    #[test]
    fn node_paths_are_rooted() {
        assert_eq!(valid_node_path("x").as_deref(), Some("/x"));
        assert_eq!(valid_node_path("/scans/raw/").as_deref(), Some("/scans/raw"));
        assert_eq!(valid_node_path(""), None);
        assert_eq!(valid_node_path("a//b"), None);
        assert_eq!(valid_node_path("a/../b"), None);
    }

    #[test]
    fn chunks_are_capped() {
        assert_eq!(chunk_shape(&[3, 4, 5]), vec![3, 4, 5]);
        assert_eq!(chunk_shape(&[0, 7]), vec![1, 7]);
        assert_eq!(chunk_shape(&[4096, 4096]), vec![256, 4096]);
        assert_eq!(chunk_shape(&[2, 1 << 21]), vec![1, 1 << 20]);
    }

    #[test]
    fn oversized_shapes_are_corrupt() {
        assert_eq!(checked_dims("x", &[3, 4]).unwrap(), vec![3, 4]);
        let overflow = checked_dims("x", &[1 << 32, 1 << 32, 4]).unwrap_err();
        assert!(matches!(overflow, ContainerError::CorruptMetadata(_)));
        let too_big = checked_dims("x", &[1 << 30, 1 << 30, 4]).unwrap_err();
        assert!(matches!(too_big, ContainerError::CorruptMetadata(_)));
    }

    #[test]
    fn create_then_reopen_lists_sorted_entries() {
        let (_dir, path) = scratch();
        {
            let mut store = ZarrStore::create(&path).unwrap();
            store.create_dataset("zeta", &[2]).unwrap();
            store.create_group("beta").unwrap();
            store.create_dataset("alpha", &[3, 1]).unwrap();
        }
        let store = ZarrStore::open(&path, OpenMode::ReadOnly).unwrap();
        let entries = store.root_entries().unwrap();
        let names: Vec<_> = entries.iter().map(|e| (e.name.as_str(), e.kind)).collect();
        assert_eq!(
            names,
            vec![
                ("alpha", EntryKind::Dataset),
                ("beta", EntryKind::Group),
                ("zeta", EntryKind::Dataset),
            ]
        );
        assert_eq!(store.open_dataset("alpha").unwrap().dims, vec![3, 1]);
    }

    #[test]
    fn nested_datasets_create_their_groups() {
        let (_dir, path) = scratch();
        let mut store = ZarrStore::create(&path).unwrap();
        store.create_dataset("scans/raw", &[4]).unwrap();
        assert_eq!(store.open_dataset("/scans/raw").unwrap().dims, vec![4]);
        assert!(matches!(
            store.open_dataset("scans"),
            Err(ContainerError::NotADataset(_))
        ));
        let entries = store.root_entries().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].kind, EntryKind::Group);
        assert!(matches!(
            store.create_dataset("scans/raw/deeper", &[1]),
            Err(ContainerError::NotAGroup(_))
        ));
    }

    #[test]
    fn selection_transfer_moves_one_column() {
        let (_dir, path) = scratch();
        let mut store = ZarrStore::create(&path).unwrap();
        store.create_dataset("m", &[3, 2]).unwrap();
        let values = [1.0, 2.0, 3.0, 4.0, 5.0, 6.0];
        store
            .write_selection("m", &Hyperslab::all(&[3, 2]), &MemorySpace::new(&[3, 2]), &values)
            .unwrap();

        let mut column = [0.0; 3];
        store
            .read_selection(
                "m",
                &Hyperslab::single_index(&[3, 2], 1, 1),
                &MemorySpace::new(&[3]),
                &mut column,
            )
            .unwrap();
        assert_eq!(column, [2.0, 4.0, 6.0]);

        let mut short = [0.0; 2];
        assert!(matches!(
            store.read_selection(
                "m",
                &Hyperslab::single_index(&[3, 2], 1, 1),
                &MemorySpace::new(&[3]),
                &mut short,
            ),
            Err(ContainerError::ShapeMismatch { .. })
        ));
    }

    #[test]
    fn delete_only_removes_datasets() {
        let (_dir, path) = scratch();
        let mut store = ZarrStore::create(&path).unwrap();
        store.create_dataset("x", &[2]).unwrap();
        store.create_group("g").unwrap();
        store.delete_dataset("x");
        store.delete_dataset("g");
        store.delete_dataset("missing");
        assert!(!store.dataset_exists("x"));
        let names: Vec<_> = store.root_entries().unwrap().into_iter().map(|e| e.name).collect();
        assert_eq!(names, vec!["g".to_string()]);
    }

    #[test]
    fn read_only_handles_reject_writes() {
        let (_dir, path) = scratch();
        ZarrStore::create(&path).unwrap().create_dataset("x", &[2]).unwrap();
        let mut store = ZarrStore::open(&path, OpenMode::ReadOnly).unwrap();
        assert!(matches!(store.create_group("g"), Err(ContainerError::ReadOnly)));
        assert!(matches!(
            store.write_selection("x", &Hyperslab::all(&[2]), &MemorySpace::new(&[2]), &[1.0, 2.0]),
            Err(ContainerError::ReadOnly)
        ));
        store.delete_dataset("x");
        assert!(store.dataset_exists("x"));
    }

    #[test]
    fn create_refuses_foreign_paths() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plain.txt");
        fs::write(&path, b"keep me").unwrap();
        assert!(matches!(
            ZarrStore::create(&path),
            Err(ContainerError::AlreadyExists(_))
        ));
        assert_eq!(fs::read(&path).unwrap(), b"keep me");
    }

    #[test]
    fn open_requires_a_hierarchy() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            ZarrStore::open(dir.path().join("missing"), OpenMode::ReadOnly),
            Err(ContainerError::NotFound(_))
        ));
        assert!(ZarrStore::open(dir.path(), OpenMode::ReadOnly).is_err());
    }
}
